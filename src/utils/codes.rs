use rand::Rng;

/// Code numérique à 6 chiffres (vérification d'e-mail, reset de mot de passe)
pub fn six_digit_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Retire le préfixe "email=" envoyé par certains clients dans le chemin
pub fn normalize_email_param(raw: &str) -> String {
    raw.strip_prefix("email=").unwrap_or(raw).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_has_six_digits() {
        for _ in 0..50 {
            let code = six_digit_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_normalize_email_param() {
        assert_eq!(normalize_email_param("email=a@x.com"), "a@x.com");
        assert_eq!(normalize_email_param("a@x.com"), "a@x.com");
    }
}
