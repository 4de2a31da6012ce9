use base64::{Engine, engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD}};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::Rng;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[cfg(not(test))]
const ITERATIONS: u32 = 260000;
// Les tests hachent beaucoup de mots de passe, le coût est lu depuis le hash
#[cfg(test)]
const ITERATIONS: u32 = 1000;
const KEY_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid hash format")]
    InvalidFormat,
    #[error("Invalid iterations")]
    InvalidIterations,
    #[error("Failed to decode hash component")]
    Decode,
    #[error("PBKDF2 failure: {0}")]
    Pbkdf2(String),
}

/// Hash un mot de passe au format Werkzeug
/// PBKDF2-HMAC-SHA256 avec un salt de 16 bytes
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    // Générer un salt aléatoire de 16 bytes
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, ITERATIONS, &mut key)
        .map_err(|e| PasswordError::Pbkdf2(e.to_string()))?;

    // Format: pbkdf2:sha256:iterations$salt$hash (base64 URL-safe sans padding)
    Ok(format!(
        "pbkdf2:sha256:{}${}${}",
        ITERATIONS,
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(key)
    ))
}

/// Vérifie un mot de passe contre un hash Werkzeug (salt/hash en base64 ou hex)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parts: Vec<&str> = stored_hash.split('$').collect();
    if parts.len() != 3 {
        return Err(PasswordError::InvalidFormat);
    }

    let header_parts: Vec<&str> = parts[0].split(':').collect();
    if header_parts.len() != 3 || header_parts[0] != "pbkdf2" || header_parts[1] != "sha256" {
        return Err(PasswordError::InvalidFormat);
    }

    let iterations = header_parts[2]
        .parse::<u32>()
        .map_err(|_| PasswordError::InvalidIterations)?;

    let salt = decode_flexible(parts[1])?;
    let expected_hash = decode_flexible(parts[2])?;

    let mut computed = vec![0u8; expected_hash.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
        .map_err(|e| PasswordError::Pbkdf2(e.to_string()))?;

    // Comparaison sans sortie anticipée
    let diff = computed
        .iter()
        .zip(expected_hash.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    Ok(diff == 0 && computed.len() == expected_hash.len())
}

/// Décode une chaîne encodée en base64 (plusieurs alphabets) ou en hexadécimal
fn decode_flexible(input: &str) -> Result<Vec<u8>, PasswordError> {
    // Format hexadécimal (64 caractères = 32 bytes)
    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(input).map_err(|_| PasswordError::Decode);
    }

    let padded = add_base64_padding(input);

    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(input) {
        return Ok(decoded);
    }
    if let Ok(decoded) = STANDARD_NO_PAD.decode(input) {
        return Ok(decoded);
    }
    if let Ok(decoded) = STANDARD.decode(&padded) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&padded) {
        return Ok(decoded);
    }

    hex::decode(input).map_err(|_| PasswordError::Decode)
}

fn add_base64_padding(input: &str) -> String {
    let padding_needed = (4 - (input.len() % 4)) % 4;
    format!("{}{}", input, "=".repeat(padding_needed))
}
