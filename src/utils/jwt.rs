use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::models::account::{AccountKind, AccountRef};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,          // id du compte dans sa table
    pub kind: AccountKind, // user, artisan ou etablissement
    pub email: String,
    pub exp: i64,          // expiration timestamp
}

impl Claims {
    pub fn account(&self) -> AccountRef {
        AccountRef::new(self.kind, self.sub)
    }
}

/// Génère un JWT (24h) pour un compte
pub fn generate_token(account: AccountRef, email: &str, secret: &str) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: account.id,
        kind: account.kind,
        email: email.to_string(),
        exp: expiration,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Vérifie et décode un JWT
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_verify_token() {
        let account = AccountRef::new(AccountKind::Artisan, 123);
        let token = generate_token(account, "art@x.com", "secret").unwrap();
        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.account(), account);
        assert_eq!(claims.email, "art@x.com");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_token(AccountRef::new(AccountKind::User, 1), "a@x.com", "secret").unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_invalid_token() {
        assert!(verify_token("invalid.token.here", "secret").is_err());
    }
}
