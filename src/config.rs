// Configuration applicative chargée depuis .env puis l'environnement

use std::env;

use thiserror::Error;

const DEFAULT_JWT_SECRET: &str = "default-insecure-key-change-this";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub mail_from: String,
    pub konnect: KonnectConfig,
}

/// Paramètres du prestataire de paiement Konnect
#[derive(Debug, Clone)]
pub struct KonnectConfig {
    pub api_url: String,
    pub api_key: String,
    pub wallet_id: String,
    pub webhook_url: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let port_raw = env::var("APP_PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port_raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
            key: "APP_PORT",
            value: port_raw.clone(),
        })?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => DEFAULT_JWT_SECRET.to_string(),
        };

        Ok(Self {
            host: env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            log_level: env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            jwt_secret,
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
            konnect: KonnectConfig {
                api_url: env::var("KONNECT_API_URL")
                    .unwrap_or_else(|_| "https://api.preprod.konnect.network/api/v2".to_string()),
                api_key: env::var("KONNECT_API_KEY").unwrap_or_default(),
                wallet_id: env::var("KONNECT_WALLET_ID").unwrap_or_default(),
                webhook_url: env::var("KONNECT_WEBHOOK_URL").unwrap_or_default(),
            },
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    /// JWT_SECRET absent : la clé par défaut est connue de tous
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
impl AppConfig {
    /// Configuration fixe pour les tests, sans lecture de l'environnement
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "debug".to_string(),
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            mail_from: "tests@localhost".to_string(),
            konnect: KonnectConfig {
                api_url: "http://127.0.0.1:9".to_string(),
                api_key: String::new(),
                wallet_id: String::new(),
                webhook_url: String::new(),
            },
        }
    }
}
