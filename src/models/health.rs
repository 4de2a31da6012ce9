use chrono::{DateTime, Utc};
use serde::Serialize;

/// Réponse de GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
    pub database: &'static str,
}
