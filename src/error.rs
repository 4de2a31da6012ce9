use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use thiserror::Error;
use validator::ValidationErrors;

use crate::services::mail_service::MailError;
use crate::services::payment_service::GatewayError;
use crate::utils::password::PasswordError;

/// Erreur renvoyée par les services et convertie en réponse JSON par actix
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Même message pour e-mail inconnu et mauvais mot de passe
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Your subscription has expired or payment is required to access the dashboard")]
    SubscriptionRequired,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Payment provider error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} with id {} not found", what, id))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{}: invalid value ({})", field, e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(", "))
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::SubscriptionRequired => StatusCode::FORBIDDEN,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Mail(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match self {
            AppError::SubscriptionRequired => serde_json::json!({
                "error": "Access denied",
                "message": self.to_string(),
                "subscriptionRequired": true,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct RateForm {
        #[validate(range(min = 1, max = 5, message = "rate must be between 1 and 5"))]
        rate: i32,
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("Order", 3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::SubscriptionRequired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InvalidTransition { from: "accepted".into(), to: "refused".into() }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AppError::not_found("Order", 7).to_string(), "Order with id 7 not found");
    }

    #[test]
    fn test_validation_errors_use_field_message() {
        let err: AppError = RateForm { rate: 9 }.validate().unwrap_err().into();
        assert_eq!(err.to_string(), "rate must be between 1 and 5");
    }
}
