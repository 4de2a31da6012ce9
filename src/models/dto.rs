// DTO des requêtes et réponses structurées de l'API
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::account::AccountKind;
use super::embauche_requests::EmbaucheStatus;
use super::orders::{self, OrderStatus};

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.trim_start_matches('+');
    if (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone");
        error.message = Some("Phone number must contain 8 to 15 digits".into());
        Err(error)
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    pub image: Option<String>,
    pub image_proof_of_work: Option<String>,
    pub cv: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub linkdin: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterArtisanRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    pub artisan_type: Option<String>,
    pub experience: Option<String>,
    pub certification: Option<String>,
    pub disponibilite: Option<serde_json::Value>,
    pub image: Option<String>,
    pub image_proof_of_work: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEtablissementRequest {
    #[validate(length(min = 1, message = "Etablissement name is required"))]
    pub name_of_etablissement: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[serde(rename = "type")]
    pub type_of_etablissement: String,
    pub since: Option<String>,
    #[validate(range(min = 0, message = "Employees count cannot be negative"))]
    pub employees_count: Option<i32>,
    pub localisation: Option<String>,
    pub secteur: Option<String>,
    pub image: Option<String>,
    pub image_of_status_proof: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailRequest {
    pub current_email: String,
    #[validate(email(message = "Invalid email address"))]
    pub new_email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageUpdateRequest {
    pub image: String,
}

// ---------------------------------------------------------------------------
// Abonnement / paiement
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendSubscriptionRequest {
    pub entity_type: AccountKind,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusRequest {
    pub payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionPlanRequest {
    pub email: String,
    pub subscription_plan: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewSubscriptionRequest {
    pub email: String,
    pub user_type: AccountKind,
    pub new_plan: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayRequest {
    pub email: String,
    pub user_type: AccountKind,
    pub plan: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWebhookRequest {
    pub email: String,
    pub user_type: AccountKind,
    pub payment_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentRequest {
    #[validate(range(min = 0.0, message = "Amount must be positive"))]
    pub amount: f64,
    pub description: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub order_id: Option<String>,
    pub subscription_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPlan {
    pub name: &'static str,
    pub price: u32,
    pub features: Vec<&'static str>,
}

// ---------------------------------------------------------------------------
// Offres
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEtablissementOfferRequest {
    pub etablissement_id: i32,
    #[validate(length(min = 1, message = "Title is required"))]
    pub titre: String,
    pub description: String,
    pub type_contrat: Option<String>,
    pub skills: Option<String>,
    #[validate(range(min = 0.0, message = "Budget must be positive"))]
    pub budget: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEtablissementOfferRequest {
    pub titre: Option<String>,
    pub description: Option<String>,
    pub type_contrat: Option<String>,
    pub skills: Option<String>,
    #[validate(range(min = 0.0, message = "Budget must be positive"))]
    pub budget: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtisanOfferRequest {
    pub artisan_id: i32,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must be positive"))]
    pub prix: f64,
    pub image_proof_of_work: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

// ---------------------------------------------------------------------------
// Candidatures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserApplicationRequest {
    pub user_id: i32,
    pub etablissement_id: i32,
    pub offer_id: Option<i32>,
    pub cv: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub linkdin: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtisanApplicationRequest {
    pub artisan_id: i32,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must be positive"))]
    pub prix: f64,
    pub image_proof_of_work: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCheckQuery {
    pub user_id: i32,
    pub etablissement_id: i32,
    pub offer_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCheckResponse {
    pub has_applied: bool,
    pub application_id: Option<i32>,
    pub embauche_status: Option<EmbaucheStatus>,
}

// ---------------------------------------------------------------------------
// Embauche
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmbaucheRequest {
    pub user_id: Option<i32>,
    pub artisan_id: Option<i32>,
    pub etablissement_id: i32,
    pub offer_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbaucheAction {
    Accept,
    Refuse,
}

#[derive(Debug, Deserialize)]
pub struct EmbaucheActionRequest {
    pub action: EmbaucheAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbaucheRequestIdBody {
    pub request_id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSharesReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Ordres
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub etablissement_id: i32,
    #[validate(length(min = 1, message = "Demande is required"))]
    pub demande: String,
    pub priorite: Option<String>,
    pub date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub shared_with_accepted_users: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub demande: Option<String>,
    pub priorite: Option<String>,
    pub date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSharingRequest {
    pub shared: bool,
}

/// Ordre annoté pour le rappel d'échéance
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithDeadline {
    #[serde(flatten)]
    pub order: orders::Model,
    pub days_until_deadline: i64,
    pub is_urgent: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RemovalOutcome {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Avis
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rate must be between 1 and 5"))]
    pub rate: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub total_reviews: usize,
    pub average_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation_rejects_mismatched_passwords() {
        let dto: RegisterUserRequest = serde_json::from_value(serde_json::json!({
            "firstName": "Ali",
            "lastName": "Ben",
            "email": "a@x.com",
            "password": "secret1",
            "confirmPassword": "secret2"
        }))
        .unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("+21698765432").is_ok());
        assert!(validate_phone("1234").is_err());
        assert!(validate_phone("12345678abc").is_err());
    }

    #[test]
    fn test_review_rate_bounds() {
        let ok = CreateReviewRequest { rate: 5, comment: "top".into() };
        assert!(ok.validate().is_ok());
        let too_high = CreateReviewRequest { rate: 6, comment: String::new() };
        assert!(too_high.validate().is_err());
        let too_low = CreateReviewRequest { rate: 0, comment: String::new() };
        assert!(too_low.validate().is_err());
    }

    #[test]
    fn test_etablissement_type_field_is_renamed() {
        let dto: RegisterEtablissementRequest = serde_json::from_value(serde_json::json!({
            "nameOfEtablissement": "Acme",
            "email": "contact@acme.tn",
            "password": "secret1",
            "confirmPassword": "secret1",
            "type": "startup"
        }))
        .unwrap();
        assert_eq!(dto.type_of_etablissement, "startup");
        assert!(dto.validate().is_ok());
    }
}
