use actix_web::{HttpResponse, get, post, put, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::account::{AccountKind, AccountRef};
use crate::models::dto::{
    EmailCodeRequest, EmailRequest, ImageUpdateRequest, LoginRequest, RegisterArtisanRequest,
    RegisterEtablissementRequest, RegisterUserRequest, ResetPasswordRequest, UpdateEmailRequest,
    UpdatePasswordRequest,
};
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::mail_service::Mailer;

/// POST /auth/register - Inscription d'un user (PUBLIC)
#[post("/register")]
pub async fn register_user(
    body: web::Json<RegisterUserRequest>,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, AppError> {
    let user = AuthService::register_user(db.get_ref(), mailer.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User registered successfully. Please verify your email.",
        "user": user,
    })))
}

/// POST /auth/register/artisana - Inscription d'un artisan (PUBLIC)
#[post("/register/artisana")]
pub async fn register_artisan(
    body: web::Json<RegisterArtisanRequest>,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, AppError> {
    let artisan =
        AuthService::register_artisan(db.get_ref(), mailer.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Artisan registered successfully. Please verify your email.",
        "user": artisan,
    })))
}

/// POST /auth/register/etablissement - Inscription d'un établissement (PUBLIC)
#[post("/register/etablissement")]
pub async fn register_etablissement(
    body: web::Json<RegisterEtablissementRequest>,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, AppError> {
    let etablissement =
        AuthService::register_etablissement(db.get_ref(), mailer.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Etablissement registered successfully. Please verify your email.",
        "user": etablissement,
    })))
}

/// POST /auth/login - Se connecter, tous types de comptes (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let response = AuthService::login(db.get_ref(), body.into_inner(), &config.jwt_secret).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /auth/me - Compte du token (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let account = AccountService::require_ref(db.get_ref(), auth_user.account).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "userType": account.kind(),
        "user": account,
    })))
}

/// PUT /auth/update-password - Changer son mot de passe
#[put("/update-password")]
pub async fn update_password(
    body: web::Json<UpdatePasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    AuthService::update_password(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password updated successfully"
    })))
}

/// PUT /auth/update-email - Changer son e-mail (mot de passe requis)
#[put("/update-email")]
pub async fn update_email(
    body: web::Json<UpdateEmailRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let account = AuthService::update_email(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Email updated successfully",
        "user": account,
    })))
}

/// POST /auth/verify-email/{kind} - Valider le code reçu par e-mail
#[post("/verify-email/{kind}")]
pub async fn verify_email(
    path: web::Path<AccountKind>,
    body: web::Json<EmailCodeRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    AuthService::verify_email(db.get_ref(), path.into_inner(), &body.email, &body.code, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Email verified successfully" })))
}

/// POST /auth/resend-verification/{kind} - Renvoyer un code de vérification
#[post("/resend-verification/{kind}")]
pub async fn resend_verification(
    path: web::Path<AccountKind>,
    body: web::Json<EmailRequest>,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, AppError> {
    AuthService::resend_verification(db.get_ref(), mailer.get_ref(), path.into_inner(), &body.email, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Verification code sent" })))
}

/// POST /auth/reset-password/request - Envoyer un code de réinitialisation
#[post("/reset-password/request")]
pub async fn request_password_reset(
    body: web::Json<EmailRequest>,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, AppError> {
    AuthService::request_password_reset(db.get_ref(), mailer.get_ref(), &body.email, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Reset code sent to your email" })))
}

/// POST /auth/reset-password/verify - Vérifier un code de réinitialisation
#[post("/reset-password/verify")]
pub async fn verify_reset_code(
    body: web::Json<EmailCodeRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    AuthService::verify_reset_code(db.get_ref(), &body.email, &body.code, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "valid": true })))
}

/// POST /auth/reset-password - Nouveau mot de passe avec le code
#[post("/reset-password")]
pub async fn reset_password(
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    AuthService::reset_password(db.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password reset successfully" })))
}

/// PUT /auth/{kind}/{id}/update-image - Nom du fichier image déjà stocké
#[put("/{kind}/{id}/update-image")]
pub async fn update_image(
    path: web::Path<(AccountKind, i32)>,
    body: web::Json<ImageUpdateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (kind, id) = path.into_inner();
    if body.image.trim().is_empty() {
        return Err(AppError::Validation("Image file name is required".into()));
    }
    let account = AccountRef::new(kind, id);
    AccountService::update_image(db.get_ref(), account, body.image.trim()).await?;
    Ok(HttpResponse::Ok().json(AccountService::require_ref(db.get_ref(), account).await?))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register_user)
        .service(register_artisan)
        .service(register_etablissement)
        .service(login)
        .service(me)
        .service(update_password)
        .service(update_email)
        .service(verify_email)
        .service(resend_verification)
        .service(request_password_reset)
        .service(verify_reset_code)
        .service(reset_password)
        .service(update_image);
}
