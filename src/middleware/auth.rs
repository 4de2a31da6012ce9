use actix_web::{Error, FromRequest, HttpRequest, HttpResponse, dev::Payload, web};
use futures::future::{Ready, ready};
use serde::Serialize;

use crate::config::AppConfig;
use crate::models::account::AccountRef;
use crate::utils::jwt;

/// Compte authentifié par le header `Authorization: Bearer <token>`
/// Utilisé comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub account: AccountRef,
    pub email: String,
}

fn unauthorized(message: impl Into<String>) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": message.into()
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, Error> {
    // 1. Extraire le header Authorization
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    // 2. Extraire le token (format: "Bearer <token>")
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization format (expected: Bearer <token>)"))?;

    // 3. Vérifier le token avec le secret de la configuration
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| unauthorized("Authentication is not configured"))?;

    let claims = jwt::verify_token(token, &config.jwt_secret).map_err(unauthorized)?;

    Ok(AuthUser {
        account: claims.account(),
        email: claims.email,
    })
}
