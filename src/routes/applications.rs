use actix_web::{HttpResponse, get, post, put, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::dto::{ApplicationCheckQuery, CreateArtisanApplicationRequest, CreateUserApplicationRequest};
use crate::services::application_service::ApplicationService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostulantFilter {
    pub etablissement_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanFilter {
    pub artisan_id: Option<i32>,
}

/// POST /user-postuler - Postuler à une offre (ouvre aussi la demande d'embauche)
#[post("")]
pub async fn apply(
    body: web::Json<CreateUserApplicationRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let application = ApplicationService::apply_user(db.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(application))
}

/// GET /user-postuler?etablissementId= - Postulants avec statut d'embauche
#[get("")]
pub async fn postulants(
    query: web::Query<PostulantFilter>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApplicationService::postulants(db.get_ref(), query.etablissement_id).await?))
}

/// GET /user-postuler/check?userId=&etablissementId=&offerId=
#[get("/check")]
pub async fn check(
    query: web::Query<ApplicationCheckQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApplicationService::check(db.get_ref(), query.into_inner()).await?))
}

/// GET /user-postuler/user/{userId} - Candidatures d'un user
#[get("/user/{user_id}")]
pub async fn for_user(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApplicationService::for_user(db.get_ref(), path.into_inner()).await?))
}

/// GET /user-postuler/postulant/{id}
#[get("/postulant/{id}")]
pub async fn postulant(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApplicationService::postulant(db.get_ref(), path.into_inner()).await?))
}

/// PUT /user-postuler/reset-notification/{etablissementId}
#[put("/reset-notification/{etablissement_id}")]
pub async fn reset_notification(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ApplicationService::reset_notification(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Notification reset" })))
}

/// POST /artisana-postuler - Dossier de réalisations d'un artisan
#[post("")]
pub async fn apply_artisan(
    body: web::Json<CreateArtisanApplicationRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let application = ApplicationService::apply_artisan(db.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(application))
}

/// GET /artisana-postuler?artisanId=
#[get("")]
pub async fn artisan_applications(
    query: web::Query<ArtisanFilter>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApplicationService::artisan_applications(db.get_ref(), query.artisan_id).await?))
}

pub fn application_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user-postuler")
            .service(apply)
            .service(postulants)
            .service(check)
            .service(for_user)
            .service(postulant)
            .service(reset_notification),
    )
    .service(
        web::scope("/artisana-postuler")
            .service(apply_artisan)
            .service(artisan_applications),
    );
}
