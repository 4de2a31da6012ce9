use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::services::directory_service::{DirectoryService, Lookup};
use crate::services::subscription_service::SubscriptionService;

#[derive(Debug, Deserialize)]
pub struct SpecialtyQuery {
    #[serde(default)]
    pub specialty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtablissementLookupQuery {
    pub id: Option<i32>,
    pub email: Option<String>,
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtablissementIdQuery {
    pub etablissement_id: i32,
}

/// Requêtes du tableau de bord : `requesterEmail` identifie l'appelant
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(rename = "type")]
    pub artisan_type: Option<String>,
    pub requester_email: Option<String>,
}

/// GET /auth/users - Tous les users
#[get("/users")]
pub async fn list_users(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::users(db.get_ref()).await?))
}

/// GET /auth/artisans - Tous les artisans
#[get("/artisans")]
pub async fn list_artisans(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::artisans(db.get_ref()).await?))
}

/// GET /auth/etablissements - Tous les établissements
#[get("/etablissements")]
pub async fn list_etablissements(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::etablissements(db.get_ref()).await?))
}

/// GET /auth/artisan/{id}
#[get("/artisan/{id}")]
pub async fn get_artisan(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::artisan(db.get_ref(), path.into_inner()).await?))
}

/// GET /auth/artisans-by-specialty?specialty=
#[get("/artisans-by-specialty")]
pub async fn artisans_by_specialty(
    query: web::Query<SpecialtyQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::artisans_by_specialty(db.get_ref(), &query.specialty).await?))
}

/// GET /auth/user-name?id=|email= - Profil d'un user (null si absent)
#[get("/user-name")]
pub async fn user_by(query: web::Query<Lookup>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::user_by(db.get_ref(), &query).await?))
}

/// GET /auth/artisan-name?id=|email= - Profil d'un artisan avec offres et avis
#[get("/artisan-name")]
pub async fn artisan_by(query: web::Query<Lookup>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::artisan_by(db.get_ref(), &query).await?))
}

/// GET /auth/etablissement-name?id=|email=&userId= - Profil d'un établissement
#[get("/etablissement-name")]
pub async fn etablissement_by(
    query: web::Query<EtablissementLookupQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let lookup = Lookup { id: query.id, email: query.email };
    Ok(HttpResponse::Ok().json(DirectoryService::etablissement_by(db.get_ref(), &lookup, query.user_id).await?))
}

/// GET /auth/etablissement/requests?etablissementId= - Demandes d'embauche reçues
#[get("/etablissement/requests")]
pub async fn etablissement_requests(
    query: web::Query<EtablissementIdQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(DirectoryService::etablissement_requests(db.get_ref(), query.etablissement_id).await?))
}

/// GET /auth/artisans-with-avisbytype?type= - Artisans avec leurs avis
#[get("/artisans-with-avisbytype")]
pub async fn artisans_with_reviews(
    query: web::Query<DashboardQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(
        DirectoryService::artisans_with_reviews(db.get_ref(), query.artisan_type.as_deref()).await?,
    ))
}

/// GET /auth/artisans-by-type?type=&requesterEmail= (TABLEAU DE BORD)
#[get("/artisans-by-type")]
pub async fn artisans_by_type(
    query: web::Query<DashboardQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    SubscriptionService::require_dashboard_access(db.get_ref(), query.requester_email.as_deref(), now).await?;
    Ok(HttpResponse::Ok().json(
        DirectoryService::artisans_by_type(db.get_ref(), query.artisan_type.as_deref(), now).await?,
    ))
}

/// GET /auth/artisans-by-type-offer (TABLEAU DE BORD)
#[get("/artisans-by-type-offer")]
pub async fn artisans_by_type_with_offers(
    query: web::Query<DashboardQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    SubscriptionService::require_dashboard_access(db.get_ref(), query.requester_email.as_deref(), now).await?;
    Ok(HttpResponse::Ok().json(DirectoryService::artisans_by_type_with_offers(db.get_ref(), now).await?))
}

/// GET /auth/artisans-with-offres (TABLEAU DE BORD)
#[get("/artisans-with-offres")]
pub async fn artisans_with_offers(
    query: web::Query<DashboardQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    SubscriptionService::require_dashboard_access(db.get_ref(), query.requester_email.as_deref(), now).await?;
    Ok(HttpResponse::Ok().json(DirectoryService::artisans_with_offers(db.get_ref(), now).await?))
}

/// GET /auth/etablissements-with-offres (TABLEAU DE BORD)
#[get("/etablissements-with-offres")]
pub async fn etablissements_with_offers(
    query: web::Query<DashboardQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    SubscriptionService::require_dashboard_access(db.get_ref(), query.requester_email.as_deref(), now).await?;
    Ok(HttpResponse::Ok().json(DirectoryService::etablissements_with_offers(db.get_ref(), now).await?))
}

pub fn directory_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(list_artisans)
        .service(list_etablissements)
        .service(get_artisan)
        .service(artisans_by_specialty)
        .service(user_by)
        .service(artisan_by)
        .service(etablissement_by)
        .service(etablissement_requests)
        .service(artisans_with_reviews)
        .service(artisans_by_type)
        .service(artisans_by_type_with_offers)
        .service(artisans_with_offers)
        .service(etablissements_with_offers);
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use chrono::Duration;
    use sea_orm::*;

    use super::*;
    use crate::db::test_connection;
    use crate::models::account::{PaymentStatus, SubscriptionStatus};
    use crate::models::users;
    use crate::test_support::{seed_artisan, seed_artisan_of_type, seed_user};

    #[actix_web::test]
    async fn test_dashboard_denied_for_expired_requester() {
        let db = test_connection().await;
        let user = seed_user(&db, "late@x.com").await;
        seed_artisan_of_type(&db, "art@x.com", "Plombier", PaymentStatus::Payed).await;
        seed_artisan(&db, "unpaid@x.com").await;

        let mut expired: users::ActiveModel = user.into();
        expired.subscription_status = Set(SubscriptionStatus::Expired);
        expired.subscription_end_date = Set(Some(Utc::now() - Duration::days(1)));
        expired.update(&db).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .service(web::scope("/auth").configure(directory_routes)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/auth/artisans-with-offres?requesterEmail=late@x.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["subscriptionRequired"], true);

        // Sans demandeur, seuls les artisans payés sont listés
        let req = test::TestRequest::get().uri("/auth/artisans-with-offres").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    }

    #[actix_web::test]
    async fn test_unknown_profile_is_null() {
        let db = test_connection().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .service(web::scope("/auth").configure(directory_routes)),
        )
        .await;

        let req = test::TestRequest::get().uri("/auth/user-name?email=ghost@x.com").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_null());
    }
}
