use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::dto::{CreateArtisanOfferRequest, CreateEtablissementOfferRequest, UpdateEtablissementOfferRequest};
use crate::services::offer_service::OfferService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtablissementFilter {
    pub etablissement_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanFilter {
    pub artisan_id: Option<i32>,
}

/// GET /etoffres?etablissementId=
#[get("")]
pub async fn list_etablissement_offers(
    query: web::Query<EtablissementFilter>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OfferService::etablissement_offers(db.get_ref(), query.etablissement_id).await?))
}

/// GET /etoffres/{id}
#[get("/{id}")]
pub async fn get_etablissement_offer(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OfferService::etablissement_offer(db.get_ref(), path.into_inner()).await?))
}

/// POST /etoffres - Publier une offre d'emploi
#[post("")]
pub async fn create_etablissement_offer(
    body: web::Json<CreateEtablissementOfferRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let offer = OfferService::create_etablissement_offer(db.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(offer))
}

/// PUT /etoffres/{id}
#[put("/{id}")]
pub async fn update_etablissement_offer(
    path: web::Path<i32>,
    body: web::Json<UpdateEtablissementOfferRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let offer = OfferService::update_etablissement_offer(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(offer))
}

/// DELETE /etoffres/{id}
#[delete("/{id}")]
pub async fn delete_etablissement_offer(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    OfferService::delete_etablissement_offer(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Offer deleted successfully" })))
}

/// POST /artoffre - Publier une prestation d'artisan
#[post("")]
pub async fn create_artisan_offer(
    body: web::Json<CreateArtisanOfferRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let offer = OfferService::create_artisan_offer(db.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(offer))
}

/// GET /artoffre?artisanId=
#[get("")]
pub async fn list_artisan_offers(
    query: web::Query<ArtisanFilter>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OfferService::artisan_offers(db.get_ref(), query.artisan_id).await?))
}

pub fn offer_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/etoffres")
            .service(list_etablissement_offers)
            .service(create_etablissement_offer)
            .service(get_etablissement_offer)
            .service(update_etablissement_offer)
            .service(delete_etablissement_offer),
    )
    .service(
        web::scope("/artoffre")
            .service(create_artisan_offer)
            .service(list_artisan_offers),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};

    use super::*;
    use crate::db::test_connection;
    use crate::test_support::seed_etablissement;

    #[actix_web::test]
    async fn test_etablissement_offer_crud() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let app = test::init_service(App::new().app_data(web::Data::new(db)).configure(offer_routes)).await;

        let req = test::TestRequest::post()
            .uri("/etoffres")
            .set_json(serde_json::json!({
                "etablissementId": etab.id,
                "titre": "Serveur",
                "description": "Service du soir",
                "budget": 1200.0
            }))
            .to_request();
        let offer: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(offer["typeContrat"], "CDI");
        let id = offer["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/etoffres?etablissementId={}", etab.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(|offers| offers.len()), Some(1));

        let req = test::TestRequest::delete().uri(&format!("/etoffres/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&format!("/etoffres/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
