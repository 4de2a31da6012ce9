use actix_web::{HttpResponse, get, post, put, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::account::{AccountKind, AccountRef};
use crate::models::dto::{CreateEmbaucheRequest, EmbaucheActionRequest, EmbaucheRequestIdBody};
use crate::services::embauche_service::EmbaucheService;
use crate::services::order_service::OrderService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEmbaucheBody {
    pub user_id: i32,
    pub etablissement_id: i32,
    pub offer_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanEmbaucheBody {
    pub artisan_id: i32,
    pub etablissement_id: i32,
    pub offer_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEmbaucheQuery {
    pub user_id: i32,
    pub etablissement_id: i32,
}

// ----------------------------------------------------------------------------
// Routes montées sous /auth
// ----------------------------------------------------------------------------

/// POST /auth/user/request-embauche - Demande d'embauche d'un user
#[post("/user/request-embauche")]
pub async fn user_request(
    body: web::Json<UserEmbaucheBody>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let requester = AccountRef::new(AccountKind::User, body.user_id);
    let request =
        EmbaucheService::create_request(db.get_ref(), requester, body.etablissement_id, body.offer_id, Utc::now())
            .await?;
    Ok(HttpResponse::Created().json(request))
}

/// POST /auth/artisan/request-embauche - Demande d'embauche d'un artisan
#[post("/artisan/request-embauche")]
pub async fn artisan_request(
    body: web::Json<ArtisanEmbaucheBody>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let requester = AccountRef::new(AccountKind::Artisan, body.artisan_id);
    let request =
        EmbaucheService::create_request(db.get_ref(), requester, body.etablissement_id, body.offer_id, Utc::now())
            .await?;
    Ok(HttpResponse::Created().json(request))
}

/// PUT /auth/embauche-request/accept - { requestId }
#[put("/embauche-request/accept")]
pub async fn accept_by_body(
    body: web::Json<EmbaucheRequestIdBody>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::accept(db.get_ref(), body.request_id, Utc::now()).await?))
}

/// PUT /auth/embauche-request/refuse - { requestId }
#[put("/embauche-request/refuse")]
pub async fn refuse_by_body(
    body: web::Json<EmbaucheRequestIdBody>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::refuse(db.get_ref(), body.request_id, Utc::now()).await?))
}

pub fn embauche_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(user_request)
        .service(artisan_request)
        .service(accept_by_body)
        .service(refuse_by_body);
}

// ----------------------------------------------------------------------------
// Scope /embauche-requests
// ----------------------------------------------------------------------------

/// POST /embauche-requests - Exactement un de userId / artisanId
#[post("")]
pub async fn create(
    body: web::Json<CreateEmbaucheRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let request = EmbaucheService::create_from_dto(db.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(request))
}

/// POST /embauche-requests/process-pending-shares - Rejoue les partages en attente
#[post("/process-pending-shares")]
pub async fn process_pending_shares(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::process_pending_shares(db.get_ref(), Utc::now()).await?))
}

/// GET /embauche-requests/user/{id}
#[get("/user/{id}")]
pub async fn for_user(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::for_user(db.get_ref(), path.into_inner()).await?))
}

/// GET /embauche-requests/artisan/{id}
#[get("/artisan/{id}")]
pub async fn for_artisan(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::for_artisan(db.get_ref(), path.into_inner()).await?))
}

/// GET /embauche-requests/etablissement/{id}
#[get("/etablissement/{id}")]
pub async fn for_etablissement(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::for_etablissement(db.get_ref(), path.into_inner()).await?))
}

/// GET /embauche-requests/pending-count/{userId}
#[get("/pending-count/{user_id}")]
pub async fn pending_count(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let count = EmbaucheService::pending_count(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "count": count })))
}

/// PUT /embauche-requests/{id} - { action: "accept" | "refuse" }
#[put("/{id}")]
pub async fn apply_action(
    path: web::Path<i32>,
    body: web::Json<EmbaucheActionRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let request = EmbaucheService::apply_action(db.get_ref(), path.into_inner(), body.action, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// PUT /embauche-requests/{id}/accept
#[put("/{id}/accept")]
pub async fn accept(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::accept(db.get_ref(), path.into_inner(), Utc::now()).await?))
}

/// PUT /embauche-requests/{id}/refuse
#[put("/{id}/refuse")]
pub async fn refuse(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(EmbaucheService::refuse(db.get_ref(), path.into_inner(), Utc::now()).await?))
}

// ----------------------------------------------------------------------------
// Scope /cond-order
// ----------------------------------------------------------------------------

/// GET /cond-order/check-embauche?userId=&etablissementId=
#[get("/check-embauche")]
pub async fn check_embauche(
    query: web::Query<CheckEmbaucheQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let account = AccountRef::new(AccountKind::User, query.user_id);
    let is_embauched = EmbaucheService::is_embauched(db.get_ref(), account, query.etablissement_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "isEmbauched": is_embauched })))
}

/// GET /cond-order/etablissement/{e}/user/{u} - Ordres visibles par un employé
#[get("/etablissement/{etablissement_id}/user/{user_id}")]
pub async fn employee_orders(
    path: web::Path<(i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (etablissement_id, user_id) = path.into_inner();
    Ok(HttpResponse::Ok().json(OrderService::orders_for_employee(db.get_ref(), etablissement_id, user_id).await?))
}

pub fn embauche_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/embauche-requests")
            .service(create)
            .service(process_pending_shares)
            .service(for_user)
            .service(for_artisan)
            .service(for_etablissement)
            .service(pending_count)
            .service(apply_action)
            .service(accept)
            .service(refuse),
    )
    .service(
        web::scope("/cond-order")
            .service(check_embauche)
            .service(employee_orders),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};

    use super::*;
    use crate::db::test_connection;
    use crate::models::orders::OrderStatus;
    use crate::test_support::{seed_etablissement, seed_order, seed_user};

    #[actix_web::test]
    async fn test_accept_then_refuse_conflicts() {
        let db = test_connection().await;
        let user = seed_user(&db, "a@x.com").await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        seed_order(&db, etab.id, OrderStatus::AFaire, None).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .service(web::scope("/auth").configure(embauche_auth_routes))
                .configure(embauche_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/embauche-requests")
            .set_json(serde_json::json!({ "userId": user.id, "etablissementId": etab.id }))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/embauche-requests/pending-count/{}", user.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);

        let req = test::TestRequest::put()
            .uri("/auth/embauche-request/accept")
            .set_json(serde_json::json!({ "requestId": id }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "accepted");

        let req = test::TestRequest::put()
            .uri(&format!("/embauche-requests/{}", id))
            .set_json(serde_json::json!({ "action": "refuse" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // L'employé voit désormais les ordres de l'établissement
        let req = test::TestRequest::get()
            .uri(&format!("/cond-order/check-embauche?userId={}&etablissementId={}", user.id, etab.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["isEmbauched"], true);

        let req = test::TestRequest::get()
            .uri(&format!("/cond-order/etablissement/{}/user/{}", etab.id, user.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(|orders| orders.len()), Some(1));
    }

    #[actix_web::test]
    async fn test_create_requires_exactly_one_requester() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let app = test::init_service(App::new().app_data(web::Data::new(db)).configure(embauche_routes)).await;

        let req = test::TestRequest::post()
            .uri("/embauche-requests")
            .set_json(serde_json::json!({ "etablissementId": etab.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
