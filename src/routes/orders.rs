use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::account::{AccountKind, AccountRef};
use crate::models::dto::{CreateOrderRequest, ToggleSharingRequest, UpdateOrderRequest, UpdateOrderStatusRequest};
use crate::services::order_service::OrderService;

/// POST /etablissement/orders - Créer un ordre
#[post("")]
pub async fn create_order(
    body: web::Json<CreateOrderRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let order = OrderService::create(db.get_ref(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(order))
}

/// GET /etablissement/orders - Tous les ordres
#[get("")]
pub async fn list_orders(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OrderService::find_all(db.get_ref()).await?))
}

/// GET /etablissement/orders/approaching-deadline - Échéance aujourd'hui ou demain
#[get("/approaching-deadline")]
pub async fn approaching_deadline(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    Ok(HttpResponse::Ok().json(OrderService::approaching_deadline(db.get_ref(), None, today).await?))
}

/// GET /etablissement/orders/approaching-deadline/{etablissementId}
#[get("/approaching-deadline/{etablissement_id}")]
pub async fn approaching_deadline_for(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    Ok(HttpResponse::Ok().json(
        OrderService::approaching_deadline(db.get_ref(), Some(path.into_inner()), today).await?,
    ))
}

/// GET /etablissement/orders/by-etablissement/{id}
#[get("/by-etablissement/{etablissement_id}")]
pub async fn by_etablissement(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OrderService::by_etablissement(db.get_ref(), path.into_inner()).await?))
}

/// GET /etablissement/orders/shared/{etablissementId} - Ordres partagés avec les employés
#[get("/shared/{etablissement_id}")]
pub async fn shared_with_accepted(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OrderService::shared_with_accepted(db.get_ref(), path.into_inner()).await?))
}

/// GET /etablissement/orders/user/{id} - Ordres partagés avec un user
#[get("/user/{user_id}")]
pub async fn user_orders(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let account = AccountRef::new(AccountKind::User, path.into_inner());
    Ok(HttpResponse::Ok().json(OrderService::orders_for_account(db.get_ref(), account).await?))
}

/// GET /etablissement/orders/artisan/{id} - Ordres partagés avec un artisan
#[get("/artisan/{artisan_id}")]
pub async fn artisan_orders(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let account = AccountRef::new(AccountKind::Artisan, path.into_inner());
    Ok(HttpResponse::Ok().json(OrderService::orders_for_account(db.get_ref(), account).await?))
}

/// PUT /etablissement/orders/user-update-status/{id} - Statut changé par un employé (PROTÉGÉE)
#[put("/user-update-status/{id}")]
pub async fn update_status_as_employee(
    path: web::Path<i32>,
    body: web::Json<UpdateOrderStatusRequest>,
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let order =
        OrderService::update_status_as_account(db.get_ref(), path.into_inner(), auth_user.account, body.status, Utc::now())
            .await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PUT /etablissement/orders/{id} - Mise à jour partielle
#[put("/{id}")]
pub async fn update_order(
    path: web::Path<i32>,
    body: web::Json<UpdateOrderRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let order = OrderService::update(db.get_ref(), path.into_inner(), body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PUT /etablissement/orders/{id}/status
#[put("/{id}/status")]
pub async fn update_status(
    path: web::Path<i32>,
    body: web::Json<UpdateOrderStatusRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let order = OrderService::update_status(db.get_ref(), path.into_inner(), body.status, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PUT /etablissement/orders/{id}/sharing - { shared }
#[put("/{id}/sharing")]
pub async fn toggle_sharing(
    path: web::Path<i32>,
    body: web::Json<ToggleSharingRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let order = OrderService::toggle_sharing(db.get_ref(), path.into_inner(), body.shared, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// DELETE /etablissement/orders/{id}/completed - { success, message }
#[delete("/{id}/completed")]
pub async fn remove_completed(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OrderService::remove_completed(db.get_ref(), path.into_inner()).await?))
}

/// DELETE /etablissement/orders/{id} - Uniquement les ordres terminés
#[delete("/{id}")]
pub async fn delete_order(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    OrderService::remove(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /etablissement/orders/{id}
#[get("/{id}")]
pub async fn get_order(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(OrderService::find_one(db.get_ref(), path.into_inner()).await?))
}

pub fn order_routes(cfg: &mut web::ServiceConfig) {
    // Les chemins littéraux avant /{id}
    cfg.service(
        web::scope("/etablissement/orders")
            .service(create_order)
            .service(list_orders)
            .service(approaching_deadline)
            .service(approaching_deadline_for)
            .service(by_etablissement)
            .service(shared_with_accepted)
            .service(user_orders)
            .service(artisan_orders)
            .service(update_status_as_employee)
            .service(update_order)
            .service(update_status)
            .service(toggle_sharing)
            .service(remove_completed)
            .service(delete_order)
            .service(get_order),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use chrono::Duration;

    use super::*;
    use crate::config::AppConfig;
    use crate::db::test_connection;
    use crate::models::orders::OrderStatus;
    use crate::test_support::{seed_etablissement, seed_order, seed_user};
    use crate::utils::jwt;

    #[actix_web::test]
    async fn test_status_lifecycle_and_removal() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let app = test::init_service(App::new().app_data(web::Data::new(db)).configure(order_routes)).await;

        let req = test::TestRequest::post()
            .uri("/etablissement/orders")
            .set_json(serde_json::json!({ "etablissementId": etab.id, "demande": "Nettoyer la terrasse" }))
            .to_request();
        let order: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["status"], "a_faire");
        assert_eq!(order["priorite"], "normale");
        let id = order["id"].as_i64().unwrap();

        let req = test::TestRequest::delete()
            .uri(&format!("/etablissement/orders/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::put()
            .uri(&format!("/etablissement/orders/{}/status", id))
            .set_json(serde_json::json!({ "status": "termine" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "termine");

        let req = test::TestRequest::put()
            .uri(&format!("/etablissement/orders/{}/status", id))
            .set_json(serde_json::json!({ "status": "en_cours" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::delete()
            .uri(&format!("/etablissement/orders/{}/completed", id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = test::TestRequest::get()
            .uri(&format!("/etablissement/orders/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_approaching_deadline_route() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let today = Utc::now().date_naive();
        seed_order(&db, etab.id, OrderStatus::AFaire, Some(today + Duration::days(1))).await;
        seed_order(&db, etab.id, OrderStatus::AFaire, Some(today + Duration::days(5))).await;
        let app = test::init_service(App::new().app_data(web::Data::new(db)).configure(order_routes)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/etablissement/orders/approaching-deadline/{}", etab.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let orders = body.as_array().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["isUrgent"], true);
        assert_eq!(orders[0]["daysUntilDeadline"], 1);
    }

    #[actix_web::test]
    async fn test_employee_status_update_requires_share() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let order = seed_order(&db, etab.id, OrderStatus::AFaire, None).await;
        let config = AppConfig::for_tests();
        let token = jwt::generate_token(AccountRef::new(AccountKind::User, user.id), &user.email, &config.jwt_secret)
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(config))
                .configure(order_routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/etablissement/orders/user-update-status/{}", order.id))
            .set_json(serde_json::json!({ "status": "en_cours" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::put()
            .uri(&format!("/etablissement/orders/user-update-status/{}", order.id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(serde_json::json!({ "status": "en_cours" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
