use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::dto::CreateReviewRequest;
use crate::services::review_service::ReviewService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerQuery {
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReviewedArtisanQuery {
    #[serde(rename = "artisanID", alias = "artisanId")]
    pub artisan_id: i32,
}

// ----------------------------------------------------------------------------
// /artavis : avis des users sur les artisans
// ----------------------------------------------------------------------------

/// POST /artavis/{artisanId}?userId= - Noter un artisan
#[post("/{artisan_id}")]
pub async fn create_artisan_review(
    path: web::Path<i32>,
    query: web::Query<ReviewerQuery>,
    body: web::Json<CreateReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let review =
        ReviewService::create_artisan_review(db.get_ref(), path.into_inner(), query.user_id, body.into_inner(), Utc::now())
            .await?;
    Ok(HttpResponse::Created().json(review))
}

/// GET /artavis/artisan/{artisanId} - Avis reçus par un artisan
#[get("/artisan/{artisan_id}")]
pub async fn reviews_for_artisan(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ReviewService::artisan_reviews_for(db.get_ref(), path.into_inner()).await?))
}

/// GET /artavis/{userId}/summary - { totalReviews, averageRate }
#[get("/{user_id}/summary")]
pub async fn user_summary(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ReviewService::user_summary(db.get_ref(), path.into_inner()).await?))
}

/// GET /artavis/{userId} - Avis écrits par un user
#[get("/{user_id}")]
pub async fn reviews_by_user(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ReviewService::artisan_reviews_by_user(db.get_ref(), path.into_inner()).await?))
}

// ----------------------------------------------------------------------------
// /useravis
// ----------------------------------------------------------------------------

/// GET /useravis
#[get("")]
pub async fn list_user_reviews(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ReviewService::user_reviews(db.get_ref()).await?))
}

/// GET /useravis/user/{userId}
#[get("/user/{user_id}")]
pub async fn user_reviews_by_user(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ReviewService::user_reviews_by_user(db.get_ref(), path.into_inner()).await?))
}

/// POST /useravis/{userId}?artisanID=
#[post("/{user_id}")]
pub async fn create_user_review(
    path: web::Path<i32>,
    query: web::Query<ReviewedArtisanQuery>,
    body: web::Json<CreateReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let review =
        ReviewService::create_user_review(db.get_ref(), path.into_inner(), query.artisan_id, body.into_inner(), Utc::now())
            .await?;
    Ok(HttpResponse::Created().json(review))
}

/// GET /useravis/{artisanId}
#[get("/{artisan_id}")]
pub async fn user_reviews_by_artisan(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ReviewService::user_reviews_by_artisan(db.get_ref(), path.into_inner()).await?))
}

pub fn review_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/artavis")
            .service(create_artisan_review)
            .service(reviews_for_artisan)
            .service(user_summary)
            .service(reviews_by_user),
    )
    .service(
        web::scope("/useravis")
            .service(list_user_reviews)
            .service(user_reviews_by_user)
            .service(create_user_review)
            .service(user_reviews_by_artisan),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};

    use super::*;
    use crate::db::test_connection;
    use crate::test_support::{seed_artisan, seed_user};

    #[actix_web::test]
    async fn test_artavis_summary() {
        let db = test_connection().await;
        let user = seed_user(&db, "a@x.com").await;
        let artisan = seed_artisan(&db, "art@x.com").await;
        let app = test::init_service(App::new().app_data(web::Data::new(db)).configure(review_routes)).await;

        for rate in [4, 5] {
            let req = test::TestRequest::post()
                .uri(&format!("/artavis/{}?userId={}", artisan.id, user.id))
                .set_json(serde_json::json!({ "rate": rate, "comment": "Bien" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::post()
            .uri(&format!("/artavis/{}?userId={}", artisan.id, user.id))
            .set_json(serde_json::json!({ "rate": 0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/artavis/{}/summary", user.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalReviews"], 2);
        assert_eq!(body["averageRate"], 4.5);

        let req = test::TestRequest::get()
            .uri(&format!("/artavis/artisan/{}", artisan.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(|reviews| reviews.len()), Some(2));
    }

    #[actix_web::test]
    async fn test_useravis_by_artisan() {
        let db = test_connection().await;
        let user = seed_user(&db, "a@x.com").await;
        let artisan = seed_artisan(&db, "art@x.com").await;
        let app = test::init_service(App::new().app_data(web::Data::new(db)).configure(review_routes)).await;

        let req = test::TestRequest::post()
            .uri(&format!("/useravis/{}?artisanID={}", user.id, artisan.id))
            .set_json(serde_json::json!({ "rate": 3 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/useravis/{}", artisan.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(|reviews| reviews.len()), Some(1));
    }
}
