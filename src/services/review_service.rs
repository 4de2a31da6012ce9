// Avis : artavis (avis d'un user sur un artisan) et useravis (avis liant un
// user et un artisan, consultés côté artisan). Note bornée à 1..5.

use chrono::{DateTime, Utc};
use sea_orm::*;
use validator::Validate;

use crate::error::AppError;
use crate::models::dto::{CreateReviewRequest, ReviewSummary};
use crate::models::{artisan_reviews, artisans, user_reviews, users};

pub struct ReviewService;

/// Moyenne arrondie à 2 décimales, 0 sans avis
pub fn summarize(rates: &[i32]) -> ReviewSummary {
    if rates.is_empty() {
        return ReviewSummary { total_reviews: 0, average_rate: 0.0 };
    }
    let average = rates.iter().map(|&r| r as f64).sum::<f64>() / rates.len() as f64;
    ReviewSummary {
        total_reviews: rates.len(),
        average_rate: (average * 100.0).round() / 100.0,
    }
}

async fn ensure_pair(db: &DatabaseConnection, user_id: i32, artisan_id: i32) -> Result<(), AppError> {
    users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("User", user_id))?;
    artisans::Entity::find_by_id(artisan_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Artisan", artisan_id))?;
    Ok(())
}

impl ReviewService {
    // ------------------------------------------------------------------
    // artavis
    // ------------------------------------------------------------------

    pub async fn create_artisan_review(
        db: &DatabaseConnection,
        artisan_id: i32,
        user_id: i32,
        dto: CreateReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<artisan_reviews::Model, AppError> {
        dto.validate()?;
        ensure_pair(db, user_id, artisan_id).await?;

        let review = artisan_reviews::ActiveModel {
            user_id: Set(user_id),
            artisan_id: Set(artisan_id),
            rate: Set(dto.rate),
            comment: Set(dto.comment),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(review_id = review.id, artisan_id, user_id, rate = review.rate, "artisan review created");
        Ok(review)
    }

    pub async fn artisan_reviews_by_user(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<artisan_reviews::Model>, AppError> {
        Ok(artisan_reviews::Entity::find()
            .filter(artisan_reviews::Column::UserId.eq(user_id))
            .order_by_desc(artisan_reviews::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn artisan_reviews_for(
        db: &DatabaseConnection,
        artisan_id: i32,
    ) -> Result<Vec<artisan_reviews::Model>, AppError> {
        Ok(artisan_reviews::Entity::find()
            .filter(artisan_reviews::Column::ArtisanId.eq(artisan_id))
            .order_by_desc(artisan_reviews::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn user_summary(db: &DatabaseConnection, user_id: i32) -> Result<ReviewSummary, AppError> {
        let rates: Vec<i32> = Self::artisan_reviews_by_user(db, user_id)
            .await?
            .into_iter()
            .map(|review| review.rate)
            .collect();
        Ok(summarize(&rates))
    }

    // ------------------------------------------------------------------
    // useravis
    // ------------------------------------------------------------------

    pub async fn create_user_review(
        db: &DatabaseConnection,
        user_id: i32,
        artisan_id: i32,
        dto: CreateReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<user_reviews::Model, AppError> {
        dto.validate()?;
        ensure_pair(db, user_id, artisan_id).await?;

        let review = user_reviews::ActiveModel {
            user_id: Set(user_id),
            artisan_id: Set(artisan_id),
            rate: Set(dto.rate),
            comment: Set(dto.comment),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(review_id = review.id, artisan_id, user_id, "user review created");
        Ok(review)
    }

    pub async fn user_reviews(db: &DatabaseConnection) -> Result<Vec<user_reviews::Model>, AppError> {
        Ok(user_reviews::Entity::find()
            .order_by_desc(user_reviews::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn user_reviews_by_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<user_reviews::Model>, AppError> {
        Ok(user_reviews::Entity::find()
            .filter(user_reviews::Column::UserId.eq(user_id))
            .order_by_desc(user_reviews::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn user_reviews_by_artisan(
        db: &DatabaseConnection,
        artisan_id: i32,
    ) -> Result<Vec<user_reviews::Model>, AppError> {
        Ok(user_reviews::Entity::find()
            .filter(user_reviews::Column::ArtisanId.eq(artisan_id))
            .order_by_desc(user_reviews::Column::CreatedAt)
            .all(db)
            .await?)
    }
}
