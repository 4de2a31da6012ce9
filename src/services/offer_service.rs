use chrono::{DateTime, Utc};
use sea_orm::*;
use validator::Validate;

use crate::error::AppError;
use crate::models::dto::{
    CreateArtisanOfferRequest, CreateEtablissementOfferRequest, UpdateEtablissementOfferRequest,
};
use crate::models::{artisan_offers, artisans, etablissement_offers, etablissements};

pub struct OfferService;

impl OfferService {
    // ------------------------------------------------------------------
    // Offres des établissements (etoffres)
    // ------------------------------------------------------------------

    pub async fn create_etablissement_offer(
        db: &DatabaseConnection,
        dto: CreateEtablissementOfferRequest,
        now: DateTime<Utc>,
    ) -> Result<etablissement_offers::Model, AppError> {
        dto.validate()?;
        etablissements::Entity::find_by_id(dto.etablissement_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Etablissement", dto.etablissement_id))?;

        let offer = etablissement_offers::ActiveModel {
            etablissement_id: Set(dto.etablissement_id),
            titre: Set(dto.titre),
            description: Set(dto.description),
            type_contrat: Set(dto.type_contrat.unwrap_or_else(|| "CDI".to_string())),
            skills: Set(dto.skills.unwrap_or_else(|| "Aucune".to_string())),
            budget: Set(dto.budget),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(offer_id = offer.id, etablissement_id = offer.etablissement_id, "etablissement offer created");
        Ok(offer)
    }

    pub async fn etablissement_offers(
        db: &DatabaseConnection,
        etablissement_id: Option<i32>,
    ) -> Result<Vec<etablissement_offers::Model>, AppError> {
        let mut query = etablissement_offers::Entity::find();
        if let Some(etablissement_id) = etablissement_id {
            query = query.filter(etablissement_offers::Column::EtablissementId.eq(etablissement_id));
        }
        Ok(query
            .order_by_desc(etablissement_offers::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn etablissement_offer(db: &DatabaseConnection, id: i32) -> Result<etablissement_offers::Model, AppError> {
        etablissement_offers::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Offer", id))
    }

    pub async fn update_etablissement_offer(
        db: &DatabaseConnection,
        id: i32,
        dto: UpdateEtablissementOfferRequest,
    ) -> Result<etablissement_offers::Model, AppError> {
        dto.validate()?;
        let mut offer: etablissement_offers::ActiveModel = Self::etablissement_offer(db, id).await?.into();

        if let Some(titre) = dto.titre {
            offer.titre = Set(titre);
        }
        if let Some(description) = dto.description {
            offer.description = Set(description);
        }
        if let Some(type_contrat) = dto.type_contrat {
            offer.type_contrat = Set(type_contrat);
        }
        if let Some(skills) = dto.skills {
            offer.skills = Set(skills);
        }
        if let Some(budget) = dto.budget {
            offer.budget = Set(budget);
        }

        Ok(offer.update(db).await?)
    }

    pub async fn delete_etablissement_offer(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
        let result = etablissement_offers::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Offer", id));
        }
        tracing::info!(offer_id = id, "etablissement offer deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Offres des artisans (artoffre)
    // ------------------------------------------------------------------

    pub async fn create_artisan_offer(
        db: &DatabaseConnection,
        dto: CreateArtisanOfferRequest,
        now: DateTime<Utc>,
    ) -> Result<artisan_offers::Model, AppError> {
        dto.validate()?;
        artisans::Entity::find_by_id(dto.artisan_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Artisan", dto.artisan_id))?;

        let offer = artisan_offers::ActiveModel {
            artisan_id: Set(dto.artisan_id),
            title: Set(dto.title),
            description: Set(dto.description),
            prix: Set(dto.prix),
            image_proof_of_work: Set(dto.image_proof_of_work),
            images: Set(serde_json::json!(dto.images)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(offer_id = offer.id, artisan_id = offer.artisan_id, "artisan offer created");
        Ok(offer)
    }

    pub async fn artisan_offers(
        db: &DatabaseConnection,
        artisan_id: Option<i32>,
    ) -> Result<Vec<artisan_offers::Model>, AppError> {
        let mut query = artisan_offers::Entity::find();
        if let Some(artisan_id) = artisan_id {
            query = query.filter(artisan_offers::Column::ArtisanId.eq(artisan_id));
        }
        Ok(query
            .order_by_desc(artisan_offers::Column::CreatedAt)
            .all(db)
            .await?)
    }
}
