// ============================================================================
// SERVICE : ANNUAIRE ET TABLEAU DE BORD
// ============================================================================
//
// Listes publiques des comptes, profils et vues du tableau de bord.
// Les vues du tableau de bord (artisans par type, artisans / établissements
// avec offres) ne montrent que les comptes qui peuvent eux-mêmes accéder au
// tableau de bord ; le contrôle du demandeur est fait par la route.
//
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::account::Account;
use crate::models::embauche_requests::{self, EmbaucheStatus};
use crate::models::{
    artisan_offers, artisan_reviews, artisans, etablissement_offers, etablissements, users,
};
use crate::services::account_service::normalize_email;
use crate::services::subscription_service::can_access_dashboard;

const DEFAULT_ARTISAN_TYPE: &str = "Autre";

/// Recherche d'un compte par id ou par e-mail (`?id=` ou `?email=`)
#[derive(Debug, Default, Deserialize)]
pub struct Lookup {
    pub id: Option<i32>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArtisanWithOffers {
    #[serde(flatten)]
    pub artisan: artisans::Model,
    pub offres: Vec<artisan_offers::Model>,
}

#[derive(Debug, Serialize)]
pub struct ArtisanWithReviews {
    #[serde(flatten)]
    pub artisan: artisans::Model,
    pub avis: Vec<artisan_reviews::Model>,
}

#[derive(Debug, Serialize)]
pub struct ArtisanProfile {
    #[serde(flatten)]
    pub artisan: artisans::Model,
    pub offres: Vec<artisan_offers::Model>,
    pub avis: Vec<artisan_reviews::Model>,
}

#[derive(Debug, Serialize)]
pub struct EtablissementWithOffers {
    #[serde(flatten)]
    pub etablissement: etablissements::Model,
    pub offres: Vec<etablissement_offers::Model>,
}

/// Offre vue par un user : son propre statut et les autres demandes
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferWithApplicationStatus {
    #[serde(flatten)]
    pub offer: etablissement_offers::Model,
    pub user_application_status: Option<EmbaucheStatus>,
    pub embauche_requests: Vec<embauche_requests::Model>,
}

#[derive(Debug, Serialize)]
pub struct EtablissementProfile {
    #[serde(flatten)]
    pub etablissement: etablissements::Model,
    pub offres: Vec<OfferWithApplicationStatus>,
}

#[derive(Debug, Serialize)]
pub struct EmbaucheRequestView {
    #[serde(flatten)]
    pub request: embauche_requests::Model,
    pub user: Option<users::Model>,
    pub artisan: Option<artisans::Model>,
}

/// Sans type : artisans groupés par type ; avec type : liste simple
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ArtisansByType {
    Grouped(BTreeMap<String, Vec<artisans::Model>>),
    List(Vec<artisans::Model>),
}

fn visible(artisan: &artisans::Model, now: DateTime<Utc>) -> bool {
    can_access_dashboard(&Account::Artisan(artisan.clone()), now)
}

pub fn group_by_type(artisans: Vec<artisans::Model>) -> BTreeMap<String, Vec<artisans::Model>> {
    let mut grouped: BTreeMap<String, Vec<artisans::Model>> = BTreeMap::new();
    for artisan in artisans {
        let key = artisan
            .artisan_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ARTISAN_TYPE.to_string());
        grouped.entry(key).or_default().push(artisan);
    }
    grouped
}

pub struct DirectoryService;

impl DirectoryService {
    pub async fn users(db: &DatabaseConnection) -> Result<Vec<users::Model>, AppError> {
        Ok(users::Entity::find().order_by_asc(users::Column::Id).all(db).await?)
    }

    pub async fn artisans(db: &DatabaseConnection) -> Result<Vec<artisans::Model>, AppError> {
        Ok(artisans::Entity::find().order_by_asc(artisans::Column::Id).all(db).await?)
    }

    pub async fn etablissements(db: &DatabaseConnection) -> Result<Vec<etablissements::Model>, AppError> {
        Ok(etablissements::Entity::find()
            .order_by_asc(etablissements::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn artisan(db: &DatabaseConnection, id: i32) -> Result<artisans::Model, AppError> {
        artisans::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Artisan", id))
    }

    pub async fn artisans_by_specialty(
        db: &DatabaseConnection,
        specialty: &str,
    ) -> Result<Vec<artisans::Model>, AppError> {
        if specialty.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(artisans::Entity::find()
            .filter(artisans::Column::ArtisanType.eq(specialty.trim()))
            .all(db)
            .await?)
    }

    pub async fn user_by(db: &DatabaseConnection, lookup: &Lookup) -> Result<Option<users::Model>, AppError> {
        let query = match (lookup.id, &lookup.email) {
            (Some(id), _) => users::Entity::find_by_id(id),
            (None, Some(email)) => users::Entity::find().filter(users::Column::Email.eq(normalize_email(email))),
            (None, None) => return Ok(None),
        };
        Ok(query.one(db).await?)
    }

    /// Profil artisan avec ses offres et ses avis
    pub async fn artisan_by(db: &DatabaseConnection, lookup: &Lookup) -> Result<Option<ArtisanProfile>, AppError> {
        let query = match (lookup.id, &lookup.email) {
            (Some(id), _) => artisans::Entity::find_by_id(id),
            (None, Some(email)) => {
                artisans::Entity::find().filter(artisans::Column::Email.eq(normalize_email(email)))
            }
            (None, None) => return Ok(None),
        };
        let Some(artisan) = query.one(db).await? else {
            return Ok(None);
        };

        let offres = artisan.find_related(artisan_offers::Entity).all(db).await?;
        let avis = artisan.find_related(artisan_reviews::Entity).all(db).await?;
        Ok(Some(ArtisanProfile { artisan, offres, avis }))
    }

    /// Profil établissement ; avec `user_id`, chaque offre porte le statut
    /// de la demande de ce user et les demandes des autres candidats
    pub async fn etablissement_by(
        db: &DatabaseConnection,
        lookup: &Lookup,
        user_id: Option<i32>,
    ) -> Result<Option<EtablissementProfile>, AppError> {
        let query = match (lookup.id, &lookup.email) {
            (Some(id), _) => etablissements::Entity::find_by_id(id),
            (None, Some(email)) => etablissements::Entity::find()
                .filter(etablissements::Column::Email.eq(normalize_email(email))),
            (None, None) => return Ok(None),
        };
        let Some(etablissement) = query.one(db).await? else {
            return Ok(None);
        };

        let offers = etablissement.find_related(etablissement_offers::Entity).all(db).await?;
        let requests = embauche_requests::Entity::find()
            .filter(embauche_requests::Column::EtablissementId.eq(etablissement.id))
            .order_by_desc(embauche_requests::Column::CreatedAt)
            .all(db)
            .await?;

        let offres = offers
            .into_iter()
            .map(|offer| {
                let offer_id = offer.id;
                let for_offer = requests.iter().filter(move |r| r.offer_id == Some(offer_id));
                let user_application_status = user_id.and_then(|uid| {
                    for_offer.clone().find(|r| r.user_id == Some(uid)).map(|r| r.status)
                });
                let embauche_requests = for_offer
                    .filter(|r| user_id.is_none() || r.user_id != user_id)
                    .cloned()
                    .collect();
                OfferWithApplicationStatus { offer, user_application_status, embauche_requests }
            })
            .collect();

        Ok(Some(EtablissementProfile { etablissement, offres }))
    }

    pub async fn etablissement_requests(
        db: &DatabaseConnection,
        etablissement_id: i32,
    ) -> Result<Vec<EmbaucheRequestView>, AppError> {
        let requests = embauche_requests::Entity::find()
            .filter(embauche_requests::Column::EtablissementId.eq(etablissement_id))
            .order_by_desc(embauche_requests::Column::CreatedAt)
            .all(db)
            .await?;

        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let user = match request.user_id {
                Some(id) => users::Entity::find_by_id(id).one(db).await?,
                None => None,
            };
            let artisan = match request.artisan_id {
                Some(id) => artisans::Entity::find_by_id(id).one(db).await?,
                None => None,
            };
            views.push(EmbaucheRequestView { request, user, artisan });
        }
        Ok(views)
    }

    // ------------------------------------------------------------------
    // Vues du tableau de bord (filtrées sur l'abonnement)
    // ------------------------------------------------------------------

    pub async fn artisans_by_type(
        db: &DatabaseConnection,
        artisan_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ArtisansByType, AppError> {
        let mut query = artisans::Entity::find().order_by_asc(artisans::Column::Id);
        if let Some(artisan_type) = artisan_type.filter(|t| !t.trim().is_empty()) {
            query = query.filter(artisans::Column::ArtisanType.eq(artisan_type.trim()));
            let list = query.all(db).await?.into_iter().filter(|a| visible(a, now)).collect();
            return Ok(ArtisansByType::List(list));
        }

        let visible_artisans = query.all(db).await?.into_iter().filter(|a| visible(a, now)).collect();
        Ok(ArtisansByType::Grouped(group_by_type(visible_artisans)))
    }

    pub async fn artisans_with_offers(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArtisanWithOffers>, AppError> {
        let artisans: Vec<artisans::Model> = artisans::Entity::find()
            .order_by_asc(artisans::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter(|a| visible(a, now))
            .collect();
        let offers = artisans.load_many(artisan_offers::Entity, db).await?;

        Ok(artisans
            .into_iter()
            .zip(offers)
            .map(|(artisan, offres)| ArtisanWithOffers { artisan, offres })
            .collect())
    }

    /// Artisans visibles groupés par type, chacun avec ses offres
    pub async fn artisans_by_type_with_offers(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, Vec<ArtisanWithOffers>>, AppError> {
        let mut grouped: BTreeMap<String, Vec<ArtisanWithOffers>> = BTreeMap::new();
        for entry in Self::artisans_with_offers(db, now).await? {
            let key = entry
                .artisan
                .artisan_type
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ARTISAN_TYPE.to_string());
            grouped.entry(key).or_default().push(entry);
        }
        Ok(grouped)
    }

    pub async fn etablissements_with_offers(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<Vec<EtablissementWithOffers>, AppError> {
        let etablissements: Vec<etablissements::Model> = etablissements::Entity::find()
            .order_by_asc(etablissements::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter(|e| can_access_dashboard(&Account::Etablissement(e.clone()), now))
            .collect();
        let offers = etablissements.load_many(etablissement_offers::Entity, db).await?;

        Ok(etablissements
            .into_iter()
            .zip(offers)
            .map(|(etablissement, offres)| EtablissementWithOffers { etablissement, offres })
            .collect())
    }

    pub async fn artisans_with_reviews(
        db: &DatabaseConnection,
        artisan_type: Option<&str>,
    ) -> Result<Vec<ArtisanWithReviews>, AppError> {
        let mut query = artisans::Entity::find().order_by_asc(artisans::Column::Id);
        if let Some(artisan_type) = artisan_type.filter(|t| !t.trim().is_empty()) {
            query = query.filter(artisans::Column::ArtisanType.eq(artisan_type.trim()));
        }
        let artisans = query.all(db).await?;
        let reviews = artisans.load_many(artisan_reviews::Entity, db).await?;

        Ok(artisans
            .into_iter()
            .zip(reviews)
            .map(|(artisan, avis)| ArtisanWithReviews { artisan, avis })
            .collect())
    }
}
