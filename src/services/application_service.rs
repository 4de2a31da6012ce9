// ============================================================================
// SERVICE : CANDIDATURES (postuler)
// ============================================================================
//
// Candidature d'un user auprès d'un établissement : dans UNE transaction,
//   1. contrôle du doublon (user, etablissement, offre)
//   2. insertion de la candidature
//   3. drapeau `has_new_postulant` de l'établissement
//   4. ouverture de la demande d'embauche pending
// Un échec à n'importe quelle étape annule tout.
//
// Les candidatures artisan sont des dossiers de réalisations (titre,
// description, prix, images) sans établissement cible.
//
// ============================================================================

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;
use validator::Validate;

use crate::error::AppError;
use crate::models::account::{AccountKind, AccountRef};
use crate::models::dto::{
    ApplicationCheckQuery, ApplicationCheckResponse, CreateArtisanApplicationRequest,
    CreateUserApplicationRequest,
};
use crate::models::embauche_requests::{self, EmbaucheStatus};
use crate::models::{
    artisan_applications, artisans, etablissement_offers, etablissements, user_applications, users,
};
use crate::services::embauche_service::EmbaucheService;

/// Candidature accompagnée du candidat et de l'état de sa demande d'embauche
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Postulant {
    #[serde(flatten)]
    pub application: user_applications::Model,
    pub user: Option<users::Model>,
    pub embauche_status: Option<EmbaucheStatus>,
}

pub struct ApplicationService;

impl ApplicationService {
    pub async fn apply_user(
        db: &DatabaseConnection,
        dto: CreateUserApplicationRequest,
        now: DateTime<Utc>,
    ) -> Result<user_applications::Model, AppError> {
        let txn = db.begin().await?;

        // 1. Candidat, établissement et offre
        let user = users::Entity::find_by_id(dto.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("User", dto.user_id))?;
        etablissements::Entity::find_by_id(dto.etablissement_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Etablissement", dto.etablissement_id))?;
        if let Some(offer_id) = dto.offer_id {
            let offer = etablissement_offers::Entity::find_by_id(offer_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::not_found("Offer", offer_id))?;
            if offer.etablissement_id != dto.etablissement_id {
                return Err(AppError::Validation("Offer does not belong to this etablissement".into()));
            }
        }

        // 2. Une candidature par (user, etablissement, offre)
        if Self::find_existing(&txn, dto.user_id, dto.etablissement_id, dto.offer_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("You have already applied to this offer".into()));
        }

        // 3. Candidature (les liens du profil servent de valeurs par défaut)
        let application = user_applications::ActiveModel {
            user_id: Set(dto.user_id),
            etablissement_id: Set(dto.etablissement_id),
            offer_id: Set(dto.offer_id),
            cv: Set(dto.cv.or(user.cv)),
            github: Set(dto.github.or(user.github)),
            portfolio: Set(dto.portfolio.or(user.portfolio)),
            linkdin: Set(dto.linkdin.or(user.linkdin)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 4. Notification de l'établissement
        etablissements::Entity::update_many()
            .col_expr(etablissements::Column::HasNewPostulant, Expr::value(true))
            .filter(etablissements::Column::Id.eq(dto.etablissement_id))
            .exec(&txn)
            .await?;

        // 5. Demande d'embauche, dans la même transaction (une demande pending existante est reprise)
        EmbaucheService::open_or_reuse_request(
            &txn,
            AccountRef::new(AccountKind::User, dto.user_id),
            dto.etablissement_id,
            dto.offer_id,
            now,
        )
        .await?;

        txn.commit().await?;
        tracing::info!(
            application_id = application.id,
            user_id = dto.user_id,
            etablissement_id = dto.etablissement_id,
            "user application created"
        );
        Ok(application)
    }

    async fn find_existing<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        etablissement_id: i32,
        offer_id: Option<i32>,
    ) -> Result<Option<user_applications::Model>, DbErr> {
        let query = user_applications::Entity::find()
            .filter(user_applications::Column::UserId.eq(user_id))
            .filter(user_applications::Column::EtablissementId.eq(etablissement_id));
        let query = match offer_id {
            Some(offer_id) => query.filter(user_applications::Column::OfferId.eq(offer_id)),
            None => query.filter(user_applications::Column::OfferId.is_null()),
        };
        query.one(db).await
    }

    /// Statut de la dernière demande d'embauche liée à la candidature
    async fn embauche_status<C: ConnectionTrait>(
        db: &C,
        application: &user_applications::Model,
    ) -> Result<Option<EmbaucheStatus>, DbErr> {
        let query = embauche_requests::Entity::find()
            .filter(embauche_requests::Column::UserId.eq(application.user_id))
            .filter(embauche_requests::Column::EtablissementId.eq(application.etablissement_id));
        let query = match application.offer_id {
            Some(offer_id) => query.filter(embauche_requests::Column::OfferId.eq(offer_id)),
            None => query.filter(embauche_requests::Column::OfferId.is_null()),
        };
        Ok(query
            .order_by_desc(embauche_requests::Column::CreatedAt)
            .order_by_desc(embauche_requests::Column::Id)
            .one(db)
            .await?
            .map(|request| request.status))
    }

    async fn with_details(
        db: &DatabaseConnection,
        applications: Vec<user_applications::Model>,
    ) -> Result<Vec<Postulant>, AppError> {
        let mut postulants = Vec::with_capacity(applications.len());
        for application in applications {
            let user = users::Entity::find_by_id(application.user_id).one(db).await?;
            let embauche_status = Self::embauche_status(db, &application).await?;
            postulants.push(Postulant { application, user, embauche_status });
        }
        Ok(postulants)
    }

    pub async fn for_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<Postulant>, AppError> {
        let applications = user_applications::Entity::find()
            .filter(user_applications::Column::UserId.eq(user_id))
            .order_by_desc(user_applications::Column::CreatedAt)
            .all(db)
            .await?;
        Self::with_details(db, applications).await
    }

    /// Toutes les candidatures, ou celles d'un établissement
    pub async fn postulants(db: &DatabaseConnection, etablissement_id: Option<i32>) -> Result<Vec<Postulant>, AppError> {
        let mut query = user_applications::Entity::find();
        if let Some(etablissement_id) = etablissement_id {
            query = query.filter(user_applications::Column::EtablissementId.eq(etablissement_id));
        }
        let applications = query
            .order_by_desc(user_applications::Column::CreatedAt)
            .all(db)
            .await?;
        Self::with_details(db, applications).await
    }

    pub async fn postulant(db: &DatabaseConnection, id: i32) -> Result<Postulant, AppError> {
        let application = user_applications::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Application", id))?;
        let mut postulants = Self::with_details(db, vec![application]).await?;
        postulants
            .pop()
            .ok_or_else(|| AppError::not_found("Application", id))
    }

    pub async fn check(
        db: &DatabaseConnection,
        query: ApplicationCheckQuery,
    ) -> Result<ApplicationCheckResponse, AppError> {
        let existing = Self::find_existing(db, query.user_id, query.etablissement_id, query.offer_id).await?;
        Ok(match existing {
            Some(application) => ApplicationCheckResponse {
                has_applied: true,
                application_id: Some(application.id),
                embauche_status: Self::embauche_status(db, &application).await?,
            },
            None => ApplicationCheckResponse {
                has_applied: false,
                application_id: None,
                embauche_status: None,
            },
        })
    }

    /// L'établissement a consulté ses nouvelles candidatures
    pub async fn reset_notification(db: &DatabaseConnection, etablissement_id: i32) -> Result<(), AppError> {
        let result = etablissements::Entity::update_many()
            .col_expr(etablissements::Column::HasNewPostulant, Expr::value(false))
            .filter(etablissements::Column::Id.eq(etablissement_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Etablissement", etablissement_id));
        }
        Ok(())
    }

    pub async fn apply_artisan(
        db: &DatabaseConnection,
        dto: CreateArtisanApplicationRequest,
        now: DateTime<Utc>,
    ) -> Result<artisan_applications::Model, AppError> {
        dto.validate()?;
        artisans::Entity::find_by_id(dto.artisan_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Artisan", dto.artisan_id))?;

        let application = artisan_applications::ActiveModel {
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

        tracing::info!(application_id = application.id, artisan_id = dto.artisan_id, "artisan application created");
        Ok(application)
    }

    pub async fn artisan_applications(
        db: &DatabaseConnection,
        artisan_id: Option<i32>,
    ) -> Result<Vec<artisan_applications::Model>, AppError> {
        let mut query = artisan_applications::Entity::find();
        if let Some(artisan_id) = artisan_id {
            query = query.filter(artisan_applications::Column::ArtisanId.eq(artisan_id));
        }
        Ok(query
            .order_by_desc(artisan_applications::Column::CreatedAt)
            .all(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::test_support::{seed_artisan, seed_etablissement, seed_offer, seed_user};

    fn application(user_id: i32, etablissement_id: i32, offer_id: Option<i32>) -> CreateUserApplicationRequest {
        CreateUserApplicationRequest {
            user_id,
            etablissement_id,
            offer_id,
            cv: Some("cv.pdf".into()),
            github: None,
            portfolio: None,
            linkdin: None,
        }
    }

    #[tokio::test]
    async fn test_apply_flags_etablissement_and_opens_request() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let offer = seed_offer(&db, etab.id, "Dev").await;

        let created = ApplicationService::apply_user(&db, application(user.id, etab.id, Some(offer.id)), Utc::now())
            .await
            .unwrap();
        assert_eq!(created.cv.as_deref(), Some("cv.pdf"));

        let etab = etablissements::Entity::find_by_id(etab.id).one(&db).await.unwrap().unwrap();
        assert!(etab.has_new_postulant);

        let check = ApplicationService::check(
            &db,
            ApplicationCheckQuery { user_id: user.id, etablissement_id: etab.id, offer_id: Some(offer.id) },
        )
        .await
        .unwrap();
        assert!(check.has_applied);
        assert_eq!(check.embauche_status, Some(EmbaucheStatus::Pending));

        ApplicationService::reset_notification(&db, etab.id).await.unwrap();
        let etab = etablissements::Entity::find_by_id(etab.id).one(&db).await.unwrap().unwrap();
        assert!(!etab.has_new_postulant);
    }

    #[tokio::test]
    async fn test_second_application_is_rejected_and_leaves_no_trace() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let offer = seed_offer(&db, etab.id, "Dev").await;

        ApplicationService::apply_user(&db, application(user.id, etab.id, Some(offer.id)), Utc::now())
            .await
            .unwrap();
        let err = ApplicationService::apply_user(&db, application(user.id, etab.id, Some(offer.id)), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(ApplicationService::for_user(&db, user.id).await.unwrap().len(), 1);
        assert_eq!(embauche_requests::Entity::find().all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_application_reuses_pending_request() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let offer = seed_offer(&db, etab.id, "Dev").await;

        // Demande directe pour l'offre, puis candidature spontanée
        let direct = EmbaucheService::create_request(
            &db,
            AccountRef::new(AccountKind::User, user.id),
            etab.id,
            Some(offer.id),
            Utc::now(),
        )
        .await
        .unwrap();
        let created = ApplicationService::apply_user(&db, application(user.id, etab.id, None), Utc::now())
            .await
            .unwrap();
        assert_eq!(created.user_id, user.id);
        assert_eq!(ApplicationService::for_user(&db, user.id).await.unwrap().len(), 1);

        let requests = embauche_requests::Entity::find().all(&db).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, direct.id);

        let etab = etablissements::Entity::find_by_id(etab.id).one(&db).await.unwrap().unwrap();
        assert!(etab.has_new_postulant);
    }

    #[tokio::test]
    async fn test_offer_must_belong_to_etablissement() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let other = seed_etablissement(&db, "other@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let offer = seed_offer(&db, other.id, "Dev").await;

        let err = ApplicationService::apply_user(&db, application(user.id, etab.id, Some(offer.id)), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_postulants_carry_user_and_status() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let created = ApplicationService::apply_user(&db, application(user.id, etab.id, None), Utc::now())
            .await
            .unwrap();

        let postulant = ApplicationService::postulant(&db, created.id).await.unwrap();
        assert_eq!(postulant.user.unwrap().email, "a@x.com");
        assert_eq!(postulant.embauche_status, Some(EmbaucheStatus::Pending));

        let json = serde_json::to_value(&ApplicationService::postulants(&db, Some(etab.id)).await.unwrap()).unwrap();
        assert_eq!(json[0]["embaucheStatus"], "pending");
        assert_eq!(json[0]["userId"], user.id);
        assert!(json[0]["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_artisan_application_stores_images() {
        let db = test_connection().await;
        let artisan = seed_artisan(&db, "art@x.com").await;
        let dto = CreateArtisanApplicationRequest {
            artisan_id: artisan.id,
            title: "Cuisine".into(),
            description: "Pose complète".into(),
            prix: 1500.0,
            image_proof_of_work: None,
            images: vec!["a.jpg".into(), "b.jpg".into()],
        };
        let created = ApplicationService::apply_artisan(&db, dto, Utc::now()).await.unwrap();
        assert_eq!(created.images, serde_json::json!(["a.jpg", "b.jpg"]));
        assert_eq!(
            ApplicationService::artisan_applications(&db, Some(artisan.id)).await.unwrap().len(),
            1
        );
    }
}
