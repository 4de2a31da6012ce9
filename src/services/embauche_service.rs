// ============================================================================
// SERVICE : DEMANDES D'EMBAUCHE
// ============================================================================
//
// Cycle de vie : pending -> accepted | refused (états terminaux).
//
// Acceptation (une seule transaction):
//   1. statut pending -> accepted (mise à jour conditionnée au statut)
//   2. lien d'emploi user_embauche / artisan_embauche (si absent)
//   3. ligne dans order_share_outbox
// Après commit, l'outbox est traitée : partage des ordres de l'établissement
// avec le compte embauché. Un échec de partage ne remet jamais en cause
// l'acceptation ; la ligne reste et sera rejouée par process_pending_shares.
//
// ============================================================================

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;

use crate::error::AppError;
use crate::models::account::{AccountKind, AccountRef};
use crate::models::dto::{CreateEmbaucheRequest, EmbaucheAction, PendingSharesReport};
use crate::models::embauche_requests::{self, EmbaucheStatus};
use crate::models::{artisan_embauche, etablissements, order_share_outbox, user_embauche};
use crate::services::account_service::AccountService;
use crate::services::order_service::OrderService;

pub struct EmbaucheService;

impl EmbaucheService {
    /// Ouvre une demande ; utilisable dans une transaction (candidature)
    pub async fn create_request<C: ConnectionTrait>(
        db: &C,
        requester: AccountRef,
        etablissement_id: i32,
        offer_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<embauche_requests::Model, AppError> {
        if requester.kind == AccountKind::Etablissement {
            return Err(AppError::Validation(
                "Only users and artisans can request an embauche".into(),
            ));
        }
        AccountService::require_ref(db, requester).await?;
        etablissements::Entity::find_by_id(etablissement_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Etablissement", etablissement_id))?;

        // Une seule demande pending par (demandeur, établissement, offre)
        if Self::find_pending(db, requester, etablissement_id, offer_id).await?.is_some() {
            return Err(AppError::Conflict(
                "A pending embauche request already exists for this etablissement".into(),
            ));
        }

        let (user_id, artisan_id) = match requester.kind {
            AccountKind::User => (Some(requester.id), None),
            _ => (None, Some(requester.id)),
        };
        let request = embauche_requests::ActiveModel {
            user_id: Set(user_id),
            artisan_id: Set(artisan_id),
            etablissement_id: Set(etablissement_id),
            offer_id: Set(offer_id),
            status: Set(EmbaucheStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(
            request_id = request.id,
            kind = %requester.kind,
            account_id = requester.id,
            etablissement_id,
            "embauche request created"
        );
        Ok(request)
    }

    /// Demande pending du compte auprès de l'établissement ; sans offre,
    /// n'importe quelle demande pending correspond
    pub async fn find_pending<C: ConnectionTrait>(
        db: &C,
        requester: AccountRef,
        etablissement_id: i32,
        offer_id: Option<i32>,
    ) -> Result<Option<embauche_requests::Model>, DbErr> {
        let mut query = embauche_requests::Entity::find()
            .filter(embauche_requests::Column::EtablissementId.eq(etablissement_id))
            .filter(embauche_requests::Column::Status.eq(EmbaucheStatus::Pending));
        query = match requester.kind {
            AccountKind::User => query.filter(embauche_requests::Column::UserId.eq(requester.id)),
            _ => query.filter(embauche_requests::Column::ArtisanId.eq(requester.id)),
        };
        if let Some(offer_id) = offer_id {
            query = query.filter(embauche_requests::Column::OfferId.eq(offer_id));
        }
        query.one(db).await
    }

    /// Comme `create_request`, mais une demande pending existante est reprise
    /// au lieu d'être refusée (candidature après une demande directe)
    pub async fn open_or_reuse_request<C: ConnectionTrait>(
        db: &C,
        requester: AccountRef,
        etablissement_id: i32,
        offer_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<embauche_requests::Model, AppError> {
        if let Some(existing) = Self::find_pending(db, requester, etablissement_id, offer_id).await? {
            tracing::info!(
                request_id = existing.id,
                kind = %requester.kind,
                account_id = requester.id,
                etablissement_id,
                "pending embauche request already exists"
            );
            return Ok(existing);
        }
        Self::create_request(db, requester, etablissement_id, offer_id, now).await
    }

    pub async fn create_from_dto(
        db: &DatabaseConnection,
        dto: CreateEmbaucheRequest,
        now: DateTime<Utc>,
    ) -> Result<embauche_requests::Model, AppError> {
        let requester = match (dto.user_id, dto.artisan_id) {
            (Some(id), None) => AccountRef::new(AccountKind::User, id),
            (None, Some(id)) => AccountRef::new(AccountKind::Artisan, id),
            _ => {
                return Err(AppError::Validation(
                    "Exactly one of userId or artisanId is required".into(),
                ));
            }
        };
        Self::create_request(db, requester, dto.etablissement_id, dto.offer_id, now).await
    }

    pub async fn find_one<C: ConnectionTrait>(db: &C, id: i32) -> Result<embauche_requests::Model, AppError> {
        embauche_requests::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Embauche request", id))
    }

    /// Passe la demande de pending vers `next` ; refuse tout autre départ
    async fn transition<C: ConnectionTrait>(
        db: &C,
        request: &embauche_requests::Model,
        next: EmbaucheStatus,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let invalid = || AppError::InvalidTransition {
            from: request.status.as_str().to_string(),
            to: next.as_str().to_string(),
        };
        if !request.status.can_transition_to(next) {
            return Err(invalid());
        }

        // La condition sur le statut empêche deux acceptations concurrentes
        let result = embauche_requests::Entity::update_many()
            .col_expr(embauche_requests::Column::Status, Expr::value(next))
            .col_expr(embauche_requests::Column::UpdatedAt, Expr::value(now))
            .filter(embauche_requests::Column::Id.eq(request.id))
            .filter(embauche_requests::Column::Status.eq(request.status))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(invalid());
        }
        Ok(())
    }

    pub async fn accept(
        db: &DatabaseConnection,
        id: i32,
        now: DateTime<Utc>,
    ) -> Result<embauche_requests::Model, AppError> {
        let request = Self::find_one(db, id).await?;
        let requester = request
            .requester()
            .ok_or_else(|| AppError::Internal(format!("Embauche request {} has no requester", id)))?;

        // 1. Unité de travail : statut + lien + outbox
        let txn = db.begin().await?;
        Self::transition(&txn, &request, EmbaucheStatus::Accepted, now).await?;
        Self::link(&txn, requester, request.etablissement_id, now).await?;
        let outbox = order_share_outbox::ActiveModel {
            embauche_request_id: Set(request.id),
            etablissement_id: Set(request.etablissement_id),
            account_kind: Set(requester.kind),
            account_id: Set(requester.id),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!(
            request_id = id,
            kind = %requester.kind,
            account_id = requester.id,
            etablissement_id = request.etablissement_id,
            "embauche request accepted"
        );

        // 2. Effet de partage, hors transaction
        Self::deliver_share(db, outbox, now).await;

        Self::find_one(db, id).await
    }

    pub async fn refuse(
        db: &DatabaseConnection,
        id: i32,
        now: DateTime<Utc>,
    ) -> Result<embauche_requests::Model, AppError> {
        let request = Self::find_one(db, id).await?;
        Self::transition(db, &request, EmbaucheStatus::Refused, now).await?;
        tracing::info!(request_id = id, "embauche request refused");
        Self::find_one(db, id).await
    }

    pub async fn apply_action(
        db: &DatabaseConnection,
        id: i32,
        action: EmbaucheAction,
        now: DateTime<Utc>,
    ) -> Result<embauche_requests::Model, AppError> {
        match action {
            EmbaucheAction::Accept => Self::accept(db, id, now).await,
            EmbaucheAction::Refuse => Self::refuse(db, id, now).await,
        }
    }

    async fn link<C: ConnectionTrait>(
        db: &C,
        account: AccountRef,
        etablissement_id: i32,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        match account.kind {
            AccountKind::User => {
                user_embauche::Entity::insert(user_embauche::ActiveModel {
                    user_id: Set(account.id),
                    etablissement_id: Set(etablissement_id),
                    created_at: Set(now),
                })
                .on_conflict(
                    OnConflict::columns([
                        user_embauche::Column::UserId,
                        user_embauche::Column::EtablissementId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            }
            _ => {
                artisan_embauche::Entity::insert(artisan_embauche::ActiveModel {
                    artisan_id: Set(account.id),
                    etablissement_id: Set(etablissement_id),
                    created_at: Set(now),
                })
                .on_conflict(
                    OnConflict::columns([
                        artisan_embauche::Column::ArtisanId,
                        artisan_embauche::Column::EtablissementId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            }
        }
        Ok(())
    }

    /// Traite une ligne d'outbox. Retourne true si le partage a réussi.
    async fn deliver_share(db: &DatabaseConnection, entry: order_share_outbox::Model, now: DateTime<Utc>) -> bool {
        let account = AccountRef::new(entry.account_kind, entry.account_id);
        match OrderService::share_establishment_orders(db, entry.etablissement_id, account, now).await {
            Ok(_) => {
                if let Err(e) = order_share_outbox::Entity::delete_by_id(entry.id).exec(db).await {
                    tracing::warn!(outbox_id = entry.id, error = %e, "could not clear outbox entry");
                }
                true
            }
            Err(e) => {
                tracing::warn!(
                    outbox_id = entry.id,
                    etablissement_id = entry.etablissement_id,
                    kind = %account.kind,
                    account_id = account.id,
                    error = %e,
                    "order sharing failed, kept for retry"
                );
                let attempts = entry.attempts + 1;
                let mut active: order_share_outbox::ActiveModel = entry.into();
                active.attempts = Set(attempts);
                active.last_error = Set(Some(e.to_string()));
                if let Err(e) = active.update(db).await {
                    tracing::error!(error = %e, "could not record outbox failure");
                }
                false
            }
        }
    }

    /// Rejoue toutes les lignes d'outbox en attente
    pub async fn process_pending_shares(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<PendingSharesReport, AppError> {
        let pending = order_share_outbox::Entity::find()
            .order_by_asc(order_share_outbox::Column::CreatedAt)
            .all(db)
            .await?;

        let processed = pending.len();
        let mut succeeded = 0;
        for entry in pending {
            if Self::deliver_share(db, entry, now).await {
                succeeded += 1;
            }
        }

        tracing::info!(processed, succeeded, "pending order shares processed");
        Ok(PendingSharesReport {
            processed,
            succeeded,
            failed: processed - succeeded,
        })
    }

    pub async fn for_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<embauche_requests::Model>, AppError> {
        Ok(embauche_requests::Entity::find()
            .filter(embauche_requests::Column::UserId.eq(user_id))
            .order_by_desc(embauche_requests::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn for_artisan(db: &DatabaseConnection, artisan_id: i32) -> Result<Vec<embauche_requests::Model>, AppError> {
        Ok(embauche_requests::Entity::find()
            .filter(embauche_requests::Column::ArtisanId.eq(artisan_id))
            .order_by_desc(embauche_requests::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn for_etablissement(
        db: &DatabaseConnection,
        etablissement_id: i32,
    ) -> Result<Vec<embauche_requests::Model>, AppError> {
        Ok(embauche_requests::Entity::find()
            .filter(embauche_requests::Column::EtablissementId.eq(etablissement_id))
            .order_by_desc(embauche_requests::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn pending_count(db: &DatabaseConnection, user_id: i32) -> Result<u64, AppError> {
        Ok(embauche_requests::Entity::find()
            .filter(embauche_requests::Column::UserId.eq(user_id))
            .filter(embauche_requests::Column::Status.eq(EmbaucheStatus::Pending))
            .count(db)
            .await?)
    }

    pub async fn is_embauched<C: ConnectionTrait>(
        db: &C,
        account: AccountRef,
        etablissement_id: i32,
    ) -> Result<bool, DbErr> {
        Ok(match account.kind {
            AccountKind::User => user_embauche::Entity::find_by_id((account.id, etablissement_id))
                .one(db)
                .await?
                .is_some(),
            AccountKind::Artisan => artisan_embauche::Entity::find_by_id((account.id, etablissement_id))
                .one(db)
                .await?
                .is_some(),
            AccountKind::Etablissement => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::models::orders::OrderStatus;
    use crate::models::user_shared_orders;
    use crate::test_support::{seed_artisan, seed_etablissement, seed_offer, seed_order, seed_user};

    #[tokio::test]
    async fn test_duplicate_pending_request_is_rejected() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let offer = seed_offer(&db, etab.id, "Dev").await;
        let requester = AccountRef::new(AccountKind::User, user.id);
        let now = Utc::now();

        EmbaucheService::create_request(&db, requester, etab.id, Some(offer.id), now).await.unwrap();
        let err = EmbaucheService::create_request(&db, requester, etab.id, Some(offer.id), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let other = seed_offer(&db, etab.id, "Ops").await;
        assert!(EmbaucheService::create_request(&db, requester, etab.id, Some(other.id), now).await.is_ok());
    }

    #[tokio::test]
    async fn test_requester_must_be_user_xor_artisan() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let dto = CreateEmbaucheRequest {
            user_id: Some(1),
            artisan_id: Some(1),
            etablissement_id: etab.id,
            offer_id: None,
        };
        let err = EmbaucheService::create_from_dto(&db, dto, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = EmbaucheService::create_request(
            &db,
            AccountRef::new(AccountKind::Etablissement, etab.id),
            etab.id,
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_accept_links_and_shares_orders_once() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        seed_order(&db, etab.id, OrderStatus::AFaire, None).await;
        seed_order(&db, etab.id, OrderStatus::EnCours, None).await;
        let requester = AccountRef::new(AccountKind::User, user.id);
        let now = Utc::now();

        let request = EmbaucheService::create_request(&db, requester, etab.id, None, now).await.unwrap();
        let accepted = EmbaucheService::accept(&db, request.id, now).await.unwrap();
        assert_eq!(accepted.status, EmbaucheStatus::Accepted);
        assert!(EmbaucheService::is_embauched(&db, requester, etab.id).await.unwrap());

        let err = EmbaucheService::accept(&db, request.id, now).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let links = user_embauche::Entity::find().all(&db).await.unwrap();
        assert_eq!(links.len(), 1);
        let shares = user_shared_orders::Entity::find().all(&db).await.unwrap();
        assert_eq!(shares.len(), 2);
        assert!(order_share_outbox::Entity::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_requests_reject_transitions() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let artisan = seed_artisan(&db, "art@x.com").await;
        let requester = AccountRef::new(AccountKind::Artisan, artisan.id);
        let now = Utc::now();

        let request = EmbaucheService::create_request(&db, requester, etab.id, None, now).await.unwrap();
        let refused = EmbaucheService::apply_action(&db, request.id, EmbaucheAction::Refuse, now)
            .await
            .unwrap();
        assert_eq!(refused.status, EmbaucheStatus::Refused);

        let err = EmbaucheService::apply_action(&db, request.id, EmbaucheAction::Accept, now)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid status transition from refused to accepted");
        assert!(!EmbaucheService::is_embauched(&db, requester, etab.id).await.unwrap());

        // Une nouvelle demande est possible une fois la précédente close
        assert!(EmbaucheService::create_request(&db, requester, etab.id, None, now).await.is_ok());
    }

    #[tokio::test]
    async fn test_process_pending_shares_replays_outbox() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        seed_order(&db, etab.id, OrderStatus::AFaire, None).await;
        let now = Utc::now();
        let request = EmbaucheService::create_request(
            &db,
            AccountRef::new(AccountKind::User, user.id),
            etab.id,
            None,
            now,
        )
        .await
        .unwrap();

        order_share_outbox::ActiveModel {
            embauche_request_id: Set(request.id),
            etablissement_id: Set(etab.id),
            account_kind: Set(AccountKind::User),
            account_id: Set(user.id),
            attempts: Set(2),
            last_error: Set(Some("connection reset".into())),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let report = EmbaucheService::process_pending_shares(&db, now).await.unwrap();
        assert_eq!((report.processed, report.succeeded, report.failed), (1, 1, 0));
        assert_eq!(user_shared_orders::Entity::find().all(&db).await.unwrap().len(), 1);

        let report = EmbaucheService::process_pending_shares(&db, now).await.unwrap();
        assert_eq!(report.processed, 0);
    }

    #[tokio::test]
    async fn test_pending_count_and_listings() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let first = seed_offer(&db, etab.id, "Dev").await;
        let second = seed_offer(&db, etab.id, "Ops").await;
        let requester = AccountRef::new(AccountKind::User, user.id);
        let now = Utc::now();

        let request = EmbaucheService::create_request(&db, requester, etab.id, Some(first.id), now).await.unwrap();
        EmbaucheService::create_request(&db, requester, etab.id, Some(second.id), now).await.unwrap();
        assert_eq!(EmbaucheService::pending_count(&db, user.id).await.unwrap(), 2);

        EmbaucheService::refuse(&db, request.id, now).await.unwrap();
        assert_eq!(EmbaucheService::pending_count(&db, user.id).await.unwrap(), 1);
        assert_eq!(EmbaucheService::for_user(&db, user.id).await.unwrap().len(), 2);
        assert_eq!(EmbaucheService::for_etablissement(&db, etab.id).await.unwrap().len(), 2);
        assert!(EmbaucheService::for_artisan(&db, user.id).await.unwrap().is_empty());
    }
}
