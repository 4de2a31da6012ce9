// ============================================================================
// SERVICE : ORDRES DE TRAVAIL
// ============================================================================
//
// CRUD des ordres d'un établissement, transitions de statut, partage avec les
// comptes embauchés (users et artisans) et rappel des échéances proches.
//
// Règles:
//   - a_faire <-> en_cours, a_faire|en_cours -> termine, termine est terminal
//   - Seul un ordre `termine` peut être supprimé (avec ses partages)
//   - Le partage est idempotent : une seule ligne par (ordre, compte)
//
// ============================================================================

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use validator::Validate;

use crate::error::AppError;
use crate::models::account::{AccountKind, AccountRef};
use crate::models::dto::{CreateOrderRequest, OrderWithDeadline, RemovalOutcome, UpdateOrderRequest};
use crate::models::orders::{self, OrderStatus};
use crate::models::{artisan_embauche, etablissements, user_embauche, user_shared_orders};
use crate::services::embauche_service::EmbaucheService;

pub struct OrderService;

impl OrderService {
    pub async fn create(
        db: &DatabaseConnection,
        dto: CreateOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<orders::Model, AppError> {
        dto.validate()?;

        etablissements::Entity::find_by_id(dto.etablissement_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Etablissement", dto.etablissement_id))?;

        let txn = db.begin().await?;
        let order = orders::ActiveModel {
            etablissement_id: Set(dto.etablissement_id),
            demande: Set(dto.demande),
            priorite: Set(dto.priorite.unwrap_or_else(|| "normale".to_string())),
            date: Set(dto.date.unwrap_or_else(|| now.date_naive())),
            deadline: Set(dto.deadline),
            status: Set(dto.status.unwrap_or(OrderStatus::AFaire)),
            shared_with_accepted_users: Set(dto.shared_with_accepted_users),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // Un ordre créé déjà partagé est visible tout de suite par les embauchés
        if order.shared_with_accepted_users {
            for account in Self::employed_accounts(&txn, order.etablissement_id).await? {
                Self::share_orders(&txn, &[order.id], account, now).await?;
            }
        }
        txn.commit().await?;

        tracing::info!(order_id = order.id, etablissement_id = order.etablissement_id, "order created");
        Ok(order)
    }

    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<orders::Model>, AppError> {
        Ok(orders::Entity::find()
            .order_by_desc(orders::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn by_etablissement(db: &DatabaseConnection, etablissement_id: i32) -> Result<Vec<orders::Model>, AppError> {
        Ok(orders::Entity::find()
            .filter(orders::Column::EtablissementId.eq(etablissement_id))
            .order_by_desc(orders::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn find_one<C: ConnectionTrait>(db: &C, id: i32) -> Result<orders::Model, AppError> {
        orders::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Order", id))
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        dto: UpdateOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<orders::Model, AppError> {
        let order = Self::find_one(db, id).await?;
        let mut active: orders::ActiveModel = order.into();

        if let Some(demande) = dto.demande {
            if demande.trim().is_empty() {
                return Err(AppError::Validation("Demande is required".into()));
            }
            active.demande = Set(demande);
        }
        if let Some(priorite) = dto.priorite {
            active.priorite = Set(priorite);
        }
        if let Some(date) = dto.date {
            active.date = Set(date);
        }
        if let Some(deadline) = dto.deadline {
            active.deadline = Set(Some(deadline));
        }
        active.updated_at = Set(now);

        Ok(active.update(db).await?)
    }

    /// Applique la table de transitions ; le même statut est un no-op
    pub async fn update_status(
        db: &DatabaseConnection,
        id: i32,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<orders::Model, AppError> {
        let order = Self::find_one(db, id).await?;
        if order.status == status {
            return Ok(order);
        }
        if !order.status.can_transition_to(status) {
            return Err(AppError::InvalidTransition {
                from: order.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }

        let previous = order.status;
        let mut active: orders::ActiveModel = order.into();
        active.status = Set(status);
        active.updated_at = Set(now);
        let order = active.update(db).await?;

        tracing::info!(order_id = id, from = previous.as_str(), to = status.as_str(), "order status changed");
        Ok(order)
    }

    /// Changement de statut par un compte avec qui l'ordre est partagé
    pub async fn update_status_as_account(
        db: &DatabaseConnection,
        id: i32,
        account: AccountRef,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<orders::Model, AppError> {
        let shared = user_shared_orders::Entity::find()
            .filter(user_shared_orders::Column::OrderId.eq(id))
            .filter(user_shared_orders::Column::AccountKind.eq(account.kind))
            .filter(user_shared_orders::Column::AccountId.eq(account.id))
            .filter(user_shared_orders::Column::IsActive.eq(true))
            .one(db)
            .await?;
        if shared.is_none() {
            Self::find_one(db, id).await?;
            return Err(AppError::Forbidden("This order is not shared with you".into()));
        }
        Self::update_status(db, id, status, now).await
    }

    /// Active ou coupe le partage d'un ordre avec les comptes embauchés
    pub async fn toggle_sharing(
        db: &DatabaseConnection,
        id: i32,
        shared: bool,
        now: DateTime<Utc>,
    ) -> Result<orders::Model, AppError> {
        let order = Self::find_one(db, id).await?;

        let txn = db.begin().await?;
        let mut active: orders::ActiveModel = order.into();
        active.shared_with_accepted_users = Set(shared);
        active.updated_at = Set(now);
        let order = active.update(&txn).await?;

        user_shared_orders::Entity::update_many()
            .col_expr(user_shared_orders::Column::IsActive, Expr::value(shared))
            .filter(user_shared_orders::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        if shared {
            for account in Self::employed_accounts(&txn, order.etablissement_id).await? {
                Self::share_orders(&txn, &[order.id], account, now).await?;
            }
        }
        txn.commit().await?;

        tracing::info!(order_id = id, shared, "order sharing toggled");
        Ok(order)
    }

    pub async fn shared_with_accepted(
        db: &DatabaseConnection,
        etablissement_id: i32,
    ) -> Result<Vec<orders::Model>, AppError> {
        Ok(orders::Entity::find()
            .filter(orders::Column::EtablissementId.eq(etablissement_id))
            .filter(orders::Column::SharedWithAcceptedUsers.eq(true))
            .order_by_desc(orders::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Ordres actuellement partagés avec un user ou un artisan
    pub async fn orders_for_account(
        db: &DatabaseConnection,
        account: AccountRef,
    ) -> Result<Vec<orders::Model>, AppError> {
        let order_ids: Vec<i32> = user_shared_orders::Entity::find()
            .filter(user_shared_orders::Column::AccountKind.eq(account.kind))
            .filter(user_shared_orders::Column::AccountId.eq(account.id))
            .filter(user_shared_orders::Column::IsActive.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.order_id)
            .collect();
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(orders::Entity::find()
            .filter(orders::Column::Id.is_in(order_ids))
            .order_by_asc(orders::Column::Deadline)
            .all(db)
            .await?)
    }

    /// Ordres d'un établissement visibles par un user qui y est embauché
    pub async fn orders_for_employee(
        db: &DatabaseConnection,
        etablissement_id: i32,
        user_id: i32,
    ) -> Result<Vec<orders::Model>, AppError> {
        let account = AccountRef::new(AccountKind::User, user_id);
        if !EmbaucheService::is_embauched(db, account, etablissement_id).await? {
            return Err(AppError::Forbidden("User is not employed by this etablissement".into()));
        }

        Ok(Self::orders_for_account(db, account)
            .await?
            .into_iter()
            .filter(|order| order.etablissement_id == etablissement_id)
            .collect())
    }

    /// Partage tous les ordres de l'établissement avec le compte.
    /// Retourne le nombre de partages créés (0 si tout existait déjà).
    pub async fn share_establishment_orders<C: ConnectionTrait>(
        db: &C,
        etablissement_id: i32,
        account: AccountRef,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let order_ids: Vec<i32> = orders::Entity::find()
            .filter(orders::Column::EtablissementId.eq(etablissement_id))
            .all(db)
            .await?
            .into_iter()
            .map(|order| order.id)
            .collect();

        let created = Self::share_orders(db, &order_ids, account, now).await?;
        if created > 0 {
            tracing::info!(etablissement_id, kind = %account.kind, account_id = account.id, created, "orders shared");
        }
        Ok(created)
    }

    async fn share_orders<C: ConnectionTrait>(
        db: &C,
        order_ids: &[i32],
        account: AccountRef,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        if order_ids.is_empty() {
            return Ok(0);
        }

        // 1. Ignorer les paires déjà présentes
        let existing: Vec<i32> = user_shared_orders::Entity::find()
            .filter(user_shared_orders::Column::OrderId.is_in(order_ids.to_vec()))
            .filter(user_shared_orders::Column::AccountKind.eq(account.kind))
            .filter(user_shared_orders::Column::AccountId.eq(account.id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.order_id)
            .collect();

        let rows: Vec<user_shared_orders::ActiveModel> = order_ids
            .iter()
            .filter(|id| !existing.contains(id))
            .map(|&order_id| user_shared_orders::ActiveModel {
                order_id: Set(order_id),
                account_kind: Set(account.kind),
                account_id: Set(account.id),
                is_active: Set(true),
                shared_at: Set(now),
                ..Default::default()
            })
            .collect();
        if rows.is_empty() {
            return Ok(0);
        }

        // 2. L'index unique couvre les insertions concurrentes
        user_shared_orders::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    user_shared_orders::Column::OrderId,
                    user_shared_orders::Column::AccountKind,
                    user_shared_orders::Column::AccountId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await
    }

    /// Users et artisans embauchés par l'établissement
    async fn employed_accounts<C: ConnectionTrait>(db: &C, etablissement_id: i32) -> Result<Vec<AccountRef>, DbErr> {
        let users = user_embauche::Entity::find()
            .filter(user_embauche::Column::EtablissementId.eq(etablissement_id))
            .all(db)
            .await?
            .into_iter()
            .map(|link| AccountRef::new(AccountKind::User, link.user_id));
        let artisans = artisan_embauche::Entity::find()
            .filter(artisan_embauche::Column::EtablissementId.eq(etablissement_id))
            .all(db)
            .await?
            .into_iter()
            .map(|link| AccountRef::new(AccountKind::Artisan, link.artisan_id));
        Ok(users.chain(artisans).collect())
    }

    /// Supprime un ordre terminé et ses partages ; un autre statut n'est pas une erreur
    pub async fn remove_completed(db: &DatabaseConnection, id: i32) -> Result<RemovalOutcome, AppError> {
        let order = Self::find_one(db, id).await?;
        if order.status != OrderStatus::Termine {
            return Ok(RemovalOutcome {
                success: false,
                message: "Only completed orders can be removed".to_string(),
            });
        }

        let txn = db.begin().await?;
        let shares = user_shared_orders::Entity::delete_many()
            .filter(user_shared_orders::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        orders::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(order_id = id, shares = shares.rows_affected, "completed order removed");
        Ok(RemovalOutcome {
            success: true,
            message: "Order removed successfully".to_string(),
        })
    }

    /// DELETE /orders/{id} : même règle, mais refus signalé en 409
    pub async fn remove(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
        let outcome = Self::remove_completed(db, id).await?;
        if !outcome.success {
            return Err(AppError::Conflict(outcome.message));
        }
        Ok(())
    }

    /// Ordres non terminés dont l'échéance tombe aujourd'hui ou demain
    pub async fn approaching_deadline(
        db: &DatabaseConnection,
        etablissement_id: Option<i32>,
        today: NaiveDate,
    ) -> Result<Vec<OrderWithDeadline>, AppError> {
        let mut query = orders::Entity::find()
            .filter(orders::Column::Deadline.gte(today))
            .filter(orders::Column::Deadline.lte(today + Duration::days(1)))
            .filter(orders::Column::Status.ne(OrderStatus::Termine));
        if let Some(etablissement_id) = etablissement_id {
            query = query.filter(orders::Column::EtablissementId.eq(etablissement_id));
        }

        let orders = query.order_by_asc(orders::Column::Deadline).all(db).await?;
        Ok(orders
            .into_iter()
            .filter_map(|order| {
                let days = (order.deadline? - today).num_days();
                Some(OrderWithDeadline {
                    order,
                    days_until_deadline: days,
                    is_urgent: days <= 1,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::test_support::{seed_etablissement, seed_order, seed_user};

    async fn shared_rows(db: &DatabaseConnection, order_id: i32) -> Vec<user_shared_orders::Model> {
        user_shared_orders::Entity::find()
            .filter(user_shared_orders::Column::OrderId.eq(order_id))
            .all(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sharing_twice_yields_one_row_per_order() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let first = seed_order(&db, etab.id, OrderStatus::AFaire, None).await;
        let second = seed_order(&db, etab.id, OrderStatus::EnCours, None).await;
        let account = AccountRef::new(AccountKind::User, user.id);

        let created = OrderService::share_establishment_orders(&db, etab.id, account, Utc::now()).await.unwrap();
        assert_eq!(created, 2);
        let created = OrderService::share_establishment_orders(&db, etab.id, account, Utc::now()).await.unwrap();
        assert_eq!(created, 0);

        assert_eq!(shared_rows(&db, first.id).await.len(), 1);
        assert_eq!(shared_rows(&db, second.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_user_and_artisan_with_same_id_do_not_collide() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let order = seed_order(&db, etab.id, OrderStatus::AFaire, None).await;

        for kind in [AccountKind::User, AccountKind::Artisan] {
            OrderService::share_establishment_orders(&db, etab.id, AccountRef::new(kind, 1), Utc::now())
                .await
                .unwrap();
        }
        assert_eq!(shared_rows(&db, order.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_completed_only_for_termine() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let order = seed_order(&db, etab.id, OrderStatus::EnCours, None).await;
        OrderService::share_establishment_orders(&db, etab.id, AccountRef::new(AccountKind::User, user.id), Utc::now())
            .await
            .unwrap();

        let outcome = OrderService::remove_completed(&db, order.id).await.unwrap();
        assert!(!outcome.success);
        assert!(OrderService::find_one(&db, order.id).await.is_ok());

        OrderService::update_status(&db, order.id, OrderStatus::Termine, Utc::now()).await.unwrap();
        let outcome = OrderService::remove_completed(&db, order.id).await.unwrap();
        assert!(outcome.success);
        assert!(matches!(OrderService::find_one(&db, order.id).await, Err(AppError::NotFound(_))));
        assert!(shared_rows(&db, order.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_refuses_open_order_with_conflict() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let order = seed_order(&db, etab.id, OrderStatus::AFaire, None).await;

        assert!(matches!(OrderService::remove(&db, order.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(OrderService::remove(&db, 999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let order = seed_order(&db, etab.id, OrderStatus::AFaire, None).await;
        let now = Utc::now();

        let same = OrderService::update_status(&db, order.id, OrderStatus::AFaire, now).await.unwrap();
        assert_eq!(same.status, OrderStatus::AFaire);

        OrderService::update_status(&db, order.id, OrderStatus::EnCours, now).await.unwrap();
        OrderService::update_status(&db, order.id, OrderStatus::Termine, now).await.unwrap();

        let err = OrderService::update_status(&db, order.id, OrderStatus::EnCours, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_approaching_deadline_window() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let today = Utc::now().date_naive();

        let due_today = seed_order(&db, etab.id, OrderStatus::AFaire, Some(today)).await;
        let due_tomorrow = seed_order(&db, etab.id, OrderStatus::EnCours, Some(today + Duration::days(1))).await;
        seed_order(&db, etab.id, OrderStatus::AFaire, Some(today + Duration::days(5))).await;
        seed_order(&db, etab.id, OrderStatus::Termine, Some(today)).await;
        seed_order(&db, etab.id, OrderStatus::AFaire, Some(today - Duration::days(1))).await;
        seed_order(&db, etab.id, OrderStatus::AFaire, None).await;

        let orders = OrderService::approaching_deadline(&db, Some(etab.id), today).await.unwrap();
        let ids: Vec<i32> = orders.iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![due_today.id, due_tomorrow.id]);
        assert_eq!(orders[0].days_until_deadline, 0);
        assert_eq!(orders[1].days_until_deadline, 1);
        assert!(orders.iter().all(|o| o.is_urgent));

        let json = serde_json::to_value(&orders[1]).unwrap();
        assert_eq!(json["daysUntilDeadline"], 1);
        assert_eq!(json["demande"], "Réparer la vitrine");
    }

    #[tokio::test]
    async fn test_toggle_sharing_deactivates_rows() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let order = seed_order(&db, etab.id, OrderStatus::AFaire, None).await;
        let account = AccountRef::new(AccountKind::User, user.id);
        OrderService::share_establishment_orders(&db, etab.id, account, Utc::now()).await.unwrap();

        let toggled = OrderService::toggle_sharing(&db, order.id, false, Utc::now()).await.unwrap();
        assert!(!toggled.shared_with_accepted_users);
        assert!(OrderService::orders_for_account(&db, account).await.unwrap().is_empty());

        OrderService::toggle_sharing(&db, order.id, true, Utc::now()).await.unwrap();
        assert_eq!(OrderService::orders_for_account(&db, account).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_as_account_requires_share() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let user = seed_user(&db, "a@x.com").await;
        let order = seed_order(&db, etab.id, OrderStatus::AFaire, None).await;
        let account = AccountRef::new(AccountKind::User, user.id);

        let err = OrderService::update_status_as_account(&db, order.id, account, OrderStatus::EnCours, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        OrderService::share_establishment_orders(&db, etab.id, account, Utc::now()).await.unwrap();
        let updated = OrderService::update_status_as_account(&db, order.id, account, OrderStatus::EnCours, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::EnCours);
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let db = test_connection().await;
        let etab = seed_etablissement(&db, "etab@x.com").await;
        let dto: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "etablissementId": etab.id,
            "demande": "Inventaire"
        }))
        .unwrap();

        let order = OrderService::create(&db, dto, Utc::now()).await.unwrap();
        assert_eq!(order.status, OrderStatus::AFaire);
        assert_eq!(order.priorite, "normale");

        let missing: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "etablissementId": 999,
            "demande": "Inventaire"
        }))
        .unwrap();
        assert!(matches!(OrderService::create(&db, missing, Utc::now()).await, Err(AppError::NotFound(_))));
    }
}
