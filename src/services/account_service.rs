use sea_orm::entity::prelude::DateTimeUtc;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::*;

use crate::error::AppError;
use crate::models::account::{
    Account, AccountKind, AccountRef, AccountTable, PaymentStatus, SubscriptionStatus,
};
use crate::models::{artisans, etablissements, users};

/// Modifications applicables à n'importe quel type de compte
#[derive(Debug, Default, Clone)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub email_verified: Option<bool>,
    pub plan: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub payment: Option<PaymentStatus>,
    pub window: Option<(DateTimeUtc, DateTimeUtc)>,
}

pub struct AccountService;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_in<E, C>(db: &C, email: &str) -> Result<Option<Account>, DbErr>
where
    E: AccountTable,
    C: ConnectionTrait,
{
    Ok(E::find()
        .filter(E::email_column().eq(email))
        .one(db)
        .await?
        .map(E::wrap))
}

async fn find_by_id_in<E, C>(db: &C, id: i32) -> Result<Option<Account>, DbErr>
where
    E: AccountTable,
    C: ConnectionTrait,
{
    Ok(E::find()
        .filter(E::id_column().eq(id))
        .one(db)
        .await?
        .map(E::wrap))
}

async fn apply_changes<E, C>(db: &C, id: i32, changes: &AccountChanges) -> Result<u64, DbErr>
where
    E: AccountTable,
    C: ConnectionTrait,
{
    let mut values: Vec<(E::Column, SimpleExpr)> = Vec::new();
    if let Some(email) = &changes.email {
        values.push((E::email_column(), Expr::value(email.clone())));
    }
    if let Some(hash) = &changes.password_hash {
        values.push((E::password_column(), Expr::value(hash.clone())));
    }
    if let Some(verified) = changes.email_verified {
        values.push((E::email_verified_column(), Expr::value(verified)));
    }
    if let Some(plan) = &changes.plan {
        values.push((E::plan_column(), Expr::value(plan.clone())));
    }
    if let Some(status) = changes.status {
        values.push((E::status_column(), Expr::value(status)));
    }
    if let Some(payment) = changes.payment {
        values.push((E::payment_column(), Expr::value(payment)));
    }
    if let Some((start, end)) = changes.window {
        values.push((E::start_column(), Expr::value(Some(start))));
        values.push((E::end_column(), Expr::value(Some(end))));
    }
    if values.is_empty() {
        return Ok(0);
    }

    let mut update = E::update_many().filter(E::id_column().eq(id));
    for (column, value) in values {
        update = update.col_expr(column, value);
    }
    Ok(update.exec(db).await?.rows_affected)
}

async fn expire_in<E, C>(db: &C, now: DateTimeUtc) -> Result<u64, DbErr>
where
    E: AccountTable,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(E::status_column(), Expr::value(SubscriptionStatus::Expired))
        .filter(E::status_column().eq(SubscriptionStatus::Active))
        .filter(E::end_column().lte(now))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        tracing::info!(kind = %E::KIND, count = result.rows_affected, "subscriptions expired");
    }
    Ok(result.rows_affected)
}

impl AccountService {
    /// Résout un e-mail : user, puis artisan, puis etablissement
    pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Account>, DbErr> {
        let email = normalize_email(email);
        if let Some(account) = find_in::<users::Entity, _>(db, &email).await? {
            return Ok(Some(account));
        }
        if let Some(account) = find_in::<artisans::Entity, _>(db, &email).await? {
            return Ok(Some(account));
        }
        find_in::<etablissements::Entity, _>(db, &email).await
    }

    pub async fn find_by_kind_and_email<C: ConnectionTrait>(
        db: &C,
        kind: AccountKind,
        email: &str,
    ) -> Result<Option<Account>, DbErr> {
        let email = normalize_email(email);
        match kind {
            AccountKind::User => find_in::<users::Entity, _>(db, &email).await,
            AccountKind::Artisan => find_in::<artisans::Entity, _>(db, &email).await,
            AccountKind::Etablissement => find_in::<etablissements::Entity, _>(db, &email).await,
        }
    }

    pub async fn find_by_ref<C: ConnectionTrait>(db: &C, account: AccountRef) -> Result<Option<Account>, DbErr> {
        match account.kind {
            AccountKind::User => find_by_id_in::<users::Entity, _>(db, account.id).await,
            AccountKind::Artisan => find_by_id_in::<artisans::Entity, _>(db, account.id).await,
            AccountKind::Etablissement => find_by_id_in::<etablissements::Entity, _>(db, account.id).await,
        }
    }

    /// Comme `find_by_kind_and_email` mais NotFound ("User not found", ...)
    pub async fn require<C: ConnectionTrait>(db: &C, kind: AccountKind, email: &str) -> Result<Account, AppError> {
        Self::find_by_kind_and_email(db, kind, email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", capitalize(kind.as_str()))))
    }

    pub async fn require_ref<C: ConnectionTrait>(db: &C, account: AccountRef) -> Result<Account, AppError> {
        Self::find_by_ref(db, account)
            .await?
            .ok_or_else(|| AppError::not_found(&capitalize(account.kind.as_str()), account.id))
    }

    pub async fn email_exists<C: ConnectionTrait>(db: &C, email: &str) -> Result<bool, DbErr> {
        Ok(Self::find_by_email(db, email).await?.is_some())
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        account: AccountRef,
        changes: &AccountChanges,
    ) -> Result<(), AppError> {
        let affected = match account.kind {
            AccountKind::User => apply_changes::<users::Entity, _>(db, account.id, changes).await?,
            AccountKind::Artisan => apply_changes::<artisans::Entity, _>(db, account.id, changes).await?,
            AccountKind::Etablissement => {
                apply_changes::<etablissements::Entity, _>(db, account.id, changes).await?
            }
        };
        if affected == 0 && Self::find_by_ref(db, account).await?.is_none() {
            return Err(AppError::not_found(&capitalize(account.kind.as_str()), account.id));
        }
        Ok(())
    }

    /// Passe en EXPIRED tous les comptes ACTIVE dont la fin d'abonnement est dépassée
    pub async fn expire_overdue<C: ConnectionTrait>(db: &C, now: DateTimeUtc) -> Result<u64, DbErr> {
        Ok(expire_in::<users::Entity, _>(db, now).await?
            + expire_in::<artisans::Entity, _>(db, now).await?
            + expire_in::<etablissements::Entity, _>(db, now).await?)
    }

    pub async fn update_image<C: ConnectionTrait>(db: &C, account: AccountRef, image: &str) -> Result<(), AppError> {
        let image = Some(image.to_string());
        let affected = match account.kind {
            AccountKind::User => {
                users::Entity::update_many()
                    .col_expr(users::Column::Image, Expr::value(image))
                    .filter(users::Column::Id.eq(account.id))
                    .exec(db)
                    .await?
            }
            AccountKind::Artisan => {
                artisans::Entity::update_many()
                    .col_expr(artisans::Column::Image, Expr::value(image))
                    .filter(artisans::Column::Id.eq(account.id))
                    .exec(db)
                    .await?
            }
            AccountKind::Etablissement => {
                etablissements::Entity::update_many()
                    .col_expr(etablissements::Column::Image, Expr::value(image))
                    .filter(etablissements::Column::Id.eq(account.id))
                    .exec(db)
                    .await?
            }
        };
        if affected.rows_affected == 0 {
            return Err(AppError::not_found(&capitalize(account.kind.as_str()), account.id));
        }
        Ok(())
    }
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
