// ============================================================================
// SERVICE : ABONNEMENTS
// ============================================================================
//
// Règles d'accès calculées depuis les colonnes d'abonnement :
//   - isExpired           = now >= fin (pas de date de fin => expiré)
//   - daysUntilExpiry     = ceil((fin - now) / 1 jour)
//   - isApproachingExpiry = 0 < daysUntilExpiry <= 3
//   - isActive            = ACTIVE et non expiré
//   - canAccessDashboard  = isActive et paymentStatus == payed
//
// Chaque fenêtre d'abonnement dure 30 jours.
//
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::error::AppError;
use crate::models::account::{
    Account, AccountKind, PaymentStatus, SubscriptionSnapshot, SubscriptionStatus,
};
use crate::models::dto::SubscriptionPlan;
use crate::services::account_service::{AccountChanges, AccountService};
use crate::services::payment_service::{self, PaymentGateway, PaymentInit, PaymentSession};
use crate::utils::codes::normalize_email_param;

pub const SUBSCRIPTION_DAYS: i64 = 30;
const APPROACHING_EXPIRY_DAYS: i64 = 3;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionReport {
    pub is_active: bool,
    pub is_expired: bool,
    pub is_approaching_expiry: bool,
    pub days_until_expiry: i64,
    pub can_access_dashboard: bool,
    pub payment_status: PaymentStatus,
    pub subscription_plan: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetails {
    pub abonnement: String,
    pub subscription_status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub message: String,
    pub activated: bool,
}

/// Évalue l'abonnement à l'instant `now` (fonction pure)
pub fn evaluate(snapshot: &SubscriptionSnapshot, now: DateTime<Utc>) -> SubscriptionReport {
    let (is_expired, days_until_expiry) = match snapshot.end_date {
        Some(end) => {
            let millis = (end - now).num_milliseconds();
            let days = (millis as f64 / 86_400_000.0).ceil() as i64;
            (now >= end, days)
        }
        None => (true, 0),
    };

    let is_active = snapshot.status == SubscriptionStatus::Active && !is_expired;

    SubscriptionReport {
        is_active,
        is_expired,
        is_approaching_expiry: days_until_expiry > 0 && days_until_expiry <= APPROACHING_EXPIRY_DAYS,
        days_until_expiry,
        can_access_dashboard: is_active && snapshot.payment_status == PaymentStatus::Payed,
        payment_status: snapshot.payment_status,
        subscription_plan: snapshot.plan.clone(),
        subscription_status: snapshot.status,
        subscription_end_date: snapshot.end_date,
    }
}

pub fn can_access_dashboard(account: &Account, now: DateTime<Utc>) -> bool {
    evaluate(&account.subscription(), now).can_access_dashboard
}

/// standard | premium, insensible à la casse
pub fn normalize_plan(raw: &str) -> Result<String, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "standard" | "basic" => Ok("standard".to_string()),
        "premium" => Ok("premium".to_string()),
        other => Err(AppError::Validation(format!(
            "Invalid subscription plan '{}': expected standard or premium",
            other
        ))),
    }
}

fn fresh_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::days(SUBSCRIPTION_DAYS))
}

pub struct SubscriptionService;

impl SubscriptionService {
    pub fn plans() -> Vec<SubscriptionPlan> {
        vec![
            SubscriptionPlan { name: "Basic", price: 9, features: vec!["Standard features"] },
            SubscriptionPlan {
                name: "Premium",
                price: 49,
                features: vec!["Premium features", "Priority support"],
            },
        ]
    }

    pub async fn check(
        db: &DatabaseConnection,
        kind: AccountKind,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionReport, AppError> {
        let account = AccountService::require(db, kind, email).await?;
        Ok(evaluate(&account.subscription(), now))
    }

    /// Refuse l'accès si l'e-mail du demandeur n'a pas d'abonnement payé et actif.
    /// Sans e-mail, l'accès n'est pas filtré.
    pub async fn require_dashboard_access(
        db: &DatabaseConnection,
        requester_email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let Some(email) = requester_email.filter(|e| !e.trim().is_empty()) else {
            return Ok(());
        };
        match AccountService::find_by_email(db, email).await? {
            Some(account) if can_access_dashboard(&account, now) => Ok(()),
            _ => Err(AppError::SubscriptionRequired),
        }
    }

    /// Nouvelle fenêtre de 30 jours, ACTIVE et payée
    pub async fn extend(
        db: &DatabaseConnection,
        kind: AccountKind,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let account = AccountService::require(db, kind, email).await?;
        AccountService::update(
            db,
            account.reference(),
            &AccountChanges {
                status: Some(SubscriptionStatus::Active),
                payment: Some(PaymentStatus::Payed),
                window: Some(fresh_window(now)),
                ..Default::default()
            },
        )
        .await?;
        tracing::info!(kind = %kind, account_id = account.id(), "subscription extended");
        Ok(())
    }

    pub async fn sweep_expired(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<u64, AppError> {
        Ok(AccountService::expire_overdue(db, now).await?)
    }

    /// `payed` ouvre aussi une nouvelle fenêtre ACTIVE de 30 jours
    pub async fn update_payment_status(
        db: &DatabaseConnection,
        kind: AccountKind,
        email_param: &str,
        raw_status: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account, AppError> {
        let email = normalize_email_param(email_param);
        if email.is_empty() {
            return Err(AppError::Validation("Email parameter is required".into()));
        }
        let payment = raw_status
            .and_then(PaymentStatus::parse_lenient)
            .ok_or_else(|| {
                AppError::Validation("paymentStatus must be either 'payed' or 'non_payed'".into())
            })?;

        let account = AccountService::require(db, kind, &email).await?;
        let changes = match payment {
            PaymentStatus::Payed => AccountChanges {
                payment: Some(payment),
                status: Some(SubscriptionStatus::Active),
                window: Some(fresh_window(now)),
                ..Default::default()
            },
            PaymentStatus::NonPayed => AccountChanges { payment: Some(payment), ..Default::default() },
        };
        AccountService::update(db, account.reference(), &changes).await?;

        AccountService::require_ref(db, account.reference()).await
    }

    /// Change le plan d'un user ou d'un artisan (les établissements n'ont pas de plan)
    pub async fn update_plan(db: &DatabaseConnection, email: &str, raw_plan: &str) -> Result<Account, AppError> {
        let plan = normalize_plan(raw_plan)?;
        let account = AccountService::find_by_email(db, email)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".into()))?;
        if account.kind() == AccountKind::Etablissement {
            return Err(AppError::Validation(
                "Subscription plans are only available for users and artisans".into(),
            ));
        }
        AccountService::update(
            db,
            account.reference(),
            &AccountChanges { plan: Some(plan), ..Default::default() },
        )
        .await?;
        AccountService::require_ref(db, account.reference()).await
    }

    /// Change le plan et relance une fenêtre ACTIVE de 30 jours
    pub async fn renew_plan(
        db: &DatabaseConnection,
        kind: AccountKind,
        email: &str,
        raw_plan: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, AppError> {
        if kind == AccountKind::Etablissement {
            return Err(AppError::Validation(
                "Subscription plans are only available for users and artisans".into(),
            ));
        }
        let plan = normalize_plan(raw_plan)?;
        let account = AccountService::require(db, kind, email).await?;
        AccountService::update(
            db,
            account.reference(),
            &AccountChanges {
                plan: Some(plan),
                status: Some(SubscriptionStatus::Active),
                window: Some(fresh_window(now)),
                ..Default::default()
            },
        )
        .await?;
        AccountService::require_ref(db, account.reference()).await
    }

    pub async fn details(db: &DatabaseConnection, kind: AccountKind, email: &str) -> Result<SubscriptionDetails, AppError> {
        let snapshot = AccountService::require(db, kind, email).await?.subscription();
        Ok(SubscriptionDetails {
            abonnement: snapshot.plan,
            subscription_status: snapshot.status,
            payment_status: snapshot.payment_status,
            subscription_start_date: snapshot.start_date,
            subscription_end_date: snapshot.end_date,
        })
    }

    /// Ouvre un paiement chez le prestataire pour le plan demandé
    pub async fn initiate_payment(
        db: &DatabaseConnection,
        gateway: &dyn PaymentGateway,
        kind: AccountKind,
        email: &str,
        raw_plan: &str,
    ) -> Result<PaymentSession, AppError> {
        let plan = normalize_plan(raw_plan)?;
        let account = AccountService::require(db, kind, email).await?;
        let price = payment_service::plan_price(&plan);

        let (first_name, last_name) = match &account {
            Account::User(u) => (u.first_name.clone(), u.last_name.clone()),
            Account::Artisan(a) => (a.first_name.clone(), a.last_name.clone()),
            Account::Etablissement(e) => (Some(e.name_of_etablissement.clone()), None),
        };

        let session = gateway
            .init_payment(PaymentInit {
                amount_millimes: payment_service::to_millimes(price as f64),
                description: format!("Abonnement {} ({} TND)", plan, price),
                first_name,
                last_name,
                phone_number: None,
                email: Some(account.email().to_string()),
                order_id: format!("sub-{}-{}-{}", kind, account.id(), uuid::Uuid::new_v4()),
            })
            .await?;
        Ok(session)
    }

    /// Retour du prestataire : le statut est relu auprès de la passerelle,
    /// seul un paiement confirmé prolonge l'abonnement
    pub async fn handle_webhook(
        db: &DatabaseConnection,
        gateway: &dyn PaymentGateway,
        kind: AccountKind,
        email: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, AppError> {
        let details = gateway
            .payment_status(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", payment_id)))?;

        if payment_service::is_paid(&details.status) {
            Self::extend(db, kind, email, now).await?;
            return Ok(WebhookOutcome {
                message: format!("Payment {} received, subscription activated", payment_id),
                activated: true,
            });
        }

        AccountService::require(db, kind, email).await?;
        tracing::warn!(payment_id, status = %details.status, "payment not completed");
        Ok(WebhookOutcome {
            message: format!("Payment {} not completed ({})", payment_id, details.status),
            activated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::services::payment_service::testing::StubGateway;
    use crate::test_support::{seed_artisan, seed_etablissement, seed_user};

    fn snapshot(status: SubscriptionStatus, payment: PaymentStatus, end: Option<DateTime<Utc>>) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            plan: "standard".into(),
            status,
            payment_status: payment,
            start_date: None,
            end_date: end,
        }
    }

    #[test]
    fn test_dashboard_requires_active_unexpired_and_paid() {
        let now = Utc::now();
        let future = Some(now + Duration::days(10));

        let ok = evaluate(&snapshot(SubscriptionStatus::Active, PaymentStatus::Payed, future), now);
        assert!(ok.can_access_dashboard);
        assert!(ok.is_active);

        let unpaid = evaluate(&snapshot(SubscriptionStatus::Active, PaymentStatus::NonPayed, future), now);
        assert!(unpaid.is_active);
        assert!(!unpaid.can_access_dashboard);

        let cancelled = evaluate(&snapshot(SubscriptionStatus::Cancelled, PaymentStatus::Payed, future), now);
        assert!(!cancelled.can_access_dashboard);

        let expired = evaluate(
            &snapshot(SubscriptionStatus::Active, PaymentStatus::Payed, Some(now - Duration::hours(1))),
            now,
        );
        assert!(expired.is_expired);
        assert!(!expired.can_access_dashboard);
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let now = Utc::now();
        let report = evaluate(&snapshot(SubscriptionStatus::Active, PaymentStatus::Payed, Some(now)), now);
        assert!(report.is_expired);
        assert_eq!(report.days_until_expiry, 0);
        assert!(!report.is_approaching_expiry);
    }

    #[test]
    fn test_days_until_expiry_rounds_up() {
        let now = Utc::now();
        let report = evaluate(
            &snapshot(SubscriptionStatus::Active, PaymentStatus::Payed, Some(now + Duration::hours(49))),
            now,
        );
        assert_eq!(report.days_until_expiry, 3);
        assert!(report.is_approaching_expiry);

        let far = evaluate(
            &snapshot(SubscriptionStatus::Active, PaymentStatus::Payed, Some(now + Duration::days(10))),
            now,
        );
        assert_eq!(far.days_until_expiry, 10);
        assert!(!far.is_approaching_expiry);
    }

    #[test]
    fn test_missing_end_date_counts_as_expired() {
        let report = evaluate(&snapshot(SubscriptionStatus::Active, PaymentStatus::Payed, None), Utc::now());
        assert!(report.is_expired);
        assert!(!report.can_access_dashboard);
    }

    #[test]
    fn test_normalize_plan() {
        assert_eq!(normalize_plan("Premium").unwrap(), "premium");
        assert_eq!(normalize_plan("basic").unwrap(), "standard");
        assert!(normalize_plan("gold").is_err());
    }

    #[tokio::test]
    async fn test_payment_status_payed_opens_window() {
        let db = test_connection().await;
        seed_user(&db, "a@x.com").await;
        let now = Utc::now();

        let account = SubscriptionService::update_payment_status(
            &db,
            AccountKind::User,
            "email=a@x.com",
            Some("PAID"),
            now,
        )
        .await
        .unwrap();
        let report = evaluate(&account.subscription(), now);
        assert!(report.can_access_dashboard);
        assert_eq!(report.days_until_expiry, SUBSCRIPTION_DAYS);
    }

    #[tokio::test]
    async fn test_payment_status_rejects_unknown_value() {
        let db = test_connection().await;
        seed_user(&db, "a@x.com").await;
        let err = SubscriptionService::update_payment_status(&db, AccountKind::User, "a@x.com", Some("maybe"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_plan_rejects_etablissement() {
        let db = test_connection().await;
        seed_etablissement(&db, "e@x.com").await;
        seed_artisan(&db, "art@x.com").await;

        let err = SubscriptionService::update_plan(&db, "e@x.com", "premium").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let artisan = SubscriptionService::update_plan(&db, "art@x.com", "premium").await.unwrap();
        assert_eq!(artisan.subscription().plan, "premium");
    }

    #[tokio::test]
    async fn test_require_dashboard_access() {
        let db = test_connection().await;
        seed_user(&db, "unpaid@x.com").await;
        seed_etablissement(&db, "paid@x.com").await;
        let now = Utc::now();

        assert!(SubscriptionService::require_dashboard_access(&db, None, now).await.is_ok());
        assert!(SubscriptionService::require_dashboard_access(&db, Some("paid@x.com"), now).await.is_ok());
        assert!(matches!(
            SubscriptionService::require_dashboard_access(&db, Some("unpaid@x.com"), now).await,
            Err(AppError::SubscriptionRequired)
        ));
        assert!(matches!(
            SubscriptionService::require_dashboard_access(&db, Some("ghost@x.com"), now).await,
            Err(AppError::SubscriptionRequired)
        ));
    }

    #[tokio::test]
    async fn test_webhook_paid_extends_subscription() {
        let db = test_connection().await;
        seed_artisan(&db, "art@x.com").await;
        let now = Utc::now();
        let gateway = StubGateway::with_status("p1", "completed");
        gateway.statuses.lock().unwrap().push(("p2".into(), "pending".into()));

        // Un paiement en attente ne donne aucun accès
        let pending = SubscriptionService::handle_webhook(&db, &gateway, AccountKind::Artisan, "art@x.com", "p2", now)
            .await
            .unwrap();
        assert!(!pending.activated);
        let report = SubscriptionService::check(&db, AccountKind::Artisan, "art@x.com", now).await.unwrap();
        assert!(!report.can_access_dashboard);

        let outcome = SubscriptionService::handle_webhook(&db, &gateway, AccountKind::Artisan, "art@x.com", "p1", now)
            .await
            .unwrap();
        assert!(outcome.activated);
        let report = SubscriptionService::check(&db, AccountKind::Artisan, "art@x.com", now).await.unwrap();
        assert!(report.can_access_dashboard);

        let unknown = SubscriptionService::handle_webhook(&db, &gateway, AccountKind::Artisan, "art@x.com", "p3", now)
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_initiate_payment_uses_plan_price() {
        let db = test_connection().await;
        seed_user(&db, "a@x.com").await;
        let gateway = StubGateway::default();

        let session = SubscriptionService::initiate_payment(&db, &gateway, AccountKind::User, "a@x.com", "premium")
            .await
            .unwrap();
        assert!(session.payment_ref.starts_with("ref-sub-user-"));
        let initiated = gateway.initiated.lock().unwrap();
        assert_eq!(initiated[0].amount_millimes, 49_000);
    }

    #[tokio::test]
    async fn test_check_unknown_account_is_not_found() {
        let db = test_connection().await;
        let err = SubscriptionService::check(&db, AccountKind::Etablissement, "x@x.com", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Etablissement not found");
    }
}
