use actix_web::{HttpResponse, get, post, put, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::models::account::AccountKind;
use crate::models::dto::{
    ExtendSubscriptionRequest, PaymentStatusRequest, RenewSubscriptionRequest, SubscriptionPayRequest,
    SubscriptionWebhookRequest, UpdateSubscriptionPlanRequest,
};
use crate::services::payment_service::PaymentGateway;
use crate::services::subscription_service::SubscriptionService;

// ----------------------------------------------------------------------------
// Routes montées sous /auth
// ----------------------------------------------------------------------------

/// GET /auth/subscription-status/{kind}/{email} - État calculé de l'abonnement
#[get("/subscription-status/{kind}/{email}")]
pub async fn subscription_status(
    path: web::Path<(AccountKind, String)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (kind, email) = path.into_inner();
    let report = SubscriptionService::check(db.get_ref(), kind, &email, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// POST /auth/extend-subscription - Nouvelle fenêtre de 30 jours
#[post("/extend-subscription")]
pub async fn extend_subscription(
    body: web::Json<ExtendSubscriptionRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    SubscriptionService::extend(db.get_ref(), body.entity_type, &body.email, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Subscription extended successfully" })))
}

/// POST /auth/update-expired-subscriptions - Passe en EXPIRED les fenêtres échues
#[post("/update-expired-subscriptions")]
pub async fn update_expired_subscriptions(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let updated = SubscriptionService::sweep_expired(db.get_ref(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Expired subscriptions updated",
        "updated": updated,
    })))
}

/// PUT /auth/payment-status/{kind}/{email}
#[put("/payment-status/{kind}/{email}")]
pub async fn update_payment_status(
    path: web::Path<(AccountKind, String)>,
    body: web::Json<PaymentStatusRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (kind, email) = path.into_inner();
    let account = SubscriptionService::update_payment_status(
        db.get_ref(),
        kind,
        &email,
        body.payment_status.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Payment status updated successfully",
        "user": account,
    })))
}

/// PUT /auth/update-subscription - Changer de plan (users et artisans)
#[put("/update-subscription")]
pub async fn update_subscription(
    body: web::Json<UpdateSubscriptionPlanRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let account = SubscriptionService::update_plan(db.get_ref(), &body.email, &body.subscription_plan).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Subscription plan updated successfully",
        "user": account,
    })))
}

pub fn subscription_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(subscription_status)
        .service(extend_subscription)
        .service(update_expired_subscriptions)
        .service(update_payment_status)
        .service(update_subscription);
}

// ----------------------------------------------------------------------------
// Scope /subscription
// ----------------------------------------------------------------------------

/// GET /subscription/plans
#[get("/plans")]
pub async fn plans() -> HttpResponse {
    HttpResponse::Ok().json(SubscriptionService::plans())
}

/// POST /subscription/pay - Ouvre un paiement Konnect pour le plan choisi
#[post("/pay")]
pub async fn pay(
    body: web::Json<SubscriptionPayRequest>,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<dyn PaymentGateway>,
) -> Result<HttpResponse, AppError> {
    let session =
        SubscriptionService::initiate_payment(db.get_ref(), gateway.get_ref(), body.user_type, &body.email, &body.plan)
            .await?;
    Ok(HttpResponse::Ok().json(session))
}

/// POST /subscription/webhook - Retour du paiement d'abonnement (statut relu chez Konnect)
#[post("/webhook")]
pub async fn webhook(
    body: web::Json<SubscriptionWebhookRequest>,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<dyn PaymentGateway>,
) -> Result<HttpResponse, AppError> {
    let outcome = SubscriptionService::handle_webhook(
        db.get_ref(),
        gateway.get_ref(),
        body.user_type,
        &body.email,
        &body.payment_id,
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// PUT /subscription/update - Renouveler avec un nouveau plan
#[put("/update")]
pub async fn renew(
    body: web::Json<RenewSubscriptionRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let account =
        SubscriptionService::renew_plan(db.get_ref(), body.user_type, &body.email, &body.new_plan, Utc::now())
            .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Subscription updated successfully",
        "user": account,
    })))
}

/// GET /subscription/{kind}/email/{email} - Détails bruts de l'abonnement
#[get("/{kind}/email/{email}")]
pub async fn details(
    path: web::Path<(AccountKind, String)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (kind, email) = path.into_inner();
    Ok(HttpResponse::Ok().json(SubscriptionService::details(db.get_ref(), kind, &email).await?))
}

pub fn subscription_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscription")
            .service(plans)
            .service(pay)
            .service(webhook)
            .service(renew)
            .service(details),
    );
}
