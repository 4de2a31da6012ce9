use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::models::dto::InitPaymentRequest;
use crate::services::payment_service::{self, PaymentGateway, PaymentInit};

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub payment_ref: Option<String>,
}

/// POST /payments/init-payment - Lien de paiement Konnect
#[post("/init-payment")]
pub async fn init_payment(
    body: web::Json<InitPaymentRequest>,
    gateway: web::Data<dyn PaymentGateway>,
) -> Result<HttpResponse, AppError> {
    // 1. Valider le montant
    body.validate()?;
    let body = body.into_inner();

    // 2. Construire la demande (montant en millimes)
    let description = body.description.unwrap_or_else(|| match &body.subscription_type {
        Some(plan) => format!("Abonnement {}", plan),
        None => "Paiement".to_string(),
    });
    let payment = PaymentInit {
        amount_millimes: payment_service::to_millimes(body.amount),
        description,
        first_name: body.first_name,
        last_name: body.last_name,
        phone_number: body.phone_number,
        email: body.email,
        order_id: body.order_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    };

    // 3. Appeler le prestataire
    let session = gateway.init_payment(payment).await?;
    tracing::info!(payment_ref = %session.payment_ref, "payment initiated");
    Ok(HttpResponse::Ok().json(session))
}

/// GET /payments/webhook?payment_ref= - Relit le statut auprès du prestataire
#[get("/webhook")]
pub async fn webhook(
    query: web::Query<WebhookQuery>,
    gateway: web::Data<dyn PaymentGateway>,
) -> Result<HttpResponse, AppError> {
    let payment_ref = query
        .payment_ref
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::Validation("payment_ref is required".into()))?;

    let details = gateway
        .payment_status(payment_ref)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", payment_ref)))?;

    tracing::info!(payment_ref, status = %details.status, "payment webhook received");
    Ok(HttpResponse::Ok().json(details))
}

/// GET /payments/{paymentId}
#[get("/{payment_id}")]
pub async fn payment_details(
    path: web::Path<String>,
    gateway: web::Data<dyn PaymentGateway>,
) -> Result<HttpResponse, AppError> {
    let payment_id = path.into_inner();
    let details = gateway
        .payment_status(&payment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", payment_id)))?;
    Ok(HttpResponse::Ok().json(details))
}

pub fn payment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .service(init_payment)
            .service(webhook)
            .service(payment_details),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};

    use super::*;
    use crate::services::payment_service::testing::StubGateway;

    #[actix_web::test]
    async fn test_init_payment_in_millimes() {
        let stub = Arc::new(StubGateway::default());
        let gateway: Arc<dyn PaymentGateway> = stub.clone();
        let app = test::init_service(App::new().app_data(web::Data::from(gateway)).configure(payment_routes)).await;

        let req = test::TestRequest::post()
            .uri("/payments/init-payment")
            .set_json(serde_json::json!({ "amount": 12.5, "orderId": "cmd-1" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["paymentRef"], "ref-cmd-1");

        let initiated = stub.initiated.lock().unwrap();
        assert_eq!(initiated[0].amount_millimes, 12_500);
        assert_eq!(initiated[0].description, "Paiement");
    }

    #[actix_web::test]
    async fn test_webhook_requires_reference() {
        let gateway: Arc<dyn PaymentGateway> = Arc::new(StubGateway::with_status("ref-9", "completed"));
        let app = test::init_service(App::new().app_data(web::Data::from(gateway)).configure(payment_routes)).await;

        let req = test::TestRequest::get().uri("/payments/webhook").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/payments/webhook?payment_ref=ref-9").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "completed");

        let req = test::TestRequest::get().uri("/payments/unknown").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
