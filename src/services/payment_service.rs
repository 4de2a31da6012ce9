// ============================================================================
// PAIEMENTS : passerelle Konnect
// ============================================================================
//
// `PaymentGateway` isole le prestataire. `KonnectGateway` appelle l'API
// Konnect v2 :
//   - POST {api}/payments/init-payment  -> { payUrl, paymentRef }
//   - GET  {api}/payments/{paymentRef}  -> { payment: { status, ... } }
//
// Les montants sont envoyés en millimes (1 TND = 1000 millimes).
// Le webhook n'est pas signé par Konnect : on relit toujours le statut
// auprès de l'API au lieu de faire confiance au corps reçu.
//
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::KonnectConfig;
use crate::models::account::PaymentStatus;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to payment provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Paiement à initier auprès du prestataire
#[derive(Debug, Clone, Default)]
pub struct PaymentInit {
    pub amount_millimes: u64,
    pub description: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub pay_url: String,
    pub payment_ref: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentDetails {
    pub status: String,
    pub details: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn init_payment(&self, payment: PaymentInit) -> Result<PaymentSession, GatewayError>;

    /// `None` si le prestataire ne connaît pas cette référence
    async fn payment_status(&self, payment_ref: &str) -> Result<Option<PaymentDetails>, GatewayError>;
}

pub struct KonnectGateway {
    client: reqwest::Client,
    config: KonnectConfig,
}

impl KonnectGateway {
    pub fn new(config: KonnectConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client, config })
    }

    fn init_body(&self, payment: &PaymentInit) -> serde_json::Value {
        serde_json::json!({
            "receiverWalletId": self.config.wallet_id,
            "token": "TND",
            "amount": payment.amount_millimes,
            "type": "immediate",
            "description": payment.description,
            "acceptedPaymentMethods": ["wallet", "bank_card", "e-DINAR"],
            "lifespan": 10,
            "checkoutForm": true,
            "addPaymentFeesToAmount": true,
            "firstName": payment.first_name,
            "lastName": payment.last_name,
            "phoneNumber": payment.phone_number,
            "email": payment.email,
            "orderId": payment.order_id,
            "webhook": self.config.webhook_url,
            "theme": "light",
        })
    }
}

#[async_trait]
impl PaymentGateway for KonnectGateway {
    async fn init_payment(&self, payment: PaymentInit) -> Result<PaymentSession, GatewayError> {
        let url = format!("{}/payments/init-payment", self.config.api_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .json(&self.init_body(&payment))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let session = response.json::<PaymentSession>().await?;
        tracing::info!(payment_ref = %session.payment_ref, order_id = %payment.order_id, "payment initiated");
        Ok(session)
    }

    async fn payment_status(&self, payment_ref: &str) -> Result<Option<PaymentDetails>, GatewayError> {
        let url = format!("{}/payments/{}", self.config.api_url.trim_end_matches('/'), payment_ref);
        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let body: serde_json::Value = response.json().await?;
        let payment = body.get("payment").cloned().unwrap_or(body);
        let status = payment
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        Ok(Some(PaymentDetails { status, details: payment }))
    }
}

/// Prix mensuel d'un plan (en dinars)
pub fn plan_price(plan: &str) -> u32 {
    if plan.eq_ignore_ascii_case("premium") { 49 } else { 9 }
}

/// Konnect renvoie `completed` ; les variantes internes sont aussi acceptées
pub fn is_paid(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("completed")
        || matches!(PaymentStatus::parse_lenient(status), Some(PaymentStatus::Payed))
}

pub fn to_millimes(amount: f64) -> u64 {
    (amount * 1000.0).round().max(0.0) as u64
}
