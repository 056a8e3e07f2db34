use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::client::ApiClient;
use crate::error::{self, StorefrontResult};

/// Lifecycle state of a payment, as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    RequiresAction,
    Succeeded,
    Failed,
    Refunded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub amount_cents: u64,
    pub currency: String,
    pub status: PaymentStatus,
    /// Secret handed to the gateway widget to finish the payment
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub order_id: String,
    pub amount_cents: u64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    /// Partial amount; the full payment when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Client for the `/payments` endpoints
pub struct PaymentsApi {
    client: Arc<ApiClient>,
}

impl PaymentsApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn create_payment(&self, payment: &NewPayment) -> StorefrontResult<Payment> {
        require_id("orderId", &payment.order_id)?;
        if payment.amount_cents == 0 {
            return Err(error::api_request_invalid("amountCents", "must be positive"));
        }
        if payment.currency.len() != 3 || !payment.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(error::api_request_invalid(
                "currency",
                "must be a three-letter ISO 4217 code",
            ));
        }

        let created: Payment = self.client.post("payments", payment).await?;
        info!(payment = %created.id, order = %created.order_id, "Payment created");
        Ok(created)
    }

    pub async fn get_payment(&self, payment_id: &str) -> StorefrontResult<Payment> {
        require_id("paymentId", payment_id)?;
        self.client.get(&format!("payments/{}", payment_id)).await
    }

    pub async fn confirm_payment(&self, payment_id: &str) -> StorefrontResult<Payment> {
        require_id("paymentId", payment_id)?;
        let confirmed: Payment = self
            .client
            .post(&format!("payments/{}/confirm", payment_id), &serde_json::json!({}))
            .await?;
        info!(payment = %confirmed.id, status = ?confirmed.status, "Payment confirmed");
        Ok(confirmed)
    }

    /// Payments visible to the caller; every payment for admins, own
    /// payments otherwise
    pub async fn list_payments(&self) -> StorefrontResult<Vec<Payment>> {
        self.client.get("payments").await
    }

    pub async fn list_payments_for_order(&self, order_id: &str) -> StorefrontResult<Vec<Payment>> {
        require_id("orderId", order_id)?;
        self.client.get(&format!("orders/{}/payments", order_id)).await
    }

    pub async fn refund_payment(
        &self,
        payment_id: &str,
        refund: &RefundRequest,
    ) -> StorefrontResult<Payment> {
        require_id("paymentId", payment_id)?;
        if refund.amount_cents == Some(0) {
            return Err(error::api_request_invalid("amountCents", "must be positive"));
        }
        let refunded: Payment = self
            .client
            .post(&format!("payments/{}/refund", payment_id), refund)
            .await?;
        info!(payment = %refunded.id, "Payment refunded");
        Ok(refunded)
    }
}

/// Reject ids that would change the request path
pub(crate) fn require_id(field: &str, id: &str) -> StorefrontResult<()> {
    if id.trim().is_empty() {
        return Err(error::api_request_invalid(field, "must not be empty"));
    }
    if id.contains(['/', '?', '#']) {
        return Err(error::api_request_invalid(field, "contains reserved URL characters"));
    }
    Ok(())
}
