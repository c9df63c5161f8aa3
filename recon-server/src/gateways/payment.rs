//! REST payment gateway client

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::{FetchedPayment, GatewayError, GatewayResult, PaymentGateway};
use async_trait::async_trait;

/// Payment gateway client using key-id/key-secret basic auth
#[derive(Clone)]
pub struct RestPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    provider: String,
}

impl RestPaymentGateway {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            provider: provider.into(),
        }
    }
}

/// Gateway order-creation response
#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
}

/// Gateway payment-lookup response
#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: String,
    /// Amount in minor units (paise/cents)
    amount: i64,
    currency: String,
    status: String,
    method: Option<String>,
    /// Fee in minor units
    fee: Option<i64>,
}

/// Minor units → decimal major units (2 fraction digits)
fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[async_trait]
impl PaymentGateway for RestPaymentGateway {
    async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        reference: &str,
    ) -> GatewayResult<String> {
        // Gateways take amounts in minor units
        let minor = (amount * Decimal::from(100)).trunc();
        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": minor,
                "currency": currency,
                "receipt": reference,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected {
                provider: self.provider.clone(),
                detail: format!("order creation returned {}", response.status()),
            });
        }

        let body: CreateOrderResponse =
            response.json().await.map_err(|e| GatewayError::BadResponse {
                provider: self.provider.clone(),
                detail: e.to_string(),
            })?;
        Ok(body.id)
    }

    async fn fetch_payment(&self, payment_id: &str) -> GatewayResult<FetchedPayment> {
        let response = self
            .http
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected {
                provider: self.provider.clone(),
                detail: format!("payment lookup returned {}", response.status()),
            });
        }

        let body: PaymentResponse =
            response.json().await.map_err(|e| GatewayError::BadResponse {
                provider: self.provider.clone(),
                detail: e.to_string(),
            })?;

        Ok(FetchedPayment {
            txn_id: body.id,
            amount: from_minor(body.amount),
            currency: body.currency,
            status: body.status,
            method: body.method,
            fee: body.fee.map(from_minor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units_convert_exactly() {
        assert_eq!(from_minor(99900), Decimal::new(99900, 2));
        assert_eq!(from_minor(99900).to_string(), "999.00");
        assert_eq!(from_minor(1), Decimal::new(1, 2));
    }
}
