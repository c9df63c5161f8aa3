//! REST shipping carrier client

use serde::Deserialize;
use serde_json::json;
use shared::order::Order;

use super::{CarrierShipment, GatewayError, GatewayResult, ShippingCarrier, TrackingEvent};
use async_trait::async_trait;

/// Shipping carrier client using bearer-token auth
#[derive(Clone)]
pub struct RestShippingCarrier {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    provider: String,
}

impl RestShippingCarrier {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_token: api_token.into(),
            provider: provider.into(),
        }
    }

    fn bad_response(&self, detail: impl Into<String>) -> GatewayError {
        GatewayError::BadResponse {
            provider: self.provider.clone(),
            detail: detail.into(),
        }
    }
}

/// Carrier shipment-creation response
#[derive(Debug, Deserialize)]
struct CreateShipmentResponse {
    order_id: String,
    shipment_id: String,
    awb_code: String,
    courier_name: Option<String>,
    label_url: Option<String>,
}

/// One scan in the carrier tracking response
#[derive(Debug, Deserialize)]
struct TrackingScan {
    status: String,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TrackingResponse {
    scans: Vec<TrackingScan>,
}

#[async_trait]
impl ShippingCarrier for RestShippingCarrier {
    async fn create_shipment(&self, order: &Order) -> GatewayResult<CarrierShipment> {
        let items: Vec<_> = order
            .items
            .iter()
            .map(|i| {
                json!({
                    "sku": i.sku,
                    "name": i.name,
                    "units": i.quantity,
                    "selling_price": i.unit_price,
                })
            })
            .collect();

        let response = self
            .http
            .post(format!("{}/v1/shipments", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&json!({
                "order_id": order.id,
                "sub_total": order.total,
                "currency": order.currency,
                "items": items,
                "shipping_address": order.shipping_address,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected {
                provider: self.provider.clone(),
                detail: format!("shipment creation returned {}", response.status()),
            });
        }

        let body: CreateShipmentResponse = response
            .json()
            .await
            .map_err(|e| self.bad_response(e.to_string()))?;

        Ok(CarrierShipment {
            carrier_order_id: body.order_id,
            shipment_id: body.shipment_id,
            awb: body.awb_code,
            courier_name: body.courier_name,
            label_url: body.label_url,
        })
    }

    async fn fetch_tracking(&self, awb: &str) -> GatewayResult<Vec<TrackingEvent>> {
        let response = self
            .http
            .get(format!("{}/v1/tracking/{}", self.base_url, awb))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected {
                provider: self.provider.clone(),
                detail: format!("tracking lookup returned {}", response.status()),
            });
        }

        let body: TrackingResponse = response
            .json()
            .await
            .map_err(|e| self.bad_response(e.to_string()))?;

        Ok(body
            .scans
            .into_iter()
            .map(|s| TrackingEvent {
                status_raw: s.status,
                occurred_at: s.timestamp,
            })
            .collect())
    }
}
