//! External collaborator interfaces
//!
//! The reconciliation core talks to vendors through these narrow traits;
//! wire formats stay inside the client implementations. Tests inject mocks
//! through the same traits the production wiring uses.
//!
//! - [`PaymentGateway`] — gateway order creation and payment lookup
//! - [`ShippingCarrier`] — shipment creation and tracking lookup
//! - [`InvoiceService`] — invoice document generation
//! - [`AccountingApi`] — ledger payment recording

pub mod accounting;
pub mod carrier;
pub mod payment;

pub use accounting::RestAccounting;
pub use carrier::RestShippingCarrier;
pub use payment::RestPaymentGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::order::Order;
use thiserror::Error;

/// Gateway error types
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("{provider} returned an unexpected response: {detail}")]
    BadResponse { provider: String, detail: String },

    #[error("{provider} rejected the call: {detail}")]
    Rejected { provider: String, detail: String },
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Request(err.to_string())
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

// ============================================================================
// DTOs
// ============================================================================

/// Payment details fetched from the gateway
#[derive(Debug, Clone)]
pub struct FetchedPayment {
    pub txn_id: String,
    pub amount: Decimal,
    pub currency: String,
    /// Gateway status vocabulary ("captured", "failed", ...)
    pub status: String,
    pub method: Option<String>,
    pub fee: Option<Decimal>,
}

impl FetchedPayment {
    /// Whether the gateway considers the payment captured
    pub fn is_captured(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "captured" | "succeeded" | "paid"
        )
    }
}

/// Identifiers assigned by the carrier on shipment creation
#[derive(Debug, Clone)]
pub struct CarrierShipment {
    pub carrier_order_id: String,
    pub shipment_id: String,
    pub awb: String,
    pub courier_name: Option<String>,
    pub label_url: Option<String>,
}

/// One tracking scan from the carrier
#[derive(Debug, Clone)]
pub struct TrackingEvent {
    /// Carrier status phrase, unnormalized
    pub status_raw: String,
    /// Scan timestamp (Unix millis)
    pub occurred_at: Option<i64>,
}

/// Generated invoice document
#[derive(Debug, Clone)]
pub struct Invoice {
    pub invoice_id: String,
    pub invoice_url: Option<String>,
}

// ============================================================================
// Traits
// ============================================================================

/// Payment gateway API
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a gateway-side order for checkout; returns the gateway order id
    async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        reference: &str,
    ) -> GatewayResult<String>;

    /// Fetch a payment by the gateway's payment id
    async fn fetch_payment(&self, payment_id: &str) -> GatewayResult<FetchedPayment>;
}

/// Shipping carrier API
#[async_trait]
pub trait ShippingCarrier: Send + Sync {
    /// Register a shipment with the carrier; returns the assigned identifiers
    async fn create_shipment(&self, order: &Order) -> GatewayResult<CarrierShipment>;

    /// Fetch tracking scans for a tracking number
    async fn fetch_tracking(&self, awb: &str) -> GatewayResult<Vec<TrackingEvent>>;
}

/// Invoice generation API
#[async_trait]
pub trait InvoiceService: Send + Sync {
    async fn generate(&self, order: &Order) -> GatewayResult<Invoice>;
}

/// Accounting ledger API
#[async_trait]
pub trait AccountingApi: Send + Sync {
    /// Record a payment against an invoice
    ///
    /// `reference_id` is the gateway transaction id; the ledger must treat
    /// it as an idempotency key so re-running the sync cannot double-record
    /// revenue.
    async fn record_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        method: Option<&str>,
        reference_id: &str,
    ) -> GatewayResult<()>;
}
