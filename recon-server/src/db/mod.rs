//! Order store
//!
//! The ownership authority for order records. All state transitions go
//! through [`OrderStore::update_checked`], a compare-and-set keyed on the
//! order's `version` field, so concurrent webhook deliveries for the same
//! order can never produce a lost update: the loser gets a
//! [`StoreError::VersionConflict`], the provider sees a server error, and
//! the redelivery is absorbed by the idempotency rules.
//!
//! Two implementations:
//!
//! - [`SurrealOrderStore`] — embedded SurrealDB, the production store
//! - [`MemoryOrderStore`] — dashmap-backed, for tests and ephemeral runs
//!
//! The trait is injected everywhere (never a process-global), so the
//! reconciliation core stays testable and horizontally scalable: dedup
//! state lives in the shared store, not in per-process memory.

pub mod memory;
pub mod surreal;

pub use memory::MemoryOrderStore;
pub use surreal::SurrealOrderStore;

use async_trait::async_trait;
use shared::order::Order;
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Version conflict: {0}")]
    VersionConflict(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Atomic access to order records
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order by its id
    async fn get(&self, order_id: &str) -> StoreResult<Option<Order>>;

    /// Fetch the order owning a carrier-assigned identifier
    ///
    /// Matches `shipment.shipment_id` first, then `shipment.carrier_order_id`.
    /// Carriers initiate callbacks with their own identifiers; the merchant
    /// order id is not a reliable match key.
    async fn find_by_shipment(&self, key: &str) -> StoreResult<Option<Order>>;

    /// Insert a new order (checkout); fails on duplicate id
    async fn insert(&self, order: &Order) -> StoreResult<()>;

    /// Compare-and-set update
    ///
    /// Commits `order` only if the stored version still equals
    /// `order.version`, and bumps the version by one. Returns the committed
    /// record. A concurrent writer surfaces as
    /// [`StoreError::VersionConflict`]; no partial mutation is ever visible.
    async fn update_checked(&self, order: &Order) -> StoreResult<Order>;

    /// Paid orders with no tracking number yet (catch-up sweep input)
    async fn list_missing_shipment(&self) -> StoreResult<Vec<Order>>;

    /// Paid orders with no invoice yet (catch-up sweep input)
    async fn list_missing_invoice(&self) -> StoreResult<Vec<Order>>;
}
