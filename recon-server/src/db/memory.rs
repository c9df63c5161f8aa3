//! In-memory order store
//!
//! DashMap-backed implementation with the same compare-and-set semantics as
//! the SurrealDB store. Used by the test suites and available for ephemeral
//! deployments where durability is not required.

use async_trait::async_trait;
use dashmap::DashMap;
use shared::order::{Order, PaymentStatus};

use super::{OrderStore, StoreError, StoreResult};

/// Order store backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: DashMap<String, Order>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
        }
    }

    /// Number of stored orders
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(order_id).map(|o| o.value().clone()))
    }

    async fn find_by_shipment(&self, key: &str) -> StoreResult<Option<Order>> {
        let found = self.orders.iter().find(|entry| {
            entry
                .shipment
                .as_ref()
                .is_some_and(|s| {
                    s.shipment_id.as_deref() == Some(key)
                        || s.carrier_order_id.as_deref() == Some(key)
                })
        });
        Ok(found.map(|entry| entry.value().clone()))
    }

    async fn insert(&self, order: &Order) -> StoreResult<()> {
        if self.orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(order.id.clone()));
        }
        self.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn update_checked(&self, order: &Order) -> StoreResult<Order> {
        let mut entry = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::NotFound(order.id.clone()))?;

        if entry.version != order.version {
            return Err(StoreError::VersionConflict(format!(
                "order {}: expected version {}, stored version {}",
                order.id, order.version, entry.version
            )));
        }

        let mut committed = order.clone();
        committed.version += 1;
        *entry = committed.clone();
        Ok(committed)
    }

    async fn list_missing_shipment(&self) -> StoreResult<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.payment_status == PaymentStatus::Paid && o.awb().is_none())
            .map(|o| o.value().clone())
            .collect())
    }

    async fn list_missing_invoice(&self) -> StoreResult<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.payment_status == PaymentStatus::Paid && o.invoice_id.is_none())
            .map(|o| o.value().clone())
            .collect())
    }
}
