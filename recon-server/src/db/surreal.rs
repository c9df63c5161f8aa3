//! SurrealDB order store
//!
//! Embedded document store. Record keys are `order:<order_id>`; the
//! business id is additionally stored in the `order_id` field so queries
//! can project a plain string back out (the `Order` type deserializes it
//! through a serde alias).
//!
//! Compare-and-set is expressed as a conditional `UPDATE ... WHERE
//! version = $expected`: SurrealDB applies the statement atomically per
//! record, so a concurrent writer leaves the update with zero affected
//! rows and the caller gets a version conflict.

use serde_json::json;
use shared::order::Order;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use super::{OrderStore, StoreError, StoreResult};
use async_trait::async_trait;

const ORDER_TABLE: &str = "order";

/// Order store backed by embedded SurrealDB
#[derive(Clone)]
pub struct SurrealOrderStore {
    db: Surreal<Db>,
}

impl SurrealOrderStore {
    /// Open (or create) the database at the given path
    pub async fn open(path: &str) -> StoreResult<Self> {
        let db = Surreal::new::<RocksDb>(path).await?;
        db.use_ns("storefront").use_db("orders").await?;
        Ok(Self { db })
    }

    /// Wrap an already-connected database handle
    pub fn with_db(db: Surreal<Db>) -> Self {
        Self { db }
    }

    /// Serialize an order into record content
    ///
    /// The `id` field is renamed to `order_id` so it cannot clash with the
    /// store-owned record id, and the version is set to the value being
    /// committed.
    fn content(order: &Order, version: u64) -> StoreResult<serde_json::Value> {
        let mut value = serde_json::to_value(order)?;
        let Some(obj) = value.as_object_mut() else {
            return Err(StoreError::Unavailable(
                "order did not serialize to an object".to_string(),
            ));
        };
        obj.remove("id");
        obj.insert("order_id".to_string(), json!(order.id));
        obj.insert("version".to_string(), json!(version));
        Ok(value)
    }
}

#[async_trait]
impl OrderStore for SurrealOrderStore {
    async fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let mut result = self
            .db
            .query("SELECT * OMIT id FROM type::thing($tb, $oid)")
            .bind(("tb", ORDER_TABLE))
            .bind(("oid", order_id.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    async fn find_by_shipment(&self, key: &str) -> StoreResult<Option<Order>> {
        let mut result = self
            .db
            .query(
                "SELECT * OMIT id FROM type::table($tb) \
                 WHERE shipment.shipment_id = $key OR shipment.carrier_order_id = $key \
                 LIMIT 1",
            )
            .bind(("tb", ORDER_TABLE))
            .bind(("key", key.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    async fn insert(&self, order: &Order) -> StoreResult<()> {
        let content = Self::content(order, order.version)?;
        let mut result = self
            .db
            .query("CREATE type::thing($tb, $oid) CONTENT $data RETURN NONE")
            .bind(("tb", ORDER_TABLE))
            .bind(("oid", order.id.clone()))
            .bind(("data", content))
            .await?;
        if let Err(e) = result.take::<Vec<serde_json::Value>>(0) {
            let msg = e.to_string();
            if msg.contains("already exists") {
                return Err(StoreError::Duplicate(order.id.clone()));
            }
            return Err(StoreError::Unavailable(msg));
        }
        Ok(())
    }

    async fn update_checked(&self, order: &Order) -> StoreResult<Order> {
        let next_version = order.version + 1;
        let content = Self::content(order, next_version)?;
        let mut result = self
            .db
            .query(
                "UPDATE type::thing($tb, $oid) CONTENT $data \
                 WHERE version = $expected \
                 RETURN VALUE order_id",
            )
            .bind(("tb", ORDER_TABLE))
            .bind(("oid", order.id.clone()))
            .bind(("data", content))
            .bind(("expected", order.version))
            .await?;
        let updated: Vec<String> = result.take(0)?;

        if updated.is_empty() {
            // Zero affected rows: either the record is gone or a concurrent
            // writer moved the version. Distinguish for the caller.
            return match self.get(&order.id).await? {
                Some(stored) => Err(StoreError::VersionConflict(format!(
                    "order {}: expected version {}, stored version {}",
                    order.id, order.version, stored.version
                ))),
                None => Err(StoreError::NotFound(order.id.clone())),
            };
        }

        let mut committed = order.clone();
        committed.version = next_version;
        Ok(committed)
    }

    async fn list_missing_shipment(&self) -> StoreResult<Vec<Order>> {
        let mut result = self
            .db
            .query(
                "SELECT * OMIT id FROM type::table($tb) \
                 WHERE payment_status = 'PAID' AND shipment.awb IS NONE",
            )
            .bind(("tb", ORDER_TABLE))
            .await?;
        Ok(result.take(0)?)
    }

    async fn list_missing_invoice(&self) -> StoreResult<Vec<Order>> {
        let mut result = self
            .db
            .query(
                "SELECT * OMIT id FROM type::table($tb) \
                 WHERE payment_status = 'PAID' AND invoice_id IS NONE",
            )
            .bind(("tb", ORDER_TABLE))
            .await?;
        Ok(result.take(0)?)
    }
}
