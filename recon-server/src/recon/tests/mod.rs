use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rust_decimal::Decimal;
use shared::order::{Address, Order, OrderItem, PaymentCaptured, PaymentEvent, ShipmentEvent};
use shared::util::now_millis;

use crate::db::{MemoryOrderStore, OrderStore, StoreError, StoreResult};
use crate::gateways::{
    AccountingApi, CarrierShipment, FetchedPayment, GatewayError, GatewayResult, Invoice,
    InvoiceService, PaymentGateway, ShippingCarrier, TrackingEvent,
};
use crate::recon::{PaymentReconciler, ShipmentReconciler, SideEffectOrchestrator};
use async_trait::async_trait;

mod test_shipment;
mod test_side_effects;

// ========================================================================
// Mock collaborators
// ========================================================================

#[derive(Default)]
pub(crate) struct MockPaymentGateway {
    pub payments: Mutex<HashMap<String, FetchedPayment>>,
}

impl MockPaymentGateway {
    pub fn put_payment(&self, payment_id: &str, payment: FetchedPayment) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment_id.to_string(), payment);
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(
        &self,
        _amount: Decimal,
        _currency: &str,
        reference: &str,
    ) -> GatewayResult<String> {
        Ok(format!("gw_{}", reference))
    }

    async fn fetch_payment(&self, payment_id: &str) -> GatewayResult<FetchedPayment> {
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                provider: "mock-gateway".to_string(),
                detail: format!("unknown payment {}", payment_id),
            })
    }
}

#[derive(Default)]
pub(crate) struct MockCarrier {
    pub create_calls: AtomicUsize,
    pub fail_create: AtomicBool,
    pub tracking: Mutex<Vec<TrackingEvent>>,
}

impl MockCarrier {
    pub fn created(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn set_tracking(&self, statuses: &[&str]) {
        *self.tracking.lock().unwrap() = statuses
            .iter()
            .map(|s| TrackingEvent {
                status_raw: s.to_string(),
                occurred_at: Some(now_millis()),
            })
            .collect();
    }
}

#[async_trait]
impl ShippingCarrier for MockCarrier {
    async fn create_shipment(&self, order: &Order) -> GatewayResult<CarrierShipment> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                provider: "mock-carrier".to_string(),
                detail: "carrier unavailable".to_string(),
            });
        }
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CarrierShipment {
            carrier_order_id: format!("CO-{}", order.id),
            shipment_id: format!("S-{}", order.id),
            awb: format!("AWB-{}", order.id),
            courier_name: Some("Test Express".to_string()),
            label_url: None,
        })
    }

    async fn fetch_tracking(&self, _awb: &str) -> GatewayResult<Vec<TrackingEvent>> {
        Ok(self.tracking.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub(crate) struct MockInvoicing {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockInvoicing {
    pub fn generated(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvoiceService for MockInvoicing {
    async fn generate(&self, order: &Order) -> GatewayResult<Invoice> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                provider: "mock-books".to_string(),
                detail: "invoice service down".to_string(),
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Invoice {
            invoice_id: format!("INV-{}", order.id),
            invoice_url: Some(format!("https://books.test/INV-{}", order.id)),
        })
    }
}

#[derive(Default)]
pub(crate) struct MockAccounting {
    pub fail: AtomicBool,
    /// (document reference, txn id) pairs recorded with the ledger
    pub recorded: Mutex<Vec<(String, String)>>,
}

impl MockAccounting {
    pub fn recorded_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountingApi for MockAccounting {
    async fn record_payment(
        &self,
        invoice_id: &str,
        _amount: Decimal,
        _method: Option<&str>,
        reference_id: &str,
    ) -> GatewayResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                provider: "mock-books".to_string(),
                detail: "ledger down".to_string(),
            });
        }
        self.recorded
            .lock()
            .unwrap()
            .push((invoice_id.to_string(), reference_id.to_string()));
        Ok(())
    }
}

/// Store wrapper that can be switched into a failing mode
pub(crate) struct FlakyStore {
    pub inner: MemoryOrderStore,
    pub fail: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryOrderStore::new(),
            fail: AtomicBool::new(false),
        }
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for FlakyStore {
    async fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        self.check()?;
        self.inner.get(order_id).await
    }

    async fn find_by_shipment(&self, key: &str) -> StoreResult<Option<Order>> {
        self.check()?;
        self.inner.find_by_shipment(key).await
    }

    async fn insert(&self, order: &Order) -> StoreResult<()> {
        self.check()?;
        self.inner.insert(order).await
    }

    async fn update_checked(&self, order: &Order) -> StoreResult<Order> {
        self.check()?;
        self.inner.update_checked(order).await
    }

    async fn list_missing_shipment(&self) -> StoreResult<Vec<Order>> {
        self.check()?;
        self.inner.list_missing_shipment().await
    }

    async fn list_missing_invoice(&self) -> StoreResult<Vec<Order>> {
        self.check()?;
        self.inner.list_missing_invoice().await
    }
}

// ========================================================================
// Fixture
// ========================================================================

pub(crate) struct Fixture {
    pub store: Arc<dyn OrderStore>,
    pub gateway: Arc<MockPaymentGateway>,
    pub carrier: Arc<MockCarrier>,
    pub invoicing: Arc<MockInvoicing>,
    pub accounting: Arc<MockAccounting>,
    pub payments: Arc<PaymentReconciler>,
    pub shipments: Arc<ShipmentReconciler>,
    pub effects: Arc<SideEffectOrchestrator>,
}

pub(crate) fn fixture() -> Fixture {
    fixture_with_store(Arc::new(MemoryOrderStore::new()))
}

pub(crate) fn fixture_with_store(store: Arc<dyn OrderStore>) -> Fixture {
    let gateway = Arc::new(MockPaymentGateway::default());
    let carrier = Arc::new(MockCarrier::default());
    let invoicing = Arc::new(MockInvoicing::default());
    let accounting = Arc::new(MockAccounting::default());

    let shipments = Arc::new(ShipmentReconciler::new(store.clone(), carrier.clone()));
    let effects = Arc::new(SideEffectOrchestrator::new(
        store.clone(),
        invoicing.clone(),
        accounting.clone(),
        shipments.clone(),
    ));
    let payments = Arc::new(PaymentReconciler::new(
        store.clone(),
        gateway.clone(),
        effects.clone(),
    ));

    Fixture {
        store,
        gateway,
        carrier,
        invoicing,
        accounting,
        payments,
        shipments,
        effects,
    }
}

// ========================================================================
// Builders
// ========================================================================

pub(crate) fn test_order(id: &str, total: Decimal) -> Order {
    Order::new(
        id,
        total,
        "INR",
        vec![OrderItem {
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            unit_price: total,
            quantity: 1,
        }],
        Address {
            name: "Test Customer".to_string(),
            line1: "1 Test Street".to_string(),
            line2: None,
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            country: "IN".to_string(),
            phone: None,
        },
    )
}

pub(crate) async fn seed_order(fx: &Fixture, id: &str, total: Decimal) -> Order {
    let order = test_order(id, total);
    fx.store.insert(&order).await.unwrap();
    order
}

pub(crate) fn captured(txn: &str, order_ref: &str, amount: Decimal) -> PaymentEvent {
    PaymentEvent::Captured(PaymentCaptured {
        provider: "razorpay".to_string(),
        txn_id: txn.to_string(),
        order_ref: order_ref.to_string(),
        amount,
        currency: "INR".to_string(),
        method: Some("card".to_string()),
        fee: Some(Decimal::new(2000, 2)),
        occurred_at: now_millis(),
    })
}

pub(crate) fn shipment_event(shipment_id: &str, status_raw: &str) -> ShipmentEvent {
    ShipmentEvent {
        shipment_id: Some(shipment_id.to_string()),
        carrier_order_id: None,
        awb: None,
        courier_name: None,
        status_raw: status_raw.to_string(),
        pickup_date: None,
        shipped_date: None,
        delivered_date: None,
        rto_date: None,
    }
}

/// 999.00
pub(crate) fn total_999() -> Decimal {
    Decimal::new(99900, 2)
}
