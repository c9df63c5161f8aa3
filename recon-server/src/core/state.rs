//! Server state
//!
//! Holds shared references to the store, the reconcilers and the
//! orchestrator. Everything is behind `Arc`, so cloning the state is
//! cheap and every handler sees the same instances. All collaborators are
//! injected through their traits: production wiring uses the REST clients
//! and SurrealDB, tests swap in mocks and the in-memory store through the
//! same constructor.

use std::sync::Arc;

use crate::core::Config;
use crate::db::{OrderStore, SurrealOrderStore};
use crate::gateways::{
    AccountingApi, InvoiceService, PaymentGateway, RestAccounting, RestPaymentGateway,
    RestShippingCarrier, ShippingCarrier,
};
use crate::recon::{PaymentReconciler, ShipmentReconciler, SideEffectOrchestrator};

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn OrderStore>,
    pub payments: Arc<PaymentReconciler>,
    pub shipments: Arc<ShipmentReconciler>,
    pub effects: Arc<SideEffectOrchestrator>,
}

impl ServerState {
    /// Production wiring: SurrealDB store + REST vendor clients
    pub async fn initialize(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store: Arc<dyn OrderStore> =
            Arc::new(SurrealOrderStore::open(&config.db_path()).await?);

        let gateway: Arc<dyn PaymentGateway> = Arc::new(RestPaymentGateway::new(
            "gateway",
            &config.gateway_api_url,
            &config.gateway_key_id,
            &config.gateway_key_secret,
        ));
        let carrier: Arc<dyn ShippingCarrier> = Arc::new(RestShippingCarrier::new(
            "carrier",
            &config.carrier_api_url,
            &config.carrier_api_token,
        ));
        let accounting_client = Arc::new(RestAccounting::new(
            "accounting",
            &config.accounting_api_url,
            &config.accounting_api_key,
        ));
        let invoicing: Arc<dyn InvoiceService> = accounting_client.clone();
        let accounting: Arc<dyn AccountingApi> = accounting_client;

        Ok(Self::with_collaborators(
            config, store, gateway, carrier, invoicing, accounting,
        ))
    }

    /// Wire the state from explicit collaborators
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        carrier: Arc<dyn ShippingCarrier>,
        invoicing: Arc<dyn InvoiceService>,
        accounting: Arc<dyn AccountingApi>,
    ) -> Self {
        let shipments = Arc::new(ShipmentReconciler::new(store.clone(), carrier));
        let effects = Arc::new(SideEffectOrchestrator::new(
            store.clone(),
            invoicing,
            accounting,
            shipments.clone(),
        ));
        let payments = Arc::new(PaymentReconciler::new(
            store.clone(),
            gateway,
            effects.clone(),
        ));

        Self {
            config,
            store,
            payments,
            shipments,
            effects,
        }
    }
}
