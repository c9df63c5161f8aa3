//! Server configuration
//!
//! All settings come from the environment (with `.env` support via dotenv).

use crate::recon::signature::SignatureScheme;

/// One payment provider's webhook verification settings
#[derive(Debug, Clone)]
pub struct PaymentProviderConfig {
    /// Provider id as used in the webhook route
    pub name: String,
    /// MAC scheme the provider signs callbacks with
    pub scheme: SignatureScheme,
    /// Header carrying the signature
    pub signature_header: String,
    /// Shared webhook secret
    pub webhook_secret: String,
}

/// Server configuration
///
/// # Environment Variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/storefront/recon | working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | RAZORPAY_WEBHOOK_SECRET | — | enables the `razorpay` webhook route |
/// | STRIPE_WEBHOOK_SECRET | — | enables the `stripe` webhook route |
/// | PAYU_WEBHOOK_SECRET | — | enables the `payu` webhook route |
/// | CARRIER_WEBHOOK_TOKEN | — | static token the carrier sends on callbacks |
/// | GATEWAY_API_URL | https://api.gateway.test | payment gateway base URL |
/// | GATEWAY_KEY_ID | — | gateway key id (basic auth) |
/// | GATEWAY_KEY_SECRET | — | gateway key secret; also signs the client handshake |
/// | CARRIER_API_URL | https://api.carrier.test | shipping carrier base URL |
/// | CARRIER_API_TOKEN | — | carrier bearer token |
/// | ACCOUNTING_API_URL | https://api.books.test | accounting vendor base URL |
/// | ACCOUNTING_API_KEY | — | accounting API key |
/// | SWEEP_INTERVAL_SECS | 300 | catch-up sweep period (0 disables) |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    /// Enabled payment providers, keyed by route name
    pub payment_providers: Vec<PaymentProviderConfig>,
    /// Static token expected on carrier callbacks
    pub carrier_webhook_token: Option<String>,
    /// Payment gateway API
    pub gateway_api_url: String,
    pub gateway_key_id: String,
    /// Doubles as the client-handshake signing secret
    pub gateway_key_secret: String,
    /// Shipping carrier API
    pub carrier_api_url: String,
    pub carrier_api_token: String,
    /// Accounting vendor API
    pub accounting_api_url: String,
    pub accounting_api_key: String,
    /// Catch-up sweep period in seconds (0 disables the worker)
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/storefront/recon".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            payment_providers: payment_providers_from_env(),
            carrier_webhook_token: std::env::var("CARRIER_WEBHOOK_TOKEN").ok(),
            gateway_api_url: std::env::var("GATEWAY_API_URL")
                .unwrap_or_else(|_| "https://api.gateway.test".into()),
            gateway_key_id: std::env::var("GATEWAY_KEY_ID").unwrap_or_default(),
            gateway_key_secret: std::env::var("GATEWAY_KEY_SECRET").unwrap_or_default(),
            carrier_api_url: std::env::var("CARRIER_API_URL")
                .unwrap_or_else(|_| "https://api.carrier.test".into()),
            carrier_api_token: std::env::var("CARRIER_API_TOKEN").unwrap_or_default(),
            accounting_api_url: std::env::var("ACCOUNTING_API_URL")
                .unwrap_or_else(|_| "https://api.books.test".into()),
            accounting_api_key: std::env::var("ACCOUNTING_API_KEY").unwrap_or_default(),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Database path inside the working directory
    pub fn db_path(&self) -> String {
        format!("{}/orders.db", self.work_dir)
    }

    /// Look up an enabled payment provider by route name
    pub fn payment_provider(&self, name: &str) -> Option<&PaymentProviderConfig> {
        self.payment_providers.iter().find(|p| p.name == name)
    }
}

/// Build the enabled provider list from the per-provider secret variables
///
/// A provider is enabled iff its secret is configured. Scheme and header
/// are fixed per provider; only the secret is deployment-specific.
fn payment_providers_from_env() -> Vec<PaymentProviderConfig> {
    let known = [
        (
            "razorpay",
            "RAZORPAY_WEBHOOK_SECRET",
            SignatureScheme::HmacSha256,
            "x-razorpay-signature",
        ),
        (
            "stripe",
            "STRIPE_WEBHOOK_SECRET",
            SignatureScheme::HmacSha256,
            "stripe-signature",
        ),
        (
            "payu",
            "PAYU_WEBHOOK_SECRET",
            SignatureScheme::Sha512Appended,
            "x-payu-signature",
        ),
    ];

    known
        .into_iter()
        .filter_map(|(name, var, scheme, header)| {
            std::env::var(var).ok().map(|secret| PaymentProviderConfig {
                name: name.to_string(),
                scheme,
                signature_header: header.to_string(),
                webhook_secret: secret,
            })
        })
        .collect()
}
