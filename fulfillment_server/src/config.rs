use std::{env, time::Duration};

use dd_common::{parse_boolean_flag, parse_env_duration_secs, Secret};
use fulfillment_engine::{ShippingLabelConfig, DEFAULT_CARRIER, DEFAULT_SERVICE_LEVEL};
use log::*;
use provider_tools::{
    CoinbaseConfig,
    MailerLiteConfig,
    PayPalConfig,
    ShippoConfig,
    StripeConfig,
    DEFAULT_HTTP_TIMEOUT,
};

const DEFAULT_DEV_HOST: &str = "127.0.0.1";
const DEFAULT_PROD_HOST: &str = "0.0.0.0";
const DEFAULT_DEV_PORT: u16 = 3000;
const DEFAULT_PROD_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/dd_store.db";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    Production,
    #[default]
    Development,
}

impl RunMode {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "production" || s == "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Shared secrets for the signed payment-provider webhooks.
#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    pub stripe_secret: Secret<String>,
    pub coinbase_secret: Secret<String>,
    /// Replace signature checks with a verifier that accepts everything. Ignored in production.
    pub accept_unsigned: bool,
    /// How old a Stripe signature timestamp may be before it is rejected
    pub stripe_tolerance: Duration,
}

impl WebhookConfig {
    pub fn from_env_or_default(mode: RunMode) -> Self {
        let stripe_secret = Secret::new(env::var("DD_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ DD_STRIPE_WEBHOOK_SECRET is not set. Stripe webhooks will be refused.");
            String::default()
        }));
        let coinbase_secret = Secret::new(env::var("DD_COINBASE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ DD_COINBASE_WEBHOOK_SECRET is not set. Coinbase webhooks will be refused.");
            String::default()
        }));
        let requested = parse_boolean_flag(env::var("DD_ACCEPT_UNSIGNED_WEBHOOKS").ok(), false);
        let accept_unsigned = match (requested, mode) {
            (true, RunMode::Production) => {
                error!("🪛️ DD_ACCEPT_UNSIGNED_WEBHOOKS is ignored in production. Signatures WILL be checked.");
                false
            },
            (true, RunMode::Development) => {
                warn!("🚨️ Webhook signature checks are DISABLED. Never run like this with real credentials.");
                true
            },
            (false, _) => false,
        };
        Self { stripe_secret, coinbase_secret, accept_unsigned, stripe_tolerance: Duration::from_secs(300) }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub mode: RunMode,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The storefront's public URL, used to build checkout success and cancel links
    pub public_base_url: String,
    /// Timeout for every outbound provider call
    pub http_timeout: Duration,
    pub webhooks: WebhookConfig,
    pub stripe: StripeConfig,
    pub paypal: PayPalConfig,
    pub coinbase: CoinbaseConfig,
    pub shippo: ShippoConfig,
    pub mailerlite: MailerLiteConfig,
    pub shipping: ShippingLabelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            host: DEFAULT_DEV_HOST.to_string(),
            port: DEFAULT_DEV_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            webhooks: WebhookConfig::default(),
            stripe: StripeConfig::default(),
            paypal: PayPalConfig::default(),
            coinbase: CoinbaseConfig::default(),
            shippo: ShippoConfig::default(),
            mailerlite: MailerLiteConfig::default(),
            shipping: ShippingLabelConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let mode = RunMode::from_env_value(env::var("DD_ENV").ok().as_deref());
        info!("🪛️ Running in {mode:?} mode");
        let (default_host, default_port) = default_bind_address(mode);
        let host = env::var("DD_HOST").ok().unwrap_or_else(|| default_host.into());
        let port = env::var("DD_PORT").map(|s| parse_port(&s, default_port)).unwrap_or(default_port);
        let database_url = env::var("DD_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ DD_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let public_base_url = env::var("DD_PUBLIC_BASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ DD_PUBLIC_BASE_URL is not set. Checkout redirects will point at {DEFAULT_PUBLIC_BASE_URL}");
            DEFAULT_PUBLIC_BASE_URL.to_string()
        });
        let public_base_url = public_base_url.trim_end_matches('/').to_string();
        let http_timeout = parse_env_duration_secs(env::var("DD_HTTP_TIMEOUT_SECS").ok()).unwrap_or_else(|| {
            debug!("🪛️ Using the default provider timeout of {}s", DEFAULT_HTTP_TIMEOUT.as_secs());
            DEFAULT_HTTP_TIMEOUT
        });
        let webhooks = WebhookConfig::from_env_or_default(mode);
        let shipping = shipping_from_env(http_timeout);
        Self {
            mode,
            host,
            port,
            database_url,
            public_base_url,
            http_timeout,
            webhooks,
            stripe: StripeConfig::new_from_env_or_default(),
            paypal: PayPalConfig::new_from_env_or_default(mode.is_production()),
            coinbase: CoinbaseConfig::new_from_env_or_default(),
            shippo: ShippoConfig::new_from_env_or_default(),
            mailerlite: MailerLiteConfig::new_from_env_or_default(),
            shipping,
        }
    }
}

pub fn default_bind_address(mode: RunMode) -> (&'static str, u16) {
    match mode {
        RunMode::Production => (DEFAULT_PROD_HOST, DEFAULT_PROD_PORT),
        RunMode::Development => (DEFAULT_DEV_HOST, DEFAULT_DEV_PORT),
    }
}

fn parse_port(s: &str, default: u16) -> u16 {
    s.trim().parse::<u16>().unwrap_or_else(|e| {
        error!("🪛️ {s} is not a valid port for DD_PORT. {e} Using the default, {default}, instead.");
        default
    })
}

fn shipping_from_env(call_timeout: Duration) -> ShippingLabelConfig {
    let carrier = env::var("DD_SHIPPING_CARRIER").ok().filter(|s| !s.trim().is_empty());
    let service_level = env::var("DD_SHIPPING_SERVICE").ok().filter(|s| !s.trim().is_empty());
    let create_packing_slips = parse_boolean_flag(env::var("DD_CREATE_PACKING_SLIPS").ok(), true);
    let config = ShippingLabelConfig {
        carrier: carrier.unwrap_or_else(|| DEFAULT_CARRIER.to_string()),
        service_level: service_level.unwrap_or_else(|| DEFAULT_SERVICE_LEVEL.to_string()),
        create_packing_slips,
        call_timeout,
        ..Default::default()
    };
    info!(
        "🪛️ Shipping labels: {} / {}. Packing slips {}",
        config.carrier,
        config.service_level,
        if create_packing_slips { "on" } else { "off" }
    );
    config
}
