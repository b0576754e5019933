use std::time::Duration;

use dd_common::Secret;
use log::*;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const PAYPAL_SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";
pub const PAYPAL_LIVE_URL: &str = "https://api-m.paypal.com";

fn secret_from_env(var: &str) -> Secret<String> {
    Secret::new(std::env::var(var).unwrap_or_else(|_| {
        warn!("🪛️ {var} is not set. The matching provider will be unavailable.");
        String::default()
    }))
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub api_version: String,
    pub base_url: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: Secret::default(),
            api_version: "2023-10-16".to_string(),
            base_url: "https://api.stripe.com/v1".to_string(),
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret_key = secret_from_env("DD_STRIPE_SECRET_KEY");
        Self { secret_key, ..Default::default() }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: Secret<String>,
    pub client_secret: Secret<String>,
    pub base_url: String,
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self { client_id: Secret::default(), client_secret: Secret::default(), base_url: PAYPAL_SANDBOX_URL.into() }
    }
}

impl PayPalConfig {
    /// Live credentials are only used in production. Every other mode talks to the sandbox.
    pub fn new_from_env_or_default(production: bool) -> Self {
        let client_id = secret_from_env("DD_PAYPAL_CLIENT_ID");
        let client_secret = secret_from_env("DD_PAYPAL_CLIENT_SECRET");
        let base_url = if production { PAYPAL_LIVE_URL } else { PAYPAL_SANDBOX_URL }.to_string();
        Self { client_id, client_secret, base_url }
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CoinbaseConfig {
    pub api_key: Secret<String>,
    pub api_version: String,
    pub base_url: String,
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::default(),
            api_version: "2018-03-22".to_string(),
            base_url: "https://api.commerce.coinbase.com".to_string(),
        }
    }
}

impl CoinbaseConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_key = secret_from_env("DD_COINBASE_API_KEY");
        Self { api_key, ..Default::default() }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ShippoConfig {
    pub api_token: Secret<String>,
    pub base_url: String,
}

impl Default for ShippoConfig {
    fn default() -> Self {
        Self { api_token: Secret::default(), base_url: "https://api.goshippo.com".to_string() }
    }
}

impl ShippoConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_token = secret_from_env("DD_SHIPPO_API_TOKEN");
        Self { api_token, ..Default::default() }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_token.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MailerLiteConfig {
    pub api_token: Secret<String>,
    pub base_url: String,
}

impl Default for MailerLiteConfig {
    fn default() -> Self {
        Self { api_token: Secret::default(), base_url: "https://connect.mailerlite.com/api".to_string() }
    }
}

impl MailerLiteConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_token = secret_from_env("DD_MAILERLITE_API_TOKEN");
        Self { api_token, ..Default::default() }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_token.is_empty()
    }
}
