//! # Shop Configuration
//!
//! Shop-level settings loaded from environment variables.

use shop_core::Currency;

/// Shop configuration
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Shop display name
    pub name: String,

    /// Default settlement currency for invoices and payments
    pub currency: Currency,
}

impl ShopConfig {
    /// Load from environment variables.
    ///
    /// - `SHOP_NAME` (default "vendo")
    /// - `SHOP_CURRENCY` (ISO 4217 code, fallback USD)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let currency = std::env::var("SHOP_CURRENCY")
            .ok()
            .and_then(|code| Currency::parse(&code).ok())
            .unwrap_or(Currency::USD);

        Self {
            name: std::env::var("SHOP_NAME").unwrap_or_else(|_| "vendo".to_string()),
            currency,
        }
    }

    /// Config with explicit values (for testing)
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            name: name.into(),
            currency,
        }
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
