//! # Application State
//!
//! Shared state for the Axum application: the wired hook bus, the
//! billing service, the product catalog, and server configuration.

use crate::gateway::OfflineGateway;
use shop_billing::{
    BillingService, CatalogStore, MemoryInvoices, MemoryOrders, MemoryPayments, OrderStore,
    ShopConfig,
};
use shop_core::{CatalogPricer, HookBus, PricingEngine, ProductCatalog};
use std::sync::Arc;

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Billing pipeline (invoice + payment)
    pub billing: BillingService,
    /// Order store, shared with the billing service
    pub orders: Arc<dyn OrderStore>,
    /// Product catalog
    pub catalog: ProductCatalog,
    /// Server config
    pub config: AppConfig,
}

impl AppState {
    /// Create state from the environment: catalog from
    /// `config/products.toml`, shop config from env vars, and the
    /// offline gateway subscribed to `payment.pay`.
    pub fn new() -> anyhow::Result<Self> {
        let catalog = load_product_catalog()?;
        Ok(Self::with_catalog(catalog, ShopConfig::from_env()))
    }

    /// Wire up state around an explicit catalog (also used by tests)
    pub fn with_catalog(catalog: ProductCatalog, shop: ShopConfig) -> Self {
        let hooks = Arc::new(HookBus::new().with_hook(Arc::new(OfflineGateway)));

        let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrders::new());
        let billing = BillingService::new(
            hooks.clone(),
            PricingEngine::new(Arc::new(CatalogPricer), hooks),
            Arc::new(CatalogStore::new(catalog.clone())),
            orders.clone(),
            Arc::new(MemoryInvoices::new()),
            Arc::new(MemoryPayments::new()),
            shop,
        );

        Self {
            billing,
            orders,
            catalog,
            config: AppConfig::from_env(),
        }
    }
}

/// Load product catalog from config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }
}
