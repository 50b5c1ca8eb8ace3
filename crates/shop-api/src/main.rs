//! # Vendo
//!
//! Checkout, invoicing, and payment pipeline server.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export SHOP_NAME="My Shop"
//! export SHOP_CURRENCY=USD
//! export PORT=8080
//!
//! # Run the server
//! vendo
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Shop: {}", state.billing.config().name);
    info!("Currency: {}", state.billing.config().currency);
    info!("Products loaded: {}", state.catalog.products.len());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🛒 Vendo starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("📦 Products: GET http://{}/api/v1/products", addr);
        info!(
            "✅ Complete: POST http://{}/checkout/{{id}}/complete",
            addr
        );
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Vendo RS 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━
  Checkout-to-payment pipeline
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
