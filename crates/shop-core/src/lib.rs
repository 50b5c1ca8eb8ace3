//! # shop-core
//!
//! Core types and engines for the vendo-rs checkout pipeline.
//!
//! This crate provides:
//! - `HookBus` for named extension points with sequential,
//!   payload-mutating listeners (`line.price`, `checkout.total`, ...)
//! - `Money` and `Currency` for exact smallest-unit amounts
//! - `Product` and `ProductCatalog` for the catalog collaborator
//! - `CartLine` and `PriceQuote` for cart/order lines
//! - `PricingEngine` and `TotalsEngine` for line pricing and order totals
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CartLine, CatalogPricer, HookBus, PricingEngine};
//!
//! let hooks = Arc::new(HookBus::new());
//! let pricing = PricingEngine::new(Arc::new(CatalogPricer), hooks.clone());
//!
//! let line = CartLine::new("wool-scarf", 2);
//! let priced = pricing.price_line(&line, &product, None, None).await?;
//! ```

pub mod error;
pub mod hook;
pub mod line;
pub mod money;
pub mod pricing;
pub mod product;
pub mod totals;

// Re-exports for convenience
pub use error::{ShopError, ShopResult};
pub use hook::{hook_fn, Hook, HookBus, HookEvent};
pub use line::{ActionMeta, CartLine, LineOpts, PriceQuote};
pub use money::{Currency, Money};
pub use pricing::{CatalogPricer, LinePrice, PricedLine, PricingEngine, ProductPricer};
pub use product::{Product, ProductCatalog};
pub use totals::{CheckoutTotal, TotalsEngine};
