//! # shop-billing
//!
//! Server-side billing for vendo-rs: the invoice generator and the
//! payment capturer, plus the persistence seams they talk through.
//!
//! This crate provides:
//! - `BillingService` with `invoice(order)` and `payment(invoice, method)`
//! - `Order`, `Invoice`, `Payment`, `PaymentMethod` records
//! - `OrderStore` / `InvoiceStore` / `PaymentStore` / `ProductStore`
//!   persistence traits with in-memory implementations
//! - `ShopConfig` for shop-level settings (default currency)
//! - `InvoiceCreated` (`invoice.init`) and `PaymentCapture`
//!   (`payment.pay`) hook events
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_billing::{BillingService, PaymentMethod};
//!
//! let invoice = billing.invoice(&order_id).await?;
//! let payment = billing
//!     .payment(&invoice.id, PaymentMethod::new("manual", data))
//!     .await?;
//! assert!(payment.method.unwrap().is_redacted());
//! ```

pub mod billing;
pub mod config;
pub mod record;
pub mod store;

// Re-exports for convenience
pub use billing::{BillingService, InvoiceCreated, PaymentCapture};
pub use config::ShopConfig;
pub use record::{Invoice, Order, Payment, PaymentMethod, PaymentStatus};
pub use store::{
    CatalogStore, InvoiceStore, MemoryInvoices, MemoryOrders, MemoryPayments, OrderStore,
    PaymentStore, ProductStore,
};
