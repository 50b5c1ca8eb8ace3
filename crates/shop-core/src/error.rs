//! # Shop Error Types
//!
//! Typed error handling for the vendo-rs checkout pipeline.
//! All fallible operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for checkout, invoicing, and payment operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed submission body, rejected before pricing
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Price mismatch or invalid amount
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// Mixed currencies in an arithmetic operation
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// A hook listener failed while handling an event
    #[error("Hook '{event}' failed: {message}")]
    Hook { event: &'static str, message: String },

    /// Order not found in store
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Invoice not found in store
    #[error("Invoice not found: {invoice_id}")]
    InvoiceNotFound { invoice_id: String },

    /// An invoice already exists for this order
    #[error("Order already invoiced: {order_id}")]
    AlreadyInvoiced { order_id: String },

    /// Gateway hook reported a decline or threw during capture
    #[error("Payment failed: {reason}")]
    PaymentFailed { reason: String },

    /// Persistence layer failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Client-side transport error reaching the completion endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::Network(_) | ShopError::Storage(_))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::Validation(_) => 400,
            ShopError::ProductNotFound { .. } => 404,
            ShopError::InvalidPrice { .. } => 400,
            ShopError::CurrencyMismatch { .. } => 400,
            ShopError::Hook { .. } => 500,
            ShopError::OrderNotFound { .. } => 404,
            ShopError::InvoiceNotFound { .. } => 404,
            ShopError::AlreadyInvoiced { .. } => 409,
            ShopError::PaymentFailed { .. } => 402,
            ShopError::Storage(_) => 503,
            ShopError::Network(_) => 503,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ShopError::Network("timeout".into()).is_retryable());
        assert!(ShopError::Storage("lock poisoned".into()).is_retryable());
        assert!(!ShopError::Validation("bad body".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ShopError::Validation("test".into()).status_code(), 400);
        assert_eq!(
            ShopError::ProductNotFound {
                product_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            ShopError::AlreadyInvoiced {
                order_id: "ord_1".into()
            }
            .status_code(),
            409
        );
        assert_eq!(
            ShopError::PaymentFailed {
                reason: "declined".into()
            }
            .status_code(),
            402
        );
    }
}
