//! # Billing Records
//!
//! Server-side order, invoice, and payment records. An invoice is an
//! immutable snapshot of priced order lines; a payment is a capture
//! attempt against an invoice. Raw card credentials never survive the
//! payment pipeline, see `PaymentMethod::redact`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_core::{CartLine, Currency, Money};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A customer order awaiting invoicing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: String,

    /// Owning user, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Order lines; priced during invoicing
    pub lines: Vec<CartLine>,

    /// Order currency; falls back to shop config when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order with a generated ID
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: None,
            lines,
            currency: None,
            created_at: Utc::now(),
        }
    }

    /// Builder: use a caller-assigned id (the completion endpoint reuses
    /// the checkout session id as the order id)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: set the owning user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Builder: set the order currency
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }
}

/// An immutable invoice: priced order lines and their total.
///
/// Mutable only between creation and the post-`invoice.init` save;
/// after that write nothing touches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique invoice ID
    pub id: String,

    /// Order this invoice snapshots
    pub order: String,

    /// Owning user, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Lines with `price`/`total` populated
    pub lines: Vec<CartLine>,

    /// Invoice total; equals the sum of line totals
    pub total: Money,

    /// Invoice number, assigned by an `invoice.init` listener when a
    /// numbering module is installed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Listener-added augmentation (tax breakdown, notes, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(
        order: impl Into<String>,
        user: Option<String>,
        lines: Vec<CartLine>,
        total: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order: order.into(),
            user,
            lines,
            total,
            number: None,
            extra: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }
}

/// Payment lifecycle state. `Failed` records an attempted capture whose
/// gateway hook declined or threw; the record persists for
/// reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Complete,
    Failed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Payment method descriptor: a gateway kind plus opaque method data.
/// `data.card` holds the raw credential between submission and capture
/// and MUST be gone before the final save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Gateway kind (e.g., "manual", "stripe")
    pub kind: String,

    /// Method data (gateway-specific)
    #[serde(default)]
    pub data: Value,
}

impl PaymentMethod {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Strip the raw card credential. Idempotent.
    pub fn redact(&mut self) {
        if let Some(obj) = self.data.as_object_mut() {
            obj.remove("card");
        }
    }

    /// True once no raw credential remains
    pub fn is_redacted(&self) -> bool {
        self.data.get("card").is_none()
    }
}

/// A capture attempt against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment ID
    pub id: String,

    /// Owning user, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Invoice being captured
    pub invoice: String,

    /// Order the invoice belongs to
    pub order: String,

    /// Amount to capture (the invoice total)
    pub amount: Money,

    /// Settlement currency
    pub currency: Currency,

    /// Exchange rate applied by the gateway (1.0 = none)
    pub rate: f64,

    /// Method descriptor; attached after the pending save, redacted
    /// before the final save
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,

    /// Lifecycle state
    #[serde(default)]
    pub status: PaymentStatus,

    /// Gateway transaction reference, set by the `payment.pay` listener
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Create a pending payment for an invoice
    pub fn pending(invoice: &Invoice, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: invoice.user.clone(),
            invoice: invoice.id.clone(),
            order: invoice.order.clone(),
            amount: invoice.total,
            currency,
            rate: 1.0,
            method: None,
            status: PaymentStatus::Pending,
            transaction: None,
            created_at: Utc::now(),
        }
    }

    /// True once the gateway reported a successful capture
    pub fn is_complete(&self) -> bool {
        self.status == PaymentStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_redaction() {
        let mut method = PaymentMethod::new(
            "stripe",
            json!({"card": {"number": "4242424242424242", "cvc": "123"}, "zip": "10001"}),
        );
        assert!(!method.is_redacted());

        method.redact();
        assert!(method.is_redacted());
        // Non-credential data survives.
        assert_eq!(method.data["zip"], "10001");

        // Idempotent.
        method.redact();
        assert!(method.is_redacted());
    }

    #[test]
    fn test_redact_non_object_data() {
        let mut method = PaymentMethod::new("manual", Value::Null);
        method.redact();
        assert!(method.is_redacted());
    }

    #[test]
    fn test_pending_payment_mirrors_invoice() {
        let invoice = Invoice::new(
            "ord_1",
            Some("u_1".into()),
            vec![],
            Money::new(42.0, Currency::USD),
        );
        let payment = Payment::pending(&invoice, Currency::USD);

        assert_eq!(payment.invoice, invoice.id);
        assert_eq!(payment.order, "ord_1");
        assert_eq!(payment.user, Some("u_1".into()));
        assert_eq!(payment.amount.amount, 4200);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.rate, 1.0);
        assert!(payment.method.is_none());
    }
}
