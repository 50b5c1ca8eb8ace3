//! # Cart Line Types
//!
//! A cart line references a product by id with a quantity and selected
//! options. `price` and `total` are computed server-side during invoicing
//! and must never be trusted from a client submission.

use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selected options for a line, keyed by option name.
/// BTreeMap keeps option order deterministic for pricing.
pub type LineOpts = BTreeMap<String, serde_json::Value>;

/// A priced quote for one unit of a product with selected options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Unit amount
    pub amount: Money,

    /// Modifiers applied on top of the base price (surcharges, tiers)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modifiers: BTreeMap<String, serde_json::Value>,
}

impl PriceQuote {
    /// A quote with no modifiers
    pub fn base(amount: Money) -> Self {
        Self {
            amount,
            modifiers: BTreeMap::new(),
        }
    }
}

/// A line in a cart or order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID
    pub product: String,

    /// Quantity (>= 1)
    #[serde(default = "default_qty")]
    pub qty: u32,

    /// Selected options
    #[serde(default)]
    pub opts: LineOpts,

    /// Unit price quote, populated during invoicing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceQuote>,

    /// Frozen line amount, populated during invoicing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
}

fn default_qty() -> u32 {
    1
}

impl CartLine {
    /// Create an unpriced line
    pub fn new(product: impl Into<String>, qty: u32) -> Self {
        Self {
            product: product.into(),
            qty: qty.max(1),
            opts: LineOpts::new(),
            price: None,
            total: None,
        }
    }

    /// Builder: select an option
    pub fn with_opt(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.opts.insert(key.into(), value);
        self
    }

    /// Drop any client-supplied price/total so they get re-derived
    pub fn strip_pricing(&mut self) {
        self.price = None;
        self.total = None;
    }
}

/// Priority-ordered descriptor of a checkout action, as carried in
/// hook payloads and completion submissions. The renderable action
/// itself lives client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMeta {
    /// Action identifier (e.g., "coupon", "shipping", "payment")
    pub id: String,

    /// Sort priority, ascending; ties keep registration order
    #[serde(default)]
    pub priority: i32,

    /// Value the step submits with the order (selected shipping rate,
    /// payment method descriptor, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ActionMeta {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            priority,
            value: None,
        }
    }

    /// Builder: attach a submitted value
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }
}
