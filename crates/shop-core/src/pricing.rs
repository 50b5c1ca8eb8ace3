//! # Pricing Engine
//!
//! Computes per-line unit prices and line amounts. The base quote comes
//! from a `ProductPricer` collaborator; the `line.price` hook then lets
//! third parties (bundle discounts, tiered pricing) adjust the amount
//! before it is frozen into `line.total`. The emitted amount, not the
//! raw engine output, is authoritative.

use crate::error::{ShopError, ShopResult};
use crate::hook::{HookBus, HookEvent};
use crate::line::{CartLine, LineOpts, PriceQuote};
use crate::money::Money;
use crate::product::Product;
use std::sync::Arc;

/// Quotes a unit price for a product with selected options.
///
/// Implementations must be deterministic: the same product and opts
/// always produce the same quote.
pub trait ProductPricer: Send + Sync {
    fn quote(&self, product: &Product, opts: &LineOpts) -> ShopResult<PriceQuote>;
}

/// Default pricer: base catalog price plus per-option surcharges.
///
/// A selected option `size=large` picks up the product surcharge keyed
/// `"size=large"`, recorded in the quote's modifiers.
#[derive(Debug, Clone, Default)]
pub struct CatalogPricer;

impl ProductPricer for CatalogPricer {
    fn quote(&self, product: &Product, opts: &LineOpts) -> ShopResult<PriceQuote> {
        let mut quote = PriceQuote::base(product.price);

        for (key, value) in opts {
            let opt_key = match value {
                serde_json::Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            };
            if let Some(delta) = product.surcharges.get(&opt_key) {
                quote.amount.amount += delta;
                quote
                    .modifiers
                    .insert(opt_key, serde_json::Value::from(*delta));
            }
        }

        if quote.amount.amount < 0 {
            return Err(ShopError::InvalidPrice {
                message: format!(
                    "negative unit price for {}: {}",
                    product.id, quote.amount.amount
                ),
            });
        }
        Ok(quote)
    }
}

/// Payload of the `line.price` hook, emitted once per line during
/// invoicing. Listeners may mutate `amount`; everything else is context.
#[derive(Debug, Clone)]
pub struct LinePrice {
    /// Resolved product snapshot
    pub product: Product,
    /// Order id, when pricing happens inside invoicing
    pub order: Option<String>,
    /// User the order belongs to
    pub user: Option<String>,
    /// Line quantity
    pub qty: u32,
    /// Selected options
    pub opts: LineOpts,
    /// Unit quote from the pricer
    pub price: PriceQuote,
    /// Line amount; hook-adjusted value is authoritative
    pub amount: Money,
}

impl HookEvent for LinePrice {
    const NAME: &'static str = "line.price";
}

/// A priced line: the frozen quote and amount after hook adjustment
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub price: PriceQuote,
    pub amount: Money,
}

/// The pricing engine: product-pricer collaborator plus hook bus
#[derive(Clone)]
pub struct PricingEngine {
    pricer: Arc<dyn ProductPricer>,
    hooks: Arc<HookBus>,
}

impl PricingEngine {
    pub fn new(pricer: Arc<dyn ProductPricer>, hooks: Arc<HookBus>) -> Self {
        Self { pricer, hooks }
    }

    /// Unit price for a product with selected options. Deterministic for
    /// a fixed pricer and hook registration set.
    pub fn quote(&self, product: &Product, opts: &LineOpts) -> ShopResult<PriceQuote> {
        self.pricer.quote(product, opts)
    }

    /// Raw line amount for a quote: `quote.amount * line.qty`
    pub fn line_amount(line: &CartLine, quote: &PriceQuote) -> ShopResult<Money> {
        quote.amount.times(line.qty)
    }

    /// Price one line for invoicing: quote the unit price, compute the
    /// line amount, then emit `line.price` so listeners can adjust the
    /// amount before it is frozen.
    pub async fn price_line(
        &self,
        line: &CartLine,
        product: &Product,
        order: Option<&str>,
        user: Option<&str>,
    ) -> ShopResult<PricedLine> {
        let quote = self.quote(product, &line.opts)?;
        let amount = Self::line_amount(line, &quote)?;

        let mut payload = LinePrice {
            product: product.clone(),
            order: order.map(String::from),
            user: user.map(String::from),
            qty: line.qty,
            opts: line.opts.clone(),
            price: quote,
            amount,
        };
        self.hooks.emit(&mut payload).await?;

        if payload.amount.amount < 0 {
            return Err(ShopError::InvalidPrice {
                message: format!(
                    "hook produced negative amount for {}: {}",
                    product.id, payload.amount.amount
                ),
            });
        }

        Ok(PricedLine {
            price: payload.price,
            amount: payload.amount,
        })
    }
}
