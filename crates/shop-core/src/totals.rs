//! # Totals Engine
//!
//! Aggregates line amounts into an order total over a flat product
//! snapshot, with an opt-in `checkout.total` discount pass. A line whose
//! product is missing from the snapshot contributes 0: the snapshot is
//! whatever the cart currently knows about, not an authoritative lookup.

use crate::error::{ShopError, ShopResult};
use crate::hook::{HookBus, HookEvent};
use crate::line::{ActionMeta, CartLine};
use crate::money::{Currency, Money};
use crate::pricing::ProductPricer;
use crate::product::Product;
use std::sync::Arc;

/// Payload of the `checkout.total` hook. Listeners may adjust `total`
/// and record `discount`; `lines` and `products` are read-only context
/// (mutating them has no effect on the caller).
#[derive(Debug, Clone)]
pub struct CheckoutTotal {
    /// Running total; the hook-adjusted value is returned to the caller
    pub total: Money,
    /// Discount applied, in smallest currency unit (informational)
    pub discount: i64,
    /// Lines the total was computed from
    pub lines: Vec<CartLine>,
    /// Registered checkout actions
    pub actions: Vec<ActionMeta>,
    /// Product snapshot the lines were matched against
    pub products: Vec<Product>,
}

impl HookEvent for CheckoutTotal {
    const NAME: &'static str = "checkout.total";
}

/// The totals engine: product-pricer collaborator, hook bus, and the
/// shop's display currency for empty carts.
#[derive(Clone)]
pub struct TotalsEngine {
    pricer: Arc<dyn ProductPricer>,
    hooks: Arc<HookBus>,
    currency: Currency,
}

impl TotalsEngine {
    pub fn new(pricer: Arc<dyn ProductPricer>, hooks: Arc<HookBus>, currency: Currency) -> Self {
        Self {
            pricer,
            hooks,
            currency,
        }
    }

    /// Sum `quote(product, opts).amount * qty` over lines matched against
    /// the snapshot by `product.id == line.product`. With `with_discount`,
    /// emit `checkout.total` and return the hook-adjusted total.
    pub async fn total(
        &self,
        lines: &[CartLine],
        products: &[Product],
        actions: &[ActionMeta],
        with_discount: bool,
    ) -> ShopResult<Money> {
        let mut total = Money::zero(self.currency);

        for line in lines {
            let Some(product) = products.iter().find(|p| p.id == line.product) else {
                continue;
            };
            let quote = self.pricer.quote(product, &line.opts)?;
            total = total.add(quote.amount.times(line.qty)?)?;
        }

        if !with_discount {
            return Ok(total);
        }

        let mut payload = CheckoutTotal {
            total,
            discount: 0,
            lines: lines.to_vec(),
            actions: actions.to_vec(),
            products: products.to_vec(),
        };
        self.hooks.emit(&mut payload).await?;

        if payload.total.amount < 0 {
            return Err(ShopError::InvalidPrice {
                message: format!("discounted total is negative: {}", payload.total.amount),
            });
        }
        Ok(payload.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::hook_fn;
    use crate::pricing::CatalogPricer;

    fn engine(bus: HookBus) -> TotalsEngine {
        TotalsEngine::new(Arc::new(CatalogPricer), Arc::new(bus), Currency::USD)
    }

    fn snapshot() -> Vec<Product> {
        vec![
            Product::new("a", "Product A", Money::new(10.0, Currency::USD)),
            Product::new("b", "Product B", Money::new(3.5, Currency::USD)),
        ]
    }

    #[tokio::test]
    async fn test_base_total() {
        let totals = engine(HookBus::new());
        let lines = vec![CartLine::new("a", 2)];

        let total = totals.total(&lines, &snapshot(), &[], false).await.unwrap();
        assert_eq!(total, Money::new(20.0, Currency::USD));
    }

    #[tokio::test]
    async fn test_missing_product_contributes_zero() {
        let totals = engine(HookBus::new());
        let lines = vec![CartLine::new("a", 2), CartLine::new("ghost", 5)];

        let total = totals.total(&lines, &snapshot(), &[], false).await.unwrap();
        assert_eq!(total.amount, 2000);
    }

    #[tokio::test]
    async fn test_discount_hook_adjusts_total() {
        let bus = HookBus::new().with_hook(hook_fn(|p: &mut CheckoutTotal| {
            p.discount = 500;
            p.total = Money::new(15.0, p.total.currency);
            Ok(())
        }));
        let totals = engine(bus);
        let lines = vec![CartLine::new("a", 2)];

        // Without the discount pass the hook never fires.
        let plain = totals.total(&lines, &snapshot(), &[], false).await.unwrap();
        assert_eq!(plain.amount, 2000);

        let discounted = totals.total(&lines, &snapshot(), &[], true).await.unwrap();
        assert_eq!(discounted, Money::new(15.0, Currency::USD));
    }

    #[tokio::test]
    async fn test_hook_sees_lines_and_actions() {
        let bus = HookBus::new().with_hook(hook_fn(|p: &mut CheckoutTotal| {
            assert_eq!(p.lines.len(), 1);
            assert_eq!(p.actions.len(), 1);
            assert_eq!(p.actions[0].id, "coupon");
            assert_eq!(p.discount, 0);
            Ok(())
        }));
        let totals = engine(bus);
        let lines = vec![CartLine::new("b", 1)];
        let actions = vec![ActionMeta::new("coupon", 10)];

        totals
            .total(&lines, &snapshot(), &actions, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_cart_totals_zero() {
        let totals = engine(HookBus::new());
        let total = totals.total(&[], &snapshot(), &[], false).await.unwrap();
        assert_eq!(total.amount, 0);
        assert_eq!(total.currency, Currency::USD);
    }

    #[tokio::test]
    async fn test_negative_discounted_total_rejected() {
        let bus = HookBus::new().with_hook(hook_fn(|p: &mut CheckoutTotal| {
            p.total.amount = -100;
            Ok(())
        }));
        let totals = engine(bus);
        let lines = vec![CartLine::new("a", 1)];

        let err = totals
            .total(&lines, &snapshot(), &[], true)
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::InvalidPrice { .. }));
    }
}
