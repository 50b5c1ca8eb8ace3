//! # Billing Service
//!
//! The invoice generator and payment capturer. Invoicing recomputes
//! authoritative line prices via the pricing engine (the `line.price`
//! hook adjusts each amount before it is frozen), persists the priced
//! order, and creates the immutable invoice with an `invoice.init`
//! augmentation pass. Payment capture runs the `payment.pay` gateway
//! hook and then redacts the raw card credential unconditionally;
//! redaction runs on every path, not only on success.

use crate::config::ShopConfig;
use crate::record::{Invoice, Payment, PaymentMethod, PaymentStatus};
use crate::store::{InvoiceStore, OrderStore, PaymentStore, ProductStore};
use shop_core::{HookBus, HookEvent, Money, PricingEngine, ShopError, ShopResult};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Payload of the `invoice.init` hook, emitted after the invoice is
/// first persisted. Listeners (numbering, tax, notifications) may
/// augment the invoice; it is saved once more afterwards and then
/// never written again.
#[derive(Debug, Clone)]
pub struct InvoiceCreated {
    pub invoice: Invoice,
}

impl HookEvent for InvoiceCreated {
    const NAME: &'static str = "invoice.init";
}

/// Payload of the `payment.pay` hook, the gateway extension point.
/// The listener charges the method, sets `status` to `Complete` and
/// fills `transaction` on success, or returns an error on decline.
#[derive(Debug, Clone)]
pub struct PaymentCapture {
    pub payment: Payment,
}

impl HookEvent for PaymentCapture {
    const NAME: &'static str = "payment.pay";
}

/// Server-side billing: order -> invoice -> payment
#[derive(Clone)]
pub struct BillingService {
    hooks: Arc<HookBus>,
    pricing: PricingEngine,
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    invoices: Arc<dyn InvoiceStore>,
    payments: Arc<dyn PaymentStore>,
    config: ShopConfig,
}

impl BillingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hooks: Arc<HookBus>,
        pricing: PricingEngine,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        invoices: Arc<dyn InvoiceStore>,
        payments: Arc<dyn PaymentStore>,
        config: ShopConfig,
    ) -> Self {
        Self {
            hooks,
            pricing,
            products,
            orders,
            invoices,
            payments,
            config,
        }
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn invoices(&self) -> &Arc<dyn InvoiceStore> {
        &self.invoices
    }

    pub fn payments(&self) -> &Arc<dyn PaymentStore> {
        &self.payments
    }

    /// Create the invoice for an order.
    ///
    /// Reprices every line server-side (emitting `line.price`), freezes
    /// the amounts into the lines, persists the priced order, then
    /// persists the invoice, runs `invoice.init`, and persists it once
    /// more; that second save is the last write. Any failure aborts
    /// the whole creation; an `invoice.init` failure rolls the saved
    /// invoice back so no partial invoice survives.
    ///
    /// An order with an existing invoice is rejected with
    /// `AlreadyInvoiced`; re-invoicing is an explicit out-of-band step.
    /// Callers must not drive two invoicing flows for the same order
    /// concurrently.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn invoice(&self, order_id: &str) -> ShopResult<Invoice> {
        let mut order = self
            .orders
            .find(order_id)
            .await?
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        if self.invoices.find_by_order(order_id).await?.is_some() {
            return Err(ShopError::AlreadyInvoiced {
                order_id: order_id.to_string(),
            });
        }

        let user = order.user.clone();
        let currency = order.currency.unwrap_or(self.config.currency);
        let mut total = Money::zero(currency);

        for line in &mut order.lines {
            let product = self
                .products
                .find(&line.product)
                .await?
                .ok_or_else(|| ShopError::ProductNotFound {
                    product_id: line.product.clone(),
                })?;
            if !product.active {
                return Err(ShopError::Validation(format!(
                    "product is not available: {}",
                    product.id
                )));
            }

            let priced = self
                .pricing
                .price_line(line, &product, Some(order_id), user.as_deref())
                .await?;

            line.price = Some(priced.price);
            line.total = Some(priced.amount);
            total = total.add(priced.amount)?;
        }

        // Line pricing is durably recorded even before the invoice exists.
        self.orders.save(&order).await?;

        let invoice = Invoice::new(order_id, user, order.lines.clone(), total);
        self.invoices.save(&invoice).await?;

        let mut payload = InvoiceCreated { invoice };
        if let Err(e) = self.hooks.emit(&mut payload).await {
            // Roll back the first save so no partial invoice persists.
            if let Err(del) = self.invoices.delete(&payload.invoice.id).await {
                error!(invoice = %payload.invoice.id, error = %del, "rollback of partial invoice failed");
            }
            return Err(e);
        }

        // Last write: hook augmentation is captured, nothing mutates after.
        self.invoices.save(&payload.invoice).await?;

        info!(
            invoice = %payload.invoice.id,
            total = %payload.invoice.total.display(),
            lines = payload.invoice.lines.len(),
            "invoice created"
        );
        Ok(payload.invoice)
    }

    /// Capture payment against an invoice.
    ///
    /// Persists a pending record, attaches the method, runs the
    /// `payment.pay` gateway hook, redacts the raw card credential
    /// regardless of the hook outcome, persists the final state, and
    /// only then surfaces any hook failure to the caller. A failed
    /// capture therefore leaves a redacted `Failed` record behind for
    /// reconciliation.
    #[instrument(skip(self, method), fields(invoice_id = %invoice_id, method_kind = %method.kind))]
    pub async fn payment(&self, invoice_id: &str, method: PaymentMethod) -> ShopResult<Payment> {
        let invoice =
            self.invoices
                .find(invoice_id)
                .await?
                .ok_or_else(|| ShopError::InvoiceNotFound {
                    invoice_id: invoice_id.to_string(),
                })?;

        let currency = invoice.total.currency;
        let mut payment = Payment::pending(&invoice, currency);

        // Pending save happens before the method is attached, so raw
        // card data never reaches the store.
        self.payments.save(&payment).await?;
        payment.method = Some(method);

        let mut payload = PaymentCapture { payment };
        let hook_result = self.hooks.emit(&mut payload).await;
        let mut payment = payload.payment;

        // Redaction runs on every path, including hook failure.
        if let Some(method) = payment.method.as_mut() {
            method.redact();
        }

        if hook_result.is_err() {
            payment.status = PaymentStatus::Failed;
        } else if payment.is_complete() && payment.transaction.is_none() {
            warn!(
                payment = %payment.id,
                "payment marked complete without a transaction reference"
            );
        }

        self.payments.save(&payment).await?;

        match hook_result {
            Ok(()) => {
                info!(
                    payment = %payment.id,
                    status = ?payment.status,
                    amount = %payment.amount.display(),
                    "payment captured"
                );
                Ok(payment)
            }
            Err(e) => {
                warn!(payment = %payment.id, error = %e, "payment hook failed");
                Err(ShopError::PaymentFailed {
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Order;
    use crate::store::{CatalogStore, MemoryInvoices, MemoryOrders, MemoryPayments};
    use serde_json::json;
    use shop_core::{
        hook_fn, CartLine, CatalogPricer, Currency, LinePrice, Money, Product, ProductCatalog,
    };

    struct Harness {
        billing: BillingService,
        orders: Arc<MemoryOrders>,
        invoices: Arc<MemoryInvoices>,
        payments: Arc<MemoryPayments>,
    }

    fn harness(hooks: HookBus) -> Harness {
        let mut catalog = ProductCatalog::new();
        catalog.add(Product::new("tea", "Green Tea", Money::new(4.5, Currency::USD)));
        catalog.add(Product::new("mug", "Mug", Money::new(12.0, Currency::USD)));

        let hooks = Arc::new(hooks);
        let orders = Arc::new(MemoryOrders::new());
        let invoices = Arc::new(MemoryInvoices::new());
        let payments = Arc::new(MemoryPayments::new());

        let billing = BillingService::new(
            hooks.clone(),
            PricingEngine::new(Arc::new(CatalogPricer), hooks.clone()),
            Arc::new(CatalogStore::new(catalog)),
            orders.clone(),
            invoices.clone(),
            payments.clone(),
            ShopConfig::new("test-shop", Currency::USD),
        );

        Harness {
            billing,
            orders,
            invoices,
            payments,
        }
    }

    async fn seeded_order(h: &Harness, lines: Vec<CartLine>) -> String {
        let order = Order::new(lines).with_user("u_1");
        h.orders.save(&order).await.unwrap();
        order.id
    }

    #[tokio::test]
    async fn test_invoice_total_reconciles_with_line_totals() {
        let h = harness(HookBus::new());
        let order_id =
            seeded_order(&h, vec![CartLine::new("tea", 2), CartLine::new("mug", 1)]).await;

        let invoice = h.billing.invoice(&order_id).await.unwrap();

        let line_sum: i64 = invoice
            .lines
            .iter()
            .map(|l| l.total.expect("line priced").amount)
            .sum();
        assert_eq!(invoice.total.amount, line_sum);
        assert_eq!(invoice.total.amount, 900 + 1200);
    }

    #[tokio::test]
    async fn test_invoice_total_reconciles_after_hook_mutation() {
        // A bundle hook takes 100 cents off every line.
        let hooks = HookBus::new().with_hook(hook_fn(|p: &mut LinePrice| {
            p.amount.amount -= 100;
            Ok(())
        }));
        let h = harness(hooks);
        let order_id =
            seeded_order(&h, vec![CartLine::new("tea", 2), CartLine::new("mug", 1)]).await;

        let invoice = h.billing.invoice(&order_id).await.unwrap();

        let line_sum: i64 = invoice
            .lines
            .iter()
            .map(|l| l.total.unwrap().amount)
            .sum();
        assert_eq!(invoice.total.amount, line_sum);
        assert_eq!(invoice.total.amount, 800 + 1100);
    }

    #[tokio::test]
    async fn test_priced_lines_persisted_on_order() {
        let h = harness(HookBus::new());
        let order_id = seeded_order(&h, vec![CartLine::new("tea", 2)]).await;

        h.billing.invoice(&order_id).await.unwrap();

        let order = h.orders.find(&order_id).await.unwrap().unwrap();
        assert_eq!(order.lines[0].total.unwrap().amount, 900);
        assert!(order.lines[0].price.is_some());
    }

    #[tokio::test]
    async fn test_reinvoicing_rejected() {
        let h = harness(HookBus::new());
        let order_id = seeded_order(&h, vec![CartLine::new("tea", 1)]).await;

        h.billing.invoice(&order_id).await.unwrap();
        let err = h.billing.invoice(&order_id).await.unwrap_err();
        assert!(matches!(err, ShopError::AlreadyInvoiced { .. }));
    }

    #[tokio::test]
    async fn test_unknown_product_aborts_without_invoice() {
        let h = harness(HookBus::new());
        let order_id =
            seeded_order(&h, vec![CartLine::new("tea", 1), CartLine::new("ghost", 1)]).await;

        let err = h.billing.invoice(&order_id).await.unwrap_err();
        assert!(matches!(err, ShopError::ProductNotFound { .. }));
        assert!(h.invoices.find_by_order(&order_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invoice_init_failure_leaves_no_invoice() {
        let hooks = HookBus::new().with_hook(hook_fn(|_: &mut InvoiceCreated| {
            Err(ShopError::Internal("tax service down".into()))
        }));
        let h = harness(hooks);
        let order_id = seeded_order(&h, vec![CartLine::new("tea", 1)]).await;

        let err = h.billing.invoice(&order_id).await.unwrap_err();
        assert!(matches!(err, ShopError::Hook { event: "invoice.init", .. }));
        assert!(h.invoices.find_by_order(&order_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invoice_init_augmentation_is_persisted() {
        let hooks = HookBus::new().with_hook(hook_fn(|p: &mut InvoiceCreated| {
            p.invoice.number = Some("INV-0001".into());
            Ok(())
        }));
        let h = harness(hooks);
        let order_id = seeded_order(&h, vec![CartLine::new("tea", 1)]).await;

        let invoice = h.billing.invoice(&order_id).await.unwrap();
        assert_eq!(invoice.number.as_deref(), Some("INV-0001"));

        let stored = h.invoices.find(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.number.as_deref(), Some("INV-0001"));
    }

    fn card_method() -> PaymentMethod {
        PaymentMethod::new(
            "stripe",
            json!({"card": {"number": "4242424242424242"}, "zip": "10001"}),
        )
    }

    #[tokio::test]
    async fn test_payment_success_path_is_redacted() {
        let hooks = HookBus::new().with_hook(hook_fn(|p: &mut PaymentCapture| {
            p.payment.status = PaymentStatus::Complete;
            p.payment.transaction = Some("txn_123".into());
            Ok(())
        }));
        let h = harness(hooks);
        let order_id = seeded_order(&h, vec![CartLine::new("mug", 1)]).await;
        let invoice = h.billing.invoice(&order_id).await.unwrap();

        let payment = h.billing.payment(&invoice.id, card_method()).await.unwrap();

        assert!(payment.is_complete());
        assert_eq!(payment.amount, invoice.total);
        assert_eq!(payment.transaction.as_deref(), Some("txn_123"));

        let stored = h.payments.find(&payment.id).await.unwrap().unwrap();
        assert!(stored.method.unwrap().is_redacted());
    }

    #[tokio::test]
    async fn test_payment_hook_failure_persists_redacted_failed_record() {
        let hooks = HookBus::new().with_hook(hook_fn(|_: &mut PaymentCapture| {
            Err(ShopError::PaymentFailed {
                reason: "card declined".into(),
            })
        }));
        let h = harness(hooks);
        let order_id = seeded_order(&h, vec![CartLine::new("mug", 1)]).await;
        let invoice = h.billing.invoice(&order_id).await.unwrap();

        let err = h.billing.payment(&invoice.id, card_method()).await.unwrap_err();
        assert!(matches!(err, ShopError::PaymentFailed { .. }));

        // The attempted capture persists: redacted, marked failed.
        let stored = h
            .payments
            .all()
            .await
            .into_iter()
            .find(|p| p.invoice == invoice.id)
            .expect("payment record persisted");
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert!(stored.method.unwrap().is_redacted());
    }

    #[tokio::test]
    async fn test_payment_without_listeners_stays_pending() {
        let h = harness(HookBus::new());
        let order_id = seeded_order(&h, vec![CartLine::new("tea", 1)]).await;
        let invoice = h.billing.invoice(&order_id).await.unwrap();

        let payment = h
            .billing
            .payment(&invoice.id, PaymentMethod::new("manual", json!({})))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_payment_for_missing_invoice() {
        let h = harness(HookBus::new());
        let err = h
            .billing
            .payment("inv_ghost", card_method())
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::InvoiceNotFound { .. }));
    }
}
