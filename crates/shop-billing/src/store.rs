//! # Persistence Interfaces
//!
//! `save`/`find` seams for the billing records. Real persistence lives
//! outside this core; the in-memory implementations here back the
//! server binary and the test suite.

use crate::record::{Invoice, Order, Payment};
use async_trait::async_trait;
use shop_core::{Product, ProductCatalog, ShopResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Product lookup by id
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find(&self, id: &str) -> ShopResult<Option<Product>>;
}

/// Order persistence
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find(&self, id: &str) -> ShopResult<Option<Order>>;
    async fn save(&self, order: &Order) -> ShopResult<()>;
}

/// Invoice persistence. `delete` exists solely so a failed
/// `invoice.init` pass can roll back its own save.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn find(&self, id: &str) -> ShopResult<Option<Invoice>>;
    async fn find_by_order(&self, order_id: &str) -> ShopResult<Option<Invoice>>;
    async fn save(&self, invoice: &Invoice) -> ShopResult<()>;
    async fn delete(&self, id: &str) -> ShopResult<()>;
}

/// Payment persistence
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find(&self, id: &str) -> ShopResult<Option<Payment>>;
    async fn save(&self, payment: &Payment) -> ShopResult<()>;
}

/// Product store backed by the static catalog
pub struct CatalogStore {
    catalog: ProductCatalog,
}

impl CatalogStore {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ProductStore for CatalogStore {
    async fn find(&self, id: &str) -> ShopResult<Option<Product>> {
        Ok(self.catalog.get(id).cloned())
    }
}

/// In-memory order store
#[derive(Default)]
pub struct MemoryOrders {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrders {
    async fn find(&self, id: &str) -> ShopResult<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn save(&self, order: &Order) -> ShopResult<()> {
        self.orders
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        Ok(())
    }
}

/// In-memory invoice store
#[derive(Default)]
pub struct MemoryInvoices {
    invoices: RwLock<HashMap<String, Invoice>>,
}

impl MemoryInvoices {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoices {
    async fn find(&self, id: &str) -> ShopResult<Option<Invoice>> {
        Ok(self.invoices.read().await.get(id).cloned())
    }

    async fn find_by_order(&self, order_id: &str) -> ShopResult<Option<Invoice>> {
        Ok(self
            .invoices
            .read()
            .await
            .values()
            .find(|i| i.order == order_id)
            .cloned())
    }

    async fn save(&self, invoice: &Invoice) -> ShopResult<()> {
        self.invoices
            .write()
            .await
            .insert(invoice.id.clone(), invoice.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> ShopResult<()> {
        self.invoices.write().await.remove(id);
        Ok(())
    }
}

/// In-memory payment store
#[derive(Default)]
pub struct MemoryPayments {
    payments: RwLock<HashMap<String, Payment>>,
}

impl MemoryPayments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored payment
    pub async fn all(&self) -> Vec<Payment> {
        self.payments.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl PaymentStore for MemoryPayments {
    async fn find(&self, id: &str) -> ShopResult<Option<Payment>> {
        Ok(self.payments.read().await.get(id).cloned())
    }

    async fn save(&self, payment: &Payment) -> ShopResult<()> {
        self.payments
            .write()
            .await
            .insert(payment.id.clone(), payment.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{CartLine, Currency, Money};

    #[tokio::test]
    async fn test_catalog_store_lookup() {
        let mut catalog = ProductCatalog::new();
        catalog.add(Product::new("tea", "Green Tea", Money::new(4.5, Currency::USD)));
        let store = CatalogStore::new(catalog);

        assert!(store.find("tea").await.unwrap().is_some());
        assert!(store.find("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_order_save_and_find() {
        let store = MemoryOrders::new();
        let order = Order::new(vec![CartLine::new("tea", 1)]);

        store.save(&order).await.unwrap();
        let found = store.find(&order.id).await.unwrap().unwrap();
        assert_eq!(found.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_invoice_find_by_order_and_delete() {
        let store = MemoryInvoices::new();
        let invoice = Invoice::new("ord_1", None, vec![], Money::new(1.0, Currency::USD));

        store.save(&invoice).await.unwrap();
        assert!(store.find_by_order("ord_1").await.unwrap().is_some());
        assert!(store.find_by_order("ord_2").await.unwrap().is_none());

        store.delete(&invoice.id).await.unwrap();
        assert!(store.find_by_order("ord_1").await.unwrap().is_none());
    }
}
