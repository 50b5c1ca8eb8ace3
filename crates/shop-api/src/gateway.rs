//! # Offline Gateway
//!
//! Reference `payment.pay` listener. Real gateway integrations live
//! outside this core and subscribe to the same event; this one settles
//! `manual` payments (pay-on-pickup, bank transfer marked by staff) and
//! leaves every other method kind pending for an external module to
//! claim.

use async_trait::async_trait;
use shop_billing::{PaymentCapture, PaymentStatus};
use shop_core::{Hook, ShopResult};
use tracing::{debug, info};
use uuid::Uuid;

/// Settles `manual` payments in-process
pub struct OfflineGateway;

#[async_trait]
impl Hook<PaymentCapture> for OfflineGateway {
    async fn call(&self, payload: &mut PaymentCapture) -> ShopResult<()> {
        let kind = payload
            .payment
            .method
            .as_ref()
            .map(|m| m.kind.as_str())
            .unwrap_or_default();

        if kind != "manual" {
            debug!(kind, "offline gateway skipping method");
            return Ok(());
        }

        payload.payment.status = PaymentStatus::Complete;
        payload.payment.transaction = Some(format!("man_{}", Uuid::new_v4().simple()));

        info!(
            payment = %payload.payment.id,
            amount = %payload.payment.amount.display(),
            "manual payment settled"
        );
        Ok(())
    }
}
