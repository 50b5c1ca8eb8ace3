//! # Extension Hook Bus
//!
//! Named extension points that independent modules subscribe to.
//! Listeners for an event run sequentially in registration order, each
//! may mutate the shared payload in place, and the bus awaits every
//! listener to completion before invoking the next. The first failure
//! propagates to the emitter; payload mutation is the only output
//! channel.
//!
//! Events are typed: each event name carries exactly one payload struct,
//! so listeners cannot disagree about the payload shape.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut bus = HookBus::new();
//! bus.register(hook_fn(|payload: &mut CheckoutTotal| {
//!     payload.discount = 500;
//!     payload.total.amount -= 500;
//!     Ok(())
//! }));
//! bus.emit(&mut payload).await?;
//! ```

use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A named hook event. `NAME` is part of the external contract other
/// modules rely on (e.g., `line.price`, `invoice.init`, `payment.pay`,
/// `checkout.total`).
pub trait HookEvent: Send + Sync + 'static {
    const NAME: &'static str;
}

/// A listener for one event type. Listeners may perform I/O; they are
/// awaited one at a time, so a slow listener delays but never corrupts
/// the listeners behind it.
#[async_trait]
pub trait Hook<E: HookEvent>: Send + Sync {
    async fn call(&self, payload: &mut E) -> ShopResult<()>;
}

/// Adapts a plain closure into a `Hook` listener
struct FnHook<E, F> {
    f: F,
    _event: PhantomData<fn(&mut E)>,
}

#[async_trait]
impl<E, F> Hook<E> for FnHook<E, F>
where
    E: HookEvent,
    F: Fn(&mut E) -> ShopResult<()> + Send + Sync,
{
    async fn call(&self, payload: &mut E) -> ShopResult<()> {
        (self.f)(payload)
    }
}

/// Wrap a synchronous closure as a hook listener
pub fn hook_fn<E, F>(f: F) -> Arc<dyn Hook<E>>
where
    E: HookEvent,
    F: Fn(&mut E) -> ShopResult<()> + Send + Sync + 'static,
{
    Arc::new(FnHook {
        f,
        _event: PhantomData,
    })
}

type ListenerSlot = Box<dyn Any + Send + Sync>;

/// Registry of hook listeners, keyed by event type.
///
/// Registration happens during wiring (`&mut self`); emitting is `&self`,
/// so components share the bus behind an `Arc` once the app is built.
#[derive(Default)]
pub struct HookBus {
    listeners: HashMap<TypeId, ListenerSlot>,
}

impl HookBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for event `E`, appended after any existing
    /// listeners for the same event.
    pub fn register<E: HookEvent>(&mut self, hook: Arc<dyn Hook<E>>) {
        let slot = self
            .listeners
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<Arc<dyn Hook<E>>>::new()));
        slot.downcast_mut::<Vec<Arc<dyn Hook<E>>>>()
            .expect("listener slot holds the vec for its event type")
            .push(hook);
    }

    /// Register with builder pattern
    pub fn with_hook<E: HookEvent>(mut self, hook: Arc<dyn Hook<E>>) -> Self {
        self.register(hook);
        self
    }

    /// Number of listeners registered for event `E`
    pub fn listener_count<E: HookEvent>(&self) -> usize {
        self.listeners
            .get(&TypeId::of::<E>())
            .and_then(|slot| slot.downcast_ref::<Vec<Arc<dyn Hook<E>>>>())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Emit event `E`, running every listener sequentially in registration
    /// order against the shared payload. The first listener failure aborts
    /// the emit and propagates as `ShopError::Hook`.
    pub async fn emit<E: HookEvent>(&self, payload: &mut E) -> ShopResult<()> {
        let Some(slot) = self.listeners.get(&TypeId::of::<E>()) else {
            return Ok(());
        };
        let hooks = slot
            .downcast_ref::<Vec<Arc<dyn Hook<E>>>>()
            .expect("listener slot holds the vec for its event type");

        tracing::debug!(event = E::NAME, listeners = hooks.len(), "emitting hook");

        for hook in hooks {
            hook.call(payload).await.map_err(|e| ShopError::Hook {
                event: E::NAME,
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        calls: Vec<&'static str>,
    }

    impl HookEvent for Counter {
        const NAME: &'static str = "test.counter";
    }

    #[tokio::test]
    async fn test_listeners_run_in_registration_order() {
        let bus = HookBus::new()
            .with_hook(hook_fn(|p: &mut Counter| {
                p.calls.push("first");
                Ok(())
            }))
            .with_hook(hook_fn(|p: &mut Counter| {
                p.calls.push("second");
                Ok(())
            }))
            .with_hook(hook_fn(|p: &mut Counter| {
                p.calls.push("third");
                Ok(())
            }));

        let mut payload = Counter { calls: Vec::new() };
        bus.emit(&mut payload).await.unwrap();
        assert_eq!(payload.calls, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_emit() {
        static AFTER: AtomicUsize = AtomicUsize::new(0);

        let bus = HookBus::new()
            .with_hook(hook_fn(|_: &mut Counter| {
                Err(ShopError::Internal("boom".into()))
            }))
            .with_hook(hook_fn(|_: &mut Counter| {
                AFTER.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));

        let mut payload = Counter { calls: Vec::new() };
        let err = bus.emit(&mut payload).await.unwrap_err();

        assert!(matches!(
            err,
            ShopError::Hook {
                event: "test.counter",
                ..
            }
        ));
        assert_eq!(AFTER.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_emit_without_listeners_is_noop() {
        let bus = HookBus::new();
        let mut payload = Counter { calls: Vec::new() };
        bus.emit(&mut payload).await.unwrap();
        assert!(payload.calls.is_empty());
    }

    #[test]
    fn test_listener_count() {
        let mut bus = HookBus::new();
        assert_eq!(bus.listener_count::<Counter>(), 0);
        bus.register(hook_fn(|_: &mut Counter| Ok(())));
        bus.register(hook_fn(|_: &mut Counter| Ok(())));
        assert_eq!(bus.listener_count::<Counter>(), 2);
    }
}
