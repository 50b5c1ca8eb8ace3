//! # Checkout Session
//!
//! The client-held reactive store for a checkout flow. It mirrors the
//! cart's current state, keeps the pluggable checkout actions and their
//! side-channel extras, and drives the submission state machine:
//!
//! ```text
//! Idle ──submit()──> Loading ──error/opaque──> Idle
//!                        │
//!                        └──redirect / created──> Redirected (terminal)
//! ```
//!
//! One session exists per client; all mutation happens on the same
//! logical task. Callers must gate re-submission on `loading()`; the
//! session does not self-guard beyond the flag.

use crate::action::Action;
use crate::transport::{CheckoutTransport, CompleteRequest, CompleteResponse};
use serde_json::{Map, Value};
use shop_core::{ActionMeta, CartLine, Money, Product, ShopResult, TotalsEngine};
use std::sync::Arc;
use tracing::debug;

/// Submission state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Ready for input
    Idle,
    /// Completion request in flight
    Loading,
    /// Terminal: client navigated away to this path
    Redirected(String),
}

/// Observer called on every `update` notification
pub type Observer = Box<dyn Fn() + Send + Sync>;

/// Outcome of a `submit()` call
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Structured error surfaced to the user; session is Idle again
    Failed(String),
    /// Session is terminal; navigate to this path
    Redirected(String),
    /// Opaque order payload; session is Idle again
    Order(Value),
}

/// Cart snapshot merged onto the session by `build`. Fields are
/// enumerated on purpose: server responses cannot smuggle arbitrary
/// keys into session state.
#[derive(Debug, Clone, Default)]
pub struct CartUpdate {
    pub id: Option<String>,
    pub lines: Option<Vec<CartLine>>,
    pub products: Option<Vec<Product>>,
}

/// The reactive checkout session
pub struct CheckoutSession {
    id: String,
    lines: Vec<CartLine>,
    products: Vec<Product>,
    /// Registration order; sorted on read
    actions: Vec<Action>,
    extra: Map<String, Value>,
    state: SessionState,
    observers: Vec<Observer>,
    totals: TotalsEngine,
    transport: Arc<dyn CheckoutTransport>,
}

impl CheckoutSession {
    pub fn new(
        id: impl Into<String>,
        totals: TotalsEngine,
        transport: Arc<dyn CheckoutTransport>,
    ) -> Self {
        Self {
            id: id.into(),
            lines: Vec::new(),
            products: Vec::new(),
            actions: Vec::new(),
            extra: Map::new(),
            state: SessionState::Idle,
            observers: Vec::new(),
            totals,
            transport,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True while a completion request is in flight
    pub fn loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    /// Subscribe to `update` notifications (e.g., a rendered view)
    pub fn subscribe(&mut self, observer: impl Fn() + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer();
        }
    }

    /// Merge a cart snapshot onto the session. Called on every
    /// cart-update event. Clears `loading` and notifies observers;
    /// a terminal `Redirected` session stays terminal.
    pub fn build(&mut self, update: CartUpdate) {
        if let Some(id) = update.id {
            self.id = id;
        }
        if let Some(lines) = update.lines {
            self.lines = lines;
        }
        if let Some(products) = update.products {
            self.products = products;
        }
        if self.state == SessionState::Loading {
            self.state = SessionState::Idle;
        }
        self.notify();
    }

    /// Set a side-channel metadata key; a falsy value (null, false, 0,
    /// empty string) deletes the key instead. Notifies observers.
    pub fn extra(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if is_falsy(&value) {
            self.extra.remove(&name);
        } else {
            self.extra.insert(name, value);
        }
        self.notify();
    }

    /// Read a side-channel metadata key
    pub fn get_extra(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Register (or replace, keeping registration order) a checkout action
    pub fn add_action(&mut self, action: Action) {
        if let Some(existing) = self.actions.iter_mut().find(|a| a.id == action.id) {
            *existing = action;
        } else {
            self.actions.push(action);
        }
        self.notify();
    }

    /// Registered actions, stable-sorted by ascending priority;
    /// equal priorities keep registration order.
    pub fn actions(&self) -> Vec<Action> {
        let mut sorted = self.actions.clone();
        sorted.sort_by_key(|a| a.priority);
        sorted
    }

    /// Submittable descriptors for the registered actions, sorted
    fn action_metas(&self) -> Vec<ActionMeta> {
        self.actions()
            .iter()
            .map(|a| a.meta(&self.extra))
            .collect()
    }

    /// Order total over the current lines/products, with the opt-in
    /// `checkout.total` discount pass
    pub async fn total(&self, with_discount: bool) -> ShopResult<Money> {
        self.totals
            .total(&self.lines, &self.products, &self.action_metas(), with_discount)
            .await
    }

    /// Submit the checkout for completion.
    ///
    /// Transitions to `Loading`, posts `{id, lines, actions}`, then:
    /// - structured `{error}` -> back to `Idle`, message returned;
    /// - `{redirect}` or `{id}` -> terminal `Redirected`;
    /// - anything else -> back to `Idle`, raw payload returned.
    ///
    /// Transport failures reset the session to `Idle` and propagate to
    /// the caller. A terminal `Redirected` session stays terminal and
    /// does not re-submit.
    pub async fn submit(&mut self) -> ShopResult<SubmitOutcome> {
        if let SessionState::Redirected(path) = &self.state {
            return Ok(SubmitOutcome::Redirected(path.clone()));
        }

        self.state = SessionState::Loading;
        self.notify();

        let request = CompleteRequest {
            id: self.id.clone(),
            lines: self.lines.clone(),
            actions: self.action_metas(),
        };

        debug!(session = %self.id, lines = request.lines.len(), "submitting checkout");

        let response = match self.transport.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.state = SessionState::Idle;
                self.notify();
                return Err(e);
            }
        };

        match response {
            CompleteResponse::Error { text } => {
                self.state = SessionState::Idle;
                self.notify();
                Ok(SubmitOutcome::Failed(text))
            }
            CompleteResponse::Redirect(path) => {
                self.state = SessionState::Redirected(path.clone());
                self.notify();
                Ok(SubmitOutcome::Redirected(path))
            }
            CompleteResponse::Created { id } => {
                let path = format!("/order/{id}");
                self.state = SessionState::Redirected(path.clone());
                self.notify();
                Ok(SubmitOutcome::Redirected(path))
            }
            CompleteResponse::Order(value) => {
                self.state = SessionState::Idle;
                self.notify();
                Ok(SubmitOutcome::Order(value))
            }
        }
    }
}

/// JS-style truthiness for `extra` values: null, false, 0, and the
/// empty string delete; arrays and objects are always truthy.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
