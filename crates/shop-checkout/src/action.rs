//! # Checkout Actions
//!
//! Pluggable, priority-ordered checkout steps ("apply coupon", "select
//! shipping", "payment method"). The session keeps actions in
//! registration order and sorts them by ascending priority on read;
//! equal priorities keep their registration order.

use serde_json::{Map, Value};
use shop_core::ActionMeta;
use std::sync::Arc;

/// Capability a checkout step plugs into the session.
///
/// `render` produces view state for the step from the session's
/// side-channel extras; `submit_value` is what the step contributes to
/// the completion request (e.g., the selected shipping rate or the
/// payment method descriptor).
#[allow(unused_variables)]
pub trait ActionHandler: Send + Sync {
    /// View state for this step
    fn render(&self, extra: &Map<String, Value>) -> Value {
        Value::Null
    }

    /// Value submitted with the order
    fn submit_value(&self, extra: &Map<String, Value>) -> Option<Value> {
        None
    }
}

/// Handler that submits a fixed value (enough for steps whose state
/// lives entirely in `extra`)
pub struct StaticAction(pub Value);

impl ActionHandler for StaticAction {
    fn submit_value(&self, _extra: &Map<String, Value>) -> Option<Value> {
        Some(self.0.clone())
    }
}

/// A registered checkout step
#[derive(Clone)]
pub struct Action {
    /// Action identifier, unique within a session
    pub id: String,

    /// Sort priority, ascending
    pub priority: i32,

    /// Optional render/submit capability
    pub handler: Option<Arc<dyn ActionHandler>>,
}

impl Action {
    /// Create an action with the default priority (0)
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            handler: None,
        }
    }

    /// Builder: set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: attach a handler
    pub fn with_handler(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// The submittable descriptor for this action
    pub fn meta(&self, extra: &Map<String, Value>) -> ActionMeta {
        let mut meta = ActionMeta::new(&self.id, self.priority);
        if let Some(handler) = &self.handler {
            meta.value = handler.submit_value(extra);
        }
        meta
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_defaults() {
        let action = Action::new("coupon");
        assert_eq!(action.priority, 0);
        assert!(action.handler.is_none());
    }

    #[test]
    fn test_meta_carries_submit_value() {
        let action = Action::new("payment")
            .with_priority(50)
            .with_handler(Arc::new(StaticAction(json!({"method": "manual"}))));

        let meta = action.meta(&Map::new());
        assert_eq!(meta.id, "payment");
        assert_eq!(meta.priority, 50);
        assert_eq!(meta.value, Some(json!({"method": "manual"})));
    }

    #[test]
    fn test_handler_reads_extra() {
        struct ShippingAction;
        impl ActionHandler for ShippingAction {
            fn submit_value(&self, extra: &Map<String, Value>) -> Option<Value> {
                extra.get("shipping_rate").cloned()
            }
        }

        let action = Action::new("shipping").with_handler(Arc::new(ShippingAction));

        let mut extra = Map::new();
        assert_eq!(action.meta(&extra).value, None);

        extra.insert("shipping_rate".into(), json!("express"));
        assert_eq!(action.meta(&extra).value, Some(json!("express")));
    }
}
