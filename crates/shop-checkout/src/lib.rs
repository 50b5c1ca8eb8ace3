//! # shop-checkout
//!
//! Client-held reactive checkout session for vendo-rs.
//!
//! This crate provides:
//! - `CheckoutSession`, the reactive store and submission state machine
//! - `Action` / `ActionHandler` for pluggable, priority-ordered checkout steps
//! - `CheckoutTransport` / `HttpTransport` for the completion-endpoint wire
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_checkout::{Action, CartUpdate, CheckoutSession, HttpTransport};
//!
//! let mut session = CheckoutSession::new("sess_1", totals, Arc::new(HttpTransport::new(base)));
//! session.add_action(Action::new("coupon").with_priority(10));
//! session.build(CartUpdate { lines: Some(cart.lines()), ..Default::default() });
//!
//! if !session.loading() {
//!     match session.submit().await? {
//!         SubmitOutcome::Redirected(path) => navigate(path),
//!         SubmitOutcome::Failed(text) => show_error(text),
//!         SubmitOutcome::Order(raw) => render(raw),
//!     }
//! }
//! ```

pub mod action;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use action::{Action, ActionHandler, StaticAction};
pub use session::{CartUpdate, CheckoutSession, Observer, SessionState, SubmitOutcome};
pub use transport::{CheckoutTransport, CompleteRequest, CompleteResponse, HttpTransport};
