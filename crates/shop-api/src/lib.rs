//! # shop-api
//!
//! HTTP API layer for vendo-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The checkout completion endpoint (order, invoice, payment)
//! - REST endpoints for the product catalog
//! - The offline payment gateway listener on `payment.pay`
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/checkout/{id}/complete` | Complete checkout session |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/{id}` | Get product |

pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod state;

pub use gateway::OfflineGateway;
pub use routes::create_router;
pub use state::{AppConfig, AppState};
