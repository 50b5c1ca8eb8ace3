//! # Request Handlers
//!
//! Axum request handlers for the vendo API. The completion endpoint is
//! the server half of the checkout session's `submit()`: it re-derives
//! all pricing, invoices the order, and captures payment when the
//! submitted `payment` action carries a method descriptor.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use shop_billing::{InvoiceStore, Order, OrderStore, PaymentMethod};
use shop_checkout::CompleteRequest;
use shop_core::ShopError;
use tracing::{error, info, instrument};

// =============================================================================
// Response Types
// =============================================================================

/// Structured error body: `{"error": {"text": "..."}}`, the shape the
/// checkout session surfaces to the user
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorText,
}

/// Human-readable error message
#[derive(Debug, Serialize)]
pub struct ErrorText {
    pub text: String,
}

impl ErrorResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            error: ErrorText { text: text.into() },
        }
    }
}

fn shop_error_to_response(err: ShopError) -> (StatusCode, Json<ErrorResponse>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.to_string())))
}

fn bad_request(text: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(text)))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "vendo",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Complete a checkout: validate the submission, upsert the order,
/// invoice it, and capture payment.
///
/// Responds `{"id": orderId}` on success and `{"error": {"text"}}` on
/// any failure, matching the session's response decoding.
#[instrument(skip(state, request), fields(checkout_id = %checkout_id, lines = request.lines.len()))]
pub async fn complete_checkout(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    Json(mut request): Json<CompleteRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    // Validation happens before any pricing work.
    if request.id != checkout_id {
        return Err(bad_request("submission id does not match checkout path"));
    }
    if request.lines.is_empty() {
        return Err(bad_request("checkout has no lines"));
    }
    if request.lines.iter().any(|line| line.qty == 0) {
        return Err(bad_request("line quantity must be at least 1"));
    }

    let method = payment_method_from_actions(&request)?;

    // An invoiced order's priced lines are immutable; reject the
    // re-submission before overwriting them.
    if state
        .billing
        .invoices()
        .find_by_order(&checkout_id)
        .await
        .map_err(shop_error_to_response)?
        .is_some()
    {
        return Err(shop_error_to_response(ShopError::AlreadyInvoiced {
            order_id: checkout_id,
        }));
    }

    // Client-supplied prices are never trusted.
    for line in &mut request.lines {
        line.strip_pricing();
    }

    let order = match state
        .orders
        .find(&checkout_id)
        .await
        .map_err(shop_error_to_response)?
    {
        Some(mut order) => {
            order.lines = request.lines;
            order
        }
        None => Order::new(request.lines).with_id(&checkout_id),
    };
    state
        .orders
        .save(&order)
        .await
        .map_err(shop_error_to_response)?;

    let invoice = state.billing.invoice(&order.id).await.map_err(|e| {
        error!("Invoicing failed: {}", e);
        shop_error_to_response(e)
    })?;

    if let Some(method) = method {
        let payment = state
            .billing
            .payment(&invoice.id, method)
            .await
            .map_err(|e| {
                error!("Payment capture failed: {}", e);
                shop_error_to_response(e)
            })?;
        info!(
            order = %order.id,
            payment = %payment.id,
            status = ?payment.status,
            "checkout completed with payment"
        );
    } else {
        info!(order = %order.id, invoice = %invoice.id, "checkout completed, payment deferred");
    }

    Ok(Json(json!({ "id": order.id })))
}

/// Pull the payment method descriptor out of the submitted `payment`
/// action, when present
fn payment_method_from_actions(
    request: &CompleteRequest,
) -> Result<Option<PaymentMethod>, (StatusCode, Json<ErrorResponse>)> {
    let Some(value) = request
        .actions
        .iter()
        .find(|a| a.id == "payment")
        .and_then(|a| a.value.clone())
    else {
        return Ok(None);
    };

    serde_json::from_value(value)
        .map(Some)
        .map_err(|_| bad_request("invalid payment method descriptor"))
}

/// Get products list
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products: Vec<_> = state.catalog.active_products().collect();
    Json(json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let product = state.catalog.get(&product_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Product not found: {product_id}"
            ))),
        )
    })?;

    Ok(Json(product.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(body, json!({"error": {"text": "boom"}}));
    }

    #[test]
    fn test_shop_error_status_mapping() {
        let (status, _body) = shop_error_to_response(ShopError::Validation("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _body) = shop_error_to_response(ShopError::AlreadyInvoiced {
            order_id: "o".into(),
        });
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
