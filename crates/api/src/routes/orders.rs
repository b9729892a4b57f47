//! Order placement endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use common::{AddressId, PaymentMethodId, ProductId, UserId};
use domain::{Money, OrderLine, PlaceOrder};
use serde::{Deserialize, Serialize};
use store::Storage;

use super::{ApiResponse, AppState};
use crate::error::ApiError;

const MISSING_FIELDS: &str = "Missing required fields";

// -- Request types --

/// Every field is optional at the wire level so that a missing field
/// produces the same 400 envelope as any other malformed request.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Option<i64>,
    pub address_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub items: Option<Vec<OrderItemRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: Option<i64>,
}

impl CreateOrderRequest {
    /// Converts the wire request into a command; value checks are left to
    /// `PlaceOrder::validate`.
    fn into_command(self) -> Result<PlaceOrder, ApiError> {
        let missing = || ApiError::BadRequest(MISSING_FIELDS.to_string());

        let (Some(user_id), Some(address_id), Some(payment_method_id), Some(items)) = (
            self.user_id,
            self.address_id,
            self.payment_method_id,
            self.items,
        ) else {
            return Err(missing());
        };
        if items.is_empty() {
            return Err(missing());
        }

        let lines = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let (Some(product_id), Some(size), Some(color), Some(quantity)) =
                    (item.product_id, item.size, item.color, item.quantity)
                else {
                    return Err(ApiError::BadRequest(format!(
                        "{MISSING_FIELDS}: items[{i}]"
                    )));
                };
                // Non-positive quantities become 0 and are rejected by validation.
                let quantity = u32::try_from(quantity.max(0)).map_err(|_| {
                    ApiError::BadRequest(format!("items[{i}].quantity is too large"))
                })?;
                Ok(OrderLine::new(ProductId::new(product_id), size, color, quantity))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlaceOrder::new(
            UserId::new(user_id),
            AddressId::new(address_id),
            PaymentMethodId::new(payment_method_id),
            lines,
        ))
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: i64,
    pub status: String,
    pub total_amount: Money,
    pub payment_status: &'static str,
}

// -- Handlers --

/// POST /api/orders: place an order in one transaction.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<OrderCreatedResponse>>), ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let cmd = req.into_command()?;

    let placed = state.workflow.place_order(cmd).await?;

    let message = if placed.notification_queued {
        "Order created successfully and confirmation email queued"
    } else {
        "Order created successfully"
    };
    let response = OrderCreatedResponse {
        order_id: placed.order.id.get(),
        status: placed.order.status.to_string(),
        total_amount: placed.order.total_amount,
        // Payment capture is simulated; a committed order is always paid.
        payment_status: "completed",
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(response).with_message(message)),
    ))
}
