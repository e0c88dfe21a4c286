use crate::errors::ServiceError;
use crate::models::CheckoutRequest;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Hosted checkout page the client should redirect the buyer to.
    pub url: String,
}

/// POST /checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let checkout = state.services.checkout.create_checkout(payload).await?;
    Ok(Json(CheckoutResponse {
        url: checkout.checkout_page_url,
    }))
}
