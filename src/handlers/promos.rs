use crate::errors::ServiceError;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PromoValidateRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct PromoValidateResponse {
    pub valid: bool,
    /// Percentage as digits, e.g. "10"; absent for unknown codes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
}

/// POST /promo/validate
pub async fn validate_promo(
    State(state): State<AppState>,
    Json(payload): Json<PromoValidateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let lookup = state.services.promos.lookup(&payload.code).await?;
    Ok(Json(PromoValidateResponse {
        valid: lookup.valid,
        discount: lookup.percentage,
    }))
}
