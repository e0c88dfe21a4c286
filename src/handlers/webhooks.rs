use crate::errors::ServiceError;
use crate::models::WebhookEvent;
use crate::services::ReconcileOutcome;
use crate::AppState;
use axum::{extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse};
use base64::Engine;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "x-square-hmacsha256-signature";

/// POST /webhook
///
/// Receives payment-lifecycle events from the processor. Reconciliation runs
/// to completion before the event is acknowledged: a downstream failure
/// returns a 5xx so the processor redelivers, while every recognized terminal
/// outcome (applied or skipped) is acknowledged with 200.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    if let Some(secret) = &state.config.square_webhook_secret {
        let notification_url = state
            .config
            .square_webhook_notification_url
            .as_deref()
            .unwrap_or_default();
        if !verify_signature(&headers, notification_url, &body, secret) {
            warn!("webhook signature verification failed");
            return Err(ServiceError::Unauthorized(
                "invalid webhook signature".to_string(),
            ));
        }
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid webhook payload: {}", e)))?;

    match state.services.reconciler.handle_event(&event).await? {
        ReconcileOutcome::Applied {
            order_id,
            member_id,
        } => {
            info!(%order_id, %member_id, "reconciliation applied");
        }
        ReconcileOutcome::Skipped(reason) => {
            info!(kind = %event.kind, reason = reason.as_str(), "event acknowledged without mutation");
        }
    }

    Ok((StatusCode::OK, "ok"))
}

/// Verify the processor's HMAC-SHA256 signature: base64 of the HMAC over the
/// notification URL concatenated with the raw body.
fn verify_signature(headers: &HeaderMap, notification_url: &str, body: &Bytes, secret: &str) -> bool {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok()) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(notification_url.as_bytes());
    mac.update(body);
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    constant_time_eq(&expected, signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_headers(url: &str, body: &[u8], secret: &str) -> HeaderMap {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(url.as_bytes());
        mac.update(body);
        let sig = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, sig.parse().unwrap());
        headers
    }

    #[test]
    fn valid_signature_verifies() {
        let body = Bytes::from_static(b"{\"type\":\"payment.updated\"}");
        let headers = signed_headers("https://api.example.com/webhook", &body, "whsec_1");
        assert!(verify_signature(
            &headers,
            "https://api.example.com/webhook",
            &body,
            "whsec_1"
        ));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = Bytes::from_static(b"{}");
        let headers = signed_headers("https://api.example.com/webhook", &body, "whsec_1");
        assert!(!verify_signature(
            &headers,
            "https://api.example.com/webhook",
            &body,
            "whsec_2"
        ));
    }

    #[test]
    fn tampered_body_fails() {
        let body = Bytes::from_static(b"{\"a\":1}");
        let headers = signed_headers("https://api.example.com/webhook", &body, "whsec_1");
        let tampered = Bytes::from_static(b"{\"a\":2}");
        assert!(!verify_signature(
            &headers,
            "https://api.example.com/webhook",
            &tampered,
            "whsec_1"
        ));
    }

    #[test]
    fn missing_header_fails() {
        let body = Bytes::from_static(b"{}");
        assert!(!verify_signature(
            &HeaderMap::new(),
            "https://api.example.com/webhook",
            &body,
            "whsec_1"
        ));
    }
}
