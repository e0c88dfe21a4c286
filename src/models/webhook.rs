use serde::Deserialize;

pub const EVENT_PAYMENT_UPDATED: &str = "payment.updated";
pub const PAYMENT_STATUS_COMPLETED: &str = "COMPLETED";

/// Inbound payment-lifecycle event from the processor.
///
/// Every layer below `type` is optional: the gateway delivers many event
/// kinds and all of them must be acknowledged, so deserialization never
/// rejects an unfamiliar shape.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub object: Option<WebhookObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    #[serde(default)]
    pub payment: Option<PaymentUpdated>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentUpdated {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl WebhookEvent {
    /// Returns the order id when this event is a completed-payment update,
    /// the only trigger for reconciliation.
    pub fn completed_payment_order_id(&self) -> Option<&str> {
        if self.kind != EVENT_PAYMENT_UPDATED {
            return None;
        }
        let payment = self.data.as_ref()?.object.as_ref()?.payment.as_ref()?;
        if payment.status.as_deref() != Some(PAYMENT_STATUS_COMPLETED) {
            return None;
        }
        payment.order_id.as_deref()
    }
}
