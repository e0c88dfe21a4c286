use super::checkout::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ORDER_STATE_COMPLETED: &str = "COMPLETED";

/// Order record from the payment processor. Immutable once completed; the
/// order id is the ledger deduplication key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Processor order state, e.g. "OPEN", "COMPLETED", "CANCELED".
    #[serde(default)]
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
}

impl Order {
    pub fn is_completed(&self) -> bool {
        self.state == ORDER_STATE_COMPLETED
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub name: String,
    pub quantity: u32,
    pub total_money: Money,
}

/// Processor-side customer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
}

/// One recorded order in a member's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub items: Vec<LedgerItem>,
    pub recorded_at: DateTime<Utc>,
}

/// Display projection of an ordered line item. `amount` is kept as a string
/// because the member-facing page consumes it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerItem {
    pub name: String,
    pub quantity: u32,
    pub amount: String,
}

impl From<&OrderLineItem> for LedgerItem {
    fn from(item: &OrderLineItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            amount: item.total_money.amount.to_string(),
        }
    }
}
