use super::order::LedgerEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-member order-history ledger, keyed by processor order id.
///
/// Invariant: an order id appears at most once; recording the same completed
/// order again must neither duplicate nor re-timestamp the existing entry.
pub type OrderLedger = BTreeMap<String, LedgerEntry>;

/// Identity record in the membership system. Owned by Memberstack; this
/// service only reads it and issues partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub auth: MemberAuth,
    #[serde(rename = "customFields", default)]
    pub custom_fields: CustomFields,
    #[serde(default)]
    pub json: MemberData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAuth {
    pub email: String,
}

/// Member custom fields as stored by the membership platform. Field names on
/// the wire are the kebab-case slugs Memberstack generates from field labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomFields {
    /// Linked payment-processor customer id, set lazily on first checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square_id: Option<String>,
    #[serde(rename = "first-name", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "last-name", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "apartment-suite-etc", skip_serializing_if = "Option::is_none")]
    pub apartment_suite_etc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "postal-code", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "phone-number", skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(rename = "company-name", skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// The member's opaque JSON document. `orders` is the ledger this service
/// maintains; any other content the member app keeps in the document is
/// carried through untouched on write-back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberData {
    #[serde(default)]
    pub orders: OrderLedger,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial member update. The membership API merges `customFields` key by key
/// server-side; the `json` document is replaced wholesale, which is why ledger
/// merging happens client-side against a freshly fetched record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemberUpdate {
    #[serde(rename = "customFields", skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<MemberData>,
}

impl MemberUpdate {
    pub fn custom_fields(fields: Value) -> Self {
        Self {
            custom_fields: Some(fields),
            json: None,
        }
    }

    pub fn json(json: MemberData) -> Self {
        Self {
            custom_fields: None,
            json: Some(json),
        }
    }
}
