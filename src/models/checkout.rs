use serde::{Deserialize, Serialize};

/// Monetary amount in the currency's smallest unit (cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Inbound checkout request from the client application.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub products: Vec<ProductInput>,
    /// Membership-record id; absent for guest checkout.
    #[serde(default)]
    pub id: Option<String>,
    /// Optional promo code to apply.
    #[serde(default)]
    pub promo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub quantity: u32,
    pub base_price_money: Money,
}

/// Checkout-session creation request sent to the payment processor.
/// Ephemeral: built per request and discarded after submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub idempotency_key: String,
    pub order: CreateOrderRequest,
    pub ask_for_shipping_address: bool,
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_populate_buyer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_populate_shipping_address: Option<ShippingPrefill>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order: OrderPayload,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub location_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub line_items: Vec<CheckoutLineItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<OrderDiscount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItem {
    pub name: String,
    /// The processor expects line-item quantities as strings.
    pub quantity: String,
    pub base_price_money: Money,
}

/// Order-scoped fixed-percentage discount descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDiscount {
    pub uid: String,
    pub name: String,
    /// Percentage as digits, e.g. "10" for 10% off.
    pub percentage: String,
    pub scope: String,
    #[serde(rename = "type")]
    pub discount_type: String,
}

pub const DISCOUNT_SCOPE_ORDER: &str = "ORDER";
pub const DISCOUNT_TYPE_FIXED_PERCENTAGE: &str = "FIXED_PERCENTAGE";

impl OrderDiscount {
    /// Build the single order-scoped percentage discount for a promo code.
    /// The uid is derived from the code so retried builds stay stable.
    pub fn for_promo(code: &str, percentage: &str) -> Self {
        Self {
            uid: format!("promo-{}", code),
            name: code.to_string(),
            percentage: percentage.to_string(),
            scope: DISCOUNT_SCOPE_ORDER.to_string(),
            discount_type: DISCOUNT_TYPE_FIXED_PERCENTAGE.to_string(),
        }
    }
}

/// Shipping address pre-fill mapped from member custom fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingPrefill {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_district_level_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// ISO 3166-1 alpha-2 code; unset when the member's free-text country
    /// name is not recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Created checkout session returned by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: String,
    pub checkout_page_url: String,
}

/// Human-readable order summary carried on the redirect URL for client-side
/// display. Never authoritative pricing; the processor computes final totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub items: Vec<SummaryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    pub name: String,
    pub quantity: u32,
    /// Extended amount: unit amount multiplied by quantity.
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_discounts: Vec<DiscountRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRef {
    pub discount_uid: String,
}
