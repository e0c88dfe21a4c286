pub mod checkout;
pub mod member;
pub mod order;
pub mod webhook;

pub use checkout::{
    Checkout, CheckoutLineItem, CheckoutRequest, CreateCheckoutRequest, CreateOrderRequest,
    DiscountRef, Money, OrderDiscount, OrderPayload, OrderSummary, ProductInput, ShippingPrefill,
    SummaryItem,
};
pub use member::{CustomFields, Member, MemberAuth, MemberData, MemberUpdate, OrderLedger};
pub use order::{Customer, LedgerEntry, LedgerItem, Order, OrderLineItem};
pub use webhook::{PaymentUpdated, WebhookData, WebhookEvent, WebhookObject};
