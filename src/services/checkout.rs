use crate::clients::{MembershipApi, PaymentsApi};
use crate::errors::ServiceError;
use crate::models::{
    Checkout, CheckoutLineItem, CheckoutRequest, CreateCheckoutRequest, CreateOrderRequest,
    CustomFields, DiscountRef, Member, OrderDiscount, OrderPayload, OrderSummary, ShippingPrefill,
    SummaryItem,
};
use crate::services::geo;
use crate::services::identity::IdentityLinker;
use crate::services::promo::PromoResolver;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;
use uuid::Uuid;

/// Composes and submits checkout-session requests to the payment processor.
#[derive(Clone)]
pub struct CheckoutService {
    payments: Arc<dyn PaymentsApi>,
    membership: Arc<dyn MembershipApi>,
    identity: IdentityLinker,
    promos: PromoResolver,
    location_id: String,
    redirect_base: String,
}

impl CheckoutService {
    pub fn new(
        payments: Arc<dyn PaymentsApi>,
        membership: Arc<dyn MembershipApi>,
        identity: IdentityLinker,
        promos: PromoResolver,
        location_id: impl Into<String>,
        redirect_base: impl Into<String>,
    ) -> Self {
        Self {
            payments,
            membership,
            identity,
            promos,
            location_id: location_id.into(),
            redirect_base: redirect_base.into(),
        }
    }

    /// Build a checkout session and return the hosted checkout page.
    ///
    /// Guest checkout (no member id) skips identity resolution and shipping
    /// pre-fill. A missing member is a user-visible error here, unlike the
    /// webhook flow where it is a silent skip.
    #[instrument(skip(self, request), fields(member_id = request.id.as_deref().unwrap_or("guest")))]
    pub async fn create_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<Checkout, ServiceError> {
        if request.products.is_empty() {
            return Err(ServiceError::ValidationError(
                "checkout requires at least one product".to_string(),
            ));
        }
        if request.products.iter().any(|p| p.quantity == 0) {
            return Err(ServiceError::ValidationError(
                "product quantity must be positive".to_string(),
            ));
        }

        let member = match &request.id {
            Some(member_id) => Some(self.membership.retrieve_member(member_id).await?),
            None => None,
        };

        let customer_id = match &member {
            Some(member) => Some(self.identity.resolve_for_member(member).await?),
            None => None,
        };

        let discount = match request.promo.as_deref() {
            Some(code) => self.resolve_discount(code).await,
            None => None,
        };

        let line_items: Vec<CheckoutLineItem> = request
            .products
            .iter()
            .map(|p| CheckoutLineItem {
                name: p.name.clone(),
                quantity: p.quantity.to_string(),
                base_price_money: p.base_price_money.clone(),
            })
            .collect();

        let summary = OrderSummary {
            items: request
                .products
                .iter()
                .map(|p| SummaryItem {
                    name: p.name.clone(),
                    quantity: p.quantity,
                    amount: p.base_price_money.amount * i64::from(p.quantity),
                    applied_discounts: discount
                        .iter()
                        .map(|d| DiscountRef {
                            discount_uid: d.uid.clone(),
                        })
                        .collect(),
                })
                .collect(),
        };

        let checkout_request = CreateCheckoutRequest {
            // Fresh keys per attempt: client-side retries of the response
            // must not resubmit under an old key, while processor-side
            // retries of this exact request stay deduplicated.
            idempotency_key: Uuid::new_v4().to_string(),
            order: CreateOrderRequest {
                order: OrderPayload {
                    location_id: self.location_id.clone(),
                    customer_id,
                    line_items,
                    discounts: discount.into_iter().collect(),
                },
                idempotency_key: Uuid::new_v4().to_string(),
            },
            ask_for_shipping_address: true,
            redirect_url: self.redirect_url(&summary)?,
            pre_populate_buyer_email: member.as_ref().map(|m| m.auth.email.clone()),
            pre_populate_shipping_address: member.as_ref().map(shipping_prefill),
        };

        let checkout = self
            .payments
            .create_checkout(&self.location_id, &checkout_request)
            .await?;

        info!(checkout_id = %checkout.id, "checkout session created");
        Ok(checkout)
    }

    /// Resolve a promo code into at most one discount descriptor. An invalid
    /// code, or a failure reaching the table, never fails the checkout.
    async fn resolve_discount(&self, code: &str) -> Option<OrderDiscount> {
        match self.promos.lookup(code).await {
            Ok(lookup) if lookup.valid => lookup
                .percentage
                .map(|percentage| OrderDiscount::for_promo(code, &percentage)),
            Ok(_) => {
                info!(code, "unknown promo code, proceeding undiscounted");
                None
            }
            Err(err) => {
                warn!(code, error = %err, "promo lookup failed, proceeding undiscounted");
                None
            }
        }
    }

    /// Success URL annotated with the URL-encoded JSON order summary. The
    /// summary is display-only; the processor computes authoritative totals.
    fn redirect_url(&self, summary: &OrderSummary) -> Result<String, ServiceError> {
        let mut url = Url::parse(&self.redirect_base).map_err(|e| {
            ServiceError::InternalError(format!("invalid checkout redirect URL: {}", e))
        })?;
        let encoded = serde_json::to_string(summary)?;
        url.query_pairs_mut().append_pair("summary", &encoded);
        Ok(url.to_string())
    }
}

/// Map member custom fields into the processor's shipping pre-fill shape.
/// The country is translated from a free-text name to an alpha-2 code and
/// left unset when unrecognized.
pub fn shipping_prefill(member: &Member) -> ShippingPrefill {
    let fields: &CustomFields = &member.custom_fields;
    ShippingPrefill {
        first_name: fields.first_name.clone(),
        last_name: fields.last_name.clone(),
        address_line_1: fields.address.clone(),
        address_line_2: fields.apartment_suite_etc.clone(),
        locality: fields.city.clone(),
        administrative_district_level_1: fields.state.clone(),
        postal_code: fields.postal_code.clone(),
        country: fields
            .country
            .as_deref()
            .and_then(geo::country_code)
            .map(String::from),
    }
}
