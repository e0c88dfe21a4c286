pub mod checkout;
pub mod health;
pub mod promos;
pub mod webhooks;

use crate::clients::{MembershipApi, PaymentsApi, PromoTable};
use crate::config::AppConfig;
use crate::services::{CheckoutService, IdentityLinker, OrderReconciler, PromoResolver};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates the business logic used by HTTP handlers.
/// Clients are process-wide singletons injected once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub identity: IdentityLinker,
    pub promos: PromoResolver,
    pub checkout: CheckoutService,
    pub reconciler: OrderReconciler,
}

impl AppServices {
    pub fn new(
        config: &AppConfig,
        payments: Arc<dyn PaymentsApi>,
        membership: Arc<dyn MembershipApi>,
        promo_table: Arc<dyn PromoTable>,
    ) -> Self {
        let identity = IdentityLinker::new(membership.clone(), payments.clone());
        let promos = PromoResolver::new(promo_table);
        let checkout = CheckoutService::new(
            payments.clone(),
            membership.clone(),
            identity.clone(),
            promos.clone(),
            config.square_location_id.clone(),
            config.checkout_redirect_url.clone(),
        );
        let reconciler = OrderReconciler::new(payments, membership, identity.clone());

        Self {
            identity,
            promos,
            checkout,
            reconciler,
        }
    }
}

/// All application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhooks::payment_webhook))
        .route("/checkout", post(checkout::create_checkout))
        .route("/promo/validate", post(promos::validate_promo))
        .route("/health", get(health::health))
}
