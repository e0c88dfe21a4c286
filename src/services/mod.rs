pub mod checkout;
pub mod geo;
pub mod identity;
pub mod promo;
pub mod reconcile;

pub use checkout::CheckoutService;
pub use identity::IdentityLinker;
pub use promo::PromoResolver;
pub use reconcile::{OrderReconciler, ReconcileOutcome, SkipReason};
