//! Outbound clients for the payment processor, the membership platform, and
//! the promo-code table. Services depend on the traits; the reqwest-backed
//! implementations are constructed once at startup and injected.

pub mod memberstack;
pub mod promo_sheet;
pub mod square;

use crate::errors::ServiceError;
use crate::models::{Checkout, CreateCheckoutRequest, Customer, Member, MemberUpdate, Order};
use async_trait::async_trait;

pub use memberstack::MemberstackClient;
pub use promo_sheet::SheetPromoTable;
pub use square::SquareClient;

/// Payment-processor API surface used by this service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentsApi: Send + Sync {
    /// Fetch the full order record for a payment's order id.
    async fn retrieve_order(&self, order_id: &str) -> Result<Order, ServiceError>;

    /// Create a processor customer bound to an email address.
    async fn create_customer(&self, email: &str) -> Result<Customer, ServiceError>;

    /// Create a hosted checkout session and return it.
    async fn create_checkout(
        &self,
        location_id: &str,
        request: &CreateCheckoutRequest,
    ) -> Result<Checkout, ServiceError>;
}

/// Membership-platform API surface used by this service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipApi: Send + Sync {
    /// Fetch a single member record. Returns `NotFound` for unknown ids.
    async fn retrieve_member(&self, member_id: &str) -> Result<Member, ServiceError>;

    /// List the full membership roster. A roster-scale call; only used as the
    /// reverse-lookup bootstrap path.
    async fn list_members(&self) -> Result<Vec<Member>, ServiceError>;

    /// Apply a partial update to a member record.
    async fn update_member(
        &self,
        member_id: &str,
        update: &MemberUpdate,
    ) -> Result<(), ServiceError>;
}

/// Source of the promo-code table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromoTable: Send + Sync {
    /// Fetch all rows of the table, header row included.
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ServiceError>;
}

/// Build the shared outbound HTTP client with the configured timeout.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            ServiceError::InternalError(format!("failed to construct HTTP client: {}", e))
        })
}

/// Map a reqwest transport error onto the service taxonomy.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> ServiceError {
    ServiceError::ExternalServiceError(format!("{}: {}", context, err))
}
