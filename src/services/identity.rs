use crate::clients::{MembershipApi, PaymentsApi};
use crate::errors::ServiceError;
use crate::models::{Member, MemberUpdate};
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

/// Maps membership-record ids to payment-processor customer ids, creating the
/// mapping lazily on first use.
///
/// A process-local reverse index (customer id -> member id) is maintained at
/// mapping-creation time so reconciliation can avoid the full-roster scan;
/// the scan remains as the bootstrap path for mappings created before this
/// process started.
///
/// Known race: two concurrent first-time resolutions for the same member can
/// both miss the cached field and create duplicate processor customers. The
/// membership record ends up with whichever write lands last; accepted as
/// best-effort behavior.
///
/// The index only grows for the lifetime of the process. Its size is bounded
/// by the roster (one entry per member ever seen), so no eviction is done;
/// stale entries are dropped when a lookup finds them pointing at a record
/// that no longer carries the customer id.
#[derive(Clone)]
pub struct IdentityLinker {
    membership: Arc<dyn MembershipApi>,
    payments: Arc<dyn PaymentsApi>,
    customer_index: Arc<DashMap<String, String>>,
}

impl IdentityLinker {
    pub fn new(membership: Arc<dyn MembershipApi>, payments: Arc<dyn PaymentsApi>) -> Self {
        Self {
            membership,
            payments,
            customer_index: Arc::new(DashMap::new()),
        }
    }

    /// Resolve the processor customer id for a member, fetching the record
    /// first. Fails with `NotFound` when the member does not exist.
    #[instrument(skip(self))]
    pub async fn resolve_customer_id(&self, member_id: &str) -> Result<String, ServiceError> {
        let member = self.membership.retrieve_member(member_id).await?;
        self.resolve_for_member(&member).await
    }

    /// Resolve the processor customer id for an already-fetched member.
    ///
    /// When the record carries a customer id the call is a pure cache hit
    /// with no processor traffic; otherwise exactly one customer-creation
    /// call is issued and the id persisted back onto the member's custom
    /// fields.
    #[instrument(skip(self, member), fields(member_id = %member.id))]
    pub async fn resolve_for_member(&self, member: &Member) -> Result<String, ServiceError> {
        if let Some(existing) = &member.custom_fields.square_id {
            self.customer_index
                .insert(existing.clone(), member.id.clone());
            return Ok(existing.clone());
        }

        let customer = self.payments.create_customer(&member.auth.email).await?;
        info!(
            member_id = %member.id,
            customer_id = %customer.id,
            "created processor customer for member"
        );

        self.membership
            .update_member(
                &member.id,
                &MemberUpdate::custom_fields(json!({ "square_id": customer.id })),
            )
            .await?;

        self.customer_index
            .insert(customer.id.clone(), member.id.clone());
        Ok(customer.id)
    }

    /// Reverse lookup: find the member owning a processor customer id.
    ///
    /// Consults the in-process index first and verifies the hit against the
    /// live record; on a miss the full roster is scanned once and the index
    /// warmed with the result.
    #[instrument(skip(self))]
    pub async fn find_member_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Member>, ServiceError> {
        if let Some(member_id) = self
            .customer_index
            .get(customer_id)
            .map(|entry| entry.value().clone())
        {
            match self.membership.retrieve_member(&member_id).await {
                Ok(member)
                    if member.custom_fields.square_id.as_deref() == Some(customer_id) =>
                {
                    return Ok(Some(member));
                }
                Ok(_) | Err(ServiceError::NotFound(_)) => {
                    // Stale index entry; drop it and fall back to the scan.
                    self.customer_index.remove(customer_id);
                }
                Err(other) => return Err(other),
            }
        }

        let roster = self.membership.list_members().await?;
        let found = roster
            .into_iter()
            .find(|m| m.custom_fields.square_id.as_deref() == Some(customer_id));

        if let Some(member) = &found {
            self.customer_index
                .insert(customer_id.to_string(), member.id.clone());
        }
        Ok(found)
    }
}
