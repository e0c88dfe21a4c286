use crate::clients::{MembershipApi, PaymentsApi};
use crate::errors::ServiceError;
use crate::models::{LedgerEntry, LedgerItem, MemberUpdate, WebhookEvent};
use crate::services::identity::IdentityLinker;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Terminal outcome of handling one payment event. A skip is an acknowledged
/// no-op, not an error; only downstream failures surface as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Applied { order_id: String, member_id: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The event is not a completed-payment update.
    NotCompletedPayment,
    /// The payment completed but its order has not.
    OrderNotCompleted,
    /// The order carries no owning customer id.
    NoCustomerOnOrder,
    /// No member is linked to the order's customer id.
    MemberNotFound,
    /// The order is already present in the member's ledger.
    AlreadyRecorded,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotCompletedPayment => "not_completed_payment",
            Self::OrderNotCompleted => "order_not_completed",
            Self::NoCustomerOnOrder => "no_customer_on_order",
            Self::MemberNotFound => "member_not_found",
            Self::AlreadyRecorded => "already_recorded",
        }
    }
}

/// Applies completed payments to member order-history ledgers exactly once.
///
/// The read-modify-write of the ledger document is serialized per member
/// through a process-local keyed mutex, so duplicate webhook deliveries
/// handled by this process cannot interleave. Concurrent writers in other
/// processes remain unguarded; the ledger existence check is the only
/// cross-process protection.
///
/// Lock entries are never evicted; the map holds one entry per member that
/// completed an order since the process started, bounded by the roster size.
#[derive(Clone)]
pub struct OrderReconciler {
    payments: Arc<dyn PaymentsApi>,
    membership: Arc<dyn MembershipApi>,
    identity: IdentityLinker,
    member_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl OrderReconciler {
    pub fn new(
        payments: Arc<dyn PaymentsApi>,
        membership: Arc<dyn MembershipApi>,
        identity: IdentityLinker,
    ) -> Self {
        Self {
            payments,
            membership,
            identity,
            member_locks: Arc::new(DashMap::new()),
        }
    }

    /// Handle one inbound payment-lifecycle event to completion.
    #[instrument(skip(self, event), fields(event_kind = %event.kind))]
    pub async fn handle_event(
        &self,
        event: &WebhookEvent,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let Some(order_id) = event.completed_payment_order_id() else {
            return Ok(ReconcileOutcome::Skipped(SkipReason::NotCompletedPayment));
        };

        let order = self.payments.retrieve_order(order_id).await?;
        if !order.is_completed() {
            // A completed payment does not guarantee a completed order.
            info!(order_id, state = %order.state, "order not completed, skipping");
            return Ok(ReconcileOutcome::Skipped(SkipReason::OrderNotCompleted));
        }

        let Some(customer_id) = order.customer_id.as_deref() else {
            warn!(order_id, "completed order has no customer id");
            return Ok(ReconcileOutcome::Skipped(SkipReason::NoCustomerOnOrder));
        };

        let Some(matched) = self.identity.find_member_by_customer(customer_id).await? else {
            warn!(
                order_id,
                customer_id, "no member linked to customer of completed order"
            );
            metrics::increment_counter!("reconcile_member_not_found_total");
            return Ok(ReconcileOutcome::Skipped(SkipReason::MemberNotFound));
        };

        let lock = self
            .member_locks
            .entry(matched.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-fetch the full record under the lock so the merge starts from
        // the latest ledger state rather than the earlier roster listing.
        let member = self.membership.retrieve_member(&matched.id).await?;

        if member.json.orders.contains_key(&order.id) {
            info!(order_id = %order.id, member_id = %member.id, "order already recorded");
            return Ok(ReconcileOutcome::Skipped(SkipReason::AlreadyRecorded));
        }

        let mut json = member.json.clone();
        json.orders.insert(
            order.id.clone(),
            LedgerEntry {
                items: order.line_items.iter().map(LedgerItem::from).collect(),
                recorded_at: Utc::now(),
            },
        );

        self.membership
            .update_member(&member.id, &MemberUpdate::json(json))
            .await?;

        metrics::increment_counter!("reconcile_orders_applied_total");
        info!(
            order_id = %order.id,
            member_id = %member.id,
            items = order.line_items.len(),
            "order recorded in member ledger"
        );

        Ok(ReconcileOutcome::Applied {
            order_id: order.id,
            member_id: member.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockMembershipApi, MockPaymentsApi};
    use crate::models::{CustomFields, Member, MemberAuth, MemberData, Money, Order, OrderLineItem};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn completed_event(order_id: &str) -> WebhookEvent {
        serde_json::from_value(json!({
            "type": "payment.updated",
            "data": { "object": { "payment": { "status": "COMPLETED", "order_id": order_id } } }
        }))
        .unwrap()
    }

    fn soda_order(state: &str) -> Order {
        Order {
            id: "O1".into(),
            state: state.into(),
            customer_id: Some("C1".into()),
            line_items: vec![OrderLineItem {
                name: "Soda".into(),
                quantity: 2,
                total_money: Money {
                    amount: 500,
                    currency: None,
                },
            }],
        }
    }

    fn linked_member(ledger_keys: &[&str]) -> Member {
        let mut data = MemberData::default();
        for key in ledger_keys {
            data.orders.insert(
                key.to_string(),
                LedgerEntry {
                    items: vec![],
                    recorded_at: Utc::now(),
                },
            );
        }
        Member {
            id: "mem_1".into(),
            auth: MemberAuth {
                email: "jo@example.com".into(),
            },
            custom_fields: CustomFields {
                square_id: Some("C1".into()),
                ..Default::default()
            },
            json: data,
        }
    }

    fn reconciler(
        payments: MockPaymentsApi,
        membership: MockMembershipApi,
    ) -> OrderReconciler {
        let payments = Arc::new(payments);
        let membership = Arc::new(membership);
        let identity = IdentityLinker::new(
            membership.clone() as Arc<dyn MembershipApi>,
            payments.clone() as Arc<dyn PaymentsApi>,
        );
        OrderReconciler::new(payments, membership, identity)
    }

    #[tokio::test]
    async fn fresh_completed_order_is_recorded_once() {
        let mut payments = MockPaymentsApi::new();
        payments
            .expect_retrieve_order()
            .returning(|_| Ok(soda_order("COMPLETED")));

        let mut membership = MockMembershipApi::new();
        membership
            .expect_list_members()
            .returning(|| Ok(vec![linked_member(&[])]));
        membership
            .expect_retrieve_member()
            .returning(|_| Ok(linked_member(&[])));
        membership
            .expect_update_member()
            .withf(|id, update| {
                let json = update.json.as_ref().unwrap();
                let entry = json.orders.get("O1").unwrap();
                id == "mem_1"
                    && entry.items
                        == vec![LedgerItem {
                            name: "Soda".into(),
                            quantity: 2,
                            amount: "500".into(),
                        }]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = reconciler(payments, membership)
            .handle_event(&completed_event("O1"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Applied {
                order_id: "O1".into(),
                member_id: "mem_1".into()
            }
        );
    }

    #[tokio::test]
    async fn replayed_event_skips_without_update() {
        let mut payments = MockPaymentsApi::new();
        payments
            .expect_retrieve_order()
            .returning(|_| Ok(soda_order("COMPLETED")));

        let mut membership = MockMembershipApi::new();
        membership
            .expect_list_members()
            .returning(|| Ok(vec![linked_member(&["O1"])]));
        membership
            .expect_retrieve_member()
            .returning(|_| Ok(linked_member(&["O1"])));
        membership.expect_update_member().times(0);

        let outcome = reconciler(payments, membership)
            .handle_event(&completed_event("O1"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Skipped(SkipReason::AlreadyRecorded)
        );
    }

    #[tokio::test]
    async fn non_trigger_event_is_ignored_without_any_calls() {
        let mut payments = MockPaymentsApi::new();
        payments.expect_retrieve_order().times(0);
        let membership = MockMembershipApi::new();

        let event: WebhookEvent =
            serde_json::from_value(json!({ "type": "order.updated" })).unwrap();
        let outcome = reconciler(payments, membership)
            .handle_event(&event)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Skipped(SkipReason::NotCompletedPayment)
        );
    }

    #[tokio::test]
    async fn incomplete_order_is_skipped() {
        let mut payments = MockPaymentsApi::new();
        payments
            .expect_retrieve_order()
            .returning(|_| Ok(soda_order("OPEN")));
        let mut membership = MockMembershipApi::new();
        membership.expect_update_member().times(0);

        let outcome = reconciler(payments, membership)
            .handle_event(&completed_event("O1"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Skipped(SkipReason::OrderNotCompleted)
        );
    }

    #[tokio::test]
    async fn unmatched_customer_is_skipped() {
        let mut payments = MockPaymentsApi::new();
        payments
            .expect_retrieve_order()
            .returning(|_| Ok(soda_order("COMPLETED")));
        let mut membership = MockMembershipApi::new();
        membership.expect_list_members().returning(|| Ok(vec![]));
        membership.expect_update_member().times(0);

        let outcome = reconciler(payments, membership)
            .handle_event(&completed_event("O1"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Skipped(SkipReason::MemberNotFound));
    }

    #[tokio::test]
    async fn order_fetch_failure_propagates() {
        let mut payments = MockPaymentsApi::new();
        payments
            .expect_retrieve_order()
            .returning(|_| Err(ServiceError::ExternalServiceError("timeout".into())));
        let membership = MockMembershipApi::new();

        let result = reconciler(payments, membership)
            .handle_event(&completed_event("O1"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn existing_ledger_content_is_preserved_on_merge() {
        let mut payments = MockPaymentsApi::new();
        payments
            .expect_retrieve_order()
            .returning(|_| Ok(soda_order("COMPLETED")));

        let mut membership = MockMembershipApi::new();
        membership
            .expect_list_members()
            .returning(|| Ok(vec![linked_member(&["O0"])]));
        membership
            .expect_retrieve_member()
            .returning(|_| Ok(linked_member(&["O0"])));
        membership
            .expect_update_member()
            .withf(|_, update| {
                let orders = &update.json.as_ref().unwrap().orders;
                orders.len() == 2 && orders.contains_key("O0") && orders.contains_key("O1")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = reconciler(payments, membership)
            .handle_event(&completed_event("O1"))
            .await
            .unwrap();
        assert_matches!(outcome, ReconcileOutcome::Applied { .. });
    }
}
