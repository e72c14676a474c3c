//! Order Status Workflow
//!
//! ```text
//! PENDING ─▶ PREPARING ─▶ READY ─▶ DELIVERED
//!    │
//!    └─────▶ CANCELLED
//! ```
//!
//! Transitions are a compare-and-swap on the status column. When another
//! request moved the order first, the new state is re-read and the request
//! is validated again against it.
//!
//! Entering READY or CANCELLED leaves a notice for the order's owner. The
//! notice is written after the status change and never undoes it.

use shared::models::{NotificationKind, OrderDetail, OrderStatus, Role};
use sqlx::SqlitePool;

use super::{OrderError, query};
use crate::auth::Capability;
use crate::db::repository::order as repo;
use crate::notifications::{Notifier, order_status_notice};

/// Re-reads allowed after losing a compare-and-swap
const MAX_CAS_ATTEMPTS: usize = 5;

/// The one forward successor of `status`, if any
pub const fn next_status(status: OrderStatus) -> Option<OrderStatus> {
    match status {
        OrderStatus::Pending => Some(OrderStatus::Preparing),
        OrderStatus::Preparing => Some(OrderStatus::Ready),
        OrderStatus::Ready => Some(OrderStatus::Delivered),
        OrderStatus::Delivered | OrderStatus::Cancelled => None,
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    next_status(from) == Some(to) || (from == OrderStatus::Pending && to == OrderStatus::Cancelled)
}

#[derive(Clone)]
pub struct OrderWorkflow {
    pool: SqlitePool,
    notifier: Notifier,
}

impl OrderWorkflow {
    pub fn new(pool: SqlitePool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// Move `order_id` to `target` on behalf of a caller with `caller_role`
    pub async fn advance_order(
        &self,
        order_id: i64,
        caller_role: Role,
        target: OrderStatus,
    ) -> Result<OrderDetail, OrderError> {
        if !Capability::AdvanceOrder.allows(caller_role) {
            return Err(OrderError::Forbidden);
        }

        for _ in 0..MAX_CAS_ATTEMPTS {
            let order = repo::find_by_id(&self.pool, order_id)
                .await?
                .ok_or(OrderError::NotFound(order_id))?;

            if !can_transition(order.status, target) {
                return Err(OrderError::InvalidTransition {
                    from: order.status,
                    to: target,
                });
            }

            if repo::update_status_if(&self.pool, order_id, order.status, target).await? {
                tracing::info!(
                    order_id,
                    order_number = %order.order_number,
                    from = %order.status,
                    to = %target,
                    role = %caller_role,
                    "Order status changed"
                );
                if let Some((title, message)) = order_status_notice(&order, target)
                    && let Err(e) = self
                        .notifier
                        .notify(order.user_id, NotificationKind::Order, &title, &message)
                        .await
                {
                    tracing::warn!(order_id, error = %e, "Failed to store order notification");
                }
                return query::load_detail(&self.pool, order_id).await;
            }

            tracing::debug!(order_id, expected = %order.status, "Status changed concurrently, re-reading");
        }

        Err(OrderError::Contended(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL: [OrderStatus; 5] = [Pending, Preparing, Ready, Delivered, Cancelled];

    #[test]
    fn test_forward_chain() {
        assert!(can_transition(Pending, Preparing));
        assert!(can_transition(Preparing, Ready));
        assert!(can_transition(Ready, Delivered));
    }

    #[test]
    fn test_cancel_only_from_pending() {
        assert!(can_transition(Pending, Cancelled));
        for from in [Preparing, Ready, Delivered, Cancelled] {
            assert!(!can_transition(from, Cancelled), "{from} -> CANCELLED");
        }
    }

    #[test]
    fn test_no_skips_or_backwards() {
        assert!(!can_transition(Pending, Ready));
        assert!(!can_transition(Pending, Delivered));
        assert!(!can_transition(Preparing, Delivered));
        assert!(!can_transition(Ready, Preparing));
        assert!(!can_transition(Delivered, Pending));
    }

    #[test]
    fn test_same_state_rejected() {
        for s in ALL {
            assert!(!can_transition(s, s), "{s} -> {s}");
        }
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for to in ALL {
            assert!(!can_transition(Delivered, to));
            assert!(!can_transition(Cancelled, to));
        }
    }

    #[test]
    fn test_exactly_four_legal_edges() {
        let edges = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| can_transition(*from, *to))
            .count();
        assert_eq!(edges, 4);
    }
}
