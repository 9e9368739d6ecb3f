//! Subscription assignment port.
//!
//! The grant algorithm belongs to the subscription system. Orders only
//! ask for a user to hold a plan for some number of days and get back
//! the identity of the new or extended subscription.

use async_trait::async_trait;

use super::TransactionContext;
use crate::domain::foundation::{DomainError, PlanId, SubscriptionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignSubscription {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub validity_days: i32,
    /// Acting user; `None` for system grants such as order settlement.
    pub assigned_by: Option<UserId>,
    pub notes: String,
}

#[async_trait]
pub trait SubscriptionAssigner: Send + Sync {
    /// Grants a new subscription or extends the user's current one.
    ///
    /// Runs inside `tx`; nothing is visible until the transaction commits.
    async fn assign_or_extend(
        &self,
        tx: &mut dyn TransactionContext,
        request: AssignSubscription,
    ) -> Result<SubscriptionId, DomainError>;
}
