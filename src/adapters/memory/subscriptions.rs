//! In-memory subscription store.
//!
//! Grants one subscription per user and plan. Assigning again while the
//! subscription is still running pushes its expiry out; assigning after
//! it lapsed starts a new term from now.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::database::InMemoryDatabase;
use crate::domain::foundation::{
    DomainError, ErrorCode, PlanId, SubscriptionId, Timestamp, UserId,
};
use crate::ports::{AssignSubscription, SubscriptionAssigner, TransactionContext};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub starts_at: Timestamp,
    pub expires_at: Timestamp,
    pub assigned_by: Option<UserId>,
    pub notes: String,
    pub updated_at: Timestamp,
}

#[derive(Clone)]
pub struct InMemorySubscriptionStore {
    database: InMemoryDatabase,
}

impl InMemorySubscriptionStore {
    pub fn new(database: InMemoryDatabase) -> Self {
        Self { database }
    }

    /// Committed subscription of `user_id` for `plan_id`, if any.
    pub async fn find(&self, user_id: &UserId, plan_id: PlanId) -> Option<SubscriptionRecord> {
        let tables = self.database.lock().await;
        tables
            .subscriptions
            .values()
            .find(|s| &s.user_id == user_id && s.plan_id == plan_id)
            .cloned()
    }

    pub async fn count(&self) -> usize {
        self.database.lock().await.subscriptions.len()
    }
}

#[async_trait]
impl SubscriptionAssigner for InMemorySubscriptionStore {
    async fn assign_or_extend(
        &self,
        tx: &mut dyn TransactionContext,
        request: AssignSubscription,
    ) -> Result<SubscriptionId, DomainError> {
        if request.validity_days <= 0 {
            return Err(DomainError::validation(
                "validity_days",
                format!("validity days must be positive, got {}", request.validity_days),
            ));
        }

        let tables = self.database.tables_in(tx)?;
        let now = Timestamp::now();
        let days = i64::from(request.validity_days);

        let existing = tables
            .subscriptions
            .values_mut()
            .find(|s| s.user_id == request.user_id && s.plan_id == request.plan_id);

        if let Some(subscription) = existing {
            let base = if subscription.expires_at.is_after(&now) {
                subscription.expires_at
            } else {
                subscription.starts_at = now;
                now
            };
            subscription.expires_at = expiry_after(base, days)?;
            subscription.assigned_by = request.assigned_by;
            subscription.notes = request.notes;
            subscription.updated_at = now;
            tracing::debug!(
                subscription_id = %subscription.id,
                user_id = %subscription.user_id,
                days,
                "extended subscription"
            );
            return Ok(subscription.id);
        }

        let record = SubscriptionRecord {
            id: SubscriptionId::new(),
            user_id: request.user_id,
            plan_id: request.plan_id,
            starts_at: now,
            expires_at: expiry_after(now, days)?,
            assigned_by: request.assigned_by,
            notes: request.notes,
            updated_at: now,
        };
        let id = record.id;
        tracing::debug!(subscription_id = %id, user_id = %record.user_id, days, "granted subscription");
        tables.subscriptions.insert(id, record);
        Ok(id)
    }
}

fn expiry_after(base: Timestamp, days: i64) -> Result<Timestamp, DomainError> {
    base.plus_days(days).ok_or_else(|| {
        DomainError::new(
            ErrorCode::OutOfRange,
            format!("extending by {} days passes the latest representable expiry", days),
        )
        .with_detail("field", "expires_at")
    })
}
