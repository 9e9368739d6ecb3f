//! In-memory plan catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::domain::order::Plan;
use crate::ports::PlanReader;

#[derive(Clone, Default)]
pub struct InMemoryPlanCatalog {
    plans: Arc<RwLock<HashMap<PlanId, Plan>>>,
}

impl InMemoryPlanCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let plans = plans.into_iter().map(|plan| (plan.id, plan)).collect();
        Self {
            plans: Arc::new(RwLock::new(plans)),
        }
    }

    /// Adds or replaces a plan.
    pub async fn insert(&self, plan: Plan) {
        self.plans.write().await.insert(plan.id, plan);
    }
}

#[async_trait]
impl PlanReader for InMemoryPlanCatalog {
    async fn get_plan(&self, id: PlanId) -> Result<Plan, DomainError> {
        self.plans.read().await.get(&id).cloned().ok_or_else(|| {
            DomainError::new(ErrorCode::PlanNotFound, format!("plan {} not found", id))
                .with_detail("id", id.to_string())
        })
    }

    async fn list_purchasable(&self) -> Result<Vec<Plan>, DomainError> {
        let mut plans: Vec<Plan> = self
            .plans
            .read()
            .await
            .values()
            .filter(|plan| plan.is_purchasable())
            .cloned()
            .collect();
        plans.sort_by_key(|plan| plan.id);
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{PlanStatus, PlanType};
    use rust_decimal_macros::dec;

    fn plan(id: i64, purchase_enabled: bool) -> Plan {
        Plan {
            id: PlanId::new(id).unwrap(),
            name: format!("Plan {}", id),
            status: PlanStatus::Active,
            plan_type: PlanType::Subscription,
            purchase_enabled,
            purchase_price: Some(dec!(9.90)),
            default_validity_days: 30,
        }
    }

    #[tokio::test]
    async fn get_plan_returns_plan_or_not_found() {
        let catalog = InMemoryPlanCatalog::with_plans([plan(1, true)]);
        assert_eq!(catalog.get_plan(PlanId::new(1).unwrap()).await.unwrap().name, "Plan 1");

        let err = catalog.get_plan(PlanId::new(2).unwrap()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanNotFound);
        assert_eq!(err.details.get("id"), Some(&"2".to_string()));
    }

    #[tokio::test]
    async fn list_purchasable_skips_disabled_plans() {
        let catalog = InMemoryPlanCatalog::new();
        catalog.insert(plan(2, true)).await;
        catalog.insert(plan(1, true)).await;
        catalog.insert(plan(3, false)).await;

        let ids: Vec<i64> = catalog
            .list_purchasable()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id.value())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
