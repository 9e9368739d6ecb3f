//! Plan catalog port (read side).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PlanId};
use crate::domain::order::Plan;

#[async_trait]
pub trait PlanReader: Send + Sync {
    /// Fails with `PlanNotFound` if the plan does not exist.
    async fn get_plan(&self, id: PlanId) -> Result<Plan, DomainError>;

    /// Plans that currently pass every purchase precondition.
    async fn list_purchasable(&self) -> Result<Vec<Plan>, DomainError>;
}
