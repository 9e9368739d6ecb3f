//! ListPlansHandler - Plans a user can buy right now.

use std::sync::Arc;

use crate::domain::order::{OrderError, Plan};
use crate::ports::PlanReader;

pub struct ListPlansHandler {
    plans: Arc<dyn PlanReader>,
}

impl ListPlansHandler {
    pub fn new(plans: Arc<dyn PlanReader>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self) -> Result<Vec<Plan>, OrderError> {
        Ok(self.plans.list_purchasable().await?)
    }
}
