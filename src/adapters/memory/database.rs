//! In-memory database with whole-database transactions.
//!
//! A transaction takes the database lock for its whole lifetime and works
//! on a private copy of the tables. Commit swaps the copy in; rollback or
//! drop throws it away. Writers are therefore fully serialized, which is
//! what gives concurrent activations of the same order a single winner.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use uuid::Uuid;

use super::subscriptions::SubscriptionRecord;
use crate::domain::foundation::{DomainError, ErrorCode, OrderId, SubscriptionId};
use crate::domain::order::Order;
use crate::ports::{TransactionContext, UnitOfWork};

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) orders: HashMap<OrderId, Order>,
    pub(crate) subscriptions: HashMap<SubscriptionId, SubscriptionRecord>,
}

/// Shared handle; clones see the same data.
#[derive(Clone)]
pub struct InMemoryDatabase {
    id: Uuid,
    tables: Arc<Mutex<Tables>>,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            tables: Arc::new(Mutex::new(Tables::default())),
        }
    }

    /// Locks the committed tables for a single non-transactional operation.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().await
    }

    /// Working tables of a transaction opened by this database.
    pub(crate) fn tables_in<'a>(
        &self,
        tx: &'a mut dyn TransactionContext,
    ) -> Result<&'a mut Tables, DomainError> {
        match tx.as_any_mut().downcast_mut::<InMemoryTransaction>() {
            Some(tx) if tx.database_id == self.id => Ok(&mut tx.working),
            _ => Err(foreign_transaction()),
        }
    }

    fn own(&self, tx: Box<dyn TransactionContext>) -> Result<InMemoryTransaction, DomainError> {
        let tx = tx
            .into_any()
            .downcast::<InMemoryTransaction>()
            .map_err(|_| foreign_transaction())?;
        if tx.database_id != self.id {
            return Err(foreign_transaction());
        }
        Ok(*tx)
    }
}

pub(crate) struct InMemoryTransaction {
    database_id: Uuid,
    committed: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl TransactionContext for InMemoryTransaction {
    fn as_any_mut(&mut self) -> &mut (dyn Any + Send) {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

#[async_trait]
impl UnitOfWork for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn TransactionContext>, DomainError> {
        let committed = self.tables.clone().lock_owned().await;
        let working = committed.clone();
        Ok(Box::new(InMemoryTransaction {
            database_id: self.id,
            committed,
            working,
        }))
    }

    async fn commit(&self, tx: Box<dyn TransactionContext>) -> Result<(), DomainError> {
        let InMemoryTransaction {
            mut committed,
            working,
            ..
        } = self.own(tx)?;
        *committed = working;
        Ok(())
    }

    async fn rollback(&self, tx: Box<dyn TransactionContext>) -> Result<(), DomainError> {
        drop(self.own(tx)?);
        Ok(())
    }
}

fn foreign_transaction() -> DomainError {
    DomainError::new(
        ErrorCode::ForeignTransaction,
        "transaction was not opened by this in-memory database",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PlanId, Timestamp, UserId};
    use crate::domain::order::{NewOrder, OrderNumber};
    use rust_decimal::Decimal;

    fn order() -> Order {
        let now = Timestamp::now();
        Order::create(
            NewOrder {
                user_id: UserId::new("user-1").unwrap(),
                plan_id: PlanId::new(1).unwrap(),
                payment_provider: "manual".to_string(),
                amount: Decimal::ONE,
                currency: "CNY".to_string(),
                validity_days: 30,
                notes: String::new(),
            },
            OrderNumber::generate(&now),
            now,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn commit_publishes_working_copy() {
        let db = InMemoryDatabase::new();
        let order = order();

        let mut tx = db.begin().await.unwrap();
        db.tables_in(tx.as_mut())
            .unwrap()
            .orders
            .insert(order.id, order.clone());
        db.commit(tx).await.unwrap();

        assert!(db.lock().await.orders.contains_key(&order.id));
    }

    #[tokio::test]
    async fn rollback_and_drop_discard_writes() {
        let db = InMemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        let first = order();
        db.tables_in(tx.as_mut()).unwrap().orders.insert(first.id, first);
        db.rollback(tx).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let second = order();
        db.tables_in(tx.as_mut()).unwrap().orders.insert(second.id, second);
        drop(tx);

        assert!(db.lock().await.orders.is_empty());
    }

    #[tokio::test]
    async fn transaction_from_other_database_is_rejected() {
        let db = InMemoryDatabase::new();
        let other = InMemoryDatabase::new();

        let mut tx = other.begin().await.unwrap();
        let err = db.tables_in(tx.as_mut()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ForeignTransaction);

        let err = db.commit(tx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ForeignTransaction);
    }
}
