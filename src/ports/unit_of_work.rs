//! Unit of work port.
//!
//! A transaction spans the order store and the subscription assigner.
//! Both accept the same `TransactionContext`; the adapter that issued it
//! downcasts to its own concrete type. Dropping a context without commit
//! rolls it back.
//!
//! # Example
//!
//! ```ignore
//! let mut tx = uow.begin().await?;
//! let order = orders.get_for_update(tx.as_mut(), &id).await?;
//! let sub = subscriptions.assign_or_extend(tx.as_mut(), request).await?;
//! orders.update_in(tx.as_mut(), &paid).await?;
//! uow.commit(tx).await?;
//! ```

use std::any::Any;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Opaque handle to an open transaction.
pub trait TransactionContext: Send {
    fn as_any_mut(&mut self) -> &mut (dyn Any + Send);

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Opens a transaction.
    async fn begin(&self) -> Result<Box<dyn TransactionContext>, DomainError>;

    /// Makes every write done through `tx` visible at once.
    async fn commit(&self, tx: Box<dyn TransactionContext>) -> Result<(), DomainError>;

    /// Discards every write done through `tx`.
    async fn rollback(&self, tx: Box<dyn TransactionContext>) -> Result<(), DomainError>;
}
