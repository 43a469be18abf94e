//! Database transaction utilities
//!
//! Multi-step writes (an upload batch inserting assets, a photo and its
//! links) go through [`TransactionGuard`] so they either all land or none do.

use shoebox_core::AppError;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// A transaction that rolls back unless explicitly committed.
///
/// # Example
///
/// ```ignore
/// use shoebox_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::SqlitePool) -> Result<(), shoebox_core::AppError> {
///     let mut tx = TransactionGuard::begin(pool).await?;
///     sqlx::query("INSERT INTO ...").execute(&mut **tx.transaction()?).await?;
///     tx.commit().await
/// }
/// ```
pub struct TransactionGuard {
    transaction: Option<Transaction<'static, Sqlite>>,
}

impl TransactionGuard {
    /// Begin a new database transaction
    pub async fn begin(pool: &SqlitePool) -> Result<Self, AppError> {
        let transaction = pool.begin().await?;
        Ok(Self {
            transaction: Some(transaction),
        })
    }

    /// The open transaction, for repository `_tx` methods.
    pub fn transaction(&mut self) -> Result<&mut Transaction<'static, Sqlite>, AppError> {
        self.transaction.as_mut().ok_or_else(|| {
            AppError::Internal("transaction was already committed or rolled back".to_string())
        })
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        // sqlx queues a rollback when the inner transaction is dropped.
        if self.transaction.is_some() {
            tracing::debug!("Transaction dropped without commit - rolling back");
        }
    }
}
