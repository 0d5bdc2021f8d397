//! # Transaction Scope
//!
//! An explicit handle for one unit of work. Writes that must share a
//! transaction take `&mut TxScope`; nothing about transactions lives on
//! the repositories themselves.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      TxScope Lifecycle                                  │
//! │                                                                         │
//! │              begin_if_needed() → true                                   │
//! │   ┌──────────┐ ─────────────────────► ┌───────────────┐                │
//! │   │  Idle    │                         │ InTransaction │──┐             │
//! │   │ tx: None │ ◄───────────────────── │ tx: Some(..)  │  │ begin_if_   │
//! │   └──────────┘   commit() / rollback() └───────────────┘◄─┘ needed()   │
//! │        │          (state cleared even        │              → false     │
//! │        │           when they fail)           │                          │
//! │        ▼                                     ▼                          │
//! │   commit() → Err(NoActiveTransaction)   dropped → rolled back by sqlx  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Owner Pattern
//! Self-contained writes (images, store updates) call
//! [`TxScope::begin_if_needed`] and remember whether they opened the
//! transaction. Only the owner settles it, so several writes can be
//! composed inside one caller-managed transaction without double commits:
//!
//! ```rust,ignore
//! let mut scope = db.scope();
//! scope.begin_if_needed().await?;                 // caller owns it
//! db.products().upsert_products(&mut scope, &products).await?;
//! db.images().upsert_images(&mut scope, &images).await?; // not owner
//! scope.commit().await?;                          // one commit
//! ```
//!
//! A scope is `Send` but not meant to be shared; each request gets its own.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// One unit of work against the pool.
#[derive(Debug)]
pub struct TxScope {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl TxScope {
    /// Creates an idle scope. No connection is taken until a transaction begins.
    pub fn new(pool: SqlitePool) -> Self {
        TxScope { pool, tx: None }
    }

    /// Whether a transaction is currently open.
    pub fn is_active(&self) -> bool {
        self.tx.is_some()
    }

    /// Opens a transaction unless one is already open.
    ///
    /// ## Returns
    /// * `Ok(true)` - this call opened it; the caller owns commit/rollback
    /// * `Ok(false)` - already open; the caller must leave it alone
    pub async fn begin_if_needed(&mut self) -> DbResult<bool> {
        if self.tx.is_some() {
            return Ok(false);
        }

        let tx = self.pool.begin().await.map_err(DbError::from_transaction)?;
        self.tx = Some(tx);
        debug!("Transaction started");
        Ok(true)
    }

    /// Commits the open transaction.
    ///
    /// The commit is attempted exactly once and the scope is idle afterwards
    /// whether or not it succeeded.
    ///
    /// ## Errors
    /// * `DbError::NoActiveTransaction` - nothing to commit
    /// * `DbError::ForeignKeyViolation` - a deferred constraint failed at commit
    /// * `DbError::Busy` - another connection holds the write lock
    /// * `DbError::TransactionFailed` - the database refused the commit
    pub async fn commit(&mut self) -> DbResult<()> {
        let tx = self.tx.take().ok_or(DbError::NoActiveTransaction)?;

        tx.commit()
            .await
            .map_err(DbError::from_transaction)?;

        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls back the open transaction, if any. Always leaves the scope idle.
    pub async fn rollback(&mut self) -> DbResult<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };

        tx.rollback()
            .await
            .map_err(DbError::from_transaction)?;

        debug!("Transaction rolled back");
        Ok(())
    }

    /// Connection of the open transaction.
    ///
    /// Fails with `NoActiveTransaction` when the scope is idle; this is how
    /// product upserts refuse to run outside a caller-opened transaction.
    pub(crate) fn connection(&mut self) -> DbResult<&mut SqliteConnection> {
        self.tx.as_deref_mut().ok_or(DbError::NoActiveTransaction)
    }

    /// Finishes an owner-pattern write.
    ///
    /// Non-owners get `result` back untouched. Owners commit on success and
    /// roll back on failure; a failed rollback is logged and the original
    /// error is returned.
    pub(crate) async fn settle<T>(&mut self, owned: bool, result: DbResult<T>) -> DbResult<T> {
        if !owned {
            return result;
        }

        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!(error = %rollback_err, cause = %err, "Rollback after failed write also failed");
                }
                Err(err)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    async fn category_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM product_categories")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn insert_category(scope: &mut TxScope, name: &str) {
        sqlx::query(
            "INSERT INTO product_categories (name, name_key, is_active, created_at, updated_at) \
             VALUES (?1, lower(?1), 1, datetime('now'), datetime('now'))",
        )
        .bind(name)
        .execute(scope.connection().unwrap())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_commit_without_begin_fails() {
        let db = test_db().await;
        let mut scope = db.scope();

        let err = scope.commit().await.unwrap_err();
        assert!(matches!(err, DbError::NoActiveTransaction));
        assert_eq!(err.to_string(), "no transaction to commit");
    }

    #[tokio::test]
    async fn test_second_begin_is_not_owner() {
        let db = test_db().await;
        let mut scope = db.scope();

        assert!(scope.begin_if_needed().await.unwrap());
        assert!(!scope.begin_if_needed().await.unwrap());
        assert!(scope.is_active());

        scope.commit().await.unwrap();
        assert!(!scope.is_active());

        // Idle again, so the next begin owns a fresh transaction.
        assert!(scope.begin_if_needed().await.unwrap());
        scope.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_rollback_discards_writes_and_clears_state() {
        let db = test_db().await;
        let mut scope = db.scope();

        scope.begin_if_needed().await.unwrap();
        insert_category(&mut scope, "Temporary").await;
        scope.rollback().await.unwrap();

        assert!(!scope.is_active());
        assert_eq!(category_count(db.pool()).await, 0);

        // Rolling back an idle scope is a no-op.
        scope.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_commit_clears_state_and_keeps_error_class() {
        let db = test_db().await;
        let mut scope = db.scope();

        scope.begin_if_needed().await.unwrap();
        sqlx::query("PRAGMA defer_foreign_keys = ON")
            .execute(scope.connection().unwrap())
            .await
            .unwrap();
        // Category 404 doesn't exist; the check only runs at COMMIT.
        sqlx::query(
            "INSERT INTO product_types (category_id, name, name_key, is_active, created_at, updated_at) \
             VALUES (404, 'Orphan', 'orphan', 1, datetime('now'), datetime('now'))",
        )
        .execute(scope.connection().unwrap())
        .await
        .unwrap();

        let err = scope.commit().await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(err.is_constraint_violation());
        assert!(!scope.is_active());

        // The scope is usable again and the orphan never landed.
        assert!(scope.begin_if_needed().await.unwrap());
        scope.rollback().await.unwrap();
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_types")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_connection_requires_transaction() {
        let db = test_db().await;
        let mut scope = db.scope();

        assert!(matches!(
            scope.connection(),
            Err(DbError::NoActiveTransaction)
        ));
    }

    #[tokio::test]
    async fn test_settle_commits_for_owner_only() {
        let db = test_db().await;
        let mut scope = db.scope();

        scope.begin_if_needed().await.unwrap();
        insert_category(&mut scope, "Kept").await;

        // A non-owner never settles.
        let value = scope.settle(false, Ok(7)).await.unwrap();
        assert_eq!(value, 7);
        assert!(scope.is_active());

        scope.settle(true, Ok(())).await.unwrap();
        assert!(!scope.is_active());
        assert_eq!(category_count(db.pool()).await, 1);
    }

    #[tokio::test]
    async fn test_settle_rolls_back_owner_on_error() {
        let db = test_db().await;
        let mut scope = db.scope();

        scope.begin_if_needed().await.unwrap();
        insert_category(&mut scope, "Dropped").await;

        let result: DbResult<()> = scope
            .settle(true, Err(DbError::not_found("Product", "x")))
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert!(!scope.is_active());
        assert_eq!(category_count(db.pool()).await, 0);
    }
}
