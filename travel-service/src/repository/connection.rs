//! Where repository statements run: the shared pool or one open transaction
//!
//! A [`TransactionContext`] is a cheap, cloneable handle to a single
//! PostgreSQL transaction. Every repository built on it shares the same
//! transaction, and statements are serialized through its mutex.
//!
//! Savepoints are numbered from a per-transaction sequence, so every name is
//! unique. They still nest as a stack: one opened after another must be
//! released or rolled back first. A savepoint discarded together with an
//! outer one fails loudly when it is closed later.

use std::fmt;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use sqlx::{pool::PoolConnection, Executor, PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};

const FINISHED: &str = "transaction already finished";

type Slot = Option<Transaction<'static, Postgres>>;

/// Shared handle to an open transaction
#[derive(Clone)]
pub struct TransactionContext {
    inner: Arc<Mutex<Slot>>,
    depth: Arc<AtomicUsize>,
    sequence: Arc<AtomicUsize>,
}

/// A named savepoint inside a [`TransactionContext`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savepoint {
    name: String,
}

impl Savepoint {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TransactionContext {
    /// Open a transaction on the pool
    pub async fn begin(pool: &PgPool) -> RepositoryResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Transaction, e))?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(tx))),
            depth: Arc::new(AtomicUsize::new(0)),
            sequence: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Whether commit or rollback has not happened yet
    pub async fn is_active(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Number of savepoints currently open
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub async fn commit(&self) -> RepositoryResult<()> {
        let tx = self.take().await?;
        tx.commit()
            .await
            .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Transaction, e))
    }

    pub async fn rollback(&self) -> RepositoryResult<()> {
        let tx = self.take().await?;
        tx.rollback()
            .await
            .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Transaction, e))
    }

    pub async fn savepoint(&self) -> RepositoryResult<Savepoint> {
        let number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.depth.fetch_add(1, Ordering::SeqCst);
        let savepoint = Savepoint {
            name: format!("uow_sp_{number}"),
        };

        if let Err(e) = self.run(format!("SAVEPOINT {}", savepoint.name)).await {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(e);
        }
        Ok(savepoint)
    }

    pub async fn release(&self, savepoint: Savepoint) -> RepositoryResult<()> {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        self.run(format!("RELEASE SAVEPOINT {}", savepoint.name))
            .await
    }

    /// Undo everything since the savepoint and discard it
    pub async fn rollback_to(&self, savepoint: Savepoint) -> RepositoryResult<()> {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        self.run(format!("ROLLBACK TO SAVEPOINT {}", savepoint.name))
            .await?;
        self.run(format!("RELEASE SAVEPOINT {}", savepoint.name))
            .await
    }

    async fn take(&self) -> RepositoryResult<Transaction<'static, Postgres>> {
        self.inner
            .lock()
            .await
            .take()
            .ok_or_else(|| RepositoryError::connection(RepositoryOperation::Transaction, FINISHED))
    }

    async fn run(&self, sql: String) -> RepositoryResult<()> {
        let mut guard = self.lock(RepositoryOperation::Transaction).await?;
        (&mut *guard)
            .execute(sql.as_str())
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Transaction, e))
    }

    async fn lock(
        &self,
        operation: RepositoryOperation,
    ) -> RepositoryResult<MappedMutexGuard<'_, PgConnection>> {
        MutexGuard::try_map(self.inner.lock().await, |slot| slot.as_mut().map(|tx| &mut **tx))
            .map_err(|_| RepositoryError::connection(operation, FINISHED))
    }
}

impl fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionContext")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

/// Pool or transaction a repository sends its statements to
#[derive(Debug, Clone)]
pub enum Connection {
    Pool(PgPool),
    Transaction(TransactionContext),
}

impl Connection {
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    /// Get exclusive use of a connection for one statement
    pub async fn acquire(&self, operation: RepositoryOperation) -> RepositoryResult<Handle<'_>> {
        match self {
            Self::Pool(pool) => pool
                .acquire()
                .await
                .map(Handle::Pooled)
                .map_err(|e| RepositoryError::from_sqlx(operation, e)),
            Self::Transaction(ctx) => ctx.lock(operation).await.map(Handle::Transaction),
        }
    }
}

impl From<PgPool> for Connection {
    fn from(pool: PgPool) -> Self {
        Self::Pool(pool)
    }
}

impl From<TransactionContext> for Connection {
    fn from(ctx: TransactionContext) -> Self {
        Self::Transaction(ctx)
    }
}

/// A connection checked out by [`Connection::acquire`]
pub enum Handle<'a> {
    Pooled(PoolConnection<Postgres>),
    Transaction(MappedMutexGuard<'a, PgConnection>),
}

impl Handle<'_> {
    pub fn executor(&mut self) -> &mut PgConnection {
        match self {
            Self::Pooled(conn) => &mut **conn,
            Self::Transaction(tx) => &mut **tx,
        }
    }
}
