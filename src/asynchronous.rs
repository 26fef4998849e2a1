//! Runs executors on a tokio runtime and hands back a future of the result.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use sqlx::MySqlPool;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::batch::BatchExecutor;
use crate::error::Error;
use crate::handler::RowHandler;
use crate::insert::InsertExecutor;
use crate::query::QueryExecutor;
use crate::update::UpdateExecutor;

/// Spawns executor terminal calls onto a runtime.
///
/// Each call moves the executor and a pool handle into a task and returns
/// immediately. Awaiting the returned [`Pending`] yields exactly what the
/// terminal call would have returned.
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_named_entity::prelude::*;
/// use sqlx_named_entity::AsyncExecutor;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let exec = AsyncExecutor::new(tokio::runtime::Handle::current());
/// let pending = exec.update(
///     UpdateExecutor::new("DELETE FROM times WHERE year < :year")?.bind("year", 2000)?,
///     pool.clone(),
/// );
/// let removed = pending.await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AsyncExecutor {
    handle: Handle,
}

impl AsyncExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    pub fn query<H>(&self, query: QueryExecutor, pool: MySqlPool, handler: H) -> Pending<H::Output>
    where
        H: RowHandler + Send + 'static,
        H::Output: Send + 'static,
    {
        self.spawn(async move { query.execute(&pool, handler).await })
    }

    pub fn update(&self, update: UpdateExecutor, pool: MySqlPool) -> Pending<u64> {
        self.spawn(async move { update.execute(&pool).await })
    }

    pub fn insert(&self, insert: InsertExecutor, pool: MySqlPool) -> Pending<u64> {
        self.spawn(async move { insert.execute(&pool).await })
    }

    pub fn insert_with<H>(
        &self,
        insert: InsertExecutor,
        pool: MySqlPool,
        handler: H,
    ) -> Pending<H::Output>
    where
        H: RowHandler + Send + 'static,
        H::Output: Send + 'static,
    {
        self.spawn(async move { insert.execute_with(&pool, handler).await })
    }

    pub fn batch(&self, batch: BatchExecutor, pool: MySqlPool) -> Pending<Vec<u64>> {
        self.spawn(async move { batch.execute(&pool).await })
    }

    fn spawn<T, F>(&self, work: F) -> Pending<T>
    where
        F: Future<Output = crate::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        Pending {
            task: self.handle.spawn(work),
        }
    }
}

/// The eventual result of a spawned terminal call.
///
/// A task that panicked or was cancelled resolves to [`Error::Join`].
#[derive(Debug)]
#[must_use = "the result of the execution is only observed by awaiting it"]
pub struct Pending<T> {
    task: JoinHandle<crate::Result<T>>,
}

impl<T> Future for Pending<T> {
    type Output = crate::Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(Error::Join(e))),
            Poll::Pending => Poll::Pending,
        }
    }
}
