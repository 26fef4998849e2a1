use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

use crate::asynchronous::AsyncExecutor;
use crate::batch::BatchExecutor;
use crate::config::Config;
use crate::entity::{
    DeleteEntityExecutor, Entity, InsertEntityExecutor, QueryEntityExecutor, UpdateEntityExecutor,
};
use crate::insert::InsertExecutor;
use crate::query::QueryExecutor;
use crate::update::UpdateExecutor;

/// Creates executors over one pool and configuration.
///
/// Raw executors created here bind untyped nulls with the configured
/// [`Config::null_type`].
///
/// ```rust,no_run
/// use sqlx_named_entity::prelude::*;
/// use sqlx_named_entity::{Config, QueryRunner};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let runner = QueryRunner::connect(&Config::from_env()?).await?;
/// let updated = runner
///     .update("UPDATE times SET month = :month WHERE year = :year")?
///     .bind_null("month")?
///     .bind("year", 2010)?
///     .execute(runner.pool())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueryRunner {
    pool: MySqlPool,
    config: Config,
}

impl QueryRunner {
    pub fn new(pool: MySqlPool, config: Config) -> Self {
        Self { pool, config }
    }

    /// Opens a pool as described by `config`.
    pub async fn connect(config: &Config) -> crate::Result<Self> {
        let pool = Self::pool_options(config)
            .connect(&config.database_url)
            .await?;
        tracing::info!(max_connections = config.max_connections, "connected to MySQL");
        Ok(Self::new(pool, config.clone()))
    }

    /// Like [`QueryRunner::connect`], but connections are only opened when
    /// first needed.
    pub fn connect_lazy(config: &Config) -> crate::Result<Self> {
        let pool = Self::pool_options(config).connect_lazy(&config.database_url)?;
        Ok(Self::new(pool, config.clone()))
    }

    fn pool_options(config: &Config) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn query<S: Into<String>>(&self, sql: S) -> crate::Result<QueryExecutor> {
        Ok(QueryExecutor::new(sql)?.with_null_type(self.config.null_type))
    }

    pub fn update<S: Into<String>>(&self, sql: S) -> crate::Result<UpdateExecutor> {
        Ok(UpdateExecutor::new(sql)?.with_null_type(self.config.null_type))
    }

    pub fn insert<S: Into<String>>(&self, sql: S) -> crate::Result<InsertExecutor> {
        Ok(InsertExecutor::new(sql)?.with_null_type(self.config.null_type))
    }

    pub fn batch<S: Into<String>>(&self, sql: S) -> crate::Result<BatchExecutor> {
        Ok(BatchExecutor::new(sql)?.with_null_type(self.config.null_type))
    }

    pub fn query_entity<T: Entity>(&self) -> crate::Result<QueryEntityExecutor<T>> {
        QueryEntityExecutor::new()
    }

    pub fn insert_entity<'a, T: Entity>(
        &self,
        entity: &'a T,
    ) -> crate::Result<InsertEntityExecutor<'a, T>> {
        InsertEntityExecutor::new(entity)
    }

    pub fn update_entity<'a, T: Entity>(
        &self,
        entity: &'a T,
    ) -> crate::Result<UpdateEntityExecutor<'a, T>> {
        UpdateEntityExecutor::new(entity)
    }

    pub fn delete_entity<'a, T: Entity>(&self) -> crate::Result<DeleteEntityExecutor<'a, T>> {
        DeleteEntityExecutor::new()
    }

    /// An [`AsyncExecutor`] on the caller's runtime, if there is one.
    pub fn async_executor(&self) -> Option<AsyncExecutor> {
        AsyncExecutor::current()
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::Times;
    use crate::statement::Binder;
    use crate::value::{SqlType, Value};

    fn runner(null_type: SqlType) -> QueryRunner {
        let config = Config::new("mysql://root@localhost/unused").with_null_type(null_type);
        QueryRunner::connect_lazy(&config).unwrap()
    }

    #[tokio::test]
    async fn test_raw_executors_use_configured_null_type() {
        let runner = runner(SqlType::BigInt);

        let update = runner.update("UPDATE times SET month = :month").unwrap().bind_null("month").unwrap();
        assert_eq!(
            update.statement().bindings().get("month"),
            Some(&Value::Null(SqlType::BigInt))
        );

        let batch = runner.batch("INSERT INTO times (month) VALUES (:month)").unwrap().bind_null("month").unwrap();
        assert_eq!(
            batch.statement().bindings().get("month"),
            Some(&Value::Null(SqlType::BigInt))
        );
    }

    #[tokio::test]
    async fn test_entity_factories() {
        let runner = runner(SqlType::Varchar);
        let times = Times {
            id: 1,
            year: 2010,
            month: Some(10),
        };

        assert_eq!(
            runner.query_entity::<Times>().unwrap().sql().unwrap(),
            "SELECT id, year, month FROM times"
        );
        assert_eq!(
            runner.insert_entity(&times).unwrap().sql().unwrap(),
            "INSERT INTO times (year, month) VALUES (:year, :month)"
        );
        assert_eq!(
            runner.update_entity(&times).unwrap().sql().unwrap(),
            "UPDATE times SET id = :id, year = :year, month = :month"
        );
        assert_eq!(runner.delete_entity::<Times>().unwrap().sql(), "DELETE FROM times");
        assert!(runner.async_executor().is_some());
        assert_eq!(runner.config().max_connections, 5);
    }
}
