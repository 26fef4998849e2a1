use sqlx::{Executor, MySql, MySqlConnection};

use crate::handler::RowHandler;
use crate::statement::{close_after, Binder, NamedStatement};
use crate::value::SqlType;

/// A single-use `INSERT` with named placeholders.
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_named_entity::prelude::*;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let id = InsertExecutor::new("INSERT INTO users (name, email) VALUES (:name, :email)")?
///     .bind("name", "Alice")?
///     .bind_null("email")?
///     .execute_for_key(&pool)
///     .await?;
/// println!("Inserted user {}", id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InsertExecutor {
    statement: NamedStatement,
}

impl InsertExecutor {
    pub fn new<T>(template: T) -> crate::Result<Self>
    where
        T: Into<String>,
    {
        Ok(Self {
            statement: NamedStatement::new(template)?,
        })
    }

    pub(crate) fn with_null_type(mut self, null_type: SqlType) -> Self {
        self.statement = self.statement.with_null_type(null_type);
        self
    }

    /// Executes the insert and returns the number of rows inserted.
    pub async fn execute<'e, E>(self, executor: E) -> crate::Result<u64>
    where
        E: Executor<'e, Database = MySql>,
    {
        let result = self.statement.run(executor).await?;
        Ok(result.rows_affected())
    }

    /// Executes the insert and returns the key generated for the last row.
    pub async fn execute_for_key<'e, E>(self, executor: E) -> crate::Result<u64>
    where
        E: Executor<'e, Database = MySql>,
    {
        let result = self.statement.run(executor).await?;
        Ok(result.last_insert_id())
    }

    /// Executes the insert and hands the rows it produces to `handler`.
    ///
    /// Only statements that return rows, such as `INSERT ... RETURNING` on
    /// MariaDB, give the handler anything to read.
    pub async fn execute_with<'e, E, H>(self, executor: E, handler: H) -> crate::Result<H::Output>
    where
        E: Executor<'e, Database = MySql>,
        H: RowHandler,
    {
        let rows = self.statement.fetch(executor).await?;
        handler.handle(rows).map_err(|e| self.statement.enrich(e))
    }

    /// Like [`InsertExecutor::execute`], then closes `conn`.
    pub async fn execute_and_close(self, mut conn: MySqlConnection) -> crate::Result<u64> {
        let outcome = self.execute(&mut conn).await;
        close_after(conn, outcome).await
    }
}

impl Binder for InsertExecutor {
    fn statement(&self) -> &NamedStatement {
        &self.statement
    }

    fn statement_mut(&mut self) -> &mut NamedStatement {
        &mut self.statement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_binds_nulls() {
        let insert = InsertExecutor::new("INSERT INTO times (year, month) VALUES (:year, :month)")
            .unwrap()
            .with_null_type(SqlType::BigInt)
            .bind(":year", 2010)
            .unwrap()
            .bind_null("month")
            .unwrap();

        assert!(insert.statement().ensure_fully_bound().is_ok());
        assert_eq!(insert.statement().snapshot(), "year=2010 month=null");
    }
}
