use sqlx::{Executor, MySql, MySqlConnection};

use crate::statement::{close_after, Binder, NamedStatement};
use crate::value::SqlType;

/// A single-use `UPDATE`/`DELETE` (or any row-count statement) with named
/// placeholders.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_named_entity::prelude::*;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let updated = UpdateExecutor::new("UPDATE users SET name = :name WHERE id = :id")?
///     .bind("name", "Jane Doe")?
///     .bind("id", 42)?
///     .execute(&pool)
///     .await?;
/// println!("Updated {} rows", updated);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UpdateExecutor {
    statement: NamedStatement,
}

impl UpdateExecutor {
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

    /// Executes the statement and returns the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is unbound or the statement fails.
    pub async fn execute<'e, E>(self, executor: E) -> crate::Result<u64>
    where
        E: Executor<'e, Database = MySql>,
    {
        let result = self.statement.run(executor).await?;
        Ok(result.rows_affected())
    }

    /// Like [`UpdateExecutor::execute`], then closes `conn`.
    pub async fn execute_and_close(self, mut conn: MySqlConnection) -> crate::Result<u64> {
        let outcome = self.execute(&mut conn).await;
        close_after(conn, outcome).await
    }
}

impl Binder for UpdateExecutor {
    fn statement(&self) -> &NamedStatement {
        &self.statement
    }

    fn statement_mut(&mut self) -> &mut NamedStatement {
        &mut self.statement
    }
}
