use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::{Executor, MySql, MySqlConnection};

use crate::handler::RowHandler;
use crate::statement::{close_after, Binder, NamedStatement};
use crate::value::SqlType;

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// A single-use query that supports named placeholders.
///
/// Values are bound by name (see [`Binder`]); the query is built fresh on
/// execution, so nothing borrows the executor between calls. The rows are
/// handed to a [`RowHandler`] exactly once.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{FromRow, MySqlPool};
/// use sqlx_named_entity::prelude::*;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let users: Vec<User> = QueryExecutor::new("SELECT id, name FROM users WHERE age > :min_age")?
///     .bind("min_age", 18)?
///     .execute(&pool, EntityListHandler::<User>::new())
///     .await?;
/// println!("Found {} users", users.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    statement: NamedStatement,
}

impl QueryExecutor {
    /// Creates a new `QueryExecutor` from an SQL template.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQL template cannot be parsed.
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

    /// Executes the query and passes every row to `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unbound`](crate::Error::Unbound) before touching the
    /// database if any parameter is unbound. Database and handler failures
    /// are returned as [`Error::Execution`](crate::Error::Execution).
    pub async fn execute<'e, E, H>(self, executor: E, handler: H) -> crate::Result<H::Output>
    where
        E: Executor<'e, Database = MySql>,
        H: RowHandler,
    {
        let rows = self.statement.fetch(executor).await?;
        handler.handle(rows).map_err(|e| self.statement.enrich(e))
    }

    /// Like [`QueryExecutor::execute`], then closes `conn`.
    pub async fn execute_and_close<H>(
        self,
        mut conn: MySqlConnection,
        handler: H,
    ) -> crate::Result<H::Output>
    where
        H: RowHandler,
    {
        let outcome = self.execute(&mut conn, handler).await;
        close_after(conn, outcome).await
    }
}

impl Binder for QueryExecutor {
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
    use crate::Error;

    #[test]
    fn test_query_executor_new() {
        let result = QueryExecutor::new("SELECT * FROM users WHERE id = :id");
        assert!(result.is_ok());
    }

    #[test]
    fn test_query_executor_placeholder_order() {
        let query =
            QueryExecutor::new("SELECT * FROM users WHERE id = :id AND name = :name").unwrap();

        assert_eq!(
            query.statement().parsed().names().collect::<Vec<_>>(),
            vec!["id", "name"]
        );
        assert_eq!(query.statement().sql(), "SELECT * FROM users WHERE id = ? AND name = ?");
    }

    #[test]
    fn test_query_executor_bind_chain() {
        let query = QueryExecutor::new("SELECT * FROM times WHERE id = ?")
            .unwrap()
            .bind_array([1])
            .unwrap();
        assert!(query.statement().ensure_fully_bound().is_ok());

        let err = QueryExecutor::new("SELECT * FROM times WHERE id = :id")
            .unwrap()
            .bind_map([("id", 1), ("year", 2010)])
            .unwrap_err();
        assert!(matches!(err, Error::Binding(_)));
    }
}
