use indexmap::IndexMap;
use sqlx::{Acquire, MySql};

use crate::error::Error;
use crate::statement::{build, enrich, Binder, NamedStatement};
use crate::value::{SqlType, Value};

/// One committed set of bindings.
#[derive(Debug, Clone)]
struct BatchRow {
    bindings: IndexMap<String, Value>,
    arguments: Vec<Value>,
}

/// Executes one statement for several sets of bindings.
///
/// Bind every parameter, call [`BatchExecutor::add_batch`], and repeat; the
/// same names may be bound again after each `add_batch`. [`BatchExecutor::execute`]
/// runs the rows in order inside one transaction.
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_named_entity::prelude::*;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let counts = BatchExecutor::new("INSERT INTO times (year, month) VALUES (:year, :month)")?
///     .bind("year", 2010)?
///     .bind("month", 10)?
///     .add_batch()?
///     .bind("year", 2011)?
///     .bind("month", 11)?
///     .add_batch()?
///     .execute(&pool)
///     .await?;
/// assert_eq!(counts.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    statement: NamedStatement,
    rows: Vec<BatchRow>,
}

impl BatchExecutor {
    pub fn new<T>(template: T) -> crate::Result<Self>
    where
        T: Into<String>,
    {
        Ok(Self {
            statement: NamedStatement::new(template)?,
            rows: Vec::new(),
        })
    }

    pub(crate) fn with_null_type(mut self, null_type: SqlType) -> Self {
        self.statement = self.statement.with_null_type(null_type);
        self
    }

    /// Commits the current bindings as one row of the batch and clears them.
    ///
    /// # Errors
    ///
    /// Fails if any parameter is left unbound.
    pub fn add_batch(mut self) -> crate::Result<Self> {
        self.statement.ensure_fully_bound()?;
        let arguments = self.statement.arguments()?;
        self.rows.push(BatchRow {
            bindings: self.statement.bindings().clone(),
            arguments,
        });
        self.statement.clear();
        Ok(self)
    }

    /// Number of rows added so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Executes every row in `add_batch` order within one transaction and
    /// returns the affected-row count of each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBatch`] if `add_batch` was never called. A
    /// failing row rolls the transaction back and is reported with its own
    /// bindings.
    pub async fn execute<'c, A>(self, conn: A) -> crate::Result<Vec<u64>>
    where
        A: Acquire<'c, Database = MySql>,
    {
        if self.rows.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let template = self.statement.template();
        tracing::debug!(sql = %template, rows = self.rows.len(), "executing batch");

        let mut tx = conn.begin().await?;
        let mut counts = Vec::with_capacity(self.rows.len());
        for row in self.rows.iter() {
            let result = build(self.statement.sql(), row.arguments.clone())
                .execute(&mut *tx)
                .await
                .map_err(|e| enrich(template, &row.bindings, e))?;
            counts.push(result.rows_affected());
        }
        tx.commit().await?;

        Ok(counts)
    }
}

impl Binder for BatchExecutor {
    fn statement(&self) -> &NamedStatement {
        &self.statement
    }

    fn statement_mut(&mut self) -> &mut NamedStatement {
        &mut self.statement
    }
}
