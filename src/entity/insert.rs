use std::fmt;

use sqlx::{Executor, MySql};

use crate::entity::resolve::{join_columns, ColumnMap, ColumnMode};
use crate::entity::{Entity, EntityState};
use crate::insert::InsertExecutor;
use crate::statement::Binder;

/// Inserts one entity instance.
///
/// Generated and transient fields are left out; every other column takes the
/// value the instance holds, `None` binding as a typed null.
pub struct InsertEntityExecutor<'a, T> {
    state: EntityState<T>,
    entity: &'a T,
}

impl<T: 'static> fmt::Debug for InsertEntityExecutor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertEntityExecutor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Entity> InsertEntityExecutor<'a, T> {
    /// # Errors
    ///
    /// Fails if `T` is not marked as an entity.
    pub fn new(entity: &'a T) -> crate::Result<Self> {
        Ok(Self {
            state: EntityState::new()?,
            entity,
        })
    }

    /// Inserts only the columns of the named fields.
    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.filter_mut().include(fields);
        self
    }

    /// Leaves out the columns of the named fields.
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.filter_mut().exclude(fields);
        self
    }

    /// The `INSERT` this executor runs.
    pub fn sql(&self) -> crate::Result<String> {
        let columns = self.state.columns(ColumnMode::Insert)?;
        Ok(self.render(&columns))
    }

    /// Inserts the entity and returns the number of rows inserted.
    pub async fn insert<'e, E>(self, executor: E) -> crate::Result<u64>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.build()?.execute(executor).await
    }

    /// Inserts the entity and returns the key the database generated.
    pub async fn insert_for_key<'e, E>(self, executor: E) -> crate::Result<u64>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.build()?.execute_for_key(executor).await
    }

    fn build(&self) -> crate::Result<InsertExecutor> {
        let columns = self.state.columns(ColumnMode::Insert)?;
        let sql = self.render(&columns);
        tracing::debug!(%sql, "INSERT");

        self.state
            .values(self.entity, &columns)?
            .into_iter()
            .try_fold(InsertExecutor::new(sql)?, |insert, (column, value)| {
                insert.bind(&column, value)
            })
    }

    fn render(&self, columns: &ColumnMap) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.state.table(),
            join_columns(columns.keys(), ", ", ""),
            join_columns(columns.keys(), ", ", ":")
        )
    }
}
