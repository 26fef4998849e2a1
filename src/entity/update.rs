use std::fmt;

use sqlx::{Executor, MySql};

use crate::entity::resolve::{join_assignments, ColumnMap, ColumnMode};
use crate::entity::{Entity, EntityExecutor, EntityState};
use crate::statement::Binder;
use crate::update::UpdateExecutor;

/// Predicate placeholders are renamed so they never collide with the `SET`
/// placeholder of the same column. Underscores are appended while the
/// prefixed name would still clash with a written column.
const WHERE_PREFIX: &str = "where_";

/// Writes the current state of one entity instance.
///
/// Every persistent column is written, generated ones included. Predicates
/// select the rows to update; [`EntityExecutor::bind_id`] targets the row of
/// the instance itself.
///
/// ```
/// use sqlx_named_entity::prelude::*;
///
/// struct Times {
///     id: i64,
///     year: i32,
/// }
///
/// impl Entity for Times {
///     fn meta() -> EntityMeta<Self> {
///         EntityMeta::new(
///             TypeLayer::entity("Times")
///                 .table("times")
///                 .field(Field::new("id", |t: &Times| t.id.into()).primary_key())
///                 .field(Field::new("year", |t: &Times| t.year.into())),
///         )
///     }
/// }
///
/// let times = Times { id: 3, year: 2014 };
/// let update = UpdateEntityExecutor::new(&times)?.bind_id()?;
/// assert_eq!(update.sql()?, "UPDATE times SET id = :id, year = :year WHERE id = :where_id");
/// # Ok::<(), sqlx_named_entity::Error>(())
/// ```
pub struct UpdateEntityExecutor<'a, T> {
    state: EntityState<T>,
    entity: &'a T,
}

impl<T: 'static> fmt::Debug for UpdateEntityExecutor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateEntityExecutor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Entity> UpdateEntityExecutor<'a, T> {
    /// # Errors
    ///
    /// Fails if `T` is not marked as an entity.
    pub fn new(entity: &'a T) -> crate::Result<Self> {
        Ok(Self {
            state: EntityState::new()?,
            entity,
        })
    }

    /// Writes only the columns of the named fields.
    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.filter_mut().include(fields);
        self
    }

    /// Writes every column except those of the named fields.
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.filter_mut().exclude(fields);
        self
    }

    /// The `UPDATE` this executor runs.
    pub fn sql(&self) -> crate::Result<String> {
        let columns = self.state.columns(ColumnMode::All)?;
        Ok(self.render(&columns, &self.where_prefix(&columns)))
    }

    /// Runs the update and returns the number of rows updated.
    pub async fn update<'e, E>(self, executor: E) -> crate::Result<u64>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.build()?.execute(executor).await
    }

    fn build(&self) -> crate::Result<UpdateExecutor> {
        let columns = self.state.columns(ColumnMode::All)?;
        let prefix = self.where_prefix(&columns);
        let sql = self.render(&columns, &prefix);
        if self.state.params().is_empty() {
            tracing::warn!(%sql, "UPDATE without predicates affects every row");
        } else {
            tracing::debug!(%sql, "UPDATE");
        }

        let update = self
            .state
            .values(self.entity, &columns)?
            .into_iter()
            .try_fold(UpdateExecutor::new(sql)?, |update, (column, value)| {
                update.bind(&column, value)
            })?;
        self.state.bind_params(update, &prefix)
    }

    fn where_prefix(&self, columns: &ColumnMap) -> String {
        let mut prefix = WHERE_PREFIX.to_owned();
        while self
            .state
            .params()
            .keys()
            .any(|column| columns.contains_key(&format!("{prefix}{column}")))
        {
            prefix.push('_');
        }
        prefix
    }

    fn render(&self, columns: &ColumnMap, prefix: &str) -> String {
        format!(
            "UPDATE {} SET {}{}",
            self.state.table(),
            join_assignments(columns.keys(), ", ", ""),
            self.state.where_clause(prefix)
        )
    }
}

impl<T: Entity> EntityExecutor<T> for UpdateEntityExecutor<'_, T> {
    fn state(&self) -> &EntityState<T> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState<T> {
        &mut self.state
    }

    fn entity(&self) -> Option<&T> {
        Some(self.entity)
    }
}
