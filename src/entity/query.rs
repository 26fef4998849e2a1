use std::fmt;

use sqlx::mysql::MySqlRow;
use sqlx::{Executor, FromRow, MySql};

use crate::entity::resolve::{join_columns, ColumnMode};
use crate::entity::{Entity, EntityExecutor, EntityState};
use crate::handler::{EntityHandler, EntityListHandler};
use crate::query::QueryExecutor;
use crate::value::Value;

/// Selects entities by equality predicates.
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
/// let query = QueryEntityExecutor::<Times>::new()?.eq("year", 2010)?;
/// assert_eq!(query.sql()?, "SELECT id, year FROM times WHERE year = :year");
/// # Ok::<(), sqlx_named_entity::Error>(())
/// ```
pub struct QueryEntityExecutor<T> {
    state: EntityState<T>,
}

impl<T> Clone for QueryEntityExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for QueryEntityExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEntityExecutor")
            .field("state", &self.state)
            .finish()
    }
}

impl<T: Entity> QueryEntityExecutor<T> {
    /// # Errors
    ///
    /// Fails if `T` is not marked as an entity.
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            state: EntityState::new()?,
        })
    }

    /// Adds the predicate `property = value`.
    pub fn eq<V>(self, property: &str, value: V) -> crate::Result<Self>
    where
        V: Into<Value>,
    {
        self.bind(property, value)
    }

    /// Adds one equality predicate per pair.
    pub fn bind_map<I, K, V>(mut self, pairs: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (property, value) in pairs {
            self = self.bind(property.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Selects only the columns of the named fields.
    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.filter_mut().include(fields);
        self
    }

    /// Selects every column except those of the named fields.
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.filter_mut().exclude(fields);
        self
    }

    /// The `SELECT` this executor runs.
    pub fn sql(&self) -> crate::Result<String> {
        let columns = self.state.columns(ColumnMode::All)?;
        Ok(format!(
            "SELECT {} FROM {}{}",
            join_columns(columns.keys(), ", ", ""),
            self.state.table(),
            self.state.where_clause("")
        ))
    }

    /// Every matching entity.
    pub async fn list<'e, E>(self, executor: E) -> crate::Result<Vec<T>>
    where
        E: Executor<'e, Database = MySql>,
        for<'r> T: FromRow<'r, MySqlRow>,
    {
        self.build()?
            .execute(executor, EntityListHandler::<T>::new())
            .await
    }

    /// The first matching entity, if any.
    pub async fn unique_result<'e, E>(self, executor: E) -> crate::Result<Option<T>>
    where
        E: Executor<'e, Database = MySql>,
        for<'r> T: FromRow<'r, MySqlRow>,
    {
        self.build()?
            .execute(executor, EntityHandler::<T>::new())
            .await
    }

    fn build(&self) -> crate::Result<QueryExecutor> {
        let sql = self.sql()?;
        tracing::debug!(%sql, "SELECT");
        self.state.bind_params(QueryExecutor::new(sql)?, "")
    }
}

impl<T: Entity> EntityExecutor<T> for QueryEntityExecutor<T> {
    fn state(&self) -> &EntityState<T> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState<T> {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::{Times, Times2};
    use crate::error::{BindingError, MetadataError};
    use crate::statement::Binder;
    use crate::Error;

    #[test]
    fn test_select_all_columns() {
        let query = QueryEntityExecutor::<Times>::new().unwrap();
        assert_eq!(query.sql().unwrap(), "SELECT id, year, month FROM times");
    }

    #[test]
    fn test_select_with_predicates() {
        let query = QueryEntityExecutor::<Times>::new()
            .unwrap()
            .eq("year", 2010)
            .unwrap()
            .bind_map([("month", 10)])
            .unwrap();
        assert_eq!(
            query.sql().unwrap(),
            "SELECT id, year, month FROM times WHERE year = :year AND month = :month"
        );

        let raw = query.build().unwrap();
        assert_eq!(raw.statement().snapshot(), "year=2010 month=10");
        assert!(raw.statement().ensure_fully_bound().is_ok());
    }

    #[test]
    fn test_select_inherited_columns_by_override() {
        let query = QueryEntityExecutor::<Times2>::new()
            .unwrap()
            .exclude(["id"])
            .eq("createdBy", "alice")
            .unwrap();
        assert_eq!(
            query.sql().unwrap(),
            "SELECT year, created_by FROM times23 WHERE created_by = :created_by"
        );
    }

    #[test]
    fn test_include_wins() {
        let query = QueryEntityExecutor::<Times>::new()
            .unwrap()
            .exclude(["year"])
            .include(["year"]);
        assert_eq!(query.sql().unwrap(), "SELECT year FROM times");
    }

    #[test]
    fn test_empty_projection_fails() {
        let query = QueryEntityExecutor::<Times>::new().unwrap().include(["day"]);
        assert!(matches!(
            query.sql(),
            Err(Error::Metadata(MetadataError::NoColumns(_)))
        ));
    }

    #[test]
    fn test_queries_have_no_backing_entity() {
        let err = QueryEntityExecutor::<Times>::new()
            .unwrap()
            .bind_id()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Binding(BindingError::MissingEntity { ref property }) if property == "id"
        ));
    }

    #[test]
    fn test_unknown_property() {
        let err = QueryEntityExecutor::<Times>::new()
            .unwrap()
            .eq("day", 1)
            .unwrap_err();
        assert!(matches!(err, Error::Binding(BindingError::UnknownProperty { .. })));
    }
}
