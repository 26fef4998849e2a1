use std::collections::BTreeMap;

use indexmap::IndexMap;
use sqlx::mysql::{MySqlQueryResult, MySqlRow};
use sqlx::{Connection, Executor, MySql, MySqlConnection};

use crate::builder::ParsedSql;
use crate::error::{BindingError, Error};
use crate::query::Q;
use crate::value::{SqlType, Value};

/// Named-parameter bindings over one parsed SQL template.
///
/// This is the state every executor in the crate wraps: the parsed
/// statement, the values bound by name, and any raw positional values.
/// Each name may be bound once per cycle; [`NamedStatement::clear`] starts a
/// new cycle.
///
/// # Examples
///
/// ```
/// use sqlx_named_entity::NamedStatement;
///
/// let mut stmt = NamedStatement::new("select * from times where year = :y and month = :y")?;
/// stmt.bind("y", 2010)?;
/// stmt.ensure_fully_bound()?;
/// assert_eq!(stmt.sql(), "select * from times where year = ? and month = ?");
/// # Ok::<(), sqlx_named_entity::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct NamedStatement {
    parsed: ParsedSql,
    bound: IndexMap<String, Value>,
    positional: BTreeMap<usize, Value>,
    null_type: SqlType,
}

impl NamedStatement {
    /// Parses `template` into a statement with nothing bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQL template cannot be parsed.
    pub fn new<T>(template: T) -> crate::Result<Self>
    where
        T: Into<String>,
    {
        Ok(Self {
            parsed: ParsedSql::parse(template)?,
            bound: IndexMap::new(),
            positional: BTreeMap::new(),
            null_type: SqlType::default(),
        })
    }

    /// Sets the type used by [`NamedStatement::bind_null`].
    pub fn with_null_type(mut self, null_type: SqlType) -> Self {
        self.null_type = null_type;
        self
    }

    /// The rewritten statement sent to the database.
    pub fn sql(&self) -> &str {
        self.parsed.sql()
    }

    /// The template as given, with named placeholders.
    pub fn template(&self) -> &str {
        self.parsed.template()
    }

    pub fn parsed(&self) -> &ParsedSql {
        &self.parsed
    }

    /// Values bound by name in the current cycle.
    pub fn bindings(&self) -> &IndexMap<String, Value> {
        &self.bound
    }

    /// Binds `value` to every position of `name`.
    ///
    /// `name` may be given with or without its leading colon.
    ///
    /// # Errors
    ///
    /// Fails if the template does not declare `name`, or if `name` was
    /// already bound in this cycle. The existing binding is left untouched.
    pub fn bind<V>(&mut self, name: &str, value: V) -> crate::Result<()>
    where
        V: Into<Value>,
    {
        let name = self.check_bindable(name)?;
        self.bound.insert(name, value.into());
        Ok(())
    }

    /// Binds a null typed with the statement's default null type.
    pub fn bind_null(&mut self, name: &str) -> crate::Result<()> {
        self.bind_null_typed(name, self.null_type)
    }

    /// Binds a null of `sql_type` to every position of `name`.
    pub fn bind_null_typed(&mut self, name: &str, sql_type: SqlType) -> crate::Result<()> {
        let name = self.check_bindable(name)?;
        self.bound.insert(name, Value::Null(sql_type));
        Ok(())
    }

    /// Binds `value` directly to the 1-based `position`, bypassing name
    /// validation.
    ///
    /// Meant for templates written with raw `?` markers. A value bound this
    /// way overrides a named binding at the same position.
    pub fn bind_at<V>(&mut self, position: usize, value: V) -> crate::Result<()>
    where
        V: Into<Value>,
    {
        let count = self.parsed.placeholder_count();
        if position == 0 || position > count {
            return Err(BindingError::InvalidPosition { position, count }.into());
        }
        self.positional.insert(position, value.into());
        Ok(())
    }

    /// Fails with every declared name that has no value yet.
    pub fn ensure_fully_bound(&self) -> crate::Result<()> {
        // if the sizes are the same, then we've filled all the parameters
        if self.bound.len() == self.parsed.param_count() {
            return Ok(());
        }

        let unbound: Vec<String> = self
            .parsed
            .names()
            .filter(|name| !self.bound.contains_key(*name))
            .map(str::to_owned)
            .collect();
        Err(Error::Unbound(unbound))
    }

    /// Forgets every value bound in the current cycle.
    pub fn clear(&mut self) {
        self.bound.clear();
        self.positional.clear();
    }

    /// The `name=value` pairs of the current cycle, as shown in errors.
    pub fn snapshot(&self) -> String {
        format_bindings(&self.bound)
    }

    /// Assembles the positional argument list.
    pub(crate) fn arguments(&self) -> crate::Result<Vec<Value>> {
        let mut slots: Vec<Option<Value>> = vec![None; self.parsed.placeholder_count()];

        for (name, value) in &self.bound {
            for &position in self.parsed.positions(name).unwrap_or_default() {
                slots[position - 1] = Some(value.clone());
            }
        }
        for (&position, value) in &self.positional {
            slots[position - 1] = Some(value.clone());
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or_else(|| BindingError::PositionNotBound(i + 1).into()))
            .collect()
    }

    /// Validates the bindings and builds a fresh sqlx query.
    pub(crate) fn query(&self) -> crate::Result<Q<'_>> {
        self.ensure_fully_bound()?;
        let arguments = self.arguments()?;
        Ok(build(self.sql(), arguments))
    }

    /// Runs the statement for its affected-row count.
    pub(crate) async fn run<'e, E>(&self, executor: E) -> crate::Result<MySqlQueryResult>
    where
        E: Executor<'e, Database = MySql>,
    {
        let q = self.query()?;
        tracing::debug!(sql = %self.template(), params = self.parsed.placeholder_count(), "executing statement");
        q.execute(executor).await.map_err(|e| self.enrich(e))
    }

    /// Runs the statement and collects every row it produces.
    pub(crate) async fn fetch<'e, E>(&self, executor: E) -> crate::Result<Vec<MySqlRow>>
    where
        E: Executor<'e, Database = MySql>,
    {
        let q = self.query()?;
        tracing::debug!(sql = %self.template(), params = self.parsed.placeholder_count(), "executing query");
        q.fetch_all(executor).await.map_err(|e| self.enrich(e))
    }

    /// Wraps a database error with the template and the current bindings.
    pub(crate) fn enrich(&self, source: sqlx::Error) -> Error {
        enrich(self.template(), &self.bound, source)
    }
}

/// Binds `arguments` in order onto a query over `sql`.
pub(crate) fn build(sql: &str, arguments: Vec<Value>) -> Q<'_> {
    arguments
        .into_iter()
        .fold(sqlx::query::<MySql>(sql), |q, value| value.bind_to(q))
}

pub(crate) fn enrich(sql: &str, bound: &IndexMap<String, Value>, source: sqlx::Error) -> Error {
    Error::Execution {
        sql: sql.to_owned(),
        params: format_bindings(bound),
        source,
    }
}

fn format_bindings(bound: &IndexMap<String, Value>) -> String {
    bound
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl NamedStatement {
    fn check_bindable(&self, name: &str) -> crate::Result<String> {
        // so we can take ":name" or "name"
        let name = name.strip_prefix(':').unwrap_or(name);

        if !self.parsed.contains(name) {
            return Err(BindingError::UnknownParameter {
                name: name.to_owned(),
                sql: self.template().to_owned(),
            }
            .into());
        }

        if let Some(existing) = self.bound.get(name) {
            return Err(BindingError::AlreadyBound {
                name: name.to_owned(),
                value: existing.to_string(),
            }
            .into());
        }

        Ok(name.to_owned())
    }
}

/// Fluent binding shared by every raw executor.
///
/// Methods consume and return the executor so calls chain with `?`:
///
/// ```
/// use sqlx_named_entity::prelude::*;
///
/// let query = QueryExecutor::new("select * from times where year = :year and month = :month")?
///     .bind("year", 2010)?
///     .bind_null("month")?;
/// assert_eq!(query.statement().bindings().len(), 2);
/// # Ok::<(), sqlx_named_entity::Error>(())
/// ```
pub trait Binder: Sized {
    fn statement(&self) -> &NamedStatement;

    fn statement_mut(&mut self) -> &mut NamedStatement;

    /// Binds a named parameter to a value.
    fn bind<V>(mut self, name: &str, value: V) -> crate::Result<Self>
    where
        V: Into<Value>,
    {
        self.statement_mut().bind(name, value)?;
        Ok(self)
    }

    /// Binds a value by 1-based position.
    fn bind_at<V>(mut self, position: usize, value: V) -> crate::Result<Self>
    where
        V: Into<Value>,
    {
        self.statement_mut().bind_at(position, value)?;
        Ok(self)
    }

    /// Binds a null using the statement's default null type.
    fn bind_null(mut self, name: &str) -> crate::Result<Self> {
        self.statement_mut().bind_null(name)?;
        Ok(self)
    }

    fn bind_null_typed(mut self, name: &str, sql_type: SqlType) -> crate::Result<Self> {
        self.statement_mut().bind_null_typed(name, sql_type)?;
        Ok(self)
    }

    /// Binds each `(name, value)` pair.
    fn bind_map<I, K, V>(mut self, params: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in params {
            self.statement_mut().bind(name.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Binds `values` to positions `1..=values.len()`.
    fn bind_array<I, V>(mut self, values: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for (i, value) in values.into_iter().enumerate() {
            self.statement_mut().bind_at(i + 1, value)?;
        }
        Ok(self)
    }
}

/// Runs `work` on an owned connection and closes it afterwards.
///
/// The connection is closed exactly once whatever `work` returns. A close
/// failure never replaces an execution error; it is logged instead.
pub(crate) async fn close_after<T>(
    conn: MySqlConnection,
    outcome: crate::Result<T>,
) -> crate::Result<T> {
    let closed = conn.close().await;
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(Error::Close(e)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(error = %close_err, "failed to close connection after execution error");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_all_then_fully_bound() {
        let mut stmt = NamedStatement::new("insert into times (year, month) values (:year, :month)")
            .unwrap();
        stmt.bind("year", 2010).unwrap();
        stmt.bind(":month", 10).unwrap();
        assert!(stmt.ensure_fully_bound().is_ok());
        assert_eq!(stmt.arguments().unwrap(), vec![Value::Int(2010), Value::Int(10)]);
    }

    #[test]
    fn test_missing_name_is_reported() {
        let mut stmt =
            NamedStatement::new("select * from times where year = :year and month = :month")
                .unwrap();
        stmt.bind("year", 2010).unwrap();

        match stmt.ensure_fully_bound() {
            Err(Error::Unbound(names)) => assert_eq!(names, vec!["month".to_string()]),
            other => panic!("expected unbound error, got {other:?}"),
        }
    }

    #[test]
    fn test_double_bind_keeps_first_value() {
        let mut stmt = NamedStatement::new("select * from times where id = :id").unwrap();
        stmt.bind("id", 1).unwrap();

        let err = stmt.bind("id", 2).unwrap_err();
        assert!(matches!(
            err,
            Error::Binding(BindingError::AlreadyBound { ref name, ref value }) if name == "id" && value == "1"
        ));
        assert_eq!(stmt.bindings().get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let mut stmt = NamedStatement::new("select * from times where id = :id").unwrap();
        let err = stmt.bind("year", 1).unwrap_err();
        assert!(matches!(
            err,
            Error::Binding(BindingError::UnknownParameter { ref name, .. }) if name == "year"
        ));
    }

    #[test]
    fn test_repeated_name_binds_every_position() {
        let mut stmt =
            NamedStatement::new("select * from times where year = :y and month = :y").unwrap();
        stmt.bind("y", 2010).unwrap();
        assert!(stmt.ensure_fully_bound().is_ok());
        assert_eq!(stmt.arguments().unwrap(), vec![Value::Int(2010), Value::Int(2010)]);
    }

    #[test]
    fn test_bind_null_uses_default_type() {
        let mut stmt = NamedStatement::new("update t set a = :a, b = :b")
            .unwrap()
            .with_null_type(SqlType::BigInt);
        stmt.bind_null("a").unwrap();
        stmt.bind_null_typed("b", SqlType::Blob).unwrap();
        assert_eq!(
            stmt.arguments().unwrap(),
            vec![Value::Null(SqlType::BigInt), Value::Null(SqlType::Blob)]
        );
        assert!(stmt.bind_null("a").is_err());
    }

    #[test]
    fn test_bind_at_positions() {
        let mut stmt = NamedStatement::new("select * from times where id = ? and year = ?").unwrap();
        stmt.bind_at(1, 1).unwrap();
        assert!(matches!(
            stmt.arguments(),
            Err(Error::Binding(BindingError::PositionNotBound(2)))
        ));
        stmt.bind_at(2, 2010).unwrap();
        assert_eq!(stmt.arguments().unwrap(), vec![Value::Int(1), Value::Int(2010)]);

        assert!(matches!(
            stmt.bind_at(3, 0),
            Err(Error::Binding(BindingError::InvalidPosition { position: 3, count: 2 }))
        ));
        assert!(stmt.bind_at(0, 0).is_err());
    }

    #[test]
    fn test_clear_starts_new_cycle() {
        let mut stmt = NamedStatement::new("insert into t (a) values (:a)").unwrap();
        stmt.bind("a", 1).unwrap();
        stmt.clear();
        assert!(stmt.ensure_fully_bound().is_err());
        stmt.bind("a", 2).unwrap();
        assert_eq!(stmt.arguments().unwrap(), vec![Value::Int(2)]);
    }

    #[test]
    fn test_enrich_includes_snapshot() {
        let mut stmt = NamedStatement::new("select * from t where a = :a and b = :b").unwrap();
        stmt.bind("a", 1).unwrap();
        stmt.bind("b", "x").unwrap();
        assert_eq!(stmt.snapshot(), "a=1 b='x'");

        let err = stmt.enrich(sqlx::Error::RowNotFound);
        match err {
            Error::Execution { sql, params, .. } => {
                assert_eq!(sql, "select * from t where a = :a and b = :b");
                assert_eq!(params, "a=1 b='x'");
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[test]
    fn test_query_fails_before_io_when_unbound() {
        let stmt = NamedStatement::new("select :a").unwrap();
        assert!(matches!(stmt.query(), Err(Error::Unbound(_))));
    }
}
