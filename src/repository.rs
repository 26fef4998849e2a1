use std::marker::PhantomData;

use sqlx::mysql::MySqlRow;
use sqlx::FromRow;

use crate::entity::{primary_key_column, Entity, EntityExecutor};
use crate::handler::{EntityHandler, EntityListHandler};
use crate::runner::QueryRunner;
use crate::statement::Binder;
use crate::value::Value;

/// CRUD over one entity type.
///
/// Every method runs on the runner's pool and returns errors unchanged.
///
/// ```rust,no_run
/// use sqlx::FromRow;
/// use sqlx_named_entity::prelude::*;
/// use sqlx_named_entity::{Config, QueryRunner, Repository};
///
/// #[derive(FromRow)]
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
///                 .field(Field::new("id", |t: &Times| t.id.into()).primary_key().generated())
///                 .field(Field::new("year", |t: &Times| t.year.into())),
///         )
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Repository::<Times>::new(QueryRunner::connect(&Config::from_env()?).await?);
/// let id = repo.insert(&Times { id: 0, year: 2010 }).await?;
/// let stored = repo.find_by_id(id).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Repository<T> {
    runner: QueryRunner,
    _pd: PhantomData<fn() -> T>,
}

impl<T> Repository<T>
where
    T: Entity,
    for<'r> T: FromRow<'r, MySqlRow>,
{
    pub fn new(runner: QueryRunner) -> Self {
        Self {
            runner,
            _pd: PhantomData,
        }
    }

    pub fn runner(&self) -> &QueryRunner {
        &self.runner
    }

    /// Inserts `entity` and returns the generated key.
    pub async fn insert(&self, entity: &T) -> crate::Result<u64> {
        self.runner
            .insert_entity(entity)?
            .insert_for_key(self.runner.pool())
            .await
    }

    /// Inserts only the named fields.
    pub async fn insert_attrs<I, S>(&self, entity: &T, include: I) -> crate::Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .insert_entity(entity)?
            .include(include)
            .insert(self.runner.pool())
            .await
    }

    /// Inserts every field except the named ones.
    pub async fn insert_exclude_attrs<I, S>(&self, entity: &T, exclude: I) -> crate::Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .insert_entity(entity)?
            .exclude(exclude)
            .insert(self.runner.pool())
            .await
    }

    /// Writes `entity` to the row with its primary key.
    pub async fn update(&self, entity: &T) -> crate::Result<u64> {
        self.runner
            .update_entity(entity)?
            .bind_id()?
            .update(self.runner.pool())
            .await
    }

    pub async fn update_attrs<I, S>(&self, entity: &T, include: I) -> crate::Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .update_entity(entity)?
            .include(include)
            .bind_id()?
            .update(self.runner.pool())
            .await
    }

    pub async fn update_exclude_attrs<I, S>(&self, entity: &T, exclude: I) -> crate::Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .update_entity(entity)?
            .exclude(exclude)
            .bind_id()?
            .update(self.runner.pool())
            .await
    }

    /// Deletes the row with the primary key of `entity`.
    pub async fn remove(&self, entity: &T) -> crate::Result<u64> {
        self.runner
            .delete_entity()?
            .bind_entity(entity)
            .bind_id()?
            .delete(self.runner.pool())
            .await
    }

    pub async fn remove_by_id<V: Into<Value>>(&self, id: V) -> crate::Result<u64> {
        let key = primary_key_column(&T::meta())?;
        self.runner
            .delete_entity::<T>()?
            .bind(&key, id)?
            .delete(self.runner.pool())
            .await
    }

    /// Deletes the rows matching the current values of `attrs` on `entity`.
    pub async fn remove_by_attrs<I, S>(&self, entity: &T, attrs: I) -> crate::Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.runner
            .delete_entity()?
            .bind_entity(entity)
            .bind_properties(attrs)?
            .delete(self.runner.pool())
            .await
    }

    pub async fn find_by_id<V: Into<Value>>(&self, id: V) -> crate::Result<Option<T>> {
        let key = primary_key_column(&T::meta())?;
        self.runner
            .query_entity::<T>()?
            .bind(&key, id)?
            .unique_result(self.runner.pool())
            .await
    }

    pub async fn find_by_id_include_attrs<V, I, S>(&self, id: V, include: I) -> crate::Result<Option<T>>
    where
        V: Into<Value>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = primary_key_column(&T::meta())?;
        self.runner
            .query_entity::<T>()?
            .include(include)
            .bind(&key, id)?
            .unique_result(self.runner.pool())
            .await
    }

    pub async fn find_by_id_exclude_attrs<V, I, S>(&self, id: V, exclude: I) -> crate::Result<Option<T>>
    where
        V: Into<Value>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = primary_key_column(&T::meta())?;
        self.runner
            .query_entity::<T>()?
            .exclude(exclude)
            .bind(&key, id)?
            .unique_result(self.runner.pool())
            .await
    }

    /// Every entity whose properties equal `params`.
    pub async fn find<P, K, V>(&self, params: P) -> crate::Result<Vec<T>>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.runner
            .query_entity::<T>()?
            .bind_map(params)?
            .list(self.runner.pool())
            .await
    }

    pub async fn find_include_attrs<P, K, V, I, S>(&self, params: P, include: I) -> crate::Result<Vec<T>>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .query_entity::<T>()?
            .bind_map(params)?
            .include(include)
            .list(self.runner.pool())
            .await
    }

    pub async fn find_exclude_attrs<P, K, V, I, S>(&self, params: P, exclude: I) -> crate::Result<Vec<T>>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .query_entity::<T>()?
            .bind_map(params)?
            .exclude(exclude)
            .list(self.runner.pool())
            .await
    }

    pub async fn find_all(&self) -> crate::Result<Vec<T>> {
        self.runner
            .query_entity::<T>()?
            .list(self.runner.pool())
            .await
    }

    pub async fn find_all_include_attrs<I, S>(&self, include: I) -> crate::Result<Vec<T>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .query_entity::<T>()?
            .include(include)
            .list(self.runner.pool())
            .await
    }

    pub async fn find_all_exclude_attrs<I, S>(&self, exclude: I) -> crate::Result<Vec<T>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .query_entity::<T>()?
            .exclude(exclude)
            .list(self.runner.pool())
            .await
    }

    /// Runs `sql` with `params` bound to its positions in order.
    pub async fn find_sql<P, V>(&self, sql: &str, params: P) -> crate::Result<Vec<T>>
    where
        P: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.runner
            .query(sql)?
            .bind_array(params)?
            .execute(self.runner.pool(), EntityListHandler::<T>::new())
            .await
    }

    /// Runs `sql` with `params` bound by name.
    pub async fn find_sql_for_map<P, K, V>(&self, sql: &str, params: P) -> crate::Result<Vec<T>>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.runner
            .query(sql)?
            .bind_map(params)?
            .execute(self.runner.pool(), EntityListHandler::<T>::new())
            .await
    }

    /// The first row of `sql`, with `params` bound to its positions in order.
    pub async fn find_unique<P, V>(&self, sql: &str, params: P) -> crate::Result<Option<T>>
    where
        P: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.runner
            .query(sql)?
            .bind_array(params)?
            .execute(self.runner.pool(), EntityHandler::<T>::new())
            .await
    }

    pub async fn find_unique_for_map<P, K, V>(&self, sql: &str, params: P) -> crate::Result<Option<T>>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.runner
            .query(sql)?
            .bind_map(params)?
            .execute(self.runner.pool(), EntityHandler::<T>::new())
            .await
    }
}
