use std::marker::PhantomData;

use sqlx::mysql::MySqlRow;
use sqlx::{Decode, FromRow, MySql, Row, Type};

/// Converts the rows of one execution into a result.
///
/// The executor calls `handle` exactly once per query. Closures taking the
/// rows implement this trait, so ad-hoc conversions need no new type:
///
/// ```
/// use sqlx::mysql::MySqlRow;
/// use sqlx_named_entity::RowHandler;
///
/// let count_rows = |rows: Vec<MySqlRow>| Ok::<_, sqlx::Error>(rows.len());
/// assert_eq!(count_rows.handle(Vec::new()).unwrap(), 0);
/// ```
pub trait RowHandler {
    type Output;

    fn handle(self, rows: Vec<MySqlRow>) -> Result<Self::Output, sqlx::Error>;
}

impl<F, T> RowHandler for F
where
    F: FnOnce(Vec<MySqlRow>) -> Result<T, sqlx::Error>,
{
    type Output = T;

    fn handle(self, rows: Vec<MySqlRow>) -> Result<T, sqlx::Error> {
        self(rows)
    }
}

/// Materializes the first row as `T`, or `None` when there are no rows.
#[derive(Debug)]
pub struct EntityHandler<T> {
    _pd: PhantomData<fn() -> T>,
}

impl<T> EntityHandler<T> {
    pub fn new() -> Self {
        Self { _pd: PhantomData }
    }
}

impl<T> Default for EntityHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RowHandler for EntityHandler<T>
where
    for<'r> T: FromRow<'r, MySqlRow>,
{
    type Output = Option<T>;

    fn handle(self, rows: Vec<MySqlRow>) -> Result<Option<T>, sqlx::Error> {
        rows.first().map(T::from_row).transpose()
    }
}

/// Materializes every row as `T`.
#[derive(Debug)]
pub struct EntityListHandler<T> {
    _pd: PhantomData<fn() -> T>,
}

impl<T> EntityListHandler<T> {
    pub fn new() -> Self {
        Self { _pd: PhantomData }
    }
}

impl<T> Default for EntityListHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RowHandler for EntityListHandler<T>
where
    for<'r> T: FromRow<'r, MySqlRow>,
{
    type Output = Vec<T>;

    fn handle(self, rows: Vec<MySqlRow>) -> Result<Vec<T>, sqlx::Error> {
        rows.iter().map(T::from_row).collect()
    }
}

/// Reads the first column of the first row, e.g. for `select count(*)`.
#[derive(Debug)]
pub struct ScalarHandler<T> {
    _pd: PhantomData<fn() -> T>,
}

impl<T> ScalarHandler<T> {
    pub fn new() -> Self {
        Self { _pd: PhantomData }
    }
}

impl<T> Default for ScalarHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RowHandler for ScalarHandler<T>
where
    for<'r> T: Decode<'r, MySql> + Type<MySql>,
{
    type Output = Option<T>;

    fn handle(self, rows: Vec<MySqlRow>) -> Result<Option<T>, sqlx::Error> {
        rows.first().map(|row| row.try_get(0)).transpose()
    }
}
