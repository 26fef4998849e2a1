//! # sqlx-named-entity
//!
//! Named parameter execution and entity CRUD projection for SQLx (MySQL).
//!
//! ## Features
//!
//! - **Named Placeholders**: Write `:param_name` instead of `?`; a name used
//!   several times is bound once
//! - **Strict Binding**: Unknown names, double binds and unbound parameters are
//!   reported before anything reaches the database
//! - **Entity Projection**: Describe a type's table and fields once and get
//!   `SELECT`/`INSERT`/`UPDATE`/`DELETE` generated from it, mapped superclasses
//!   included
//! - **Generic Executor Support**: Works with `MySqlPool`, `Transaction`, and any
//!   SQLx `Executor`
//! - **Batches and Background Execution**: Transactional batches and a tokio
//!   backed async wrapper
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio"] }
//! sqlx-named-entity = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Raw SQL
//!
//! ```rust,no_run
//! use sqlx::{FromRow, MySqlPool};
//! use sqlx_named_entity::prelude::*;
//!
//! #[derive(FromRow)]
//! struct Times {
//!     id: i64,
//!     year: i32,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//!
//! let id = InsertExecutor::new("INSERT INTO times (year, month) VALUES (:year, :month)")?
//!     .bind("year", 2010)?
//!     .bind("month", 10)?
//!     .execute_for_key(&pool)
//!     .await?;
//!
//! let found: Vec<Times> = QueryExecutor::new("SELECT id, year FROM times WHERE id = :id OR year = :year")?
//!     .bind("id", id)?
//!     .bind("year", 2010)?
//!     .execute(&pool, EntityListHandler::<Times>::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Entities
//!
//! ```rust,no_run
//! use sqlx::{FromRow, MySqlPool};
//! use sqlx_named_entity::prelude::*;
//!
//! #[derive(FromRow)]
//! struct Times {
//!     id: i64,
//!     year: i32,
//!     month: Option<i32>,
//! }
//!
//! impl Entity for Times {
//!     fn meta() -> EntityMeta<Self> {
//!         EntityMeta::new(
//!             TypeLayer::entity("Times")
//!                 .table("times")
//!                 .field(Field::new("id", |t: &Times| t.id.into()).primary_key().generated())
//!                 .field(Field::new("year", |t: &Times| t.year.into()))
//!                 .field(Field::new("month", |t: &Times| t.month.into())),
//!         )
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let mut times = Times { id: 0, year: 2010, month: None };
//! times.id = InsertEntityExecutor::new(&times)?.insert_for_key(&pool).await? as i64;
//!
//! times.month = Some(10);
//! UpdateEntityExecutor::new(&times)?.bind_id()?.update(&pool).await?;
//!
//! let in_2010: Vec<Times> = QueryEntityExecutor::new()?
//!     .eq("year", 2010)?
//!     .list(&pool)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Parse**: Extract named placeholders (`:name`), skipping quoted literals,
//!    and convert the SQL to positional placeholders (`?`)
//! 2. **Bind**: Keep values by name; each name fills every position it occupies
//! 3. **Execute**: Check that everything is bound, then construct a fresh SQLx
//!    `Query` with the arguments in position order
//!
//! ## Limitations
//!
//! - Currently only supports MySQL
//! - Placeholder names must match `[a-zA-Z0-9_]+`
//! - Placeholders inside quoted strings, backticked identifiers and comments
//!   are ignored
//! - Entity predicates are equality only
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod asynchronous;
pub mod batch;
pub mod builder;
pub mod config;
pub mod entity;
pub mod error;
pub mod handler;
pub mod insert;
pub mod query;
pub mod repository;
pub mod runner;
pub mod statement;
pub mod update;
pub mod value;

pub use asynchronous::{AsyncExecutor, Pending};
pub use batch::BatchExecutor;
pub use builder::{build_query, ParsedSql};
pub use config::Config;
pub use entity::{
    DeleteEntityExecutor, Entity, EntityExecutor, EntityMeta, Field, InsertEntityExecutor,
    QueryEntityExecutor, TypeLayer, TypeMarker, UpdateEntityExecutor,
};
pub use error::{BindingError, Error, MetadataError, Result};
pub use handler::{EntityHandler, EntityListHandler, RowHandler, ScalarHandler};
pub use insert::InsertExecutor;
pub use query::QueryExecutor;
pub use repository::Repository;
pub use runner::QueryRunner;
pub use statement::{Binder, NamedStatement};
pub use update::UpdateExecutor;
pub use value::{SqlType, SqlTyped, Value};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::{
        BatchExecutor, Binder, DeleteEntityExecutor, Entity, EntityExecutor, EntityHandler,
        EntityListHandler, EntityMeta, Field, InsertEntityExecutor, InsertExecutor,
        QueryEntityExecutor, QueryExecutor, RowHandler, ScalarHandler, SqlType, TypeLayer,
        UpdateEntityExecutor, UpdateExecutor, Value,
    };
}
