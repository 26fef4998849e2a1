//! Entity-to-SQL projection.
//!
//! An [`Entity`] describes its table and fields once; the executors in this
//! module turn that description into `SELECT`, `INSERT`, `UPDATE` and
//! `DELETE` statements and run them through the raw executors.
//!
//! Predicates are bound by property (a field name or its column override)
//! and always compare for equality, joined with `AND`.

mod delete;
mod filter;
mod insert;
mod meta;
mod query;
mod resolve;
mod update;

use std::fmt;

use indexmap::IndexMap;

use crate::error::{BindingError, MetadataError};
use crate::statement::Binder;
use crate::value::Value;

pub use delete::DeleteEntityExecutor;
pub use filter::ColumnFilter;
pub use insert::InsertEntityExecutor;
pub use meta::{Accessor, Entity, EntityMeta, Field, TypeLayer, TypeMarker};
pub use query::QueryEntityExecutor;
pub use resolve::{
    columns, find_field, join_assignments, join_columns, primary_key_column, primary_key_field,
    table_name, ColumnMap, ColumnMode,
};
pub use update::UpdateEntityExecutor;

use resolve::find_field_by_name;

/// Resolved table, predicates and column filter of one entity executor.
///
/// Predicate values are keyed by column name in binding order.
pub struct EntityState<T> {
    meta: EntityMeta<T>,
    table: String,
    params: IndexMap<String, Value>,
    filter: ColumnFilter,
}

impl<T> Clone for EntityState<T> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            table: self.table.clone(),
            params: self.params.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for EntityState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityState")
            .field("entity", &self.meta.type_name())
            .field("table", &self.table)
            .field("params", &self.params)
            .field("filter", &self.filter)
            .finish()
    }
}

impl<T: Entity> EntityState<T> {
    pub(crate) fn new() -> crate::Result<Self> {
        let meta = T::meta();
        let table = table_name(&meta)?;
        Ok(Self {
            meta,
            table,
            params: IndexMap::new(),
            filter: ColumnFilter::default(),
        })
    }

    pub(crate) fn meta(&self) -> &EntityMeta<T> {
        &self.meta
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }

    pub(crate) fn params(&self) -> &IndexMap<String, Value> {
        &self.params
    }

    pub(crate) fn filter_mut(&mut self) -> &mut ColumnFilter {
        &mut self.filter
    }

    /// Resolves the entity's columns and applies the column filter.
    pub(crate) fn columns(&self, mode: ColumnMode) -> crate::Result<ColumnMap> {
        let resolved = columns(&self.meta, mode)?;
        Ok(self.filter.apply(self.meta.type_name(), resolved)?)
    }

    /// The field a property names.
    pub(crate) fn field(&self, property: &str) -> crate::Result<&Field<T>> {
        if property.is_empty() {
            return Err(BindingError::EmptyProperty.into());
        }
        find_field(&self.meta, property)?.ok_or_else(|| {
            BindingError::UnknownProperty {
                property: property.to_owned(),
                entity: self.meta.type_name().to_owned(),
            }
            .into()
        })
    }

    /// Reads every column in `columns` off `entity`.
    pub(crate) fn values(&self, entity: &T, columns: &ColumnMap) -> crate::Result<Vec<(String, Value)>> {
        columns
            .iter()
            .map(|(column, name)| -> crate::Result<(String, Value)> {
                let field = find_field_by_name(&self.meta, name)?.ok_or_else(|| {
                    BindingError::UnknownProperty {
                        property: name.clone(),
                        entity: self.meta.type_name().to_owned(),
                    }
                })?;
                Ok((column.clone(), field.value(entity)))
            })
            .collect()
    }

    pub(crate) fn bind(&mut self, property: &str, value: Value) -> crate::Result<()> {
        let column = self.field(property)?.column_name();
        self.insert_param(column, value)
    }

    fn insert_param(&mut self, column: &str, value: Value) -> crate::Result<()> {
        if let Some(existing) = self.params.get(column) {
            return Err(BindingError::AlreadyBound {
                name: column.to_owned(),
                value: existing.to_string(),
            }
            .into());
        }
        self.params.insert(column.to_owned(), value);
        Ok(())
    }

    /// The `WHERE` clause for the bound predicates, or an empty string.
    pub(crate) fn where_clause(&self, prefix: &str) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", join_assignments(self.params.keys(), " AND ", prefix))
    }

    /// Binds every predicate onto `executor`, each under `prefix` + column.
    pub(crate) fn bind_params<B: Binder>(&self, mut executor: B, prefix: &str) -> crate::Result<B> {
        for (column, value) in &self.params {
            executor = executor.bind(&format!("{prefix}{column}"), value.clone())?;
        }
        Ok(executor)
    }
}

/// Predicate binding shared by the query, update and delete entity
/// executors.
pub trait EntityExecutor<T: Entity>: Sized {
    #[doc(hidden)]
    fn state(&self) -> &EntityState<T>;

    #[doc(hidden)]
    fn state_mut(&mut self) -> &mut EntityState<T>;

    /// The instance auto-binding reads from, if the executor has one.
    fn entity(&self) -> Option<&T> {
        None
    }

    /// Adds the predicate `column = value` for the column `property` maps to.
    ///
    /// # Errors
    ///
    /// Fails if `property` names no field of the entity or its column is
    /// already bound.
    fn bind<V>(mut self, property: &str, value: V) -> crate::Result<Self>
    where
        V: Into<Value>,
    {
        self.state_mut().bind(property, value.into())?;
        Ok(self)
    }

    /// Adds a predicate on `property` using the value the backing entity
    /// currently holds.
    fn bind_property(mut self, property: &str) -> crate::Result<Self> {
        let (column, value) = {
            let field = self.state().field(property)?;
            let entity = self.entity().ok_or_else(|| BindingError::MissingEntity {
                property: property.to_owned(),
            })?;
            (field.column_name(), field.value(entity))
        };
        self.state_mut().insert_param(column, value)?;
        Ok(self)
    }

    /// Auto-binds each of `properties` in order.
    fn bind_properties<I, S>(mut self, properties: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for property in properties {
            self = self.bind_property(property.as_ref())?;
        }
        Ok(self)
    }

    /// Auto-binds the primary key.
    fn bind_id(self) -> crate::Result<Self> {
        let meta = self.state().meta();
        let id = primary_key_field(meta)?
            .ok_or_else(|| MetadataError::MissingPrimaryKey(meta.type_name().to_owned()))?;
        self.bind_property(id)
    }
}
