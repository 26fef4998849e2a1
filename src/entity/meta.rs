//! Declarative entity descriptors.
//!
//! An entity describes itself once through [`Entity::meta`]: its own
//! [`TypeLayer`] followed by the layers of any mapped superclasses it embeds.
//! Each [`Field`] carries its mapping hints and an accessor that reads the
//! field's current value.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Reads one field off an entity instance.
pub type Accessor<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// A type whose rows live in one table.
///
/// ```
/// use sqlx_named_entity::entity::{Entity, EntityMeta, Field, TypeLayer};
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
///                 .field(Field::new("id", |t: &Times| t.id.into()).primary_key().generated())
///                 .field(Field::new("year", |t: &Times| t.year.into())),
///         )
///     }
/// }
///
/// assert_eq!(Times::meta().layers().len(), 1);
/// ```
pub trait Entity: Sized + Send + Sync + 'static {
    fn meta() -> EntityMeta<Self>;
}

/// Marker of a contributing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMarker {
    /// Maps to a table, optionally overriding the table name.
    Entity { table: Option<&'static str> },
    /// Contributes its fields to the entities that embed it.
    MappedSuperclass,
    /// Neither; ends the inheritance walk.
    Plain,
}

/// One declared field and its mapping hints.
pub struct Field<T> {
    name: &'static str,
    column: Option<&'static str>,
    primary_key: bool,
    generated: bool,
    transient: bool,
    accessor: Accessor<T>,
}

impl<T> Field<T> {
    pub fn new<F>(name: &'static str, accessor: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            name,
            column: None,
            primary_key: false,
            generated: false,
            transient: false,
            accessor: Arc::new(accessor),
        }
    }

    /// Maps the field to a column with a different name.
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// The database generates the value; inserts leave the column out.
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// The field is not persisted.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The column override, or the field name.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Reads the field's current value off `entity`.
    pub fn value(&self, entity: &T) -> Value {
        (self.accessor)(entity)
    }

    /// Whether `property` names this field, by field name or column override.
    pub fn matches(&self, property: &str) -> bool {
        self.name == property || self.column == Some(property)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            column: self.column,
            primary_key: self.primary_key,
            generated: self.generated,
            transient: self.transient,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("primary_key", &self.primary_key)
            .field("generated", &self.generated)
            .field("transient", &self.transient)
            .finish_non_exhaustive()
    }
}

/// The fields one type contributes, in declaration order.
pub struct TypeLayer<T> {
    type_name: &'static str,
    marker: TypeMarker,
    fields: Vec<Field<T>>,
}

impl<T: 'static> TypeLayer<T> {
    pub fn entity(type_name: &'static str) -> Self {
        Self::with_marker(type_name, TypeMarker::Entity { table: None })
    }

    pub fn mapped_superclass(type_name: &'static str) -> Self {
        Self::with_marker(type_name, TypeMarker::MappedSuperclass)
    }

    pub fn plain(type_name: &'static str) -> Self {
        Self::with_marker(type_name, TypeMarker::Plain)
    }

    fn with_marker(type_name: &'static str, marker: TypeMarker) -> Self {
        Self {
            type_name,
            marker,
            fields: Vec::new(),
        }
    }

    /// Overrides the table name. Only meaningful on an entity layer.
    pub fn table(mut self, table: &'static str) -> Self {
        if let TypeMarker::Entity { table: ref mut current } = self.marker {
            *current = Some(table);
        }
        self
    }

    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn marker(&self) -> TypeMarker {
        self.marker
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Re-targets this layer at a type that embeds `T`.
    ///
    /// A base type writes its layer once, over itself; each entity embedding
    /// it projects the layer through the accessor of the embedded value.
    pub fn project<U, F>(self, project: F) -> TypeLayer<U>
    where
        U: 'static,
        F: Fn(&U) -> &T + Send + Sync + 'static,
    {
        let project = Arc::new(project);
        let fields = self
            .fields
            .into_iter()
            .map(|field| {
                let project = Arc::clone(&project);
                let accessor = field.accessor;
                Field {
                    name: field.name,
                    column: field.column,
                    primary_key: field.primary_key,
                    generated: field.generated,
                    transient: field.transient,
                    accessor: Arc::new(move |outer: &U| accessor(project(outer))) as Accessor<U>,
                }
            })
            .collect();

        TypeLayer {
            type_name: self.type_name,
            marker: self.marker,
            fields,
        }
    }
}

impl<T> Clone for TypeLayer<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            marker: self.marker,
            fields: self.fields.clone(),
        }
    }
}

impl<T> fmt::Debug for TypeLayer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeLayer")
            .field("type_name", &self.type_name)
            .field("marker", &self.marker)
            .field("fields", &self.fields)
            .finish()
    }
}

/// The ordered contributing types of an entity: itself first, then its
/// bases from nearest to furthest.
pub struct EntityMeta<T> {
    layers: Vec<TypeLayer<T>>,
}

impl<T: 'static> EntityMeta<T> {
    pub fn new(layer: TypeLayer<T>) -> Self {
        Self {
            layers: vec![layer],
        }
    }

    /// Appends the next base type.
    pub fn extends(mut self, layer: TypeLayer<T>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn layers(&self) -> &[TypeLayer<T>] {
        &self.layers
    }

    /// Name of the entity's own type.
    pub fn type_name(&self) -> &'static str {
        self.layers[0].type_name
    }
}

impl<T> Clone for EntityMeta<T> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<T> fmt::Debug for EntityMeta<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMeta")
            .field("layers", &self.layers)
            .finish()
    }
}
