//! Table, primary-key and column resolution over an [`EntityMeta`].
//!
//! Resolution walks the entity's own layer first and then each following
//! layer while it is a mapped superclass. The first layer that is not a
//! mapped superclass ends the walk. Nothing is cached; resolving the same
//! descriptor twice gives the same answer.

use indexmap::IndexMap;

use crate::entity::meta::{EntityMeta, Field, TypeLayer, TypeMarker};
use crate::error::MetadataError;

/// Column name → field name, in resolution order.
pub type ColumnMap = IndexMap<String, String>;

/// Which fields `columns` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMode {
    /// Persistent fields the database does not generate.
    Insert,
    /// Every persistent field.
    All,
}

/// The table name: the entity layer's override, else its type name.
pub fn table_name<T: 'static>(meta: &EntityMeta<T>) -> Result<String, MetadataError> {
    match entity_layer(meta)?.marker() {
        TypeMarker::Entity { table: Some(table) } => Ok(table.to_owned()),
        _ => Ok(meta.type_name().to_owned()),
    }
}

/// Name of the first field marked as primary key, if any.
pub fn primary_key_field<T: 'static>(
    meta: &EntityMeta<T>,
) -> Result<Option<&'static str>, MetadataError> {
    Ok(walk(meta)?
        .flat_map(TypeLayer::fields)
        .find(|field| field.is_primary_key())
        .map(Field::name))
}

/// Column name of the primary key.
///
/// # Errors
///
/// Fails with [`MetadataError::MissingPrimaryKey`] if no field is marked.
pub fn primary_key_column<T: 'static>(meta: &EntityMeta<T>) -> Result<String, MetadataError> {
    walk(meta)?
        .flat_map(TypeLayer::fields)
        .find(|field| field.is_primary_key())
        .map(|field| field.column_name().to_owned())
        .ok_or_else(|| MetadataError::MissingPrimaryKey(meta.type_name().to_owned()))
}

/// The persisted columns of the entity.
///
/// # Errors
///
/// Fails if two fields map to the same column or if no column is left.
pub fn columns<T: 'static>(
    meta: &EntityMeta<T>,
    mode: ColumnMode,
) -> Result<ColumnMap, MetadataError> {
    let mut columns = ColumnMap::new();

    for field in walk(meta)?.flat_map(TypeLayer::fields) {
        if field.is_transient() {
            continue;
        }
        if mode == ColumnMode::Insert && field.is_generated() {
            continue;
        }

        let column = field.column_name();
        if columns.contains_key(column) {
            return Err(MetadataError::DuplicateColumn {
                entity: meta.type_name().to_owned(),
                column: column.to_owned(),
            });
        }
        columns.insert(column.to_owned(), field.name().to_owned());
    }

    if columns.is_empty() {
        return Err(MetadataError::NoColumns(meta.type_name().to_owned()));
    }
    Ok(columns)
}

/// The field named `property`. An exact field name wins over a column
/// override.
pub fn find_field<'m, T: 'static>(
    meta: &'m EntityMeta<T>,
    property: &str,
) -> Result<Option<&'m Field<T>>, MetadataError> {
    if let Some(field) = find_field_by_name(meta, property)? {
        return Ok(Some(field));
    }
    Ok(walk(meta)?
        .flat_map(TypeLayer::fields)
        .find(|field| field.matches(property)))
}

/// The field named exactly `name` within the walk, ignoring column overrides.
pub(crate) fn find_field_by_name<'m, T: 'static>(
    meta: &'m EntityMeta<T>,
    name: &str,
) -> Result<Option<&'m Field<T>>, MetadataError> {
    Ok(walk(meta)?
        .flat_map(TypeLayer::fields)
        .find(|field| field.name() == name))
}

/// Joins column names, each prefixed with `prefix`.
///
/// ```
/// use sqlx_named_entity::entity::join_columns;
///
/// let columns = ["year", "month"];
/// assert_eq!(join_columns(columns, ", ", ""), "year, month");
/// assert_eq!(join_columns(columns, ", ", ":"), ":year, :month");
/// ```
pub fn join_columns<I, S>(columns: I, separator: &str, prefix: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns
        .into_iter()
        .map(|column| format!("{prefix}{}", column.as_ref()))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Joins `column = :<prefix>column` assignments.
///
/// ```
/// use sqlx_named_entity::entity::join_assignments;
///
/// assert_eq!(join_assignments(["id", "year"], " AND ", ""), "id = :id AND year = :year");
/// assert_eq!(join_assignments(["id"], " AND ", "where_"), "id = :where_id");
/// ```
pub fn join_assignments<I, S>(columns: I, separator: &str, prefix: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns
        .into_iter()
        .map(|column| {
            let column = column.as_ref();
            format!("{column} = :{prefix}{column}")
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn entity_layer<T: 'static>(meta: &EntityMeta<T>) -> Result<&TypeLayer<T>, MetadataError> {
    match meta.layers().first() {
        Some(layer) if matches!(layer.marker(), TypeMarker::Entity { .. }) => Ok(layer),
        _ => Err(MetadataError::NotAnEntity(meta.type_name().to_owned())),
    }
}

fn walk<T: 'static>(
    meta: &EntityMeta<T>,
) -> Result<impl Iterator<Item = &TypeLayer<T>>, MetadataError> {
    let entity = entity_layer(meta)?;
    let bases = meta.layers()[1..]
        .iter()
        .take_while(|layer| layer.marker() == TypeMarker::MappedSuperclass);
    Ok(std::iter::once(entity).chain(bases))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::meta::Entity;

    struct Audit {
        id: i64,
        created_by: Option<String>,
    }

    impl Audit {
        fn layer() -> TypeLayer<Audit> {
            TypeLayer::mapped_superclass("Audit")
                .field(Field::new("id", |a: &Audit| a.id.into()).primary_key().generated())
                .field(Field::new("createdBy", |a: &Audit| a.created_by.clone().into()).column("created_by"))
        }
    }

    struct Times {
        id: i64,
        year: i32,
        month: i32,
        label: String,
    }

    impl Entity for Times {
        fn meta() -> EntityMeta<Self> {
            EntityMeta::new(
                TypeLayer::entity("Times")
                    .table("times")
                    .field(Field::new("id", |t: &Times| t.id.into()).primary_key().generated())
                    .field(Field::new("year", |t: &Times| t.year.into()))
                    .field(Field::new("month", |t: &Times| t.month.into()))
                    .field(Field::new("label", |t: &Times| t.label.clone().into()).transient()),
            )
        }
    }

    struct Times2 {
        year: i32,
        audit: Audit,
    }

    impl Entity for Times2 {
        fn meta() -> EntityMeta<Self> {
            EntityMeta::new(
                TypeLayer::entity("Times2")
                    .table("times23")
                    .field(Field::new("year", |t: &Times2| t.year.into())),
            )
            .extends(Audit::layer().project(|t: &Times2| &t.audit))
        }
    }

    #[test]
    fn test_table_name_override_and_default() {
        assert_eq!(table_name(&Times::meta()).unwrap(), "times");

        let meta = EntityMeta::<Times>::new(
            TypeLayer::entity("Times").field(Field::new("year", |t: &Times| t.year.into())),
        );
        assert_eq!(table_name(&meta).unwrap(), "Times");
    }

    #[test]
    fn test_not_an_entity() {
        let meta = EntityMeta::<Times>::new(TypeLayer::plain("Times"));
        assert_eq!(
            table_name(&meta).unwrap_err(),
            MetadataError::NotAnEntity("Times".into())
        );
        assert!(primary_key_field(&meta).is_err());
        assert!(columns(&meta, ColumnMode::All).is_err());
    }

    #[test]
    fn test_insert_columns_skip_generated_and_transient() {
        let cols = columns(&Times::meta(), ColumnMode::Insert).unwrap();
        assert_eq!(cols.keys().collect::<Vec<_>>(), vec!["year", "month"]);

        let cols = columns(&Times::meta(), ColumnMode::All).unwrap();
        assert_eq!(cols.keys().collect::<Vec<_>>(), vec!["id", "year", "month"]);
    }

    #[test]
    fn test_mapped_superclass_contributes_columns() {
        let meta = Times2::meta();
        assert_eq!(table_name(&meta).unwrap(), "times23");
        assert_eq!(primary_key_field(&meta).unwrap(), Some("id"));

        let cols = columns(&meta, ColumnMode::All).unwrap();
        assert_eq!(
            cols.into_iter().collect::<Vec<_>>(),
            vec![
                ("year".to_string(), "year".to_string()),
                ("id".to_string(), "id".to_string()),
                ("created_by".to_string(), "createdBy".to_string()),
            ]
        );
    }

    #[test]
    fn test_walk_stops_at_plain_layer() {
        let meta = EntityMeta::<Times2>::new(
            TypeLayer::entity("Times2").field(Field::new("year", |t: &Times2| t.year.into())),
        )
        .extends(TypeLayer::plain("Object"))
        .extends(Audit::layer().project(|t: &Times2| &t.audit));

        assert_eq!(primary_key_field(&meta).unwrap(), None);
        assert_eq!(
            primary_key_column(&meta).unwrap_err(),
            MetadataError::MissingPrimaryKey("Times2".into())
        );
        assert_eq!(columns(&meta, ColumnMode::All).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_column() {
        let meta = EntityMeta::<Times>::new(
            TypeLayer::entity("Times")
                .field(Field::new("year", |t: &Times| t.year.into()))
                .field(Field::new("month", |t: &Times| t.month.into()).column("year")),
        );
        assert_eq!(
            columns(&meta, ColumnMode::All).unwrap_err(),
            MetadataError::DuplicateColumn {
                entity: "Times".into(),
                column: "year".into()
            }
        );
    }

    #[test]
    fn test_duplicate_column_across_layers() {
        let entity = || {
            TypeLayer::entity("Times2").field(
                Field::new("author", |t: &Times2| t.audit.created_by.clone().into()).column("created_by"),
            )
        };
        let stamp = || {
            TypeLayer::mapped_superclass("Stamp")
                .field(Field::new("createdBy", |a: &Audit| a.created_by.clone().into()).column("created_by"))
                .project(|t: &Times2| &t.audit)
        };
        let audit = || Audit::layer().project(|t: &Times2| &t.audit);
        let expected = MetadataError::DuplicateColumn {
            entity: "Times2".into(),
            column: "created_by".into(),
        };

        // subclass field against an inherited one
        let meta = EntityMeta::new(entity()).extends(audit());
        assert_eq!(columns(&meta, ColumnMode::All).unwrap_err(), expected);

        // two mapped superclasses, in both orders
        let plain = || TypeLayer::entity("Times2").field(Field::new("year", |t: &Times2| t.year.into()));
        let meta = EntityMeta::new(plain()).extends(audit()).extends(stamp());
        assert_eq!(columns(&meta, ColumnMode::All).unwrap_err(), expected);
        let meta = EntityMeta::new(plain()).extends(stamp()).extends(audit());
        assert_eq!(columns(&meta, ColumnMode::Insert).unwrap_err(), expected);
    }

    #[test]
    fn test_no_columns() {
        let meta = EntityMeta::<Times>::new(
            TypeLayer::entity("Times")
                .field(Field::new("id", |t: &Times| t.id.into()).generated()),
        );
        assert_eq!(
            columns(&meta, ColumnMode::Insert).unwrap_err(),
            MetadataError::NoColumns("Times".into())
        );
    }

    #[test]
    fn test_find_field_by_name_or_column() {
        let meta = Times2::meta();
        assert_eq!(find_field(&meta, "createdBy").unwrap().map(Field::name), Some("createdBy"));
        assert_eq!(find_field(&meta, "created_by").unwrap().map(Field::name), Some("createdBy"));
        assert!(find_field(&meta, "nope").unwrap().is_none());
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let first = columns(&Times2::meta(), ColumnMode::All).unwrap();
        let second = columns(&Times2::meta(), ColumnMode::All).unwrap();
        assert_eq!(first, second);
    }
}
