use std::collections::HashSet;

use crate::entity::resolve::ColumnMap;
use crate::error::MetadataError;

/// Narrows a resolved column map by field name.
///
/// When both sets are given the include set wins and the exclude set is
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilter {
    include: Option<HashSet<String>>,
    exclude: Option<HashSet<String>>,
}

impl ColumnFilter {
    pub fn include<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(fields.into_iter().map(Into::into).collect());
    }

    pub fn exclude<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(fields.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    /// Keeps the columns whose field passes the filter, in their original
    /// order.
    pub fn apply(&self, entity: &str, columns: ColumnMap) -> Result<ColumnMap, MetadataError> {
        let filtered: ColumnMap = match (&self.include, &self.exclude) {
            (Some(include), _) => columns
                .into_iter()
                .filter(|(_, field)| include.contains(field))
                .collect(),
            (None, Some(exclude)) => columns
                .into_iter()
                .filter(|(_, field)| !exclude.contains(field))
                .collect(),
            (None, None) => columns,
        };

        if filtered.is_empty() {
            return Err(MetadataError::NoColumns(entity.to_owned()));
        }
        Ok(filtered)
    }
}
