use std::fmt;

use sqlx::{Executor, MySql};

use crate::entity::{Entity, EntityExecutor, EntityState};
use crate::update::UpdateExecutor;

/// Deletes the rows matching its predicates.
///
/// Without a backing instance predicates must be bound with explicit values;
/// [`DeleteEntityExecutor::bind_entity`] lets them be read off an instance
/// instead.
pub struct DeleteEntityExecutor<'a, T> {
    state: EntityState<T>,
    entity: Option<&'a T>,
}

impl<T: 'static> fmt::Debug for DeleteEntityExecutor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteEntityExecutor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Entity> DeleteEntityExecutor<'a, T> {
    /// # Errors
    ///
    /// Fails if `T` is not marked as an entity.
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            state: EntityState::new()?,
            entity: None,
        })
    }

    /// Uses `entity` as the source of auto-bound predicate values.
    pub fn bind_entity(mut self, entity: &'a T) -> Self {
        self.entity = Some(entity);
        self
    }

    /// The `DELETE` this executor runs.
    pub fn sql(&self) -> String {
        format!(
            "DELETE FROM {}{}",
            self.state.table(),
            self.state.where_clause("")
        )
    }

    /// Runs the delete and returns the number of rows deleted.
    pub async fn delete<'e, E>(self, executor: E) -> crate::Result<u64>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.build()?.execute(executor).await
    }

    fn build(&self) -> crate::Result<UpdateExecutor> {
        let sql = self.sql();
        if self.state.params().is_empty() {
            tracing::warn!(%sql, "DELETE without predicates removes every row");
        } else {
            tracing::debug!(%sql, "DELETE");
        }
        self.state.bind_params(UpdateExecutor::new(sql)?, "")
    }
}

impl<T: Entity> EntityExecutor<T> for DeleteEntityExecutor<'_, T> {
    fn state(&self) -> &EntityState<T> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState<T> {
        &mut self.state
    }

    fn entity(&self) -> Option<&T> {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::{Audit, Times, Times2};
    use crate::error::BindingError;
    use crate::statement::Binder;
    use crate::value::Value;
    use crate::Error;

    #[test]
    fn test_delete_by_explicit_key() {
        let delete = DeleteEntityExecutor::<Times>::new().unwrap().bind("id", 5).unwrap();
        assert_eq!(delete.sql(), "DELETE FROM times WHERE id = :id");
        assert_eq!(
            delete.build().unwrap().statement().arguments().unwrap(),
            vec![Value::Int(5)]
        );
    }

    #[test]
    fn test_delete_from_entity() {
        let times2 = Times2 {
            year: 2010,
            audit: Audit {
                id: 4,
                created_by: Some("bob".into()),
            },
        };
        let delete = DeleteEntityExecutor::new()
            .unwrap()
            .bind_entity(&times2)
            .bind_properties(["year", "created_by"])
            .unwrap();
        assert_eq!(
            delete.sql(),
            "DELETE FROM times23 WHERE year = :year AND created_by = :created_by"
        );
        assert_eq!(
            delete.build().unwrap().statement().arguments().unwrap(),
            vec![Value::Int(2010), Value::Text("bob".into())]
        );
    }

    #[test]
    fn test_auto_bind_needs_entity() {
        let err = DeleteEntityExecutor::<Times>::new().unwrap().bind_id().unwrap_err();
        assert!(matches!(err, Error::Binding(BindingError::MissingEntity { .. })));
    }

    #[test]
    fn test_delete_everything() {
        let delete = DeleteEntityExecutor::<Times>::new().unwrap();
        assert_eq!(delete.sql(), "DELETE FROM times");
        assert!(delete.build().is_ok());
    }
}
