/// Error types for sqlx-named-entity
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error during SQL template parsing
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),

    /// The entity descriptor cannot produce the requested metadata
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// A value could not be bound to a parameter or property
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Execution was attempted while declared parameters remain unbound
    #[error("There are unbound parameters: {}", .0.join(", "))]
    Unbound(Vec<String>),

    /// `execute` was called on a batch without any `add_batch` call
    #[error("add_batch must be called before execute")]
    EmptyBatch,

    /// A statement failed in the database
    ///
    /// Carries the original SQL template and every bound value so failures
    /// can be diagnosed without query logs.
    #[error("{source} Query: {sql} Parameters: {params}")]
    Execution {
        sql: String,
        params: String,
        #[source]
        source: sqlx::Error,
    },

    /// Error from SQLx database operations outside a single statement
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An owned connection failed to close after a successful execution
    #[error("Failed to close connection: {0}")]
    Close(#[source] sqlx::Error),

    /// A task spawned by `AsyncExecutor` panicked or was cancelled
    #[error("Background execution failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Invalid configuration value
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: &'static str, message: String },
}

impl Error {
    /// Returns the vendor error code (SQLSTATE for MySQL) of the underlying
    /// database error, if there is one.
    pub fn database_code(&self) -> Option<String> {
        let source = match self {
            Error::Execution { source, .. } | Error::Database(source) | Error::Close(source) => {
                source
            }
            _ => return None,
        };
        source
            .as_database_error()
            .and_then(|e| e.code())
            .map(|code| code.into_owned())
    }
}

/// Errors raised while resolving entity metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("{0} is not marked as an entity")]
    NotAnEntity(String),

    #[error("Entity {entity} contains two columns with the same name: {column}")]
    DuplicateColumn { entity: String, column: String },

    #[error("Entity {0} does not contain any columns")]
    NoColumns(String),

    #[error("Entity {0} does not declare a primary key")]
    MissingPrimaryKey(String),
}

/// Errors raised while binding values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("{name} is not found in the SQL statement: {sql}")]
    UnknownParameter { name: String, sql: String },

    #[error("You are attempting to bind the parameter {name} twice. It already has the value {value}")]
    AlreadyBound { name: String, value: String },

    #[error("Parameter position {position} is out of range, the statement has {count} placeholders")]
    InvalidPosition { position: usize, count: usize },

    #[error("No value bound for parameter position {0}")]
    PositionNotBound(usize),

    #[error("{property} is not a property of the entity {entity}")]
    UnknownProperty { property: String, entity: String },

    #[error("No entity instance is available to read {property} from")]
    MissingEntity { property: String },

    #[error("Property is empty")]
    EmptyProperty,
}

/// Result type alias for sqlx-named-entity operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
