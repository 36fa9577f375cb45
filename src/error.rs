//! Error types for relation resolution and select assembly.
//!
//! Every variant describes a configuration or usage error. None of them is
//! retryable: query construction aborts at the first one and no statement
//! reaches the executor.

use std::fmt;

/// Error type for model declaration, relation resolution and query assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrmError {
    /// A relation with this name is already declared on the model
    DuplicateRelation { name: String, model: String },
    /// A path references a relation that the model reached so far does not declare
    UnknownRelation { name: String, on_table: String },
    /// A column or alias does not exist on the resolved model
    ColumnNotFound {
        column: String,
        table: String,
        model: String,
    },
    /// Neither the relation nor its subject provide a candidate key
    NoCandidateKey { relation: String, subject: String },
    /// No foreign key was given and none can be derived from the subject
    NoForeignKey { relation: String, subject: String },
    /// Foreign and candidate key have a different number of columns
    KeyCardinalityMismatch {
        foreign_key: Vec<String>,
        candidate_key: Vec<String>,
    },
    /// The filter chain uses a boolean operator that cannot be lowered to SQL
    UnsupportedFilter(String),
    /// A list-valued filter condition uses an operator other than `=` / `!=`
    UnsupportedArrayOperator { column: String, operator: String },
    /// A filter value that cannot be bound (objects, nested lists)
    UnsupportedFilterValue { column: String, value: String },
    /// A model with this name is already registered in the schema
    DuplicateModel(String),
    /// No model with this name is registered in the schema
    UnknownModel(String),
    /// A dotted path is empty or contains an invalid segment
    InvalidPath(String),
    /// Two different paths would join under the same alias
    AliasCollision { alias: String, path: String },
    /// The record has no value for a key column required by the relation
    NewRecord { model: String, column: String },
    /// Configuration could not be loaded
    Config(String),
    /// The executor failed to run the statement
    Execution(String),
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::DuplicateRelation { name, model } => {
                write!(f, "Relation '{}' is already defined on model '{}'", name, model)
            }
            OrmError::UnknownRelation { name, on_table } => {
                write!(f, "Can't join relation '{}' on table '{}': relation not found", name, on_table)
            }
            OrmError::ColumnNotFound {
                column,
                table,
                model,
            } => write!(
                f,
                "Column '{}' not found on table '{}' (model '{}')",
                column, table, model
            ),
            OrmError::NoCandidateKey { relation, subject } => write!(
                f,
                "Can't resolve relation '{}': no candidate key on '{}'",
                relation, subject
            ),
            OrmError::NoForeignKey { relation, subject } => write!(
                f,
                "Can't resolve relation '{}': no foreign key derivable from '{}'",
                relation, subject
            ),
            OrmError::KeyCardinalityMismatch {
                foreign_key,
                candidate_key,
            } => write!(
                f,
                "Foreign key ({}) and candidate key ({}) must have the same number of columns",
                foreign_key.join(", "),
                candidate_key.join(", ")
            ),
            OrmError::UnsupportedFilter(kind) => {
                write!(f, "Filter chain '{}' is not supported", kind)
            }
            OrmError::UnsupportedArrayOperator { column, operator } => write!(
                f,
                "Unable to apply operator '{}' to a list of values for column '{}'",
                operator, column
            ),
            OrmError::UnsupportedFilterValue { column, value } => {
                write!(f, "Unable to bind value {} for column '{}'", value, column)
            }
            OrmError::DuplicateModel(name) => {
                write!(f, "Model '{}' is already registered", name)
            }
            OrmError::UnknownModel(name) => write!(f, "Model '{}' is not registered", name),
            OrmError::InvalidPath(path) => write!(f, "Invalid relation path '{}'", path),
            OrmError::AliasCollision { alias, path } => write!(
                f,
                "Path '{}' would join under alias '{}' which is already in use",
                path, alias
            ),
            OrmError::NewRecord { model, column } => write!(
                f,
                "Record of model '{}' has no value for key column '{}'",
                model, column
            ),
            OrmError::Config(msg) => write!(f, "Configuration error: {}", msg),
            OrmError::Execution(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for OrmError {}

impl From<config::ConfigError> for OrmError {
    fn from(error: config::ConfigError) -> Self {
        OrmError::Config(error.to_string())
    }
}
