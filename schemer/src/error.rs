//! Error types for Schemer

use thiserror::Error;
use uuid::Uuid;

/// Result type for Schemer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of entity referenced by a failed lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Table,
    Field,
    Relation,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Table => write!(f, "table"),
            EntityKind::Field => write!(f, "field"),
            EntityKind::Relation => write!(f, "relation"),
        }
    }
}

/// Error types for Schemer
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Duplicate relation for field {0}")]
    DuplicateRelation(Uuid),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn table_not_found(id: Uuid) -> Self {
        Error::NotFound { kind: EntityKind::Table, id }
    }

    pub fn field_not_found(id: Uuid) -> Self {
        Error::NotFound { kind: EntityKind::Field, id }
    }

    pub fn relation_not_found(id: Uuid) -> Self {
        Error::NotFound { kind: EntityKind::Relation, id }
    }
}

/// Convert Serde JSON errors to Schemer errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to Schemer errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
