//! Schema module for Schemer
//!
//! This module holds the schema model, the entity store and the consistency engine.

pub mod diff;
pub mod engine;
pub mod layout;
pub mod store;
pub mod types;

// Re-export key types
pub use diff::{ChangeSet, Delta};
pub use engine::{ConsistencyEngine, FieldAttribute, Violation};
pub use layout::{Bounds, Connector, DragSession};
pub use store::EntityStore;
pub use types::{Field, FieldSpec, FieldType, Position, ProjectMeta, Relation, Table};
