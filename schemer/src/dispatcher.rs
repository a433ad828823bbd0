//! Mutation dispatcher
//!
//! The single entry point through which editor surfaces, plugins and importers request schema
//! changes. It forwards each request to the consistency engine and hands back the resulting
//! change set; callers apply it to their store.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::error::Result;
use crate::schema::diff::ChangeSet;
use crate::schema::engine::{ConsistencyEngine, FieldAttribute};
use crate::schema::layout::{free_position, Bounds};
use crate::schema::store::EntityStore;
use crate::schema::types::{FieldSpec, FieldType, Position};

/// A mutation intent
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateTable {
        name: String,
        /// Picked at random on the canvas when absent
        position: Option<Position>,
        options: IndexMap<String, bool>,
        fields: Vec<FieldSpec>,
    },
    RenameTable {
        table_id: Uuid,
        name: String,
    },
    DeleteTable {
        table_id: Uuid,
    },
    MoveTable {
        table_id: Uuid,
        position: Position,
    },
    SetTableOption {
        table_id: Uuid,
        option: String,
        enabled: bool,
    },
    CreateField {
        table_id: Uuid,
        name: String,
        field_type: FieldType,
    },
    UpdateField {
        field_id: Uuid,
        attribute: FieldAttribute,
    },
    DeleteField {
        field_id: Uuid,
    },
}

impl Mutation {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::CreateTable { .. } => "create_table",
            Mutation::RenameTable { .. } => "rename_table",
            Mutation::DeleteTable { .. } => "delete_table",
            Mutation::MoveTable { .. } => "move_table",
            Mutation::SetTableOption { .. } => "set_table_option",
            Mutation::CreateField { .. } => "create_field",
            Mutation::UpdateField { .. } => "update_field",
            Mutation::DeleteField { .. } => "delete_field",
        }
    }

    /// Rename a field
    pub fn rename_field(field_id: Uuid, name: &str) -> Self {
        Mutation::UpdateField {
            field_id,
            attribute: FieldAttribute::Name(name.to_string()),
        }
    }

    /// Change a field's type
    pub fn retype_field(field_id: Uuid, field_type: FieldType) -> Self {
        Mutation::UpdateField {
            field_id,
            attribute: FieldAttribute::Type(field_type),
        }
    }
}

/// Stateless facade over the consistency engine
#[derive(Debug, Clone, Copy)]
pub struct MutationDispatcher<'a> {
    engine: &'a ConsistencyEngine,
    bounds: Bounds,
}

impl<'a> MutationDispatcher<'a> {
    /// Create a dispatcher placing new tables within `bounds`
    pub fn new(engine: &'a ConsistencyEngine, bounds: Bounds) -> Self {
        Self { engine, bounds }
    }

    /// Compute the change set for a mutation against the given snapshot
    pub fn dispatch(&self, mutation: Mutation, snapshot: &EntityStore) -> Result<ChangeSet> {
        let kind = mutation.kind();

        let result = match mutation {
            Mutation::CreateTable {
                name,
                position,
                options,
                fields,
            } => {
                let position = position.unwrap_or_else(|| {
                    let taken: Vec<Position> = snapshot.tables().map(|t| t.position).collect();
                    free_position(&taken, self.bounds, &mut rand::thread_rng())
                });
                self.engine
                    .create_table(snapshot, &name, position, options, &fields)
            }
            Mutation::RenameTable { table_id, name } => {
                self.engine.rename_table(snapshot, table_id, &name)
            }
            Mutation::DeleteTable { table_id } => self.engine.delete_table(snapshot, table_id),
            Mutation::MoveTable { table_id, position } => {
                self.engine.move_table(snapshot, table_id, position)
            }
            Mutation::SetTableOption {
                table_id,
                option,
                enabled,
            } => self
                .engine
                .set_table_option(snapshot, table_id, &option, enabled),
            Mutation::CreateField {
                table_id,
                name,
                field_type,
            } => self
                .engine
                .create_field(snapshot, table_id, &name, field_type),
            Mutation::UpdateField {
                field_id,
                attribute,
            } => self.engine.update_field(snapshot, field_id, attribute),
            Mutation::DeleteField { field_id } => self.engine.delete_field(snapshot, field_id),
        };

        match &result {
            Ok(changes) => {
                tracing::debug!(mutation = kind, deltas = changes.len(), "Mutation dispatched")
            }
            Err(e) => tracing::warn!(mutation = kind, error = %e, "Mutation rejected"),
        }

        result
    }
}
