//! Framework plugins
//!
//! A plugin describes what a target framework offers (table options, column types, the
//! foreign-key naming convention), seeds new projects and proposes the default table and field
//! for "add" actions. Plugins never infer relations themselves: the update hooks are provided
//! methods that run the caller's consistency engine.

pub mod laravel;

use indexmap::IndexMap;
use std::fmt::Debug;
use uuid::Uuid;

use crate::dispatcher::Mutation;
use crate::error::{Error, Result};
use crate::export::GeneratedFile;
use crate::schema::engine::{ConsistencyEngine, FieldAttribute};
use crate::schema::store::EntityStore;
use crate::schema::types::{FieldType, Position, ProjectMeta, Relation};
use crate::utils::naming::{CapitalizeConvention, ForeignKeyResolver};

pub use laravel::LaravelPlugin;

/// A per-table toggle offered by a framework
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOption {
    pub id: &'static str,
    pub label: &'static str,
    pub default: bool,
}

/// Relation change reported by [`FrameworkPlugin::on_update_field`]
#[derive(Debug, Clone, PartialEq)]
pub enum RelationChange {
    Create(Relation),
    Delete(Relation),
    /// A stale relation retracted in favour of a new target
    Replace { stale: Relation, fresh: Relation },
}

/// Hooks a target framework provides to the editor
pub trait FrameworkPlugin: Send + Sync + Debug {
    /// Identifier used in configuration
    fn name(&self) -> &'static str;

    fn table_options(&self) -> Vec<TableOption>;

    fn field_types(&self) -> Vec<FieldType> {
        FieldType::ALL.to_vec()
    }

    fn resolver(&self) -> Box<dyn ForeignKeyResolver> {
        Box::new(CapitalizeConvention::default())
    }

    /// Schema a brand new project starts with
    fn on_init(&self) -> EntityStore;

    /// Default table proposed by an "add table" action
    fn on_create_table(&self, position: Option<Position>, existing: &EntityStore) -> Mutation;

    /// Default field proposed by an "add field" action
    fn on_create_field(&self, table_id: Uuid) -> Mutation;

    /// Render the project as framework source files
    fn export(&self, project: &ProjectMeta, store: &EntityStore) -> Result<Vec<GeneratedFile>>;

    /// Options map with every option at its default
    fn default_options(&self) -> IndexMap<String, bool> {
        self.table_options()
            .into_iter()
            .map(|o| (o.id.to_string(), o.default))
            .collect()
    }

    /// Relations a table rename would create
    fn on_update_table(
        &self,
        engine: &ConsistencyEngine,
        table_id: Uuid,
        new_name: &str,
        snapshot: &EntityStore,
    ) -> Result<Vec<Relation>> {
        let changes = engine.rename_table(snapshot, table_id, new_name)?;
        Ok(changes.created_relations().into_iter().cloned().collect())
    }

    /// Relation change a field update would cause, if any
    fn on_update_field(
        &self,
        engine: &ConsistencyEngine,
        field_id: Uuid,
        attribute: FieldAttribute,
        snapshot: &EntityStore,
    ) -> Result<Option<RelationChange>> {
        let changes = engine.update_field(snapshot, field_id, attribute)?;
        let stale = changes.deleted_relations().into_iter().next().cloned();
        let fresh = changes.created_relations().into_iter().next().cloned();

        Ok(match (stale, fresh) {
            (Some(stale), Some(fresh)) => Some(RelationChange::Replace { stale, fresh }),
            (Some(stale), None) => Some(RelationChange::Delete(stale)),
            (None, Some(fresh)) => Some(RelationChange::Create(fresh)),
            (None, None) => None,
        })
    }
}

/// Look up a bundled plugin by name
pub fn plugin_for(name: &str) -> Result<Box<dyn FrameworkPlugin>> {
    match name.to_lowercase().as_str() {
        "laravel" => Ok(Box::new(LaravelPlugin)),
        other => Err(Error::ConfigError(format!("Unknown framework: {}", other))),
    }
}
