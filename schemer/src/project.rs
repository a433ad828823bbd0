//! Project file persistence
//!
//! A project is stored as a single pretty-printed JSON document holding the project metadata
//! and the three entity collections. Files written before relations were persisted lack the
//! `relations` key; those load with an empty list and are repaired by reconciliation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::plugins::FrameworkPlugin;
use crate::schema::engine::{ConsistencyEngine, Violation};
use crate::schema::store::EntityStore;
use crate::schema::types::{Field, ProjectMeta, Relation, Table};

/// On-disk representation of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub project: ProjectMeta,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl ProjectFile {
    /// Bundle a store snapshot with its project metadata
    pub fn from_store(project: ProjectMeta, store: &EntityStore) -> Self {
        let (tables, fields, relations) = store.clone().into_parts();
        Self {
            project,
            tables,
            fields,
            relations,
        }
    }

    /// Split into metadata and a populated store
    pub fn into_store(self) -> (ProjectMeta, EntityStore) {
        let store = EntityStore::from_parts(self.tables, self.fields, self.relations);
        (self.project, store)
    }

    /// Start a fresh project seeded by a framework plugin
    pub fn new_from_plugin(name: &str, zoom: u32, plugin: &dyn FrameworkPlugin) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName("project name cannot be empty".to_string()));
        }

        let store = plugin.on_init();
        tracing::info!(project = name, plugin = plugin.name(), tables = store.tables().count(), "Project created");
        Ok(Self::from_store(ProjectMeta::new(name, zoom), &store))
    }

    /// Read a project file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let project: ProjectFile = serde_json::from_str(&content)?;

        tracing::info!(
            path = %path.display(),
            tables = project.tables.len(),
            fields = project.fields.len(),
            relations = project.relations.len(),
            "Project loaded"
        );

        Ok(project)
    }

    /// Read a project file and reject it if it breaks a schema invariant.
    ///
    /// Fields awaiting their relation are accepted when the engine does not infer relations at
    /// creation time, since editing with that engine leaves them behind.
    pub fn load_validated(path: &Path, engine: &ConsistencyEngine) -> Result<Self> {
        let project = Self::load(path)?;
        let (meta, store) = project.into_store();

        let mut violations = engine.audit(&store);
        if !engine.infers_on_create() {
            violations.retain(|v| !matches!(v, Violation::MissingRelation { .. }));
        }
        if let Some(first) = violations.first() {
            return Err(Error::ValidationError(format!(
                "{} has {} schema violation(s), first: {}",
                path.display(),
                violations.len(),
                first
            )));
        }

        Ok(Self::from_store(meta, &store))
    }

    /// Write the project file to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        tracing::info!(path = %path.display(), "Project saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::LaravelPlugin;
    use crate::schema::types::{FieldType, Position};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_serialized_keys() {
        let user = Table::new("User", Position::new(1.0, 2.0));
        let post = Table::new("Post", Position::default());
        let user_id = Field::new(post.id, "user_id", FieldType::Integer);
        let relation = Relation::new(user_id.id, post.id, user.id);
        let store = EntityStore::from_parts(vec![user, post], vec![user_id], vec![relation]);

        let file = ProjectFile::from_store(ProjectMeta::new("blog", 100), &store);
        let json = serde_json::to_value(&file).unwrap();

        assert_eq!(json["project"]["name"], "blog");
        assert!(json["project"]["timestamp"].is_i64());
        assert_eq!(json["fields"][0]["type"], "INTEGER");
        assert!(json["fields"][0]["tableID"].is_string());
        assert!(json["relations"][0]["fieldID"].is_string());
        assert!(json["relations"][0]["fromTableID"].is_string());
        assert!(json["relations"][0]["toTableID"].is_string());
    }

    #[test]
    fn test_new_from_plugin_seeds_user_table() {
        let file = ProjectFile::new_from_plugin("shop", 100, &LaravelPlugin).unwrap();

        assert_eq!(file.project.name, "shop");
        assert_eq!(file.tables.len(), 1);
        assert_eq!(file.tables[0].name, "User");
        assert_eq!(file.fields.len(), 3);
        assert!(file.relations.is_empty());
    }

    #[test]
    fn test_new_from_plugin_requires_name() {
        assert!(matches!(
            ProjectFile::new_from_plugin("  ", 100, &LaravelPlugin),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("shop.json");

        let file = ProjectFile::new_from_plugin("shop", 80, &LaravelPlugin).unwrap();
        file.save(&path).unwrap();

        let loaded = ProjectFile::load(&path).unwrap();
        assert_eq!(loaded, file);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"project\": ").unwrap();

        assert!(matches!(
            ProjectFile::load(&path),
            Err(Error::SerializationError(_))
        ));
    }
}
