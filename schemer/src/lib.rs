//! Schemer: the schema consistency core of a visual database designer
//!
//! Tables, fields and the foreign-key relations inferred from field names are kept consistent
//! by a single engine. Every edit goes through the mutation dispatcher, comes back as an
//! ordered change set and is applied atomically to the entity store.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod export;
pub mod plugins;
pub mod project;
pub mod schema;
pub mod utils;

use std::path::{Path, PathBuf};

// Re-export main types for easier access
pub use config::Config;
pub use dispatcher::{Mutation, MutationDispatcher};
pub use error::{Error, Result};
pub use plugins::{FrameworkPlugin, LaravelPlugin};
pub use project::ProjectFile;
pub use schema::{ChangeSet, ConsistencyEngine, EntityStore, Violation};

use config::NamingConfig;
use plugins::RelationChange;
use schema::engine::FieldAttribute;
use schema::layout::Bounds;
use schema::types::{Position, ProjectMeta, Relation};
use utils::naming::resolver_from_config;

/// Load the configuration file and open a project with it
pub fn init(config_path: &str, project_path: &Path) -> Result<SchemaEditor> {
    let config = config::load_from_file(config_path)?;
    SchemaEditor::open(config, project_path)
}

/// Engine for a session: `[naming]` wins when set, otherwise the framework's convention
fn session_engine(config: &Config, plugin: &dyn FrameworkPlugin) -> Result<ConsistencyEngine> {
    let resolver = if config.naming == NamingConfig::default() {
        plugin.resolver()
    } else {
        resolver_from_config(&config.naming)?
    };
    Ok(ConsistencyEngine::new(resolver)
        .with_inference_on_create(config.editor.infer_relations_on_create))
}

/// An editing session over one project
#[derive(Debug)]
pub struct SchemaEditor {
    config: Config,
    engine: ConsistencyEngine,
    plugin: Box<dyn FrameworkPlugin>,
    project: ProjectMeta,
    store: EntityStore,
    path: Option<PathBuf>,
    modified: bool,
}

impl SchemaEditor {
    /// Start a new, unsaved project seeded by the configured framework
    pub fn new(config: Config, name: &str) -> Result<Self> {
        let plugin = plugins::plugin_for(&config.export.framework)?;
        let file = ProjectFile::new_from_plugin(name, config.project.default_zoom, plugin.as_ref())?;
        let (project, store) = file.into_store();

        Ok(Self {
            engine: session_engine(&config, plugin.as_ref())?,
            config,
            plugin,
            project,
            store,
            path: None,
            modified: true,
        })
    }

    /// Open a project file
    pub fn open(config: Config, path: &Path) -> Result<Self> {
        let plugin = plugins::plugin_for(&config.export.framework)?;
        let engine = session_engine(&config, plugin.as_ref())?;

        let file = if config.project.validate_on_load {
            ProjectFile::load_validated(path, &engine)?
        } else {
            ProjectFile::load(path)?
        };
        let (project, store) = file.into_store();

        Ok(Self {
            config,
            engine,
            plugin,
            project,
            store,
            path: Some(path.to_path_buf()),
            modified: false,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &ConsistencyEngine {
        &self.engine
    }

    pub fn plugin(&self) -> &dyn FrameworkPlugin {
        self.plugin.as_ref()
    }

    pub fn project(&self) -> &ProjectMeta {
        &self.project
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the session has changes not yet written to disk
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Dispatcher bound to this session's engine and canvas
    pub fn dispatcher(&self) -> MutationDispatcher<'_> {
        MutationDispatcher::new(
            &self.engine,
            Bounds::new(self.config.editor.canvas_width, self.config.editor.canvas_height),
        )
    }

    /// Dispatch a mutation and apply its change set.
    ///
    /// On error the store is left untouched.
    pub fn apply(&mut self, mutation: Mutation) -> Result<ChangeSet> {
        let changes = self.dispatcher().dispatch(mutation, &self.store)?;
        self.commit(&changes)?;
        Ok(changes)
    }

    /// Add the framework's default table
    pub fn add_table(&mut self, position: Option<Position>) -> Result<ChangeSet> {
        let mutation = self.plugin.on_create_table(position, &self.store);
        self.apply(mutation)
    }

    /// Add the framework's default field to a table
    pub fn add_field(&mut self, table_id: uuid::Uuid) -> Result<ChangeSet> {
        let mutation = self.plugin.on_create_field(table_id);
        self.apply(mutation)
    }

    /// Relations the framework would see created by renaming a table
    pub fn preview_table_rename(&self, table_id: uuid::Uuid, new_name: &str) -> Result<Vec<Relation>> {
        self.plugin
            .on_update_table(&self.engine, table_id, new_name, &self.store)
    }

    /// Relation change the framework would see from a field update
    pub fn preview_field_update(
        &self,
        field_id: uuid::Uuid,
        attribute: FieldAttribute,
    ) -> Result<Option<RelationChange>> {
        self.plugin
            .on_update_field(&self.engine, field_id, attribute, &self.store)
    }

    /// Invariant violations in the current store
    pub fn audit(&self) -> Vec<Violation> {
        self.engine.audit(&self.store)
    }

    /// Repair relations and orphaned fields
    pub fn reconcile(&mut self) -> Result<ChangeSet> {
        let changes = self.engine.reconcile(&self.store)?;
        self.commit(&changes)?;
        Ok(changes)
    }

    pub fn set_zoom(&mut self, zoom: u32) {
        if self.project.zoom != zoom {
            self.project.zoom = zoom;
            self.modified = true;
        }
    }

    /// Save to the path the project was opened from or last saved to
    pub fn save(&mut self) -> Result<PathBuf> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| Error::Unknown("Project has no file path yet".to_string()))?;
        self.save_as(&path)?;
        Ok(path)
    }

    /// Save to a new path and remember it
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        ProjectFile::from_store(self.project.clone(), &self.store).save(path)?;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Generate framework sources under `output_dir`, or the configured export directory
    pub fn export(&self, output_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
        let root = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.export.output_directory));

        let files = self.plugin.export(&self.project, &self.store)?;
        export::write_files(&root, &files)
            .map_err(|e| Error::ExportError(format!("Failed to write {}: {}", root.display(), e)))
    }

    fn commit(&mut self, changes: &ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.store.apply(changes)?;
        self.modified = true;
        Ok(())
    }
}
