//! Laravel framework plugin

use uuid::Uuid;

use crate::dispatcher::Mutation;
use crate::error::Result;
use crate::export::{GeneratedFile, LaravelGenerator};
use crate::plugins::{FrameworkPlugin, TableOption};
use crate::schema::store::EntityStore;
use crate::schema::types::{Field, FieldSpec, FieldType, Position, ProjectMeta, Table};
use crate::utils::naming::generate_unique_name;

const DEFAULT_TABLE_NAME: &str = "Table";
const DEFAULT_FIELD_NAME: &str = "field";

#[derive(Debug, Clone, Copy, Default)]
pub struct LaravelPlugin;

impl FrameworkPlugin for LaravelPlugin {
    fn name(&self) -> &'static str {
        "laravel"
    }

    fn table_options(&self) -> Vec<TableOption> {
        vec![
            TableOption {
                id: "id",
                label: "Increment ID",
                default: true,
            },
            TableOption {
                id: "rememberToken",
                label: "Remember Token",
                default: false,
            },
            TableOption {
                id: "softDeletes",
                label: "Soft Deletes",
                default: false,
            },
            TableOption {
                id: "timestamps",
                label: "Timestamps",
                default: true,
            },
        ]
    }

    fn on_init(&self) -> EntityStore {
        let mut options = self.default_options();
        options.insert("rememberToken".to_string(), true);

        let user = Table::new("User", Position::new(128.0, 128.0)).with_options(options);
        let fields = vec![
            Field::new(user.id, "name", FieldType::String),
            Field::new(user.id, "email", FieldType::String),
            Field::new(user.id, "password", FieldType::Text),
        ];

        EntityStore::from_parts(vec![user], fields, vec![])
    }

    fn on_create_table(&self, position: Option<Position>, existing: &EntityStore) -> Mutation {
        let taken: Vec<&str> = existing.tables().map(|t| t.name.as_str()).collect();

        Mutation::CreateTable {
            name: generate_unique_name(DEFAULT_TABLE_NAME, &taken),
            position,
            options: self.default_options(),
            fields: vec![FieldSpec::new(DEFAULT_FIELD_NAME, FieldType::Integer)],
        }
    }

    fn on_create_field(&self, table_id: Uuid) -> Mutation {
        Mutation::CreateField {
            table_id,
            name: DEFAULT_FIELD_NAME.to_string(),
            field_type: FieldType::Integer,
        }
    }

    fn export(&self, project: &ProjectMeta, store: &EntityStore) -> Result<Vec<GeneratedFile>> {
        LaravelGenerator::new(store, &project.name).generate()
    }
}
