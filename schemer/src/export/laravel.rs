//! Laravel exporter
//!
//! Produces one Eloquent model and one migration per table.

use inflector::Inflector;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::export::GeneratedFile;
use crate::schema::store::EntityStore;
use crate::schema::types::{Field, FieldType, Table};
use crate::utils::naming::{apply_naming_convention, get_table_name};

/// Laravel model and migration generator
pub struct LaravelGenerator<'a> {
    store: &'a EntityStore,
    project_name: &'a str,
}

impl<'a> LaravelGenerator<'a> {
    /// Create a generator over a finalized snapshot
    pub fn new(store: &'a EntityStore, project_name: &'a str) -> Self {
        Self {
            store,
            project_name,
        }
    }

    /// Generate every model and migration for the project
    pub fn generate(&self) -> Result<Vec<GeneratedFile>> {
        let root = project_root(self.project_name)?;
        let mut files = Vec::new();

        for table in self.store.tables() {
            let model_name = model_name(table);
            let fields: Vec<&Field> = self.store.fields_of(table.id).collect();

            files.push(GeneratedFile::new(
                root.join("app").join(format!("{}.php", model_name)),
                self.generate_model(table, &fields),
            ));
            files.push(GeneratedFile::new(
                root.join("database")
                    .join("migrations")
                    .join(migration_file_name(table)),
                self.generate_migration(table, &fields)?,
            ));
        }

        tracing::info!(
            project = self.project_name,
            files = files.len(),
            "Laravel export generated"
        );

        Ok(files)
    }

    /// Generate the Eloquent model for a table
    pub fn generate_model(&self, table: &Table, fields: &[&Field]) -> String {
        let soft_deletes = table.option("softDeletes");
        let fillable = fields
            .iter()
            .map(|f| format!("'{}'", f.name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut php = String::from("<?php\n\nnamespace App;\n\n");
        php.push_str("use Illuminate\\Database\\Eloquent\\Model;\n");
        if soft_deletes {
            php.push_str("use Illuminate\\Database\\Eloquent\\SoftDeletes;\n");
        }
        php.push_str(&format!("\nclass {} extends Model\n{{\n", model_name(table)));
        if soft_deletes {
            php.push_str("    use SoftDeletes;\n\n");
        }
        php.push_str("    /**\n");
        php.push_str("     * The attributes that are mass assignable.\n");
        php.push_str("     *\n");
        php.push_str("     * @var array\n");
        php.push_str("     */\n");
        php.push_str(&format!("    protected $fillable = [{}];\n", fillable));
        php.push_str("}\n");

        php
    }

    /// Generate the create-table migration for a table
    pub fn generate_migration(&self, table: &Table, fields: &[&Field]) -> Result<String> {
        let table_name = get_table_name(&table.name);
        let class_name = format!("Create{}Table", table_name.to_pascal_case());

        let mut columns = Vec::new();
        if table.option("id") {
            columns.push("$table->increments('id');".to_string());
        }
        for field in fields {
            columns.push(column_definition(field));
        }
        for field in fields {
            if let Some(relation) = self.store.relation_for_field(field.id)? {
                let target = self.store.require_table(relation.to_table_id)?;
                columns.push(format!(
                    "$table->foreign('{}')->references('id')->on('{}');",
                    field.name,
                    get_table_name(&target.name)
                ));
            }
        }
        if table.option("rememberToken") {
            columns.push("$table->rememberToken();".to_string());
        }
        if table.option("softDeletes") {
            columns.push("$table->softDeletes();".to_string());
        }
        if table.option("timestamps") {
            columns.push("$table->timestamps();".to_string());
        }

        let mut php = String::from("<?php\n\n");
        php.push_str("use Illuminate\\Support\\Facades\\Schema;\n");
        php.push_str("use Illuminate\\Database\\Schema\\Blueprint;\n");
        php.push_str("use Illuminate\\Database\\Migrations\\Migration;\n\n");
        php.push_str(&format!("class {} extends Migration\n{{\n", class_name));
        php.push_str("    public function up()\n    {\n");
        php.push_str(&format!(
            "        Schema::create('{}', function (Blueprint $table) {{\n",
            table_name
        ));
        for column in &columns {
            php.push_str(&format!("            {}\n", column));
        }
        php.push_str("        });\n    }\n\n");
        php.push_str("    public function down()\n    {\n");
        php.push_str(&format!("        Schema::dropIfExists('{}');\n", table_name));
        php.push_str("    }\n}\n");

        Ok(php)
    }
}

/// The project name as a single directory below the export root
fn project_root(name: &str) -> Result<PathBuf> {
    if name.trim().is_empty() {
        return Err(Error::ExportError("Project name cannot be empty".to_string()));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(dir)), None) if !name.contains('\\') => Ok(PathBuf::from(dir)),
        _ => Err(Error::ExportError(format!(
            "Project name `{}` is not a plain directory name",
            name
        ))),
    }
}

fn model_name(table: &Table) -> String {
    apply_naming_convention(&table.name, "pascal_case")
}

/// `2019_01_01_000000_create_users_table.php`
pub fn migration_file_name(table: &Table) -> String {
    format!(
        "{}_create_{}_table.php",
        table.timestamp.format("%Y_%m_%d_%H%M%S"),
        get_table_name(&table.name)
    )
}

fn column_definition(field: &Field) -> String {
    match field.field_type {
        FieldType::Enum => format!("$table->enum('{}', []);", field.name),
        other => format!("$table->{}('{}');", blueprint_method(other), field.name),
    }
}

/// Blueprint method creating a column of the given type
pub fn blueprint_method(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::BigInt => "bigInteger",
        FieldType::Binary => "binary",
        FieldType::Boolean => "boolean",
        FieldType::Char => "char",
        FieldType::Date => "date",
        FieldType::DateTime => "dateTime",
        FieldType::DateTimeTz => "dateTimeTz",
        FieldType::Decimal => "decimal",
        FieldType::Double => "double",
        FieldType::Enum => "enum",
        FieldType::Float => "float",
        FieldType::Increment => "increments",
        FieldType::Integer => "integer",
        FieldType::IpAddress => "ipAddress",
        FieldType::Json => "json",
        FieldType::Jsonb => "jsonb",
        FieldType::LongText => "longText",
        FieldType::MacAddress => "macAddress",
        FieldType::MediumInt => "mediumInteger",
        FieldType::MediumText => "mediumText",
        FieldType::Morphs => "morphs",
        FieldType::NullableMorphs => "nullableMorphs",
        FieldType::SmallInt => "smallInteger",
        FieldType::String => "string",
        FieldType::Text => "text",
        FieldType::Time => "time",
        FieldType::TimeTz => "timeTz",
        FieldType::TinyInt => "tinyInteger",
        FieldType::Timestamp => "timestamp",
        FieldType::TimestampTz => "timestampTz",
        FieldType::UBigInt => "unsignedBigInteger",
        FieldType::UInt => "unsignedInteger",
        FieldType::UMediumInt => "unsignedMediumInteger",
        FieldType::USmallInt => "unsignedSmallInteger",
        FieldType::UTinyInt => "unsignedTinyInteger",
        FieldType::Uuid => "uuid",
    }
}
