//! Consistency engine
//!
//! Every table or field mutation is turned into an ordered [`ChangeSet`] computed against an
//! immutable snapshot. Relations are derived state: the engine creates and retracts them as a
//! side effect of naming changes and cascades them on deletion, so that after applying a change
//! set each field resolving to an existing table owns exactly one relation to it and every other
//! field owns none.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::schema::diff::{ChangeSet, Delta};
use crate::schema::store::EntityStore;
use crate::schema::types::{Field, FieldSpec, FieldType, Position, Relation, Table};
use crate::utils::naming::{resolver_from_config, CapitalizeConvention, ForeignKeyResolver};

/// Field attribute targeted by an update
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAttribute {
    Name(String),
    Type(FieldType),
}

/// Invariant violation found by [`ConsistencyEngine::audit`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("field {field_id} belongs to missing table {table_id}")]
    OrphanField { field_id: Uuid, table_id: Uuid },

    #[error("relation {relation_id} references a missing or mismatched table or field")]
    DanglingRelation { relation_id: Uuid },

    #[error("field {field_id} owns more than one relation")]
    DuplicateRelation { field_id: Uuid },

    #[error("field {field_id} refers to table {table_id} but has no relation")]
    MissingRelation { field_id: Uuid, table_id: Uuid },

    #[error("relation {relation_id} on field {field_id} is not implied by the field name")]
    UnexpectedRelation { relation_id: Uuid, field_id: Uuid },

    #[error("relation {relation_id} points at {actual} instead of {expected}")]
    MisdirectedRelation {
        relation_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    #[error("table name `{0}` is used more than once")]
    DuplicateTableName(String),

    #[error("{0} has an empty name")]
    EmptyName(Uuid),
}

/// Computes change sets that keep the table/field/relation graph consistent
#[derive(Debug)]
pub struct ConsistencyEngine {
    resolver: Box<dyn ForeignKeyResolver>,
    infer_on_create: bool,
}

impl Default for ConsistencyEngine {
    fn default() -> Self {
        Self::new(Box::new(CapitalizeConvention::default()))
    }
}

impl ConsistencyEngine {
    /// Create an engine around a naming convention
    pub fn new(resolver: Box<dyn ForeignKeyResolver>) -> Self {
        Self {
            resolver,
            infer_on_create: false,
        }
    }

    /// Build the engine described by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolver = resolver_from_config(&config.naming)?;
        Ok(Self::new(resolver).with_inference_on_create(config.editor.infer_relations_on_create))
    }

    /// Infer relations for fields created with a foreign-key name.
    ///
    /// Off by default: fields only gain relations through a rename.
    pub fn with_inference_on_create(mut self, enabled: bool) -> Self {
        self.infer_on_create = enabled;
        self
    }

    pub fn infers_on_create(&self) -> bool {
        self.infer_on_create
    }

    pub fn resolver(&self) -> &dyn ForeignKeyResolver {
        self.resolver.as_ref()
    }

    /// Table id implied by a field name within the given tables
    pub fn implied_target(&self, field_name: &str, tables: &[&Table]) -> Option<Uuid> {
        self.resolver.resolve(field_name, tables).map(|t| t.id)
    }

    /// Create a table with its initial fields
    pub fn create_table(
        &self,
        snapshot: &EntityStore,
        name: &str,
        position: Position,
        options: IndexMap<String, bool>,
        fields: &[FieldSpec],
    ) -> Result<ChangeSet> {
        validate_name("table", name)?;
        ensure_unique_table_name(snapshot, name, None)?;
        for spec in fields {
            validate_name("field", &spec.name)?;
        }

        let table = Table::new(name, position).with_options(options);
        let new_fields: Vec<Field> = fields
            .iter()
            .map(|spec| Field::new(table.id, &spec.name, spec.field_type))
            .collect();

        let mut tables: Vec<&Table> = snapshot.tables().collect();
        tables.push(&table);

        let mut changes = ChangeSet::new();
        changes.push(Delta::CreateTable(table.clone()));
        for field in &new_fields {
            changes.push(Delta::CreateField(field.clone()));
        }

        // Existing fields that were waiting for a table of this name
        for field in snapshot.fields() {
            if snapshot.relation_for_field(field.id)?.is_some() {
                continue;
            }
            if self.implied_target(&field.name, &tables) == Some(table.id) {
                changes.push(Delta::CreateRelation(Relation::new(
                    field.id,
                    field.table_id,
                    table.id,
                )));
            }
        }

        if self.infer_on_create {
            for field in &new_fields {
                if let Some(target) = self.implied_target(&field.name, &tables) {
                    changes.push(Delta::CreateRelation(Relation::new(
                        field.id, table.id, target,
                    )));
                }
            }
        }

        tracing::debug!(
            table_id = %table.id,
            name = name,
            fields = new_fields.len(),
            relations = changes.created_relations().len(),
            "Table creation planned"
        );

        Ok(changes)
    }

    /// Rename a table and re-derive the relations that point at it
    pub fn rename_table(
        &self,
        snapshot: &EntityStore,
        table_id: Uuid,
        new_name: &str,
    ) -> Result<ChangeSet> {
        validate_name("table", new_name)?;
        let current = snapshot.require_table(table_id)?;
        ensure_unique_table_name(snapshot, new_name, Some(table_id))?;

        let mut renamed = current.clone();
        renamed.name = new_name.to_string();

        let tables: Vec<&Table> = snapshot
            .tables()
            .map(|t| if t.id == table_id { &renamed } else { t })
            .collect();

        let mut deletions = Vec::new();
        let mut creations = Vec::new();

        for field in snapshot.fields() {
            let existing = snapshot.relation_for_field(field.id)?;
            let target = self.implied_target(&field.name, &tables);

            let points_here = existing.map_or(false, |r| r.to_table_id == table_id);
            if !points_here && target != Some(table_id) {
                continue;
            }

            let (stale, fresh) = relink(field, existing, target);
            deletions.extend(stale);
            creations.extend(fresh);
        }

        tracing::debug!(
            table_id = %table_id,
            from = current.name.as_str(),
            to = new_name,
            created = creations.len(),
            deleted = deletions.len(),
            "Table rename planned"
        );

        let mut changes = ChangeSet::new();
        changes.push(Delta::UpdateTable(renamed.clone()));
        for relation in deletions {
            changes.push(Delta::DeleteRelation(relation));
        }
        for relation in creations {
            changes.push(Delta::CreateRelation(relation));
        }

        Ok(changes)
    }

    /// Delete a table together with its fields and every relation touching it
    pub fn delete_table(&self, snapshot: &EntityStore, table_id: Uuid) -> Result<ChangeSet> {
        snapshot.require_table(table_id)?;

        let owned: Vec<Uuid> = snapshot.fields_of(table_id).map(|f| f.id).collect();
        let owned_set: HashSet<Uuid> = owned.iter().copied().collect();

        let mut changes = ChangeSet::new();

        for relation in snapshot.relations() {
            if relation.to_table_id == table_id
                || relation.from_table_id == table_id
                || owned_set.contains(&relation.field_id)
            {
                changes.push(Delta::DeleteRelation(relation.clone()));
            }
        }
        for field_id in &owned {
            changes.push(Delta::DeleteField(*field_id));
        }
        changes.push(Delta::DeleteTable(table_id));

        tracing::debug!(
            table_id = %table_id,
            fields = owned.len(),
            relations = changes.deleted_relations().len(),
            "Table deletion planned"
        );

        Ok(changes)
    }

    /// Create a field under an existing table
    pub fn create_field(
        &self,
        snapshot: &EntityStore,
        table_id: Uuid,
        name: &str,
        field_type: FieldType,
    ) -> Result<ChangeSet> {
        validate_name("field", name)?;
        snapshot.require_table(table_id)?;

        let field = Field::new(table_id, name, field_type);

        let mut changes = ChangeSet::new();
        changes.push(Delta::CreateField(field.clone()));

        if self.infer_on_create {
            let tables: Vec<&Table> = snapshot.tables().collect();
            if let Some(target) = self.implied_target(name, &tables) {
                changes.push(Delta::CreateRelation(Relation::new(
                    field.id, table_id, target,
                )));
            }
        }

        tracing::debug!(field_id = %field.id, table_id = %table_id, name = name, "Field creation planned");

        Ok(changes)
    }

    /// Update a field's name or type; a name change re-derives its relation
    pub fn update_field(
        &self,
        snapshot: &EntityStore,
        field_id: Uuid,
        attribute: FieldAttribute,
    ) -> Result<ChangeSet> {
        let field = snapshot.require_field(field_id)?;
        let mut updated = field.clone();
        let mut changes = ChangeSet::new();

        match attribute {
            FieldAttribute::Name(name) => {
                validate_name("field", &name)?;
                let existing = snapshot.relation_for_field(field_id)?;
                let tables: Vec<&Table> = snapshot.tables().collect();
                let target = self.implied_target(&name, &tables);

                updated.name = name;
                let (stale, fresh) = relink(&updated, existing, target);

                tracing::debug!(
                    field_id = %field_id,
                    name = updated.name.as_str(),
                    retracted = stale.is_some(),
                    inferred = fresh.is_some(),
                    "Field rename planned"
                );

                if let Some(relation) = stale {
                    changes.push(Delta::DeleteRelation(relation));
                }
                changes.push(Delta::UpdateField(updated));
                if let Some(relation) = fresh {
                    changes.push(Delta::CreateRelation(relation));
                }
            }
            FieldAttribute::Type(field_type) => {
                updated.field_type = field_type;
                changes.push(Delta::UpdateField(updated));
            }
        }

        Ok(changes)
    }

    /// Delete a field and the relation it owns
    pub fn delete_field(&self, snapshot: &EntityStore, field_id: Uuid) -> Result<ChangeSet> {
        snapshot.require_field(field_id)?;

        let mut changes = ChangeSet::new();
        if let Some(relation) = snapshot.relation_for_field(field_id)? {
            changes.push(Delta::DeleteRelation(relation.clone()));
        }
        changes.push(Delta::DeleteField(field_id));

        tracing::debug!(field_id = %field_id, "Field deletion planned");

        Ok(changes)
    }

    /// Move a table on the canvas
    pub fn move_table(
        &self,
        snapshot: &EntityStore,
        table_id: Uuid,
        position: Position,
    ) -> Result<ChangeSet> {
        let mut table = snapshot.require_table(table_id)?.clone();
        table.position = position;

        let mut changes = ChangeSet::new();
        changes.push(Delta::UpdateTable(table));
        Ok(changes)
    }

    /// Toggle one of a table's framework options
    pub fn set_table_option(
        &self,
        snapshot: &EntityStore,
        table_id: Uuid,
        option: &str,
        enabled: bool,
    ) -> Result<ChangeSet> {
        validate_name("option", option)?;
        let mut table = snapshot.require_table(table_id)?.clone();
        table.options.insert(option.to_string(), enabled);

        let mut changes = ChangeSet::new();
        changes.push(Delta::UpdateTable(table));
        Ok(changes)
    }

    /// Compute the deltas that bring an arbitrary snapshot back to a consistent state
    pub fn reconcile(&self, snapshot: &EntityStore) -> Result<ChangeSet> {
        let tables: Vec<&Table> = snapshot.tables().collect();

        let orphans: Vec<Uuid> = snapshot
            .fields()
            .filter(|f| snapshot.table(f.table_id).is_none())
            .map(|f| f.id)
            .collect();
        let orphan_set: HashSet<Uuid> = orphans.iter().copied().collect();

        let mut kept: HashMap<Uuid, &Relation> = HashMap::new();
        let mut deletions: Vec<Relation> = Vec::new();

        for relation in snapshot.relations() {
            if !self.is_attached(snapshot, relation, &orphan_set)
                || kept.contains_key(&relation.field_id)
            {
                deletions.push(relation.clone());
                continue;
            }
            kept.insert(relation.field_id, relation);
        }

        let mut creations = Vec::new();
        for field in snapshot.fields().filter(|f| !orphan_set.contains(&f.id)) {
            let target = self.implied_target(&field.name, &tables);
            let (stale, fresh) = relink(field, kept.get(&field.id).copied(), target);
            deletions.extend(stale);
            creations.extend(fresh);
        }

        let mut changes = ChangeSet::new();
        for relation in deletions {
            changes.push(Delta::DeleteRelation(relation));
        }
        for field_id in orphans {
            changes.push(Delta::DeleteField(field_id));
        }
        for relation in creations {
            changes.push(Delta::CreateRelation(relation));
        }

        if !changes.is_empty() {
            tracing::info!(deltas = changes.len(), "Reconciliation needed");
        }

        Ok(changes)
    }

    /// List invariant violations without changing anything
    pub fn audit(&self, snapshot: &EntityStore) -> Vec<Violation> {
        let mut violations = Vec::new();
        let tables: Vec<&Table> = snapshot.tables().collect();

        let mut names = HashSet::new();
        for table in &tables {
            if table.name.trim().is_empty() {
                violations.push(Violation::EmptyName(table.id));
            } else if !names.insert(table.name.as_str()) {
                violations.push(Violation::DuplicateTableName(table.name.clone()));
            }
        }

        let mut orphan_set = HashSet::new();
        for field in snapshot.fields() {
            if field.name.trim().is_empty() {
                violations.push(Violation::EmptyName(field.id));
            }
            if snapshot.table(field.table_id).is_none() {
                orphan_set.insert(field.id);
                violations.push(Violation::OrphanField {
                    field_id: field.id,
                    table_id: field.table_id,
                });
            }
        }

        let mut by_field: HashMap<Uuid, &Relation> = HashMap::new();
        let mut duplicated = HashSet::new();
        for relation in snapshot.relations() {
            if !self.is_attached(snapshot, relation, &orphan_set) {
                violations.push(Violation::DanglingRelation {
                    relation_id: relation.id,
                });
                continue;
            }
            if by_field.contains_key(&relation.field_id) {
                if duplicated.insert(relation.field_id) {
                    violations.push(Violation::DuplicateRelation {
                        field_id: relation.field_id,
                    });
                }
                continue;
            }
            by_field.insert(relation.field_id, relation);
        }

        for field in snapshot.fields().filter(|f| !orphan_set.contains(&f.id)) {
            let target = self.implied_target(&field.name, &tables);
            match (by_field.get(&field.id), target) {
                (None, Some(table_id)) => violations.push(Violation::MissingRelation {
                    field_id: field.id,
                    table_id,
                }),
                (Some(relation), None) => violations.push(Violation::UnexpectedRelation {
                    relation_id: relation.id,
                    field_id: field.id,
                }),
                (Some(relation), Some(expected)) if relation.to_table_id != expected => {
                    violations.push(Violation::MisdirectedRelation {
                        relation_id: relation.id,
                        expected,
                        actual: relation.to_table_id,
                    })
                }
                _ => {}
            }
        }

        violations
    }

    fn is_attached(
        &self,
        snapshot: &EntityStore,
        relation: &Relation,
        orphans: &HashSet<Uuid>,
    ) -> bool {
        let field_ok = snapshot.field(relation.field_id).map_or(false, |f| {
            !orphans.contains(&f.id) && f.table_id == relation.from_table_id
        });
        field_ok
            && snapshot.table(relation.from_table_id).is_some()
            && snapshot.table(relation.to_table_id).is_some()
    }
}

/// Decide which relation to retract and which to create so that `field` points at `target`
fn relink(
    field: &Field,
    existing: Option<&Relation>,
    target: Option<Uuid>,
) -> (Option<Relation>, Option<Relation>) {
    match (existing, target) {
        (Some(relation), Some(target)) if relation.to_table_id == target => (None, None),
        (Some(relation), target) => (
            Some(relation.clone()),
            target.map(|t| Relation::new(field.id, field.table_id, t)),
        ),
        (None, Some(target)) => (None, Some(Relation::new(field.id, field.table_id, target))),
        (None, None) => (None, None),
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName(format!("{} name cannot be empty", kind)));
    }
    Ok(())
}

fn ensure_unique_table_name(
    snapshot: &EntityStore,
    name: &str,
    except: Option<Uuid>,
) -> Result<()> {
    match snapshot.table_by_name(name) {
        Some(other) if Some(other.id) != except => Err(Error::InvalidName(format!(
            "table name `{}` is already in use",
            name
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with(names: &[&str]) -> EntityStore {
        let tables = names
            .iter()
            .map(|n| Table::new(n, Position::default()))
            .collect();
        EntityStore::from_parts(tables, vec![], vec![])
    }

    fn id_of(store: &EntityStore, name: &str) -> Uuid {
        store.table_by_name(name).unwrap().id
    }

    #[test]
    fn test_relink_outcomes() {
        let table = Uuid::new_v4();
        let other = Uuid::new_v4();
        let field = Field::new(table, "user_id", FieldType::Integer);
        let relation = Relation::new(field.id, table, other);

        assert_eq!(relink(&field, Some(&relation), Some(other)), (None, None));
        assert_eq!(relink(&field, None, None), (None, None));

        let (stale, fresh) = relink(&field, Some(&relation), None);
        assert_eq!(stale, Some(relation.clone()));
        assert!(fresh.is_none());

        let (stale, fresh) = relink(&field, None, Some(other));
        assert!(stale.is_none());
        assert_eq!(fresh.map(|r| (r.field_id, r.to_table_id)), Some((field.id, other)));
    }

    #[test]
    fn test_create_table_rejects_empty_and_duplicate_names() {
        let store = store_with(&["User"]);
        let engine = ConsistencyEngine::default();

        assert!(matches!(
            engine.create_table(&store, "  ", Position::default(), IndexMap::new(), &[]),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            engine.create_table(&store, "User", Position::default(), IndexMap::new(), &[]),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            engine.create_table(
                &store,
                "Post",
                Position::default(),
                IndexMap::new(),
                &[FieldSpec::new("", FieldType::Integer)]
            ),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_create_field_keeps_legacy_behaviour_by_default() {
        let mut store = store_with(&["User", "Post"]);
        let engine = ConsistencyEngine::default();
        let post = id_of(&store, "Post");

        let changes = engine
            .create_field(&store, post, "user_id", FieldType::Integer)
            .unwrap();
        assert!(changes.created_relations().is_empty());
        store.apply(&changes).unwrap();

        // The field is reported as missing its relation until it is renamed
        assert_eq!(engine.audit(&store).len(), 1);
    }

    #[test]
    fn test_create_field_infers_when_enabled() {
        let store = store_with(&["User", "Post"]);
        let engine = ConsistencyEngine::default().with_inference_on_create(true);
        let post = id_of(&store, "Post");
        let user = id_of(&store, "User");

        let changes = engine
            .create_field(&store, post, "user_id", FieldType::Integer)
            .unwrap();
        let created = changes.created_relations();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].from_table_id, post);
        assert_eq!(created[0].to_table_id, user);
    }

    #[test]
    fn test_update_type_has_no_relation_effects() {
        let mut store = store_with(&["User", "Post"]);
        let engine = ConsistencyEngine::default();
        let post = id_of(&store, "Post");

        let changes = engine
            .create_field(&store, post, "field", FieldType::Integer)
            .unwrap();
        let field_id = changes.created_fields()[0].id;
        store.apply(&changes).unwrap();

        let changes = engine
            .update_field(&store, field_id, FieldAttribute::Type(FieldType::BigInt))
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.updated_fields()[0].field_type, FieldType::BigInt);
    }

    #[test]
    fn test_set_table_option() {
        let store = store_with(&["User"]);
        let engine = ConsistencyEngine::default();
        let user = id_of(&store, "User");

        let changes = engine
            .set_table_option(&store, user, "softDeletes", true)
            .unwrap();
        assert!(changes.updated_tables()[0].option("softDeletes"));
        assert!(matches!(
            engine.set_table_option(&store, Uuid::new_v4(), "softDeletes", true),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_audit_reports_orphans_and_dangling_relations() {
        let user = Table::new("User", Position::default());
        let orphan = Field::new(Uuid::new_v4(), "user_id", FieldType::Integer);
        let dangling = Relation::new(orphan.id, orphan.table_id, user.id);
        let store = EntityStore::from_parts(vec![user], vec![orphan.clone()], vec![dangling.clone()]);

        let violations = ConsistencyEngine::default().audit(&store);
        assert_eq!(
            violations,
            vec![
                Violation::OrphanField {
                    field_id: orphan.id,
                    table_id: orphan.table_id,
                },
                Violation::DanglingRelation {
                    relation_id: dangling.id,
                },
            ]
        );
    }
}
