//! Entity store
//!
//! Holds the table, field and relation collections in insertion order. The store performs
//! lookups and applies change sets; it never derives relations on its own.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::schema::diff::{ChangeSet, Delta};
use crate::schema::types::{Field, Relation, Table};

/// In-memory schema snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    tables: IndexMap<Uuid, Table>,
    fields: IndexMap<Uuid, Field>,
    relations: IndexMap<Uuid, Relation>,
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw collections without checking invariants
    pub fn from_parts(tables: Vec<Table>, fields: Vec<Field>, relations: Vec<Relation>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.id, t)).collect(),
            fields: fields.into_iter().map(|f| (f.id, f)).collect(),
            relations: relations.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    /// Split the store back into its collections, preserving order
    pub fn into_parts(self) -> (Vec<Table>, Vec<Field>, Vec<Relation>) {
        (
            self.tables.into_values().collect(),
            self.fields.into_values().collect(),
            self.relations.into_values().collect(),
        )
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn table(&self, id: Uuid) -> Option<&Table> {
        self.tables.get(&id)
    }

    pub fn field(&self, id: Uuid) -> Option<&Field> {
        self.fields.get(&id)
    }

    pub fn relation(&self, id: Uuid) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// Look up a table or fail with `NotFound`
    pub fn require_table(&self, id: Uuid) -> Result<&Table> {
        self.table(id).ok_or_else(|| Error::table_not_found(id))
    }

    /// Look up a field or fail with `NotFound`
    pub fn require_field(&self, id: Uuid) -> Result<&Field> {
        self.field(id).ok_or_else(|| Error::field_not_found(id))
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.values().find(|t| t.name == name)
    }

    /// Fields of a table, in creation order
    pub fn fields_of(&self, table_id: Uuid) -> impl Iterator<Item = &Field> {
        self.fields.values().filter(move |f| f.table_id == table_id)
    }

    /// The relation owned by a field, if any
    pub fn relation_for_field(&self, field_id: Uuid) -> Result<Option<&Relation>> {
        let mut owned = self.relations.values().filter(|r| r.field_id == field_id);
        let first = owned.next();
        if owned.next().is_some() {
            return Err(Error::DuplicateRelation(field_id));
        }
        Ok(first)
    }

    /// Relations pointing at a table
    pub fn relations_to(&self, table_id: Uuid) -> impl Iterator<Item = &Relation> {
        self.relations.values().filter(move |r| r.to_table_id == table_id)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.fields.is_empty() && self.relations.is_empty()
    }

    /// Apply a change set atomically: either every delta applies or the store is unchanged
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<()> {
        let mut staged = self.clone();

        for delta in changes.iter() {
            staged.apply_delta(delta)?;
        }

        *self = staged;

        tracing::debug!(
            deltas = changes.len(),
            tables = self.tables.len(),
            fields = self.fields.len(),
            relations = self.relations.len(),
            "Change set applied"
        );

        Ok(())
    }

    fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
        match delta {
            Delta::CreateTable(table) => {
                if self.tables.contains_key(&table.id) {
                    return Err(Error::ValidationError(format!(
                        "Table {} already exists",
                        table.id
                    )));
                }
                self.tables.insert(table.id, table.clone());
            }
            Delta::UpdateTable(table) => {
                let slot = self
                    .tables
                    .get_mut(&table.id)
                    .ok_or_else(|| Error::table_not_found(table.id))?;
                *slot = table.clone();
            }
            Delta::DeleteTable(id) => {
                if self.fields.values().any(|f| f.table_id == *id) {
                    return Err(Error::ValidationError(format!(
                        "Table {} still owns fields",
                        id
                    )));
                }
                if self
                    .relations
                    .values()
                    .any(|r| r.from_table_id == *id || r.to_table_id == *id)
                {
                    return Err(Error::ValidationError(format!(
                        "Table {} is still referenced by a relation",
                        id
                    )));
                }
                self.tables
                    .shift_remove(id)
                    .ok_or_else(|| Error::table_not_found(*id))?;
            }
            Delta::CreateField(field) => {
                if self.fields.contains_key(&field.id) {
                    return Err(Error::ValidationError(format!(
                        "Field {} already exists",
                        field.id
                    )));
                }
                self.require_table(field.table_id)?;
                self.fields.insert(field.id, field.clone());
            }
            Delta::UpdateField(field) => {
                let current = self.require_field(field.id)?;
                if current.table_id != field.table_id {
                    return Err(Error::ValidationError(format!(
                        "Field {} cannot move between tables",
                        field.id
                    )));
                }
                self.fields.insert(field.id, field.clone());
            }
            Delta::DeleteField(id) => {
                if self.relations.values().any(|r| r.field_id == *id) {
                    return Err(Error::ValidationError(format!(
                        "Field {} still owns a relation",
                        id
                    )));
                }
                self.fields
                    .shift_remove(id)
                    .ok_or_else(|| Error::field_not_found(*id))?;
            }
            Delta::CreateRelation(relation) => {
                let field = self.require_field(relation.field_id)?;
                if field.table_id != relation.from_table_id {
                    return Err(Error::ValidationError(format!(
                        "Relation {} does not start at the table owning field {}",
                        relation.id, relation.field_id
                    )));
                }
                self.require_table(relation.to_table_id)?;
                if self.relation_for_field(relation.field_id)?.is_some() {
                    tracing::error!(field_id = %relation.field_id, "Refusing to create a second relation");
                    return Err(Error::DuplicateRelation(relation.field_id));
                }
                self.relations.insert(relation.id, relation.clone());
            }
            Delta::DeleteRelation(relation) => {
                self.relations
                    .shift_remove(&relation.id)
                    .ok_or_else(|| Error::relation_not_found(relation.id))?;
            }
        }

        Ok(())
    }
}
