//! Change sets
//!
//! The engine answers every mutation request with an ordered list of primitive deltas.
//! The entity store applies a change set as a single unit.

use uuid::Uuid;

use crate::schema::types::{Field, Relation, Table};

/// A primitive store operation
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    CreateTable(Table),
    UpdateTable(Table),
    DeleteTable(Uuid),
    CreateField(Field),
    UpdateField(Field),
    DeleteField(Uuid),
    CreateRelation(Relation),
    DeleteRelation(Relation),
}

/// Ordered deltas produced by one mutation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub deltas: Vec<Delta>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: Delta) {
        self.deltas.push(delta);
    }

    /// Append another change set after this one
    pub fn extend(&mut self, other: ChangeSet) {
        self.deltas.extend(other.deltas);
    }

    /// Check if the change set is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delta> {
        self.deltas.iter()
    }

    pub fn created_tables(&self) -> Vec<&Table> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::CreateTable(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn updated_tables(&self) -> Vec<&Table> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::UpdateTable(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_tables(&self) -> Vec<Uuid> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::DeleteTable(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn created_fields(&self) -> Vec<&Field> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::CreateField(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn updated_fields(&self) -> Vec<&Field> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::UpdateField(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_fields(&self) -> Vec<Uuid> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::DeleteField(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn created_relations(&self) -> Vec<&Relation> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::CreateRelation(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_relations(&self) -> Vec<&Relation> {
        self.deltas
            .iter()
            .filter_map(|d| match d {
                Delta::DeleteRelation(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Delta;
    type IntoIter = std::vec::IntoIter<Delta>;

    fn into_iter(self) -> Self::IntoIter {
        self.deltas.into_iter()
    }
}
