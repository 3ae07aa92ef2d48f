//! Document form state for relation fields.
//!
//! Rows live in the form, keyed by field path. The provided mutators keep
//! every row's `position` equal to its index.

use crate::relations::AttachedRelation;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Form-level storage that relation controllers write into.
pub trait FormFieldStore {
    fn field(&self, field_path: &str) -> &[AttachedRelation];

    fn field_mut(&mut self, field_path: &str) -> &mut Vec<AttachedRelation>;

    fn append_row(&mut self, field_path: &str, value: AttachedRelation) {
        let rows = self.field_mut(field_path);
        rows.push(value);
        reindex(rows);
    }

    fn remove_row(&mut self, field_path: &str, index: usize) -> Option<AttachedRelation> {
        let rows = self.field_mut(field_path);
        if index >= rows.len() {
            return None;
        }
        let removed = rows.remove(index);
        reindex(rows);
        Some(removed)
    }

    fn move_row(&mut self, field_path: &str, from_index: usize, to_index: usize) {
        let rows = self.field_mut(field_path);
        if from_index >= rows.len() || to_index >= rows.len() {
            return;
        }
        let row = rows.remove(from_index);
        rows.insert(to_index, row);
        reindex(rows);
    }
}

/// Rewrite positions to `0..len`.
pub fn reindex(rows: &mut [AttachedRelation]) {
    for (index, row) in rows.iter_mut().enumerate() {
        row.position = index;
    }
}

/// In-memory form store.
#[derive(Debug, Default, Clone)]
pub struct MemoryFormStore {
    fields: HashMap<String, Vec<AttachedRelation>>,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormFieldStore for MemoryFormStore {
    fn field(&self, field_path: &str) -> &[AttachedRelation] {
        self.fields.get(field_path).map(Vec::as_slice).unwrap_or(&[])
    }

    fn field_mut(&mut self, field_path: &str) -> &mut Vec<AttachedRelation> {
        self.fields.entry(field_path.to_string()).or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRef {
    pub id: String,
}

/// `connect` / `disconnect` body for saving a relation field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationChanges {
    pub connect: Vec<RelationRef>,
    pub disconnect: Vec<RelationRef>,
}

impl RelationChanges {
    /// Diff the ids the server knows against the rows currently in the form.
    pub fn between(server_ids: &[String], rows: &[AttachedRelation]) -> Self {
        let current: HashSet<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        let known: HashSet<&str> = server_ids.iter().map(String::as_str).collect();

        let connect = rows
            .iter()
            .filter(|row| !known.contains(row.id.as_str()))
            .map(|row| RelationRef { id: row.id.clone() })
            .collect();
        let disconnect = server_ids
            .iter()
            .filter(|id| !current.contains(id.as_str()))
            .map(|id| RelationRef { id: id.clone() })
            .collect();

        Self { connect, disconnect }
    }

    pub fn is_empty(&self) -> bool {
        self.connect.is_empty() && self.disconnect.is_empty()
    }
}
