//! The sorted, immutable object collection produced by one enumeration.

use super::object::ObjectRecord;
use std::{ops::Range, sync::Arc};

/// Full object collection, ordered newest first.
///
/// A snapshot is built once from a completed enumeration and never mutated;
/// reloading builds a new one. Clones share the same backing storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketSnapshot {
    records: Arc<[ObjectRecord]>,
}

impl BucketSnapshot {
    /// Sort `records` by `last_modified` descending and freeze them.
    ///
    /// The sort is stable, so records sharing a timestamp keep their
    /// enumeration order.
    pub fn from_enumeration(mut records: Vec<ObjectRecord>) -> Self {
        records.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Self {
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ObjectRecord> {
        self.records.get(index)
    }

    /// Position of the record with this exact key.
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.records.iter().position(|r| r.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position_of(key).is_some()
    }

    /// Records inside `range`, clamped to the snapshot bounds.
    ///
    /// A range starting past the end yields an empty slice.
    pub fn slice(&self, range: Range<usize>) -> &[ObjectRecord] {
        let len = self.records.len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        &self.records[start..end]
    }
}
