//! Grouping stage: partition records by a categorical dimension

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{GroupField, ProductionRecord, ALL_GROUP, UNKNOWN_GROUP};

/// Records sharing one group key, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordGroup<'a> {
    pub key: String,
    pub records: Vec<&'a ProductionRecord>,
}

/// Ordered partition of a dataset.
///
/// Groups appear in the order their key was first seen, so output never
/// depends on hash iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedDataset<'a> {
    pub group_field: Option<GroupField>,
    groups: Vec<RecordGroup<'a>>,
}

impl<'a> GroupedDataset<'a> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordGroup<'a>> {
        self.groups.iter()
    }

    pub fn groups(&self) -> &[RecordGroup<'a>] {
        &self.groups
    }

    pub fn get(&self, key: &str) -> Option<&RecordGroup<'a>> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key.as_str())
    }

    /// Sum of all group sizes; equals the input length.
    pub fn total_records(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }
}

impl<'a> IntoIterator for GroupedDataset<'a> {
    type Item = RecordGroup<'a>;
    type IntoIter = std::vec::IntoIter<RecordGroup<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Partition `records` on `key`.
///
/// - No key: one `"all"` group holding every record (even when empty).
/// - A record missing the dimension goes to the `"unknown"` group; nothing
///   is dropped.
/// - Keys compare exactly (case-sensitive).
pub fn group<'a>(records: &[&'a ProductionRecord], key: Option<GroupField>) -> GroupedDataset<'a> {
    let Some(field) = key else {
        return GroupedDataset {
            group_field: None,
            groups: vec![RecordGroup {
                key: ALL_GROUP.to_string(),
                records: records.to_vec(),
            }],
        };
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RecordGroup<'a>> = Vec::new();
    let mut unknown = 0usize;

    for &record in records {
        let group_key = record.dimension(field).unwrap_or_else(|| {
            unknown += 1;
            UNKNOWN_GROUP.to_string()
        });
        match index.get(&group_key) {
            Some(&i) => groups[i].records.push(record),
            None => {
                index.insert(group_key.clone(), groups.len());
                groups.push(RecordGroup {
                    key: group_key,
                    records: vec![record],
                });
            }
        }
    }

    debug!(
        field = %field,
        records = records.len(),
        groups = groups.len(),
        unknown,
        "Records grouped"
    );

    GroupedDataset {
        group_field: Some(field),
        groups,
    }
}
