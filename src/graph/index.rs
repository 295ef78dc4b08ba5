use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Endpoint, Result};

use super::{RawGraph, RawNode};

/// Snapshot of a module taken when the index was built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdjacencyEntry {
    pub uid: String,
    #[serde(flatten)]
    pub node: RawNode,
}

/// One-to-many map from uid to the modules on the other end of its edges, in edge order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AdjacencyIndex {
    entries: IndexMap<String, Vec<AdjacencyEntry>>,
}

impl AdjacencyIndex {
    pub fn get(&self, uid: &str) -> Option<&[AdjacencyEntry]> {
        self.entries.get(uid).map(Vec::as_slice)
    }

    pub fn contains_key(&self, uid: &str) -> bool {
        self.entries.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AdjacencyEntry])> {
        self.entries
            .iter()
            .map(|(uid, entries)| (uid.as_str(), entries.as_slice()))
    }

    /// Entries for `uid` with repeated module ids dropped; the first occurrence wins.
    pub fn unique_by_id(&self, uid: &str) -> Vec<&AdjacencyEntry> {
        let Some(entries) = self.entries.get(uid) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        entries
            .iter()
            .filter(|entry| seen.insert(entry.node.id.as_str()))
            .collect()
    }

    fn push(&mut self, key: &str, uid: &str, node: &RawNode) {
        self.entries
            .entry(key.to_owned())
            .or_default()
            .push(AdjacencyEntry {
                uid: uid.to_owned(),
                node: node.clone(),
            });
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportIndexes {
    pub imported_by: AdjacencyIndex,
    pub imports: AdjacencyIndex,
}

pub fn build_indexes(graph: &RawGraph) -> Result<ImportIndexes> {
    let mut indexes = ImportIndexes::default();

    for (edge_index, edge) in graph.links.iter().enumerate() {
        let (_, source_uid, source_node) =
            graph.resolve(edge_index, Endpoint::Source, &edge.source)?;
        let (_, target_uid, target_node) =
            graph.resolve(edge_index, Endpoint::Target, &edge.target)?;

        indexes.imported_by.push(target_uid, source_uid, source_node);
        indexes.imports.push(source_uid, target_uid, target_node);
    }

    Ok(indexes)
}
