mod build;
mod index;

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Endpoint, LayoutError, Result};

pub use build::{WorkingLink, WorkingNode, build};
pub use index::{AdjacencyEntry, AdjacencyIndex, ImportIndexes, build_indexes};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMetric {
    #[default]
    Rendered,
    Gzip,
    Brotli,
}

impl SizeMetric {
    pub fn label(self) -> &'static str {
        match self {
            Self::Rendered => "renderedLength",
            Self::Gzip => "gzipLength",
            Self::Brotli => "brotliLength",
        }
    }
}

impl FromStr for SizeMetric {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "rendered" | "renderedlength" => Ok(Self::Rendered),
            "gzip" | "gziplength" => Ok(Self::Gzip),
            "brotli" | "brotlilength" => Ok(Self::Brotli),
            other => Err(format!(
                "unknown size metric `{other}` (expected rendered, gzip or brotli)"
            )),
        }
    }
}

/// A module as supplied by the bundle analysis, keyed by its uid in [`RawGraph::nodes`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub rendered_length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gzip_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brotli_length: Option<f64>,
}

impl RawNode {
    pub fn new(id: impl Into<String>, rendered_length: f64) -> Self {
        Self {
            id: id.into(),
            rendered_length,
            gzip_length: None,
            brotli_length: None,
        }
    }

    /// Weight under `metric`; compressed sizes fall back to the rendered size when absent.
    pub fn metric(&self, metric: SizeMetric) -> f64 {
        match metric {
            SizeMetric::Rendered => self.rendered_length,
            SizeMetric::Gzip => self.gzip_length.unwrap_or(self.rendered_length),
            SizeMetric::Brotli => self.brotli_length.unwrap_or(self.rendered_length),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
}

impl RawEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: IndexMap<String, RawNode>,
    #[serde(default)]
    pub links: Vec<RawEdge>,
}

impl RawGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node-map positions of an edge's endpoints.
    pub(crate) fn endpoints(&self, edge_index: usize, edge: &RawEdge) -> Result<(usize, usize)> {
        let (source, ..) = self.resolve(edge_index, Endpoint::Source, &edge.source)?;
        let (target, ..) = self.resolve(edge_index, Endpoint::Target, &edge.target)?;
        Ok((source, target))
    }

    pub(crate) fn resolve(
        &self,
        edge_index: usize,
        endpoint: Endpoint,
        uid: &str,
    ) -> Result<(usize, &str, &RawNode)> {
        self.nodes
            .get_full(uid)
            .map(|(index, uid, node)| (index, uid.as_str(), node))
            .ok_or_else(|| LayoutError::MalformedGraph {
                edge_index,
                endpoint,
                uid: uid.to_owned(),
            })
    }

    pub fn top_by_metric(&self, metric: SizeMetric, limit: usize) -> Vec<&str> {
        let mut uids = self.nodes.keys().map(String::as_str).collect::<Vec<_>>();
        uids.sort_by(|a, b| {
            let a_weight = self.nodes[*a].metric(metric);
            let b_weight = self.nodes[*b].metric(metric);
            b_weight
                .total_cmp(&a_weight)
                .then_with(|| self.nodes[*a].id.cmp(&self.nodes[*b].id))
        });
        uids.truncate(limit);
        uids
    }
}
