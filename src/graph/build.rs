use nalgebra::Vector2;

use crate::error::Result;

use super::{RawGraph, RawNode, SizeMetric};

/// Simulation-owned copy of a module; `position` is only meaningful after layout.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkingNode {
    pub uid: String,
    pub attrs: RawNode,
    pub position: Vector2<f64>,
    pub(crate) velocity: Vector2<f64>,
}

impl WorkingNode {
    fn new(uid: &str, attrs: &RawNode) -> Self {
        Self {
            uid: uid.to_owned(),
            attrs: attrs.clone(),
            position: Vector2::zeros(),
            velocity: Vector2::zeros(),
        }
    }

    pub fn id(&self) -> &str {
        &self.attrs.id
    }

    pub fn rendered_length(&self) -> f64 {
        self.attrs.rendered_length
    }

    pub fn weight(&self, metric: SizeMetric) -> f64 {
        self.attrs.metric(metric)
    }
}

/// A dependency edge; `source` and `target` index into the node sequence it was built with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkingLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

impl WorkingLink {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

pub fn build(graph: &RawGraph) -> Result<(Vec<WorkingNode>, Vec<WorkingLink>)> {
    let nodes = graph
        .nodes
        .iter()
        .map(|(uid, attrs)| WorkingNode::new(uid, attrs))
        .collect::<Vec<_>>();

    let mut links = Vec::with_capacity(graph.links.len());
    for (edge_index, edge) in graph.links.iter().enumerate() {
        let (source, target) = graph.endpoints(edge_index, edge)?;
        links.push(WorkingLink {
            source,
            target,
            value: 1.0,
        });
    }

    Ok((nodes, links))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::graph::RawEdge;

    fn graph(nodes: &[(&str, &str, f64)], links: &[(&str, &str)]) -> RawGraph {
        RawGraph {
            nodes: nodes
                .iter()
                .map(|(uid, id, length)| ((*uid).to_owned(), RawNode::new(*id, *length)))
                .collect(),
            links: links
                .iter()
                .map(|(source, target)| RawEdge::new(*source, *target))
                .collect(),
        }
    }

    #[test]
    fn keeps_node_order_and_resolves_endpoints() {
        let graph = graph(
            &[("u2", "b.js", 3.0), ("u1", "a.js", 9.0), ("u3", "c.js", 0.0)],
            &[("u1", "u3"), ("u2", "u1")],
        );

        let (nodes, links) = build(&graph).unwrap();
        let uids = nodes.iter().map(|node| node.uid.as_str()).collect::<Vec<_>>();
        assert_eq!(uids, vec!["u2", "u1", "u3"]);
        assert_eq!(nodes[1].id(), "a.js");
        assert_eq!(nodes[1].rendered_length(), 9.0);

        assert_eq!(nodes[links[0].source].uid, "u1");
        assert_eq!(nodes[links[0].target].uid, "u3");
        assert_eq!(nodes[links[1].source].uid, "u2");
        assert!(links.iter().all(|link| link.value == 1.0));
    }

    #[test]
    fn duplicate_edges_are_not_coalesced() {
        let graph = graph(
            &[("a", "a", 1.0), ("b", "b", 1.0)],
            &[("a", "b"), ("a", "b"), ("b", "b")],
        );

        let (nodes, links) = build(&graph).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0], links[1]);
        assert!(links[2].is_self_loop());
    }

    #[test]
    fn rejects_edges_to_unknown_uids() {
        let graph = graph(&[("a", "a", 1.0)], &[("a", "a"), ("ghost", "a")]);

        let error = build(&graph).unwrap_err();
        assert!(matches!(error, LayoutError::MalformedGraph { edge_index: 1, .. }));
    }

    #[test]
    fn empty_graph_builds_empty_sequences() {
        let (nodes, links) = build(&RawGraph::default()).unwrap();
        assert!(nodes.is_empty());
        assert!(links.is_empty());
    }
}
