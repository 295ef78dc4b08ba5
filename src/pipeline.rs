use std::thread;

use nalgebra::Vector2;
use serde::Serialize;
use tracing::{debug, debug_span};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::graph::{
    AdjacencyIndex, ImportIndexes, RawGraph, RawNode, SizeMetric, WorkingLink, build,
    build_indexes,
};
use crate::layout::{Bounds, Normalization, Viewport, normalize};
use crate::physics::{SimulationStats, simulate};
use crate::scale::SizeScale;

/// Read-only snapshot of a laid-out module.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub uid: String,
    #[serde(flatten)]
    pub attrs: RawNode,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl LayoutNode {
    pub fn id(&self) -> &str {
        &self.attrs.id
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ResolvedLink<'a> {
    pub source: &'a LayoutNode,
    pub target: &'a LayoutNode,
    pub value: f64,
}

#[derive(Clone, Debug)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub links: Vec<WorkingLink>,
    pub scale: SizeScale,
    pub metric: SizeMetric,
    pub viewport: Viewport,
    pub normalization: Option<Normalization>,
    pub stats: SimulationStats,
}

impl Layout {
    pub fn resolved_links(&self) -> impl Iterator<Item = ResolvedLink<'_>> {
        self.links.iter().map(|link| ResolvedLink {
            source: &self.nodes[link.source],
            target: &self.nodes[link.target],
            value: link.value,
        })
    }

    pub fn node(&self, uid: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| node.uid == uid)
    }

    pub fn radius_of(&self, node: &LayoutNode) -> f64 {
        self.scale.radius(node.attrs.metric(self.metric))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(self.nodes.iter().map(|node| Vector2::new(node.x, node.y)))
    }
}

/// Everything the renderer needs: coordinates, resolved links, the size scale and both
/// import indexes.
#[derive(Clone, Debug)]
pub struct LayoutOutput {
    pub layout: Layout,
    pub indexes: ImportIndexes,
}

/// Builds, simulates and normalizes the graph. Fails only on edges naming unknown uids.
pub fn compute_layout(
    graph: &RawGraph,
    viewport: Viewport,
    config: &LayoutConfig,
) -> Result<Layout> {
    let config = &config.sanitized();
    let (mut nodes, links) = build(graph)?;
    let scale = SizeScale::for_nodes(&nodes, config.metric, config);
    let radii = nodes
        .iter()
        .map(|node| scale.radius(node.weight(config.metric)))
        .collect::<Vec<_>>();

    let stats = simulate(&mut nodes, &links, &radii, viewport, config);
    let normalization = normalize(&mut nodes, viewport);

    let nodes = nodes
        .into_iter()
        .zip(radii)
        .map(|(node, radius)| LayoutNode {
            uid: node.uid,
            attrs: node.attrs,
            x: node.position.x,
            y: node.position.y,
            radius,
        })
        .collect();

    Ok(Layout {
        nodes,
        links,
        scale,
        metric: config.metric,
        viewport,
        normalization,
        stats,
    })
}

/// Full pipeline. The import indexes only read the raw graph, so they are built on a second
/// thread while the simulation runs; both halves must succeed for a result to be returned.
pub fn run(graph: &RawGraph, viewport: Viewport, config: &LayoutConfig) -> Result<LayoutOutput> {
    let span = debug_span!("layout", nodes = graph.node_count(), links = graph.link_count());
    let _guard = span.enter();

    let (layout, indexes) = thread::scope(|scope| {
        let indexes = scope.spawn(|| build_indexes(graph));
        let layout = compute_layout(graph, viewport, config);
        let indexes = indexes
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (layout, indexes)
    });

    let output = LayoutOutput {
        layout: layout?,
        indexes: indexes?,
    };
    debug!(
        rotated = output
            .layout
            .normalization
            .is_some_and(|normalization| normalization.rotated),
        imported_by = output.indexes.imported_by.len(),
        imports = output.indexes.imports.len(),
        "layout ready"
    );
    Ok(output)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkRecord<'a> {
    source: &'a str,
    target: &'a str,
    value: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputDocument<'a> {
    width: f64,
    height: f64,
    metric: SizeMetric,
    nodes: &'a [LayoutNode],
    links: Vec<LinkRecord<'a>>,
    imported_by: &'a AdjacencyIndex,
    imports: &'a AdjacencyIndex,
}

impl Serialize for LayoutOutput {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let links = self
            .layout
            .resolved_links()
            .map(|link| LinkRecord {
                source: &link.source.uid,
                target: &link.target.uid,
                value: link.value,
            })
            .collect();

        OutputDocument {
            width: self.layout.viewport.width,
            height: self.layout.viewport.height,
            metric: self.layout.metric,
            nodes: &self.layout.nodes,
            links,
            imported_by: &self.indexes.imported_by,
            imports: &self.indexes.imports,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::graph::RawEdge;

    fn two_module_graph() -> RawGraph {
        let mut graph = RawGraph::default();
        graph.nodes.insert("a".into(), RawNode::new("a", 100.0));
        graph.nodes.insert("b".into(), RawNode::new("b", 0.0));
        graph.links.push(RawEdge::new("a", "b"));
        graph
    }

    #[test]
    fn snapshots_carry_radius_from_scale() {
        let layout =
            compute_layout(&two_module_graph(), Viewport::default(), &LayoutConfig::default())
                .unwrap();

        let a = layout.node("a").unwrap();
        let b = layout.node("b").unwrap();
        assert_eq!(a.radius, 30.0);
        assert_eq!(b.radius, 5.0);
        assert_eq!(layout.radius_of(a), a.radius);
    }

    #[test]
    fn resolved_links_point_at_snapshots() {
        let layout =
            compute_layout(&two_module_graph(), Viewport::default(), &LayoutConfig::default())
                .unwrap();

        let link = layout.resolved_links().next().unwrap();
        assert_eq!(link.source.uid, "a");
        assert_eq!(link.target.uid, "b");
        assert_eq!((link.source.x, link.source.y), (layout.nodes[0].x, layout.nodes[0].y));
        assert_eq!(link.value, 1.0);
    }

    #[test]
    fn metric_selects_the_weight() {
        let mut graph = two_module_graph();
        graph.nodes["a"].gzip_length = Some(0.0);
        graph.nodes["b"].gzip_length = Some(100.0);
        let config = LayoutConfig {
            metric: SizeMetric::Gzip,
            ..LayoutConfig::default()
        };

        let layout = compute_layout(&graph, Viewport::default(), &config).unwrap();
        assert!(layout.node("b").unwrap().radius > layout.node("a").unwrap().radius);
    }

    #[test]
    fn malformed_edge_fails_the_whole_run() {
        let mut graph = two_module_graph();
        graph.links.push(RawEdge::new("b", "nowhere"));

        let error = run(&graph, Viewport::default(), &LayoutConfig::default()).unwrap_err();
        assert!(matches!(error, LayoutError::MalformedGraph { edge_index: 1, .. }));
    }

    #[test]
    fn serializes_links_as_uid_pairs() {
        let output =
            run(&two_module_graph(), Viewport::default(), &LayoutConfig::default()).unwrap();
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["width"], 800.0);
        assert_eq!(value["metric"], "rendered");
        assert_eq!(value["links"][0]["source"], "a");
        assert_eq!(value["links"][0]["target"], "b");
        assert_eq!(value["nodes"][1]["renderedLength"], 0.0);
        assert!(value["nodes"][0]["x"].is_f64());
        assert_eq!(value["importedBy"]["b"][0]["uid"], "a");
        assert_eq!(value["imports"]["a"][0]["uid"], "b");
    }
}
