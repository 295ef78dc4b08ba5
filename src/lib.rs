#![forbid(unsafe_code)]

//! Force-directed layout for module dependency graphs.
//!
//! A [`RawGraph`] of modules (keyed by uid, sized by rendered length) and their import edges
//! goes in; node coordinates centered in a viewport, the size scale used for circle radii, and
//! the imports / imported-by indexes come out. Drawing and interaction are left to the caller.

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod lookup;
pub mod physics;
pub mod pipeline;
pub mod scale;

pub use config::{ConfigError, LayoutConfig};
pub use error::{Endpoint, LayoutError, Result};
pub use graph::{
    AdjacencyEntry, AdjacencyIndex, ImportIndexes, RawEdge, RawGraph, RawNode, SizeMetric,
    WorkingLink, WorkingNode, build, build_indexes,
};
pub use layout::{Bounds, Extent, Normalization, Viewport, normalize};
pub use physics::{SimulationStats, simulate};
pub use pipeline::{Layout, LayoutNode, LayoutOutput, ResolvedLink, compute_layout, run};
pub use scale::SizeScale;
