use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("link {edge_index} references unknown {endpoint} uid `{uid}`")]
    MalformedGraph {
        edge_index: usize,
        endpoint: Endpoint,
        uid: String,
    },
    #[error("viewport must have finite dimensions, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
