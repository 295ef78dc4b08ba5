use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{LayoutError, Result};
use crate::graph::WorkingNode;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Negative sizes clamp to zero; only non-finite sizes are rejected.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !width.is_finite() || !height.is_finite() {
            return Err(LayoutError::InvalidViewport { width, height });
        }

        Ok(Self {
            width: width.max(0.0),
            height: height.max(0.0),
        })
    }

    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: Extent,
    pub y: Extent,
}

impl Bounds {
    pub fn of(points: impl IntoIterator<Item = Vector2<f64>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut min = first;
        let mut max = first;
        for point in points {
            min = min.inf(&point);
            max = max.sup(&point);
        }

        Some(Self {
            x: Extent {
                min: min.x,
                max: max.x,
            },
            y: Extent {
                min: min.y,
                max: max.y,
            },
        })
    }

    pub fn width(&self) -> f64 {
        self.x.span()
    }

    pub fn height(&self) -> f64 {
        self.y.span()
    }

    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.x.center(), self.y.center())
    }

    fn transposed(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    pub rotated: bool,
    pub translation: Vector2<f64>,
}

/// Turns a portrait layout on its side, then centers its bounding box in the viewport.
///
/// Rotation swaps every node's `x` and `y` and only happens when the point set is strictly
/// taller than wide; an exactly square box keeps its orientation. Returns `None` for an empty
/// node set.
pub fn normalize(nodes: &mut [WorkingNode], viewport: Viewport) -> Option<Normalization> {
    let mut bounds = Bounds::of(nodes.iter().map(|node| node.position))?;

    let rotated = bounds.height() > bounds.width();
    if rotated {
        for node in nodes.iter_mut() {
            node.position = Vector2::new(node.position.y, node.position.x);
        }
        bounds = bounds.transposed();
    }
    trace!(
        width = bounds.width(),
        height = bounds.height(),
        rotated,
        "layout orientation"
    );

    let translation = viewport.center() - bounds.center();
    for node in nodes.iter_mut() {
        node.position += translation;
    }

    Some(Normalization {
        rotated,
        translation,
    })
}
