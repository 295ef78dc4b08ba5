use crate::config::LayoutConfig;
use crate::graph::{SizeMetric, WorkingNode};

/// Lower bound of the weight domain; fixed so that all-zero graphs still get a usable scale.
pub const DOMAIN_MIN: f64 = 1.0;

/// Square-root interpolation from module weight to circle radius, clamped to its output range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeScale {
    max_weight: f64,
    min_radius: f64,
    max_radius: f64,
}

impl SizeScale {
    pub fn new(max_weight: f64, min_radius: f64, max_radius: f64) -> Self {
        let max_weight = if max_weight.is_finite() {
            max_weight.max(DOMAIN_MIN)
        } else {
            DOMAIN_MIN
        };

        Self {
            max_weight,
            min_radius: min_radius.min(max_radius),
            max_radius: max_radius.max(min_radius),
        }
    }

    pub fn for_nodes(nodes: &[WorkingNode], metric: SizeMetric, config: &LayoutConfig) -> Self {
        let max_weight = nodes
            .iter()
            .map(|node| node.weight(metric))
            .filter(|weight| weight.is_finite())
            .fold(0.0_f64, f64::max);

        Self::new(max_weight, config.min_radius, config.max_radius)
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_radius, self.max_radius)
    }

    pub fn radius(&self, weight: f64) -> f64 {
        self.min_radius + (self.max_radius - self.min_radius) * self.normalize(weight)
    }

    fn normalize(&self, weight: f64) -> f64 {
        let weight = if weight.is_nan() { 0.0 } else { weight.max(0.0) };
        let span = self.max_weight.sqrt() - DOMAIN_MIN.sqrt();

        // Degenerate [1, 1] domain: everything at or below it is smallest.
        if span <= f64::EPSILON {
            return if weight > DOMAIN_MIN { 1.0 } else { 0.0 };
        }

        ((weight.sqrt() - DOMAIN_MIN.sqrt()) / span).clamp(0.0, 1.0)
    }
}
