use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::graph::SizeMetric;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for the force layout. Every field has a default, so a config file only needs the
/// values it overrides.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Number of simulation steps; there is no early exit.
    pub iterations: usize,
    pub link_distance: f64,
    pub link_strength: f64,
    /// Relaxation passes of the link constraint per step.
    pub link_iterations: usize,
    /// Added to the rendered radius to get the collision radius.
    pub collision_padding: f64,
    pub collision_strength: f64,
    pub collision_iterations: usize,
    /// Pull of every node's y toward the viewport's horizontal midline.
    pub y_strength: f64,
    /// Many-body strength; negative values repel.
    pub charge_strength: f64,
    /// Barnes-Hut opening criterion.
    pub theta: f64,
    pub distance_min: f64,
    pub distance_max: f64,
    pub alpha_min: f64,
    /// Fraction of velocity lost each step.
    pub velocity_decay: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub metric: SizeMetric,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            link_distance: 50.0,
            link_strength: 1.0,
            link_iterations: 10,
            collision_padding: 1.0,
            collision_strength: 1.0,
            collision_iterations: 1,
            y_strength: 0.05,
            charge_strength: -100.0,
            theta: 0.9,
            distance_min: 1.0,
            distance_max: f64::INFINITY,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            min_radius: 5.0,
            max_radius: 30.0,
            metric: SizeMetric::Rendered,
        }
    }
}

impl LayoutConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Copy with every value pulled back into a range the simulation can work with.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f64, fallback: f64| if value.is_finite() { value } else { fallback };

        Self {
            iterations: self.iterations,
            link_distance: finite_or(self.link_distance, defaults.link_distance).max(0.0),
            link_strength: finite_or(self.link_strength, defaults.link_strength).clamp(0.0, 2.0),
            link_iterations: self.link_iterations.max(1),
            collision_padding: finite_or(self.collision_padding, defaults.collision_padding)
                .max(0.0),
            collision_strength: finite_or(self.collision_strength, defaults.collision_strength)
                .clamp(0.0, 1.0),
            collision_iterations: self.collision_iterations,
            y_strength: finite_or(self.y_strength, defaults.y_strength).clamp(0.0, 1.0),
            charge_strength: finite_or(self.charge_strength, defaults.charge_strength),
            theta: finite_or(self.theta, defaults.theta).max(0.0),
            distance_min: finite_or(self.distance_min, defaults.distance_min).max(0.0),
            distance_max: if self.distance_max.is_nan() {
                defaults.distance_max
            } else {
                self.distance_max.max(0.0)
            },
            alpha_min: finite_or(self.alpha_min, defaults.alpha_min).clamp(f64::EPSILON, 1.0),
            velocity_decay: finite_or(self.velocity_decay, defaults.velocity_decay)
                .clamp(0.0, 1.0),
            min_radius: finite_or(self.min_radius, defaults.min_radius).max(0.0),
            max_radius: finite_or(self.max_radius, defaults.max_radius).max(0.0),
            metric: self.metric,
        }
    }
}
