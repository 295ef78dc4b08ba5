mod forces;
mod quadtree;

use std::f64::consts::PI;

use nalgebra::Vector2;
use tracing::debug;

use crate::config::LayoutConfig;
use crate::graph::{WorkingLink, WorkingNode};
use crate::layout::Viewport;
use forces::{ChargeParams, CollisionParams, LinkParams};

const INITIAL_RADIUS: f64 = 10.0;

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vector2<f64>>,
    deltas: Vec<Vector2<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationStats {
    pub steps: usize,
    pub final_alpha: f64,
}

/// Phyllotaxis placement around the origin: deterministic, and no two nodes start on top of
/// each other.
pub fn seed_positions(nodes: &mut [WorkingNode]) {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    for (index, node) in nodes.iter_mut().enumerate() {
        let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
        let angle = index as f64 * golden_angle;
        node.position = Vector2::new(radius * angle.cos(), radius * angle.sin());
        node.velocity = Vector2::zeros();
    }
}

/// Runs the force simulation for `config.iterations` steps and leaves the settled coordinates
/// in each node's `position`.
///
/// `radii` holds the rendered radius per node, in node order; collision uses it plus
/// `config.collision_padding`. Forces are applied in a fixed order every step: link,
/// collision, y-axis bias, many-body, centering. Link, axis and many-body contributions are
/// scaled by alpha, which cools from 1 toward `config.alpha_min` over the run; collision is not.
pub fn simulate(
    nodes: &mut [WorkingNode],
    links: &[WorkingLink],
    radii: &[f64],
    viewport: Viewport,
    config: &LayoutConfig,
) -> SimulationStats {
    let config = config.sanitized();
    seed_positions(nodes);

    let mut alpha = 1.0_f64;
    if nodes.is_empty() || config.iterations == 0 {
        return SimulationStats {
            steps: 0,
            final_alpha: alpha,
        };
    }

    let collision_radii = (0..nodes.len())
        .map(|index| radii.get(index).copied().unwrap_or(0.0) + config.collision_padding)
        .collect::<Vec<_>>();
    let bias = forces::link_bias(links, nodes.len());
    let center = viewport.center();

    let link = LinkParams {
        distance: config.link_distance,
        strength: config.link_strength,
        iterations: config.link_iterations,
    };
    let collision = CollisionParams {
        strength: config.collision_strength,
        iterations: config.collision_iterations,
    };
    let charge = ChargeParams {
        strength: config.charge_strength,
        theta_sq: config.theta * config.theta,
        distance_min_sq: config.distance_min * config.distance_min,
        distance_max_sq: config.distance_max * config.distance_max,
    };

    let alpha_decay = 1.0 - config.alpha_min.powf(1.0 / config.iterations as f64);
    let velocity_retention = 1.0 - config.velocity_decay;
    let mut scratch = PhysicsScratch::default();

    for _ in 0..config.iterations {
        alpha -= alpha * alpha_decay;

        forces::apply_links(nodes, links, &bias, link, alpha);
        forces::apply_collision(nodes, &collision_radii, collision, &mut scratch);
        forces::apply_axis_y(nodes, center.y, config.y_strength, alpha);
        forces::apply_many_body(nodes, charge, alpha, &mut scratch);
        forces::apply_center(nodes, center);

        for node in nodes.iter_mut() {
            node.velocity *= velocity_retention;
            node.position += node.velocity;
        }
    }

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        steps = config.iterations,
        alpha,
        "force simulation settled"
    );

    SimulationStats {
        steps: config.iterations,
        final_alpha: alpha,
    }
}
