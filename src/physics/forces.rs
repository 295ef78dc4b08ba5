use std::f64::consts::TAU;

use nalgebra::Vector2;

use crate::graph::{WorkingLink, WorkingNode};

use super::PhysicsScratch;
use super::quadtree::QuadNode;

const MIN_SEPARATION_SQ: f64 = 1e-18;
const JIGGLE: f64 = 1e-6;

#[derive(Clone, Copy, Debug)]
pub(super) struct LinkParams {
    pub(super) distance: f64,
    pub(super) strength: f64,
    pub(super) iterations: usize,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct CollisionParams {
    pub(super) strength: f64,
    pub(super) iterations: usize,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ChargeParams {
    pub(super) strength: f64,
    pub(super) theta_sq: f64,
    pub(super) distance_min_sq: f64,
    pub(super) distance_max_sq: f64,
}

/// Unit vector standing in for `a - b` when the two points coincide. Swapping the arguments
/// flips it, so the pair is pushed apart instead of drifting together.
pub(super) fn fallback_direction(a: usize, b: usize) -> Vector2<f64> {
    let (low, high, sign) = if a <= b { (a, b, 1.0) } else { (b, a, -1.0) };
    let angle = ((low as f64) * 0.618_034 + (high as f64) * 0.414_214 + 0.11) * TAU;
    Vector2::new(angle.cos(), angle.sin()) * sign
}

/// Share of each link's correction taken by its target: the source's degree over the sum of
/// both degrees, so well-connected modules move less.
pub(super) fn link_bias(links: &[WorkingLink], node_count: usize) -> Vec<f64> {
    let mut degree = vec![0usize; node_count];
    for link in links.iter().filter(|link| !link.is_self_loop()) {
        degree[link.source] += 1;
        degree[link.target] += 1;
    }

    links
        .iter()
        .map(|link| {
            let source = degree[link.source] as f64;
            let target = degree[link.target] as f64;
            if source + target > 0.0 {
                source / (source + target)
            } else {
                0.5
            }
        })
        .collect()
}

pub(super) fn apply_links(
    nodes: &mut [WorkingNode],
    links: &[WorkingLink],
    bias: &[f64],
    params: LinkParams,
    alpha: f64,
) {
    for _ in 0..params.iterations {
        for (link, &bias) in links.iter().zip(bias) {
            if link.is_self_loop() {
                continue;
            }

            let (from, to) = (link.source, link.target);
            let mut delta = (nodes[to].position + nodes[to].velocity)
                - (nodes[from].position + nodes[from].velocity);
            if delta.norm_squared() < MIN_SEPARATION_SQ {
                delta = fallback_direction(to, from) * JIGGLE;
            }

            let distance = delta.norm();
            let correction =
                delta * ((distance - params.distance) / distance * alpha * params.strength);

            nodes[to].velocity -= correction * bias;
            nodes[from].velocity += correction * (1.0 - bias);
        }
    }
}

pub(super) fn apply_collision(
    nodes: &mut [WorkingNode],
    radii: &[f64],
    params: CollisionParams,
    scratch: &mut PhysicsScratch,
) {
    for _ in 0..params.iterations {
        scratch.positions.clear();
        scratch
            .positions
            .extend(nodes.iter().map(|node| node.position + node.velocity));
        scratch.deltas.clear();
        scratch.deltas.resize(nodes.len(), Vector2::zeros());

        let Some(quadtree) = QuadNode::build(&scratch.positions, radii) else {
            return;
        };

        accumulate_collision_pairs(
            &quadtree,
            &quadtree,
            true,
            &scratch.positions,
            radii,
            params.strength,
            &mut scratch.deltas,
        );

        for (node, delta) in nodes.iter_mut().zip(&scratch.deltas) {
            node.velocity += delta;
        }
    }
}

fn resolve_overlap(
    from: usize,
    to: usize,
    predicted: &[Vector2<f64>],
    radii: &[f64],
    strength: f64,
    deltas: &mut [Vector2<f64>],
) {
    let reach = radii[from] + radii[to];
    let mut delta = predicted[from] - predicted[to];
    let distance_sq = delta.norm_squared();
    if distance_sq >= reach * reach {
        return;
    }
    if distance_sq < MIN_SEPARATION_SQ {
        delta = fallback_direction(from, to) * JIGGLE;
    }

    let distance = delta.norm();
    let push = delta * ((reach - distance) / distance * strength);

    // The smaller disk gives way more.
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    predicted: &[Vector2<f64>],
    radii: &[f64],
    strength: f64,
    deltas: &mut [Vector2<f64>],
) {
    let reach = node_a.max_radius + node_b.max_radius;
    if node_a.bounds.distance_sq_to(node_b.bounds) > reach * reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, predicted, radii, strength, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, predicted, radii, strength, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (first, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, predicted, radii, strength, deltas);
            for child_b in &children[first + 1..] {
                accumulate_collision_pairs(
                    child_a, child_b, false, predicted, radii, strength, deltas,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, predicted, radii, strength, deltas);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, predicted, radii, strength, deltas);
        }
    }
}

pub(super) fn apply_axis_y(nodes: &mut [WorkingNode], target: f64, strength: f64, alpha: f64) {
    for node in nodes {
        node.velocity.y += (target - node.position.y) * strength * alpha;
    }
}

/// Shifts every position so the centroid sits on `center`; velocities are untouched.
pub(super) fn apply_center(nodes: &mut [WorkingNode], center: Vector2<f64>) {
    if nodes.is_empty() {
        return;
    }

    let centroid =
        nodes.iter().fold(Vector2::zeros(), |sum, node| sum + node.position) / nodes.len() as f64;
    let shift = centroid - center;
    for node in nodes {
        node.position -= shift;
    }
}

pub(super) fn apply_many_body(
    nodes: &mut [WorkingNode],
    params: ChargeParams,
    alpha: f64,
    scratch: &mut PhysicsScratch,
) {
    scratch.positions.clear();
    scratch
        .positions
        .extend(nodes.iter().map(|node| node.position));

    let Some(quadtree) = QuadNode::build(&scratch.positions, &[]) else {
        return;
    };

    for (index, node) in nodes.iter_mut().enumerate() {
        let mut velocity = Vector2::zeros();
        accumulate_charge_for_node(
            &quadtree,
            index,
            &scratch.positions,
            params,
            alpha,
            &mut velocity,
        );
        node.velocity += velocity;
    }
}

/// Velocity change from `weight` units of charge sitting at offset `delta`.
fn charge_between(
    delta: Vector2<f64>,
    weight: f64,
    params: ChargeParams,
    alpha: f64,
) -> Vector2<f64> {
    let mut distance_sq = delta.norm_squared();
    if distance_sq >= params.distance_max_sq {
        return Vector2::zeros();
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }

    delta * (params.strength * weight * alpha / distance_sq)
}

fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vector2<f64>],
    params: ChargeParams,
    alpha: f64,
    velocity: &mut Vector2<f64>,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }

            let mut delta = positions[other] - point;
            if delta.norm_squared() < MIN_SEPARATION_SQ {
                delta = fallback_direction(other, index) * JIGGLE;
            }
            *velocity += charge_between(delta, 1.0, params, alpha);
        }
        return;
    }

    let delta = node.center_of_mass - point;
    let distance_sq = delta.norm_squared();
    let side = node.bounds.side_length();
    let can_approximate = !node.bounds.contains(point) && side * side < params.theta_sq * distance_sq;

    if can_approximate {
        *velocity += charge_between(delta, node.mass, params, alpha);
        return;
    }

    for child in node.children() {
        accumulate_charge_for_node(child, index, positions, params, alpha, velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RawNode;

    fn node_at(x: f64, y: f64) -> WorkingNode {
        WorkingNode {
            uid: format!("{x},{y}"),
            attrs: RawNode::new(format!("{x},{y}"), 1.0),
            position: Vector2::new(x, y),
            velocity: Vector2::zeros(),
        }
    }

    fn charge() -> ChargeParams {
        ChargeParams {
            strength: -100.0,
            theta_sq: 0.81,
            distance_min_sq: 1.0,
            distance_max_sq: f64::INFINITY,
        }
    }

    #[test]
    fn fallback_direction_is_antisymmetric_unit() {
        let forward = fallback_direction(3, 8);
        let backward = fallback_direction(8, 3);
        assert!((forward.norm() - 1.0).abs() < 1e-12);
        assert!((forward + backward).norm() < 1e-12);
    }

    #[test]
    fn bias_favors_the_better_connected_end() {
        let links = vec![
            WorkingLink { source: 0, target: 1, value: 1.0 },
            WorkingLink { source: 1, target: 2, value: 1.0 },
            WorkingLink { source: 2, target: 2, value: 1.0 },
        ];
        let bias = link_bias(&links, 3);

        assert!((bias[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((bias[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(bias[2], 0.5);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let mut nodes = vec![node_at(0.0, 0.0), node_at(100.0, 0.0)];
        let links = vec![WorkingLink { source: 0, target: 1, value: 1.0 }];
        let params = LinkParams {
            distance: 50.0,
            strength: 1.0,
            iterations: 1,
        };

        apply_links(&mut nodes, &links, &[0.5], params, 1.0);

        assert!((nodes[0].velocity.x - 25.0).abs() < 1e-9);
        assert!((nodes[1].velocity.x + 25.0).abs() < 1e-9);
        assert_eq!(nodes[0].velocity.y, 0.0);
    }

    #[test]
    fn overlapping_disks_are_pushed_to_contact() {
        let mut nodes = vec![node_at(0.0, 0.0), node_at(4.0, 0.0)];
        let mut scratch = PhysicsScratch::default();
        let params = CollisionParams {
            strength: 1.0,
            iterations: 1,
        };

        apply_collision(&mut nodes, &[5.0, 5.0], params, &mut scratch);

        let predicted = (nodes[1].position + nodes[1].velocity)
            - (nodes[0].position + nodes[0].velocity);
        assert!((predicted.norm() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn separated_disks_are_left_alone() {
        let mut nodes = vec![node_at(0.0, 0.0), node_at(40.0, 0.0)];
        let mut scratch = PhysicsScratch::default();
        let params = CollisionParams {
            strength: 1.0,
            iterations: 1,
        };

        apply_collision(&mut nodes, &[5.0, 5.0], params, &mut scratch);
        assert!(nodes.iter().all(|node| node.velocity == Vector2::zeros()));
    }

    #[test]
    fn coincident_disks_separate() {
        let mut nodes = vec![node_at(1.0, 1.0), node_at(1.0, 1.0)];
        let mut scratch = PhysicsScratch::default();
        let params = CollisionParams {
            strength: 1.0,
            iterations: 1,
        };

        apply_collision(&mut nodes, &[3.0, 3.0], params, &mut scratch);
        let gap = (nodes[0].position + nodes[0].velocity) - (nodes[1].position + nodes[1].velocity);
        assert!(gap.norm() > 5.9);
    }

    #[test]
    fn many_body_repels_symmetrically() {
        let mut nodes = vec![node_at(-10.0, 0.0), node_at(10.0, 0.0)];
        let mut scratch = PhysicsScratch::default();

        apply_many_body(&mut nodes, charge(), 1.0, &mut scratch);

        // strength * alpha / distance = 100 / 20
        assert!((nodes[0].velocity.x + 5.0).abs() < 1e-9);
        assert!((nodes[1].velocity.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn barnes_hut_tracks_exact_sum_on_large_sets() {
        let params = ChargeParams {
            theta_sq: 0.25,
            ..charge()
        };
        let mut nodes = (0..400)
            .map(|index| node_at((index % 20) as f64 * 13.0, (index / 20) as f64 * 11.0))
            .collect::<Vec<_>>();
        let positions = nodes.iter().map(|node| node.position).collect::<Vec<_>>();
        let mut scratch = PhysicsScratch::default();

        apply_many_body(&mut nodes, params, 1.0, &mut scratch);

        for index in [0, 57, 210, 399] {
            let mut exact = Vector2::zeros();
            let mut magnitude = 0.0;
            for (other, position) in positions.iter().enumerate() {
                if other != index {
                    let pair = charge_between(position - positions[index], 1.0, params, 1.0);
                    exact += pair;
                    magnitude += pair.norm();
                }
            }
            let error = (nodes[index].velocity - exact).norm();
            assert!(error <= magnitude * 0.1, "node {index}: {error} vs {magnitude}");
        }
    }

    #[test]
    fn centering_moves_centroid_without_touching_velocity() {
        let mut nodes = vec![node_at(0.0, 0.0), node_at(10.0, 20.0)];
        nodes[0].velocity = Vector2::new(1.0, 1.0);

        apply_center(&mut nodes, Vector2::new(400.0, 300.0));

        assert_eq!(nodes[0].position, Vector2::new(395.0, 290.0));
        assert_eq!(nodes[1].position, Vector2::new(405.0, 310.0));
        assert_eq!(nodes[0].velocity, Vector2::new(1.0, 1.0));
    }

    #[test]
    fn axis_force_pulls_toward_target_row() {
        let mut nodes = vec![node_at(0.0, 100.0), node_at(0.0, 400.0)];
        apply_axis_y(&mut nodes, 300.0, 0.05, 0.5);

        assert!((nodes[0].velocity.y - 5.0).abs() < 1e-9);
        assert!((nodes[1].velocity.y + 2.5).abs() < 1e-9);
        assert!(nodes.iter().all(|node| node.velocity.x == 0.0));
    }
}
