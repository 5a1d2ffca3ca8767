use eframe::egui::Vec2;

use crate::util::Lcg;

use super::quadtree::{Quadtree, ROOT};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) struct Particle {
    pub(super) position: Vec2,
    pub(super) velocity: Vec2,
}

/// Link resolved to particle indices, with its spring parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Spring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    /// Share of the correction taken by the target.
    pub(super) bias: f32,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ManyBodyParams {
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta_sq: f32,
}

fn separate(mut delta: Vec2, jiggle: &mut Lcg) -> Vec2 {
    if delta.x == 0.0 {
        delta.x = jiggle.jiggle();
    }
    if delta.y == 0.0 {
        delta.y = jiggle.jiggle();
    }
    delta
}

pub(super) fn apply_springs(
    particles: &mut [Particle],
    springs: &[Spring],
    distance: f32,
    iterations: usize,
    alpha: f32,
    jiggle: &mut Lcg,
) {
    for _ in 0..iterations {
        for spring in springs {
            if spring.source == spring.target {
                continue;
            }

            let source = particles[spring.source];
            let target = particles[spring.target];
            let delta = separate(
                (target.position + target.velocity) - (source.position + source.velocity),
                jiggle,
            );
            let length = delta.length();
            let correction = delta * ((length - distance) / length * alpha * spring.strength);

            particles[spring.target].velocity -= correction * spring.bias;
            particles[spring.source].velocity += correction * (1.0 - spring.bias);
        }
    }
}

fn soften(distance_sq: f32, distance_min_sq: f32) -> f32 {
    if distance_sq < distance_min_sq {
        (distance_min_sq * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

fn many_body_impulse(
    tree: &Quadtree,
    index: usize,
    particles: &[Particle],
    params: ManyBodyParams,
    alpha: f32,
    jiggle: &mut Lcg,
    stack: &mut Vec<usize>,
) -> Vec2 {
    let point = particles[index].position;
    let mut impulse = Vec2::ZERO;
    stack.clear();
    stack.push(ROOT);

    while let Some(cell_index) = stack.pop() {
        let cell = tree.cell(cell_index);
        if cell.count == 0 {
            continue;
        }

        let delta = cell.center_of_mass - point;
        let distance_sq = delta.length_sq();
        let side = cell.bounds.side_length();
        let far_enough = side * side / params.theta_sq < distance_sq;

        if far_enough && !cell.bounds.contains(point) {
            if distance_sq < params.distance_max_sq {
                let distance_sq = soften(distance_sq, params.distance_min_sq);
                impulse += delta * (params.strength * cell.count as f32 * alpha / distance_sq);
            }
            continue;
        }

        if !cell.is_leaf() {
            stack.extend(cell.children.iter().flatten());
            continue;
        }

        for &other in &cell.points {
            if other == index {
                continue;
            }
            let raw = particles[other].position - point;
            if raw.length_sq() >= params.distance_max_sq {
                continue;
            }
            let delta = separate(raw, jiggle);
            let distance_sq = soften(delta.length_sq(), params.distance_min_sq);
            impulse += delta * (params.strength * alpha / distance_sq);
        }
    }

    impulse
}

/// Barnes-Hut approximated n-body force. Pairs at or beyond the configured
/// maximum distance do not interact.
pub(super) fn apply_many_body(
    particles: &mut [Particle],
    params: ManyBodyParams,
    alpha: f32,
    jiggle: &mut Lcg,
) {
    if particles.len() < 2 || params.strength == 0.0 {
        return;
    }

    let positions = particles
        .iter()
        .map(|particle| particle.position)
        .collect::<Vec<_>>();
    let Some(tree) = Quadtree::build(&positions) else {
        return;
    };

    let mut stack = Vec::new();
    for index in 0..particles.len() {
        let impulse =
            many_body_impulse(&tree, index, particles, params, alpha, jiggle, &mut stack);
        particles[index].velocity += impulse;
    }
}

pub(super) fn apply_center(particles: &mut [Particle], target: Vec2, strength: f32) {
    if particles.is_empty() {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for particle in particles.iter() {
        centroid += particle.position;
    }
    centroid /= particles.len() as f32;

    let shift = (centroid - target) * strength;
    for particle in particles.iter_mut() {
        particle.position -= shift;
    }
}
