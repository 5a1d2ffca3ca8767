//! Velocity-based force layout driven by a decaying alpha.

mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use log::{debug, info};

use crate::config::ForceConfig;
use crate::hierarchy::{Hierarchy, NodeId, NodeKey};
use crate::util::Lcg;

use forces::{ManyBodyParams, Particle, Spring, apply_center, apply_many_body, apply_springs};
use quadtree::Quadtree;

const INITIAL_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Settling,
    /// Converged; ticks are ignored until something reheats the layout.
    Resting,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Moved,
    /// This tick moved the nodes and brought alpha under its floor.
    Settled,
    Idle,
}

/// Outline of one quadtree cell over the current positions, for debugging overlays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

pub struct Simulation {
    config: ForceConfig,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    phase: Phase,
    nodes: Vec<NodeKey>,
    index_by_id: HashMap<NodeId, usize>,
    link_ids: Vec<(NodeId, NodeId)>,
    springs: Vec<Spring>,
    particles: Vec<Particle>,
    jiggle: Lcg,
}

impl Simulation {
    pub fn new(config: ForceConfig, center: Vec2) -> Self {
        Self {
            config,
            center,
            alpha: 1.0,
            alpha_target: 0.0,
            phase: Phase::Settling,
            nodes: Vec::new(),
            index_by_id: HashMap::new(),
            link_ids: Vec::new(),
            springs: Vec::new(),
            particles: Vec::new(),
            jiggle: Lcg::default(),
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_settling(&self) -> bool {
        self.phase == Phase::Settling
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn nodes(&self) -> &[NodeKey] {
        &self.nodes
    }

    pub fn link_count(&self) -> usize {
        self.springs.len()
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.max(0.0);
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.max(0.0);
    }

    /// Resumes integration after the layout came to rest. A stopped simulation stays stopped.
    pub fn restart(&mut self) {
        if self.phase == Phase::Resting {
            debug!("simulation restarted at alpha {:.4}", self.alpha);
            self.phase = Phase::Settling;
        }
    }

    /// Raises alpha to at least `alpha` and resumes integration.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
        self.restart();
    }

    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn set_config(&mut self, config: ForceConfig) {
        self.config = config;
        self.resolve_links();
    }

    /// Replaces the simulated node set. Nodes without a position yet are laid
    /// out on a phyllotaxis spiral; nodes seen before keep where they were.
    pub fn set_nodes<T>(&mut self, tree: &mut Hierarchy<T>, nodes: Vec<NodeKey>) {
        self.index_by_id.clear();
        let initial_angle = PI * (3.0 - 5.0_f32.sqrt());

        for (index, &key) in nodes.iter().enumerate() {
            let node = tree.node_mut(key);
            if !node.body.is_placed() {
                let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                let angle = index as f32 * initial_angle;
                node.body.place(vec2(radius * angle.cos(), radius * angle.sin()));
            }
            if !node.body.velocity.is_finite() {
                node.body.velocity = Vec2::ZERO;
            }
            if let Some(id) = node.id() {
                self.index_by_id.insert(id, index);
            }
        }

        self.nodes = nodes;
        self.resolve_links();
    }

    /// Replaces the link set. Links whose endpoints are not among the current
    /// nodes are dropped; the number dropped is returned.
    pub fn set_links(&mut self, links: impl IntoIterator<Item = (NodeId, NodeId)>) -> usize {
        self.link_ids = links.into_iter().collect();
        self.resolve_links()
    }

    fn resolve_links(&mut self) -> usize {
        let mut degree = vec![0u32; self.nodes.len()];
        let mut resolved = Vec::with_capacity(self.link_ids.len());
        for (source, target) in &self.link_ids {
            match (self.index_by_id.get(source), self.index_by_id.get(target)) {
                (Some(&source), Some(&target)) => {
                    degree[source] += 1;
                    degree[target] += 1;
                    resolved.push((source, target));
                }
                _ => debug!("dropping dangling link {source} -> {target}"),
            }
        }

        self.springs = resolved
            .into_iter()
            .map(|(source, target)| {
                let (source_degree, target_degree) = (degree[source] as f32, degree[target] as f32);
                Spring {
                    source,
                    target,
                    strength: self
                        .config
                        .link_strength
                        .unwrap_or(1.0 / source_degree.min(target_degree)),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();

        self.link_ids.len() - self.springs.len()
    }

    pub fn tick<T>(&mut self, tree: &mut Hierarchy<T>) -> TickOutcome {
        if self.phase != Phase::Settling {
            return TickOutcome::Idle;
        }

        self.step(tree);
        if self.alpha < self.config.alpha_min {
            self.phase = Phase::Resting;
            info!("layout settled over {} nodes", self.nodes.len());
            return TickOutcome::Settled;
        }
        TickOutcome::Moved
    }

    /// One unconditional integration step: decay alpha, apply link,
    /// many-body and centering forces in that order, then move the nodes.
    pub fn step<T>(&mut self, tree: &mut Hierarchy<T>) {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.particles.clear();
        self.particles.extend(self.nodes.iter().map(|&key| {
            let body = &tree.node(key).body;
            Particle {
                position: body.position,
                velocity: body.velocity,
            }
        }));

        let config = &self.config;
        apply_springs(
            &mut self.particles,
            &self.springs,
            config.link_distance,
            config.link_iterations,
            self.alpha,
            &mut self.jiggle,
        );
        apply_many_body(
            &mut self.particles,
            ManyBodyParams {
                strength: config.charge_strength,
                distance_min_sq: config.charge_distance_min * config.charge_distance_min,
                distance_max_sq: config.charge_distance_max * config.charge_distance_max,
                theta_sq: config.theta * config.theta,
            },
            self.alpha,
            &mut self.jiggle,
        );
        apply_center(&mut self.particles, self.center, config.center_strength);

        let retention = 1.0 - config.velocity_decay;
        for (&key, particle) in self.nodes.iter().zip(&self.particles) {
            let body = &mut tree.node_mut(key).body;
            let mut position = particle.position;
            let mut velocity = particle.velocity;

            match body.fx {
                Some(fx) => {
                    position.x = fx;
                    velocity.x = 0.0;
                }
                None => {
                    velocity.x *= retention;
                    position.x += velocity.x;
                }
            }
            match body.fy {
                Some(fy) => {
                    position.y = fy;
                    velocity.y = 0.0;
                }
                None => {
                    velocity.y *= retention;
                    position.y += velocity.y;
                }
            }

            body.position = position;
            body.velocity = velocity;
        }
    }

    pub fn quadtree_cells<T>(&self, tree: &Hierarchy<T>) -> Vec<QuadtreeCell> {
        let positions = self
            .nodes
            .iter()
            .map(|&key| tree.node(key).body.position)
            .collect::<Vec<_>>();
        let Some(quadtree) = Quadtree::build(&positions) else {
            return Vec::new();
        };

        quadtree
            .cells
            .iter()
            .map(|cell| QuadtreeCell {
                center: cell.bounds.center,
                half_extent: cell.bounds.half_extent,
                depth: cell.depth,
                is_leaf: cell.is_leaf(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Link, NodeData};

    struct Item(&'static str);

    impl NodeData for Item {
        fn name(&self) -> &str {
            self.0
        }

        fn size(&self) -> Option<f64> {
            None
        }
    }

    struct Nested(&'static str, Vec<Nested>);

    fn sample() -> Hierarchy<Item> {
        Hierarchy::from_nested(
            Nested(
                "A",
                vec![
                    Nested("B", vec![]),
                    Nested("C", vec![Nested("D", vec![])]),
                ],
            ),
            |Nested(name, children)| (Item(name), children),
        )
    }

    fn link_ids(tree: &Hierarchy<Item>, links: &[Link]) -> Vec<(NodeId, NodeId)> {
        links
            .iter()
            .filter_map(|link| Some((tree.node(link.source).id()?, tree.node(link.target).id()?)))
            .collect()
    }

    fn bound(tree: &mut Hierarchy<Item>) -> Simulation {
        let mut simulation = Simulation::new(ForceConfig::default(), vec2(200.0, 100.0));
        let nodes = tree.flatten();
        let links = tree.links();
        simulation.set_nodes(tree, nodes);
        let dropped = simulation.set_links(link_ids(tree, &links));
        assert_eq!(dropped, 0);
        simulation
    }

    #[test]
    fn unplaced_nodes_are_spread_on_a_spiral() {
        let mut tree = sample();
        let _simulation = bound(&mut tree);

        let positions = tree
            .keys()
            .map(|key| tree.node(key).body.position)
            .collect::<Vec<_>>();
        for (index, position) in positions.iter().enumerate() {
            for other in &positions[index + 1..] {
                assert!((*position - *other).length() > 1.0);
            }
        }
    }

    #[test]
    fn placed_nodes_keep_their_position() {
        let mut tree = sample();
        let b = tree.find_by_name("B").expect("B exists");
        tree.node_mut(b).body = crate::hierarchy::Body::at(vec2(42.0, -7.0));

        let _simulation = bound(&mut tree);
        assert_eq!(tree.node(b).body.position, vec2(42.0, -7.0));
    }

    #[test]
    fn dangling_links_are_dropped() {
        let mut tree = sample();
        let mut simulation = bound(&mut tree);
        let a = tree.node(tree.root()).id().expect("root has id");

        assert_eq!(tree.find_by_id(a), Some(tree.root()));
        assert_eq!(tree.find_by_id(NodeId(999)), None);

        let dropped = simulation.set_links([(a, NodeId(0)), (a, NodeId(999)), (NodeId(500), a)]);
        assert_eq!(dropped, 2);
        assert_eq!(simulation.link_count(), 1);

        assert_eq!(simulation.tick(&mut tree), TickOutcome::Moved);
        assert!(simulation.is_settling());
    }

    #[test]
    fn pinned_node_stays_exactly_on_its_pin() {
        let mut tree = sample();
        let mut simulation = bound(&mut tree);
        let c = tree.find_by_name("C").expect("C exists");
        tree.node_mut(c).body.pin(vec2(-250.0, 380.0));

        for _ in 0..120 {
            simulation.tick(&mut tree);
            assert_eq!(tree.node(c).body.position, vec2(-250.0, 380.0));
            assert_eq!(tree.node(c).body.velocity, Vec2::ZERO);
        }
    }

    #[test]
    fn alpha_decays_into_rest_exactly_once() {
        let mut tree = sample();
        let mut simulation = bound(&mut tree);

        let mut settled = 0;
        for _ in 0..400 {
            if simulation.tick(&mut tree) == TickOutcome::Settled {
                settled += 1;
            }
        }

        assert_eq!(settled, 1);
        assert_eq!(simulation.phase(), Phase::Resting);
        assert!(simulation.alpha() < simulation.config().alpha_min);

        let frozen = tree.node(tree.root()).body.position;
        assert_eq!(simulation.tick(&mut tree), TickOutcome::Idle);
        assert_eq!(tree.node(tree.root()).body.position, frozen);
    }

    #[test]
    fn alpha_target_keeps_layout_warm_and_reheat_resumes() {
        let mut tree = sample();
        let mut simulation = bound(&mut tree);
        for _ in 0..400 {
            simulation.tick(&mut tree);
        }
        assert_eq!(simulation.phase(), Phase::Resting);

        simulation.set_alpha_target(0.3);
        simulation.restart();
        for _ in 0..1000 {
            assert_ne!(simulation.tick(&mut tree), TickOutcome::Idle);
        }
        assert!((simulation.alpha() - 0.3).abs() < 0.01);

        simulation.set_alpha_target(0.0);
        simulation.stop();
        simulation.reheat(1.0);
        assert_eq!(simulation.phase(), Phase::Stopped);
        assert_eq!(simulation.tick(&mut tree), TickOutcome::Idle);
    }

    #[test]
    fn settled_layout_separates_nodes_near_the_center() {
        let mut tree = sample();
        let mut simulation = bound(&mut tree);
        for _ in 0..300 {
            simulation.tick(&mut tree);
        }

        let positions = simulation
            .nodes()
            .iter()
            .map(|&key| tree.node(key).body.position)
            .collect::<Vec<_>>();
        let centroid = positions.iter().fold(Vec2::ZERO, |sum, p| sum + *p) / positions.len() as f32;
        assert!((centroid - simulation.center()).length() < 5.0);
        for (index, position) in positions.iter().enumerate() {
            for other in &positions[index + 1..] {
                assert!((*position - *other).length() > 5.0);
            }
        }
    }

    #[test]
    fn quadtree_cells_cover_visible_nodes() {
        let mut tree = sample();
        let simulation = bound(&mut tree);

        let cells = simulation.quadtree_cells(&tree);
        assert!(!cells.is_empty());
        assert_eq!(cells[0].depth, 0);
        assert!(cells[0].is_leaf);
    }
}
