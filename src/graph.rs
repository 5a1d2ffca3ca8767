//! Host-facing facade tying the hierarchy, simulation, interaction and
//! render binding together behind `on_tick` / `on_gesture`.

use eframe::egui::Pos2;
use log::{debug, info, trace};

use crate::config::{ForceConfig, GraphConfig, SchedulerConfig};
use crate::hierarchy::{Hierarchy, NodeData, NodeKey, Toggle};
use crate::interaction::{ClickOutcome, Gesture, InteractionController, ViewTransform};
use crate::render::{BindReport, RenderBinder, RenderSurface, node_radius};
use crate::simulation::{Phase, QuadtreeCell, Simulation, TickOutcome};

const FALLBACK_TICK_RATE_HZ: f32 = 60.0;

/// Converts host frame durations into a whole number of fixed-interval ticks.
#[derive(Clone, Debug)]
pub struct TickScheduler {
    interval: f32,
    max_steps: u32,
    accumulator: f32,
    running: bool,
}

impl TickScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let rate = if config.tick_rate_hz.is_finite() && config.tick_rate_hz > 0.0 {
            config.tick_rate_hz
        } else {
            FALLBACK_TICK_RATE_HZ
        };
        Self {
            interval: 1.0 / rate,
            max_steps: config.max_ticks_per_frame.max(1),
            accumulator: 0.0,
            running: true,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of ticks owed after `dt` seconds. Backlog beyond the per-frame
    /// cap is dropped so a stalled host does not trigger a burst later.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !self.running || !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        self.accumulator += dt;
        let owed = ((self.accumulator + self.interval * 1e-3) / self.interval).floor() as u32;
        let steps = owed.min(self.max_steps);
        if steps == self.max_steps && owed > steps {
            self.accumulator = 0.0;
        } else {
            self.accumulator = (self.accumulator - steps as f32 * self.interval).max(0.0);
        }
        steps
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub steps: u32,
    pub settled: bool,
    pub phase: Phase,
    pub alpha: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEffect {
    View(ViewTransform),
    Dragged,
    Clicked(ClickOutcome),
    /// The gesture referred to a node that is not currently shown, or to no active drag.
    Ignored,
}

pub struct ForceGraph<T: NodeData, S: RenderSurface> {
    tree: Hierarchy<T>,
    config: GraphConfig,
    simulation: Simulation,
    controller: InteractionController,
    binder: RenderBinder<S::Element>,
    surface: S,
    scheduler: TickScheduler,
    visible: Vec<NodeKey>,
    link_total: usize,
}

impl<T: NodeData, S: RenderSurface> ForceGraph<T, S> {
    pub fn new(tree: Hierarchy<T>, config: GraphConfig, mut surface: S) -> Self {
        let controller = InteractionController::new(
            ViewTransform::translated(config.initial_translate()),
            config.zoom,
            config.interaction,
        );
        surface.set_view_transform(controller.transform());

        let mut graph = Self {
            simulation: Simulation::new(config.forces, config.center_target()),
            scheduler: TickScheduler::new(config.scheduler),
            binder: RenderBinder::default(),
            visible: Vec::new(),
            link_total: 0,
            tree,
            config,
            controller,
            surface,
        };
        graph.update();
        info!(
            "force graph built over {} nodes ({} visible)",
            graph.tree.len(),
            graph.visible.len()
        );
        graph
    }

    pub fn tree(&self) -> &Hierarchy<T> {
        &self.tree
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn transform(&self) -> ViewTransform {
        self.controller.transform()
    }

    pub fn visible_nodes(&self) -> &[NodeKey] {
        &self.visible
    }

    pub fn link_count(&self) -> usize {
        self.link_total
    }

    pub fn is_stopped(&self) -> bool {
        !self.scheduler.is_running()
    }

    /// Re-derives the visible nodes and links after a structural change and
    /// rebinds both the simulation and the surface.
    pub fn update(&mut self) -> BindReport {
        if self.is_stopped() {
            return BindReport::default();
        }

        let nodes = self.tree.flatten();
        let links = self.tree.links();
        let link_ids = links
            .iter()
            .filter_map(|link| {
                Some((
                    self.tree.node(link.source).id()?,
                    self.tree.node(link.target).id()?,
                ))
            })
            .collect::<Vec<_>>();

        self.simulation.set_nodes(&mut self.tree, nodes.clone());
        let dropped = self.simulation.set_links(link_ids);
        let report = self
            .binder
            .bind(&self.tree, &nodes, &links, &mut self.surface);
        self.simulation.reheat(self.config.interaction.reheat_alpha);

        debug!(
            "rebound {} nodes / {} links: nodes +{} ~{} -{}, links +{} ~{} -{}, {} dropped",
            nodes.len(),
            links.len(),
            report.nodes.entered,
            report.nodes.updated,
            report.nodes.exited,
            report.links.entered,
            report.links.updated,
            report.links.exited,
            dropped,
        );
        self.visible = nodes;
        self.link_total = self.simulation.link_count();
        report
    }

    pub fn on_tick(&mut self, dt: f32) -> TickReport {
        self.controller.on_frame();
        let steps = self.scheduler.advance(dt);
        let mut moved = 0;
        let mut settled = false;

        for _ in 0..steps {
            match self.simulation.tick(&mut self.tree) {
                TickOutcome::Moved => moved += 1,
                TickOutcome::Settled => {
                    moved += 1;
                    settled = true;
                }
                TickOutcome::Idle => break,
            }
        }

        if moved > 0 {
            self.binder.on_tick(&self.tree, &mut self.surface);
        }

        TickReport {
            steps: moved,
            settled,
            phase: self.simulation.phase(),
            alpha: self.simulation.alpha(),
        }
    }

    pub fn on_gesture(&mut self, gesture: Gesture) -> GestureEffect {
        if self.is_stopped() {
            return GestureEffect::Ignored;
        }

        match gesture {
            Gesture::Zoom(delta) => {
                let transform = self.controller.on_zoom(delta);
                self.surface.set_view_transform(transform);
                GestureEffect::View(transform)
            }
            Gesture::DragStart { node, pointer } => {
                if !self.is_shown(node) {
                    trace!("ignoring drag start on hidden node {node:?}");
                    return GestureEffect::Ignored;
                }
                self.controller
                    .on_drag_start(&mut self.tree, &mut self.simulation, node, pointer);
                GestureEffect::Dragged
            }
            Gesture::Drag { node, pointer } => {
                if self.controller.on_drag(&mut self.tree, node, pointer) {
                    GestureEffect::Dragged
                } else {
                    GestureEffect::Ignored
                }
            }
            Gesture::DragEnd { node } => {
                if self
                    .controller
                    .on_drag_end(&mut self.tree, &mut self.simulation, node)
                {
                    GestureEffect::Dragged
                } else {
                    GestureEffect::Ignored
                }
            }
            Gesture::Click { node } => {
                if !self.is_shown(node) {
                    return GestureEffect::Ignored;
                }
                let outcome = self.controller.on_click(&mut self.tree, node);
                if matches!(
                    outcome,
                    ClickOutcome::Toggled(Toggle::Collapsed | Toggle::Expanded)
                ) {
                    self.update();
                }
                GestureEffect::Clicked(outcome)
            }
        }
    }

    pub fn node_at(&self, pointer: Pos2) -> Option<NodeKey> {
        let tree = &self.tree;
        self.controller.hit_test(
            pointer,
            self.visible.iter().map(|&key| {
                let node = tree.node(key);
                (key, node.body.position, node_radius(node.data().size()))
            }),
        )
    }

    pub fn screen_position(&self, node: NodeKey) -> Option<Pos2> {
        self.tree
            .get(node)
            .map(|node| self.controller.transform().apply(node.body.position))
    }

    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.config.width = width;
        self.config.height = height;
        let center = self.config.center_target();
        if center != self.simulation.center() {
            debug!("container resized to {width}x{height}, centering on {center:?}");
            self.simulation.set_center(center);
            self.simulation.reheat(self.config.interaction.reheat_alpha);
        }
    }

    pub fn set_force_config(&mut self, forces: ForceConfig) {
        self.config.forces = forces;
        self.simulation.set_config(forces);
        self.simulation.reheat(self.config.interaction.reheat_alpha);
    }

    pub fn reheat(&mut self) {
        self.simulation.reheat(self.config.interaction.reheat_alpha);
    }

    pub fn quadtree_cells(&self) -> Vec<QuadtreeCell> {
        self.simulation.quadtree_cells(&self.tree)
    }

    /// Stops ticking and releases every bound element. Idempotent.
    pub fn stop(&mut self) {
        if self.is_stopped() {
            return;
        }

        self.scheduler.stop();
        self.simulation.stop();
        let released = self.binder.release(&mut self.surface);
        self.visible.clear();
        debug!("force graph stopped, released {released} elements");
    }

    fn is_shown(&self, node: NodeKey) -> bool {
        self.tree.get(node).is_some() && self.tree.is_visible(node)
    }
}

impl<T: NodeData, S: RenderSurface> Drop for ForceGraph<T, S> {
    fn drop(&mut self) {
        self.stop();
    }
}
