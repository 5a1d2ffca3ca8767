//! Pointer gestures turned into view changes and simulation perturbations.

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, pos2};
use log::{debug, trace};

use crate::config::{InteractionConfig, ZoomConfig};
use crate::hierarchy::{Hierarchy, NodeKey, Toggle};
use crate::simulation::Simulation;

/// Pan/zoom applied to the drawing surface. Node positions are world
/// coordinates; `screen = world * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn translated(translate: Vec2) -> Self {
        Self {
            translate,
            scale: 1.0,
        }
    }

    pub fn apply(&self, world: Vec2) -> Pos2 {
        (world * self.scale + self.translate).to_pos2()
    }

    pub fn invert(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.translate) / self.scale
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomDelta {
    pub scale_factor: f32,
    pub anchor: Pos2,
    /// Screen-space translation applied after scaling.
    pub pan: Vec2,
}

impl ZoomDelta {
    pub fn scale_about(scale_factor: f32, anchor: Pos2) -> Self {
        Self {
            scale_factor,
            anchor,
            pan: Vec2::ZERO,
        }
    }

    pub fn pan(pan: Vec2) -> Self {
        Self {
            scale_factor: 1.0,
            anchor: pos2(0.0, 0.0),
            pan,
        }
    }
}

/// Host gesture, delivered in arrival order. Pointer positions are in
/// screen coordinates of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Zoom(ZoomDelta),
    DragStart { node: NodeKey, pointer: Pos2 },
    Drag { node: NodeKey, pointer: Pos2 },
    DragEnd { node: NodeKey },
    Click { node: NodeKey },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Toggled(Toggle),
    /// The click was the tail of a drag on the same node.
    Suppressed,
}

#[derive(Clone, Copy, Debug)]
struct DragSession {
    grab_offset: Vec2,
    origin: Pos2,
    travelled: f32,
}

pub struct InteractionController {
    transform: ViewTransform,
    zoom: ZoomConfig,
    config: InteractionConfig,
    drags: HashMap<NodeKey, DragSession>,
    suppress_click: Option<NodeKey>,
}

impl InteractionController {
    pub fn new(transform: ViewTransform, zoom: ZoomConfig, config: InteractionConfig) -> Self {
        Self {
            transform: ViewTransform {
                scale: zoom.clamp_scale(transform.scale),
                ..transform
            },
            zoom,
            config,
            drags: HashMap::new(),
            suppress_click: None,
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn is_dragging(&self, node: NodeKey) -> bool {
        self.drags.contains_key(&node)
    }

    pub fn active_drags(&self) -> usize {
        self.drags.len()
    }

    pub fn on_zoom(&mut self, delta: ZoomDelta) -> ViewTransform {
        self.suppress_click = None;
        if delta.scale_factor.is_finite() && delta.scale_factor > 0.0 {
            let anchor_world = self.transform.invert(delta.anchor);
            let scale = self.zoom.clamp_scale(self.transform.scale * delta.scale_factor);
            self.transform.scale = scale;
            self.transform.translate = delta.anchor.to_vec2() - anchor_world * scale;
        }
        if delta.pan.is_finite() {
            self.transform.translate += delta.pan;
        }
        self.transform
    }

    /// Pins `node` where it is. The first concurrent drag warms the simulation.
    pub fn on_drag_start<T>(
        &mut self,
        tree: &mut Hierarchy<T>,
        simulation: &mut Simulation,
        node: NodeKey,
        pointer: Pos2,
    ) {
        if self.drags.is_empty() {
            simulation.set_alpha_target(self.config.drag_alpha_target);
            simulation.restart();
        }
        self.suppress_click = None;

        let body = &mut tree.node_mut(node).body;
        body.pin(body.position);
        let grab_offset = body.position - self.transform.invert(pointer);
        self.drags.insert(
            node,
            DragSession {
                grab_offset,
                origin: pointer,
                travelled: 0.0,
            },
        );
        trace!("drag started on {node:?}");
    }

    pub fn on_drag<T>(&mut self, tree: &mut Hierarchy<T>, node: NodeKey, pointer: Pos2) -> bool {
        let Some(session) = self.drags.get_mut(&node) else {
            return false;
        };

        session.travelled = session.travelled.max(pointer.distance(session.origin));
        let target = self.transform.invert(pointer) + session.grab_offset;
        tree.node_mut(node).body.pin(target);
        true
    }

    /// Releases the pin. The last concurrent drag lets the simulation cool down.
    pub fn on_drag_end<T>(
        &mut self,
        tree: &mut Hierarchy<T>,
        simulation: &mut Simulation,
        node: NodeKey,
    ) -> bool {
        let Some(session) = self.drags.remove(&node) else {
            return false;
        };

        if self.drags.is_empty() {
            simulation.set_alpha_target(0.0);
        }
        tree.node_mut(node).body.unpin();
        if session.travelled > self.config.click_distance {
            self.suppress_click = Some(node);
        }
        trace!("drag ended on {node:?} after {:.1}px", session.travelled);
        true
    }

    /// Ends the window in which a drag release may still be followed by its click.
    /// Hosts deliver that click in the same frame as the release, or never.
    pub fn on_frame(&mut self) {
        if let Some(node) = self.suppress_click.take() {
            trace!("no trailing click on {node:?}");
        }
    }

    /// Collapses or expands `node` unless the click merely ends a drag.
    /// The caller re-flattens and rebinds after a toggle.
    pub fn on_click<T>(&mut self, tree: &mut Hierarchy<T>, node: NodeKey) -> ClickOutcome {
        if self.suppress_click.take() == Some(node) {
            trace!("click on {node:?} suppressed after drag");
            return ClickOutcome::Suppressed;
        }

        let toggle = tree.toggle(node);
        debug!("click on {node:?}: {toggle:?}");
        ClickOutcome::Toggled(toggle)
    }

    /// Nearest candidate whose circle contains the pointer.
    /// Candidates are `(node, world position, world radius)`.
    pub fn hit_test(
        &self,
        pointer: Pos2,
        candidates: impl IntoIterator<Item = (NodeKey, Vec2, f32)>,
    ) -> Option<NodeKey> {
        let world = self.transform.invert(pointer);
        candidates
            .into_iter()
            .filter_map(|(node, position, radius)| {
                let distance = (position - world).length();
                (distance <= radius).then_some((node, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::config::ForceConfig;
    use crate::hierarchy::NodeData;
    use crate::simulation::Phase;

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

    fn fixture() -> (Hierarchy<Item>, Simulation, InteractionController) {
        let mut tree = Hierarchy::from_nested(
            Nested("A", vec![Nested("B", vec![]), Nested("C", vec![Nested("D", vec![])])]),
            |Nested(name, children)| (Item(name), children),
        );
        let mut simulation = Simulation::new(ForceConfig::default(), Vec2::ZERO);
        let nodes = tree.flatten();
        simulation.set_nodes(&mut tree, nodes);
        let controller = InteractionController::new(
            ViewTransform::IDENTITY,
            ZoomConfig::default(),
            InteractionConfig::default(),
        );
        (tree, simulation, controller)
    }

    fn key(tree: &Hierarchy<Item>, name: &str) -> NodeKey {
        tree.find_by_name(name).expect("node exists")
    }

    #[test]
    fn zoom_is_clamped_to_scale_extent() {
        let (_, _, mut controller) = fixture();

        let transform = controller.on_zoom(ZoomDelta::scale_about(10.0, pos2(0.0, 0.0)));
        assert_eq!(transform.scale, 8.0);

        let transform = controller.on_zoom(ZoomDelta::scale_about(0.001, pos2(0.0, 0.0)));
        assert_eq!(transform.scale, 0.5);
    }

    #[test]
    fn zoom_keeps_anchor_fixed_and_pans() {
        let (_, _, mut controller) = fixture();
        let anchor = pos2(120.0, 80.0);
        let world_before = controller.transform().invert(anchor);

        controller.on_zoom(ZoomDelta::scale_about(2.0, anchor));
        let world_after = controller.transform().invert(anchor);
        assert!((world_before - world_after).length() < 1e-4);

        let transform = controller.on_zoom(ZoomDelta::pan(vec2(15.0, -5.0)));
        assert_eq!(transform.translate, vec2(-120.0 + 15.0, -80.0 - 5.0));
        assert_eq!(transform.scale, 2.0);
    }

    #[test]
    fn invalid_zoom_factor_is_ignored() {
        let (_, _, mut controller) = fixture();
        let transform = controller.on_zoom(ZoomDelta::scale_about(f32::NAN, pos2(3.0, 4.0)));
        assert_eq!(transform, ViewTransform::IDENTITY);
    }

    #[test]
    fn zoom_does_not_move_nodes() {
        let (tree, _, mut controller) = fixture();
        let before = tree.node(tree.root()).body.position;
        controller.on_zoom(ZoomDelta::scale_about(3.0, pos2(50.0, 50.0)));
        assert_eq!(tree.node(tree.root()).body.position, before);
    }

    #[test]
    fn drag_pins_then_follows_pointer_with_grab_offset() {
        let (mut tree, mut simulation, mut controller) = fixture();
        let b = key(&tree, "B");
        let start = tree.node(b).body.position;
        let pointer = (start + vec2(2.0, 1.0)).to_pos2();

        controller.on_drag_start(&mut tree, &mut simulation, b, pointer);
        assert!(controller.is_dragging(b));
        assert_eq!(tree.node(b).body.fx, Some(start.x));
        assert_eq!(tree.node(b).body.fy, Some(start.y));

        assert!(controller.on_drag(&mut tree, b, pointer + vec2(50.0, 0.0)));
        let body = tree.node(b).body;
        let pin = vec2(body.fx.expect("pinned"), body.fy.expect("pinned"));
        assert!((pin - (start + vec2(50.0, 0.0))).length() < 1e-3);

        simulation.tick(&mut tree);
        assert_eq!(tree.node(b).body.position, pin);

        assert!(controller.on_drag_end(&mut tree, &mut simulation, b));
        assert!(!controller.is_dragging(b));
        assert!(!tree.node(b).body.is_pinned());
        assert_eq!(tree.node(b).body.position, pin);
    }

    #[test]
    fn drag_reheats_resting_simulation_until_last_drag_ends() {
        let (mut tree, mut simulation, mut controller) = fixture();
        for _ in 0..400 {
            simulation.tick(&mut tree);
        }
        assert_eq!(simulation.phase(), Phase::Resting);

        let b = key(&tree, "B");
        let d = key(&tree, "D");
        controller.on_drag_start(&mut tree, &mut simulation, b, pos2(0.0, 0.0));
        controller.on_drag_start(&mut tree, &mut simulation, d, pos2(5.0, 5.0));
        assert_eq!(simulation.phase(), Phase::Settling);
        assert_eq!(simulation.alpha_target(), 0.3);
        assert_eq!(controller.active_drags(), 2);

        controller.on_drag_end(&mut tree, &mut simulation, b);
        assert_eq!(simulation.alpha_target(), 0.3);
        controller.on_drag_end(&mut tree, &mut simulation, d);
        assert_eq!(simulation.alpha_target(), 0.0);
    }

    #[test]
    fn click_after_moving_drag_is_suppressed() {
        let (mut tree, mut simulation, mut controller) = fixture();
        let c = key(&tree, "C");

        controller.on_drag_start(&mut tree, &mut simulation, c, pos2(10.0, 10.0));
        controller.on_drag(&mut tree, c, pos2(14.0, 10.0));
        controller.on_drag_end(&mut tree, &mut simulation, c);

        assert_eq!(controller.on_click(&mut tree, c), ClickOutcome::Suppressed);
        assert!(!tree.node(c).children().is_collapsed());

        assert_eq!(
            controller.on_click(&mut tree, c),
            ClickOutcome::Toggled(Toggle::Collapsed)
        );
    }

    #[test]
    fn tap_in_a_later_frame_after_drag_toggles() {
        let (mut tree, mut simulation, mut controller) = fixture();
        let c = key(&tree, "C");

        controller.on_drag_start(&mut tree, &mut simulation, c, pos2(10.0, 10.0));
        controller.on_drag(&mut tree, c, pos2(50.0, 10.0));
        controller.on_drag_end(&mut tree, &mut simulation, c);
        controller.on_frame();

        assert_eq!(
            controller.on_click(&mut tree, c),
            ClickOutcome::Toggled(Toggle::Collapsed)
        );
    }

    #[test]
    fn zoom_after_drag_release_clears_suppression() {
        let (mut tree, mut simulation, mut controller) = fixture();
        let c = key(&tree, "C");

        controller.on_drag_start(&mut tree, &mut simulation, c, pos2(10.0, 10.0));
        controller.on_drag(&mut tree, c, pos2(30.0, 10.0));
        controller.on_drag_end(&mut tree, &mut simulation, c);
        controller.on_zoom(ZoomDelta::pan(vec2(5.0, 0.0)));

        assert_eq!(
            controller.on_click(&mut tree, c),
            ClickOutcome::Toggled(Toggle::Collapsed)
        );
    }

    #[test]
    fn stationary_press_and_release_is_a_click() {
        let (mut tree, mut simulation, mut controller) = fixture();
        let c = key(&tree, "C");

        controller.on_drag_start(&mut tree, &mut simulation, c, pos2(10.0, 10.0));
        controller.on_drag_end(&mut tree, &mut simulation, c);

        assert_eq!(
            controller.on_click(&mut tree, c),
            ClickOutcome::Toggled(Toggle::Collapsed)
        );
    }

    #[test]
    fn click_distance_tolerates_small_jitter() {
        let (mut tree, mut simulation, _) = fixture();
        let mut controller = InteractionController::new(
            ViewTransform::IDENTITY,
            ZoomConfig::default(),
            InteractionConfig {
                click_distance: 3.0,
                ..InteractionConfig::default()
            },
        );
        let c = key(&tree, "C");

        controller.on_drag_start(&mut tree, &mut simulation, c, pos2(10.0, 10.0));
        controller.on_drag(&mut tree, c, pos2(12.0, 10.0));
        controller.on_drag_end(&mut tree, &mut simulation, c);

        assert_eq!(
            controller.on_click(&mut tree, c),
            ClickOutcome::Toggled(Toggle::Collapsed)
        );
    }

    #[test]
    fn click_on_leaf_reports_leaf() {
        let (mut tree, _, mut controller) = fixture();
        let b = key(&tree, "B");
        assert_eq!(
            controller.on_click(&mut tree, b),
            ClickOutcome::Toggled(Toggle::Leaf)
        );
    }

    #[test]
    fn drag_events_for_unknown_sessions_are_ignored() {
        let (mut tree, mut simulation, mut controller) = fixture();
        let b = key(&tree, "B");
        assert!(!controller.on_drag(&mut tree, b, pos2(1.0, 1.0)));
        assert!(!controller.on_drag_end(&mut tree, &mut simulation, b));
        assert!(!tree.node(b).body.is_pinned());
    }

    #[test]
    fn hit_test_picks_nearest_containing_circle() {
        let (tree, _, mut controller) = fixture();
        controller.on_zoom(ZoomDelta::scale_about(2.0, pos2(0.0, 0.0)));
        let a = tree.root();
        let b = key(&tree, "B");

        let candidates = [(a, vec2(10.0, 0.0), 5.0), (b, vec2(13.0, 0.0), 5.0)];
        assert_eq!(controller.hit_test(pos2(25.0, 0.0), candidates), Some(b));
        assert_eq!(controller.hit_test(pos2(19.0, 0.0), candidates), Some(a));
        assert_eq!(controller.hit_test(pos2(100.0, 0.0), candidates), None);
    }
}
