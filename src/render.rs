//! Keyed reconciliation of the visible node/link set against persistent
//! elements owned by a host drawing surface.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Debug;

use eframe::egui::{Align2, Color32, Stroke, Vec2};

use crate::hierarchy::{Hierarchy, HierarchyNode, Link, NodeData, NodeId, NodeKey};
use crate::interaction::ViewTransform;

pub const DEFAULT_RADIUS: f32 = 4.5;
pub const PARENT_FILL: Color32 = Color32::from_rgb(0x51, 0xA1, 0xDC);
pub const LEAF_FILL: Color32 = Color32::from_rgb(0xF9, 0x4B, 0x4C);
pub const NODE_STROKE: Stroke = Stroke {
    width: 2.0,
    color: Color32::from_rgb(0x66, 0x66, 0x66),
};
pub const LINK_STROKE: Stroke = Stroke {
    width: 2.0,
    color: Color32::from_rgba_premultiplied(0, 0, 0, 51),
};

/// `sqrt(size) / 10`, or [`DEFAULT_RADIUS`] when that is not a positive number.
pub fn node_radius(size: Option<f64>) -> f32 {
    size.map(|size| size.sqrt() / 10.0)
        .filter(|radius| radius.is_finite() && *radius > 0.0)
        .map_or(DEFAULT_RADIUS, |radius| radius as f32)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Stroke,
    /// Where the label sits relative to the node centre.
    pub label_anchor: Align2,
}

impl NodeStyle {
    pub fn for_node<T: NodeData>(node: &HierarchyNode<T>) -> Self {
        let children = node.children();
        Self {
            radius: node_radius(node.data().size()),
            fill: if children.is_leaf() {
                LEAF_FILL
            } else {
                PARENT_FILL
            },
            stroke: NODE_STROKE,
            label_anchor: if children.visible().is_empty() {
                Align2::LEFT_CENTER
            } else {
                Align2::RIGHT_CENTER
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStyle {
    pub stroke: Stroke,
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self {
            stroke: LINK_STROKE,
        }
    }
}

pub trait RenderSurface {
    type Element: Copy + Eq + Debug;

    fn create_node(&mut self, id: NodeId, style: &NodeStyle, label: &str) -> Self::Element;
    fn create_link(&mut self, id: NodeId, style: &LinkStyle) -> Self::Element;
    fn restyle_node(&mut self, element: Self::Element, style: &NodeStyle);
    fn remove(&mut self, element: Self::Element);
    fn place_node(&mut self, element: Self::Element, position: Vec2);
    fn place_link(&mut self, element: Self::Element, source: Vec2, target: Vec2);
    fn set_view_transform(&mut self, transform: ViewTransform);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindCounts {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindReport {
    pub nodes: BindCounts,
    pub links: BindCounts,
}

struct BoundNode<E> {
    element: E,
    key: NodeKey,
    style: NodeStyle,
}

struct BoundLink<E> {
    element: E,
    source: NodeKey,
    target: NodeKey,
}

/// Node elements keyed by node id; link elements keyed by their target's id.
pub struct RenderBinder<E> {
    nodes: HashMap<NodeId, BoundNode<E>>,
    links: HashMap<NodeId, BoundLink<E>>,
}

impl<E> Default for RenderBinder<E> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            links: HashMap::new(),
        }
    }
}

impl<E: Copy + Eq + Debug> RenderBinder<E> {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn element_for(&self, id: NodeId) -> Option<E> {
        self.nodes.get(&id).map(|bound| bound.element)
    }

    pub fn link_element_for(&self, target: NodeId) -> Option<E> {
        self.links.get(&target).map(|bound| bound.element)
    }

    /// Reconciles bound elements with `nodes` and `links`, then places them.
    /// Existing elements are kept; only style changes are pushed for them.
    pub fn bind<T, S>(
        &mut self,
        tree: &Hierarchy<T>,
        nodes: &[NodeKey],
        links: &[Link],
        surface: &mut S,
    ) -> BindReport
    where
        T: NodeData,
        S: RenderSurface<Element = E>,
    {
        let mut report = BindReport::default();

        let mut live_links = HashMap::with_capacity(links.len());
        for link in links {
            if let Some(target_id) = tree.node(link.target).id() {
                live_links.insert(target_id, *link);
            }
        }
        self.links.retain(|id, bound| {
            let keep = live_links.contains_key(id);
            if !keep {
                surface.remove(bound.element);
                report.links.exited += 1;
            }
            keep
        });
        for (target_id, link) in live_links {
            match self.links.entry(target_id) {
                Entry::Occupied(mut entry) => {
                    let bound = entry.get_mut();
                    bound.source = link.source;
                    bound.target = link.target;
                    report.links.updated += 1;
                }
                Entry::Vacant(entry) => {
                    let element = surface.create_link(target_id, &LinkStyle::default());
                    entry.insert(BoundLink {
                        element,
                        source: link.source,
                        target: link.target,
                    });
                    report.links.entered += 1;
                }
            }
        }

        let mut live_nodes = HashMap::with_capacity(nodes.len());
        for &key in nodes {
            if let Some(id) = tree.node(key).id() {
                live_nodes.insert(id, key);
            }
        }
        self.nodes.retain(|id, bound| {
            let keep = live_nodes.contains_key(id);
            if !keep {
                surface.remove(bound.element);
                report.nodes.exited += 1;
            }
            keep
        });
        for (id, key) in live_nodes {
            let node = tree.node(key);
            let style = NodeStyle::for_node(node);
            match self.nodes.entry(id) {
                Entry::Occupied(mut entry) => {
                    let bound = entry.get_mut();
                    bound.key = key;
                    if bound.style != style {
                        surface.restyle_node(bound.element, &style);
                        bound.style = style;
                    }
                    report.nodes.updated += 1;
                }
                Entry::Vacant(entry) => {
                    let element = surface.create_node(id, &style, node.data().name());
                    entry.insert(BoundNode {
                        element,
                        key,
                        style,
                    });
                    report.nodes.entered += 1;
                }
            }
        }

        self.on_tick(tree, surface);
        report
    }

    /// Pushes current positions to every bound element. Never creates elements.
    pub fn on_tick<T, S>(&self, tree: &Hierarchy<T>, surface: &mut S)
    where
        S: RenderSurface<Element = E>,
    {
        for bound in self.links.values() {
            surface.place_link(
                bound.element,
                tree.node(bound.source).body.position,
                tree.node(bound.target).body.position,
            );
        }
        for bound in self.nodes.values() {
            surface.place_node(bound.element, tree.node(bound.key).body.position);
        }
    }

    pub fn release<S>(&mut self, surface: &mut S) -> usize
    where
        S: RenderSurface<Element = E>,
    {
        let released = self.nodes.len() + self.links.len();
        for (_, bound) in self.links.drain() {
            surface.remove(bound.element);
        }
        for (_, bound) in self.nodes.drain() {
            surface.remove(bound.element);
        }
        released
    }
}
