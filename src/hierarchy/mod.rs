//! Nested records flattened into a node/link set with collapsible subtrees.

mod ids;

use std::collections::VecDeque;

use eframe::egui::Vec2;

pub use ids::NodeId;
use ids::IdAllocator;

pub trait NodeData {
    fn name(&self) -> &str;

    /// `None` when the source record carried no usable size.
    fn size(&self) -> Option<f64>;
}

/// Arena slot of a node. Stable for the lifetime of its [`Hierarchy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

impl NodeKey {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Child slot of a node: either visible or stashed away, never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Children {
    Expanded(Vec<NodeKey>),
    Collapsed(Vec<NodeKey>),
}

impl Children {
    pub fn visible(&self) -> &[NodeKey] {
        match self {
            Self::Expanded(children) => children,
            Self::Collapsed(_) => &[],
        }
    }

    pub fn hidden(&self) -> &[NodeKey] {
        match self {
            Self::Expanded(_) => &[],
            Self::Collapsed(children) => children,
        }
    }

    pub fn all(&self) -> &[NodeKey] {
        match self {
            Self::Expanded(children) | Self::Collapsed(children) => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.all().is_empty()
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self, Self::Collapsed(children) if !children.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Collapsed,
    Expanded,
    Leaf,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub fx: Option<f32>,
    pub fy: Option<f32>,
    placed: bool,
}

impl Body {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            placed: true,
            ..Self::default()
        }
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub(crate) fn place(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.placed = true;
    }

    pub fn pin(&mut self, at: Vec2) {
        self.fx = Some(at.x);
        self.fy = Some(at.y);
    }

    pub fn unpin(&mut self) {
        self.fx = None;
        self.fy = None;
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct HierarchyNode<T> {
    id: Option<NodeId>,
    data: T,
    parent: Option<NodeKey>,
    children: Children,
    depth: usize,
    pub body: Body,
}

impl<T> HierarchyNode<T> {
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: NodeKey,
    pub target: NodeKey,
}

#[derive(Clone, Debug)]
pub struct Hierarchy<T> {
    nodes: Vec<HierarchyNode<T>>,
    root: NodeKey,
    ids: IdAllocator,
}

impl<T> Hierarchy<T> {
    /// Builds the arena from any nested source. `split` separates a source
    /// record into its payload and its child records, in display order.
    pub fn from_nested<S, F>(source: S, mut split: F) -> Self
    where
        F: FnMut(S) -> (T, Vec<S>),
    {
        let mut nodes: Vec<HierarchyNode<T>> = Vec::new();
        let mut pending = vec![(source, None::<NodeKey>)];

        while let Some((record, parent)) = pending.pop() {
            let (data, children) = split(record);
            let key = NodeKey(nodes.len());
            let depth = parent.map_or(0, |parent| nodes[parent.0].depth + 1);
            nodes.push(HierarchyNode {
                id: None,
                data,
                parent,
                children: Children::Expanded(Vec::with_capacity(children.len())),
                depth,
                body: Body::default(),
            });

            if let Some(parent) = parent
                && let Children::Expanded(siblings) = &mut nodes[parent.0].children
            {
                siblings.push(key);
            }

            for child in children.into_iter().rev() {
                pending.push((child, Some(key)));
            }
        }

        Self {
            nodes,
            root: NodeKey(0),
            ids: IdAllocator::default(),
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, key: NodeKey) -> &HierarchyNode<T> {
        &self.nodes[key.0]
    }

    pub fn node_mut(&mut self, key: NodeKey) -> &mut HierarchyNode<T> {
        &mut self.nodes[key.0]
    }

    pub fn get(&self, key: NodeKey) -> Option<&HierarchyNode<T>> {
        self.nodes.get(key.0)
    }

    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        (0..self.nodes.len()).map(NodeKey)
    }

    pub fn find_by_id(&self, id: NodeId) -> Option<NodeKey> {
        self.nodes
            .iter()
            .position(|node| node.id == Some(id))
            .map(NodeKey)
    }

    pub fn ancestors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        std::iter::successors(self.node(key).parent, |&parent| self.node(parent).parent)
    }

    pub fn is_visible(&self, key: NodeKey) -> bool {
        let mut child = key;
        for parent in self.ancestors(key) {
            if !self.node(parent).children.visible().contains(&child) {
                return false;
            }
            child = parent;
        }
        true
    }

    /// Post-order walk over the visible tree: every node appears after all of
    /// its visible descendants. Nodes without an id receive one here.
    pub fn flatten(&mut self) -> Vec<NodeKey> {
        let mut order = Vec::new();
        let mut stack = vec![(self.root, false)];

        while let Some((key, children_done)) = stack.pop() {
            if children_done {
                let next = self.ids.advance();
                let node = &mut self.nodes[key.0];
                if node.id.is_none() {
                    node.id = Some(next);
                }
                order.push(key);
                continue;
            }

            stack.push((key, true));
            for &child in self.nodes[key.0].children.visible().iter().rev() {
                stack.push((child, false));
            }
        }

        order
    }

    /// One link per (parent, visible child) pair, breadth-first from the root.
    pub fn links(&self) -> Vec<Link> {
        let mut links = Vec::new();
        let mut queue = VecDeque::from([self.root]);

        while let Some(source) = queue.pop_front() {
            for &target in self.nodes[source.0].children.visible() {
                links.push(Link { source, target });
                queue.push_back(target);
            }
        }

        links
    }

    /// Swaps a node between expanded and collapsed. Does not re-flatten.
    pub fn toggle(&mut self, key: NodeKey) -> Toggle {
        let node = &mut self.nodes[key.0];
        if node.children.is_leaf() {
            return Toggle::Leaf;
        }

        let children = std::mem::replace(&mut node.children, Children::Expanded(Vec::new()));
        let (next, outcome) = match children {
            Children::Expanded(children) => (Children::Collapsed(children), Toggle::Collapsed),
            Children::Collapsed(children) => (Children::Expanded(children), Toggle::Expanded),
        };
        node.children = next;
        outcome
    }
}

impl<T: NodeData> Hierarchy<T> {
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes
            .iter()
            .position(|node| node.data.name() == name)
            .map(NodeKey)
    }
}
