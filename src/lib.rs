//! Interactive force-directed layout for collapsible hierarchies.
//!
//! A nested dataset becomes a [`Hierarchy`]; [`ForceGraph`] flattens its
//! visible part, runs the force [`Simulation`] on a fixed tick, turns host
//! [`Gesture`]s into pins, view changes and collapse toggles, and keeps a
//! host [`RenderSurface`] in sync through keyed enter/update/exit binding.

pub mod config;
pub mod dataset;
pub mod graph;
pub mod hierarchy;
pub mod interaction;
pub mod render;
pub mod simulation;
mod util;

pub use config::{ForceConfig, GraphConfig, InteractionConfig, SchedulerConfig, ZoomConfig};
pub use graph::{ForceGraph, GestureEffect, TickReport, TickScheduler};
pub use hierarchy::{Children, Hierarchy, HierarchyNode, Link, NodeData, NodeId, NodeKey, Toggle};
pub use interaction::{ClickOutcome, Gesture, InteractionController, ViewTransform, ZoomDelta};
pub use render::{BindReport, LinkStyle, NodeStyle, RenderBinder, RenderSurface};
pub use simulation::{Phase, Simulation, TickOutcome};
