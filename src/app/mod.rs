use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use eframe::egui::{self, Context};
use hierarchy_force::dataset::Record;
use hierarchy_force::{ForceConfig, ForceGraph, GraphConfig, Hierarchy, NodeId, NodeKey};

mod canvas;
mod input;
mod search;
mod ui;
mod view;

use canvas::CanvasSurface;

pub struct HierarchyForceApp {
    model: ViewModel,
}

struct ViewModel {
    graph: ForceGraph<Record, CanvasSurface>,
    dataset_label: String,
    forces: ForceConfig,
    override_link_strength: bool,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    graph_revision: u64,
    dragging: Option<NodeKey>,
    show_labels: bool,
    show_quadtree_overlay: bool,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<NodeId>>,
}

impl HierarchyForceApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        tree: Hierarchy<Record>,
        config: GraphConfig,
        dataset_label: String,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        Self {
            model: ViewModel::new(tree, config, dataset_label),
        }
    }
}

impl eframe::App for HierarchyForceApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.show(ctx);
    }
}
