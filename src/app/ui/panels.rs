use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout};
use hierarchy_force::dataset::Record;
use hierarchy_force::{ForceGraph, GraphConfig, Hierarchy};

use super::super::ViewModel;
use super::super::canvas::CanvasSurface;

impl ViewModel {
    pub(in crate::app) fn new(
        tree: Hierarchy<Record>,
        config: GraphConfig,
        dataset_label: String,
    ) -> Self {
        let forces = config.forces;
        Self {
            graph: ForceGraph::new(tree, config, CanvasSurface::default()),
            dataset_label,
            override_link_strength: forces.link_strength.is_some(),
            forces,
            search: String::new(),
            search_match_cache: None,
            graph_revision: 0,
            dragging: None,
            show_labels: false,
            show_quadtree_overlay: false,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("hierarchy-force");
                    ui.separator();
                    ui.label(format!("dataset: {}", self.dataset_label));
                    ui.label(format!(
                        "nodes: {} / {}",
                        self.graph.visible_nodes().len(),
                        self.graph.tree().len()
                    ));
                    ui.label(format!("links: {}", self.graph.link_count()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
