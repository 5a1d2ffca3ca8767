use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use hierarchy_force::{ClickOutcome, GestureEffect, NodeId, Toggle};
use log::debug;

use super::canvas::PaintOptions;
use super::input::set_hover_cursor;
use super::search::matching_ids;
use super::{SearchMatchCache, ViewModel};

impl ViewModel {
    fn cached_search_matches(&mut self) -> Arc<HashSet<NodeId>> {
        let query = self.search.trim();
        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph_revision
            && cached.query == query
        {
            return Arc::clone(&cached.matches);
        }

        let matches = Arc::new(matching_ids(
            self.graph.tree(),
            self.graph.visible_nodes(),
            query,
        ));
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.graph_revision,
            matches: Arc::clone(&matches),
        });
        matches
    }

    fn sync_container(&mut self, width: f32, height: f32) {
        let config = self.graph.config();
        if (config.width - width).abs() > 0.5 || (config.height - height).abs() > 0.5 {
            self.graph.set_container_size(width, height);
        }
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.sync_container(rect.width(), rect.height());

        for gesture in self.collect_gestures(ui, rect, &response) {
            let effect = self.graph.on_gesture(gesture);
            if let GestureEffect::Clicked(ClickOutcome::Toggled(Toggle::Collapsed | Toggle::Expanded)) =
                effect
            {
                self.graph_revision += 1;
                debug!("graph revision {}", self.graph_revision);
            }
        }

        let dt = ui.ctx().input(|input| input.stable_dt).clamp(0.0, 0.25);
        self.graph.on_tick(dt);
        if self.graph.simulation().is_settling() || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        let highlighted = self.cached_search_matches();
        let hovered = self.hovered_node(ui, rect);
        set_hover_cursor(ui, hovered.is_some());

        self.graph.surface().paint(
            &painter,
            rect,
            &PaintOptions {
                highlighted: &highlighted,
                hovered: hovered.and_then(|key| self.graph.tree().node(key).id()),
                show_labels: self.show_labels,
            },
        );

        if self.show_quadtree_overlay {
            let transform = self.graph.transform();
            let origin = rect.min.to_vec2();
            for cell in self.graph.quadtree_cells() {
                let half = vec2(cell.half_extent, cell.half_extent);
                let min = transform.apply(cell.center - half) + origin;
                let max = transform.apply(cell.center + half) + origin;

                let alpha = if cell.is_leaf { 110 } else { 55 };
                let line_width = (1.4_f32 - cell.depth as f32 * 0.09).clamp(0.45, 1.4);
                painter.rect_stroke(
                    egui::Rect::from_min_max(min, max),
                    0.0,
                    Stroke::new(line_width, Color32::from_rgba_unmultiplied(40, 120, 200, alpha)),
                    egui::StrokeKind::Middle,
                );
            }
        }

        if let Some(node) = hovered {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                self.hover_caption(node),
                FontId::proportional(13.0),
                Color32::from_gray(30),
            );
        }
    }
}
