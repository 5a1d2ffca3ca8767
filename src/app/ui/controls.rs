use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};
use hierarchy_force::{ForceConfig, Phase};

use super::super::ViewModel;

fn force_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hover);
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Settling => "settling",
        Phase::Resting => "resting",
        Phase::Stopped => "stopped",
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search node names")
            .on_hover_text("Fuzzy-highlight visible nodes whose name matches.");
        ui.text_edit_singleline(&mut self.search);
        let matches = self
            .search_match_cache
            .as_ref()
            .filter(|cache| cache.query == self.search.trim() && !cache.query.is_empty())
            .map(|cache| cache.matches.len());
        if let Some(count) = matches {
            ui.label(format!("{count} matching nodes"));
        }

        ui.separator();

        ui.checkbox(&mut self.show_labels, "Show labels")
            .on_hover_text("Draw every node name next to its circle.");
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the Barnes-Hut partitions over the current layout.");
        ui.checkbox(&mut self.show_fps_bar, "FPS Display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.separator();
        self.draw_force_controls(ui);

        ui.separator();
        self.draw_status(ui);
    }

    fn draw_force_controls(&mut self, ui: &mut Ui) {
        ui.collapsing("Forces", |ui| {
            let forces = &mut self.forces;
            force_slider(
                ui,
                &mut forces.link_distance,
                1.0..=200.0,
                "Link distance",
                "Rest length of every parent-child spring.",
            );

            ui.checkbox(&mut self.override_link_strength, "Fixed link strength")
                .on_hover_text("Use one spring strength instead of deriving it from node degrees.");
            if self.override_link_strength {
                let strength = forces.link_strength.get_or_insert(1.0);
                force_slider(
                    ui,
                    strength,
                    0.0..=2.0,
                    "Link strength",
                    "Fraction of the length error corrected per tick.",
                );
            } else {
                forces.link_strength = None;
            }

            force_slider(
                ui,
                &mut forces.charge_strength,
                -200.0..=50.0,
                "Charge",
                "Many-body strength. Negative values push nodes apart.",
            );
            force_slider(
                ui,
                &mut forces.charge_distance_max,
                10.0..=1000.0,
                "Charge range",
                "Pairs farther apart than this do not interact.",
            );
            force_slider(
                ui,
                &mut forces.theta,
                0.1..=2.0,
                "Theta",
                "Barnes-Hut accuracy. Lower is more exact and slower.",
            );
            force_slider(
                ui,
                &mut forces.center_strength,
                0.0..=1.0,
                "Centering",
                "How much of the centroid offset is removed each tick.",
            );
            force_slider(
                ui,
                &mut forces.velocity_decay,
                0.05..=0.95,
                "Friction",
                "Share of velocity lost per tick.",
            );
            force_slider(
                ui,
                &mut forces.alpha_decay,
                0.001..=0.2,
                "Cooling",
                "How fast the layout energy decays toward rest.",
            );

            ui.horizontal(|ui| {
                if ui
                    .button("Apply")
                    .on_hover_text("Apply these forces and reheat the layout.")
                    .clicked()
                {
                    self.graph.set_force_config(self.forces);
                }
                if ui.button("Reset").clicked() {
                    self.forces = ForceConfig::default();
                    self.override_link_strength = false;
                    self.graph.set_force_config(self.forces);
                }
            });
        });

        if ui
            .button("Reheat")
            .on_hover_text("Inject energy so the layout moves again.")
            .clicked()
        {
            self.graph.reheat();
        }
    }

    fn draw_status(&self, ui: &mut Ui) {
        let simulation = self.graph.simulation();
        egui::Grid::new("status_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Dataset");
                ui.label(self.dataset_label.as_str());
                ui.end_row();
                ui.label("Nodes");
                ui.label(format!(
                    "{} visible / {} total",
                    self.graph.visible_nodes().len(),
                    self.graph.tree().len()
                ));
                ui.end_row();
                ui.label("Links");
                ui.label(self.graph.link_count().to_string());
                ui.end_row();
                ui.label("Alpha");
                ui.label(format!("{:.4}", simulation.alpha()));
                ui.end_row();
                ui.label("Phase");
                ui.label(phase_label(simulation.phase()));
                ui.end_row();
                ui.label("Scale");
                ui.label(format!("{:.2}x", self.graph.transform().scale));
                ui.end_row();
                ui.label("Elements");
                ui.label(self.graph.surface().element_count().to_string());
                ui.end_row();
            });
    }
}
