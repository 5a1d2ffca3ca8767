use eframe::egui::{self, PointerButton, Pos2, Rect, Response, Ui, Vec2};
use hierarchy_force::{Gesture, NodeData, NodeKey, ZoomDelta};

use super::ViewModel;

pub(super) fn wheel_zoom_factor(scroll: f32, pinch: f32, sensitivity: f32) -> f32 {
    let wheel = if (pinch - 1.0).abs() > f32::EPSILON {
        1.0
    } else {
        2.0_f32.powf(scroll * sensitivity)
    };
    wheel * pinch
}

impl ViewModel {
    pub(super) fn collect_gestures(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &Response,
    ) -> Vec<Gesture> {
        let local = |pointer: Pos2| (pointer - rect.min).to_pos2();
        let mut gestures = Vec::new();

        if response.hovered() {
            let (scroll, pinch, hover) = ui.input(|input| {
                (
                    input.raw_scroll_delta.y,
                    input.zoom_delta(),
                    input.pointer.hover_pos(),
                )
            });
            let factor = wheel_zoom_factor(scroll, pinch, self.graph.config().zoom.wheel_sensitivity);
            if (factor - 1.0).abs() > f32::EPSILON {
                let anchor = local(hover.unwrap_or_else(|| rect.center()));
                gestures.push(Gesture::Zoom(ZoomDelta::scale_about(factor, anchor)));
            }
        }

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .or(response.interact_pointer_pos());
            self.dragging = origin.and_then(|origin| {
                let pointer = local(origin);
                let node = self.graph.node_at(pointer)?;
                gestures.push(Gesture::DragStart { node, pointer });
                Some(node)
            });
        }

        if response.dragged_by(PointerButton::Primary) {
            match (self.dragging, response.interact_pointer_pos()) {
                (Some(node), Some(pointer)) => gestures.push(Gesture::Drag {
                    node,
                    pointer: local(pointer),
                }),
                (None, _) => push_pan(&mut gestures, response.drag_delta()),
                (Some(_), None) => {}
            }
        }

        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            push_pan(&mut gestures, response.drag_delta());
        }

        if response.drag_stopped_by(PointerButton::Primary)
            && let Some(node) = self.dragging.take()
        {
            gestures.push(Gesture::DragEnd { node });
        }

        if response.clicked_by(PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(node) = self.graph.node_at(local(pointer))
        {
            gestures.push(Gesture::Click { node });
        }

        gestures
    }

    pub(super) fn hovered_node(&self, ui: &Ui, rect: Rect) -> Option<NodeKey> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }
        self.graph.node_at((pointer - rect.min).to_pos2())
    }

    pub(super) fn hover_caption(&self, node: NodeKey) -> String {
        let node = self.graph.tree().node(node);
        let size = node
            .data()
            .size()
            .map_or_else(|| "no size".to_owned(), |size| format!("size {size}"));
        let state = if node.children().is_leaf() {
            "leaf".to_owned()
        } else if node.children().is_collapsed() {
            format!("{} hidden children", node.children().hidden().len())
        } else {
            format!("{} children", node.children().visible().len())
        };
        let id = node.id().map_or_else(String::new, |id| format!("{id}  |  "));
        format!("{id}{}  |  {size}  |  {state}", node.data().name())
    }
}

fn push_pan(gestures: &mut Vec<Gesture>, delta: Vec2) {
    if delta != Vec2::ZERO {
        gestures.push(Gesture::Zoom(ZoomDelta::pan(delta)));
    }
}

pub(super) fn set_hover_cursor(ui: &Ui, hovering: bool) {
    if hovering {
        ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_factor_doubles_per_inverse_sensitivity() {
        assert!((wheel_zoom_factor(500.0, 1.0, 0.002) - 2.0).abs() < 1e-5);
        assert!((wheel_zoom_factor(-500.0, 1.0, 0.002) - 0.5).abs() < 1e-5);
        assert_eq!(wheel_zoom_factor(0.0, 1.0, 0.002), 1.0);
    }

    #[test]
    fn pinch_replaces_wheel_scroll() {
        assert_eq!(wheel_zoom_factor(120.0, 1.25, 0.002), 1.25);
    }
}
