use std::collections::HashSet;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2, vec2};
use hierarchy_force::{LinkStyle, NodeId, NodeStyle, RenderSurface, ViewTransform};

const SEARCH_HALO: Color32 = Color32::from_rgb(255, 196, 61);
const HOVER_STROKE: Color32 = Color32::from_rgb(30, 30, 30);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(super) struct ElementHandle(usize);

#[derive(Clone, Debug)]
enum Element {
    Node {
        id: NodeId,
        style: NodeStyle,
        label: String,
        position: Vec2,
    },
    Link {
        stroke: Stroke,
        source: Vec2,
        target: Vec2,
    },
}

pub(super) struct PaintOptions<'a> {
    pub(super) highlighted: &'a HashSet<NodeId>,
    pub(super) hovered: Option<NodeId>,
    pub(super) show_labels: bool,
}

#[derive(Default)]
pub(super) struct CanvasSurface {
    slots: Vec<Option<Element>>,
    free: Vec<usize>,
    transform: ViewTransform,
}

impl CanvasSurface {
    fn insert(&mut self, element: Element) -> ElementHandle {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(element);
                ElementHandle(index)
            }
            None => {
                self.slots.push(Some(element));
                ElementHandle(self.slots.len() - 1)
            }
        }
    }

    pub(super) fn element_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(super) fn paint(&self, painter: &Painter, rect: Rect, options: &PaintOptions<'_>) {
        draw_background(painter, rect, self.transform);

        let origin = rect.min.to_vec2();
        let to_screen = |world: Vec2| self.transform.apply(world) + origin;
        let scale = self.transform.scale;

        for element in self.slots.iter().flatten() {
            if let Element::Link {
                stroke,
                source,
                target,
            } = element
            {
                let start = to_screen(*source);
                let end = to_screen(*target);
                if edge_in_view(rect, start, end) {
                    painter.line_segment([start, end], Stroke::new(stroke.width * scale, stroke.color));
                }
            }
        }

        let font = FontId::proportional((10.0 * scale).clamp(8.0, 22.0));
        for element in self.slots.iter().flatten() {
            let Element::Node {
                id,
                style,
                label,
                position,
            } = element
            else {
                continue;
            };

            let center = to_screen(*position);
            let radius = style.radius * scale;
            if !circle_visible(rect, center, radius + style.stroke.width * scale) {
                continue;
            }

            if options.highlighted.contains(id) {
                painter.circle_filled(center, radius + 4.0 * scale.sqrt(), SEARCH_HALO);
            }
            painter.circle_filled(center, radius, style.fill);
            let stroke_color = if options.hovered == Some(*id) {
                HOVER_STROKE
            } else {
                style.stroke.color
            };
            painter.circle_stroke(center, radius, Stroke::new(style.stroke.width * scale, stroke_color));

            if options.show_labels || options.hovered == Some(*id) {
                let gap = radius + 3.0;
                let anchor = if style.label_anchor == Align2::RIGHT_CENTER {
                    center - vec2(gap, 0.0)
                } else {
                    center + vec2(gap, 0.0)
                };
                painter.text(anchor, style.label_anchor, label, font.clone(), Color32::from_gray(40));
            }
        }
    }
}

impl RenderSurface for CanvasSurface {
    type Element = ElementHandle;

    fn create_node(&mut self, id: NodeId, style: &NodeStyle, label: &str) -> ElementHandle {
        self.insert(Element::Node {
            id,
            style: *style,
            label: label.to_owned(),
            position: Vec2::ZERO,
        })
    }

    fn create_link(&mut self, _id: NodeId, style: &LinkStyle) -> ElementHandle {
        self.insert(Element::Link {
            stroke: style.stroke,
            source: Vec2::ZERO,
            target: Vec2::ZERO,
        })
    }

    fn restyle_node(&mut self, element: ElementHandle, style: &NodeStyle) {
        if let Some(Some(Element::Node { style: current, .. })) = self.slots.get_mut(element.0) {
            *current = *style;
        }
    }

    fn remove(&mut self, element: ElementHandle) {
        if let Some(slot) = self.slots.get_mut(element.0)
            && slot.take().is_some()
        {
            self.free.push(element.0);
        }
    }

    fn place_node(&mut self, element: ElementHandle, world: Vec2) {
        if let Some(Some(Element::Node { position, .. })) = self.slots.get_mut(element.0) {
            *position = world;
        }
    }

    fn place_link(&mut self, element: ElementHandle, from: Vec2, to: Vec2) {
        if let Some(Some(Element::Link { source, target, .. })) = self.slots.get_mut(element.0) {
            *source = from;
            *target = to;
        }
    }

    fn set_view_transform(&mut self, transform: ViewTransform) {
        self.transform = transform;
    }
}

fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(250, 250, 248));

    let step = (48.0 * transform.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + transform.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(0, 0, 0, 14));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

fn edge_in_view(rect: Rect, start: Pos2, end: Pos2) -> bool {
    Rect::from_two_pos(start, end).expand(2.0).intersects(rect)
}
