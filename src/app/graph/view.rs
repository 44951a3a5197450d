use std::collections::HashSet;

use eframe::egui::epaint::CubicBezierShape;
use eframe::egui::{
    self, Align2, Color32, CornerRadius, FontId, Rect, Sense, Stroke, StrokeKind, Ui, vec2,
};

use orbitview::edges::Arrowhead;
use orbitview::layout::footprint::Footprint;

use super::super::ViewModel;
use super::super::render_utils::{
    blend_color, category_color, dim_color, draw_background, state_stroke, world_to_screen,
};

impl ViewModel {
    /// Screen rectangles of every visible node, in BFS order.
    fn screen_rects(&self, rect: Rect) -> Vec<(String, Rect)> {
        let Some(topology) = &self.topology else {
            return Vec::new();
        };
        let displayed = self.displayed_positions();

        topology
            .visible
            .iter()
            .filter_map(|id| {
                let node = self.graph.nodes.get(id)?;
                let position = displayed.get(id)?;
                let depth = topology.depth_of(id).unwrap_or(0);
                let footprint = Footprint::for_node(node, depth, &self.config);
                let center = world_to_screen(rect, self.pan, self.zoom, *position);
                Some((
                    id.clone(),
                    Rect::from_center_size(center, footprint.half_size * 2.0 * self.zoom),
                ))
            })
            .collect()
    }

    fn search_hits(&self) -> HashSet<String> {
        match &self.search_cache {
            Some(cache) if !self.search.trim().is_empty() => {
                cache.matches.iter().map(|hit| hit.id.clone()).collect()
            }
            _ => HashSet::new(),
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_graph_zoom(ui, rect, &response);

        if self.topology.is_none() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                format!("Root `{}` is not loaded.", self.root_id),
                FontId::proportional(16.0),
                Color32::from_gray(220),
            );
            return;
        }

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hit_rects = self.screen_rects(rect);
        let hovered = Self::hovered_node(pointer, &hit_rects);
        self.handle_node_drag(ui, &response, &hit_rects);
        self.handle_graph_pan(&response);

        if response.double_clicked()
            && let Some(id) = &hovered
        {
            self.toggle_expanded(&id.clone());
        } else if response.clicked_by(egui::PointerButton::Primary) {
            self.set_selected(hovered.clone());
        }

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = if self.drag.is_some() {
                    egui::CursorIcon::Grabbing
                } else {
                    egui::CursorIcon::Grab
                };
            });
        }
        if self.drag.is_some() || response.dragged() {
            ui.ctx().request_repaint();
        }

        self.refresh_edges();
        let screen_rects = self.screen_rects(rect);
        let search_hits = self.search_hits();
        let selected = self.selected.as_deref();
        let zoom_sqrt = self.zoom.sqrt();
        let Some(topology) = &self.topology else {
            return;
        };

        for edge in &self.edge_cache {
            let points = edge
                .points()
                .map(|point| world_to_screen(rect, self.pan, self.zoom, point));
            let touches_selection =
                selected.is_some_and(|id| id == edge.source || id == edge.target);
            let stroke = if touches_selection {
                Stroke::new((2.2 * zoom_sqrt).clamp(1.2, 4.0), Color32::from_rgb(241, 146, 94))
            } else if selected.is_some() {
                Stroke::new(
                    (0.9 * zoom_sqrt).clamp(0.5, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 140),
                )
            } else {
                Stroke::new(
                    (1.2 * zoom_sqrt).clamp(0.6, 3.0),
                    Color32::from_rgba_unmultiplied(150, 160, 172, 190),
                )
            };

            if edge.is_line() {
                painter.line_segment([points[0], points[3]], stroke);
            } else {
                painter.add(CubicBezierShape::from_points_stroke(
                    points,
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
            }

            if let Some(arrow) = edge.arrow {
                let tip = world_to_screen(rect, self.pan, self.zoom, arrow.tip);
                let screen_arrow = Arrowhead {
                    tip,
                    direction: arrow.direction,
                };
                let length = self.config.edges.arrow_length * zoom_sqrt;
                for wing in screen_arrow.wings(length, self.config.edges.arrow_spread) {
                    painter.line_segment([wing, tip], stroke);
                }
            }

            if let Some(relation) = &edge.relation
                && (self.zoom > 0.7 || touches_selection)
            {
                painter.text(
                    world_to_screen(rect, self.pan, self.zoom, edge.label),
                    Align2::CENTER_CENTER,
                    relation,
                    FontId::proportional((10.0 * zoom_sqrt).clamp(8.0, 14.0)),
                    Color32::from_gray(190),
                );
            }
        }

        let font_size = (12.0 * zoom_sqrt).clamp(8.0, 18.0);
        for (id, node_rect) in &screen_rects {
            let Some(node) = self.graph.nodes.get(id) else {
                continue;
            };

            let is_selected = selected == Some(id.as_str());
            let is_hovered = hovered.as_deref() == Some(id.as_str());
            let is_hit = search_hits.contains(id);
            let base = category_color(node.category);
            let fill = if is_hovered {
                blend_color(base, Color32::WHITE, 0.25)
            } else if is_hit {
                blend_color(base, Color32::from_rgb(103, 196, 255), 0.6)
            } else if !search_hits.is_empty() || (selected.is_some() && !is_selected) {
                dim_color(base, 0.6)
            } else {
                base
            };

            let corner = CornerRadius::same((6.0 * zoom_sqrt).clamp(2.0, 10.0) as u8);
            painter.rect_filled(*node_rect, corner, fill);

            let outline = if is_selected {
                Stroke::new(2.4, Color32::from_rgb(245, 206, 93))
            } else if let Some(color) = state_stroke(&node.state) {
                Stroke::new(1.8, color)
            } else if self.overrides.contains_key(id) {
                Stroke::new(1.4, Color32::from_gray(235))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.rect_stroke(*node_rect, corner, outline, StrokeKind::Outside);

            if node_rect.width() > 24.0 {
                let max_chars = (node_rect.width() / (font_size * 0.6)).floor() as usize;
                let text = self.labels.fit(id, &node.label, max_chars).to_owned();
                painter.text(
                    node_rect.center(),
                    Align2::CENTER_CENTER,
                    text,
                    FontId::proportional(font_size),
                    Color32::from_rgb(18, 20, 24),
                );
            }

            let hidden_children = !node.expanded && self.adjacency.degree(id) > 1;
            let paged = topology
                .sibling_totals
                .get(id)
                .is_some_and(|total| *total > self.config.topology.page_size);
            if hidden_children || paged {
                let badge = if hidden_children {
                    "+".to_owned()
                } else {
                    let page = self.pages.get(id).copied().unwrap_or(0) + 1;
                    format!("p{page}")
                };
                painter.text(
                    node_rect.right_top() + vec2(4.0, -2.0),
                    Align2::LEFT_BOTTOM,
                    badge,
                    FontId::proportional((font_size * 0.85).max(8.0)),
                    Color32::from_gray(230),
                );
            }
        }

        if let Some(id) = &hovered
            && let Some(node) = self.graph.nodes.get(id)
        {
            let depth = topology
                .depth_of(id)
                .map(|depth| depth.to_string())
                .unwrap_or_else(|| "-".to_owned());
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  depth {}  |  {} neighbors",
                    node.label,
                    node.category.label(),
                    depth,
                    self.adjacency.degree(id)
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
