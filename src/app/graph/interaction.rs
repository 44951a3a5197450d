use eframe::egui::{self, Pos2, Rect, Ui};
use tracing::{debug, warn};

use orbitview::DragSession;
use orbitview::drag::validate_overrides;

use super::super::render_utils::screen_to_world;
use super::super::{ActiveDrag, ViewModel};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before.to_vec2() * self.zoom);
        self.camera = None;
    }

    /// Secondary or middle drag pans anywhere; primary drag pans only when
    /// it did not start on a node.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let panning = response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || (response.dragged_by(egui::PointerButton::Primary) && self.drag.is_none());
        if panning {
            self.pan += response.drag_delta();
            self.camera = None;
        }
    }

    pub(in crate::app) fn hovered_node(
        pointer: Option<Pos2>,
        screen_rects: &[(String, Rect)],
    ) -> Option<String> {
        let pointer = pointer?;
        screen_rects
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(pointer))
            .map(|(id, _)| id.clone())
    }

    /// Node under the press point and the press point itself. egui reports
    /// a drag only after the pointer has moved past its threshold, so the
    /// hit-test has to use where the button went down.
    pub(in crate::app) fn drag_anchor(
        press_origin: Option<Pos2>,
        screen_rects: &[(String, Rect)],
    ) -> Option<(String, Pos2)> {
        let origin = press_origin?;
        Self::hovered_node(Some(origin), screen_rects).map(|id| (id, origin))
    }

    /// Press on a node starts a drag session; every pointer move re-runs
    /// propagation from the press-time snapshot; release ends it.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        screen_rects: &[(String, Rect)],
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some((id, origin)) = Self::drag_anchor(
                ui.input(|input| input.pointer.press_origin()),
                screen_rects,
            )
            && let Some(session) = DragSession::begin(&id, &self.rendered, &self.overrides)
        {
            debug!(node = %id, "drag started");
            self.drag = Some(ActiveDrag {
                session,
                pointer_origin: origin,
            });
        }

        if let Some(active) = &self.drag
            && let Some(topology) = &self.topology
            && response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let delta = (pointer - active.pointer_origin) / self.zoom;
            let updates = active.session.propagate(
                delta,
                self.zoom,
                &self.adjacency,
                &topology.depth_by_id,
                &self.config.drag,
            );
            match validate_overrides(&updates) {
                Ok(()) => self.overrides.extend(updates),
                Err(error) => warn!(%error, "dropping drag update"),
            }
        }

        if (response.drag_stopped() || !response.is_pointer_button_down_on())
            && let Some(active) = self.drag.take()
        {
            debug!(
                node = active.session.node_id(),
                overrides = self.overrides.len(),
                "drag released"
            );
        }
    }
}
