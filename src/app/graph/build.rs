use tracing::{debug, info, warn};

use orbitview::drag::resolve_positions;
use orbitview::layout::topology::page_count;
use orbitview::{
    LayoutPositions, LayoutResponse, LayoutWorker, TopologyParams, build_topology, layout_edges,
};

use super::super::ViewModel;
use super::super::motion::{CameraAnimation, LayoutTransition, entry_position};
use super::super::render_utils::pan_to_center;

const TRANSITION_SECS: f32 = 0.6;
const CAMERA_SECS: f32 = 0.45;

impl ViewModel {
    /// Recomputes the visible topology from scratch and asks the worker for
    /// a new relaxation. Called on any change to root, depth, pages or
    /// expansion state.
    pub(in crate::app) fn rebuild_topology(&mut self) {
        self.topology_generation = self.topology_generation.wrapping_add(1);
        self.search_cache = None;
        self.labels.sync_generation(self.topology_generation);

        let topology = build_topology(
            &self.graph,
            &self.adjacency,
            TopologyParams {
                root_id: &self.root_id,
                max_depth: self.config.topology.max_depth,
                page_size: self.config.topology.page_size,
                pages: &self.pages,
            },
        );

        let Some(topology) = topology else {
            warn!(root = %self.root_id, "root is not loaded; nothing to lay out");
            self.topology = None;
            self.rendered.clear();
            self.transition = None;
            self.pending_layout = None;
            self.edge_cache.clear();
            return;
        };

        self.graph.apply_depths(&topology.depth_by_id);
        self.topology = Some(topology);
        self.submit_layout();
    }

    pub(in crate::app) fn submit_layout(&mut self) {
        let Some(topology) = &self.topology else {
            return;
        };

        let sequence = match self.worker.submit(&self.graph, topology, &self.config) {
            Ok(sequence) => sequence,
            Err(error) => {
                warn!(%error, "layout worker unavailable; restarting it");
                self.worker = LayoutWorker::spawn();
                match self.worker.submit(&self.graph, topology, &self.config) {
                    Ok(sequence) => sequence,
                    Err(error) => {
                        self.layout_error = Some(error.to_string());
                        return;
                    }
                }
            }
        };

        self.layout_error = None;
        debug!(sequence, generation = self.topology_generation, "layout requested");
    }

    /// Picks up finished relaxations. A result that lands mid-drag is held
    /// back until the drag releases its hold on node positions.
    pub(in crate::app) fn poll_layout(&mut self) {
        match self.worker.poll() {
            Ok(Some(response)) => self.pending_layout = Some(response),
            Ok(None) => {}
            Err(error) => self.layout_error = Some(error.to_string()),
        }

        if self.drag.is_none()
            && let Some(response) = self.pending_layout.take()
        {
            self.apply_layout(response);
        }
    }

    fn apply_layout(&mut self, response: LayoutResponse) {
        let Some(topology) = &self.topology else {
            return;
        };

        let first_layout = self.rendered.is_empty();
        let current = self.displayed_positions();
        let from = response
            .positions
            .iter()
            .map(|(id, target)| {
                let parent = topology.parent_by_id.get(id).map(String::as_str);
                (id.clone(), entry_position(id, *target, parent, &current))
            })
            .collect::<LayoutPositions>();

        info!(
            sequence = response.sequence,
            nodes = response.positions.len(),
            cleared_overrides = self.overrides.len(),
            "applying layout"
        );
        self.overrides.clear();

        if first_layout {
            self.rendered = response.positions;
            self.transition = None;
            self.focus_node(&self.root_id.clone());
        } else {
            self.transition = Some(LayoutTransition::new(
                from,
                response.positions,
                TRANSITION_SECS,
            ));
        }
    }

    /// Advances the layout transition and camera. Both stay frozen while a
    /// drag is active. Returns true while anything is still moving.
    pub(in crate::app) fn advance_motion(&mut self, dt: f32) -> bool {
        if self.drag.is_some() {
            return false;
        }

        let mut moving = false;

        if let Some(transition) = self.transition.as_mut() {
            let running = transition.advance(dt, &mut self.rendered);
            if !running {
                self.transition = None;
            }
            moving |= running;
        }

        if let Some(camera) = self.camera.as_mut() {
            let running = camera.advance(dt, &mut self.pan);
            if !running {
                self.camera = None;
            }
            moving |= running;
        }

        moving
    }

    pub(in crate::app) fn displayed_positions(&self) -> LayoutPositions {
        resolve_positions(&self.rendered, &self.overrides)
    }

    pub(in crate::app) fn refresh_edges(&mut self) {
        let Some(topology) = &self.topology else {
            self.edge_cache.clear();
            return;
        };
        let displayed = self.displayed_positions();
        self.edge_cache = layout_edges(&self.graph, topology, &displayed, &self.config);
    }

    pub(in crate::app) fn focus_node(&mut self, id: &str) {
        let Some(position) = self
            .overrides
            .get(id)
            .or_else(|| self.rendered.get(id))
            .copied()
        else {
            return;
        };

        self.camera = Some(CameraAnimation::new(
            self.pan,
            pan_to_center(position, self.zoom),
            CAMERA_SECS,
        ));
    }

    pub(in crate::app) fn toggle_expanded(&mut self, id: &str) {
        let Some(node) = self.graph.nodes.get_mut(id) else {
            return;
        };
        node.expanded = !node.expanded;
        debug!(node = id, expanded = node.expanded, "toggled expansion");
        self.rebuild_topology();
    }

    pub(in crate::app) fn set_root(&mut self, id: &str) {
        if self.root_id == id || !self.graph.nodes.contains_key(id) {
            return;
        }
        self.root_id = id.to_owned();
        self.pages.clear();
        self.rendered.clear();
        self.overrides.clear();
        self.transition = None;
        self.rebuild_topology();
    }

    /// Current page and page count for a parent's children, when it has any.
    pub(in crate::app) fn page_info(&self, id: &str) -> Option<(usize, usize)> {
        let total = *self.topology.as_ref()?.sibling_totals.get(id)?;
        let count = page_count(total, self.config.topology.page_size);
        let page = self.pages.get(id).copied().unwrap_or(0).min(count.saturating_sub(1));
        Some((page, count))
    }

    pub(in crate::app) fn step_page(&mut self, id: &str, forward: bool) {
        let Some((page, count)) = self.page_info(id) else {
            return;
        };
        let next = if forward {
            (page + 1).min(count.saturating_sub(1))
        } else {
            page.saturating_sub(1)
        };
        if next != page {
            self.pages.insert(id.to_owned(), next);
            self.rebuild_topology();
        }
    }

    pub(in crate::app) fn reseed(&mut self) {
        self.config.seed = self.config.seed.wrapping_add(1);
        info!(seed = self.config.seed, "reseeding layout");
        self.submit_layout();
    }

    pub(in crate::app) fn reset_overrides(&mut self) {
        debug!(count = self.overrides.len(), "clearing manual positions");
        self.overrides.clear();
    }
}
