use eframe::egui::{self, RichText, Ui};

use orbitview::graph::LoadState;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node on the canvas or a search result.");
            return;
        };

        let Some(node) = self.graph.nodes.get(&selected_id) else {
            ui.label("Selected node is no longer part of the graph.");
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Category: {}", node.category.label()));
        let depth = node
            .depth
            .map(|depth| depth.to_string())
            .unwrap_or_else(|| "not visible".to_owned());
        ui.label(format!("Depth: {depth}"));
        match &node.state {
            LoadState::Ready => ui.label("State: ready"),
            LoadState::Loading => ui.label("State: loading"),
            LoadState::Error(message) => ui.colored_label(
                egui::Color32::from_rgb(235, 87, 87),
                format!("State: error ({message})"),
            ),
        };
        ui.label(format!(
            "Expanded: {}",
            if node.expanded { "yes" } else { "no" }
        ));

        if let Some(topology) = &self.topology {
            let shown = topology.children_of(&selected_id).len();
            match topology.sibling_totals.get(&selected_id) {
                Some(total) => ui.label(format!("Children shown: {shown} of {total}")),
                None => ui.label(format!("Children shown: {shown}")),
            };
            if let Some(parent) = topology.parent_by_id.get(&selected_id) {
                ui.label(format!("Reached from: {}", self.graph.label_of(parent)));
            }
        }

        if let Some(position) = self.overrides.get(&selected_id) {
            ui.label(format!(
                "Manual position: ({:.0}, {:.0})",
                position.x, position.y
            ));
        }

        ui.separator();
        let neighbors = self.adjacency.neighbors(&selected_id);
        ui.label(RichText::new(format!("Neighbors ({})", neighbors.len())).strong());

        let mut pending = None;
        if neighbors.is_empty() {
            ui.label("No edges touch this node.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("neighbor_scroll")
                .max_height(320.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for neighbor in neighbors {
                        let visible = self
                            .topology
                            .as_ref()
                            .is_some_and(|topology| topology.contains(neighbor));
                        let relation = self
                            .graph
                            .edges
                            .values()
                            .filter(|edge| {
                                (edge.source == selected_id && &edge.target == neighbor)
                                    || (&edge.source == neighbor && edge.target == selected_id)
                            })
                            .filter_map(|edge| edge.relation.as_deref())
                            .min();

                        let mut text = self.graph.label_of(neighbor).to_owned();
                        if let Some(relation) = relation {
                            text.push_str(&format!("  [{relation}]"));
                        }
                        if !visible {
                            text.push_str("  (hidden)");
                        }

                        if ui.link(text).on_hover_text(neighbor.as_str()).clicked() {
                            pending = Some((neighbor.clone(), visible));
                        }
                    }
                });
        }

        if let Some((id, visible)) = pending {
            if visible {
                self.select_and_focus(&id);
            } else {
                self.set_selected(Some(id));
            }
        }
    }
}
