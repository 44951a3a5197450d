use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use orbitview::layout::topology::clamp_pages;

use super::super::{SearchCache, SearchMatch, ViewModel};

const MAX_DEPTH_LIMIT: usize = 8;
const MAX_PAGE_SIZE: usize = 100;
const SEARCH_RESULT_LIMIT: usize = 40;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

enum SelectionAction {
    ToggleExpanded(String),
    PreviousPage(String),
    NextPage(String),
    MakeRoot(String),
    Focus(String),
}

impl ViewModel {
    /// Fuzzy matches among visible nodes, cached per query and topology.
    fn search_matches(&mut self) -> Vec<SearchMatch> {
        let query = self.search.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(cache) = &self.search_cache
            && cache.generation == self.topology_generation
            && cache.query == query
        {
            return cache.matches.clone();
        }

        let Some(topology) = &self.topology else {
            return Vec::new();
        };
        let matcher = SkimMatcherV2::default();
        let mut matches = topology
            .visible
            .iter()
            .filter_map(|id| {
                let node = self.graph.nodes.get(id)?;
                let score = fuzzy_match_score(&matcher, &node.label, query)
                    .or_else(|| fuzzy_match_score(&matcher, id, query))?;
                Some(SearchMatch {
                    id: id.clone(),
                    label: node.label.clone(),
                    score,
                })
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
        matches.truncate(SEARCH_RESULT_LIMIT);

        self.search_cache = Some(SearchCache {
            query: query.to_owned(),
            generation: self.topology_generation,
            matches: matches.clone(),
        });
        matches
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut topology_changed = false;

        let mut depth = self.config.topology.max_depth;
        ui.add(egui::Slider::new(&mut depth, 0..=MAX_DEPTH_LIMIT).text("depth limit"))
            .on_hover_text("Hop distance from the root beyond which nodes are hidden.");
        if depth != self.config.topology.max_depth {
            self.config.topology.max_depth = depth;
            topology_changed = true;
        }

        let mut page_size = self.config.topology.page_size;
        ui.add(egui::Slider::new(&mut page_size, 1..=MAX_PAGE_SIZE).text("page size"))
            .on_hover_text("Children shown per parent before paging kicks in.");
        if page_size != self.config.topology.page_size {
            self.config.topology.page_size = page_size;
            if let Some(topology) = &self.topology {
                clamp_pages(&mut self.pages, &topology.sibling_totals, page_size);
            }
            topology_changed = true;
        }

        if topology_changed {
            self.rebuild_topology();
        }

        ui.separator();
        ui.label(RichText::new("Selection").strong());

        let mut action = None;
        if let Some(id) = self.selected.clone() {
            ui.label(self.graph.label_of(&id).to_owned());
            let expanded = self.graph.nodes.get(&id).map(|node| node.expanded);

            ui.horizontal_wrapped(|ui| {
                if let Some(expanded) = expanded {
                    let text = if expanded { "Collapse" } else { "Expand" };
                    if ui.button(text).clicked() {
                        action = Some(SelectionAction::ToggleExpanded(id.clone()));
                    }
                }
                if ui.button("Focus").clicked() {
                    action = Some(SelectionAction::Focus(id.clone()));
                }
                let is_root = self.root_id == id;
                if ui.add_enabled(!is_root, egui::Button::new("Use as root")).clicked() {
                    action = Some(SelectionAction::MakeRoot(id.clone()));
                }
            });

            if let Some((page, count)) = self.page_info(&id)
                && count > 1
            {
                ui.horizontal(|ui| {
                    if ui.add_enabled(page > 0, egui::Button::new("◀")).clicked() {
                        action = Some(SelectionAction::PreviousPage(id.clone()));
                    }
                    ui.label(format!("page {} of {}", page + 1, count));
                    if ui
                        .add_enabled(page + 1 < count, egui::Button::new("▶"))
                        .clicked()
                    {
                        action = Some(SelectionAction::NextPage(id.clone()));
                    }
                });
            }
        } else {
            ui.label("Select a node to expand, collapse or page its neighbors.");
        }

        match action {
            Some(SelectionAction::ToggleExpanded(id)) => self.toggle_expanded(&id),
            Some(SelectionAction::PreviousPage(id)) => self.step_page(&id, false),
            Some(SelectionAction::NextPage(id)) => self.step_page(&id, true),
            Some(SelectionAction::MakeRoot(id)) => self.set_root(&id),
            Some(SelectionAction::Focus(id)) => self.focus_node(&id),
            None => {}
        }

        ui.separator();
        ui.label(RichText::new("Positions").strong());
        ui.horizontal_wrapped(|ui| {
            let has_overrides = !self.overrides.is_empty();
            if ui
                .add_enabled(has_overrides, egui::Button::new("Reset dragged nodes"))
                .on_hover_text("Drop manual positions and return to the computed layout.")
                .clicked()
            {
                self.reset_overrides();
            }
            if ui
                .button("Reseed")
                .on_hover_text("Relax again with the next random seed.")
                .clicked()
            {
                self.reseed();
            }
            if ui.button("Center root").clicked() {
                let root = self.root_id.clone();
                self.focus_node(&root);
            }
        });
        ui.small(format!(
            "seed {}  |  {} manual positions",
            self.config.seed,
            self.overrides.len()
        ));

        ui.separator();
        ui.label("Search (label or id)")
            .on_hover_text("Fuzzy-highlight matching visible nodes.");
        ui.text_edit_singleline(&mut self.search);

        let matches = self.search_matches();
        if !self.search.trim().is_empty() {
            if matches.is_empty() {
                ui.label("No visible node matches.");
            }
            let mut focus = None;
            egui::ScrollArea::vertical()
                .id_salt("search_results")
                .max_height(280.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for hit in &matches {
                        if ui.link(hit.label.as_str()).on_hover_text(hit.id.as_str()).clicked() {
                            focus = Some(hit.id.clone());
                        }
                    }
                });
            if let Some(id) = focus {
                self.select_and_focus(&id);
            }
        }
    }
}
