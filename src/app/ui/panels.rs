use std::path::Path;

use eframe::egui::{self, Align, Context, Layout};

use orbitview::{
    Adjacency, GraphSnapshot, LayoutConfig, LayoutWorker, ManualOverrides, SiblingPages,
};

use super::super::ViewModel;
use super::super::labels::LabelCache;
use super::super::render_utils::pan_to_center;

const LABEL_CACHE_CAPACITY: usize = 4096;
const INITIAL_ZOOM: f32 = 0.6;

impl ViewModel {
    pub(in crate::app) fn new(graph: GraphSnapshot, root_id: String, config: LayoutConfig) -> Self {
        let adjacency = Adjacency::from_graph(&graph);
        let canvas_center = egui::pos2(config.canvas.width * 0.5, config.canvas.height * 0.5);

        let mut model = Self {
            graph,
            adjacency,
            root_id,
            config,
            pages: SiblingPages::new(),
            topology: None,
            topology_generation: 0,
            worker: LayoutWorker::spawn(),
            pending_layout: None,
            layout_error: None,
            rendered: Default::default(),
            overrides: ManualOverrides::new(),
            transition: None,
            pan: pan_to_center(canvas_center, INITIAL_ZOOM),
            zoom: INITIAL_ZOOM,
            camera: None,
            drag: None,
            selected: None,
            search: String::new(),
            search_cache: None,
            labels: LabelCache::new(LABEL_CACHE_CAPACITY),
            edge_cache: Vec::new(),
        };
        model.rebuild_topology();
        model
    }

    fn layout_status(&self) -> String {
        if let Some(error) = &self.layout_error {
            return format!("layout error: {error}");
        }
        let visible = self.topology.as_ref().map_or(0, |topology| topology.node_count());
        let edges = self.topology.as_ref().map_or(0, |topology| topology.edges.len());
        let phase = if self.worker.is_pending() || self.pending_layout.is_some() {
            "relaxing"
        } else if self.transition.is_some() {
            "settling"
        } else {
            "settled"
        };
        format!("visible {visible} nodes / {edges} edges  |  {phase}")
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let dt = ctx.input(|input| input.stable_dt).clamp(0.0, 0.1);
        self.poll_layout();
        let moving = self.advance_motion(dt);
        if moving || self.worker.is_pending() || self.pending_layout.is_some() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("orbitview");
                    ui.separator();
                    ui.label(format!("root: {}", self.graph.label_of(&self.root_id)));
                    ui.label(format!("source: {}", source.display()));
                    ui.label(format!("nodes: {}", self.graph.node_count()));
                    ui.label(format!("edges: {}", self.graph.edge_count()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload document"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Rebuild layout").clicked() {
                        self.rebuild_topology();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.layout_status());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }

    pub(in crate::app) fn select_and_focus(&mut self, id: &str) {
        self.set_selected(Some(id.to_owned()));
        self.focus_node(id);
    }
}
