use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};

use orbitview::drag::DragSession;
use orbitview::source::{LoadedGraph, load_graph};
use orbitview::{
    Adjacency, EdgeGeometry, GraphSnapshot, LayoutConfig, LayoutPositions, LayoutResponse,
    LayoutWorker, ManualOverrides, SiblingPages, Topology,
};

mod graph;
mod labels;
mod motion;
mod render_utils;
mod ui;

use labels::LabelCache;
use motion::{CameraAnimation, LayoutTransition};

pub struct OrbitViewApp {
    source: PathBuf,
    config: LayoutConfig,
    root_override: Option<String>,
    state: AppState,
    reload_rx: Option<Receiver<Result<LoadedGraph, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedGraph, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    graph: GraphSnapshot,
    adjacency: Adjacency,
    root_id: String,
    config: LayoutConfig,
    pages: SiblingPages,
    topology: Option<Topology>,
    topology_generation: u64,
    worker: LayoutWorker,
    pending_layout: Option<LayoutResponse>,
    layout_error: Option<String>,
    /// Positions drawn this frame, before manual overrides.
    rendered: LayoutPositions,
    overrides: ManualOverrides,
    transition: Option<LayoutTransition>,
    pan: Vec2,
    zoom: f32,
    camera: Option<CameraAnimation>,
    drag: Option<ActiveDrag>,
    selected: Option<String>,
    search: String,
    search_cache: Option<SearchCache>,
    labels: LabelCache,
    edge_cache: Vec<EdgeGeometry>,
}

struct ActiveDrag {
    session: DragSession,
    pointer_origin: Pos2,
}

struct SearchCache {
    query: String,
    generation: u64,
    matches: Vec<SearchMatch>,
}

#[derive(Clone)]
struct SearchMatch {
    id: String,
    label: String,
    score: i64,
}

impl OrbitViewApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: PathBuf,
        config: LayoutConfig,
        root_override: Option<String>,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            config,
            root_override,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: PathBuf) -> Receiver<Result<LoadedGraph, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_graph(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, loaded: LoadedGraph) -> AppState {
        let root_id = self.root_override.clone().unwrap_or(loaded.root_id);
        AppState::Ready(Box::new(ViewModel::new(
            loaded.graph,
            root_id,
            self.config.clone(),
        )))
    }
}

impl eframe::App for OrbitViewApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph document...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph document");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.source.clone());
            return;
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(loaded) => self.ready(loaded),
                Err(error) => {
                    tracing::error!(%error, "graph load failed");
                    AppState::Error(error)
                }
            };
        }
    }
}
