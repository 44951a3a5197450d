mod app;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orbitview::source::{ExportDocument, load_graph};
use orbitview::{
    Adjacency, LayoutConfig, LayoutWorker, SiblingPages, TopologyParams, build_topology,
    layout_edges,
};

const EXPORT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document to lay out.
    graph: PathBuf,

    /// JSON file with layout tuning; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Node id to place at the center instead of the document's root.
    #[arg(long)]
    root: Option<String>,

    #[arg(long)]
    depth: Option<usize>,

    #[arg(long)]
    page_size: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Lay out once without opening a window and write the result here.
    #[arg(long, value_name = "OUT")]
    export: Option<PathBuf>,

    /// Log filter, e.g. `orbitview=debug`. Falls back to RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("orbitview=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> Result<LayoutConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<LayoutConfig>(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => LayoutConfig::default(),
    };

    if let Some(depth) = args.depth {
        config.topology.max_depth = depth;
    }
    if let Some(page_size) = args.page_size {
        config.topology.page_size = page_size;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    config.validate()?;
    Ok(config)
}

fn export_layout(
    graph_path: &Path,
    root_override: Option<&str>,
    config: &LayoutConfig,
    out: &Path,
) -> Result<()> {
    let loaded = load_graph(graph_path)?;
    let root_id = root_override.unwrap_or(loaded.root_id.as_str());
    let adjacency = Adjacency::from_graph(&loaded.graph);
    let pages = SiblingPages::new();

    let topology = build_topology(
        &loaded.graph,
        &adjacency,
        TopologyParams {
            root_id,
            max_depth: config.topology.max_depth,
            page_size: config.topology.page_size,
            pages: &pages,
        },
    )
    .ok_or_else(|| anyhow!("root node `{root_id}` is not present in the document"))?;

    let mut worker = LayoutWorker::spawn();
    worker.submit(&loaded.graph, &topology, config)?;
    let response = worker
        .wait_latest(EXPORT_TIMEOUT)?
        .ok_or_else(|| anyhow!("layout did not finish within {EXPORT_TIMEOUT:?}"))?;

    let edges = layout_edges(&loaded.graph, &topology, &response.positions, config);
    let document =
        ExportDocument::build(&loaded.graph, &topology, &response.positions, &edges, config);
    let json = serde_json::to_string_pretty(&document).context("failed to encode layout")?;
    fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;

    info!(
        out = %out.display(),
        nodes = document.nodes.len(),
        edges = document.edges.len(),
        "exported layout"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());
    let config = load_config(&args)?;

    if let Some(out) = &args.export {
        return export_layout(&args.graph, args.root.as_deref(), &config, out);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let Args { graph, root, .. } = args;
    eframe::run_native(
        "orbitview",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::OrbitViewApp::new(cc, graph, config, root)))
        }),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}
