//! JSON graph documents: the stand-in for the upstream data layer.

mod export;
mod parse;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::graph::GraphSnapshot;

pub use export::{ExportDocument, ExportEdge, ExportNode};

#[derive(Clone, Debug)]
pub struct LoadedGraph {
    pub root_id: String,
    pub graph: GraphSnapshot,
}

pub fn parse_graph(raw: &str) -> Result<LoadedGraph> {
    parse::parse_document(raw)
}

pub fn load_graph(path: &Path) -> Result<LoadedGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph document {}", path.display()))?;
    let loaded = parse::parse_document(&raw)
        .with_context(|| format!("failed to parse graph document {}", path.display()))?;

    info!(
        path = %path.display(),
        root = %loaded.root_id,
        nodes = loaded.graph.node_count(),
        edges = loaded.graph.edge_count(),
        "loaded graph document"
    );
    Ok(loaded)
}
