//! Radial graph layout core: depth-limited paginated topology, angle and
//! ring allocation, off-thread force relaxation, drag propagation and edge
//! routing.

pub mod config;
pub mod drag;
pub mod edges;
pub mod error;
pub mod graph;
pub mod layout;
pub mod source;

pub use config::LayoutConfig;
pub use drag::{DragSession, ManualOverrides};
pub use edges::{EdgeGeometry, layout_edges};
pub use error::LayoutError;
pub use graph::{Adjacency, EdgeDirection, EdgeRecord, GraphSnapshot, NodeCategory, NodeRecord};
pub use layout::topology::{SiblingPages, Topology, TopologyParams, build_topology};
pub use layout::worker::LayoutWorker;
pub use layout::{LayoutPositions, LayoutRequest, LayoutResponse, relax};
