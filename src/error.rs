use thiserror::Error;

/// Inputs the layout core refuses at its boundary. Ordinary graph states
/// (missing root, dangling edges, coincident nodes) are never errors.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("manual position for node `{id}` is not finite: ({x}, {y})")]
    NonFiniteOverride { id: String, x: f32, y: f32 },

    #[error("invalid layout configuration: {0}")]
    InvalidConfig(String),

    #[error("layout worker thread is gone")]
    WorkerDisconnected,
}
