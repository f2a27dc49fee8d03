/// Errors surfaced by event handling. None of them are fatal to the process;
/// the runtime logs them at the per-event boundary.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    #[error("malformed event: {0}")]
    Malformed(String),
    #[error("failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("output channel closed")]
    OutputClosed,
}
