pub mod commentary;
pub mod context;
pub mod correlator;
pub mod moderation;
pub mod pipeline;

pub use commentary::CommentaryStyle;
pub use correlator::{Correlation, Correlator, IgnoreReason, SuppressReason};
pub use moderation::ModerationGate;
pub use pipeline::{CommentPipeline, PipelineOutcome};
