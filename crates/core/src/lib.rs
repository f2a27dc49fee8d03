pub mod admin;
pub mod config;
pub mod error;
pub mod io;
pub mod memory;
pub mod plugin;
pub mod recall;
pub mod runtime;
pub mod types;

pub use config::RecallCfg;
pub use error::RecallError;
pub use plugin::{AntiRecall, RecallOutcome};
