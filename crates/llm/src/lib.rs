pub mod http;
pub mod provider;
pub mod registry;

pub use provider::{LlmError, LlmProvider, MockProvider};
pub use registry::ProviderRegistry;
