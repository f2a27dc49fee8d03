//! Named provider registry.
//!
//! Providers are registered under an id. Each conversation (identified by a
//! session key) may be bound to a specific provider; sessions without a binding
//! resolve to the registry default.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::provider::{CompletionRequest, LlmError, LlmProvider};

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default_id: Option<String>,
    bindings: RwLock<HashMap<String, String>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `id`. The first registered provider becomes the default.
    pub fn register(&mut self, id: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        let id = id.into();
        if self.default_id.is_none() {
            self.default_id = Some(id.clone());
        }
        self.providers.insert(id, provider);
    }

    pub fn set_default(&mut self, id: impl Into<String>) {
        self.default_id = Some(id.into());
    }

    /// Bind a session to a provider, overriding the default for that session.
    pub fn bind_session(&self, session: impl Into<String>, provider_id: impl Into<String>) {
        self.bindings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.into(), provider_id.into());
    }

    /// The provider currently in effect for `session`, if any.
    pub fn resolve_current(&self, session: &str) -> Option<String> {
        let bound = self
            .bindings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(session)
            .cloned();
        bound.or_else(|| self.default_id.clone())
    }

    /// Run a single-prompt completion against `provider_id` and return its text.
    pub async fn generate_text(&self, provider_id: &str, prompt: &str) -> Result<String, LlmError> {
        let provider = self
            .providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| LlmError::UnknownProvider(provider_id.to_owned()))?;

        let response = provider.complete(CompletionRequest::from_prompt(prompt)).await?;
        tracing::debug!(
            provider = provider_id,
            backend = provider.name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "generation completed"
        );
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;

    #[test]
    fn first_registered_becomes_default() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.resolve_current("group:1").is_none());
        registry.register("a", Arc::new(MockProvider::new("a")));
        registry.register("b", Arc::new(MockProvider::new("b")));
        assert_eq!(registry.resolve_current("group:1").as_deref(), Some("a"));
        registry.set_default("b");
        assert_eq!(registry.resolve_current("group:1").as_deref(), Some("b"));
    }

    #[test]
    fn session_binding_overrides_default() {
        let mut registry = ProviderRegistry::new();
        registry.register("a", Arc::new(MockProvider::new("a")));
        registry.register("b", Arc::new(MockProvider::new("b")));
        registry.bind_session("private:42", "b");
        assert_eq!(registry.resolve_current("private:42").as_deref(), Some("b"));
        assert_eq!(registry.resolve_current("group:7").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn generate_text_routes_to_named_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register("a", Arc::new(MockProvider::new("from a")));
        registry.register("b", Arc::new(MockProvider::new("from b")));
        assert_eq!(registry.generate_text("b", "hi").await.unwrap(), "from b");
    }

    #[tokio::test]
    async fn unknown_provider_is_an_error() {
        let registry = ProviderRegistry::new();
        let err = registry.generate_text("ghost", "hi").await.unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(id) if id == "ghost"));
    }
}
