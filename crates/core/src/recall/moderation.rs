//! Moderation gate for recovered content.
//!
//! A local URL check runs first and blocks without any remote call. Otherwise
//! the configured provider is asked for a verdict; every remote failure is
//! treated as "not blocked".

use std::sync::{Arc, LazyLock};

use anti_recall_llm::ProviderRegistry;
use regex::Regex;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+|www\.[^\s]+").expect("static regex"));

pub fn contains_url(content: &str) -> bool {
    URL_PATTERN.is_match(content)
}

/// Whether a verdict reply means "violating".
pub fn is_affirmative(reply: &str) -> bool {
    let reply = reply.trim();
    reply.contains('是') || reply.to_ascii_lowercase().starts_with("yes")
}

pub struct ModerationGate {
    registry: Arc<ProviderRegistry>,
    prompt: String,
}

impl ModerationGate {
    pub fn new(registry: Arc<ProviderRegistry>, prompt: impl Into<String>) -> Self {
        Self { registry, prompt: prompt.into() }
    }

    /// Decide whether `content` must not be re-posted. `provider` is the
    /// already-resolved provider id; `None` skips the remote verdict.
    pub async fn is_blocked(&self, content: &str, provider: Option<&str>) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        if contains_url(content) {
            tracing::info!(chars = content.chars().count(), "content contains a link, blocked");
            return true;
        }
        let Some(provider) = provider else {
            tracing::debug!("no provider for moderation, passing content");
            return false;
        };

        let prompt = format!("{}\n\n{content}", self.prompt);
        match self.registry.generate_text(provider, &prompt).await {
            Ok(reply) => {
                let blocked = is_affirmative(&reply);
                tracing::info!(provider, blocked, verdict = %reply.trim(), "moderation verdict");
                blocked
            }
            Err(e) => {
                tracing::warn!(provider, error = %e, "moderation call failed, passing content");
                false
            }
        }
    }
}
