use std::sync::Arc;

use anti_recall_llm::ProviderRegistry;

use super::commentary;
use super::context;
use super::moderation::ModerationGate;
use crate::config::RecallCfg;
use crate::error::RecallError;
use crate::io::output::{CommentaryBlock, OutputSender, OutputUnit, RecoveredBlock, RecoveredBody};
use crate::memory::MessageStore;
use crate::types::{ChatScope, MessageKind, RecalledMessage};

/// What happened to a matched recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Blocked,
    Delivered { with_commentary: bool },
}

/// Moderation, context, commentary and delivery for one recovered message.
pub struct CommentPipeline {
    cfg: Arc<RecallCfg>,
    store: Arc<MessageStore>,
    registry: Arc<ProviderRegistry>,
    gate: ModerationGate,
    output: OutputSender,
}

impl CommentPipeline {
    pub fn new(
        cfg: Arc<RecallCfg>,
        store: Arc<MessageStore>,
        registry: Arc<ProviderRegistry>,
        output: OutputSender,
    ) -> Self {
        let gate = ModerationGate::new(registry.clone(), cfg.moderation_prompt.clone());
        Self { cfg, store, registry, gate, output }
    }

    /// Fixed provider when configured, else the destination's current one.
    fn resolve_provider(&self, destination: &ChatScope) -> Option<String> {
        match self.cfg.fixed_provider() {
            Some(fixed) => Some(fixed.to_owned()),
            None => self.registry.resolve_current(&destination.session_key()),
        }
    }

    pub async fn process(&self, recalled: RecalledMessage) -> Result<PipelineOutcome, RecallError> {
        let RecalledMessage { record, destination, operator_id } = recalled;
        let provider = self.resolve_provider(&destination);

        if self.cfg.enable_moderation
            && self.gate.is_blocked(&record.content, provider.as_deref()).await
        {
            tracing::info!(message_id = %record.id, scope = %destination, "recalled content blocked");
            return Ok(PipelineOutcome::Blocked);
        }

        let body = match (&record.kind, &record.image) {
            (MessageKind::Image, Some(reference)) => RecoveredBody::Image(reference.clone()),
            _ => RecoveredBody::Text(record.content.clone()),
        };
        let recovered = RecoveredBlock {
            sender_id: record.sender_id.clone(),
            sender_name: self.cfg.show_sender_info.then(|| record.sender_name.clone()),
            kind: record.kind,
            body,
        };

        let commentary = if self.cfg.enable_commentary && !record.content.trim().is_empty() {
            self.commentary(&record.content, record.timestamp, &destination, provider.as_deref())
                .await
        } else {
            None
        };
        let with_commentary = commentary.is_some();

        let unit = OutputUnit {
            destination: destination.clone(),
            recovered,
            commentary: commentary.map(|text| CommentaryBlock { author_id: self.cfg.self_id.clone(), text }),
        };
        self.output.send(unit).await.map_err(|_| RecallError::OutputClosed)?;
        tracing::info!(
            message_id = %record.id,
            scope = %destination,
            operator_id = %operator_id,
            with_commentary,
            "recall announcement sent"
        );
        Ok(PipelineOutcome::Delivered { with_commentary })
    }

    async fn commentary(
        &self,
        content: &str,
        cutoff: i64,
        destination: &ChatScope,
        provider: Option<&str>,
    ) -> Option<String> {
        let Some(provider) = provider else {
            tracing::warn!(scope = %destination, "no provider for commentary");
            return None;
        };

        let window = match destination.group_id() {
            Some(group) if self.cfg.enable_context_analysis => {
                context::extract(&self.store, group, cutoff, self.cfg.context_limit())
            }
            _ => Vec::new(),
        };
        let prompt = commentary::build_prompt(self.cfg.commentary_style, &window, content);

        match self.registry.generate_text(provider, &prompt).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply.trim().to_owned()),
            Ok(_) => {
                tracing::warn!(provider, "commentary reply was empty");
                None
            }
            Err(e) => {
                tracing::warn!(provider, error = %e, "commentary generation failed");
                None
            }
        }
    }
}
