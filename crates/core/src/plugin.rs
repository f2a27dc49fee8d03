//! Event facade tying the store, correlator and pipeline together.

use std::sync::Arc;

use anti_recall_llm::ProviderRegistry;

use crate::admin::{CacheEntryView, StatusReport};
use crate::config::RecallCfg;
use crate::error::RecallError;
use crate::io::output::OutputSender;
use crate::memory::{CacheStats, MessageStore};
use crate::recall::{CommentPipeline, Correlation, Correlator, IgnoreReason, PipelineOutcome, SuppressReason};
use crate::types::{CachedMessage, ChatScope, InboundMessage, RecallNotice};

/// Outcome of one recall notification, end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallOutcome {
    Ignored(IgnoreReason),
    Miss,
    Suppressed(SuppressReason),
    Blocked,
    Delivered { with_commentary: bool },
}

pub struct AntiRecall {
    cfg: Arc<RecallCfg>,
    store: Arc<MessageStore>,
    stats: Arc<CacheStats>,
    correlator: Correlator,
    pipeline: CommentPipeline,
}

impl AntiRecall {
    pub fn new(cfg: RecallCfg, registry: Arc<ProviderRegistry>, output: OutputSender) -> Self {
        let cfg = Arc::new(cfg);
        let store = Arc::new(MessageStore::new(cfg.max_cache_size));
        let stats = Arc::new(CacheStats::new());
        let correlator = Correlator::new(store.clone(), stats.clone());
        let pipeline = CommentPipeline::new(cfg.clone(), store.clone(), registry, output);
        tracing::info!(
            enabled = cfg.enabled,
            commentary = cfg.enable_commentary,
            moderation = cfg.enable_moderation,
            max_cache_size = cfg.max_cache_size,
            provider = cfg.fixed_provider().unwrap_or("current"),
            image_recall = cfg.enable_image_recall,
            context_analysis = cfg.enable_context_analysis,
            context_count = cfg.context_limit(),
            "anti-recall initialised"
        );
        Self { cfg, store, stats, correlator, pipeline }
    }

    pub fn config(&self) -> &RecallCfg {
        &self.cfg
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    /// Cache an inbound message. Returns whether a record was stored.
    pub fn on_message(&self, msg: &InboundMessage) -> bool {
        if !self.cfg.enabled {
            return false;
        }
        if !self.cfg.self_id.is_empty() && msg.sender_id == self.cfg.self_id {
            return false;
        }
        let scope = msg.scope();
        let scope_enabled = match scope {
            ChatScope::Group(_) => self.cfg.enable_group_chat,
            ChatScope::Private(_) => self.cfg.enable_private_chat,
        };
        if !scope_enabled {
            tracing::debug!(message_id = %msg.message_id, %scope, "scope disabled, not cached");
            return false;
        }

        let record = CachedMessage::from_inbound(msg, chrono::Utc::now().timestamp());
        if record.content.trim().is_empty() {
            tracing::debug!(message_id = %msg.message_id, "message has no content, not cached");
            return false;
        }
        self.store.put(record);
        true
    }

    /// Correlate a recall notification and, on a match, run the pipeline.
    pub async fn on_recall_notice(&self, notice: &RecallNotice) -> Result<RecallOutcome, RecallError> {
        let recalled = match self.correlator.correlate(&self.cfg, notice) {
            Correlation::Ignored(reason) => return Ok(RecallOutcome::Ignored(reason)),
            Correlation::Miss => return Ok(RecallOutcome::Miss),
            Correlation::Suppressed(reason) => return Ok(RecallOutcome::Suppressed(reason)),
            Correlation::Matched(recalled) => recalled,
        };
        // The record is already out of the store; a pipeline error never puts it back.
        Ok(match self.pipeline.process(recalled).await? {
            PipelineOutcome::Blocked => RecallOutcome::Blocked,
            PipelineOutcome::Delivered { with_commentary } => RecallOutcome::Delivered { with_commentary },
        })
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::new(
            &self.cfg,
            self.store.len(),
            self.stats.snapshot(),
            self.store.group_population(),
        )
    }

    /// Newest-first view of up to `limit` cached records.
    pub fn cache_details(&self, limit: usize) -> Vec<CacheEntryView> {
        self.store.newest(limit).iter().map(CacheEntryView::from_record).collect()
    }

    pub fn clear_cache(&self) -> usize {
        let dropped = self.store.clear();
        tracing::info!(dropped, "cache cleared");
        dropped
    }

    pub fn shutdown(&self) {
        let dropped = self.store.clear();
        tracing::info!(
            dropped,
            hit_rate = %self.stats.snapshot().hit_rate_label(),
            "anti-recall shut down, cache cleared"
        );
    }
}
