use std::sync::Arc;

use crate::config::RecallCfg;
use crate::memory::{CacheStats, MessageStore};
use crate::types::{ChatScope, MessageKind, RecallKind, RecallNotice, RecalledMessage};

/// Why a notification was dropped before touching the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Disabled,
    ScopeDisabled,
    Malformed,
}

/// Why a matched record produces no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    SelfRecall,
    ImageRecallDisabled,
}

/// Terminal outcome of correlating one recall notification.
#[derive(Debug)]
pub enum Correlation {
    Ignored(IgnoreReason),
    Miss,
    Suppressed(SuppressReason),
    Matched(RecalledMessage),
}

/// Matches recall notifications against the message store.
pub struct Correlator {
    store: Arc<MessageStore>,
    stats: Arc<CacheStats>,
}

impl Correlator {
    pub fn new(store: Arc<MessageStore>, stats: Arc<CacheStats>) -> Self {
        Self { store, stats }
    }

    pub fn correlate(&self, cfg: &RecallCfg, notice: &RecallNotice) -> Correlation {
        if !cfg.enabled {
            return Correlation::Ignored(IgnoreReason::Disabled);
        }
        let scope_enabled = match notice.kind {
            RecallKind::Group => cfg.enable_group_chat,
            RecallKind::Friend => cfg.enable_private_chat,
        };
        if !scope_enabled {
            tracing::debug!(kind = ?notice.kind, "recall scope disabled, ignoring");
            return Correlation::Ignored(IgnoreReason::ScopeDisabled);
        }

        let Some(message_id) = notice.message_id.as_deref().filter(|id| !id.is_empty()) else {
            tracing::warn!(kind = ?notice.kind, user_id = %notice.user_id, "recall notice without message id");
            return Correlation::Ignored(IgnoreReason::Malformed);
        };
        let destination = match (notice.kind, &notice.group_id) {
            (RecallKind::Group, Some(group)) => ChatScope::Group(group.clone()),
            (RecallKind::Friend, _) if !notice.user_id.is_empty() => {
                ChatScope::Private(notice.user_id.clone())
            }
            _ => {
                tracing::warn!(message_id, kind = ?notice.kind, "recall notice without scope");
                return Correlation::Ignored(IgnoreReason::Malformed);
            }
        };

        let Some(record) = self.store.take_by_id(message_id) else {
            self.stats.record_miss();
            tracing::warn!(message_id, scope = %destination, "recalled message not in cache");
            return Correlation::Miss;
        };
        self.stats.record_hit();

        if !cfg.self_id.is_empty() && notice.user_id == cfg.self_id {
            tracing::debug!(message_id, "bot recalled its own message, suppressed");
            return Correlation::Suppressed(SuppressReason::SelfRecall);
        }
        if record.kind == MessageKind::Image && !cfg.enable_image_recall {
            tracing::info!(message_id, "image recall handling disabled, suppressed");
            return Correlation::Suppressed(SuppressReason::ImageRecallDisabled);
        }

        tracing::info!(
            message_id,
            scope = %destination,
            sender_id = %record.sender_id,
            kind = ?record.kind,
            "recalled message recovered"
        );
        Correlation::Matched(RecalledMessage {
            operator_id: notice.operator().to_owned(),
            record,
            destination,
        })
    }
}
