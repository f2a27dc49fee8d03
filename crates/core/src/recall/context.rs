use crate::config::MAX_CONTEXT_COUNT;
use crate::memory::MessageStore;
use crate::types::ContextEntry;

/// The most recent textual messages in `group_id` strictly before `cutoff`,
/// oldest first. `limit` is clamped to [`MAX_CONTEXT_COUNT`].
pub fn extract(store: &MessageStore, group_id: &str, cutoff: i64, limit: usize) -> Vec<ContextEntry> {
    let limit = limit.min(MAX_CONTEXT_COUNT);
    if limit == 0 {
        return Vec::new();
    }

    let mut window: Vec<ContextEntry> = store
        .snapshot_by_group(group_id)
        .into_iter()
        .filter(|m| m.kind.is_textual() && m.timestamp < cutoff)
        .map(|m| ContextEntry {
            sender_name: m.sender_name,
            content: m.content,
            timestamp: m.timestamp,
        })
        .collect();
    // Stable: equal timestamps keep insertion order.
    window.sort_by_key(|e| e.timestamp);

    let skip = window.len().saturating_sub(limit);
    let window: Vec<ContextEntry> = window.into_iter().skip(skip).collect();
    tracing::debug!(group_id, cutoff, found = window.len(), "context window extracted");
    window
}
