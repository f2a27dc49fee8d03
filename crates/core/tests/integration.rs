//! End-to-end tests for the recall pipeline.
//!
//! These run the public plugin facade against a scripted provider and read
//! announcements from the output channel:
//! message → store → recall notice → correlation → moderation → commentary → output.

use std::sync::Arc;

use anti_recall_core::io::output::{self, OutputReceiver, RecoveredBody};
use anti_recall_core::memory::MessageStore;
use anti_recall_core::recall::{IgnoreReason, SuppressReason, context};
use anti_recall_core::types::{CachedMessage, InboundMessage, MessageKind, RecallNotice, Segment};
use anti_recall_core::{AntiRecall, RecallCfg, RecallOutcome};
use anti_recall_llm::{MockProvider, ProviderRegistry};

const BOT: &str = "bot";

fn plugin_with(cfg: RecallCfg, mock: MockProvider) -> (AntiRecall, OutputReceiver) {
    let mut registry = ProviderRegistry::new();
    registry.register("mock", Arc::new(mock));
    let (tx, rx) = output::channel(16);
    (AntiRecall::new(cfg, Arc::new(registry), tx), rx)
}

fn base_cfg() -> RecallCfg {
    RecallCfg { self_id: BOT.into(), ..RecallCfg::default() }
}

fn group_text(id: &str, group: &str, ts: i64, text: &str) -> InboundMessage {
    InboundMessage {
        message_id: id.into(),
        sender_id: "100".into(),
        sender_name: format!("user{id}"),
        group_id: Some(group.into()),
        timestamp: Some(ts),
        segments: vec![Segment::text(text)],
    }
}

#[tokio::test]
async fn recalled_text_is_recovered_and_removed() {
    let cfg = RecallCfg { enable_commentary: false, ..base_cfg() };
    let mock = MockProvider::new("否");
    let (plugin, mut rx) = plugin_with(cfg, mock);

    assert!(plugin.on_message(&group_text("1", "G", 100, "hello")));
    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", "200", "1")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Delivered { with_commentary: false });

    let unit = rx.recv().await.unwrap();
    assert!(unit.render_text().contains("hello"));
    assert!(!plugin.store().contains("1"));
    assert_eq!(plugin.stats().snapshot().hits, 1);

    // Replaying the same recall is a guaranteed miss.
    let replay = plugin.on_recall_notice(&RecallNotice::group("G", "200", "1")).await.unwrap();
    assert_eq!(replay, RecallOutcome::Miss);
}

#[tokio::test]
async fn recall_on_empty_store_is_a_miss() {
    let (plugin, mut rx) = plugin_with(base_cfg(), MockProvider::new("否"));
    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", "200", "999")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Miss);
    assert_eq!(plugin.stats().snapshot().misses, 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn commentary_sees_the_preceding_window() {
    let cfg = RecallCfg { enable_moderation: false, context_count: 2, ..base_cfg() };
    let mock = MockProvider::new("nice one");
    let (plugin, mut rx) = plugin_with(cfg, mock.clone());

    for ts in 1..=3 {
        plugin.on_message(&group_text(&ts.to_string(), "G", ts, &format!("text {ts}")));
    }
    let mut poke = group_text("4", "G", 4, "");
    poke.segments = vec![Segment::bare("poke")];
    assert!(plugin.on_message(&poke));

    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", "100", "4")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Delivered { with_commentary: true });
    let unit = rx.recv().await.unwrap();
    assert_eq!(unit.recovered.kind, MessageKind::Poke);
    assert_eq!(unit.commentary.map(|c| c.text).as_deref(), Some("nice one"));

    let prompt = &mock.prompts()[0];
    let second = prompt.find("1. user2: text 2").expect("ts=2 in window");
    let third = prompt.find("2. user3: text 3").expect("ts=3 in window");
    assert!(second < third);
    assert!(!prompt.contains("text 1"));
}

#[tokio::test]
async fn context_extraction_matches_store_contents() {
    let store = MessageStore::new(100);
    for ts in 1..=3 {
        store.put(CachedMessage::from_inbound(&group_text(&ts.to_string(), "G", ts, "t"), 0));
    }
    let window = context::extract(&store, "G", 4, 2);
    let timestamps: Vec<i64> = window.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![2, 3]);
}

#[tokio::test]
async fn self_recall_is_counted_but_silent() {
    let (plugin, mut rx) = plugin_with(base_cfg(), MockProvider::new("否"));
    plugin.on_message(&group_text("1", "G", 100, "mine"));
    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", BOT, "1")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Suppressed(SuppressReason::SelfRecall));
    assert!(!plugin.store().contains("1"));
    assert_eq!(plugin.stats().snapshot().hits, 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn links_are_blocked_without_calling_the_provider() {
    let mock = MockProvider::new("否");
    let (plugin, mut rx) = plugin_with(base_cfg(), mock.clone());
    plugin.on_message(&group_text("1", "G", 100, "buy now https://spam.example/deal"));
    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", "100", "1")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Blocked);
    assert_eq!(mock.call_count(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn provider_failure_degrades_to_content_only() {
    let (plugin, mut rx) = plugin_with(base_cfg(), MockProvider::failing("timeout"));
    plugin.on_message(&group_text("1", "G", 100, "still here"));
    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", "100", "1")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Delivered { with_commentary: false });
    let unit = rx.recv().await.unwrap();
    assert_eq!(unit.recovered.body, RecoveredBody::Text("still here".into()));
    assert!(unit.commentary.is_none());
}

#[tokio::test]
async fn image_recall_disabled_suppresses_after_take() {
    let cfg = RecallCfg { enable_image_recall: false, ..base_cfg() };
    let (plugin, mut rx) = plugin_with(cfg, MockProvider::new("否"));
    let mut image = group_text("1", "G", 100, "");
    image.segments = vec![Segment::image_url("https://img.example/a.png")];
    assert!(plugin.on_message(&image));

    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", "100", "1")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Suppressed(SuppressReason::ImageRecallDisabled));
    assert!(plugin.store().is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn private_recall_goes_back_to_the_peer() {
    let cfg = RecallCfg {
        enable_private_chat: true,
        enable_commentary: false,
        enable_moderation: false,
        ..base_cfg()
    };
    let (plugin, mut rx) = plugin_with(cfg, MockProvider::new("unused"));
    let mut dm = group_text("5", "G", 100, "secret");
    dm.group_id = None;
    assert!(plugin.on_message(&dm));

    plugin.on_recall_notice(&RecallNotice::friend("100", "5")).await.unwrap();
    let unit = rx.recv().await.unwrap();
    assert_eq!(unit.destination.session_key(), "private:100");
}

#[tokio::test]
async fn disabled_group_scope_ignores_recalls() {
    let cfg = RecallCfg { enable_group_chat: false, ..base_cfg() };
    let (plugin, _rx) = plugin_with(cfg, MockProvider::new("否"));
    let outcome = plugin.on_recall_notice(&RecallNotice::group("G", "100", "1")).await.unwrap();
    assert_eq!(outcome, RecallOutcome::Ignored(IgnoreReason::ScopeDisabled));
    assert_eq!(plugin.stats().snapshot().total(), 0);
}

#[test]
fn store_keeps_the_most_recent_by_timestamp() {
    let store = MessageStore::new(5);
    let timestamps = [40, 5, 33, 12, 90, 1, 77, 56, 20, 64];
    for (i, ts) in timestamps.iter().enumerate() {
        store.put(CachedMessage::from_inbound(&group_text(&i.to_string(), "G", *ts, "x"), 0));
    }
    assert_eq!(store.len(), 5);

    let mut expected: Vec<i64> = timestamps.to_vec();
    expected.sort_unstable_by(|a, b| b.cmp(a));
    expected.truncate(5);
    let mut survivors: Vec<i64> = store.newest(10).into_iter().map(|m| m.timestamp).collect();
    survivors.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(survivors, expected);
}

#[test]
fn status_report_reflects_activity() {
    let (plugin, _rx) = plugin_with(base_cfg(), MockProvider::new("否"));
    plugin.on_message(&group_text("1", "G", 1, "a"));
    plugin.on_message(&group_text("2", "H", 2, "b"));
    let report = plugin.status();
    assert_eq!(report.cached, 2);
    assert_eq!(report.hit_rate(), "0%");
    assert!(report.to_string().contains("群组 H: 1 条"));
}
