//! Operator-facing status and cache reports.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::RecallCfg;
use crate::memory::StatsSnapshot;
use crate::recall::CommentaryStyle;
use crate::types::CachedMessage;

const RULE: &str = "━━━━━━━━━━━━━━━━━━";

/// Default number of records listed by a cache details report.
pub const DEFAULT_DETAILS_LIMIT: usize = 20;
const PREVIEW_CHARS: usize = 30;

fn switch(on: bool) -> &'static str {
    if on { "已启用" } else { "已禁用" }
}

/// Snapshot of configuration switches and cache health.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub enabled: bool,
    pub commentary: bool,
    pub moderation: bool,
    pub fixed_provider: Option<String>,
    pub context_analysis: bool,
    pub context_count: usize,
    pub image_recall: bool,
    pub group_chat: bool,
    pub private_chat: bool,
    pub show_sender_info: bool,
    pub style: CommentaryStyle,
    pub cached: usize,
    pub capacity: usize,
    pub stats: StatsSnapshot,
    pub population: BTreeMap<String, usize>,
}

impl StatusReport {
    pub fn new(cfg: &RecallCfg, cached: usize, stats: StatsSnapshot, population: BTreeMap<String, usize>) -> Self {
        Self {
            enabled: cfg.enabled,
            commentary: cfg.enable_commentary,
            moderation: cfg.enable_moderation,
            fixed_provider: cfg.fixed_provider().map(str::to_owned),
            context_analysis: cfg.enable_context_analysis,
            context_count: cfg.context_limit(),
            image_recall: cfg.enable_image_recall,
            group_chat: cfg.enable_group_chat,
            private_chat: cfg.enable_private_chat,
            show_sender_info: cfg.show_sender_info,
            style: cfg.commentary_style,
            cached,
            capacity: cfg.max_cache_size,
            stats,
            population,
        }
    }

    pub fn hit_rate(&self) -> String {
        self.stats.hit_rate_label()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "防撤回插件状态")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "启用状态: {}", switch(self.enabled))?;
        writeln!(f, "AI 锐评: {}", switch(self.commentary))?;
        writeln!(f, "违规检测: {}", switch(self.moderation))?;
        writeln!(f, "LLM 提供商: {}", self.fixed_provider.as_deref().unwrap_or("使用当前会话"))?;
        writeln!(f, "上下文分析: {} ({}条)", switch(self.context_analysis), self.context_count)?;
        writeln!(f, "图片撤回: {}", switch(self.image_recall))?;
        writeln!(f, "群聊监听: {}", switch(self.group_chat))?;
        writeln!(f, "私聊监听: {}", switch(self.private_chat))?;
        writeln!(f, "显示发送者: {}", switch(self.show_sender_info))?;
        writeln!(f, "锐评风格: {}", self.style.label())?;
        writeln!(f, "缓存消息数: {}/{}", self.cached, self.capacity)?;
        writeln!(
            f,
            "缓存命中率: {} (命中 {}, 未命中 {})",
            self.hit_rate(),
            self.stats.hits,
            self.stats.misses
        )?;
        writeln!(f, "群组分布:")?;
        for (group, count) in &self.population {
            writeln!(f, "  群组 {group}: {count} 条")?;
        }
        write!(f, "{RULE}")
    }
}

/// One line item of a cache details report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryView {
    pub id: String,
    pub sender_name: String,
    pub group: String,
    pub preview: String,
    pub timestamp: i64,
}

impl CacheEntryView {
    pub fn from_record(record: &CachedMessage) -> Self {
        let mut preview: String = record.content.chars().take(PREVIEW_CHARS).collect();
        if record.content.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        Self {
            id: record.id.clone(),
            sender_name: record.sender_name.clone(),
            group: record
                .group_id
                .clone()
                .unwrap_or_else(|| crate::memory::store::PRIVATE_GROUP_LABEL.to_owned()),
            preview,
            timestamp: record.timestamp,
        }
    }
}

/// Render a newest-first cache listing.
pub fn render_cache_details(entries: &[CacheEntryView]) -> String {
    if entries.is_empty() {
        return "缓存为空".to_owned();
    }
    let mut out = format!("缓存详情 (最近{}条):\n{RULE}\n", entries.len());
    for entry in entries {
        out.push_str(&format!(
            "ID: {}\n  发送者: {}\n  群组: {}\n  内容: {}\n  时间: {}\n{}\n",
            entry.id,
            entry.sender_name,
            entry.group,
            entry.preview,
            entry.timestamp,
            "─".repeat(30)
        ));
    }
    out
}
