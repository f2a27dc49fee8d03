use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::recall::commentary::CommentaryStyle;

/// Hard ceiling on the context window, regardless of configuration.
pub const MAX_CONTEXT_COUNT: usize = 10;

const DEFAULT_MODERATION_PROMPT: &str = "你是一名内容审核员。请判断下面这段内容是否包含违法违规信息，只回答“是”或“否”，不要输出其他文字。内容：";

/// All anti-recall parameters. Loaded from `anti_recall_config` table at startup.
/// First boot writes defaults; subsequent boots read existing values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallCfg {
    // master switch
    pub enabled: bool,

    // bot identity (messages and recalls from this account are never announced)
    pub self_id: String,

    // scopes
    pub enable_group_chat: bool,
    pub enable_private_chat: bool,

    // cache
    pub max_cache_size: usize,

    // recall handling
    pub enable_image_recall: bool,
    pub show_sender_info: bool,

    // moderation
    pub enable_moderation: bool,
    pub moderation_prompt: String,

    // commentary
    pub enable_commentary: bool,
    pub commentary_style: CommentaryStyle,
    /// Empty means "use the conversation's current provider".
    pub fixed_provider: String,
    pub enable_context_analysis: bool,
    pub context_count: usize,

    // shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for RecallCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            self_id: String::new(),
            enable_group_chat: true,
            enable_private_chat: false,
            max_cache_size: 1000,
            enable_image_recall: true,
            show_sender_info: true,
            enable_moderation: true,
            moderation_prompt: DEFAULT_MODERATION_PROMPT.to_owned(),
            enable_commentary: true,
            commentary_style: CommentaryStyle::Humorous,
            fixed_provider: String::new(),
            enable_context_analysis: true,
            context_count: MAX_CONTEXT_COUNT,
            shutdown_timeout_secs: 10,
        }
    }
}

impl RecallCfg {
    /// Load config from `anti_recall_config` table. If table is empty, seed with defaults.
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM anti_recall_config")
                .fetch_all(pool)
                .await?;

        if rows.is_empty() {
            let cfg = Self::default();
            cfg.seed(pool).await?;
            return Ok(cfg);
        }

        let map: HashMap<String, String> = rows.into_iter().collect();
        Ok(Self::from_map(&map))
    }

    /// Write all default values into `anti_recall_config` table.
    async fn seed(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        for (key, value, desc) in &self.to_entries() {
            sqlx::query(
                "INSERT INTO anti_recall_config (key, value, description) VALUES ($1, $2, $3) \
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(key)
            .bind(value)
            .bind(desc)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            enabled: get_or(m, "enabled", d.enabled),
            self_id: m.get("self_id").cloned().unwrap_or(d.self_id),
            enable_group_chat: get_or(m, "enable_group_chat", d.enable_group_chat),
            enable_private_chat: get_or(m, "enable_private_chat", d.enable_private_chat),
            max_cache_size: get_or(m, "max_cache_size", d.max_cache_size),
            enable_image_recall: get_or(m, "enable_image_recall", d.enable_image_recall),
            show_sender_info: get_or(m, "show_sender_info", d.show_sender_info),
            enable_moderation: get_or(m, "enable_moderation", d.enable_moderation),
            moderation_prompt: m
                .get("moderation_prompt")
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or(d.moderation_prompt),
            enable_commentary: get_or(m, "enable_commentary", d.enable_commentary),
            commentary_style: m
                .get("commentary_style")
                .map(|v| CommentaryStyle::parse(v))
                .unwrap_or(d.commentary_style),
            fixed_provider: m.get("fixed_provider").map(|v| v.trim().to_owned()).unwrap_or(d.fixed_provider),
            enable_context_analysis: get_or(m, "enable_context_analysis", d.enable_context_analysis),
            context_count: get_or(m, "context_count", d.context_count).min(MAX_CONTEXT_COUNT),
            shutdown_timeout_secs: get_or(m, "shutdown_timeout_secs", d.shutdown_timeout_secs),
        }
    }

    fn to_entries(&self) -> Vec<(&str, String, &str)> {
        vec![
            ("enabled", self.enabled.to_string(), "Master switch"),
            ("self_id", self.self_id.clone(), "Bot account id"),
            ("enable_group_chat", self.enable_group_chat.to_string(), "Handle group recalls"),
            ("enable_private_chat", self.enable_private_chat.to_string(), "Handle direct-message recalls"),
            ("max_cache_size", self.max_cache_size.to_string(), "Max cached messages"),
            ("enable_image_recall", self.enable_image_recall.to_string(), "Announce recalled images"),
            ("show_sender_info", self.show_sender_info.to_string(), "Show sender name in output"),
            ("enable_moderation", self.enable_moderation.to_string(), "Check recalled content before re-posting"),
            ("moderation_prompt", self.moderation_prompt.clone(), "Moderation verdict prompt"),
            ("enable_commentary", self.enable_commentary.to_string(), "Generate commentary"),
            ("commentary_style", self.commentary_style.as_str().to_owned(), "Commentary style"),
            ("fixed_provider", self.fixed_provider.clone(), "Fixed LLM provider id (empty = current)"),
            ("enable_context_analysis", self.enable_context_analysis.to_string(), "Feed prior messages to commentary"),
            ("context_count", self.context_count.to_string(), "Context window size (max 10)"),
            ("shutdown_timeout_secs", self.shutdown_timeout_secs.to_string(), "Graceful shutdown timeout seconds"),
        ]
    }

    /// The configured fixed provider, if any.
    pub fn fixed_provider(&self) -> Option<&str> {
        Some(self.fixed_provider.as_str()).filter(|p| !p.is_empty())
    }

    /// Context window size with the hard ceiling applied.
    pub fn context_limit(&self) -> usize {
        self.context_count.min(MAX_CONTEXT_COUNT)
    }
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
