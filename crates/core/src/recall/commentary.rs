use serde::{Deserialize, Serialize};

use crate::types::ContextEntry;

const RULE: &str = "──────────────────────────────";

/// Tone of the generated commentary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentaryStyle {
    Humorous,
    Serious,
    Sarcastic,
    Gentle,
}

impl CommentaryStyle {
    /// Parse a configured style name. Accepts the English identifiers and the
    /// Chinese display names; anything else falls back to `Humorous`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "humorous" | "幽默风趣" => Self::Humorous,
            "serious" | "严肃认真" => Self::Serious,
            "sarcastic" | "毒舌吐槽" => Self::Sarcastic,
            "gentle" | "温和友善" => Self::Gentle,
            other => {
                tracing::warn!(style = other, "unknown commentary style, using humorous");
                Self::Humorous
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Humorous => "humorous",
            Self::Serious => "serious",
            Self::Sarcastic => "sarcastic",
            Self::Gentle => "gentle",
        }
    }

    /// Display name shown in status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Humorous => "幽默风趣",
            Self::Serious => "严肃认真",
            Self::Sarcastic => "毒舌吐槽",
            Self::Gentle => "温和友善",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Self::Humorous => {
                "你是一个幽默风趣的评论家，请对以下撤回的内容进行锐评，语气要轻松幽默，不要太严肃。如果有撤回前的聊天上下文，请结合上下文分析撤回的原因。"
            }
            Self::Serious => {
                "你是一个严肃认真的评论家，请对以下撤回的内容进行客观分析。如果有撤回前的聊天上下文，请结合上下文分析撤回的原因。"
            }
            Self::Sarcastic => {
                "你是一个毒舌的评论家，请对以下撤回的内容进行犀利吐槽。如果有撤回前的聊天上下文，请结合上下文吐槽。"
            }
            Self::Gentle => {
                "你是一个温和友善的评论家，请对以下撤回的内容进行温和点评。如果有撤回前的聊天上下文，请结合上下文点评。"
            }
        }
    }
}

/// Render the context window as a numbered block. Empty input renders nothing.
pub fn render_context(entries: &[ContextEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "\n\n【撤回前的聊天上下文】\n{RULE}\n以下是在撤回消息之前的聊天记录，可以帮助理解撤回的上下文和原因：\n"
    );
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!("{}. {}: {}\n", i + 1, entry.sender_name, entry.content));
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Full commentary prompt: style instruction, optional context, then the recalled content.
pub fn build_prompt(style: CommentaryStyle, context: &[ContextEntry], content: &str) -> String {
    format!(
        "{}\n{}\n\n【撤回内容】\n{content}",
        style.instruction(),
        render_context(context)
    )
}
