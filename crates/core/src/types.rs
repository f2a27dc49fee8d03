use serde::{Deserialize, Serialize};
use std::fmt;

// ── Message classification ──────────────────────────────────────

/// Closed classification of an inbound chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Text,
    Mention,
    Reply,
    Image,
    Voice,
    Video,
    File,
    Emoji,
    Poke,
    Unknown,
}

impl MessageKind {
    /// Map a wire segment tag to a kind. Unknown tags map to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "text" | "plain" => Self::Text,
            "at" => Self::Mention,
            "reply" => Self::Reply,
            "image" => Self::Image,
            "record" => Self::Voice,
            "video" => Self::Video,
            "file" => Self::File,
            "face" => Self::Emoji,
            "poke" => Self::Poke,
            _ => Self::Unknown,
        }
    }

    /// Human-facing label used in rendered output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "文本",
            Self::Mention => "提及",
            Self::Reply => "引用",
            Self::Image => "图片",
            Self::Voice => "语音",
            Self::Video => "视频",
            Self::File => "文件",
            Self::Emoji => "表情",
            Self::Poke => "戳一戳",
            Self::Unknown => "未知",
        }
    }

    /// Kinds that carry narrative text and may appear in a context window.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Mention | Self::Reply)
    }
}

// ── Scopes ──────────────────────────────────────────────────────

/// Where a message lives and where output for it is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatScope {
    Group(String),
    Private(String),
}

impl ChatScope {
    /// Stable key used to look up per-conversation settings such as the current provider.
    pub fn session_key(&self) -> String {
        self.to_string()
    }

    pub fn group_id(&self) -> Option<&str> {
        match self {
            Self::Group(id) => Some(id),
            Self::Private(_) => None,
        }
    }
}

impl fmt::Display for ChatScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Private(id) => write!(f, "private:{id}"),
        }
    }
}

// ── Inbound events ──────────────────────────────────────────────

/// One component of an inbound message (text run, image, mention, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub tag: String,
    pub text: Option<String>,
    pub url: Option<String>,
    pub file: Option<String>,
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Self { tag: "text".into(), text: Some(text.into()), ..Default::default() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self { tag: "image".into(), url: Some(url.into()), ..Default::default() }
    }

    pub fn bare(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Default::default() }
    }

    fn render(&self) -> String {
        match MessageKind::from_tag(&self.tag) {
            // A text run without text contributes nothing.
            MessageKind::Text => self.text.clone().unwrap_or_default(),
            MessageKind::Image => match self.url.as_ref().or(self.file.as_ref()) {
                Some(reference) => format!("[图片: {reference}]"),
                None => format!("[{}]", self.tag),
            },
            _ => format!("[{}]", self.tag),
        }
    }
}

/// A chat message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub sender_id: String,
    pub sender_name: String,
    /// `None` for direct messages.
    pub group_id: Option<String>,
    /// Unix seconds; `None` means "now" at ingestion.
    pub timestamp: Option<i64>,
    pub segments: Vec<Segment>,
}

impl InboundMessage {
    /// Representational text of the whole message.
    pub fn extract_content(&self) -> String {
        self.segments.iter().map(Segment::render).collect()
    }

    /// Kind of the first segment with a known tag.
    pub fn classify(&self) -> MessageKind {
        self.segments
            .iter()
            .map(|s| MessageKind::from_tag(&s.tag))
            .find(|k| *k != MessageKind::Unknown)
            .unwrap_or(MessageKind::Unknown)
    }

    /// Reference (URL or local path) of the first image segment.
    pub fn image_ref(&self) -> Option<String> {
        self.segments
            .iter()
            .filter(|s| MessageKind::from_tag(&s.tag) == MessageKind::Image)
            .find_map(|s| s.url.clone().or_else(|| s.file.clone()))
    }

    pub fn scope(&self) -> ChatScope {
        match &self.group_id {
            Some(group) => ChatScope::Group(group.clone()),
            None => ChatScope::Private(self.sender_id.clone()),
        }
    }
}

/// Whether a recall notification concerns a group or a direct conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecallKind {
    Group,
    Friend,
}

/// A recall/delete notification. Only the message id identifies the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallNotice {
    pub kind: RecallKind,
    pub message_id: Option<String>,
    /// Account the notification originates from (the message author).
    pub user_id: String,
    pub group_id: Option<String>,
    /// Who performed the recall; defaults to `user_id`.
    pub operator_id: Option<String>,
}

impl RecallNotice {
    pub fn group(group_id: impl Into<String>, user_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            kind: RecallKind::Group,
            message_id: Some(message_id.into()),
            user_id: user_id.into(),
            group_id: Some(group_id.into()),
            operator_id: None,
        }
    }

    pub fn friend(user_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            kind: RecallKind::Friend,
            message_id: Some(message_id.into()),
            user_id: user_id.into(),
            group_id: None,
            operator_id: None,
        }
    }

    pub fn operator(&self) -> &str {
        self.operator_id.as_deref().unwrap_or(&self.user_id)
    }
}

// ── Cache records ───────────────────────────────────────────────

/// One live inbound message held by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMessage {
    pub id: String,
    pub content: String,
    pub sender_id: String,
    pub sender_name: String,
    /// `None` for direct messages.
    pub group_id: Option<String>,
    pub timestamp: i64,
    pub kind: MessageKind,
    /// Raw image reference for `Image` records.
    pub image: Option<String>,
}

impl CachedMessage {
    /// Build a cache record from an inbound message, stamping `now` when the
    /// transport supplied no time.
    pub fn from_inbound(msg: &InboundMessage, now: i64) -> Self {
        let kind = msg.classify();
        Self {
            id: msg.message_id.clone(),
            content: msg.extract_content(),
            sender_id: msg.sender_id.clone(),
            sender_name: msg.sender_name.clone(),
            group_id: msg.group_id.clone(),
            timestamp: msg.timestamp.unwrap_or(now),
            kind,
            image: if kind == MessageKind::Image { msg.image_ref() } else { None },
        }
    }
}

/// A message preceding a recalled one, copied out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub sender_name: String,
    pub content: String,
    pub timestamp: i64,
}

/// A correlated recall ready for the comment pipeline.
#[derive(Debug, Clone)]
pub struct RecalledMessage {
    pub record: CachedMessage,
    pub destination: ChatScope,
    pub operator_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(segments: Vec<Segment>) -> InboundMessage {
        InboundMessage {
            message_id: "1".into(),
            sender_id: "100".into(),
            sender_name: "alice".into(),
            group_id: Some("G".into()),
            timestamp: Some(10),
            segments,
        }
    }

    #[test]
    fn kind_tag_mapping_is_total() {
        let tags = [
            ("plain", MessageKind::Text),
            ("text", MessageKind::Text),
            ("at", MessageKind::Mention),
            ("reply", MessageKind::Reply),
            ("image", MessageKind::Image),
            ("record", MessageKind::Voice),
            ("video", MessageKind::Video),
            ("file", MessageKind::File),
            ("face", MessageKind::Emoji),
            ("poke", MessageKind::Poke),
            ("forward", MessageKind::Unknown),
            ("", MessageKind::Unknown),
        ];
        for (tag, kind) in &tags {
            assert_eq!(MessageKind::from_tag(tag), *kind, "tag {tag}");
        }
        assert_eq!(MessageKind::from_tag("Image"), MessageKind::Image);
    }

    #[test]
    fn textual_kinds() {
        assert!(MessageKind::Text.is_textual());
        assert!(MessageKind::Mention.is_textual());
        assert!(MessageKind::Reply.is_textual());
        assert!(!MessageKind::Image.is_textual());
        assert!(!MessageKind::Unknown.is_textual());
    }

    #[test]
    fn content_extraction_mixes_text_and_placeholders() {
        let msg = inbound(vec![
            Segment::text("look "),
            Segment::image_url("http://img/1.png"),
            Segment::bare("face"),
        ]);
        assert_eq!(msg.extract_content(), "look [图片: http://img/1.png][face]");
    }

    #[test]
    fn empty_text_segment_renders_nothing() {
        let msg = inbound(vec![Segment::bare("text"), Segment { text: Some("  ".into()), ..Segment::bare("plain") }]);
        assert_eq!(msg.extract_content().trim(), "");
    }

    #[test]
    fn non_image_media_render_as_bare_tags() {
        let mut voice = Segment::bare("record");
        voice.url = Some("http://v/a.amr".into());
        let mut video = Segment::bare("video");
        video.file = Some("clip.mp4".into());
        let msg = inbound(vec![voice, video, Segment::bare("image")]);
        assert_eq!(msg.extract_content(), "[record][video][image]");
    }

    #[test]
    fn classify_uses_first_known_segment() {
        let msg = inbound(vec![Segment::bare("forward"), Segment::bare("reply"), Segment::text("x")]);
        assert_eq!(msg.classify(), MessageKind::Reply);
        assert_eq!(inbound(vec![Segment::bare("mystery")]).classify(), MessageKind::Unknown);
        assert_eq!(inbound(vec![]).classify(), MessageKind::Unknown);
    }

    #[test]
    fn cached_message_keeps_image_reference() {
        let mut image = Segment::bare("image");
        image.file = Some("/tmp/a.jpg".into());
        let msg = inbound(vec![image]);
        let record = CachedMessage::from_inbound(&msg, 99);
        assert_eq!(record.kind, MessageKind::Image);
        assert_eq!(record.image.as_deref(), Some("/tmp/a.jpg"));
        assert_eq!(record.content, "[图片: /tmp/a.jpg]");
        assert_eq!(record.timestamp, 10);
    }

    #[test]
    fn missing_timestamp_defaults_to_now() {
        let mut msg = inbound(vec![Segment::text("hi")]);
        msg.timestamp = None;
        assert_eq!(CachedMessage::from_inbound(&msg, 1234).timestamp, 1234);
    }

    #[test]
    fn scope_session_keys() {
        assert_eq!(ChatScope::Group("7".into()).session_key(), "group:7");
        assert_eq!(ChatScope::Private("8".into()).session_key(), "private:8");
        assert_eq!(ChatScope::Group("7".into()).group_id(), Some("7"));
        assert_eq!(ChatScope::Private("8".into()).group_id(), None);
    }

    #[test]
    fn operator_defaults_to_user() {
        let mut notice = RecallNotice::group("G", "100", "5");
        assert_eq!(notice.operator(), "100");
        notice.operator_id = Some("200".into());
        assert_eq!(notice.operator(), "200");
    }
}
