//! Decoding of OneBot v11 JSON events into core events.
//!
//! Ids may arrive as numbers or strings; both are normalised to strings.
//! Events other than messages and recall notices decode to `None`.

use serde_json::Value;

use crate::error::RecallError;
use crate::io::input::ChatEvent;
use crate::types::{InboundMessage, RecallKind, RecallNotice, Segment};

/// Decode one JSON event line.
pub fn decode(line: &str) -> Result<Option<ChatEvent>, RecallError> {
    let value: Value = serde_json::from_str(line)?;
    decode_value(&value)
}

pub fn decode_value(v: &Value) -> Result<Option<ChatEvent>, RecallError> {
    match v.get("post_type").and_then(Value::as_str) {
        Some("message") => decode_message(v).map(|m| Some(ChatEvent::Message(m))),
        Some("notice") => Ok(decode_notice(v).map(ChatEvent::Recall)),
        _ => Ok(None),
    }
}

fn id_field(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_field(v: Option<&Value>, key: &str) -> Option<String> {
    v?.get(key)?.as_str().filter(|s| !s.is_empty()).map(str::to_owned)
}

fn decode_message(v: &Value) -> Result<InboundMessage, RecallError> {
    let message_id = id_field(v, "message_id")
        .ok_or_else(|| RecallError::Malformed("message event without message_id".into()))?;
    let sender = v.get("sender");
    let sender_id = id_field(v, "user_id")
        .or_else(|| sender.and_then(|s| id_field(s, "user_id")))
        .ok_or_else(|| RecallError::Malformed(format!("message {message_id} without user_id")))?;
    // Group card first, then nickname, then the raw id.
    let sender_name = str_field(sender, "card")
        .or_else(|| str_field(sender, "nickname"))
        .unwrap_or_else(|| sender_id.clone());

    let group_id = match v.get("message_type").and_then(Value::as_str) {
        Some("group") => Some(id_field(v, "group_id").ok_or_else(|| {
            RecallError::Malformed(format!("group message {message_id} without group_id"))
        })?),
        _ => None,
    };

    Ok(InboundMessage {
        message_id,
        sender_id,
        sender_name,
        group_id,
        timestamp: v.get("time").and_then(Value::as_i64),
        segments: decode_segments(v.get("message")),
    })
}

fn decode_segments(raw: Option<&Value>) -> Vec<Segment> {
    match raw {
        Some(Value::Array(items)) => items.iter().filter_map(decode_segment).collect(),
        Some(Value::String(text)) if !text.is_empty() => vec![Segment::text(text.clone())],
        _ => Vec::new(),
    }
}

fn decode_segment(item: &Value) -> Option<Segment> {
    let tag = item.get("type")?.as_str()?.to_owned();
    let data = item.get("data");
    let text = if tag == "text" { str_field(data, "text") } else { None };
    Some(Segment {
        text,
        url: str_field(data, "url"),
        file: str_field(data, "file"),
        tag,
    })
}

fn decode_notice(v: &Value) -> Option<RecallNotice> {
    let kind = match v.get("notice_type").and_then(Value::as_str)? {
        "group_recall" => RecallKind::Group,
        "friend_recall" => RecallKind::Friend,
        _ => return None,
    };
    Some(RecallNotice {
        kind,
        message_id: id_field(v, "message_id"),
        user_id: id_field(v, "user_id").unwrap_or_default(),
        group_id: id_field(v, "group_id"),
        operator_id: id_field(v, "operator_id"),
    })
}
