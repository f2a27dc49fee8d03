use tokio::sync::mpsc;

use crate::types::{ChatScope, MessageKind};

const RULE: &str = "------------------------------";

/// Display name attached to generated commentary.
pub const COMMENTARY_AUTHOR: &str = "AI 锐评助手";

/// Recovered payload of a recalled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredBody {
    Text(String),
    /// URL or local path of the recalled picture.
    Image(String),
}

/// The recovered original message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredBlock {
    pub sender_id: String,
    /// `None` when sender info display is turned off.
    pub sender_name: Option<String>,
    pub kind: MessageKind,
    pub body: RecoveredBody,
}

/// Generated commentary on the recalled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentaryBlock {
    pub author_id: String,
    pub text: String,
}

/// One announcement for a recalled message, delivered to `destination` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub destination: ChatScope,
    pub recovered: RecoveredBlock,
    pub commentary: Option<CommentaryBlock>,
}

impl OutputUnit {
    /// Plain-text rendering for transports without rich message support.
    pub fn render_text(&self) -> String {
        let mut out = String::from("检测到撤回消息\n");
        if let Some(name) = &self.recovered.sender_name {
            out.push_str(&format!("发送者: {name}\n"));
        }
        out.push_str(&format!("消息类型: {}\n\n撤回内容:\n{RULE}\n", self.recovered.kind.label()));
        match &self.recovered.body {
            RecoveredBody::Text(text) => out.push_str(text),
            RecoveredBody::Image(reference) => out.push_str(&format!("[图片] {reference}")),
        }
        out.push('\n');
        out.push_str(RULE);

        if let Some(commentary) = &self.commentary {
            out.push_str(&format!("\n\n{COMMENTARY_AUTHOR}:\n{RULE}\n{}\n{RULE}", commentary.text));
        }
        out
    }
}

/// Output channel sender: the pipeline pushes announcements here.
pub type OutputSender = mpsc::Sender<OutputUnit>;
/// Output channel receiver: the messaging layer consumes from here.
pub type OutputReceiver = mpsc::Receiver<OutputUnit>;

/// Create an output channel with the given buffer size.
pub fn channel(buffer: usize) -> (OutputSender, OutputReceiver) {
    mpsc::channel(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(sender_name: Option<&str>, body: RecoveredBody, commentary: Option<&str>) -> OutputUnit {
        OutputUnit {
            destination: ChatScope::Group("G".into()),
            recovered: RecoveredBlock {
                sender_id: "100".into(),
                sender_name: sender_name.map(str::to_owned),
                kind: MessageKind::Text,
                body,
            },
            commentary: commentary.map(|text| CommentaryBlock { author_id: "1".into(), text: text.into() }),
        }
    }

    #[test]
    fn renders_content_and_sender() {
        let text = unit(Some("alice"), RecoveredBody::Text("hello".into()), None).render_text();
        assert!(text.contains("发送者: alice"));
        assert!(text.contains("消息类型: 文本"));
        assert!(text.contains("hello"));
        assert!(!text.contains(COMMENTARY_AUTHOR));
    }

    #[test]
    fn hides_sender_when_disabled() {
        let text = unit(None, RecoveredBody::Text("hello".into()), None).render_text();
        assert!(!text.contains("发送者"));
    }

    #[test]
    fn renders_commentary_and_image() {
        let text = unit(None, RecoveredBody::Image("/tmp/a.png".into()), Some("nice try")).render_text();
        assert!(text.contains("[图片] /tmp/a.png"));
        assert!(text.contains(COMMENTARY_AUTHOR));
        assert!(text.contains("nice try"));
    }

    #[tokio::test]
    async fn channel_send_recv() {
        let (tx, mut rx) = channel(4);
        let sent = unit(None, RecoveredBody::Text("x".into()), None);
        tx.send(sent.clone()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), sent);
    }
}
