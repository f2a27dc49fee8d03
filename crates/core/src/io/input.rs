use tokio::sync::mpsc;

use crate::types::{InboundMessage, RecallNotice};

/// An inbound event handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Message(InboundMessage),
    Recall(RecallNotice),
}

impl ChatEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Recall(_) => "recall",
        }
    }
}

/// Input channel sender: the transport pushes events here.
pub type InputSender = mpsc::Sender<ChatEvent>;
/// Input channel receiver: the runtime consumes from here.
pub type InputReceiver = mpsc::Receiver<ChatEvent>;

/// Create an input channel with the given buffer size.
pub fn channel(buffer: usize) -> (InputSender, InputReceiver) {
    mpsc::channel(buffer)
}

/// Submit an inbound chat message.
pub async fn submit_message(
    tx: &InputSender,
    message: InboundMessage,
) -> Result<(), mpsc::error::SendError<ChatEvent>> {
    tx.send(ChatEvent::Message(message)).await
}

/// Submit a recall notification.
pub async fn submit_recall(
    tx: &InputSender,
    notice: RecallNotice,
) -> Result<(), mpsc::error::SendError<ChatEvent>> {
    tx.send(ChatEvent::Recall(notice)).await
}
