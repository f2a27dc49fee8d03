use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::shutdown::ShutdownGuard;
use crate::io::input::{self, ChatEvent, InputReceiver, InputSender};
use crate::plugin::AntiRecall;

const INPUT_BUFFER: usize = 256;

/// Drives the plugin from the inbound event channel.
///
/// Messages are cached on the dispatcher itself so the store sees them in
/// arrival order. Each recall notice runs in its own tracked task; failures
/// and panics are logged at that boundary.
pub struct Runtime {
    plugin: Arc<AntiRecall>,
    shutdown: ShutdownGuard,
    event_rx: InputReceiver,
    tasks: TaskTracker,
    shutdown_timeout: Duration,
}

impl Runtime {
    /// Create a runtime. Push events into the returned sender.
    pub fn new(plugin: Arc<AntiRecall>, shutdown_timeout: Duration) -> (Self, InputSender) {
        let (tx, rx) = input::channel(INPUT_BUFFER);
        let runtime = Self {
            plugin,
            shutdown: ShutdownGuard::new(),
            event_rx: rx,
            tasks: TaskTracker::new(),
            shutdown_timeout,
        };
        (runtime, tx)
    }

    pub fn token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    pub fn plugin(&self) -> &Arc<AntiRecall> {
        &self.plugin
    }

    /// Run until a shutdown signal arrives or every sender is dropped.
    pub async fn run(mut self) {
        self.shutdown.spawn_signal_listener();
        let token = self.shutdown.token();
        tracing::info!("anti-recall runtime started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("shutdown signal received, no longer accepting events");
                    break;
                }
                event = self.event_rx.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => {
                        tracing::info!("input channel closed");
                        break;
                    }
                },
            }
        }

        self.drain().await;
        self.plugin.shutdown();
        tracing::info!("anti-recall runtime stopped");
    }

    fn dispatch(&self, event: ChatEvent) {
        match event {
            ChatEvent::Message(msg) => {
                self.plugin.on_message(&msg);
            }
            ChatEvent::Recall(notice) => {
                let plugin = self.plugin.clone();
                self.tasks.spawn(async move {
                    let message_id = notice.message_id.clone().unwrap_or_default();
                    let handler = tokio::spawn(async move { plugin.on_recall_notice(&notice).await });
                    match handler.await {
                        Ok(Ok(outcome)) => tracing::debug!(%message_id, ?outcome, "recall handled"),
                        Ok(Err(e)) => tracing::error!(%message_id, error = %e, "recall handling failed"),
                        Err(e) => tracing::error!(%message_id, error = %e, "recall handler panicked"),
                    }
                });
            }
        }
    }

    async fn drain(&mut self) {
        self.event_rx.close();
        // Events already queued are still applied before waiting on handlers.
        while let Ok(event) = self.event_rx.try_recv() {
            self.dispatch(event);
        }
        self.tasks.close();
        let in_flight = self.tasks.len();
        if tokio::time::timeout(self.shutdown_timeout, self.tasks.wait()).await.is_err() {
            tracing::warn!(
                in_flight = self.tasks.len(),
                timeout_secs = self.shutdown_timeout.as_secs(),
                "shutdown timeout elapsed with handlers still running"
            );
        } else if in_flight > 0 {
            tracing::info!(in_flight, "in-flight handlers drained");
        }
    }
}
