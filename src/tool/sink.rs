use crate::{
    error::{ArkError, Result},
    models::ToolMessage,
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Destination for the messages a tool invocation emits. The host side of
/// this seam is a channel; tests swap in a collecting sink.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn emit(&self, message: ToolMessage) -> Result<()>;
}

pub struct ChannelSink {
    sender: mpsc::Sender<ToolMessage>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<ToolMessage>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn emit(&self, message: ToolMessage) -> Result<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| ArkError::UnknownFailure("message stream closed by consumer".into()))
    }
}
