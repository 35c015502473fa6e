//! Real-time channel.
//!
//! The socket transport lives outside this crate. Outbound sends go through
//! [`RealtimeChannel`]; inbound events are decoded into [`RealtimeEvent`] and
//! handed to the chat session.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::chat::models::{Conversation, ConversationId, ServerMessageId, UserId};

/// Errors raised by a real-time transport.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The transport is not connected.
    #[error("real-time channel is disconnected")]
    Disconnected,

    /// The transport rejected the payload.
    #[error("real-time send failed: {0}")]
    Send(String),
}

/// A message pushed to the peer over the real-time channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Target conversation
    pub conversation_id: ConversationId,

    /// Sending user
    pub sender_id: UserId,

    /// Body text
    pub message: String,

    /// Auth token the socket server verifies
    pub token: String,

    /// Sender email, used by peers to align the bubble
    pub sender_email: String,
}

/// A message event received over the real-time channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    /// Conversation the message belongs to
    pub conversation_id: ConversationId,

    /// Server identifier, when the socket server knows it
    #[serde(default)]
    pub message_id: Option<ServerMessageId>,

    /// Sending user
    pub sender_id: UserId,

    /// Sender email
    #[serde(default)]
    pub sender_email: String,

    /// Body text
    pub message: String,

    /// Send time
    pub created_at: Timestamp,
}

/// Events the real-time channel delivers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// A new chat message
    Message(InboundMessage),

    /// A refreshed conversation list
    Conversations(Vec<Conversation>),
}

/// Outbound half of the real-time transport.
#[automock]
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Push a message for low-latency delivery to the peer.
    async fn emit(&self, message: &OutboundMessage) -> Result<(), RealtimeError>;
}

/// Forwards outbound messages into a Tokio channel drained by the socket task.
#[derive(Debug, Clone)]
pub struct ChannelRealtime {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelRealtime {
    /// Create a channel pair: the realtime handle and the receiver the socket
    /// task drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (Self { sender }, receiver)
    }
}

#[async_trait]
impl RealtimeChannel for ChannelRealtime {
    async fn emit(&self, message: &OutboundMessage) -> Result<(), RealtimeError> {
        self.sender
            .send(message.clone())
            .map_err(|_closed| RealtimeError::Disconnected)
    }
}
