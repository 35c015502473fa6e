//! Chat
//!
//! Conversations between customers and vendors. Sends are persisted over REST
//! and pushed over a real-time channel; the [`reducer`] reconciles the two
//! streams so each message shows up once.

use thiserror::Error;

use crate::api::ApiError;

pub mod models;
pub mod realtime;
pub mod reducer;
pub mod session;

pub use models::{
    Conversation, ConversationId, Delivery, LocalMessageId, Message, Sender, ServerMessage,
    ServerMessageId, UserId,
};
pub use realtime::{ChannelRealtime, InboundMessage, OutboundMessage, RealtimeChannel, RealtimeEvent};
pub use reducer::{ChatAction, ChatState, InboundDisposition};
pub use session::{ChatSession, Outbox, PendingSend};

/// Errors raised by chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The REST call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The operation needs an open conversation
    #[error("no conversation is open")]
    NoOpenConversation,

    /// Blank messages are not sent
    #[error("message is empty")]
    EmptyMessage,
}
