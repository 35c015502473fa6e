//! Chat Models

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub u64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerMessageId(pub u64);

/// User identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Locally generated identifier for a message the server has not confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalMessageId(Uuid);

impl LocalMessageId {
    /// Generate a fresh, time-ordered local identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for LocalMessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local-{}", self.0.simple())
    }
}

/// Who sent a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// User identifier
    pub id: UserId,

    /// Display name; empty for stubs built from real-time events
    #[serde(default)]
    pub name: String,

    /// Email address
    #[serde(default)]
    pub email: String,
}

/// Delivery state of a message.
///
/// ```text
/// Pending(local) ──REST ok──▶ Confirmed(server)
///        └───────REST err──▶ Failed(local)
/// ```
///
/// `Received` marks messages that arrived over the real-time channel without a
/// server identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent locally, awaiting the server's copy
    Pending(LocalMessageId),

    /// Persisted by the server
    Confirmed(ServerMessageId),

    /// Persistence failed
    Failed(LocalMessageId),

    /// Pushed in real time, not yet seen from the server
    Received(LocalMessageId),
}

impl Delivery {
    /// True while the server copy is still outstanding.
    pub fn is_pending(self) -> bool {
        matches!(self, Delivery::Pending(_))
    }

    /// The local identifier, for messages that have one.
    pub fn local_id(self) -> Option<LocalMessageId> {
        match self {
            Delivery::Pending(id) | Delivery::Failed(id) | Delivery::Received(id) => Some(id),
            Delivery::Confirmed(_) => None,
        }
    }

    /// The server identifier, once confirmed.
    pub fn server_id(self) -> Option<ServerMessageId> {
        match self {
            Delivery::Confirmed(id) => Some(id),
            _ => None,
        }
    }
}

/// A message as the server returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerMessage {
    /// Server identifier
    pub id: ServerMessageId,

    /// Sender
    pub sender: Sender,

    /// Body text
    #[serde(alias = "body")]
    pub message: String,

    /// Whether the recipient has read it
    #[serde(default)]
    pub is_read: bool,

    /// When it was read
    #[serde(default)]
    pub read_at: Option<Timestamp>,

    /// Server timestamp
    pub created_at: Timestamp,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ServerMessage")]
pub struct Message {
    /// Delivery state and identifier
    pub delivery: Delivery,

    /// Sender
    pub sender: Sender,

    /// Body text
    pub body: String,

    /// Read flag
    pub read: bool,

    /// When it was read
    pub read_at: Option<Timestamp>,

    /// When it was sent
    pub sent_at: Timestamp,
}

impl From<ServerMessage> for Message {
    fn from(message: ServerMessage) -> Self {
        Self {
            delivery: Delivery::Confirmed(message.id),
            sender: message.sender,
            body: message.message,
            read: message.is_read,
            read_at: message.read_at,
            sent_at: message.created_at,
        }
    }
}

/// A conversation between the current user and another participant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    /// Identifier
    pub id: ConversationId,

    /// The other party
    #[serde(default)]
    pub participant: Option<Sender>,

    /// Preview text of the latest message
    #[serde(default)]
    pub last_message: Option<String>,

    /// Time of the latest message
    #[serde(default)]
    pub last_message_at: Option<Timestamp>,

    /// Messages the current user has not read
    #[serde(default)]
    pub unread_count: u32,

    /// Loaded messages, oldest first
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            participant: None,
            last_message: None,
            last_message_at: None,
            unread_count: 0,
            messages: Vec::new(),
        }
    }

    /// Update the preview with a newer message. Older timestamps are ignored.
    pub fn touch(&mut self, text: &str, at: Timestamp) {
        if self.last_message_at.is_some_and(|last| last > at) {
            return;
        }

        self.last_message = Some(text.to_string());
        self.last_message_at = Some(at);
    }
}
