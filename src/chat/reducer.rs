//! Chat reducer
//!
//! All chat state changes go through [`ChatState::reduce`]. Three sources feed
//! messages into a conversation: the local user's own sends (appended
//! optimistically as [`Delivery::Pending`]), the REST confirmation of those
//! sends, and messages pushed over the real-time channel. The reducer merges
//! them so that each message appears exactly once.

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::chat::{
    models::{Conversation, ConversationId, Delivery, LocalMessageId, Message, Sender, UserId},
    realtime::InboundMessage,
};

/// Default window within which identical messages are considered the same.
pub const DEFAULT_ECHO_TOLERANCE: SignedDuration = SignedDuration::from_secs(2);

/// State transitions understood by [`ChatState::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// A conversation list was loaded or pushed
    ConversationsLoaded(Vec<Conversation>),

    /// A conversation with its messages was opened
    ConversationOpened(Conversation),

    /// The open conversation was closed
    ConversationClosed,

    /// The global unread counter was fetched
    UnreadCountLoaded(u32),

    /// The local user sent a message; shown before the server confirms it
    MessageQueued {
        /// Target conversation
        conversation_id: ConversationId,

        /// Local identifier for the pending entry
        local_id: LocalMessageId,

        /// The local user
        sender: Sender,

        /// Body text
        body: String,

        /// Local send time
        at: Timestamp,
    },

    /// The server persisted a queued message
    MessageConfirmed {
        /// Target conversation
        conversation_id: ConversationId,

        /// Local identifier of the pending entry to replace
        local_id: LocalMessageId,

        /// The authoritative copy
        message: Message,
    },

    /// The server rejected a queued message
    MessageFailed {
        /// Target conversation
        conversation_id: ConversationId,

        /// Local identifier of the pending entry
        local_id: LocalMessageId,
    },

    /// A message arrived over the real-time channel
    MessageReceived(InboundMessage),

    /// A conversation was marked as read
    MarkedRead {
        /// Conversation marked read
        conversation_id: ConversationId,

        /// When it was marked
        at: Timestamp,
    },
}

/// What to do with an inbound real-time message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundDisposition {
    /// New message; append it
    Append,

    /// Already present within the tolerance window
    Duplicate,

    /// The local user's own send echoed back while still pending
    Echo,
}

/// Chat state for the signed-in user.
#[derive(Debug, Clone)]
pub struct ChatState {
    user: UserId,
    echo_tolerance: SignedDuration,
    conversations: Vec<Conversation>,
    current: Option<Conversation>,
    unread_count: u32,
}

impl ChatState {
    /// Create empty state for `user`.
    pub fn new(user: UserId, echo_tolerance: SignedDuration) -> Self {
        Self {
            user,
            echo_tolerance: echo_tolerance.abs(),
            conversations: Vec::new(),
            current: None,
            unread_count: 0,
        }
    }

    /// The signed-in user.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Conversation list, most recent first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// The open conversation, if any.
    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    /// Global unread message count.
    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    /// Look up a conversation list entry.
    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|conversation| conversation.id == id)
    }

    /// Apply a state transition.
    pub fn reduce(&mut self, action: ChatAction) {
        match action {
            ChatAction::ConversationsLoaded(conversations) => {
                self.conversations = dedupe_conversations(conversations);
            }
            ChatAction::ConversationOpened(conversation) => self.open(conversation),
            ChatAction::ConversationClosed => self.current = None,
            ChatAction::UnreadCountLoaded(count) => self.unread_count = count,
            ChatAction::MessageQueued {
                conversation_id,
                local_id,
                sender,
                body,
                at,
            } => self.queue(conversation_id, local_id, sender, body, at),
            ChatAction::MessageConfirmed {
                conversation_id,
                local_id,
                message,
            } => self.confirm(conversation_id, local_id, message),
            ChatAction::MessageFailed {
                conversation_id,
                local_id,
            } => self.fail(conversation_id, local_id),
            ChatAction::MessageReceived(event) => self.receive(event),
            ChatAction::MarkedRead { conversation_id, at } => {
                self.mark_read(conversation_id, at);
            }
        }
    }

    /// Decide whether an inbound message is new, a duplicate, or an echo of
    /// the local user's own pending send.
    pub fn classify(&self, event: &InboundMessage) -> InboundDisposition {
        let Some(current) = self.open_conversation(event.conversation_id) else {
            return self.classify_against_preview(event);
        };

        if let Some(server_id) = event.message_id {
            if current
                .messages
                .iter()
                .any(|message| message.delivery.server_id() == Some(server_id))
            {
                return InboundDisposition::Duplicate;
            }
        }

        let duplicate = current.messages.iter().any(|message| {
            message.body == event.message
                && message.sender.id == event.sender_id
                && self.within_window(message.sent_at, event.created_at)
        });

        if duplicate {
            return InboundDisposition::Duplicate;
        }

        if event.sender_id == self.user
            && current
                .messages
                .iter()
                .any(|message| message.delivery.is_pending() && message.body == event.message)
        {
            return InboundDisposition::Echo;
        }

        InboundDisposition::Append
    }

    fn classify_against_preview(&self, event: &InboundMessage) -> InboundDisposition {
        let seen = self.conversation(event.conversation_id).is_some_and(|entry| {
            entry.last_message.as_deref() == Some(event.message.as_str())
                && entry
                    .last_message_at
                    .is_some_and(|at| self.within_window(at, event.created_at))
        });

        if seen {
            InboundDisposition::Duplicate
        } else {
            InboundDisposition::Append
        }
    }

    fn within_window(&self, a: Timestamp, b: Timestamp) -> bool {
        a.duration_since(b).abs() <= self.echo_tolerance
    }

    fn open_conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.current.as_ref().filter(|current| current.id == id)
    }

    fn open_conversation_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.current.as_mut().filter(|current| current.id == id)
    }

    fn entry_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|conversation| conversation.id == id)
    }

    /// Update a list entry's preview and move it to the top. Unlisted
    /// conversations get a new entry.
    fn bump(&mut self, id: ConversationId, text: &str, at: Timestamp) {
        let position = self
            .conversations
            .iter()
            .position(|conversation| conversation.id == id);

        let mut entry = match position {
            Some(position) => self.conversations.remove(position),
            None => {
                debug!(conversation = %id, "listing new conversation");
                Conversation::new(id)
            }
        };

        entry.touch(text, at);
        self.conversations.insert(0, entry);

        if let Some(current) = self.open_conversation_mut(id) {
            current.touch(text, at);
        }
    }

    fn open(&mut self, mut conversation: Conversation) {
        conversation.messages.sort_by_key(|message| message.sent_at);

        let unread = conversation.unread_count;

        if let Some(entry) = self.entry_mut(conversation.id) {
            entry.unread_count = unread;

            if let (Some(text), Some(at)) = (
                conversation.last_message.as_deref(),
                conversation.last_message_at,
            ) {
                entry.touch(text, at);
            }
        }

        self.current = Some(conversation);
    }

    fn queue(
        &mut self,
        conversation_id: ConversationId,
        local_id: LocalMessageId,
        sender: Sender,
        body: String,
        at: Timestamp,
    ) {
        if let Some(current) = self.open_conversation_mut(conversation_id) {
            current.messages.push(Message {
                delivery: Delivery::Pending(local_id),
                sender,
                body: body.clone(),
                read: false,
                read_at: None,
                sent_at: at,
            });
        }

        self.bump(conversation_id, &body, at);
    }

    fn confirm(
        &mut self,
        conversation_id: ConversationId,
        local_id: LocalMessageId,
        message: Message,
    ) {
        let preview = (message.body.clone(), message.sent_at);

        if let Some(current) = self.open_conversation_mut(conversation_id) {
            let server_id = message.delivery.server_id();

            let already_present = server_id.is_some()
                && current
                    .messages
                    .iter()
                    .any(|existing| existing.delivery.server_id() == server_id);

            let pending = current.messages.iter().position(|existing| {
                matches!(
                    existing.delivery,
                    Delivery::Pending(id) | Delivery::Failed(id) if id == local_id
                )
            });

            match pending {
                Some(position) if already_present => {
                    current.messages.remove(position);
                }
                Some(position) => {
                    if let Some(slot) = current.messages.get_mut(position) {
                        *slot = message;
                    }
                }
                None => {
                    debug!(%local_id, "confirmation for unknown or reconciled message");
                }
            }
        }

        self.bump(conversation_id, &preview.0, preview.1);
    }

    fn fail(&mut self, conversation_id: ConversationId, local_id: LocalMessageId) {
        let Some(current) = self.open_conversation_mut(conversation_id) else {
            return;
        };

        for message in &mut current.messages {
            if message.delivery == Delivery::Pending(local_id) {
                message.delivery = Delivery::Failed(local_id);
            }
        }
    }

    fn receive(&mut self, event: InboundMessage) {
        let disposition = self.classify(&event);
        let conversation_id = event.conversation_id;
        let from_other = event.sender_id != self.user;

        self.bump(conversation_id, &event.message, event.created_at);

        if from_other {
            if let Some(entry) = self.entry_mut(conversation_id) {
                entry.participant.get_or_insert_with(|| Sender {
                    id: event.sender_id,
                    name: String::new(),
                    email: event.sender_email.clone(),
                });
            }
        }

        if disposition != InboundDisposition::Append {
            debug!(conversation = %conversation_id, ?disposition, "dropped inbound message");
            return;
        }

        if let Some(current) = self.open_conversation_mut(conversation_id) {
            let delivery = event.message_id.map_or_else(
                || Delivery::Received(LocalMessageId::new()),
                Delivery::Confirmed,
            );

            current.messages.push(Message {
                delivery,
                sender: Sender {
                    id: event.sender_id,
                    name: String::new(),
                    email: event.sender_email,
                },
                body: event.message,
                read: false,
                read_at: None,
                sent_at: event.created_at,
            });

            return;
        }

        if from_other {
            if let Some(entry) = self.entry_mut(conversation_id) {
                entry.unread_count = entry.unread_count.saturating_add(1);
                self.unread_count = self.unread_count.saturating_add(1);
            }
        }
    }

    fn mark_read(&mut self, conversation_id: ConversationId, at: Timestamp) {
        if let Some(current) = self.open_conversation_mut(conversation_id) {
            for message in &mut current.messages {
                if !message.read {
                    message.read = true;
                    message.read_at = Some(at);
                }
            }

            current.unread_count = 0;
        }

        let cleared = self.entry_mut(conversation_id).map_or(0, |entry| {
            let previous = entry.unread_count;
            entry.unread_count = 0;
            previous
        });

        self.unread_count = self.unread_count.saturating_sub(cleared);
    }
}

/// Collapse duplicate conversations by id, keeping the one with the later
/// last-message time, and order the result most recent first.
pub fn dedupe_conversations(conversations: Vec<Conversation>) -> Vec<Conversation> {
    let mut positions: FxHashMap<ConversationId, usize> = FxHashMap::default();
    let mut unique: Vec<Conversation> = Vec::with_capacity(conversations.len());

    for conversation in conversations {
        match positions.get(&conversation.id) {
            Some(&position) => {
                if let Some(existing) = unique.get_mut(position) {
                    if conversation.last_message_at > existing.last_message_at {
                        *existing = conversation;
                    }
                }
            }
            None => {
                positions.insert(conversation.id, unique.len());
                unique.push(conversation);
            }
        }
    }

    unique.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

    unique
}
