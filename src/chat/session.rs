//! Chat session.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use tracing::{debug, info, warn};

use crate::{
    api::{ApiError, ChatApi},
    chat::{
        ChatError,
        models::{ConversationId, LocalMessageId, Message, Sender, ServerMessage},
        realtime::{OutboundMessage, RealtimeChannel, RealtimeEvent},
        reducer::{ChatAction, ChatState, InboundDisposition},
    },
};

/// Outcome of [`ChatSession::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server stored the message
    Delivered(Message),

    /// The server rejected the message; it stays in the list marked failed
    Failed(LocalMessageId),
}

/// A message queued by [`ChatSession::begin_send`] and not yet reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    /// Local id of the pending entry
    pub local_id: LocalMessageId,

    /// Payload for the real-time channel
    pub outbound: OutboundMessage,
}

/// Pushes pending messages over the real-time channel and persists them.
#[derive(Clone)]
pub struct Outbox {
    api: Arc<dyn ChatApi>,
    realtime: Arc<dyn RealtimeChannel>,
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox").finish_non_exhaustive()
    }
}

impl Outbox {
    /// Emit the message in real time, then persist it over REST. A real-time
    /// failure is logged and does not stop persistence.
    ///
    /// # Errors
    ///
    /// Returns the REST error if the server did not store the message.
    #[tracing::instrument(
        name = "chat.deliver",
        skip(self, pending),
        fields(conversation = %pending.outbound.conversation_id, local_id = %pending.local_id),
        err
    )]
    pub async fn deliver(&self, pending: &PendingSend) -> Result<ServerMessage, ApiError> {
        let outbound = &pending.outbound;

        if let Err(error) = self.realtime.emit(outbound).await {
            warn!(%error, "real-time emit failed");
        }

        self.api
            .send_message(outbound.conversation_id, &outbound.message)
            .await
    }
}

/// Drives [`ChatState`] from the REST API and the real-time channel.
pub struct ChatSession {
    state: ChatState,
    me: Sender,
    token: String,
    api: Arc<dyn ChatApi>,
    realtime: Arc<dyn RealtimeChannel>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("state", &self.state)
            .field("me", &self.me)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Create a session for the signed-in user.
    pub fn new(
        me: Sender,
        token: impl Into<String>,
        api: Arc<dyn ChatApi>,
        realtime: Arc<dyn RealtimeChannel>,
        echo_tolerance: SignedDuration,
    ) -> Self {
        Self {
            state: ChatState::new(me.id, echo_tolerance),
            me,
            token: token.into(),
            api,
            realtime,
        }
    }

    /// Current chat state.
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Fetch the conversation list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the previous list is kept.
    #[tracing::instrument(name = "chat.load_conversations", skip(self), err)]
    pub async fn load_conversations(&mut self) -> Result<(), ChatError> {
        let conversations = self.api.conversations().await?;

        debug!(count = conversations.len(), "loaded conversations");

        self.state
            .reduce(ChatAction::ConversationsLoaded(conversations));

        Ok(())
    }

    /// Fetch the global unread count.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(name = "chat.refresh_unread_count", skip(self), err)]
    pub async fn refresh_unread_count(&mut self) -> Result<u32, ChatError> {
        let count = self.api.unread_count().await?;

        self.state.reduce(ChatAction::UnreadCountLoaded(count));

        Ok(count)
    }

    /// Open a conversation, marking it read if it has unread messages.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching the conversation fails. A failure to mark
    /// it read is logged and leaves the counters untouched.
    #[tracing::instrument(name = "chat.open_conversation", skip(self), fields(conversation = %id), err)]
    pub async fn open_conversation(&mut self, id: ConversationId) -> Result<(), ChatError> {
        let conversation = self.api.conversation(id).await?;
        let unread = conversation.unread_count;

        self.state
            .reduce(ChatAction::ConversationOpened(conversation));

        if unread > 0 {
            if let Err(error) = self.mark_read(id).await {
                warn!(%error, "failed to mark conversation read");
            }
        }

        Ok(())
    }

    /// Close the open conversation.
    pub fn close_conversation(&mut self) {
        self.state.reduce(ChatAction::ConversationClosed);
    }

    /// Mark a conversation read on the server, then locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; local state is unchanged.
    #[tracing::instrument(name = "chat.mark_read", skip(self), fields(conversation = %id), err)]
    pub async fn mark_read(&mut self, id: ConversationId) -> Result<(), ChatError> {
        self.api.mark_read(id).await?;

        self.state.reduce(ChatAction::MarkedRead {
            conversation_id: id,
            at: Timestamp::now(),
        });

        Ok(())
    }

    /// Send a message to the open conversation.
    ///
    /// Runs [`begin_send`](Self::begin_send), [`Outbox::deliver`] and
    /// [`complete_send`](Self::complete_send) back to back. Callers that need
    /// to apply real-time events while the request is in flight should run
    /// the three steps themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if no conversation is open or the text is blank.
    #[tracing::instrument(name = "chat.send_message", skip(self, text), err)]
    pub async fn send_message(&mut self, text: &str) -> Result<SendOutcome, ChatError> {
        let pending = self.begin_send(text)?;
        let result = self.outbox().deliver(&pending).await;

        Ok(self.complete_send(pending, result))
    }

    /// Show a message in the open conversation as pending and build what
    /// must be sent for it.
    ///
    /// # Errors
    ///
    /// Returns an error if no conversation is open or the text is blank.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingSend, ChatError> {
        let conversation_id = self
            .state
            .current()
            .map(|conversation| conversation.id)
            .ok_or(ChatError::NoOpenConversation)?;

        let body = text.trim();

        if body.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let local_id = LocalMessageId::new();

        self.state.reduce(ChatAction::MessageQueued {
            conversation_id,
            local_id,
            sender: self.me.clone(),
            body: body.to_string(),
            at: Timestamp::now(),
        });

        debug!(conversation = %conversation_id, %local_id, "message queued");

        Ok(PendingSend {
            local_id,
            outbound: OutboundMessage {
                conversation_id,
                sender_id: self.me.id,
                message: body.to_string(),
                token: self.token.clone(),
                sender_email: self.me.email.clone(),
            },
        })
    }

    /// Reconcile a pending message with the server's answer. A stored
    /// message replaces the pending entry; an error marks it failed.
    pub fn complete_send(
        &mut self,
        pending: PendingSend,
        result: Result<ServerMessage, ApiError>,
    ) -> SendOutcome {
        let PendingSend { local_id, outbound } = pending;
        let conversation_id = outbound.conversation_id;

        match result {
            Ok(stored) => {
                let message = Message::from(stored);

                self.state.reduce(ChatAction::MessageConfirmed {
                    conversation_id,
                    local_id,
                    message: message.clone(),
                });

                SendOutcome::Delivered(message)
            }
            Err(error) => {
                warn!(%error, %local_id, "message was not persisted");

                self.state.reduce(ChatAction::MessageFailed {
                    conversation_id,
                    local_id,
                });

                SendOutcome::Failed(local_id)
            }
        }
    }

    /// Transport for pending messages, usable without borrowing the session.
    pub fn outbox(&self) -> Outbox {
        Outbox {
            api: Arc::clone(&self.api),
            realtime: Arc::clone(&self.realtime),
        }
    }

    /// Apply an event from the real-time channel.
    ///
    /// Messages from the other party landing in the open conversation mark it
    /// read.
    ///
    /// # Errors
    ///
    /// Returns an error if marking the open conversation read fails.
    pub async fn handle_event(&mut self, event: RealtimeEvent) -> Result<(), ChatError> {
        match event {
            RealtimeEvent::Conversations(conversations) => {
                self.state
                    .reduce(ChatAction::ConversationsLoaded(conversations));
            }
            RealtimeEvent::Message(message) => {
                let conversation_id = message.conversation_id;
                let appended_to_open = self.state.classify(&message)
                    == InboundDisposition::Append
                    && self
                        .state
                        .current()
                        .is_some_and(|current| current.id == conversation_id);
                let from_other = message.sender_id != self.me.id;

                self.state.reduce(ChatAction::MessageReceived(message));

                if appended_to_open && from_other {
                    info!(conversation = %conversation_id, "new message in open conversation");
                    self.mark_read(conversation_id).await?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        api::MockChatApi,
        chat::{
            models::{Conversation, Delivery, ServerMessageId, UserId},
            realtime::{InboundMessage, MockRealtimeChannel, RealtimeError},
            reducer::DEFAULT_ECHO_TOLERANCE,
        },
    };

    use super::*;

    const CONVERSATION: ConversationId = ConversationId(10);

    fn me() -> Sender {
        Sender {
            id: UserId(1),
            name: "Me".to_string(),
            email: "me@example.test".to_string(),
        }
    }

    fn peer() -> Sender {
        Sender {
            id: UserId(2),
            name: "Technician".to_string(),
            email: "tech@example.test".to_string(),
        }
    }

    fn stored(id: u64, sender: Sender, body: &str) -> ServerMessage {
        ServerMessage {
            id: ServerMessageId(id),
            sender,
            message: body.to_string(),
            is_read: false,
            read_at: None,
            created_at: Timestamp::now(),
        }
    }

    fn conversation(unread: u32) -> Conversation {
        Conversation {
            unread_count: unread,
            ..Conversation::new(CONVERSATION)
        }
    }

    fn session(api: MockChatApi, realtime: MockRealtimeChannel) -> ChatSession {
        ChatSession::new(
            me(),
            "token",
            Arc::new(api),
            Arc::new(realtime),
            DEFAULT_ECHO_TOLERANCE,
        )
    }

    fn quiet_realtime() -> MockRealtimeChannel {
        let mut realtime = MockRealtimeChannel::new();
        realtime.expect_emit().returning(|_| Ok(()));
        realtime
    }

    async fn opened(mut api: MockChatApi, realtime: MockRealtimeChannel) -> TestResult<ChatSession> {
        api.expect_conversations()
            .once()
            .return_once(|| Ok(vec![conversation(0)]));
        api.expect_conversation()
            .with(eq(CONVERSATION))
            .once()
            .return_once(|_| Ok(conversation(0)));

        let mut session = session(api, realtime);

        session.load_conversations().await?;
        session.open_conversation(CONVERSATION).await?;

        Ok(session)
    }

    fn deliveries(session: &ChatSession) -> Vec<Delivery> {
        session
            .state()
            .current()
            .map(|c| c.messages.iter().map(|m| m.delivery).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn send_emits_then_persists_and_confirms() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_send_message()
            .withf(|id, message| *id == CONVERSATION && message == "hi")
            .once()
            .return_once(|_, _| Ok(stored(99, me(), "hi")));

        let mut realtime = MockRealtimeChannel::new();
        realtime
            .expect_emit()
            .withf(|outbound| {
                outbound.conversation_id == CONVERSATION
                    && outbound.message == "hi"
                    && outbound.token == "token"
                    && outbound.sender_email == "me@example.test"
            })
            .once()
            .returning(|_| Ok(()));

        let mut session = opened(api, realtime).await?;

        let outcome = session.send_message("  hi ").await?;

        assert!(matches!(outcome, SendOutcome::Delivered(_)));
        assert_eq!(deliveries(&session), [Delivery::Confirmed(ServerMessageId(99))]);
        assert_eq!(
            session
                .state()
                .conversation(CONVERSATION)
                .and_then(|c| c.last_message.as_deref()),
            Some("hi")
        );

        Ok(())
    }

    #[tokio::test]
    async fn realtime_failure_does_not_block_persistence() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_send_message()
            .once()
            .return_once(|_, _| Ok(stored(5, me(), "hello")));

        let mut realtime = MockRealtimeChannel::new();
        realtime
            .expect_emit()
            .once()
            .returning(|_| Err(RealtimeError::Disconnected));

        let mut session = opened(api, realtime).await?;

        session.send_message("hello").await?;

        assert_eq!(deliveries(&session), [Delivery::Confirmed(ServerMessageId(5))]);

        Ok(())
    }

    #[tokio::test]
    async fn rest_failure_marks_message_failed() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_send_message()
            .once()
            .return_once(|_, _| Err(ApiError::MissingData));

        let mut session = opened(api, quiet_realtime()).await?;

        let outcome = session.send_message("hello").await?;

        let SendOutcome::Failed(local_id) = outcome else {
            return Err("expected a failed send".into());
        };

        assert_eq!(deliveries(&session), [Delivery::Failed(local_id)]);

        Ok(())
    }

    #[tokio::test]
    async fn own_echo_is_not_duplicated() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_send_message()
            .once()
            .return_once(|_, _| Ok(stored(99, me(), "hi")));
        api.expect_mark_read().never();

        let mut session = opened(api, quiet_realtime()).await?;

        session.send_message("hi").await?;

        session
            .handle_event(RealtimeEvent::Message(InboundMessage {
                conversation_id: CONVERSATION,
                message_id: None,
                sender_id: UserId(1),
                sender_email: "me@example.test".to_string(),
                message: "hi".to_string(),
                created_at: Timestamp::now(),
            }))
            .await?;

        assert_eq!(deliveries(&session).len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn events_apply_while_a_send_is_in_flight() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_send_message()
            .once()
            .return_once(|_, _| Ok(stored(99, me(), "hi")));
        api.expect_mark_read()
            .with(eq(CONVERSATION))
            .once()
            .returning(|_| Ok(()));

        let mut session = opened(api, quiet_realtime()).await?;

        let pending = session.begin_send("hi")?;
        let outbox = session.outbox();

        session
            .handle_event(RealtimeEvent::Message(InboundMessage {
                conversation_id: CONVERSATION,
                message_id: None,
                sender_id: UserId(1),
                sender_email: "me@example.test".to_string(),
                message: "hi".to_string(),
                created_at: Timestamp::now(),
            }))
            .await?;
        session
            .handle_event(RealtimeEvent::Message(InboundMessage {
                conversation_id: CONVERSATION,
                message_id: Some(ServerMessageId(100)),
                sender_id: peer().id,
                sender_email: peer().email,
                message: "On my way".to_string(),
                created_at: Timestamp::now(),
            }))
            .await?;

        let result = outbox.deliver(&pending).await;
        let outcome = session.complete_send(pending, result);

        assert!(matches!(outcome, SendOutcome::Delivered(_)));

        let bodies: Vec<String> = session
            .state()
            .current()
            .map(|c| c.messages.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default();

        assert_eq!(bodies, ["hi", "On my way"]);
        assert_eq!(
            deliveries(&session),
            [
                Delivery::Confirmed(ServerMessageId(99)),
                Delivery::Confirmed(ServerMessageId(100))
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn peer_message_in_open_conversation_marks_it_read() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_mark_read()
            .with(eq(CONVERSATION))
            .once()
            .returning(|_| Ok(()));

        let mut session = opened(api, quiet_realtime()).await?;

        session
            .handle_event(RealtimeEvent::Message(InboundMessage {
                conversation_id: CONVERSATION,
                message_id: Some(ServerMessageId(3)),
                sender_id: peer().id,
                sender_email: peer().email,
                message: "On my way".to_string(),
                created_at: Timestamp::now(),
            }))
            .await?;

        let messages = session
            .state()
            .current()
            .map(|c| c.messages.clone())
            .unwrap_or_default();

        assert_eq!(messages.len(), 1);
        assert!(messages.iter().all(|m| m.read));

        Ok(())
    }

    #[tokio::test]
    async fn opening_unread_conversation_marks_it_read() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_conversations()
            .once()
            .return_once(|| Ok(vec![conversation(2)]));
        api.expect_unread_count().once().return_once(|| Ok(4));
        api.expect_conversation()
            .once()
            .return_once(|_| Ok(conversation(2)));
        api.expect_mark_read().once().returning(|_| Ok(()));

        let mut session = session(api, quiet_realtime());

        session.load_conversations().await?;
        session.refresh_unread_count().await?;
        session.open_conversation(CONVERSATION).await?;

        assert_eq!(session.state().unread_count(), 2);
        assert_eq!(
            session.state().current().map(|c| c.unread_count),
            Some(0)
        );
        assert_eq!(
            session
                .state()
                .conversation(CONVERSATION)
                .map(|c| c.unread_count),
            Some(0)
        );

        Ok(())
    }

    #[tokio::test]
    async fn mark_read_failure_leaves_counters() -> TestResult {
        let mut api = MockChatApi::new();
        api.expect_conversations()
            .once()
            .return_once(|| Ok(vec![conversation(2)]));
        api.expect_unread_count().once().return_once(|| Ok(2));
        api.expect_mark_read()
            .once()
            .returning(|_| Err(ApiError::MissingData));

        let mut session = session(api, quiet_realtime());

        session.load_conversations().await?;
        session.refresh_unread_count().await?;

        let result = session.mark_read(CONVERSATION).await;

        assert!(matches!(result, Err(ChatError::Api(ApiError::MissingData))));
        assert_eq!(session.state().unread_count(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn sending_without_open_conversation_fails() {
        let mut session = session(MockChatApi::new(), MockRealtimeChannel::new());

        let result = session.send_message("hi").await;

        assert!(matches!(result, Err(ChatError::NoOpenConversation)));
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() -> TestResult {
        let mut session = opened(MockChatApi::new(), MockRealtimeChannel::new()).await?;

        let result = session.send_message("   ").await;

        assert!(matches!(result, Err(ChatError::EmptyMessage)));
        assert!(deliveries(&session).is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn pushed_conversation_lists_are_deduplicated() -> TestResult {
        let mut session = session(MockChatApi::new(), MockRealtimeChannel::new());

        session
            .handle_event(RealtimeEvent::Conversations(vec![
                conversation(0),
                conversation(1),
            ]))
            .await?;

        assert_eq!(session.state().conversations().len(), 1);

        Ok(())
    }
}
