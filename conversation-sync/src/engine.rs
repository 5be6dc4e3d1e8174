//! [`ConversationSyncEngine`]: live inbox and open-chat state reconciled against realtime events.
//!
//! Inbound events are applied strictly in delivery order. Local sends are applied
//! optimistically and the request runs on its own task, so events keep flowing while it is in
//! flight; its outcome comes back through the engine and marks the placeholder on failure.
//! The server echo later replaces the placeholder. Malformed events are logged and dropped
//! without touching state.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use wabot_core::{ApiError, OutboundEvent, RealtimeChannel, RealtimeEvent, SessionContext};

use crate::api::{MessagesApi, SendManualRequest};
use crate::error::{Result, SyncError};
use crate::events::{InboundEvent, NewMessageEvent, StatusUpdateEvent, TypingEvent};
use crate::presence::{PresenceTracker, ONLINE_TIMEOUT, TYPING_STOPPED_TIMEOUT};
use crate::types::{
    ChatMessage, Conversation, ConversationKey, MessageContent, MessageFrom, MessageStatus,
    Presence, OPTIMISTIC_PREFIX,
};

/// Local action fed to [`ConversationSyncEngine::run`] next to the realtime stream.
#[derive(Debug)]
pub enum EngineCommand {
    Open {
        customer_wa_id: String,
        whatsapp_number_id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Replies with the optimistic id as soon as the placeholder is in place.
    Send {
        text: String,
        reply: oneshot::Sender<Result<String>>,
    },
    Close,
}

/// Result of a spawned manual send, keyed by its placeholder.
struct SendOutcome {
    optimistic_id: String,
    customer_wa_id: String,
    result: std::result::Result<(), ApiError>,
}

pub struct ConversationSyncEngine {
    session: SessionContext,
    api: Arc<dyn MessagesApi>,
    channel: Arc<dyn RealtimeChannel>,
    /// Most recently updated first.
    conversations: Vec<Conversation>,
    open: Option<ConversationKey>,
    messages: Vec<ChatMessage>,
    presence: PresenceTracker,
    outcome_tx: mpsc::UnboundedSender<SendOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<SendOutcome>,
    pending_sends: usize,
}

impl ConversationSyncEngine {
    pub fn new(
        session: SessionContext,
        api: Arc<dyn MessagesApi>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            session,
            api,
            channel,
            conversations: Vec::new(),
            open: None,
            messages: Vec::new(),
            presence: PresenceTracker::new(),
            outcome_tx,
            outcome_rx,
            pending_sends: 0,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, customer_wa_id: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.customer_wa_id == customer_wa_id)
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    /// Messages of the open conversation, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn open_conversation(&self) -> Option<&ConversationKey> {
        self.open.as_ref()
    }

    pub fn presence(&self) -> Presence {
        self.presence.current()
    }

    /// Manual sends whose outcome has not been applied yet.
    pub fn pending_sends(&self) -> usize {
        self.pending_sends
    }

    fn is_open(&self, customer_wa_id: &str, whatsapp_number_id: &str) -> bool {
        self.open.as_ref().is_some_and(|k| {
            k.customer_wa_id == customer_wa_id && k.whatsapp_number_id == whatsapp_number_id
        })
    }

    /// With no number selected in the session every number counts as active.
    fn is_active_number(&self, message: &ChatMessage) -> bool {
        self.session
            .whatsapp_number_id
            .as_deref()
            .map_or(true, |n| n == message.whatsapp_number_id)
    }

    fn is_duplicate(&self, message: &ChatMessage) -> bool {
        !message.message_id.is_empty()
            && self.messages.iter().any(|m| m.has_id(&message.message_id))
    }

    async fn emit(&self, event: OutboundEvent) {
        let name = event.name();
        if let Err(e) = self.channel.emit(event).await {
            warn!(event = name, error = %e, "failed to emit realtime event");
        }
    }

    /// Conversation for `customer_wa_id`, created if unknown, moved to the front.
    fn touch_conversation(&mut self, customer_wa_id: &str) -> &mut Conversation {
        let conversation = match self
            .conversations
            .iter()
            .position(|c| c.customer_wa_id == customer_wa_id)
        {
            Some(pos) => self.conversations.remove(pos),
            None => Conversation::new(customer_wa_id),
        };
        self.conversations.insert(0, conversation);
        &mut self.conversations[0]
    }

    /// Replaces the conversation list with a fresh snapshot and joins the user's room.
    #[instrument(skip(self), fields(user_id = %self.session.user_id))]
    pub async fn load_conversations(&mut self) -> Result<()> {
        self.emit(OutboundEvent::JoinUserRoom {
            user_id: self.session.user_id.clone(),
        })
        .await;
        let conversations = self.api.fetch_conversations(&self.session).await?;
        info!(count = conversations.len(), "conversations loaded");
        self.conversations = conversations;
        Ok(())
    }

    /// Replaces the message list with a fresh snapshot, ordered by timestamp.
    #[instrument(skip(self))]
    pub async fn load_messages(&mut self, customer_wa_id: &str, whatsapp_number_id: &str) -> Result<()> {
        let mut messages = self
            .api
            .fetch_messages(&self.session, customer_wa_id, whatsapp_number_id)
            .await?;
        messages.sort_by_key(|m| m.timestamp);
        info!(count = messages.len(), "messages loaded");
        self.messages = messages;
        Ok(())
    }

    /// Opens a conversation: rejoins rooms, clears its unread count, resets presence and loads
    /// its messages.
    #[instrument(skip(self))]
    pub async fn open_conversation_view(
        &mut self,
        customer_wa_id: &str,
        whatsapp_number_id: &str,
    ) -> Result<()> {
        let key = ConversationKey::new(customer_wa_id, whatsapp_number_id);
        if let Some(previous) = self.open.take() {
            if previous != key {
                self.emit(OutboundEvent::LeaveConversation {
                    customer_wa_id: previous.customer_wa_id,
                    whatsapp_number_id: previous.whatsapp_number_id,
                })
                .await;
            }
        }
        self.open = Some(key);
        self.presence.reset();
        self.messages.clear();
        if let Some(c) = self
            .conversations
            .iter_mut()
            .find(|c| c.customer_wa_id == customer_wa_id)
        {
            c.unread_count = 0;
        }
        self.emit(OutboundEvent::JoinConversation {
            customer_wa_id: customer_wa_id.to_string(),
            whatsapp_number_id: whatsapp_number_id.to_string(),
        })
        .await;
        self.load_messages(customer_wa_id, whatsapp_number_id).await
    }

    /// Closes the open conversation and cancels any pending presence timer.
    pub async fn close_conversation_view(&mut self) {
        if let Some(previous) = self.open.take() {
            self.emit(OutboundEvent::LeaveConversation {
                customer_wa_id: previous.customer_wa_id,
                whatsapp_number_id: previous.whatsapp_number_id,
            })
            .await;
        }
        self.presence.reset();
        self.messages.clear();
    }

    /// Sends `text` to the open conversation. The message shows up immediately with an
    /// `optimistic-` id and the request runs on a spawned task; its outcome is applied by
    /// [`run`](Self::run) or [`flush_sends`](Self::flush_sends). Returns the optimistic id.
    /// Must be called inside a Tokio runtime.
    #[instrument(skip(self, text))]
    pub fn send_message(&mut self, text: &str) -> Result<String> {
        let key = self.open.clone().ok_or(SyncError::NoOpenConversation)?;
        let body = text.trim();
        if body.is_empty() {
            return Err(SyncError::EmptyMessage);
        }

        let optimistic_id = format!("{}{}", OPTIMISTIC_PREFIX, Uuid::new_v4());
        let message = ChatMessage {
            id: None,
            message_id: optimistic_id.clone(),
            content: MessageContent {
                body: body.to_string(),
            },
            timestamp: Utc::now(),
            from: MessageFrom::Business,
            status: MessageStatus::Sent,
            customer_wa_id: key.customer_wa_id.clone(),
            whatsapp_number_id: key.whatsapp_number_id.clone(),
        };
        self.touch_conversation(&key.customer_wa_id)
            .apply_last_message(&message);
        self.messages.push(message);
        debug!(message_id = %optimistic_id, "optimistic message appended");

        let request = SendManualRequest {
            whatsapp_number_id: key.whatsapp_number_id,
            customer_wa_id: key.customer_wa_id,
            message: body.to_string(),
        };
        let api = Arc::clone(&self.api);
        let session = self.session.clone();
        let outcome_tx = self.outcome_tx.clone();
        let id = optimistic_id.clone();
        self.pending_sends += 1;
        tokio::spawn(async move {
            let result = api.send_manual(&session, &request).await;
            // Receiver lives as long as the engine.
            let _ = outcome_tx.send(SendOutcome {
                optimistic_id: id,
                customer_wa_id: request.customer_wa_id,
                result,
            });
        });
        Ok(optimistic_id)
    }

    /// Marks the placeholder `failed` if the send did not go through. Unauthorized is returned
    /// so the caller can drop the session; other failures are only logged.
    fn apply_send_outcome(&mut self, outcome: SendOutcome) -> Result<()> {
        self.pending_sends = self.pending_sends.saturating_sub(1);
        let err = match outcome.result {
            Ok(()) => {
                debug!(message_id = %outcome.optimistic_id, "manual send accepted");
                return Ok(());
            }
            Err(e) => e,
        };
        error!(
            customer_wa_id = %outcome.customer_wa_id,
            message_id = %outcome.optimistic_id,
            error = %err,
            "manual send failed"
        );
        if let Some(m) = self
            .messages
            .iter_mut()
            .find(|m| m.message_id == outcome.optimistic_id)
        {
            m.status = MessageStatus::Failed;
        }
        if err.is_unauthorized() {
            return Err(SyncError::Unauthorized);
        }
        Ok(())
    }

    /// Waits for every in-flight send and applies its outcome. Returns `Unauthorized` if any
    /// send was rejected for that reason.
    pub async fn flush_sends(&mut self) -> Result<()> {
        let mut result = Ok(());
        while self.pending_sends > 0 {
            let Some(outcome) = self.outcome_rx.recv().await else {
                break;
            };
            if let Err(e) = self.apply_send_outcome(outcome) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Runs one local command. Only an unauthorized open is returned; everything else is
    /// answered through the command's reply channel.
    async fn execute(&mut self, command: EngineCommand) -> Result<()> {
        match command {
            EngineCommand::Open {
                customer_wa_id,
                whatsapp_number_id,
                reply,
            } => {
                let result = self
                    .open_conversation_view(&customer_wa_id, &whatsapp_number_id)
                    .await;
                let unauthorized = matches!(result, Err(SyncError::Unauthorized));
                let _ = reply.send(result);
                if unauthorized {
                    return Err(SyncError::Unauthorized);
                }
            }
            EngineCommand::Send { text, reply } => {
                let _ = reply.send(self.send_message(&text));
            }
            EngineCommand::Close => self.close_conversation_view().await,
        }
        Ok(())
    }

    /// Decodes and applies one realtime event. Undecodable events are logged and dropped.
    pub fn handle_event(&mut self, event: &RealtimeEvent) {
        match InboundEvent::decode(event) {
            Ok(InboundEvent::NewMessage(ev)) => self.on_inbound_message(ev),
            Ok(InboundEvent::StatusUpdate(ev)) => self.on_status_update(ev),
            Ok(InboundEvent::Typing(ev)) => self.on_typing_event(ev),
            Err(e) => warn!(event = %event.name, error = %e, "dropping realtime event"),
        }
    }

    /// Drops one optimistic business message of the open conversation: the one with the same
    /// body if any, otherwise the oldest.
    fn remove_optimistic_echo(&mut self, echo: &ChatMessage) -> bool {
        let candidates = |m: &ChatMessage| {
            m.is_optimistic()
                && m.from == MessageFrom::Business
                && m.customer_wa_id == echo.customer_wa_id
                && m.whatsapp_number_id == echo.whatsapp_number_id
        };
        let pos = self
            .messages
            .iter()
            .position(|m| candidates(m) && m.content.body == echo.content.body)
            .or_else(|| self.messages.iter().position(|m| candidates(m)));
        match pos {
            Some(pos) => {
                let removed = self.messages.remove(pos);
                debug!(message_id = %removed.message_id, "optimistic message reconciled");
                true
            }
            None => false,
        }
    }

    pub fn on_inbound_message(&mut self, event: NewMessageEvent) {
        let NewMessageEvent {
            message,
            customer_name,
            customer_phone,
        } = event;
        let is_open = self.is_open(&message.customer_wa_id, &message.whatsapp_number_id);
        // A redelivered echo must not consume another placeholder.
        let duplicate = is_open && self.is_duplicate(&message);

        if message.from == MessageFrom::Customer && is_open {
            self.presence.online_for(ONLINE_TIMEOUT);
        }
        if message.from == MessageFrom::Business && !duplicate {
            self.remove_optimistic_echo(&message);
        }

        let counts_unread =
            message.from == MessageFrom::Customer && !is_open && self.is_active_number(&message);

        let conversation = self.touch_conversation(&message.customer_wa_id);
        conversation.apply_last_message(&message);
        if let Some(name) = customer_name.filter(|n| !n.is_empty()) {
            conversation.customer_name = name;
        }
        if let Some(phone) = customer_phone.filter(|p| !p.is_empty()) {
            conversation.customer_phone = phone;
        }
        if counts_unread {
            conversation.unread_count += 1;
        }
        debug!(
            customer_wa_id = %message.customer_wa_id,
            from = ?message.from,
            is_open,
            unread = conversation.unread_count,
            "inbound message applied"
        );

        if is_open && !duplicate {
            self.messages.push(message);
        }
    }

    pub fn on_status_update(&mut self, event: StatusUpdateEvent) {
        if let Some(m) = self.messages.iter_mut().find(|m| m.has_id(&event.message_id)) {
            m.status = event.status;
        }
        match event.customer_wa_id {
            Some(customer_wa_id) => {
                if let Some(c) = self
                    .conversations
                    .iter_mut()
                    .find(|c| c.customer_wa_id == customer_wa_id)
                {
                    c.last_message_status = Some(event.status);
                }
            }
            None => warn!(
                message_id = %event.message_id,
                "status update without customerWaId; conversation not updated"
            ),
        }
    }

    pub fn on_typing_event(&mut self, event: TypingEvent) {
        if !self.is_open(&event.customer_wa_id, &event.whatsapp_number_id) {
            return;
        }
        if event.typing {
            self.presence.typing();
        } else {
            self.presence.online_for(TYPING_STOPPED_TIMEOUT);
        }
    }

    /// Applies inbound events in delivery order until the event stream closes, interleaving
    /// local commands, send outcomes and presence decay. Send outcomes and commands are served
    /// before queued events. Stops early with `Unauthorized` when the backend rejects the
    /// session.
    pub async fn run(
        &mut self,
        mut events: mpsc::UnboundedReceiver<RealtimeEvent>,
        mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    ) -> Result<()> {
        info!(user_id = %self.session.user_id, "conversation sync started");
        let mut commands_open = true;
        loop {
            let deadline = self.presence.deadline();
            tokio::select! {
                biased;
                Some(outcome) = self.outcome_rx.recv() => {
                    self.apply_send_outcome(outcome)?;
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.execute(command).await?,
                    None => commands_open = false,
                },
                received = events.recv() => match received {
                    Some(event) => self.handle_event(&event),
                    None => break,
                },
                _ = async {
                    match deadline {
                        Some(d) => tokio::time::sleep_until(d).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    if self.presence.settle() {
                        debug!("presence decayed to offline");
                    }
                }
            }
        }
        info!("realtime channel closed; conversation sync stopped");
        Ok(())
    }
}
