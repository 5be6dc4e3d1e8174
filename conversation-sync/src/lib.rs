//! Live chat state for the business inbox.
//!
//! [`ConversationSyncEngine`] owns the conversation list, the open conversation's messages and
//! the customer's inferred [`Presence`]. It consumes snapshots through [`MessagesApi`] and
//! reconciles them with events arriving on a [`wabot_core::RealtimeChannel`].

pub mod api;
pub mod engine;
pub mod error;
pub mod events;
pub mod presence;
pub mod types;

pub use api::{MessagesApi, SendManualRequest};
pub use engine::{ConversationSyncEngine, EngineCommand};
pub use error::{Result, SyncError};
pub use events::{InboundEvent, NewMessageEvent, StatusUpdateEvent, TypingEvent};
pub use presence::{PresenceTracker, ONLINE_TIMEOUT, TYPING_STOPPED_TIMEOUT};
pub use types::{
    ChatMessage, Conversation, ConversationKey, MessageContent, MessageFrom, MessageStatus,
    Presence, OPTIMISTIC_PREFIX,
};
