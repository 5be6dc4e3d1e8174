//! # wabot-core
//!
//! Shared pieces for the WhatsApp-bot dashboard: [`SessionContext`], [`ApiError`], the
//! [`RealtimeChannel`] seam with an in-process [`InMemoryChannel`], and tracing initialization.
//! Transport-agnostic; used by flow-config, conversation-sync and dashboard-client.

pub mod channel;
pub mod error;
pub mod logger;
pub mod session;

pub use channel::{ChannelError, InMemoryChannel, OutboundEvent, RealtimeChannel, RealtimeEvent};
pub use error::ApiError;
pub use logger::{init_tracing, open_log_file, LogConfig};
pub use session::SessionContext;
