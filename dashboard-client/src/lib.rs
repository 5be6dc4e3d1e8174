//! REST client for the dashboard backend.
//!
//! [`HttpDashboardClient`] implements both [`flow_config::SettingsStore`] and
//! [`conversation_sync::MessagesApi`] with a bearer-authenticated `reqwest` client.
//! [`ClientConfig`] loads connection and session settings from the environment.

pub mod client;
pub mod config;

pub use client::HttpDashboardClient;
pub use config::ClientConfig;
