//! Client config: dashboard API connection, session identity, logging. Loaded from env.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use wabot_core::SessionContext;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_LOG_FILE: &str = "logs/wabot.log";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct ClientConfig {
    /// API_BASE_URL
    pub api_base_url: String,
    /// AUTH_TOKEN
    pub auth_token: String,
    /// USER_ID
    pub user_id: String,
    /// WHATSAPP_NUMBER_ID; active number for unread accounting
    pub whatsapp_number_id: Option<String>,
    /// REQUEST_TIMEOUT_SECS
    pub request_timeout_secs: u64,
    /// LOG_FILE
    pub log_file: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("auth_token", &self.session().masked_token())
            .field("user_id", &self.user_id)
            .field("whatsapp_number_id", &self.whatsapp_number_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl ClientConfig {
    /// Load from environment variables. AUTH_TOKEN and USER_ID are required.
    pub fn load() -> Result<Self> {
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let auth_token = env::var("AUTH_TOKEN").context("AUTH_TOKEN not set")?;
        let user_id = env::var("USER_ID").context("USER_ID not set")?;
        let whatsapp_number_id = env::var("WHATSAPP_NUMBER_ID")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());

        Ok(Self {
            api_base_url,
            auth_token,
            user_id,
            whatsapp_number_id,
            request_timeout_secs,
            log_file,
        })
    }

    /// Validate config (base URL must parse; token and user id must be non-empty).
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.api_base_url).is_err() {
            anyhow::bail!("API_BASE_URL is not a valid URL: {}", self.api_base_url);
        }
        if self.auth_token.trim().is_empty() {
            anyhow::bail!("AUTH_TOKEN is empty");
        }
        if self.user_id.trim().is_empty() {
            anyhow::bail!("USER_ID is empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session(&self) -> SessionContext {
        let session = SessionContext::new(self.auth_token.clone(), self.user_id.clone());
        match &self.whatsapp_number_id {
            Some(number) => session.with_whatsapp_number(number.clone()),
            None => session,
        }
    }
}
