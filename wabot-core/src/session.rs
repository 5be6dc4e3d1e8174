//! Session identity injected into both cores at construction.

use std::fmt;

/// Token and owner id of the logged-in business account, plus the WhatsApp number the inbox is
/// currently bound to. Never read from ambient storage inside core logic; always passed in.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: String,
    pub user_id: String,
    pub whatsapp_number_id: Option<String>,
}

impl SessionContext {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            whatsapp_number_id: None,
        }
    }

    pub fn with_whatsapp_number(mut self, number_id: impl Into<String>) -> Self {
        self.whatsapp_number_id = Some(number_id.into());
        self
    }

    /// Token for logs: first 4 chars + "***", or "***" when short.
    pub fn masked_token(&self) -> String {
        if self.token.chars().count() <= 8 {
            "***".to_string()
        } else {
            let head: String = self.token.chars().take(4).collect();
            format!("{}***", head)
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &self.masked_token())
            .field("user_id", &self.user_id)
            .field("whatsapp_number_id", &self.whatsapp_number_id)
            .finish()
    }
}
