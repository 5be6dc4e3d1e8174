use thiserror::Error;

/// Errors returned by the REST collaborators (user settings, messages).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),

    /// 401 from the backend; the caller is expected to invalidate the session.
    #[error("Unauthorized: session is no longer valid")]
    Unauthorized,

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    /// The backend answered but refused the request (e.g. `success: false`).
    #[error("Rejected by server: {0}")]
    Rejected(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unauthorized() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!ApiError::Http("timeout".into()).is_unauthorized());
    }

    #[test]
    fn test_display_includes_status() {
        let err = ApiError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "Unexpected status 500: boom");
    }
}
