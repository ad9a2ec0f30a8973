use thiserror::Error;

/// Main error type for WaiterBot
#[derive(Error, Debug)]
pub enum WaiterError {
    /// No credential is available for the named capability.
    #[error("{0} is not configured (missing API key)")]
    NotConfigured(&'static str),

    /// The chat model call failed, timed out, or returned something unusable.
    #[error("Chat failed: {0}")]
    UpstreamUnavailable(String),

    /// A history mutation was attempted on a session that was never created.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Transcription failed: {0}")]
    TranscriptionUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WaiterError {
    /// Short machine-readable code, used in logs and HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            WaiterError::NotConfigured(_) => "NOT_CONFIGURED",
            WaiterError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            WaiterError::InvalidState(_) => "INVALID_STATE",
            WaiterError::TranscriptionUnavailable(_) => "TRANSCRIPTION_UNAVAILABLE",
            WaiterError::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_detail() {
        let err = WaiterError::UpstreamUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Chat failed: connection refused");

        let err = WaiterError::NotConfigured("chat model");
        assert!(err.to_string().contains("chat model"));
        assert_eq!(err.code(), "NOT_CONFIGURED");
    }

    #[test]
    fn test_every_variant_has_a_distinct_code() {
        let codes = [
            WaiterError::NotConfigured("transcription").code(),
            WaiterError::UpstreamUnavailable(String::new()).code(),
            WaiterError::InvalidState(String::new()).code(),
            WaiterError::TranscriptionUnavailable(String::new()).code(),
            WaiterError::ConfigError(String::new()).code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
