//! Provider error types.

use thiserror::Error;

/// Errors that can occur when talking to a remote provider or device backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response (quota exhausted).
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The reply arrived but could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A local helper process could not be run.
    #[error("process error: {0}")]
    ProcessFailed(String),

    /// The audio output device could not be opened.
    #[error("audio device error: {0}")]
    AudioDevice(String),

    /// No usable local command was found.
    #[error("no {kind} command found (tried {tried})")]
    CommandUnavailable { kind: &'static str, tried: String },
}

impl ProviderError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else {
            ProviderError::NetworkError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ProviderError::CommandUnavailable {
            kind: "speech",
            tried: "spd-say, espeak-ng".into(),
        };
        assert_eq!(
            err.to_string(),
            "no speech command found (tried spd-say, espeak-ng)"
        );
        assert_eq!(
            ProviderError::ApiError {
                status: 500,
                message: "boom".into()
            }
            .to_string(),
            "API error (HTTP 500): boom"
        );
        assert_eq!(
            ProviderError::AudioDevice("no default output device".into()).to_string(),
            "audio device error: no default output device"
        );
    }
}
