use thiserror::Error;

use crate::relay::RelayId;
use crate::service::LookupKind;

/// Guidance attached to the terminal fallback failure.
pub const ALL_ATTEMPTS_FAILED_HINT: &str =
    "All fetch attempts failed. Please disable HTTPS or use a paid API plan.";

/// The direct request never produced a response.
///
/// Usually the scheme mismatch: an unencrypted-only provider contacted from an
/// environment that only allows encrypted traffic.
#[derive(Debug, Clone, Error)]
#[error("direct request to {url} was blocked: {reason}")]
pub struct TransportBlocked {
    pub url: String,
    pub reason: String,
}

/// A relay errored or handed back something unusable.
#[derive(Debug, Clone, Error)]
#[error("{relay} relay failed: {reason}")]
pub struct RelayFailure {
    pub relay: RelayId,
    pub reason: String,
}

impl RelayFailure {
    pub fn new(relay: RelayId, reason: impl Into<String>) -> Self {
        Self { relay, reason: reason.into() }
    }
}

/// Errors from the resilient fetch client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target answered with a non-success status. Never retried via relays.
    #[error("request to {url} failed with status {status}: {body}")]
    Server { url: String, status: u16, body: String },

    /// The request could not be built (bad base URL, bad relay URL).
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Direct attempt blocked and every relay failed.
    #[error("{}", ALL_ATTEMPTS_FAILED_HINT)]
    AllAttemptsFailed {
        blocked: TransportBlocked,
        relays: Vec<RelayFailure>,
    },
}

/// Errors from the weather lookups.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The provider answered but reported a failure inside its payload.
    #[error("{info}")]
    Provider {
        info: String,
        code: Option<i64>,
        kind: Option<String>,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The success envelope lacked the expected date-keyed collection.
    #[error("Malformed {context} response: {reason}")]
    MalformedResponse { context: &'static str, reason: String },

    /// The success envelope did not match the expected payload shape.
    #[error("Failed to decode {context} response: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    InvalidInput(String),
}

impl LookupError {
    /// The single string shown to the user for a failed lookup.
    pub fn user_message(&self, kind: LookupKind) -> String {
        match self {
            LookupError::Provider { info, .. } if info.trim().is_empty() => {
                kind.generic_failure().to_string()
            }
            LookupError::Provider { .. }
            | LookupError::InvalidInput(_)
            | LookupError::MalformedResponse { .. }
            | LookupError::Fetch(FetchError::AllAttemptsFailed { .. }) => self.to_string(),
            LookupError::Fetch(_) | LookupError::Decode { .. } => kind.generic_failure().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_failed() -> FetchError {
        FetchError::AllAttemptsFailed {
            blocked: TransportBlocked {
                url: "http://api.weatherstack.com/current".into(),
                reason: "connection refused".into(),
            },
            relays: vec![
                RelayFailure::new(RelayId::CodeTabs, "status 502"),
                RelayFailure::new(RelayId::AllOrigins, "response carried no contents"),
            ],
        }
    }

    #[test]
    fn provider_error_is_surfaced_verbatim() {
        let err = LookupError::Provider {
            info: "Your API request failed. Please try again.".into(),
            code: Some(615),
            kind: Some("request_failed".into()),
        };
        assert_eq!(
            err.user_message(LookupKind::Current),
            "Your API request failed. Please try again."
        );
    }

    #[test]
    fn provider_error_without_text_falls_back_to_lookup_message() {
        let err = LookupError::Provider { info: "  ".into(), code: Some(101), kind: None };
        assert_eq!(
            err.user_message(LookupKind::Current),
            "Failed to fetch weather data. Please try again."
        );
    }

    #[test]
    fn all_attempts_failed_carries_guidance() {
        let err = LookupError::from(all_failed());
        let msg = err.user_message(LookupKind::Marine);
        assert!(msg.contains("disable HTTPS"));
    }

    #[test]
    fn server_failure_uses_lookup_specific_message() {
        let err = LookupError::from(FetchError::Server {
            url: "http://api.weatherstack.com/historical".into(),
            status: 500,
            body: "oops".into(),
        });
        assert_eq!(err.user_message(LookupKind::Historical), "Failed to fetch historical data.");
    }

    #[test]
    fn relay_failure_names_relay() {
        let f = RelayFailure::new(RelayId::AllOrigins, "timed out");
        assert_eq!(f.to_string(), "allorigins relay failed: timed out");
    }
}
