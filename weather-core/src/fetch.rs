//! Resilient fetch: direct request first, then relays in fixed order.
//!
//! Attempts run strictly one after another. Only a direct attempt that got no
//! response at all escalates to the relays; a response of any kind, including
//! one carrying a provider error object, is final.

use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::{FetchError, RelayFailure, TransportBlocked},
    relay::Relay,
    request::{EndpointRequest, redact},
    transport::{RawResponse, ReqwestTransport, Transport, TransportError},
};

/// Outcome of a single direct attempt.
#[derive(Debug)]
enum Attempt {
    Success(Value),
    Retryable(TransportError),
    Fatal(FetchError),
}

#[derive(Debug, Clone)]
pub struct FallbackClient {
    transport: Arc<dyn Transport>,
    relays: Vec<Relay>,
}

impl FallbackClient {
    /// `relays` are tried in the order given.
    pub fn new(transport: Arc<dyn Transport>, relays: Vec<Relay>) -> Self {
        Self { transport, relays }
    }

    /// Plain reqwest transport and both public relays.
    pub fn with_default_relays() -> Result<Self, FetchError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()), Relay::defaults()?))
    }

    pub fn relays(&self) -> &[Relay] {
        &self.relays
    }

    /// Fetches `request` and returns the parsed body.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Server`] if the direct request got a non-2xx status.
    /// - [`FetchError::InvalidUrl`] if the target URL cannot be built.
    /// - [`FetchError::AllAttemptsFailed`] if the direct request got no
    ///   response and no relay produced a usable body.
    pub async fn fetch_with_fallback(&self, request: &EndpointRequest) -> Result<Value, FetchError> {
        let target = request.canonical_url()?;
        let shown = redact(&target);

        debug!(url = %shown, "direct attempt");
        let blocked = match self.direct(&target, &shown).await {
            Attempt::Success(body) => return Ok(body),
            Attempt::Fatal(err) => return Err(err),
            Attempt::Retryable(err) => {
                warn!(url = %shown, error = %err, "direct fetch failed, attempting relays");
                TransportBlocked { url: shown.clone(), reason: err.to_string() }
            }
        };

        let mut failures = Vec::with_capacity(self.relays.len());
        for relay in &self.relays {
            debug!(relay = %relay.id(), url = %shown, "relay attempt");
            match self.through_relay(relay, &target).await {
                Ok(body) => {
                    info!(relay = %relay.id(), "relay attempt succeeded");
                    return Ok(body);
                }
                Err(failure) => {
                    warn!(relay = %relay.id(), reason = %failure.reason, "relay attempt failed");
                    failures.push(failure);
                }
            }
        }

        Err(FetchError::AllAttemptsFailed { blocked, relays: failures })
    }

    async fn direct(&self, target: &Url, shown: &str) -> Attempt {
        match self.transport.get(target).await {
            Ok(res) if res.is_success() => Attempt::Success(parse_body(res)),
            Ok(res) => Attempt::Fatal(FetchError::Server {
                url: shown.to_string(),
                status: res.status,
                body: truncate_body(&res.body),
            }),
            Err(TransportError::InvalidRequest(reason)) => {
                Attempt::Fatal(FetchError::InvalidUrl(reason))
            }
            Err(err @ TransportError::Network(_)) => Attempt::Retryable(err),
        }
    }

    async fn through_relay(&self, relay: &Relay, target: &Url) -> Result<Value, RelayFailure> {
        let url = relay.wrap(target);

        let res = self
            .transport
            .get(&url)
            .await
            .map_err(|e| RelayFailure::new(relay.id(), e.to_string()))?;

        if !res.is_success() {
            return Err(RelayFailure::new(
                relay.id(),
                format!("status {}: {}", res.status, truncate_body(&res.body)),
            ));
        }

        relay.unwrap_body(&res.body).map_err(|reason| RelayFailure::new(relay.id(), reason))
    }
}

/// JSON when it parses, the raw text otherwise.
fn parse_body(res: RawResponse) -> Value {
    match serde_json::from_str(&res.body) {
        Ok(v) => v,
        Err(_) => Value::String(res.body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayId;
    use async_trait::async_trait;
    use serde_json::json;
    use std::{collections::VecDeque, sync::Mutex};

    type Scripted = Result<RawResponse, TransportError>;

    /// Answers each call with the next scripted outcome and records the URL.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        calls: Mutex<Vec<Url>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self { script: Mutex::new(script.into()), calls: Mutex::default() })
        }

        fn calls(&self) -> Vec<Url> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
            self.calls.lock().unwrap().push(url.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(network("script exhausted")))
        }
    }

    fn network(msg: &str) -> TransportError {
        TransportError::Network(msg.to_string().into())
    }

    fn ok(body: &str) -> Scripted {
        Ok(RawResponse::new(200, body))
    }

    fn request() -> EndpointRequest {
        EndpointRequest::new("http://api.weatherstack.com/current")
            .param("access_key", "KEY")
            .param("query", "London")
    }

    fn client(transport: Arc<ScriptedTransport>) -> FallbackClient {
        FallbackClient::new(transport, Relay::defaults().unwrap())
    }

    fn relay_of(url: &Url) -> Option<RelayId> {
        match url.host_str() {
            Some("api.codetabs.com") => Some(RelayId::CodeTabs),
            Some("api.allorigins.win") => Some(RelayId::AllOrigins),
            _ => None,
        }
    }

    #[tokio::test]
    async fn direct_success_skips_relays() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"current":{"temperature":12}}"#)]);
        let body = client(transport.clone()).fetch_with_fallback(&request()).await.unwrap();

        assert_eq!(body, json!({"current": {"temperature": 12}}));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn provider_error_body_is_terminal() {
        let raw = r#"{"success":false,"error":{"code":101,"info":"Invalid access key"}}"#;
        let transport = ScriptedTransport::new(vec![ok(raw)]);
        let body = client(transport.clone()).fetch_with_fallback(&request()).await.unwrap();

        assert_eq!(body["error"]["info"], "Invalid access key");
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn server_status_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok(RawResponse::new(404, "not found"))]);
        let err = client(transport.clone()).fetch_with_fallback(&request()).await.unwrap_err();

        assert!(matches!(err, FetchError::Server { status: 404, .. }), "got {err:?}");
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn invalid_request_is_not_retried() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportError::InvalidRequest("bad".into()))]);
        let err = client(transport.clone()).fetch_with_fallback(&request()).await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn first_relay_success_skips_second() {
        let transport = ScriptedTransport::new(vec![
            Err(network("blocked")),
            ok(r#"{"current":{"temperature":9}}"#),
        ]);
        let body = client(transport.clone()).fetch_with_fallback(&request()).await.unwrap();

        assert_eq!(body, json!({"current": {"temperature": 9}}));
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(relay_of(&calls[1]), Some(RelayId::CodeTabs));
    }

    #[tokio::test]
    async fn both_relays_failing_is_terminal() {
        let transport = ScriptedTransport::new(vec![
            Err(network("blocked")),
            Ok(RawResponse::new(502, "bad gateway")),
            Err(network("reset")),
        ]);
        let err = client(transport.clone()).fetch_with_fallback(&request()).await.unwrap_err();

        let FetchError::AllAttemptsFailed { blocked, relays } = err else {
            panic!("expected AllAttemptsFailed");
        };
        assert!(blocked.reason.contains("blocked"));
        assert!(!blocked.url.contains("KEY"));
        assert_eq!(relays.len(), 2);
        assert_eq!(relays[0].relay, RelayId::CodeTabs);
        assert_eq!(relays[1].relay, RelayId::AllOrigins);
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn relay_chain_end_to_end() {
        let transport = ScriptedTransport::new(vec![
            Err(network("mixed content")),
            Err(network("relay down")),
            ok(r#"{"contents":"{\"current\":{\"temperature\":15}}"}"#),
        ]);
        let body = client(transport.clone()).fetch_with_fallback(&request()).await.unwrap();

        assert_eq!(body, json!({"current": {"temperature": 15}}));
        let relays: Vec<_> = transport.calls().iter().map(relay_of).collect();
        assert_eq!(relays, vec![None, Some(RelayId::CodeTabs), Some(RelayId::AllOrigins)]);
    }

    #[tokio::test]
    async fn malformed_first_relay_moves_on() {
        let transport = ScriptedTransport::new(vec![
            Err(network("blocked")),
            ok("<html>quota exceeded</html>"),
            ok(r#"{"contents":"not json"}"#),
        ]);
        let body = client(transport).fetch_with_fallback(&request()).await.unwrap();

        assert_eq!(body, Value::String("not json".into()));
    }

    #[tokio::test]
    async fn relays_receive_the_full_target() {
        let transport = ScriptedTransport::new(vec![Err(network("blocked")), ok("{}")]);
        client(transport.clone()).fetch_with_fallback(&request()).await.unwrap();

        let calls = transport.calls();
        let (_, quest) = calls[1].query_pairs().next().unwrap();
        assert_eq!(quest, calls[0].as_str());
    }

    #[tokio::test]
    async fn non_json_direct_body_is_returned_as_text() {
        let transport = ScriptedTransport::new(vec![ok("plain text")]);
        let body = client(transport).fetch_with_fallback(&request()).await.unwrap();

        assert_eq!(body, Value::String("plain text".into()));
    }

    #[tokio::test]
    async fn no_relays_configured_fails_after_direct() {
        let transport = ScriptedTransport::new(vec![Err(network("blocked"))]);
        let err = FallbackClient::new(transport, Vec::new())
            .fetch_with_fallback(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::AllAttemptsFailed { ref relays, .. } if relays.is_empty()));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
