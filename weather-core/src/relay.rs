//! Public CORS relays used when the provider cannot be reached directly.
//!
//! Each relay fetches the target server-side. They differ in how the target is
//! passed in and in how the remote body comes back, so decoding lives here
//! next to the URL shape.

use reqwest::Url;
use serde_json::Value;
use std::{convert::TryFrom, fmt};

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayId {
    /// `?quest=<target>`, body mirrored verbatim.
    CodeTabs,
    /// `?url=<target>`, body wrapped as `{ "contents": "<string>" }`.
    AllOrigins,
}

impl RelayId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayId::CodeTabs => "codetabs",
            RelayId::AllOrigins => "allorigins",
        }
    }

    /// Fixed preference order, least intrusive first.
    pub const fn all() -> &'static [RelayId] {
        &[RelayId::CodeTabs, RelayId::AllOrigins]
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            RelayId::CodeTabs => "https://api.codetabs.com/v1/proxy",
            RelayId::AllOrigins => "https://api.allorigins.win/get",
        }
    }

    fn target_param(&self) -> &'static str {
        match self {
            RelayId::CodeTabs => "quest",
            RelayId::AllOrigins => "url",
        }
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RelayId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "codetabs" => Ok(RelayId::CodeTabs),
            "allorigins" => Ok(RelayId::AllOrigins),
            _ => Err(anyhow::anyhow!(
                "Unknown relay '{value}'. Supported relays: codetabs, allorigins."
            )),
        }
    }
}

/// A relay kind bound to the base URL it is reached at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    id: RelayId,
    base_url: Url,
}

impl Relay {
    pub fn new(id: RelayId, base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            FetchError::InvalidUrl(format!("{id} relay base '{base_url}': {e}"))
        })?;

        Ok(Self { id, base_url })
    }

    pub fn with_default_base(id: RelayId) -> Result<Self, FetchError> {
        Self::new(id, id.default_base_url())
    }

    /// Both relays at their public addresses, in preference order.
    pub fn defaults() -> Result<Vec<Self>, FetchError> {
        RelayId::all().iter().map(|id| Self::with_default_base(*id)).collect()
    }

    pub fn id(&self) -> RelayId {
        self.id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Relay URL that makes the relay fetch `target`.
    pub fn wrap(&self, target: &Url) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair(self.id.target_param(), target.as_str());
        url
    }

    /// Recovers the target's JSON from a 2xx relay body.
    ///
    /// The error is a short reason suitable for a relay failure record.
    pub fn unwrap_body(&self, body: &str) -> Result<Value, String> {
        match self.id {
            RelayId::CodeTabs => serde_json::from_str(body)
                .map_err(|e| format!("relay returned malformed data: {e}")),
            RelayId::AllOrigins => {
                let envelope: Value = serde_json::from_str(body)
                    .map_err(|e| format!("relay envelope is not JSON: {e}"))?;

                match envelope.get("contents") {
                    Some(Value::String(contents)) if !contents.is_empty() => {
                        // Upstream bodies that are not JSON come back as-is.
                        Ok(serde_json::from_str(contents)
                            .unwrap_or_else(|_| Value::String(contents.clone())))
                    }
                    Some(Value::String(_)) | Some(Value::Null) | None => {
                        Err("response carried no contents".to_string())
                    }
                    Some(other) => Ok(other.clone()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target() -> Url {
        Url::parse("http://api.weatherstack.com/current?access_key=K&query=New+York").unwrap()
    }

    #[test]
    fn relay_id_as_str_roundtrip() {
        for id in RelayId::all() {
            let parsed = RelayId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_relay_error() {
        let err = RelayId::try_from("corsanywhere").unwrap_err();
        assert!(err.to_string().contains("Unknown relay"));
    }

    #[test]
    fn preference_order_is_codetabs_then_allorigins() {
        let ids: Vec<_> = Relay::defaults().unwrap().iter().map(Relay::id).collect();
        assert_eq!(ids, vec![RelayId::CodeTabs, RelayId::AllOrigins]);
    }

    #[test]
    fn wrap_embeds_full_target_under_relay_param() {
        let codetabs = Relay::with_default_base(RelayId::CodeTabs).unwrap();
        let wrapped = codetabs.wrap(&target());

        assert!(wrapped.as_str().starts_with("https://api.codetabs.com/v1/proxy?quest="));
        let (k, v) = wrapped.query_pairs().next().unwrap();
        assert_eq!(k, "quest");
        assert_eq!(v, target().as_str());

        let allorigins = Relay::with_default_base(RelayId::AllOrigins).unwrap();
        let wrapped = allorigins.wrap(&target());
        let (k, v) = wrapped.query_pairs().next().unwrap();
        assert_eq!(k, "url");
        assert_eq!(v, target().as_str());
    }

    #[test]
    fn codetabs_passes_json_through() {
        let relay = Relay::with_default_base(RelayId::CodeTabs).unwrap();
        let v = relay.unwrap_body(r#"{"current":{"temperature":15}}"#).unwrap();
        assert_eq!(v, json!({"current": {"temperature": 15}}));
    }

    #[test]
    fn codetabs_rejects_html_error_page() {
        let relay = Relay::with_default_base(RelayId::CodeTabs).unwrap();
        assert!(relay.unwrap_body("<html>Bad gateway</html>").is_err());
    }

    #[test]
    fn allorigins_parses_json_contents() {
        let relay = Relay::with_default_base(RelayId::AllOrigins).unwrap();
        let v = relay.unwrap_body(r#"{"contents":"{\"temperature\":20}"}"#).unwrap();
        assert_eq!(v, json!({"temperature": 20}));
    }

    #[test]
    fn allorigins_returns_raw_string_when_not_json() {
        let relay = Relay::with_default_base(RelayId::AllOrigins).unwrap();
        let v = relay.unwrap_body(r#"{"contents":"not json"}"#).unwrap();
        assert_eq!(v, Value::String("not json".into()));
    }

    #[test]
    fn allorigins_without_contents_is_a_failure() {
        let relay = Relay::with_default_base(RelayId::AllOrigins).unwrap();
        assert!(relay.unwrap_body(r#"{"status":{"http_code":500}}"#).is_err());
        assert!(relay.unwrap_body(r#"{"contents":null}"#).is_err());
        assert!(relay.unwrap_body(r#"{"contents":""}"#).is_err());
        assert!(relay.unwrap_body("garbage").is_err());
    }

    #[test]
    fn allorigins_keeps_already_decoded_contents() {
        let relay = Relay::with_default_base(RelayId::AllOrigins).unwrap();
        let v = relay.unwrap_body(r#"{"contents":{"temperature":3}}"#).unwrap();
        assert_eq!(v, json!({"temperature": 3}));
    }

    #[test]
    fn invalid_relay_base_is_rejected() {
        let err = Relay::new(RelayId::CodeTabs, "::nope").unwrap_err();
        assert!(err.to_string().contains("codetabs relay base"));
    }
}
