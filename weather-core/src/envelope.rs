//! Provider envelope decoding.
//!
//! The provider reports failures inside a 2xx body under an `error` key rather
//! than through a discriminant, so bodies are decoded exactly once here into a
//! tagged [`ProviderEnvelope`].

use std::collections::BTreeMap;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::LookupError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderFault {
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<ProviderFault> for LookupError {
    fn from(fault: ProviderFault) -> Self {
        LookupError::Provider { info: fault.info, code: fault.code, kind: fault.kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEnvelope<T> {
    Error(ProviderFault),
    Success(T),
}

impl<T: DeserializeOwned> ProviderEnvelope<T> {
    /// Splits `body` on the presence of a non-null `error` key.
    pub fn decode(body: Value, context: &'static str) -> Result<Self, LookupError> {
        if let Some(raw) = body.get("error").filter(|v| !v.is_null()) {
            let fault = serde_json::from_value::<ProviderFault>(raw.clone())
                .unwrap_or_else(|_| ProviderFault {
                    info: raw.as_str().map(str::to_owned).unwrap_or_else(|| raw.to_string()),
                    ..ProviderFault::default()
                });
            return Ok(ProviderEnvelope::Error(fault));
        }

        serde_json::from_value(body)
            .map(ProviderEnvelope::Success)
            .map_err(|source| LookupError::Decode { context, source })
    }
}

impl<T> ProviderEnvelope<T> {
    pub fn into_result(self) -> Result<T, LookupError> {
        match self {
            ProviderEnvelope::Error(fault) => Err(fault.into()),
            ProviderEnvelope::Success(payload) => Ok(payload),
        }
    }
}

/// Takes the entry of a date-keyed collection without knowing the key.
///
/// The provider sends one date per request; if it ever sends more, the
/// earliest ISO date wins.
pub fn dated_entry<V>(
    collection: Option<BTreeMap<String, V>>,
    context: &'static str,
    field: &str,
) -> Result<(String, V), LookupError> {
    collection
        .and_then(|entries| entries.into_iter().next())
        .ok_or_else(|| LookupError::MalformedResponse {
            context,
            reason: format!("no entries under `{field}`"),
        })
}
