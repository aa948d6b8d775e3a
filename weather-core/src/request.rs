use std::fmt;

use reqwest::Url;

use crate::error::FetchError;

/// Query parameter names whose values never show up in logs or errors.
const SECRET_PARAMS: &[&str] = &["access_key"];

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Text(s) => f.write_str(s),
            QueryValue::Int(n) => write!(f, "{n}"),
            QueryValue::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

/// Base URL plus ordered query parameters. Built fresh for every lookup.
#[derive(Clone, PartialEq)]
pub struct EndpointRequest {
    base_url: String,
    params: Vec<(String, QueryValue)>,
}

impl EndpointRequest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), params: Vec::new() }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn params(&self) -> &[(String, QueryValue)] {
        &self.params
    }

    /// Looks up the first value given for `name`.
    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// The full target as one URL string, parameters percent-encoded in
    /// insertion order after any query the base URL already carries.
    pub fn canonical_url(&self) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("'{}': {e}", self.base_url)))?;

        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.params {
                pairs.append_pair(name, &value.to_string());
            }
        }

        Ok(url)
    }
}

impl fmt::Debug for EndpointRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<(&str, String)> = self
            .params
            .iter()
            .map(|(k, v)| {
                let shown = if SECRET_PARAMS.contains(&k.as_str()) {
                    "***".to_string()
                } else {
                    v.to_string()
                };
                (k.as_str(), shown)
            })
            .collect();

        f.debug_struct("EndpointRequest")
            .field("base_url", &self.base_url)
            .field("params", &params)
            .finish()
    }
}

/// Renders `url` with secret query values masked.
pub fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| SECRET_PARAMS.contains(&&*k)) {
        return url.to_string();
    }

    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&&*k) { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}
