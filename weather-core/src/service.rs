//! The three Weatherstack lookups.
//!
//! Each one builds an [`EndpointRequest`], runs it through the
//! [`FallbackClient`] and decodes the envelope exactly once.

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::Config,
    envelope::{ProviderEnvelope, dated_entry},
    error::LookupError,
    fetch::FallbackClient,
    model::{CurrentReport, HistoricalDay, Location, MarineDay},
    relay::{Relay, RelayId},
    request::EndpointRequest,
    transport::ReqwestTransport,
};

/// Weatherstack only serves its free tier over plain HTTP.
pub const DEFAULT_PROVIDER_BASE: &str = "http://api.weatherstack.com";

/// Metric units.
const UNITS: &str = "m";

const MARINE_PLAN_MESSAGE: &str = "Marine data is not available on your current plan.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Current,
    Historical,
    Marine,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Current => "current",
            LookupKind::Historical => "historical",
            LookupKind::Marine => "marine",
        }
    }

    /// Shown when a lookup fails for a reason the user can't act on.
    pub fn generic_failure(&self) -> &'static str {
        match self {
            LookupKind::Current => "Failed to fetch weather data. Please try again.",
            LookupKind::Historical => "Failed to fetch historical data.",
            LookupKind::Marine => "Failed to fetch marine data.",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalPayload {
    #[serde(default)]
    historical: Option<BTreeMap<String, HistoricalDay>>,
}

#[derive(Debug, Deserialize)]
struct MarinePayload {
    #[serde(default)]
    forecast: Option<BTreeMap<String, MarineDay>>,
}

#[derive(Clone)]
pub struct WeatherService {
    access_key: Arc<str>,
    base_url: String,
    fetcher: FallbackClient,
}

impl fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherService")
            .field("access_key", &"***")
            .field("base_url", &self.base_url)
            .field("fetcher", &self.fetcher)
            .finish()
    }
}

impl WeatherService {
    /// The access key is fixed for the lifetime of the service.
    pub fn new(access_key: impl Into<String>, fetcher: FallbackClient) -> Self {
        Self::with_base_url(access_key, DEFAULT_PROVIDER_BASE, fetcher)
    }

    pub fn with_base_url(
        access_key: impl Into<String>,
        base_url: impl Into<String>,
        fetcher: FallbackClient,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            access_key: Arc::from(access_key.into()),
            base_url: base_url.trim_end_matches('/').to_string(),
            fetcher,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, kind: LookupKind) -> EndpointRequest {
        EndpointRequest::new(format!("{}/{}", self.base_url, kind.as_str()))
            .param("access_key", &*self.access_key)
    }

    async fn run(&self, kind: LookupKind, request: EndpointRequest) -> Result<Value, LookupError> {
        debug!(lookup = %kind, ?request, "starting lookup");
        Ok(self.fetcher.fetch_with_fallback(&request).await?)
    }

    /// Current conditions for a free-text place name.
    ///
    /// # Errors
    ///
    /// [`LookupError::InvalidInput`] for a blank city; otherwise whatever the
    /// fetch or the envelope produced.
    pub async fn current(&self, city: &str) -> Result<CurrentReport, LookupError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(LookupError::InvalidInput("Please enter a city name.".into()));
        }

        let request = self.endpoint(LookupKind::Current).param("query", city);
        let body = self.run(LookupKind::Current, request).await?;

        ProviderEnvelope::<CurrentReport>::decode(body, "current")?.into_result()
    }

    /// Weather for `location` on a past `date`.
    ///
    /// # Errors
    ///
    /// [`LookupError::InvalidInput`] for dates after today (UTC),
    /// [`LookupError::MalformedResponse`] when the `historical` collection is
    /// empty.
    pub async fn historical(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> Result<HistoricalDay, LookupError> {
        let today = Utc::now().date_naive();
        if date > today {
            return Err(LookupError::InvalidInput(format!(
                "Historical date {date} is in the future; pick {today} or earlier."
            )));
        }

        let request = self
            .endpoint(LookupKind::Historical)
            .param("query", location.coordinates_query())
            .param("historical_date", date.format("%Y-%m-%d").to_string())
            .param("units", UNITS);
        let body = self.run(LookupKind::Historical, request).await?;

        let payload = ProviderEnvelope::<HistoricalPayload>::decode(body, "historical")?
            .into_result()?;
        let (key, mut day) = dated_entry(payload.historical, "historical", "historical")?;
        day.date.get_or_insert(key);

        Ok(day)
    }

    /// Today's marine forecast for `location`, hour by hour.
    ///
    /// # Errors
    ///
    /// [`LookupError::MalformedResponse`] when the `forecast` collection is
    /// empty.
    pub async fn marine(&self, location: &Location) -> Result<MarineDay, LookupError> {
        let request = self
            .endpoint(LookupKind::Marine)
            .param("query", location.coordinates_query())
            .param("units", UNITS)
            .param("hourly", 1);
        let body = self.run(LookupKind::Marine, request).await?;

        let payload = match ProviderEnvelope::<MarinePayload>::decode(body, "marine")? {
            ProviderEnvelope::Error(mut fault) => {
                // Plan restrictions sometimes arrive without any text.
                if fault.info.trim().is_empty() {
                    fault.info = MARINE_PLAN_MESSAGE.to_string();
                }
                return Err(fault.into());
            }
            ProviderEnvelope::Success(payload) => payload,
        };
        let (key, mut day) = dated_entry(payload.forecast, "marine", "forecast")?;
        day.date.get_or_insert(key);

        Ok(day)
    }
}

/// Build the service from config, resolving the access key once.
pub fn service_from_config(config: &Config) -> anyhow::Result<WeatherService> {
    let access_key = config.access_key()?;

    let transport = match config.timeout_secs {
        Some(secs) => ReqwestTransport::with_timeout(Duration::from_secs(secs))
            .context("Failed to build HTTP client")?,
        None => ReqwestTransport::new(),
    };

    let relays = RelayId::all()
        .iter()
        .map(|id| {
            let base = config.relay_base_url(*id).unwrap_or(id.default_base_url());
            Relay::new(*id, base).with_context(|| format!("Invalid base URL for relay '{id}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let base_url = config.provider_base_url.as_deref().unwrap_or(DEFAULT_PROVIDER_BASE);

    Ok(WeatherService::with_base_url(
        access_key,
        base_url,
        FallbackClient::new(Arc::new(transport), relays),
    ))
}
