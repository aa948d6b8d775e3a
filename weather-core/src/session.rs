//! Lookup state per tab and the session that owns the shared location.

use chrono::NaiveDate;
use tracing::debug;

use crate::{
    error::LookupError,
    model::{CurrentReport, HistoricalDay, Location, MarineDay},
    service::{LookupKind, WeatherService},
};

/// What a tab shows: nothing yet, a spinner, a payload, or one error string.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupState<T> {
    Idle,
    Loading,
    Success(T),
    Failed(String),
}

impl<T> LookupState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LookupState::Loading)
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            LookupState::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LookupState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Issued by [`LookupSlot::begin`]; only the newest one may resolve the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// One tab's lookup state. The ticket guard matters for callers that drive a
/// slot from several tasks at once; [`Session`] resolves each lookup in turn.
#[derive(Debug)]
pub struct LookupSlot<T> {
    kind: LookupKind,
    state: LookupState<T>,
    issued: u64,
}

impl<T> LookupSlot<T> {
    pub fn new(kind: LookupKind) -> Self {
        Self { kind, state: LookupState::Idle, issued: 0 }
    }

    pub fn state(&self) -> &LookupState<T> {
        &self.state
    }

    /// Clears any payload or error and enters `Loading`.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        self.state = LookupState::Loading;
        Ticket(self.issued)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Applies `result` if `ticket` is still the latest. Returns whether it was.
    pub fn finish(&mut self, ticket: Ticket, result: Result<T, LookupError>) -> bool {
        if !self.is_latest(ticket) {
            debug!(lookup = %self.kind, ticket = ticket.0, latest = self.issued, "discarding stale result");
            return false;
        }

        self.state = match result {
            Ok(payload) => LookupState::Success(payload),
            Err(err) => {
                debug!(lookup = %self.kind, error = %err, "lookup failed");
                LookupState::Failed(err.user_message(self.kind))
            }
        };
        true
    }

    /// Back to `Idle`; anything still in flight becomes stale.
    pub fn reset(&mut self) {
        self.issued += 1;
        self.state = LookupState::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Current,
    Historical,
    Marine,
}

/// A user's search and the three tabs hanging off it.
#[derive(Debug)]
pub struct Session {
    service: WeatherService,
    location: Option<Location>,
    tab: Tab,
    current: LookupSlot<CurrentReport>,
    historical: LookupSlot<HistoricalDay>,
    marine: LookupSlot<MarineDay>,
    marine_location: Option<Location>,
}

impl Session {
    pub fn new(service: WeatherService) -> Self {
        Self {
            service,
            location: None,
            tab: Tab::Current,
            current: LookupSlot::new(LookupKind::Current),
            historical: LookupSlot::new(LookupKind::Historical),
            marine: LookupSlot::new(LookupKind::Marine),
            marine_location: None,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn active_tab(&self) -> Tab {
        self.tab
    }

    pub fn current(&self) -> &LookupState<CurrentReport> {
        self.current.state()
    }

    pub fn historical(&self) -> &LookupState<HistoricalDay> {
        self.historical.state()
    }

    pub fn marine(&self) -> &LookupState<MarineDay> {
        self.marine.state()
    }

    /// New search: back to the Current tab, dependent tabs cleared.
    pub async fn search(&mut self, city: &str) {
        self.tab = Tab::Current;
        self.location = None;
        self.marine_location = None;
        self.historical.reset();
        self.marine.reset();

        let ticket = self.current.begin();
        let result = self.service.current(city).await;

        if let Ok(report) = &result {
            if self.current.is_latest(ticket) {
                self.location = Some(report.location.clone());
            }
        }
        self.current.finish(ticket, result);
    }

    /// Switches tabs. Opening Marine fetches it when the location changed
    /// since the last marine lookup.
    pub async fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if tab == Tab::Marine && self.location.is_some() && self.location != self.marine_location {
            self.refresh_marine().await;
        }
    }

    pub async fn lookup_historical(&mut self, date: NaiveDate) {
        let ticket = self.historical.begin();
        let result = match &self.location {
            Some(location) => self.service.historical(location, date).await,
            None => Err(no_location()),
        };
        self.historical.finish(ticket, result);
    }

    pub async fn refresh_marine(&mut self) {
        let ticket = self.marine.begin();
        let result = match &self.location {
            Some(location) => {
                self.marine_location = Some(location.clone());
                self.service.marine(location).await
            }
            None => Err(no_location()),
        };
        self.marine.finish(ticket, result);
    }
}

fn no_location() -> LookupError {
    LookupError::InvalidInput("Search for a city first.".into())
}
