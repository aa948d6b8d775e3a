//! Core library for the `weatherstack` CLI.
//!
//! This crate defines:
//! - A fetch client that falls back to public CORS relays when the provider
//!   cannot be reached directly
//! - The current, historical and marine lookups against Weatherstack
//! - Per-tab lookup state and the session that owns the searched location
//! - Configuration & credentials handling
//!
//! It is used by `weatherstack-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod model;
pub mod relay;
pub mod request;
pub mod service;
pub mod session;
pub mod transport;

pub use config::Config;
pub use envelope::{ProviderEnvelope, ProviderFault};
pub use error::{FetchError, LookupError, RelayFailure, TransportBlocked};
pub use fetch::FallbackClient;
pub use model::{CurrentReport, HistoricalDay, Location, MarineDay};
pub use relay::{Relay, RelayId};
pub use request::{EndpointRequest, QueryValue};
pub use service::{LookupKind, WeatherService, service_from_config};
pub use session::{LookupSlot, LookupState, Session, Tab, Ticket};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
