//! Best-effort IP geolocation fallback.
//!
//! A lookup is identified by a [`LookupTicket`] issued by the resolver. The
//! caller runs [`run_lookup`] with any [`GeoLocator`] and hands the resulting
//! [`LookupCompletion`] back to the resolver, which decides whether the
//! result is still relevant. Lookups are bounded by a timeout; a timed out
//! lookup is reported as [`GeolocationError::TimedOut`].

mod http;

pub use http::HttpGeoLocator;

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Service queried when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://ipapi.co/json/";

/// Upper bound on a single lookup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// Errors produced by a geolocation lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    /// The request could not be sent or the connection failed.
    #[error("geolocation request to '{url}' failed: {message}")]
    Transport {
        /// Endpoint queried.
        url: String,
        /// Transport failure description.
        message: String,
    },
    /// The service answered with a non-success status.
    #[error("geolocation service '{url}' returned HTTP {status}")]
    Status {
        /// Endpoint queried.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The response body was not a recognizable location report.
    #[error("geolocation response could not be decoded: {message}")]
    Decode {
        /// Decoder error description.
        message: String,
    },
    /// The lookup did not finish within the allotted time.
    #[error("geolocation lookup timed out after {timeout:?}")]
    TimedOut {
        /// The timeout that elapsed.
        timeout: Duration,
    },
    /// The background task running the request failed.
    #[error("geolocation task failed: {message}")]
    Join {
        /// Task failure description.
        message: String,
    },
    /// The endpoint is not an `http` or `https` URL.
    #[error("unsupported geolocation endpoint '{endpoint}': {reason}")]
    UnsupportedEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Country reported by a geolocation service.
///
/// Accepts both `{code, name}` and ipapi-style
/// `{country_code, country_name}` payloads. The report is untrusted and
/// must be validated against the registry before use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeoReport {
    /// Reported ISO 3166-1 alpha-2 code, in any case.
    #[serde(alias = "country_code")]
    pub code: String,
    /// Reported display name, when present.
    #[serde(alias = "country_name", default)]
    pub name: Option<String>,
}

impl GeoReport {
    /// Decode a report from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError::Decode`] when `body` is not a JSON object
    /// with a country code.
    ///
    /// # Examples
    ///
    /// ```
    /// use country_router::geolocation::GeoReport;
    ///
    /// let report = GeoReport::from_json(r#"{"country_code":"LK","country_name":"Sri Lanka"}"#)
    ///     .expect("ipapi payload");
    /// assert_eq!(report.code, "LK");
    /// ```
    pub fn from_json(body: &str) -> Result<Self, GeolocationError> {
        serde_json::from_str(body).map_err(|err| GeolocationError::Decode {
            message: err.to_string(),
        })
    }
}

/// Source of geolocation reports.
pub trait GeoLocator: Send + Sync {
    /// Look up the caller's apparent country.
    fn locate(&self) -> impl Future<Output = Result<GeoReport, GeolocationError>> + Send;
}

/// Handle for one lookup, tagged with the resolver generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
}

impl LookupTicket {
    pub(crate) const fn new(generation: u64) -> Self {
        Self { generation }
    }

    /// Resolver generation at the time the lookup was issued.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Outcome of a lookup, ready to hand back to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupCompletion {
    /// Ticket the lookup was run for.
    pub ticket: LookupTicket,
    /// Report or failure.
    pub outcome: Result<GeoReport, GeolocationError>,
}

/// Run `locator` for `ticket`, giving up after `timeout`.
pub async fn run_lookup<L: GeoLocator>(
    locator: &L,
    ticket: LookupTicket,
    timeout: Duration,
) -> LookupCompletion {
    let outcome = tokio::time::timeout(timeout, locator.locate())
        .await
        .unwrap_or_else(|_| Err(GeolocationError::TimedOut { timeout }));
    match &outcome {
        Ok(report) => debug!(
            generation = ticket.generation,
            code = %report.code,
            "geolocation lookup finished"
        ),
        Err(err) => debug!(
            generation = ticket.generation,
            error = %err,
            "geolocation lookup failed"
        ),
    }
    LookupCompletion { ticket, outcome }
}
