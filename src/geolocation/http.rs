//! HTTP geolocation locator backed by a blocking `ureq` agent.

use super::{GeoLocator, GeoReport, GeolocationError};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Queries a JSON geolocation endpoint such as `https://ipapi.co/json/`.
#[derive(Debug, Clone)]
pub struct HttpGeoLocator {
    endpoint: Url,
    timeout: Duration,
}

impl HttpGeoLocator {
    /// Create a locator for `endpoint` whose requests give up after
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError::UnsupportedEndpoint`] when `endpoint` does
    /// not parse or is not an `http`/`https` URL.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GeolocationError> {
        let unsupported = |reason: String| GeolocationError::UnsupportedEndpoint {
            endpoint: endpoint.to_owned(),
            reason,
        };
        let url = Url::parse(endpoint).map_err(|err| unsupported(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self {
                endpoint: url,
                timeout,
            }),
            other => Err(unsupported(format!("scheme '{other}' is not allowed"))),
        }
    }

    /// Endpoint this locator queries.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn fetch(endpoint: &Url, timeout: Duration) -> Result<GeoReport, GeolocationError> {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout(timeout)
            .build();
        let response = agent
            .get(endpoint.as_str())
            .set("Accept", "application/json")
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => GeolocationError::Status {
                    url: endpoint.to_string(),
                    status,
                },
                ureq::Error::Transport(transport) => GeolocationError::Transport {
                    url: endpoint.to_string(),
                    message: transport.to_string(),
                },
            })?;
        let body = response
            .into_string()
            .map_err(|err| GeolocationError::Transport {
                url: endpoint.to_string(),
                message: err.to_string(),
            })?;
        GeoReport::from_json(&body)
    }
}

impl GeoLocator for HttpGeoLocator {
    fn locate(&self) -> impl Future<Output = Result<GeoReport, GeolocationError>> + Send {
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;
        async move {
            tokio::task::spawn_blocking(move || Self::fetch(&endpoint, timeout))
                .await
                .map_err(|err| GeolocationError::Join {
                    message: err.to_string(),
                })?
        }
    }
}
