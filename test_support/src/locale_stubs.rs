//! Stub locale and geolocation providers for tests.
//!
//! These helpers implement the provider traits so tests can inject a
//! deterministic host locale and lookup outcome.

use country_router::geolocation::{GeoLocator, GeoReport, GeolocationError};
use country_router::language::SystemLocale;
use std::future::{self, Future};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Stub system locale provider.
#[derive(Debug, Default, Clone)]
pub struct StubSystemLocale {
    /// Optional system locale value to return.
    pub locale: Option<String>,
}

impl StubSystemLocale {
    /// Create a stub system locale with the provided value.
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
        }
    }
}

impl SystemLocale for StubSystemLocale {
    fn system_locale(&self) -> Option<String> {
        self.locale.clone()
    }
}

/// Locator that always reports the same country and counts its calls.
#[derive(Debug, Clone)]
pub struct FixedLocator {
    code: String,
    calls: Arc<AtomicUsize>,
}

impl FixedLocator {
    /// Report `code` on every lookup.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of lookups issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeoLocator for FixedLocator {
    fn locate(&self) -> impl Future<Output = Result<GeoReport, GeolocationError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        future::ready(Ok(GeoReport {
            code: self.code.clone(),
            name: None,
        }))
    }
}

/// Locator whose lookups always fail with a transport error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingLocator;

impl GeoLocator for FailingLocator {
    fn locate(&self) -> impl Future<Output = Result<GeoReport, GeolocationError>> + Send {
        future::ready(Err(GeolocationError::Transport {
            url: String::from("stub://geolocation"),
            message: String::from("network unreachable"),
        }))
    }
}

/// Locator that reports `code` only after `delay`.
#[derive(Debug, Clone)]
pub struct SlowLocator {
    /// Country code eventually reported.
    pub code: String,
    /// Delay before the report.
    pub delay: Duration,
}

impl GeoLocator for SlowLocator {
    fn locate(&self) -> impl Future<Output = Result<GeoReport, GeolocationError>> + Send {
        let code = self.code.clone();
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            Ok(GeoReport { code, name: None })
        }
    }
}
