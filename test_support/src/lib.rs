//! Test utilities shared by the integration suites.
//!
//! Provides an HTTP fixture standing in for the geolocation endpoint, stub
//! locale and geolocation providers, and temporary preference directories.

pub mod http;
pub mod locale_stubs;

pub use http::{HttpServer, spawn_http_server, spawn_http_server_with_status, spawn_stalled_server};
pub use locale_stubs::{FailingLocator, FixedLocator, SlowLocator, StubSystemLocale};

use camino::Utf8PathBuf;
use tempfile::TempDir;

/// Create an empty temporary state directory.
///
/// Returns the directory guard and its UTF-8 path.
pub fn state_dir() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("temp state dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
    (dir, path)
}

/// Write a site configuration file into `dir` and return its path.
pub fn write_config(dir: &TempDir, json: &str) -> Utf8PathBuf {
    let path = dir.path().join("site.json");
    std::fs::write(&path, json).expect("write site config");
    Utf8PathBuf::from_path_buf(path).expect("utf-8 config path")
}
