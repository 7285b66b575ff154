//! Country routing core library.
//!
//! This library resolves which country variant of a multi-country site a
//! visitor should see, rewrites internal links for that country and binds
//! the interface language. The [`session::SiteSession`] facade ties the
//! pieces together; [`cli`] and [`runner`] expose them on the command line.

pub mod cli;
pub mod config;
pub mod geolocation;
pub mod language;
pub mod link;
pub mod path;
pub mod preferences;
pub mod registry;
pub mod resolver;
pub mod routes;
pub mod runner;
pub mod session;
