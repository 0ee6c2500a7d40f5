//! PRPL application server.
//!
//! Serves a progressive web app that ships several builds, picking per
//! request the most capable build the browser supports and announcing the
//! resources that request will need as `Link: rel=preload` headers (or
//! HTTP/2 pushes where the transport allows).

pub mod build;
pub mod capability;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use build::{Build, BuildRegistry};
pub use capability::Capability;
pub use config::ServerConfig;
pub use http::PrplServer;
pub use lifecycle::Shutdown;
