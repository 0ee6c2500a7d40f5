//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → request.rs (request ID)
//!     → dispatch.rs (classify client, select build)
//!     → headers.rs (Cache-Control, Link, optional push)
//!     → template render | content.rs (cached bytes) | on-disk file server
//!     → Send to client
//! ```

pub mod content;
pub mod dispatch;
pub mod headers;
pub mod request;
pub mod server;

pub use headers::{PushError, PushHandle, PushPolicy, Pusher};
pub use request::X_REQUEST_ID;
pub use server::{AppState, PrplServer, PrplServerBuilder};
