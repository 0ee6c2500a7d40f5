//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → plain: tokio TcpListener → axum::serve (HTTP/1.1, h2c)
//!     → tls.rs: rustls handshake, ALPN h2 / http/1.1 → axum-server
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently
//! - Browsers only speak HTTP/2 over TLS, so push hints matter most there

pub mod tls;
