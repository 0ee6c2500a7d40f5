//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load project file → Load builds → Build router → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then builds, then listener
//! - Builds are frozen before the first connection is accepted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{stopped, Shutdown};
pub use startup::{serve, StartupError};
