//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! signals.rs: SIGINT/SIGTERM → Shutdown::trigger
//! shutdown.rs: broadcast to the server (and any background task)
//! server: stop accepting → drain in-flight requests → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
