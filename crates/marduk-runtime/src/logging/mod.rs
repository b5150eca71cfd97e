//! Logger setup for binaries and tests that embed the runtime.
//!
//! Library code only talks to the `log` facade; installing a backend is left
//! to whoever owns `main`.

mod init;

pub use init::{init_logging, LoggingConfig};
