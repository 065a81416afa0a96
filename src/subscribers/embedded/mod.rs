//! # Built-in subscribers
//!
//! - [`LogWriter`]: forwards events to `tracing` (enable the `logging` feature).

mod log;

pub use log::LogWriter;
