//! # Event subscribers for the shardvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Worker / Registry ── publish(Event) ──► Bus ──► registry listener
//!                                                      │
//!                                                      ▼
//!                                               SubscriberSet::emit
//!                                          ┌──────────┼──────────┐
//!                                          ▼          ▼          ▼
//!                                      LogWriter   Metrics     Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
