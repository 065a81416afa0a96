//! # Per-resource admission statistics.
//!
//! [`Stats`] is written on the Overload path only and read by monitoring.
//! Increments are relaxed atomics; readers get an eventually consistent total.

use std::sync::atomic::{AtomicU64, Ordering};

/// Rejection counter for one resource.
#[derive(Debug, Default)]
pub struct Stats {
    rejected: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one denied admission.
    #[inline]
    pub fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of denied admissions since the resource was created.
    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}
