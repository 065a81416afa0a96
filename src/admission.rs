//! # Admission controller
//!
//! Decides, without blocking and without any shared lock, whether one more unit of
//! work may enter a resource and on which shard.
//!
//! ## Algorithm
//! ```text
//! start = affinity mod width
//!
//! for i in 0..width:                      (each shard visited exactly once)
//!     shard = (start + i) mod width
//!     if shards[shard].try_reserve():     (latch check + fetch_add + maybe latch)
//!         return Admitted(permit on shard)
//!
//! stats.rejected += 1
//! return Overload                         (no counter touched on this path)
//! ```
//!
//! ## Rules
//! - Callers with distinct affinity hints start on distinct shards, so the common
//!   path touches one shard's atomics only.
//! - The unit that trips a shard's latch is admitted (off-by-one admission), so a
//!   shard holds at most `shard_limit + 1` units and a resource at most
//!   `width * (shard_limit + 1)`, under any contention.
//! - Tables always have at least one shard, so the scan is never empty and the
//!   only failure is `Overload`.
//! - `total_limit mod width` units of capacity are never reachable.

use std::sync::Arc;

use crate::affinity::Affinity;
use crate::shard::{Permit, ShardTable};
use crate::stats::Stats;

/// Outcome of an admission attempt.
#[derive(Debug)]
#[must_use]
pub enum Admission {
    /// Capacity reserved; the permit names the shard and releases it on drop.
    Admitted(Permit),
    /// Every shard is latched.
    Overload,
}

impl Admission {
    /// Shard index for an admitted unit.
    pub fn shard(&self) -> Option<usize> {
        match self {
            Admission::Admitted(p) => Some(p.shard()),
            Admission::Overload => None,
        }
    }

    pub fn is_overload(&self) -> bool {
        matches!(self, Admission::Overload)
    }
}

/// Finds a shard with free capacity, starting at the caller's preferred shard.
///
/// Records a rejection in `stats` when every shard is latched.
pub fn try_admit(shards: &Arc<ShardTable>, stats: &Stats, affinity: Affinity) -> Admission {
    let width = shards.width().get();
    let start = shards.preferred(affinity);

    for offset in 0..width {
        let shard = (start + offset) % width;
        if shards.try_reserve(shard) {
            return Admission::Admitted(Permit::new(Arc::clone(shards), shard));
        }
    }

    stats.record_rejection();
    Admission::Overload
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    fn table(width: usize, total: u64) -> Arc<ShardTable> {
        let width = NonZeroUsize::new(width).unwrap();
        Arc::new(ShardTable::new(width, total / width.get() as u64))
    }

    #[test]
    fn two_shard_scenario() {
        let shards = table(2, 10);
        let stats = Stats::new();
        let hint = Affinity(0);
        let mut held = Vec::new();

        for _ in 0..5 {
            let a = try_admit(&shards, &stats, hint);
            assert_eq!(a.shard(), Some(0));
            held.push(a);
        }
        assert!(!shards.shard(0).is_full());

        let sixth = try_admit(&shards, &stats, hint);
        assert_eq!(sixth.shard(), Some(0));
        assert!(shards.shard(0).is_full());
        held.push(sixth);

        // latched shard falls through to its sibling
        let seventh = try_admit(&shards, &stats, hint);
        assert_eq!(seventh.shard(), Some(1));
        held.push(seventh);

        for _ in 0..5 {
            let a = try_admit(&shards, &stats, Affinity(1));
            assert_eq!(a.shard(), Some(1));
            held.push(a);
        }
        assert!(shards.shard(1).is_full());

        let rejected = try_admit(&shards, &stats, Affinity(7));
        assert!(rejected.is_overload());
        assert_eq!(stats.rejected(), 1);
        assert_eq!(shards.in_flight(), 12);
    }

    #[test]
    fn unit_that_trips_the_latch_is_admitted() {
        let shards = table(1, 3);
        let stats = Stats::new();
        let held: Vec<_> = (0..4)
            .map(|_| try_admit(&shards, &stats, Affinity(0)))
            .collect();
        assert!(held.iter().all(|a| !a.is_overload()));
        assert!(shards.shard(0).is_full());
        assert!(try_admit(&shards, &stats, Affinity(0)).is_overload());
    }

    #[test]
    fn rejections_count_exactly_once_and_mutate_nothing() {
        let shards = table(3, 3);
        let stats = Stats::new();
        let _held: Vec<_> = (0..6)
            .map(|i| try_admit(&shards, &stats, Affinity(i)))
            .collect();
        assert_eq!(stats.rejected(), 0);

        let before: Vec<u64> = (0..3).map(|i| shards.shard(i).count()).collect();
        for n in 1..=5 {
            assert!(try_admit(&shards, &stats, Affinity(n)).is_overload());
            assert_eq!(stats.rejected(), n);
        }
        let after: Vec<u64> = (0..3).map(|i| shards.shard(i).count()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn releasing_one_shard_reopens_only_that_shard() {
        let shards = table(2, 2);
        let stats = Stats::new();
        let on_zero: Vec<_> = (0..2)
            .map(|_| try_admit(&shards, &stats, Affinity(0)))
            .collect();
        let _on_one: Vec<_> = (0..2)
            .map(|_| try_admit(&shards, &stats, Affinity(1)))
            .collect();
        assert!(try_admit(&shards, &stats, Affinity(1)).is_overload());

        drop(on_zero);
        assert!(!shards.shard(0).is_full());
        assert!(shards.shard(1).is_full());
        assert_eq!(shards.shard(1).count(), 2);

        // a caller preferring shard 1 scans over to the reopened shard 0
        let again = try_admit(&shards, &stats, Affinity(1));
        assert_eq!(again.shard(), Some(0));
        assert_eq!(shards.shard(1).count(), 2);
    }

    #[test]
    fn scan_wraps_from_the_last_shard() {
        let shards = table(4, 4);
        let stats = Stats::new();
        let _hold: Vec<_> = (0..2)
            .map(|_| try_admit(&shards, &stats, Affinity(3)))
            .collect();
        assert!(shards.shard(3).is_full());
        let next = try_admit(&shards, &stats, Affinity(3));
        assert_eq!(next.shard(), Some(0));
    }

    #[test]
    fn scan_visits_every_shard_once() {
        // only the shard just before `start` is free: reachable after a full wrap
        let shards = table(5, 5);
        let stats = Stats::new();
        let held: Vec<_> = [0u64, 0, 1, 1, 3, 3, 4, 4]
            .iter()
            .map(|&i| try_admit(&shards, &stats, Affinity(i)))
            .collect();
        assert!(held.iter().all(|a| !a.is_overload()));

        let a = try_admit(&shards, &stats, Affinity(3));
        let b = try_admit(&shards, &stats, Affinity(3));
        assert_eq!(a.shard(), Some(2));
        assert_eq!(b.shard(), Some(2));
        assert!(try_admit(&shards, &stats, Affinity(3)).is_overload());
        assert_eq!(stats.rejected(), 1);
    }

    #[test]
    fn concurrent_admission_stays_bounded() {
        use std::sync::Mutex;

        let width = 4usize;
        let shards = table(width, 40);
        let stats = Arc::new(Stats::new());
        let held = Arc::new(Mutex::new(Vec::new()));

        let threads: Vec<_> = (0..8u64)
            .map(|t| {
                let shards = Arc::clone(&shards);
                let stats = Arc::clone(&stats);
                let held = Arc::clone(&held);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if let Admission::Admitted(p) = try_admit(&shards, &stats, Affinity(t)) {
                            held.lock().unwrap().push(p);
                        }
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        // every shard ends latched at exactly limit + 1
        let admitted = held.lock().unwrap().len() as u64;
        let bound = width as u64 * shards.limit() + width as u64;
        assert_eq!(admitted, bound);
        for shard in 0..width {
            assert_eq!(shards.shard(shard).count(), shards.limit() + 1);
            assert!(shards.shard(shard).is_full());
        }
        assert_eq!(admitted + stats.rejected(), 800);
    }

    #[test]
    fn single_shard_table_admits_any_hint() {
        let shards = table(1, 1);
        let stats = Stats::new();
        let held: Vec<_> = [0, u64::MAX]
            .iter()
            .map(|&hint| try_admit(&shards, &stats, Affinity(hint)))
            .collect();
        assert!(held.iter().all(|a| a.shard() == Some(0)));
        assert!(try_admit(&shards, &stats, Affinity(1)).is_overload());
    }
}
