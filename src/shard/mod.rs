//! Shard-level primitives: usage counters, admission permits and per-shard storage.

mod counter;
mod permit;
mod store;

pub use counter::{ShardCounter, ShardTable};
pub use permit::Permit;
pub use store::ShardStore;
