// ── Entity store ──

mod cache;

pub use cache::{Batch, Diff, EntityCache, Snapshot};
