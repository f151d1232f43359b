//! Delta-Summary Accumulation: append-only per-community delta log plus
//! threshold-triggered compaction into the community's base summary.
//! LSM-shaped by design — see `compactor` for the flush/GC analogy.

mod compactor;
mod delta;
mod error;

pub use compactor::CommunityCompactor;
pub use delta::{merge_summaries_for_read, DeltaSummarizer};
pub use error::{DsaError, Result};
