//! poclass Store
//!
//! Persistence behind narrow get/set and append contracts:
//! - Result cache keyed by the normalized (description, supplier) digest
//! - Append-only log of reviewed classifications
//! - Aggregate views over that log

pub mod analytics;
pub mod cache;
pub mod records;

pub use analytics::{
    action_counts, category_counts, not_sure_percentage, summarize, ActionCounts, CategoryCount,
    RecordSummary,
};
pub use cache::{FileCache, MemoryCache};
pub use records::{ClassificationRecord, JsonlRecordStore, RecordStore, ReviewAction};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cache::{FileCache, MemoryCache};
    pub use crate::records::{ClassificationRecord, JsonlRecordStore, RecordStore, ReviewAction};
}
