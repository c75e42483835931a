//! Profile assembly
//!
//! Ties validation, merge and resolution together per profile and hands the
//! results to persistence and the reviewer queue.

mod assembler;
mod locks;
mod record;
mod repository;
mod review;

pub use assembler::{IngestError, IngestReport, ProfileAssembler, ResolveReport};
pub use locks::ProfileLocks;
pub use record::{CanonicalState, ProfileExtensions};
pub use repository::{MemoryProfileRepository, ProfileRepository, RepositoryError};
pub use review::{JsonLinesReviewQueue, MemoryReviewQueue, ReviewError, ReviewItem, ReviewQueue};
