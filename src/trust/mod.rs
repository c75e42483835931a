//! Cross-vendor ownership of canonical fields
//!
//! The canonical map says which vendor fields assert the same concept; the
//! trust table says how much each vendor is believed; the resolver turns a
//! provenance record plus the table into a winner or a review request.

mod errors;
mod mapping;
mod resolver;
mod score;
mod table;

pub use errors::{InvalidTrustScore, TableError, TableResult};
pub use mapping::{CanonicalFieldMap, FieldRef};
pub use resolver::{Candidate, ResolutionOutcome, TrustResolver};
pub use score::TrustScore;
pub use table::{NamespaceTrust, TrustTable};
