//! extfield - vendor extension fields for member profiles
//!
//! Each external system (a vendor namespace) writes its own fields into a
//! profile's extensions bag. Payloads are validated against the vendor's
//! schema, merged without touching other vendors' values, and recorded in a
//! provenance ledger. Where several vendors assert the same canonical field,
//! a trust table decides who owns it, or the conflict goes to a reviewer.

pub mod cli;
pub mod extensions;
pub mod observability;
pub mod profile;
pub mod quality;
pub mod schema;
pub mod trust;

pub use extensions::{ExtensionMerger, ExtensionsBag, ProvenanceLedger};
pub use profile::{IngestError, IngestReport, ProfileAssembler, ProfileExtensions};
pub use schema::{SchemaRegistry, SchemaValidator};
pub use trust::{CanonicalFieldMap, ResolutionOutcome, TrustResolver, TrustTable};
