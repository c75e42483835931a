//! Per-profile extension storage
//!
//! Holds what each vendor wrote (the bag) and who asserted what for each
//! canonical field (the provenance ledger).

mod bag;
mod merger;
mod provenance;
mod value;

pub use bag::{ExtensionsBag, NamespaceValues};
pub use merger::{ExtensionMerger, MergeSummary};
pub use provenance::{ProvenanceEntry, ProvenanceLedger, ProvenanceRecord};
pub use value::ExtensionValue;
