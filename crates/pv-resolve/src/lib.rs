//! Drug-identity resolution: free-text drug names to terminology concepts.

pub mod consolidate;
pub mod context;
pub mod dedupe;
pub mod engine;
pub mod manual;
pub mod normalizer;
pub mod prepared;
pub mod rules;
pub mod table;

pub use consolidate::{ConsolidationSummary, consolidate};
pub use context::ResolutionContext;
pub use dedupe::{dedupe, finalize};
pub use engine::{ResolutionEngine, ResolutionOutcome};
pub use manual::{CurationKey, ManualOverrideMerger, curation_queue};
pub use normalizer::StringNormalizer;
pub use prepared::PreparedRecord;
pub use rules::{MatchRule, RuleMatch, fallback_rules, primary_rules};
pub use table::ResolutionTable;
