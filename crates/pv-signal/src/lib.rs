//! Signal detection over resolved drug mappings.
//!
//! Resolved concepts and event terms are counted per case
//! ([`count_cooccurrences`]), turned into 2×2 tables
//! ([`ContingencyAggregator`]) and scored ([`SignalStatistics`]).

pub mod contingency;
pub mod cooccurrence;
pub mod statistics;

pub use contingency::ContingencyAggregator;
pub use cooccurrence::{CooccurrenceCounts, PairKey, count_cooccurrences};
pub use statistics::{SignalStatistics, round_to};
