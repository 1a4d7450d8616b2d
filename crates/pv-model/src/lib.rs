pub mod error;
pub mod ids;
pub mod index;
pub mod lookup;
pub mod options;
pub mod record;
pub mod resolution;
pub mod signal;
pub mod terminology;

pub use error::{ModelError, Result};
pub use ids::{AtomId, CaseId, ConceptId, EventId, RecordId, natural_cmp};
pub use index::{CrossReferenceIndex, TerminologyIndex};
pub use lookup::{normalize_application_number, normalize_key};
pub use options::{PipelineOptions, ResolutionOptions, SignalOptions};
pub use record::{DrugRole, EventRecord, RawDrugRecord};
pub use resolution::{
    AUDIT_NOTE_SEPARATOR, CurationQueueEntry, ManualOverrideEntry, ProvenanceCode,
    ResolvedDrugMapping,
};
pub use signal::{ContingencyCell, SignalScore};
pub use terminology::{
    Concept, CrossReferenceEntry, DEFAULT_CLINICAL_SUBSTANCE_VOCABULARY,
    DEFAULT_PREFERRED_VOCABULARY, RelationEdge, RelationType, TermType,
};
