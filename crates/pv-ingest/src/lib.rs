pub mod drugs;
pub mod error;
pub mod events;
pub mod mappings;
pub mod reader;

pub use drugs::read_drug_records;
pub use error::{IngestError, Result};
pub use events::read_event_records;
pub use mappings::read_resolved_mappings;
pub use reader::{FAERS_DELIMITER, IngestOptions, Ingested};
