//! Adverse-event record reader.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use pv_model::{CaseId, EventRecord};

use crate::error::{IngestError, Result};
use crate::reader::{IngestOptions, Ingested, first_non_blank, open, require_any};

#[derive(Debug, Deserialize)]
struct EventRow {
    #[serde(default)]
    case_id: String,
    #[serde(default)]
    primaryid: String,
    #[serde(default)]
    caseid: String,
    #[serde(default, alias = "pt", alias = "reaction")]
    event_term: String,
}

/// Read adverse-event rows. Rows with a blank case id or event term are
/// skipped and counted.
pub fn read_event_records(path: &Path, options: IngestOptions) -> Result<Ingested<EventRecord>> {
    let mut reader = open(path, options)?;
    require_any(path, &mut reader, &["case_id", "primaryid", "caseid"])?;
    require_any(path, &mut reader, &["event_term", "pt", "reaction"])?;

    let mut ingested = Ingested::new();
    for row in reader.deserialize::<EventRow>() {
        let row = row.map_err(|err| IngestError::csv(path, &err))?;
        let case_id = first_non_blank([row.case_id, row.primaryid, row.caseid]);
        let Ok(case_id) = CaseId::new(case_id) else {
            ingested.skipped += 1;
            continue;
        };
        if row.event_term.is_empty() {
            ingested.skipped += 1;
            continue;
        }
        ingested.records.push(EventRecord {
            case_id,
            event_term: row.event_term,
        });
    }
    info!(
        path = %path.display(),
        records = ingested.records.len(),
        skipped = ingested.skipped,
        "read event records"
    );
    Ok(ingested)
}
