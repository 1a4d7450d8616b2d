//! Reader for a previously written resolution table, used to resume a run.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use pv_model::{
    AUDIT_NOTE_SEPARATOR, AtomId, ConceptId, ProvenanceCode, RecordId, ResolvedDrugMapping,
    TermType,
};

use crate::error::{IngestError, Result};
use crate::reader::{IngestOptions, open, require_any};

#[derive(Debug, Deserialize)]
struct MappingRow {
    record_id: String,
    #[serde(default)]
    source_atom_id: String,
    #[serde(default)]
    resolved_concept_id: String,
    #[serde(default)]
    resolved_atom_id: String,
    #[serde(default)]
    resolved_string: String,
    #[serde(default)]
    resolved_source_vocabulary: String,
    #[serde(default)]
    resolved_term_type: String,
    #[serde(default)]
    provenance_code: String,
    #[serde(default)]
    audit_notes: String,
}

fn non_blank(value: String) -> Option<String> {
    Some(value).filter(|value| !value.is_empty())
}

/// Read `resolved_drug_mapping.csv` as written by a previous run.
///
/// A row naming an unknown provenance code is an error: the table can no
/// longer be trusted to seed the working set.
pub fn read_resolved_mappings(path: &Path) -> Result<Vec<ResolvedDrugMapping>> {
    let mut reader = open(path, IngestOptions::default())?;
    require_any(path, &mut reader, &["record_id"])?;

    let mut rows = Vec::new();
    for (idx, row) in reader.deserialize::<MappingRow>().enumerate() {
        let row = row.map_err(|err| IngestError::csv(path, &err))?;
        let line = idx as u64 + 2;
        let invalid = |message: String| IngestError::InvalidValue {
            path: path.to_path_buf(),
            line,
            message,
        };
        let record_id = RecordId::new(row.record_id).map_err(|err| invalid(err.to_string()))?;
        let provenance_code = non_blank(row.provenance_code)
            .map(|code| code.parse::<ProvenanceCode>())
            .transpose()
            .map_err(|err| invalid(err.to_string()))?;
        let audit_notes = non_blank(row.audit_notes)
            .map(|notes| {
                notes
                    .split(AUDIT_NOTE_SEPARATOR)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        rows.push(ResolvedDrugMapping {
            record_id,
            source_atom_id: AtomId::new(row.source_atom_id).ok(),
            resolved_concept_id: ConceptId::new(row.resolved_concept_id).ok(),
            resolved_atom_id: AtomId::new(row.resolved_atom_id).ok(),
            resolved_string: non_blank(row.resolved_string),
            resolved_source_vocabulary: non_blank(row.resolved_source_vocabulary),
            resolved_term_type: non_blank(row.resolved_term_type).map(|tty| TermType::parse(&tty)),
            provenance_code,
            audit_notes,
        });
    }
    info!(path = %path.display(), rows = rows.len(), "read saved resolution table");
    Ok(rows)
}
