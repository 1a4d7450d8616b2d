//! Drug record reader.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use pv_model::{CaseId, DrugRole, RawDrugRecord, RecordId};

use crate::error::{IngestError, Result};
use crate::reader::{IngestOptions, Ingested, first_non_blank, open, require_any};

const CASE_ALIASES: [&str; 3] = ["case_id", "primaryid", "caseid"];
const NAME_ALIASES: [&str; 3] = ["raw_drug_name", "drug_name", "drugname"];

#[derive(Debug, Deserialize)]
struct DrugRow {
    #[serde(default)]
    record_id: String,
    #[serde(default)]
    case_id: String,
    #[serde(default)]
    primaryid: String,
    #[serde(default)]
    caseid: String,
    #[serde(default, alias = "drug_seq")]
    sequence_no: String,
    #[serde(default, alias = "role_cod")]
    role: String,
    #[serde(default, alias = "quarter")]
    period: String,
    #[serde(default, alias = "drug_name", alias = "drugname")]
    raw_drug_name: String,
    #[serde(default, alias = "active_ingredient", alias = "prod_ai")]
    raw_active_ingredient: String,
    #[serde(default, alias = "nda_num")]
    application_number: String,
}

/// Read drug records from a headered delimited file.
///
/// Blank case ids and duplicate record ids drop the row. A missing record id
/// is synthesised as `<case_id>-<sequence_no>`; a missing or unparsable
/// sequence number falls back to the row's ordinal within its case.
pub fn read_drug_records(path: &Path, options: IngestOptions) -> Result<Ingested<RawDrugRecord>> {
    let mut reader = open(path, options)?;
    require_any(path, &mut reader, &CASE_ALIASES)?;
    require_any(path, &mut reader, &NAME_ALIASES)?;

    let mut ingested = Ingested::new();
    let mut seen = HashSet::new();
    let mut per_case: HashMap<String, u32> = HashMap::new();
    for row in reader.deserialize::<DrugRow>() {
        let row = row.map_err(|err| IngestError::csv(path, &err))?;
        let case_id = first_non_blank([row.case_id, row.primaryid, row.caseid]);
        let Ok(case_id) = CaseId::new(case_id) else {
            ingested.skipped += 1;
            continue;
        };
        let ordinal = per_case.entry(case_id.as_str().to_string()).or_insert(0);
        *ordinal += 1;
        let sequence_no = match row.sequence_no.parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                ingested.repaired += 1;
                *ordinal
            }
        };
        let record_id = if row.record_id.is_empty() {
            format!("{case_id}-{sequence_no}")
        } else {
            row.record_id
        };
        let Ok(record_id) = RecordId::new(record_id) else {
            ingested.skipped += 1;
            continue;
        };
        if !seen.insert(record_id.clone()) {
            ingested.skipped += 1;
            continue;
        }
        ingested.records.push(RawDrugRecord {
            record_id,
            case_id,
            sequence_no,
            role: DrugRole::parse(&row.role),
            period: row.period,
            raw_drug_name: row.raw_drug_name,
            raw_active_ingredient: row.raw_active_ingredient,
            application_number: Some(row.application_number).filter(|value| !value.is_empty()),
        });
    }

    info!(
        path = %path.display(),
        records = ingested.records.len(),
        skipped = ingested.skipped,
        repaired = ingested.repaired,
        "read drug records"
    );
    if ingested.skipped > 0 {
        warn!(path = %path.display(), skipped = ingested.skipped, "dropped drug rows");
    }
    Ok(ingested)
}
