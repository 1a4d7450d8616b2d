use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use pv_ingest::{
    IngestError, IngestOptions, read_drug_records, read_event_records, read_resolved_mappings,
};
use pv_model::{DrugRole, ProvenanceCode};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn reads_faers_drug_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "DRUG19Q3.txt",
        "primaryid$caseid$drug_seq$role_cod$drugname$prod_ai$nda_num\n\
         1001$10$1$PS$ASPIRIN (BUFFERED) TAB$ASPIRIN$NDA020998\n\
         1001$10$2$C$LIPITOR$ATORVASTATIN CALCIUM$\n\
         1001$10$2$C$LIPITOR$ATORVASTATIN CALCIUM$\n\
         $$1$PS$ORPHAN$$\n",
    );
    let ingested = read_drug_records(&path, IngestOptions::faers()).expect("read drugs");
    assert_eq!(ingested.records.len(), 2);
    assert_eq!(ingested.skipped, 1);

    let first = &ingested.records[0];
    assert_eq!(first.record_id.as_str(), "1001-1");
    assert_eq!(first.case_id.as_str(), "1001");
    assert_eq!(first.role, DrugRole::PrimarySuspect);
    assert_eq!(first.raw_drug_name, "ASPIRIN (BUFFERED) TAB");
    assert_eq!(first.raw_active_ingredient, "ASPIRIN");
    assert_eq!(first.application_number.as_deref(), Some("NDA020998"));
    assert!(ingested.records[1].application_number.is_none());
}

#[test]
fn caseid_is_used_when_primaryid_is_blank() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "drugs.csv",
        "PrimaryID,CaseID,DrugName\n,77,aspirin\n,77,warfarin\n",
    );
    let ingested = read_drug_records(&path, IngestOptions::default()).expect("read drugs");
    assert_eq!(ingested.records.len(), 2);
    assert_eq!(ingested.repaired, 2);
    assert_eq!(ingested.records[0].record_id.as_str(), "77-1");
    assert_eq!(ingested.records[1].record_id.as_str(), "77-2");
}

#[test]
fn missing_drug_name_column_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "drugs.csv", "case_id,role\n1,PS\n");
    let err = read_drug_records(&path, IngestOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::MissingColumn { column, .. } if column == "raw_drug_name"));
}

#[test]
fn reads_event_rows() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "REAC19Q3.txt",
        "primaryid$caseid$pt$drug_rec_act\n1001$10$Nausea$\n1001$10$$\n1002$11$Headache$\n",
    );
    let ingested = read_event_records(&path, IngestOptions::faers()).expect("read events");
    assert_eq!(ingested.records.len(), 2);
    assert_eq!(ingested.skipped, 1);
    assert_eq!(
        ingested.records[0].event_id().unwrap().as_str(),
        "NAUSEA"
    );
}

#[test]
fn reads_saved_mapping_table() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "resolved_drug_mapping.csv",
        "record_id,source_atom_id,resolved_concept_id,resolved_atom_id,resolved_string,\
         resolved_source_vocabulary,resolved_term_type,provenance_code,audit_notes\n\
         R1,100,1191,100,aspirin,RXNORM,IN,direct-match-ingredient,\n\
         R2,,,,,,,,\n\
         R3,300,1191,100,aspirin,RXNORM,IN,graph-ingredient,consolidated from 300 | checked\n",
    );
    let rows = read_resolved_mappings(&path).expect("read mappings");
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0].provenance_code,
        Some(ProvenanceCode::DirectMatchIngredient)
    );
    assert!(!rows[1].is_resolved());
    assert_eq!(rows[2].audit_notes, vec!["consolidated from 300", "checked"]);
}

#[test]
fn unknown_provenance_in_saved_table_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "resolved_drug_mapping.csv",
        "record_id,resolved_concept_id,provenance_code\nR1,1191,guesswork\n",
    );
    let err = read_resolved_mappings(&path).unwrap_err();
    assert!(matches!(err, IngestError::InvalidValue { line: 2, .. }));
}
