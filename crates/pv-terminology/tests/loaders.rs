#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use pv_model::{ConceptId, RelationType, TermType};
use pv_terminology::{
    TerminologyError, load_concepts, load_cross_reference_index, load_manual_overrides,
    load_relations, load_terminology,
};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_rrf_concepts_and_relations() {
    let dir = TempDir::new().unwrap();
    let conso = write(
        &dir,
        "RXNCONSO.RRF",
        "1191|ENG||L1|PF|S1|Y|100||||RXNORM|IN|1191|aspirin||N|4096|\n\
         1191|ENG||L2|PF|S2|Y|101||||MTHSPL|SU|R16CO5Y76E|ASPIRIN||N||\n\
         1191|ENG||L3|PF|S3|Y|102||||RXNORM|SY|1191|acetylsalicylic acid||O||\n\
         1191|GER||L4|PF|S4|Y|103||||MSHGER|MH|D001241|Acetylsalicylsaeure||N||\n\
         315431|ENG||L5|PF|S5|Y|200||||RXNORM|SCDC|315431|aspirin 81 MG||N||\n",
    );
    let rel = write(
        &dir,
        "RXNREL.RRF",
        "1191|||RO|315431|||ingredient_of|R1||RXNORM|RXNORM||||N||\n\
         ||100|SY||101||||R2||RXNORM|RXNORM||||N||\n",
    );

    let atoms = load_concepts(&conso).unwrap();
    assert_eq!(atoms.items.len(), 3);
    assert_eq!(atoms.skipped, 2);

    let edges = load_relations(&rel).unwrap();
    assert_eq!(edges.items.len(), 1);
    assert_eq!(edges.skipped, 1);
    assert_eq!(edges.items[0].from_concept.as_str(), "315431");

    let index = load_terminology(&conso, Some(&rel)).unwrap();
    assert_eq!(index.atom_count(), 3);
    assert_eq!(index.concept_count(), 2);
    let from = ConceptId::new("315431").unwrap();
    assert_eq!(index.outgoing(&from, &RelationType::INGREDIENT).count(), 1);
}

#[test]
fn loads_headered_csv_concepts() {
    let dir = TempDir::new().unwrap();
    let concepts = write(
        &dir,
        "concepts.csv",
        "\u{feff}concept_id,atom_id,display_string,source_vocabulary,term_type,code\n\
         1191,100,aspirin,RXNORM,IN,1191\n\
         ,101,orphan,RXNORM,IN,\n",
    );
    let atoms = load_concepts(&concepts).unwrap();
    assert_eq!(atoms.items.len(), 1);
    assert_eq!(atoms.skipped, 1);
    assert_eq!(atoms.items[0].term_type, TermType::Ingredient);
}

#[test]
fn missing_columns_are_reported() {
    let dir = TempDir::new().unwrap();
    let concepts = write(&dir, "concepts.csv", "concept_id,name\n1,aspirin\n");
    let err = load_concepts(&concepts).unwrap_err();
    let err = err.downcast_ref::<TerminologyError>().unwrap();
    assert!(matches!(err, TerminologyError::MissingColumn { column, .. } if column == "atom_id"));
}

#[test]
fn empty_terminology_is_fatal() {
    let dir = TempDir::new().unwrap();
    let concepts = write(
        &dir,
        "concepts.csv",
        "concept_id,atom_id,display_string,source_vocabulary,term_type\n",
    );
    assert!(load_terminology(&concepts, None).is_err());
    assert!(load_terminology(&dir.path().join("missing.csv"), None).is_err());
}

#[test]
fn loads_cross_references_and_overrides() {
    let dir = TempDir::new().unwrap();
    let xref = write(
        &dir,
        "xref.csv",
        "external_key,display_string,atom_id\nNDA020998,CELEBREX,900\n,,901\n",
    );
    let index = load_cross_reference_index(&xref).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.by_application_number("20998").count(), 1);

    let overrides = write(
        &dir,
        "overrides.csv",
        "source_string,source_vocabulary,source_term_type,final_concept_id\n\
         MYSTERY TONIC,,,5640\n\
         ,,,5640\n",
    );
    let loaded = load_manual_overrides(&overrides).unwrap();
    assert_eq!(loaded.items.len(), 1);
    assert_eq!(loaded.skipped, 1);
    assert_eq!(loaded.items[0].final_concept_id.as_str(), "5640");
}
