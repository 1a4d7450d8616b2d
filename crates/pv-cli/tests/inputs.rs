//! Loading inputs from disk and running them end to end.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use pv_cli::config::load_options;
use pv_cli::inputs::{InputPaths, PipelineInputs};
use pv_core::{LogKind, build_default_pipeline, build_resolution_pipeline};
use pv_ingest::IngestOptions;
use pv_model::PipelineOptions;
use pv_report::{MAPPING_FILE, ReportOutputs, SIGNAL_SCORES_FILE, write_outputs};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

fn fixture(dir: &TempDir) -> InputPaths {
    InputPaths {
        concepts: write(
            dir,
            "concepts.csv",
            "concept_id,atom_id,display_string,source_vocabulary,term_type,code\n\
             1191,A100,aspirin,RXNORM,IN,1191\n\
             83367,A400,atorvastatin,RXNORM,IN,83367\n\
             153165,A500,Lipitor,RXNORM,BN,153165\n",
        ),
        relations: Some(write(
            dir,
            "relations.csv",
            "from_concept,to_concept,relation_type,source_vocabulary\n\
             153165,83367,tradename_of,RXNORM\n",
        )),
        drugs: write(
            dir,
            "drugs.csv",
            "record_id,case_id,drug_name\n\
             1,C1,Aspirin\n\
             2,C2,ASPIRIN (BUFFERED) TAB\n\
             3,C3,Lipitor\n\
             4,C4,lipitor 10 mg\n\
             5,C5,aspirin\n\
             6,C5,Mystery tonic\n",
        ),
        events: Some(write(
            dir,
            "events.csv",
            "case_id,event_term\nC1,Nausea\nC2,Rash\nC3,Nausea\nC4,Rash\nC5,nausea\n",
        )),
        ..InputPaths::default()
    }
}

#[test]
fn loads_inputs_and_writes_every_table() {
    let dir = TempDir::new().unwrap();
    let paths = fixture(&dir);
    let inputs = PipelineInputs::load(&paths, IngestOptions::default()).unwrap();
    assert_eq!(inputs.records.len(), 6);
    assert_eq!(inputs.events.len(), 5);
    assert!(inputs.xref.is_none());

    let options = PipelineOptions::default();
    let ctx = inputs.context(&options).unwrap();
    let run = build_default_pipeline().run(&ctx);
    assert!(run.is_complete());
    assert_eq!(run.state.cells.as_ref().map(Vec::len), Some(4));

    let out = dir.path().join("out");
    let written = write_outputs(&out, &ReportOutputs::from_run(&run)).unwrap();
    assert_eq!(written.paths.len(), 5);
    let mapping = fs::read_to_string(out.join(MAPPING_FILE)).unwrap();
    assert_eq!(mapping.lines().count(), 7);
    assert!(out.join(SIGNAL_SCORES_FILE).exists());
}

#[test]
fn resume_seeds_from_written_mappings() {
    let dir = TempDir::new().unwrap();
    let mut paths = fixture(&dir);
    let options = PipelineOptions::default();

    let first = PipelineInputs::load(&paths, IngestOptions::default()).unwrap();
    let ctx = first.context(&options).unwrap();
    let run = build_resolution_pipeline().run(&ctx);
    let out = dir.path().join("first");
    write_outputs(&out, &ReportOutputs::from_run(&run)).unwrap();

    paths.resume = Some(out.join(MAPPING_FILE));
    let second = PipelineInputs::load(&paths, IngestOptions::default()).unwrap();
    assert_eq!(second.saved_mappings.len(), 6);
    let ctx = second.context(&options).unwrap();
    let rerun = build_resolution_pipeline().run(&ctx);
    assert_eq!(rerun.state.log.kind_of("resume"), Some(LogKind::RowsAffected));
    assert_eq!(rerun.state.mappings, run.state.mappings);
}

#[test]
fn missing_required_files_are_fatal() {
    let dir = TempDir::new().unwrap();
    let mut paths = fixture(&dir);
    paths.concepts = dir.path().join("missing.csv");
    assert!(PipelineInputs::load(&paths, IngestOptions::default()).is_err());

    let mut paths = fixture(&dir);
    paths.drugs = write(&dir, "empty.csv", "record_id,case_id,drug_name\n");
    let inputs = PipelineInputs::load(&paths, IngestOptions::default()).unwrap();
    let options = PipelineOptions::default();
    assert!(inputs.context(&options).is_err());
}

#[test]
fn config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "pipeline.toml",
        "[resolution]\ncuration_threshold = 25\n\n[signal]\nmin_cooccurrence = 2\n",
    );
    let options = load_options(Some(&path)).unwrap();
    assert_eq!(options.resolution.curation_threshold, 25);
    assert_eq!(options.signal.min_cooccurrence, 2);
    assert!(load_options(Some(&dir.path().join("absent.toml"))).is_err());
}
