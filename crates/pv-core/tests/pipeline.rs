//! Tests for the stage driver.

use pv_core::{
    LogKind, PipelineContext, PipelineError, PipelineState, Stage, StageError,
    build_default_pipeline, build_resolution_pipeline,
};
use pv_model::{
    AtomId, Concept, ConceptId, EventRecord, ManualOverrideEntry, PipelineOptions,
    ProvenanceCode, RawDrugRecord, RelationEdge, RelationType, TermType, TerminologyIndex,
};

fn atom(concept: &str, atom: &str, name: &str, vocabulary: &str, tty: &str) -> Concept {
    Concept {
        concept_id: ConceptId::new(concept).unwrap(),
        atom_id: AtomId::new(atom).unwrap(),
        display_string: name.to_string(),
        source_vocabulary: vocabulary.to_string(),
        term_type: TermType::parse(tty),
        code: String::new(),
    }
}

fn index() -> TerminologyIndex {
    TerminologyIndex::new(
        vec![
            atom("1191", "A100", "aspirin", "RXNORM", "IN"),
            atom("83367", "A400", "atorvastatin", "RXNORM", "IN"),
            atom("153165", "A500", "Lipitor", "RXNORM", "BN"),
        ],
        vec![RelationEdge {
            from_concept: ConceptId::new("153165").unwrap(),
            to_concept: ConceptId::new("83367").unwrap(),
            relation_type: RelationType::TradenameOf,
            source_vocabulary: "RXNORM".to_string(),
        }],
    )
}

fn records() -> Vec<RawDrugRecord> {
    [
        ("1", "C1", "Aspirin"),
        ("2", "C2", "ASPIRIN (BUFFERED) TAB"),
        ("3", "C3", "Lipitor"),
        ("4", "C4", "lipitor 10 mg"),
        ("5", "C5", "aspirin"),
        ("6", "C5", "Mystery tonic"),
    ]
    .into_iter()
    .map(|(id, case, name)| RawDrugRecord::named(id, case, name).unwrap())
    .collect()
}

fn events() -> Vec<EventRecord> {
    [
        ("C1", "Nausea"),
        ("C2", "Rash"),
        ("C3", "Nausea"),
        ("C4", "Rash"),
        ("C5", "nausea"),
    ]
    .into_iter()
    .map(|(case, term)| EventRecord::new(case, term).unwrap())
    .collect()
}

struct FailingStage {
    best_effort: bool,
}

impl Stage for FailingStage {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn best_effort(&self) -> bool {
        self.best_effort
    }

    fn run<'a>(
        &self,
        _ctx: &PipelineContext<'a>,
        _state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        Err(StageError::execution("boom"))
    }
}

#[test]
fn default_pipeline_has_fixed_stage_order() {
    insta::assert_debug_snapshot!(build_default_pipeline().stage_names(), @r#"
    [
        "normalize",
        "resume",
        "direct-ingredient",
        "direct-any-vocabulary-ingredient",
        "direct-preferred-vocabulary",
        "cross-reference",
        "graph-ingredient",
        "graph-active-moiety",
        "consolidate",
        "concept-id-fallback",
        "curation-queue",
        "manual-override",
        "finalize",
        "contingency",
        "statistics",
    ]
    "#);
    let resolution = build_resolution_pipeline().stage_names();
    assert_eq!(resolution.last(), Some(&"finalize"));
}

#[test]
fn missing_terminology_or_records_is_fatal() {
    let options = PipelineOptions::default();
    let empty = TerminologyIndex::default();
    let records = records();
    assert_eq!(
        PipelineContext::new(&empty, &records, &options).unwrap_err(),
        PipelineError::MissingTerminology
    );
    let index = index();
    assert_eq!(
        PipelineContext::new(&index, &[], &options).unwrap_err(),
        PipelineError::MissingDrugRecords
    );
}

#[test]
fn stages_without_inputs_are_skipped() {
    let options = PipelineOptions::default();
    let index = index();
    let records = records();
    let ctx = PipelineContext::new(&index, &records, &options).unwrap();
    let run = build_default_pipeline().run(&ctx);

    assert!(run.is_complete());
    let log = &run.state.log;
    for stage in [
        "resume",
        "cross-reference",
        "manual-override",
        "contingency",
        "statistics",
    ] {
        assert_eq!(log.kind_of(stage), Some(LogKind::Skipped), "{stage}");
    }
    assert_eq!(log.rows_for("normalize"), Some(6));
    assert_eq!(log.rows_for("direct-ingredient"), Some(3));
    assert_eq!(log.rows_for("direct-preferred-vocabulary"), Some(2));
    assert_eq!(log.rows_for("consolidate"), Some(2));
    assert_eq!(log.rows_for("finalize"), Some(5));

    let mappings = run.state.mappings.as_ref().unwrap();
    assert_eq!(mappings.len(), 6);
    assert!(run.state.scores.is_none());
}

#[test]
fn full_run_scores_every_eligible_table() {
    let options = PipelineOptions::default();
    let index = index();
    let records = records();
    let events = events();
    let ctx = PipelineContext::new(&index, &records, &options)
        .unwrap()
        .with_events(&events);
    let run = build_default_pipeline().run(&ctx);

    assert!(run.is_complete());
    let cells = run.state.cells.as_ref().unwrap();
    assert_eq!(cells.len(), 4);
    assert!(cells.iter().all(|cell| cell.total() == 5));
    let aspirin_nausea = cells
        .iter()
        .find(|cell| cell.concept_id.as_str() == "1191" && cell.event_id.as_str() == "NAUSEA")
        .unwrap();
    assert_eq!(
        (aspirin_nausea.a, aspirin_nausea.b, aspirin_nausea.c, aspirin_nausea.d),
        (2, 1, 1, 1)
    );
    assert_eq!(run.state.scores.as_ref().unwrap().len(), 4);
    assert_eq!(run.state.log.rows_for("statistics"), Some(4));
}

#[test]
fn execution_error_halts_and_keeps_completed_output() {
    let options = PipelineOptions::default();
    let index = index();
    let records = records();
    let events = events();
    let ctx = PipelineContext::new(&index, &records, &options)
        .unwrap()
        .with_events(&events);
    let pipeline = build_default_pipeline();
    let after_finalize = pipeline
        .stage_names()
        .iter()
        .position(|name| *name == "finalize")
        .unwrap()
        + 1;
    let pipeline =
        pipeline.insert_stage(after_finalize, Box::new(FailingStage { best_effort: false }));
    let run = pipeline.run(&ctx);

    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.stage, "failing");
    assert!(matches!(
        run.error(),
        Some(PipelineError::StageFailed { ref stage, .. }) if stage == "failing"
    ));
    assert_eq!(run.state.log.kind_of("failing"), Some(LogKind::Error));
    assert!(run.state.mappings.is_some());
    assert!(run.working_mappings.is_none());
    assert!(run.state.cells.is_none());
    assert!(!run.state.completed.contains(&"contingency"));
}

#[test]
fn halt_before_finalize_snapshots_the_working_table() {
    let options = PipelineOptions::default();
    let index = index();
    let records = records();
    let ctx = PipelineContext::new(&index, &records, &options).unwrap();
    let pipeline = build_default_pipeline();
    let consolidate = pipeline
        .stage_names()
        .iter()
        .position(|name| *name == "consolidate")
        .unwrap();
    let run = pipeline
        .insert_stage(consolidate, Box::new(FailingStage { best_effort: false }))
        .run(&ctx);

    assert_eq!(run.failure.as_ref().unwrap().stage, "failing");
    assert!(run.state.mappings.is_none());
    assert!(!run.state.completed.contains(&"consolidate"));

    let snapshot = run.mappings().unwrap();
    assert_eq!(snapshot.len(), records.len());
    let concepts: Vec<Option<&str>> = snapshot
        .iter()
        .map(|row| row.resolved_concept_id.as_ref().map(ConceptId::as_str))
        .collect();
    assert_eq!(
        concepts,
        vec![
            Some("1191"),
            Some("1191"),
            Some("153165"),
            Some("153165"),
            Some("1191"),
            None,
        ]
    );
}

#[test]
fn best_effort_errors_are_swallowed() {
    let options = PipelineOptions::default();
    let index = index();
    let records = records();
    let events = events();
    let ctx = PipelineContext::new(&index, &records, &options)
        .unwrap()
        .with_events(&events);
    let run = build_default_pipeline()
        .insert_stage(1, Box::new(FailingStage { best_effort: true }))
        .run(&ctx);

    assert!(run.is_complete());
    assert_eq!(run.state.log.errors().count(), 1);
    assert!(run.state.scores.is_some());
}

#[test]
fn resumed_run_keeps_earlier_resolutions() {
    let options = PipelineOptions::default();
    let index = index();
    let records = records();
    let ctx = PipelineContext::new(&index, &records, &options).unwrap();
    let first = build_resolution_pipeline().run(&ctx);
    let saved = first.state.mappings.clone().unwrap();

    let ctx = ctx.with_saved_mappings(&saved);
    let second = build_resolution_pipeline().run(&ctx);
    assert_eq!(second.state.log.rows_for("resume"), Some(5));
    assert_eq!(second.state.log.rows_for("direct-ingredient"), Some(0));
    assert_eq!(second.state.mappings.as_ref().unwrap(), &saved);
}

#[test]
fn manual_overrides_resolve_leftovers() {
    let options = PipelineOptions::default();
    let index = index();
    let records = records();
    let overrides = vec![ManualOverrideEntry {
        source_string: "MYSTERY TONIC".to_string(),
        source_vocabulary: String::new(),
        source_term_type: String::new(),
        final_concept_id: ConceptId::new("1191").unwrap(),
    }];
    let ctx = PipelineContext::new(&index, &records, &options)
        .unwrap()
        .with_overrides(&overrides);
    let run = build_resolution_pipeline().run(&ctx);
    assert_eq!(run.state.log.rows_for("manual-override"), Some(1));
    let row = run
        .state
        .mappings
        .as_ref()
        .unwrap()
        .iter()
        .find(|row| row.record_id.as_str() == "6")
        .unwrap();
    assert_eq!(row.provenance_code, Some(ProvenanceCode::ManualOverride));
}

#[test]
fn duplicate_record_ids_are_a_data_quality_warning() {
    let options = PipelineOptions::default();
    let index = index();
    let mut records = records();
    records.push(RawDrugRecord::named("1", "C1", "Aspirin").unwrap());
    let ctx = PipelineContext::new(&index, &records, &options).unwrap();
    let run = build_resolution_pipeline().run(&ctx);
    assert!(run.is_complete());
    assert!(
        run.state
            .log
            .entries()
            .iter()
            .any(|entry| entry.stage == "normalize" && entry.kind == LogKind::Warning)
    );
    assert!(run.state.completed.contains(&"normalize"));
}
