use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use tracing::{info, info_span, trace};

use pv_cli::config::{OptionOverrides, load_options};
use pv_cli::inputs::{InputPaths, PipelineInputs};
use pv_cli::logging::redact_value;
use pv_core::{Pipeline, PipelineRun, build_default_pipeline, build_resolution_pipeline};
use pv_ingest::IngestOptions;
use pv_model::SignalScore;
use pv_report::{ReportOutputs, write_outputs};
use pv_resolve::StringNormalizer;

use crate::cli::{InputArgs, NormalizeArgs, ResolveArgs, RunArgs};
use crate::summary::apply_table_style;
use crate::types::{RunResult, StageSummary};

pub fn run_pipeline(args: &RunArgs) -> Result<RunResult> {
    let overrides = OptionOverrides {
        roles: args.roles.clone(),
        periods: args.periods.clone(),
        min_cooccurrence: args.min_cooccurrence,
        ..input_overrides(&args.inputs)
    };
    execute(
        &args.inputs,
        Some(args.events.as_path()),
        overrides,
        &build_default_pipeline(),
        args.top,
    )
}

pub fn run_resolve(args: &ResolveArgs) -> Result<RunResult> {
    execute(
        &args.inputs,
        None,
        input_overrides(&args.inputs),
        &build_resolution_pipeline(),
        0,
    )
}

pub fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    let mut options = load_options(args.config.as_deref())?;
    OptionOverrides {
        max_clean_rounds: args.max_rounds,
        ..OptionOverrides::default()
    }
    .apply(&mut options);
    let normalizer = StringNormalizer::from_options(&options.resolution);

    let mut table = Table::new();
    table.set_header(vec!["Input", "Cleaned", "Candidates"]);
    apply_table_style(&mut table);
    for name in &args.names {
        let candidates = normalizer.candidates(name);
        trace!(raw = redact_value(name), candidates = candidates.len(), "normalized");
        table.add_row(vec![
            name.clone(),
            normalizer.clean(name),
            candidates.join("\n"),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn input_overrides(inputs: &InputArgs) -> OptionOverrides {
    OptionOverrides {
        preferred_vocabulary: inputs.preferred_vocabulary.clone(),
        curation_threshold: inputs.curation_threshold,
        ..OptionOverrides::default()
    }
}

fn ingest_options(delimiter: char) -> Result<IngestOptions> {
    match u8::try_from(delimiter) {
        Ok(byte) if byte.is_ascii() => Ok(IngestOptions::default().with_delimiter(byte)),
        _ => bail!("delimiter must be a single ASCII character, got {delimiter:?}"),
    }
}

fn execute(
    inputs: &InputArgs,
    events: Option<&Path>,
    overrides: OptionOverrides,
    pipeline: &Pipeline,
    top: usize,
) -> Result<RunResult> {
    let mut options = load_options(inputs.config.as_deref())?;
    overrides.apply(&mut options);
    let ingest = ingest_options(inputs.delimiter)?;

    let paths = InputPaths {
        drugs: inputs.drugs.clone(),
        concepts: inputs.concepts.clone(),
        relations: inputs.relations.clone(),
        events: events.map(Path::to_path_buf),
        xref: inputs.xref.clone(),
        overrides: inputs.overrides.clone(),
        resume: inputs.resume.clone(),
    };
    let loaded = PipelineInputs::load(&paths, ingest)?;
    let ctx = loaded.context(&options)?;

    let run_span = info_span!("run", output_dir = %inputs.output_dir.display());
    let _run_guard = run_span.enter();
    let start = Instant::now();
    let run = pipeline.run(&ctx);
    info!(
        duration_ms = start.elapsed().as_millis(),
        complete = run.is_complete(),
        "pipeline finished"
    );
    if let Some(queue) = run.state.curation_queue.as_deref() {
        for entry in queue {
            trace!(
                source = redact_value(&entry.source_string),
                vocabulary = %entry.source_vocabulary,
                term_type = %entry.source_term_type,
                occurrences = entry.occurrences,
                "queued for curation"
            );
        }
    }

    let written = write_outputs(&inputs.output_dir, &ReportOutputs::from_run(&run))
        .context("write outputs")?;
    Ok(RunResult {
        output_dir: inputs.output_dir.clone(),
        written: written.paths,
        ..summarize(&run, pipeline, ctx.records.len(), top)
    })
}

/// Run result without the output locations.
fn summarize(run: &PipelineRun<'_>, pipeline: &Pipeline, records: usize, top: usize) -> RunResult {
    let state = &run.state;
    let stages = pipeline
        .stage_names()
        .into_iter()
        .map(|name| StageSummary::from_log(name, &state.log))
        .collect();

    let mut provenance = BTreeMap::new();
    let mut resolved = 0usize;
    for row in run.mappings().into_iter().flatten() {
        if let Some(code) = row.provenance_code {
            *provenance.entry(code).or_insert(0) += 1;
        }
        if row.is_resolved() {
            resolved += 1;
        }
    }

    RunResult {
        output_dir: PathBuf::new(),
        written: Vec::new(),
        stages,
        records,
        resolved,
        provenance,
        curation_queue: state.curation_queue.as_ref().map(Vec::len),
        cells: state.cells.as_ref().map(Vec::len),
        scores: state.scores.as_ref().map(Vec::len),
        top_signals: top_signals(state.scores.as_deref().unwrap_or_default(), top),
        failure: run
            .failure
            .as_ref()
            .map(|failure| format!("{}: {}", failure.stage, failure.error)),
        has_errors: !run.is_complete(),
    }
}

/// Pairs meeting the screening criterion, strongest lower IC bound first.
fn top_signals(scores: &[SignalScore], limit: usize) -> Vec<SignalScore> {
    let mut signals: Vec<&SignalScore> = scores.iter().filter(|score| score.is_signal()).collect();
    signals.sort_by(|left, right| {
        right
            .ic_ci_low
            .total_cmp(&left.ic_ci_low)
            .then_with(|| left.concept_id.cmp(&right.concept_id))
            .then_with(|| left.event_id.cmp(&right.event_id))
    });
    signals.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_model::{ConceptId, EventId};

    fn score(concept: &str, event: &str, ic_ci_low: f64) -> SignalScore {
        SignalScore {
            concept_id: ConceptId::new(concept).unwrap(),
            event_id: EventId::new(event).unwrap(),
            a: 3,
            expected_count: 1.0,
            prr: 2.0,
            prr_ci_low: 1.0,
            prr_ci_high: 4.0,
            chi_squared_yates: 1.5,
            ror: 2.5,
            ror_ci_low: 1.0,
            ror_ci_high: 5.0,
            ic: 1.0,
            ic_ci_low,
            ic_ci_high: 2.0,
        }
    }

    #[test]
    fn top_signals_rank_by_lower_ic_bound() {
        let scores = vec![
            score("1191", "NAUSEA", 0.2),
            score("83367", "RASH", -0.4),
            score("1191", "RASH", 0.9),
            score("36567", "MYALGIA", 0.2),
        ];
        let top: Vec<(String, String)> = top_signals(&scores, 2)
            .into_iter()
            .map(|score| (score.concept_id.to_string(), score.event_id.to_string()))
            .collect();
        assert_eq!(
            top,
            vec![
                ("1191".to_string(), "RASH".to_string()),
                ("1191".to_string(), "NAUSEA".to_string()),
            ]
        );
        assert_eq!(top_signals(&scores, 10).len(), 3);
    }

    #[test]
    fn delimiter_must_be_ascii() {
        assert_eq!(ingest_options('$').unwrap(), IngestOptions::faers());
        assert!(ingest_options('§').is_err());
    }
}
