//! The standard pipeline stages.

use std::collections::HashSet;

use tracing::debug;

use pv_resolve::{MatchRule, ResolutionEngine};
use pv_signal::{ContingencyAggregator, SignalStatistics, count_cooccurrences};

use crate::context::PipelineContext;
use crate::error::StageError;
use crate::pipeline::{Artifact, PipelineState, Stage};

/// Cleans every record once and builds the working table of placeholders.
pub struct NormalizeStage;

impl Stage for NormalizeStage {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn run<'a>(
        &self,
        ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let engine = ResolutionEngine::new(ctx.resolution_context(), ctx.records);
        let table = engine.new_table();
        let blank = table
            .pending_ids()
            .iter()
            .filter_map(|record_id| engine.prepared(record_id))
            .filter(|record| record.name_candidates.is_empty())
            .count();
        let duplicates = ctx.records.len() - table.len();
        let records = table.len();
        state.engine = Some(engine);
        state.table = Some(table);

        if blank > 0 {
            state
                .log
                .info(self.name(), format!("{blank} records have a blank drug name"));
        }
        if duplicates > 0 {
            return Err(StageError::DataQuality(format!(
                "{duplicates} records share a record id with an earlier record"
            )));
        }
        Ok(records)
    }
}

/// Seeds pending records with the rows of an earlier mapping file.
pub struct ResumeStage;

impl Stage for ResumeStage {
    fn name(&self) -> &'static str {
        "resume"
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::SavedMappings, Artifact::ResolutionTable]
    }

    fn run<'a>(
        &self,
        ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let (_, table) = state.resolution()?;
        Ok(table.seed(ctx.saved_mappings.iter().cloned()))
    }
}

/// Applies one matching rule to the pending records.
pub struct RuleStage {
    rule: Box<dyn MatchRule>,
}

impl RuleStage {
    pub fn new(rule: Box<dyn MatchRule>) -> Self {
        Self { rule }
    }
}

impl Stage for RuleStage {
    fn name(&self) -> &'static str {
        self.rule.name()
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::ResolutionTable]
    }

    fn run<'a>(
        &self,
        _ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let (engine, table) = state.resolution()?;
        if !self.rule.is_applicable(engine.context()) {
            return Err(StageError::missing(format!(
                "no input for rule '{}'",
                self.rule.name()
            )));
        }
        Ok(engine.apply_rule(self.rule.as_ref(), table))
    }
}

/// Moves preferred product-level resolutions onto their ingredient.
pub struct ConsolidateStage;

impl Stage for ConsolidateStage {
    fn name(&self) -> &'static str {
        "consolidate"
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::ResolutionTable]
    }

    fn run<'a>(
        &self,
        _ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let (engine, table) = state.resolution()?;
        let summary = engine.consolidate(table);
        state.consolidation = Some(summary);
        if summary.removed > 0 {
            state.log.info(
                self.name(),
                format!("{} duplicate rows removed", summary.removed),
            );
        }
        Ok(summary.consolidated + summary.removed)
    }
}

/// Surfaces frequent unresolved strings for manual curation.
pub struct CurationQueueStage;

impl Stage for CurationQueueStage {
    fn name(&self) -> &'static str {
        "curation-queue"
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::ResolutionTable]
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn run<'a>(
        &self,
        _ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let (engine, table) = state.resolution()?;
        let queue = engine.curation_queue(table);
        let entries = queue.len();
        state.curation_queue = Some(queue);
        Ok(entries)
    }
}

/// Resolves pending records from curated overrides.
pub struct ManualOverrideStage;

impl Stage for ManualOverrideStage {
    fn name(&self) -> &'static str {
        "manual-override"
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::ManualOverrides, Artifact::ResolutionTable]
    }

    fn run<'a>(
        &self,
        ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let (engine, table) = state.resolution()?;
        Ok(engine.apply_overrides(table, ctx.overrides))
    }
}

/// Deduplicates working rows and keeps one row per record.
pub struct FinalizeStage;

impl Stage for FinalizeStage {
    fn name(&self) -> &'static str {
        "finalize"
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::ResolutionTable]
    }

    fn run<'a>(
        &self,
        _ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let (engine, table) = state.resolution()?;
        let removed = engine.dedupe(table);
        let mappings = engine.finalize(table);

        let mut seen = HashSet::with_capacity(mappings.len());
        if let Some(repeated) = mappings.iter().find(|row| !seen.insert(&row.record_id)) {
            return Err(StageError::execution(format!(
                "record {} has more than one final mapping",
                repeated.record_id
            )));
        }

        let resolved = mappings.iter().filter(|row| row.is_resolved()).count();
        debug!(removed, resolved, rows = mappings.len(), "mappings finalized");
        if removed > 0 {
            state
                .log
                .info(self.name(), format!("{removed} duplicate working rows removed"));
        }
        state.log.info(
            self.name(),
            format!("{resolved} of {} records resolved", mappings.len()),
        );
        state.mappings = Some(mappings);
        Ok(resolved)
    }
}

/// Counts co-occurrences and builds the 2×2 tables.
pub struct ContingencyStage;

impl Stage for ContingencyStage {
    fn name(&self) -> &'static str {
        "contingency"
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::Mappings, Artifact::Events]
    }

    fn run<'a>(
        &self,
        ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let Some(mappings) = state.mappings.as_deref() else {
            return Err(StageError::missing(Artifact::Mappings.label()));
        };
        let counts = count_cooccurrences(ctx.records, mappings, ctx.events, &ctx.options.signal);
        let aggregator = ContingencyAggregator::from_counts(&counts.pairs);
        let cells = aggregator.cells();

        if let Some(cell) = cells.iter().find(|cell| cell.total() != aggregator.total()) {
            return Err(StageError::execution(format!(
                "contingency cell {}/{} does not sum to N = {}",
                cell.concept_id,
                cell.event_id,
                aggregator.total()
            )));
        }

        let rows = cells.len();
        let excluded = cells.iter().filter(|cell| !cell.is_eligible()).count();
        let blank_events = counts.blank_events;
        state.cooccurrence = Some(counts);
        state.cells = Some(cells);
        if excluded > 0 {
            state.log.info(
                self.name(),
                format!("{excluded} tables with an empty cell excluded from statistics"),
            );
        }
        if blank_events > 0 {
            return Err(StageError::DataQuality(format!(
                "{blank_events} event rows with a blank term ignored"
            )));
        }
        Ok(rows)
    }
}

/// Computes disproportionality scores for the eligible tables.
pub struct StatisticsStage;

impl Stage for StatisticsStage {
    fn name(&self) -> &'static str {
        "statistics"
    }

    fn requires(&self) -> &'static [Artifact] {
        &[Artifact::Contingency]
    }

    fn run<'a>(
        &self,
        ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError> {
        let Some(cells) = state.cells.as_deref() else {
            return Err(StageError::missing(Artifact::Contingency.label()));
        };
        let scores = SignalStatistics::new(&ctx.options.signal).score_all(cells);
        let rows = scores.len();
        state.scores = Some(scores);
        Ok(rows)
    }
}
