//! Data frames for the output tables.
//!
//! Column order is part of the file format; the mapping frame is read back
//! by the resume reader.

use polars::prelude::{Column, DataFrame, NamedFrom, PolarsResult, Series};

use pv_model::{
    AUDIT_NOTE_SEPARATOR, AtomId, ConceptId, ContingencyCell, CurationQueueEntry, ProvenanceCode,
    ResolvedDrugMapping, SignalScore, TermType,
};

fn string_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> Option<String>) -> Column {
    let values: Vec<Option<String>> = rows.iter().map(value).collect();
    Series::new(name.into(), values).into()
}

fn int_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> i64) -> Column {
    let values: Vec<i64> = rows.iter().map(value).collect();
    Series::new(name.into(), values).into()
}

fn float_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> f64) -> Column {
    let values: Vec<f64> = rows.iter().map(value).collect();
    Series::new(name.into(), values).into()
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|value| !value.is_empty())
}

/// `resolved_drug_mapping.csv`: one row per record; unresolved records have
/// empty resolution columns.
pub fn mapping_frame(rows: &[ResolvedDrugMapping]) -> PolarsResult<DataFrame> {
    let atom = |id: Option<&AtomId>| id.map(|id| id.as_str().to_string());
    DataFrame::new(vec![
        string_column("record_id", rows, |row| Some(row.record_id.to_string())),
        string_column("source_atom_id", rows, |row| atom(row.source_atom_id.as_ref())),
        string_column("resolved_concept_id", rows, |row| {
            row.resolved_concept_id
                .as_ref()
                .map(ConceptId::to_string)
        }),
        string_column("resolved_atom_id", rows, |row| atom(row.resolved_atom_id.as_ref())),
        string_column("resolved_string", rows, |row| row.resolved_string.clone()),
        string_column("resolved_source_vocabulary", rows, |row| {
            row.resolved_source_vocabulary.clone()
        }),
        string_column("resolved_term_type", rows, |row| {
            row.resolved_term_type
                .as_ref()
                .map(TermType::to_string)
        }),
        string_column("provenance_code", rows, |row| {
            row.provenance_code
                .map(ProvenanceCode::as_str)
                .map(str::to_string)
        }),
        string_column("audit_notes", rows, |row| {
            non_empty(&row.audit_notes.join(AUDIT_NOTE_SEPARATOR))
        }),
    ])
}

/// `curation_queue.csv`, most frequent first.
pub fn curation_queue_frame(entries: &[CurationQueueEntry]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        string_column("source_string", entries, |entry| {
            Some(entry.source_string.clone())
        }),
        string_column("source_vocabulary", entries, |entry| {
            non_empty(&entry.source_vocabulary)
        }),
        string_column("source_term_type", entries, |entry| {
            non_empty(&entry.source_term_type)
        }),
        int_column("occurrences", entries, |entry| {
            i64::try_from(entry.occurrences).unwrap_or(i64::MAX)
        }),
    ])
}

/// `contingency.csv`.
pub fn contingency_frame(cells: &[ContingencyCell]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        string_column("concept_id", cells, |cell| Some(cell.concept_id.to_string())),
        string_column("event_id", cells, |cell| Some(cell.event_id.to_string())),
        int_column("a", cells, |cell| cell.a),
        int_column("b", cells, |cell| cell.b),
        int_column("c", cells, |cell| cell.c),
        int_column("d", cells, |cell| cell.d),
    ])
}

/// `signal_scores.csv`.
pub fn score_frame(scores: &[SignalScore]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        string_column("concept_id", scores, |score| {
            Some(score.concept_id.to_string())
        }),
        string_column("event_id", scores, |score| Some(score.event_id.to_string())),
        int_column("a", scores, |score| score.a),
        float_column("expected_count", scores, |score| score.expected_count),
        float_column("prr", scores, |score| score.prr),
        float_column("prr_ci_low", scores, |score| score.prr_ci_low),
        float_column("prr_ci_high", scores, |score| score.prr_ci_high),
        float_column("chi_squared_yates", scores, |score| score.chi_squared_yates),
        float_column("ror", scores, |score| score.ror),
        float_column("ror_ci_low", scores, |score| score.ror_ci_low),
        float_column("ror_ci_high", scores, |score| score.ror_ci_high),
        float_column("ic", scores, |score| score.ic),
        float_column("ic_ci_low", scores, |score| score.ic_ci_low),
        float_column("ic_ci_high", scores, |score| score.ic_ci_high),
    ])
}
