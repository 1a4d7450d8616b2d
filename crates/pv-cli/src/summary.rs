use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use pv_model::SignalScore;

use crate::types::{RunResult, StageStatus, StageSummary};

pub fn print_summary(result: &RunResult) {
    println!("Output: {}", result.output_dir.display());
    for path in &result.written {
        println!("  {}", path.display());
    }
    print_stage_table(&result.stages);
    print_provenance_table(result);
    if let Some(count) = result.curation_queue {
        println!("Curation queue: {count} keys");
    }
    if let (Some(cells), Some(scores)) = (result.cells, result.scores) {
        println!("Drug-event pairs: {cells} counted, {scores} scored");
    }
    print_signal_table(&result.top_signals);
    if let Some(failure) = &result.failure {
        eprintln!("Halted: {failure}");
    }
}

fn print_stage_table(stages: &[StageSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Status"),
        header_cell("Rows"),
        header_cell("Message"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    for stage in stages {
        table.add_row(vec![
            Cell::new(stage.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status_cell(stage.status),
            stage.rows.map_or_else(|| dim_cell("-"), Cell::new),
            stage
                .message
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");
}

fn print_provenance_table(result: &RunResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Provenance"),
        header_cell("Records"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for (code, count) in &result.provenance {
        table.add_row(vec![
            Cell::new(code.rule_number()),
            Cell::new(code.as_str()),
            Cell::new(count),
        ]);
    }
    let unresolved = result.records.saturating_sub(result.resolved);
    table.add_row(vec![
        dim_cell("-"),
        Cell::new("unresolved").fg(Color::Yellow),
        count_cell(unresolved, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} resolved", result.resolved)).add_attribute(Attribute::Bold),
        Cell::new(result.records).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn print_signal_table(signals: &[SignalScore]) {
    if signals.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Concept"),
        header_cell("Event"),
        header_cell("a"),
        header_cell("Expected"),
        header_cell("PRR (95% CI)"),
        header_cell("ROR (95% CI)"),
        header_cell("IC (95% CI)"),
        header_cell("Chi2"),
    ]);
    apply_table_style(&mut table);
    for column in [2, 3, 7] {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for score in signals {
        table.add_row(vec![
            Cell::new(score.concept_id.as_str()),
            Cell::new(score.event_id.as_str()),
            Cell::new(score.a),
            Cell::new(format!("{:.2}", score.expected_count)),
            Cell::new(interval(score.prr, score.prr_ci_low, score.prr_ci_high)),
            Cell::new(interval(score.ror, score.ror_ci_low, score.ror_ci_high)),
            Cell::new(interval(score.ic, score.ic_ci_low, score.ic_ci_high)).fg(Color::Green),
            Cell::new(format!("{:.2}", score.chi_squared_yates)),
        ]);
    }
    println!();
    println!("Top signals:");
    println!("{table}");
}

fn interval(value: f64, low: f64, high: f64) -> String {
    format!("{value:.2} ({low:.2}-{high:.2})")
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: StageStatus) -> Cell {
    let cell = Cell::new(status.label());
    match status {
        StageStatus::Completed => cell.fg(Color::Green),
        StageStatus::Warning => cell.fg(Color::Yellow),
        StageStatus::Skipped | StageStatus::NotRun => cell.fg(Color::DarkGrey),
        StageStatus::Failed => cell.fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
