//! Disproportionality statistics.
//!
//! For an eligible cell (all four counts positive) with `N = a + b + c + d`:
//!
//! - expected count `E = (a + b)(a + c) / N`
//! - proportional reporting ratio `PRR = (a / (a + c)) / (b / (b + d))`
//!   with a 95% interval `exp(ln PRR ∓ 1.96 √(1/a − 1/(a+c) + 1/b − 1/(b+d)))`
//! - reporting odds ratio `ROR = (a / c) / (b / d)` with a 95% interval
//!   `exp(ln ROR ∓ 1.96 √(1/a + 1/b + 1/c + 1/d))`
//! - Yates-corrected chi-squared
//!   `N (|ad − bc| − N/2)² / ((a + c)(b + d)(a + b)(c + d))`, rounded to
//!   8 decimals
//! - information component `IC = log2((a + 0.5) / (E + 0.5))` with the
//!   asymmetric shrinkage bounds `IC − 3.3 (a+0.5)^−½ − 2 (a+0.5)^−3⁄2` and
//!   `IC + 2.4 (a+0.5)^−½ − 0.5 (a+0.5)^−3⁄2`.

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tracing::info;

use pv_model::{ContingencyCell, SignalScore, SignalOptions};

const Z_95: f64 = 1.96;
const CHI_SQUARED_DECIMALS: i32 = 8;

/// Rounds `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Scores contingency cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalStatistics {
    min_cooccurrence: i64,
}

impl SignalStatistics {
    pub fn new(options: &SignalOptions) -> Self {
        Self {
            min_cooccurrence: options.min_cooccurrence,
        }
    }

    /// Scores of one cell; `None` when the cell is not eligible.
    pub fn score(cell: &ContingencyCell) -> Option<SignalScore> {
        if !cell.is_eligible() {
            return None;
        }
        let a = cell.a as f64;
        let b = cell.b as f64;
        let c = cell.c as f64;
        let d = cell.d as f64;
        let n = a + b + c + d;

        let expected = (a + b) * (a + c) / n;

        let prr = (a / (a + c)) / (b / (b + d));
        let prr_se = (1.0 / a - 1.0 / (a + c) + 1.0 / b - 1.0 / (b + d)).sqrt();
        let (prr_ci_low, prr_ci_high) = log_interval(prr, prr_se);

        let ror = (a / c) / (b / d);
        let ror_se = (1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d).sqrt();
        let (ror_ci_low, ror_ci_high) = log_interval(ror, ror_se);

        let deviation = ((a * d - b * c).abs() - n / 2.0).powi(2);
        let chi_squared = n * deviation / ((a + c) * (b + d) * (a + b) * (c + d));

        let shrunk = a + 0.5;
        let ic = (shrunk / (expected + 0.5)).log2();
        let ic_ci_low = ic - 3.3 * shrunk.powf(-0.5) - 2.0 * shrunk.powf(-1.5);
        let ic_ci_high = ic + 2.4 * shrunk.powf(-0.5) - 0.5 * shrunk.powf(-1.5);

        Some(SignalScore {
            concept_id: cell.concept_id.clone(),
            event_id: cell.event_id.clone(),
            a: cell.a,
            expected_count: expected,
            prr,
            prr_ci_low,
            prr_ci_high,
            chi_squared_yates: round_to(chi_squared, CHI_SQUARED_DECIMALS),
            ror,
            ror_ci_low,
            ror_ci_high,
            ic,
            ic_ci_low,
            ic_ci_high,
        })
    }

    /// Scores every eligible cell with at least the configured number of
    /// co-reports. Output keeps the order of `cells`.
    pub fn score_all(&self, cells: &[ContingencyCell]) -> Vec<SignalScore> {
        let min = self.min_cooccurrence;
        let scores: Vec<SignalScore> = cells
            .par_iter()
            .filter(|cell| cell.a >= min)
            .filter_map(Self::score)
            .collect();
        info!(
            cells = cells.len(),
            scored = scores.len(),
            signals = scores.iter().filter(|score| score.is_signal()).count(),
            "signal statistics computed"
        );
        scores
    }
}

fn log_interval(ratio: f64, standard_error: f64) -> (f64, f64) {
    let center = ratio.ln();
    (
        (center - Z_95 * standard_error).exp(),
        (center + Z_95 * standard_error).exp(),
    )
}

#[cfg(test)]
mod tests {
    use pv_model::{ConceptId, EventId};

    use super::*;

    fn cell(a: i64, b: i64, c: i64, d: i64) -> ContingencyCell {
        ContingencyCell {
            concept_id: ConceptId::new("1191").unwrap(),
            event_id: EventId::new("NAUSEA").unwrap(),
            a,
            b,
            c,
            d,
        }
    }

    fn close(left: f64, right: f64, tolerance: f64) -> bool {
        (left - right).abs() < tolerance
    }

    #[test]
    fn textbook_cell() {
        let score = SignalStatistics::score(&cell(15, 25, 105, 9855)).unwrap();
        assert!(close(score.expected_count, 0.48, 1e-12));
        assert!(close(score.prr, 49.4, 1e-9));
        assert!(score.prr_ci_low < score.prr && score.prr < score.prr_ci_high);
        assert!(close(score.ror, (15.0 / 105.0) / (25.0 / 9855.0), 1e-9));
        assert!(score.ror_ci_low < score.ror && score.ror < score.ror_ci_high);
        let ic = (15.5f64 / 0.98).log2();
        assert!(close(score.ic, ic, 1e-12));
        assert!(close(
            score.ic_ci_low,
            ic - 3.3 / 15.5f64.sqrt() - 2.0 / 15.5f64.powf(1.5),
            1e-12
        ));
        assert!(close(
            score.ic_ci_high,
            ic + 2.4 / 15.5f64.sqrt() - 0.5 / 15.5f64.powf(1.5),
            1e-12
        ));
        assert!(score.is_signal());
    }

    #[test]
    fn chi_squared_is_yates_corrected_and_rounded() {
        let score = SignalStatistics::score(&cell(10, 20, 30, 40)).unwrap();
        // N = 100, |ad - bc| = 200, (200 - 50)^2 = 22500, margins 40*60*30*70.
        let expected = 100.0 * 22_500.0 / (40.0 * 60.0 * 30.0 * 70.0);
        assert_eq!(score.chi_squared_yates, round_to(expected, 8));
        assert_eq!(round_to(0.123_456_789_4, 8), 0.123_456_79);
    }

    #[test]
    fn ineligible_cells_are_not_scored() {
        assert!(SignalStatistics::score(&cell(3, 0, 2, 10)).is_none());
        assert!(SignalStatistics::score(&cell(3, 4, 2, 0)).is_none());
    }

    #[test]
    fn minimum_cooccurrence_filters_rows() {
        let cells = vec![cell(1, 5, 5, 50), cell(4, 5, 5, 50), cell(2, 0, 5, 50)];
        let all = SignalStatistics::default().score_all(&cells);
        assert_eq!(all.len(), 2);
        let options = SignalOptions::default().with_min_cooccurrence(3);
        let filtered = SignalStatistics::new(&options).score_all(&cells);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].a, 4);
    }
}
