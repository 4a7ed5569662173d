//! Statistics engine.
//!
//! Every entry point (direct requests and analysis plans) goes through
//! [`compute_statistics`], so a table always yields the same numbers.
//! Statistics run on the matrix they are given: for a weighted request that
//! is the matrix of weight sums.

use serde::{Serialize, Serializer};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::function::factorial::ln_binomial;
use tracing::debug;
use xtab_model::{CrosstabRequest, StatisticKind};

use crate::error::{CrosstabError, Result};
use crate::table::ContingencyTable;

const CHI_SQUARE: &str = "chi-square";
const FISHER: &str = "fisher";

/// Relative tolerance when comparing hypergeometric probabilities.
const FISHER_TOLERANCE: f64 = 1e-7;

/// Tail terms below this fraction of the observed probability end the walk.
const FISHER_TAIL_CUTOFF: f64 = 1e-16;

/// Significance band of a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignificanceBand {
    /// `p < alpha / 10`
    Strong,
    /// `p < alpha`
    Significant,
    NotSignificant,
}

impl SignificanceBand {
    pub fn symbol(&self) -> &'static str {
        match self {
            SignificanceBand::Strong => "**",
            SignificanceBand::Significant => "*",
            SignificanceBand::NotSignificant => "ns",
        }
    }

    pub fn is_significant(&self) -> bool {
        !matches!(self, SignificanceBand::NotSignificant)
    }
}

impl Serialize for SignificanceBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

/// Bands a p-value: `**` below `alpha / 10`, `*` below `alpha`, else `ns`.
pub fn significance_band(p_value: f64, alpha: f64) -> SignificanceBand {
    if p_value < alpha / 10.0 {
        SignificanceBand::Strong
    } else if p_value < alpha {
        SignificanceBand::Significant
    } else {
        SignificanceBand::NotSignificant
    }
}

/// Pearson chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    #[serde(rename = "chi2")]
    pub statistic: f64,
    #[serde(rename = "p")]
    pub p_value: f64,
    pub dof: usize,
    pub significance: SignificanceBand,
    /// Whether Yates' correction was applied.
    pub continuity_correction: bool,
    #[serde(skip)]
    pub expected: Vec<Vec<f64>>,
}

/// Fisher's exact test on a 2x2 table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FisherResult {
    /// Sample odds ratio `(a*d)/(b*c)`; `None` when `b*c` is zero.
    pub odds_ratio: Option<f64>,
    #[serde(rename = "p")]
    pub p_value: f64,
    pub significance: SignificanceBand,
}

/// Phi and Cramér's V, reported together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Association {
    pub phi: Option<f64>,
    pub cramers_v: Option<f64>,
}

/// Everything computed for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chi_square: Option<ChiSquareResult>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub association: Option<Association>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contingency_coefficient: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fisher: Option<FisherResult>,
}

fn check_matrix(test: &'static str, matrix: &[Vec<f64>]) -> Result<(usize, usize)> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(CrosstabError::statistical(test, "table is empty"));
    }
    if matrix.iter().any(|row| row.len() != cols) {
        return Err(CrosstabError::statistical(test, "table rows differ in length"));
    }
    if matrix.iter().flatten().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(CrosstabError::statistical(
            test,
            "cells must be finite and non-negative",
        ));
    }
    Ok((rows, cols))
}

/// Runs the chi-square test of independence on `matrix`.
///
/// Yates' correction is applied only when `continuity_correction` is set and
/// the table has one degree of freedom. A table with zero degrees of freedom
/// yields a statistic of 0 and a p-value of 1.
pub fn chi_square(matrix: &[Vec<f64>], continuity_correction: bool) -> Result<ChiSquareResult> {
    let (rows, cols) = check_matrix(CHI_SQUARE, matrix)?;
    let row_totals: Vec<f64> = matrix.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..cols)
        .map(|c| matrix.iter().map(|row| row[c]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();
    if total <= 0.0 {
        return Err(CrosstabError::statistical(CHI_SQUARE, "grand total is zero"));
    }

    let expected: Vec<Vec<f64>> = row_totals
        .iter()
        .map(|rt| col_totals.iter().map(|ct| rt * ct / total).collect())
        .collect();
    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Ok(ChiSquareResult {
            statistic: 0.0,
            p_value: 1.0,
            dof,
            significance: SignificanceBand::NotSignificant,
            continuity_correction: false,
            expected,
        });
    }
    if expected.iter().flatten().any(|e| *e <= 0.0) {
        return Err(CrosstabError::statistical(
            CHI_SQUARE,
            "an expected frequency is zero",
        ));
    }

    let corrected = continuity_correction && dof == 1;
    let statistic: f64 = matrix
        .iter()
        .flatten()
        .zip(expected.iter().flatten())
        .map(|(observed, expected)| {
            let mut diff = (observed - expected).abs();
            if corrected {
                diff = (diff - 0.5).max(0.0);
            }
            diff * diff / expected
        })
        .sum();

    let distribution = ChiSquared::new(dof as f64)
        .map_err(|e| CrosstabError::statistical(CHI_SQUARE, e.to_string()))?;
    let p_value = distribution.sf(statistic).clamp(0.0, 1.0);
    if !statistic.is_finite() || !p_value.is_finite() {
        return Err(CrosstabError::statistical(
            CHI_SQUARE,
            "statistic is not finite",
        ));
    }
    debug!(statistic, p_value, dof, corrected, "chi-square computed");

    Ok(ChiSquareResult {
        statistic,
        p_value,
        dof,
        significance: significance_band(p_value, xtab_model::DEFAULT_SIGNIFICANCE_LEVEL),
        continuity_correction: corrected,
        expected,
    })
}

/// Phi coefficient; only defined for 2x2 tables.
pub fn phi(chi2: f64, n: f64, shape: (usize, usize)) -> Option<f64> {
    (shape == (2, 2) && n > 0.0).then(|| (chi2 / n).sqrt())
}

/// Cramér's V; undefined when either axis has a single entry.
pub fn cramers_v(chi2: f64, n: f64, shape: (usize, usize)) -> Option<f64> {
    let k = shape.0.min(shape.1);
    (k > 1 && n > 0.0).then(|| (chi2 / (n * (k - 1) as f64)).sqrt())
}

/// Pearson's contingency coefficient.
pub fn contingency_coefficient(chi2: f64, n: f64) -> f64 {
    if chi2 + n <= 0.0 {
        return 0.0;
    }
    (chi2 / (chi2 + n)).sqrt()
}

fn as_count(value: f64) -> Result<u64> {
    if (value - value.round()).abs() > 1e-9 {
        return Err(CrosstabError::statistical(
            FISHER,
            format!("cell value {value} is not a whole count"),
        ));
    }
    Ok(value.round() as u64)
}

/// Most likely top-left count given the row-one and column-one margins.
fn hypergeometric_mode(n: u64, row1: u64, col1: u64) -> u64 {
    let mode = (u128::from(row1) + 1) * (u128::from(col1) + 1) / (u128::from(n) + 2);
    u64::try_from(mode).unwrap_or(u64::MAX)
}

/// Sums the terms no larger than `threshold`, walking away from the mode
/// until a term drops to `cutoff`.
fn tail_sum(
    xs: impl Iterator<Item = u64>,
    probability: impl Fn(u64) -> f64,
    threshold: f64,
    cutoff: f64,
) -> f64 {
    let mut sum = 0.0;
    for x in xs {
        let p = probability(x);
        if p <= threshold {
            sum += p;
        }
        if p <= cutoff {
            break;
        }
    }
    sum
}

/// Fisher's exact test on a 2x2 table of whole counts.
///
/// The two-sided p-value sums the probabilities of every table with the
/// same margins that is no more likely than the observed one. Tables are
/// visited outward from the most likely one and each direction stops once
/// its terms fall below [`FISHER_TAIL_CUTOFF`] of the observed probability,
/// so the cost grows with the standard deviation of the top-left cell
/// rather than with the margins. Weighted tables with large whole sums stay
/// cheap.
pub fn fisher_exact(matrix: &[Vec<f64>]) -> Result<FisherResult> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    if rows != 2 || matrix.iter().any(|row| row.len() != 2) {
        return Err(CrosstabError::InvalidTableShape {
            test: FISHER,
            rows,
            cols,
        });
    }
    check_matrix(FISHER, matrix)?;
    let a = as_count(matrix[0][0])?;
    let b = as_count(matrix[0][1])?;
    let c = as_count(matrix[1][0])?;
    let d = as_count(matrix[1][1])?;

    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let n = row1 + row2;
    if n == 0 {
        return Err(CrosstabError::statistical(FISHER, "grand total is zero"));
    }

    // P(X = x) for the top-left cell under fixed margins.
    let ln_total = ln_binomial(n, col1);
    let probability =
        |x: u64| (ln_binomial(row1, x) + ln_binomial(row2, col1 - x) - ln_total).exp();

    let low = col1.saturating_sub(row2);
    let high = row1.min(col1);
    let mode = hypergeometric_mode(n, row1, col1).clamp(low, high);
    let observed = probability(a);
    let threshold = observed * (1.0 + FISHER_TOLERANCE);
    let cutoff = observed * FISHER_TAIL_CUTOFF;

    // Probabilities fall monotonically on both sides of the mode.
    let below = tail_sum((low..=mode).rev(), &probability, threshold, cutoff);
    let above = tail_sum(mode + 1..=high, &probability, threshold, cutoff);
    let p_value = (below + above).min(1.0);

    let odds_ratio = (b > 0 && c > 0).then(|| (a as f64 * d as f64) / (b as f64 * c as f64));
    debug!(p_value, ?odds_ratio, "fisher exact computed");

    Ok(FisherResult {
        odds_ratio,
        p_value,
        significance: significance_band(p_value, xtab_model::DEFAULT_SIGNIFICANCE_LEVEL),
    })
}

/// Computes the statistics a request asks for on `table`.
///
/// Chi-square runs when any chi-square based measure is requested or when
/// significance testing is enabled. Bands use the request's level.
pub fn compute_statistics(
    table: &ContingencyTable,
    request: &CrosstabRequest,
) -> Result<StatisticsReport> {
    let alpha = request.significance.level;
    let mut report = StatisticsReport::default();

    if request.needs_chi_square() {
        let mut chi = chi_square(table.cells(), request.continuity_correction)?;
        chi.significance = significance_band(chi.p_value, alpha);
        let n = table.grand_total();
        let shape = table.shape();

        if request.wants(StatisticKind::PhiCramer) {
            report.association = Some(Association {
                phi: phi(chi.statistic, n, shape),
                cramers_v: cramers_v(chi.statistic, n, shape),
            });
        }
        if request.wants(StatisticKind::Contingency) {
            report.contingency_coefficient = Some(contingency_coefficient(chi.statistic, n));
        }
        report.chi_square = Some(chi);
    }

    if request.wants(StatisticKind::Fisher) {
        let mut fisher = fisher_exact(table.cells())?;
        fisher.significance = significance_band(fisher.p_value, alpha);
        report.fisher = Some(fisher);
    }
    Ok(report)
}
