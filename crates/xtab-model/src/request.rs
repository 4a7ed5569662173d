//! Cross-tabulation request types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::condition::{Condition, CustomVariable};
use crate::error::ModelError;

/// Default number of decimals used when rounding table output.
pub const DEFAULT_DECIMAL_PLACES: u32 = 1;

/// Default significance level for the `*` / `**` bands.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Statistics a caller may request for a crosstab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatisticKind {
    /// Pearson chi-square test of independence.
    #[serde(rename = "chi-square", alias = "chi_square")]
    ChiSquare,
    /// Phi coefficient and Cramér's V.
    #[serde(rename = "phi-cramer", alias = "phi_cramer")]
    PhiCramer,
    /// Pearson's contingency coefficient.
    #[serde(rename = "contingency")]
    Contingency,
    /// Fisher's exact test (2x2 tables only).
    #[serde(rename = "fisher", alias = "fisher-exact", alias = "fisher_exact")]
    Fisher,
}

impl StatisticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticKind::ChiSquare => "chi-square",
            StatisticKind::PhiCramer => "phi-cramer",
            StatisticKind::Contingency => "contingency",
            StatisticKind::Fisher => "fisher",
        }
    }

    /// Returns true if the statistic is derived from the chi-square statistic.
    pub fn needs_chi_square(&self) -> bool {
        !matches!(self, StatisticKind::Fisher)
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "chi-square" | "chi-squared" | "chi2" | "chisquare" => Ok(StatisticKind::ChiSquare),
            "phi-cramer" | "phi" | "cramer" | "cramers-v" | "cramer-v" => {
                Ok(StatisticKind::PhiCramer)
            }
            "contingency" | "contingency-coefficient" => Ok(StatisticKind::Contingency),
            "fisher" | "fisher-exact" | "fishers-exact" => Ok(StatisticKind::Fisher),
            _ => Err(ModelError::UnknownStatistic(s.trim().to_string())),
        }
    }
}

/// How rows with a null in an axis variable are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Drop rows with a null in any involved axis variable.
    #[default]
    Exclude,
    /// Keep nulls as their own category.
    Include,
}

/// Axis a multi-response variable is tabulated along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    #[serde(alias = "rows")]
    Row,
    #[serde(alias = "col", alias = "columns")]
    Column,
}

impl AxisSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisSide::Row => "row",
            AxisSide::Column => "column",
        }
    }
}

impl fmt::Display for AxisSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A "select all that apply" variable whose cells hold comma-delimited options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiResponseSpec {
    /// Question type label, echoed back to the caller.
    #[serde(rename = "type", default = "default_multi_response_type")]
    pub kind: String,
    /// Valid option labels, in display order.
    pub options: Vec<String>,
    /// Axis the per-option entries are concatenated along.
    pub axis: AxisSide,
}

fn default_multi_response_type() -> String {
    "select_all".to_string()
}

impl MultiResponseSpec {
    pub fn new(axis: AxisSide, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind: default_multi_response_type(),
            options: options.into_iter().map(Into::into).collect(),
            axis,
        }
    }

    /// Name of the binary column materialized for `option` of `variable`.
    pub fn option_column(variable: &str, option: &str) -> String {
        format!("{variable}_{option}")
    }
}

/// Which percentage tables to compute alongside the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub row_pct: bool,
    pub col_pct: bool,
    pub total_pct: bool,
}

impl DisplayOptions {
    pub fn all() -> Self {
        Self {
            row_pct: true,
            col_pct: true,
            total_pct: true,
        }
    }
}

/// Significance testing switch and level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceOptions {
    /// Run the chi-square test even when it was not listed in `statistics`.
    pub enable: bool,
    /// Alpha for the `*` band; `**` is used below `level / 10`.
    pub level: f64,
}

impl Default for SignificanceOptions {
    fn default() -> Self {
        Self {
            enable: false,
            level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

/// A declarative cross-tabulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosstabRequest {
    pub row_vars: Vec<String>,
    pub col_vars: Vec<String>,
    /// Frequency weight column; cells hold weight sums when set.
    #[serde(default)]
    pub weight: Option<String>,
    /// Subgroup filter applied as a row mask before tabulation.
    #[serde(default)]
    pub filter: Vec<Condition>,
    #[serde(default)]
    pub multiple_response: BTreeMap<String, MultiResponseSpec>,
    #[serde(default)]
    pub custom_variables: Vec<CustomVariable>,
    #[serde(default)]
    pub statistics: Vec<StatisticKind>,
    #[serde(default)]
    pub display: DisplayOptions,
    #[serde(default)]
    pub significance: SignificanceOptions,
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    #[serde(default)]
    pub missing: MissingPolicy,
    #[serde(default)]
    pub hide_empty: bool,
    /// Apply Yates' continuity correction to 2x2 chi-square tests.
    #[serde(default)]
    pub continuity_correction: bool,
}

fn default_decimal_places() -> u32 {
    DEFAULT_DECIMAL_PLACES
}

impl CrosstabRequest {
    pub fn new(
        row_vars: impl IntoIterator<Item = impl Into<String>>,
        col_vars: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            row_vars: row_vars.into_iter().map(Into::into).collect(),
            col_vars: col_vars.into_iter().map(Into::into).collect(),
            weight: None,
            filter: Vec::new(),
            multiple_response: BTreeMap::new(),
            custom_variables: Vec::new(),
            statistics: Vec::new(),
            display: DisplayOptions::default(),
            significance: SignificanceOptions::default(),
            decimal_places: DEFAULT_DECIMAL_PLACES,
            missing: MissingPolicy::default(),
            hide_empty: false,
            continuity_correction: false,
        }
    }

    #[must_use]
    pub fn with_weight(mut self, column: impl Into<String>) -> Self {
        self.weight = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, conditions: Vec<Condition>) -> Self {
        self.filter = conditions;
        self
    }

    #[must_use]
    pub fn with_multi_response(mut self, variable: impl Into<String>, spec: MultiResponseSpec) -> Self {
        self.multiple_response.insert(variable.into(), spec);
        self
    }

    #[must_use]
    pub fn with_custom_variable(mut self, variable: CustomVariable) -> Self {
        self.custom_variables.push(variable);
        self
    }

    #[must_use]
    pub fn with_statistics(mut self, statistics: impl IntoIterator<Item = StatisticKind>) -> Self {
        self.statistics.extend(statistics);
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    #[must_use]
    pub fn with_significance(mut self, significance: SignificanceOptions) -> Self {
        self.significance = significance;
        self
    }

    #[must_use]
    pub fn with_decimal_places(mut self, decimal_places: u32) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    #[must_use]
    pub fn with_missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    #[must_use]
    pub fn with_hide_empty(mut self, hide_empty: bool) -> Self {
        self.hide_empty = hide_empty;
        self
    }

    #[must_use]
    pub fn with_continuity_correction(mut self, enable: bool) -> Self {
        self.continuity_correction = enable;
        self
    }

    /// Returns true if `kind` was requested.
    pub fn wants(&self, kind: StatisticKind) -> bool {
        self.statistics.contains(&kind)
    }

    /// Returns true if the chi-square test must run for this request.
    pub fn needs_chi_square(&self) -> bool {
        self.significance.enable || self.statistics.iter().any(StatisticKind::needs_chi_square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistic_kind_parses_loose_names() {
        assert_eq!("Chi_Square".parse::<StatisticKind>(), Ok(StatisticKind::ChiSquare));
        assert_eq!("cramers v".parse::<StatisticKind>(), Ok(StatisticKind::PhiCramer));
        assert_eq!("fisher_exact".parse::<StatisticKind>(), Ok(StatisticKind::Fisher));
        assert!("anova".parse::<StatisticKind>().is_err());
    }

    #[test]
    fn request_defaults_follow_backend() {
        let request: CrosstabRequest =
            serde_json::from_str(r#"{"row_vars": ["gender"], "col_vars": ["vote"]}"#).unwrap();
        assert_eq!(request.decimal_places, 1);
        assert_eq!(request.missing, MissingPolicy::Exclude);
        assert!(!request.hide_empty);
        assert!(request.statistics.is_empty());
        assert!(!request.needs_chi_square());
        assert!((request.significance.level - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn significance_enable_forces_chi_square() {
        let request = CrosstabRequest::new(["a"], ["b"]).with_significance(SignificanceOptions {
            enable: true,
            level: 0.01,
        });
        assert!(request.needs_chi_square());
        assert!(!request.wants(StatisticKind::ChiSquare));
    }

    #[test]
    fn multi_response_spec_defaults_type() {
        let spec: MultiResponseSpec =
            serde_json::from_str(r#"{"options": ["A", "B"], "axis": "row"}"#).unwrap();
        assert_eq!(spec.kind, "select_all");
        assert_eq!(spec.axis, AxisSide::Row);
        assert_eq!(MultiResponseSpec::option_column("brands", "A"), "brands_A");
    }
}
