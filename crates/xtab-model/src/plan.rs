//! Analysis plan descriptors.
//!
//! A plan is the small JSON object an assistant (or a user) hands over to
//! pick an analysis: its type, the variables involved, and the tests to run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Visualization suggested when a plan does not name one.
pub const DEFAULT_VISUALIZATION: &str = "bar_chart";

/// Test name used by the fallback plan.
pub const DEFAULT_TEST: &str = "chi-square";

/// Kind of analysis a plan asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Crosstab,
    Descriptive,
    Distribution,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Crosstab => "crosstab",
            AnalysisType::Descriptive => "descriptive",
            AnalysisType::Distribution => "distribution",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crosstab" | "cross-tab" | "crosstabulation" => Ok(AnalysisType::Crosstab),
            "descriptive" | "describe" => Ok(AnalysisType::Descriptive),
            "distribution" | "frequency" => Ok(AnalysisType::Distribution),
            _ => Err(ModelError::UnknownAnalysisType(s.trim().to_string())),
        }
    }
}

/// A validated analysis plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPlan {
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_vars: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_vars: Option<Vec<String>>,
    #[serde(default)]
    pub statistical_tests: Vec<String>,
    #[serde(default, alias = "visualization_hint", skip_serializing_if = "Option::is_none")]
    pub visualization: Option<String>,
}

impl AnalysisPlan {
    pub fn new(analysis_type: AnalysisType, variables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            analysis_type,
            variables: variables.into_iter().map(Into::into).collect(),
            row_vars: None,
            col_vars: None,
            statistical_tests: Vec::new(),
            visualization: None,
        }
    }

    /// Default crosstab of the first two columns with a chi-square test.
    pub fn fallback(columns: &[String]) -> Self {
        Self {
            analysis_type: AnalysisType::Crosstab,
            variables: columns.iter().take(2).cloned().collect(),
            row_vars: None,
            col_vars: None,
            statistical_tests: vec![DEFAULT_TEST.to_string()],
            visualization: Some(DEFAULT_VISUALIZATION.to_string()),
        }
    }

    #[must_use]
    pub fn with_tests(mut self, tests: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.statistical_tests = tests.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_axes(
        mut self,
        row_vars: impl IntoIterator<Item = impl Into<String>>,
        col_vars: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.row_vars = Some(row_vars.into_iter().map(Into::into).collect());
        self.col_vars = Some(col_vars.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_visualization(mut self, visualization: impl Into<String>) -> Self {
        self.visualization = Some(visualization.into());
        self
    }
}
