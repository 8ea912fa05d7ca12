//! Guidance envelope returned to the transport layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::frame::AnalysisSummary;
use crate::suggestion::Suggestion;

/// Result of one guidance request.
///
/// Successful requests always carry `analysis`; only unreadable input yields
/// an `error` with an empty suggestion list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuidanceResponse {
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GuidanceResponse {
    pub fn ok(suggestions: Vec<Suggestion>, analysis: AnalysisSummary) -> Self {
        Self {
            suggestions,
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            suggestions: Vec::new(),
            analysis: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
