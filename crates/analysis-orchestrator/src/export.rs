use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statement_core::{AnalysisReport, AnalysisResult, Finding, Recommendation, RunMetadata, Tier};

/// Report keyed by analysis id, for consumers that address results directly.
///
/// Converting back with [`FlatReport::into_report`] restores catalog order
/// from each result's ordinal, so the round trip is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatReport {
    pub overall_score: f64,
    pub tier_scores: BTreeMap<Tier, f64>,
    pub analyses: BTreeMap<String, AnalysisResult>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub metadata: RunMetadata,
}

impl FlatReport {
    pub fn into_report(self) -> AnalysisReport {
        let mut results: Vec<AnalysisResult> = self.analyses.into_values().collect();
        results.sort_by_key(|r| r.ordinal);
        AnalysisReport {
            results,
            overall_score: self.overall_score,
            tier_scores: self.tier_scores,
            findings: self.findings,
            recommendations: self.recommendations,
            metadata: self.metadata,
        }
    }
}

impl From<&AnalysisReport> for FlatReport {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            overall_score: report.overall_score,
            tier_scores: report.tier_scores.clone(),
            analyses: report
                .results
                .iter()
                .map(|r| (r.id.clone(), r.clone()))
                .collect(),
            findings: report.findings.clone(),
            recommendations: report.recommendations.clone(),
            metadata: report.metadata.clone(),
        }
    }
}

impl From<FlatReport> for AnalysisReport {
    fn from(flat: FlatReport) -> Self {
        flat.into_report()
    }
}

pub fn to_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn to_flat_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&FlatReport::from(report))
}

pub fn from_flat_json(json: &str) -> serde_json::Result<AnalysisReport> {
    serde_json::from_str::<FlatReport>(json).map(FlatReport::into_report)
}
