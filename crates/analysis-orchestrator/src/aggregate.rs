use std::cmp::Ordering;
use std::collections::BTreeMap;

use formula_library::Catalog;
use statement_core::{AnalysisResult, Finding, Priority, Recommendation, Status, Tier};

const NEUTRAL_SCORE: f64 = 50.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Confidence-weighted mean of status scores over computed results.
/// With no weight at all the score is neutral.
pub fn weighted_score<'a>(results: impl IntoIterator<Item = &'a AnalysisResult>) -> f64 {
    let (weighted, total_weight) = results
        .into_iter()
        .filter(|r| r.computed)
        .fold((0.0, 0.0), |(sum, weight), r| {
            let w = r.confidence as f64 / 100.0;
            (sum + r.status.to_score() * w, weight + w)
        });

    if total_weight <= 0.0 {
        NEUTRAL_SCORE
    } else {
        round2(weighted / total_weight)
    }
}

pub fn tier_scores(results: &[AnalysisResult]) -> BTreeMap<Tier, f64> {
    let mut by_tier: BTreeMap<Tier, Vec<&AnalysisResult>> = BTreeMap::new();
    for result in results {
        by_tier.entry(result.tier).or_default().push(result);
    }
    by_tier
        .into_iter()
        .map(|(tier, members)| (tier, weighted_score(members)))
        .collect()
}

/// Highest-confidence results that are not average, strongest signal first.
pub fn findings(results: &[AnalysisResult], limit: usize) -> Vec<Finding> {
    let mut candidates: Vec<&AnalysisResult> = results
        .iter()
        .filter(|r| r.computed && r.status != Status::Average)
        .collect();

    candidates.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| {
                let da = (a.status.to_score() - NEUTRAL_SCORE).abs();
                let db = (b.status.to_score() - NEUTRAL_SCORE).abs();
                db.partial_cmp(&da).unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.ordinal.cmp(&b.ordinal))
    });

    candidates
        .into_iter()
        .take(limit)
        .map(|r| Finding {
            analysis_id: r.id.clone(),
            name: r.name.en.clone(),
            status: r.status,
            confidence: r.confidence,
            summary: r.interpretation.clone(),
        })
        .collect()
}

/// Remediation for poor and critical results, critical first.
pub fn recommendations(results: &[AnalysisResult], catalog: &Catalog, limit: usize) -> Vec<Recommendation> {
    let mut candidates: Vec<&AnalysisResult> = results
        .iter()
        .filter(|r| r.computed && matches!(r.status, Status::Poor | Status::Critical))
        .collect();

    candidates.sort_by(|a, b| {
        b.status
            .severity()
            .cmp(&a.status.severity())
            .then_with(|| b.confidence.cmp(&a.confidence))
            .then_with(|| a.ordinal.cmp(&b.ordinal))
    });

    candidates
        .into_iter()
        .take(limit)
        .map(|r| {
            let action = catalog
                .get(&r.id)
                .map(|d| d.remediation)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Review {} against its benchmark.", r.name.en));
            Recommendation {
                analysis_id: r.id.clone(),
                name: r.name.en.clone(),
                priority: if r.status == Status::Critical {
                    Priority::High
                } else {
                    Priority::Medium
                },
                action,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_library::catalog;
    use statement_core::{
        AnalysisValue, BenchmarkOutcome, DataQuality, LocalizedName, RiskLevel,
    };

    fn result(id: &str, ordinal: usize, tier: Tier, status: Status, confidence: u8, computed: bool) -> AnalysisResult {
        AnalysisResult {
            id: id.to_string(),
            ordinal,
            name: LocalizedName {
                en: id.to_string(),
                ar: id.to_string(),
            },
            tier,
            category: "test".to_string(),
            computed,
            value: computed.then(|| AnalysisValue::scalar(1.0)),
            formula: String::new(),
            interpretation: format!("{} interpretation", id),
            benchmarks: Vec::new(),
            benchmark_outcome: BenchmarkOutcome::Anchored,
            status,
            risk_level: RiskLevel::from_status(status),
            confidence,
            data_quality: if computed { DataQuality::High } else { DataQuality::Low },
            estimated_inputs: Vec::new(),
        }
    }

    #[test]
    fn test_weighted_score() {
        let results = vec![
            result("a", 0, Tier::Ratio, Status::Excellent, 100, true),
            result("b", 1, Tier::Ratio, Status::Poor, 50, true),
            result("c", 2, Tier::Ratio, Status::Critical, 0, false),
        ];
        // (100*1.0 + 25*0.5) / 1.5 = 75
        assert!((weighted_score(&results) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_is_neutral() {
        let results = vec![result("a", 0, Tier::Ratio, Status::Critical, 0, false)];
        assert!((weighted_score(&results) - 50.0).abs() < 1e-9);
        assert!((weighted_score(&[]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_tier_scores_only_present_tiers() {
        let results = vec![
            result("a", 0, Tier::Structural, Status::Good, 70, true),
            result("b", 1, Tier::Advanced, Status::Poor, 70, true),
        ];
        let scores = tier_scores(&results);
        assert_eq!(scores.len(), 2);
        assert!((scores[&Tier::Structural] - 75.0).abs() < 1e-9);
        assert!((scores[&Tier::Advanced] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_findings_skip_average_and_rank_by_confidence() {
        let results = vec![
            result("a", 0, Tier::Ratio, Status::Good, 70, true),
            result("b", 1, Tier::Ratio, Status::Average, 100, true),
            result("c", 2, Tier::Ratio, Status::Critical, 70, true),
            result("d", 3, Tier::Ratio, Status::Excellent, 95, true),
        ];
        let top = findings(&results, 2);
        let ids: Vec<&str> = top.iter().map(|f| f.analysis_id.as_str()).collect();
        // d by confidence, then c beats a on distance from neutral
        assert_eq!(ids, vec!["d", "c"]);
    }

    #[test]
    fn test_recommendations_critical_first() {
        let results = vec![
            result("current_ratio", 16, Tier::Ratio, Status::Poor, 95, true),
            result("debt_ratio", 6, Tier::Structural, Status::Critical, 50, true),
            result("net_margin", 25, Tier::Ratio, Status::Good, 95, true),
        ];
        let recs = recommendations(&results, catalog(), 5);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].analysis_id, "debt_ratio");
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[1].priority, Priority::Medium);
        assert!(!recs[1].action.is_empty());
    }
}
