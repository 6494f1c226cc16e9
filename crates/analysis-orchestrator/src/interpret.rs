//! Plain-language interpretation attached to every result.

use formula_library::AnalysisDefinition;
use statement_core::{AnalysisValue, BenchmarkOutcome, BenchmarkValue, ComputationError, Status};

pub fn computed(
    def: &AnalysisDefinition,
    value: &AnalysisValue,
    status: Status,
    benchmarks: &[BenchmarkValue],
    outcome: BenchmarkOutcome,
    estimated: &[String],
) -> String {
    let mut text = format!("{} is {}", def.name_en, def.unit.format(value.headline()));

    match value {
        AnalysisValue::Breakdown { components, .. } => {
            let parts: Vec<String> = components
                .iter()
                .map(|(name, v)| format!("{} {:.2}", name, v))
                .collect();
            text.push_str(&format!(" ({})", parts.join(", ")));
        }
        AnalysisValue::Trend { points, .. } => {
            text.push_str(&format!(" over {} periods", points.len()));
        }
        AnalysisValue::Scalar { .. } => {}
    }

    if benchmarks.is_empty() {
        let reason = match outcome {
            BenchmarkOutcome::ProviderTimeout => "benchmark lookup timed out",
            BenchmarkOutcome::ProviderError => "benchmark provider unavailable",
            _ => "no benchmark available",
        };
        text.push_str(&format!("; {}, graded {} by default", reason, status.to_label()));
    } else {
        let anchors: Vec<String> = benchmarks
            .iter()
            .map(|b| format!("{} {}", b.scope.as_str(), def.unit.format(b.value)))
            .collect();
        text.push_str(&format!(
            "; {} against {} ({})",
            status.to_label(),
            anchors.join(", "),
            def.direction.describe()
        ));
    }
    text.push('.');

    if !estimated.is_empty() {
        text.push_str(&format!(" Estimated inputs: {}.", estimated.join(", ")));
    }
    text
}

pub fn not_computed(err: &ComputationError) -> String {
    format!("Not computable: {}", err)
}

pub fn failed(reason: &str) -> String {
    format!("Not computable: analysis failed unexpectedly ({})", reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_library::catalog;
    use statement_core::{BenchmarkScope, FinancialField};

    #[test]
    fn test_anchored_text() {
        let def = catalog().get("current_ratio").unwrap();
        let text = computed(
            def,
            &AnalysisValue::scalar(2.0),
            Status::Good,
            &[BenchmarkValue::new(BenchmarkScope::Industry, 2.0)],
            BenchmarkOutcome::Anchored,
            &[],
        );
        assert_eq!(text, "Current Ratio is 2.00; good against industry 2.00 (higher is better).");
    }

    #[test]
    fn test_degraded_text_names_reason() {
        let def = catalog().get("gross_margin").unwrap();
        let text = computed(
            def,
            &AnalysisValue::scalar(45.5),
            Status::Average,
            &[],
            BenchmarkOutcome::ProviderTimeout,
            &["cogs=revenue-gross_profit".to_string()],
        );
        assert!(text.contains("timed out"));
        assert!(text.ends_with("Estimated inputs: cogs=revenue-gross_profit."));
    }

    #[test]
    fn test_not_computed_text() {
        let text = not_computed(&ComputationError::MissingField(FinancialField::TotalEquity));
        assert!(text.starts_with("Not computable"));
        assert!(text.contains("total_equity"));
    }
}
