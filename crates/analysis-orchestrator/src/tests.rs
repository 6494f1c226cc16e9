use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use benchmark_provider::{BenchmarkEntry, StaticBenchmarkProvider};
use statement_core::{
    AnalysisError, AnalysisRequest, BenchmarkOutcome, BenchmarkProvider, BenchmarkQuery, BenchmarkScope,
    BenchmarkValue, CompanyContext, DataQuality, FinancialField::*, FinancialPeriod, NoBenchmarks, ProviderError,
    Status, Tier, ValidationError,
};
use tokio_util::sync::CancellationToken;

use super::*;

struct SlowProvider {
    delay: Duration,
}

#[async_trait]
impl BenchmarkProvider for SlowProvider {
    async fn lookup(&self, _query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![BenchmarkValue::new(BenchmarkScope::Industry, 1.0)])
    }

    fn provider_name(&self) -> &'static str {
        "slow"
    }
}

struct FailingProvider;

#[async_trait]
impl BenchmarkProvider for FailingProvider {
    async fn lookup(&self, _query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError> {
        Err(ProviderError::Unavailable("connection refused".into()))
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// Publishes a NaN sector figure everywhere, plus a usable industry figure
/// for the current ratio.
struct NanProvider;

#[async_trait]
impl BenchmarkProvider for NanProvider {
    async fn lookup(&self, query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError> {
        let mut values = vec![BenchmarkValue::new(BenchmarkScope::Sector, f64::NAN)];
        if query.analysis_id == "current_ratio" {
            values.push(BenchmarkValue::new(BenchmarkScope::Industry, 2.0));
        }
        Ok(values)
    }

    fn provider_name(&self) -> &'static str {
        "nan"
    }
}

fn sample_period(year: i32, scale: f64) -> FinancialPeriod {
    FinancialPeriod::new(year)
        .with_classification("Technology", "Software")
        .with(TotalAssets, 2_000_000.0 * scale)
        .with(CurrentAssets, 500_000.0 * scale)
        .with(FixedAssets, 1_200_000.0 * scale)
        .with(Cash, 150_000.0 * scale)
        .with(Inventory, 100_000.0 * scale)
        .with(Receivables, 180_000.0 * scale)
        .with(TotalLiabilities, 900_000.0 * scale)
        .with(CurrentLiabilities, 250_000.0 * scale)
        .with(LongTermDebt, 500_000.0 * scale)
        .with(TotalEquity, 1_100_000.0 * scale)
        .with(Revenue, 1_000_000.0 * scale)
        .with(GrossProfit, 455_000.0 * scale)
        .with(Cogs, 545_000.0 * scale)
        .with(OperatingExpenses, 250_000.0 * scale)
        .with(OperatingIncome, 205_000.0 * scale)
        .with(InterestExpense, 30_000.0 * scale)
        .with(NetIncome, 130_000.0 * scale)
        .with(OperatingCashFlow, 170_000.0 * scale)
        .with(InvestingCashFlow, -60_000.0 * scale)
        .with(FinancingCashFlow, -40_000.0 * scale)
        .with(FreeCashFlow, 110_000.0 * scale)
        .with(SharesOutstanding, 100_000.0)
        .with(StockPrice, 25.0 * scale)
}

fn full_request() -> AnalysisRequest {
    let peers = vec![
        FinancialPeriod::new(2024).with(Revenue, 800_000.0),
        FinancialPeriod::new(2024).with(Revenue, 1_500_000.0),
    ];
    AnalysisRequest::new(sample_period(2024, 1.1))
        .with_prior(vec![sample_period(2021, 0.8), sample_period(2022, 0.9), sample_period(2023, 1.0)])
        .with_peers(peers)
}

fn benchmarks() -> StaticBenchmarkProvider {
    StaticBenchmarkProvider::new(vec![
        BenchmarkEntry::new("current_ratio", BenchmarkScope::Industry, 2.0).for_sector("Technology"),
        BenchmarkEntry::new("gross_margin", BenchmarkScope::Sector, 40.0),
        BenchmarkEntry::new("debt_to_equity", BenchmarkScope::Sector, 0.5),
        BenchmarkEntry::new("net_margin", BenchmarkScope::Global, 25.0),
        BenchmarkEntry::new("net_margin", BenchmarkScope::Industry, 30.0),
    ])
}

fn orchestrator(provider: impl BenchmarkProvider + 'static, config: EngineConfig) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(Arc::new(provider), config).unwrap()
}

fn no_history_config() -> EngineConfig {
    EngineConfig {
        derive_historical_benchmarks: false,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_current_ratio_at_benchmark_is_good() {
    let current = FinancialPeriod::new(2024)
        .with_classification("Technology", "Software")
        .with(CurrentAssets, 500_000.0)
        .with(CurrentLiabilities, 250_000.0);
    let request = AnalysisRequest::new(current).with_analyses(["current_ratio"]);

    let report = orchestrator(benchmarks(), no_history_config()).run(request).await.unwrap();
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert!(result.computed);
    assert!((result.value.as_ref().unwrap().headline() - 2.0).abs() < 1e-9);
    assert_eq!(result.status, Status::Good);
    assert_eq!(result.benchmark_outcome, BenchmarkOutcome::Anchored);
    assert_eq!(result.data_quality, DataQuality::High);
}

#[tokio::test]
async fn test_gross_margin_above_benchmark_is_excellent() {
    let current = FinancialPeriod::new(2024)
        .with(Revenue, 1_000_000.0)
        .with(Cogs, 545_000.0);
    let request = AnalysisRequest::new(current).with_analyses(["gross_margin"]);

    let report = orchestrator(benchmarks(), no_history_config()).run(request).await.unwrap();
    let result = report.result("gross_margin").unwrap();
    assert!((result.value.as_ref().unwrap().headline() - 45.5).abs() < 1e-9);
    assert_eq!(result.status, Status::Excellent);
}

#[tokio::test]
async fn test_structural_scope_excludes_other_tiers() {
    let request = full_request().with_tiers([Tier::Structural]);
    let report = orchestrator(benchmarks(), EngineConfig::default()).run(request).await.unwrap();

    assert!(!report.results.is_empty());
    assert!(report.results.iter().all(|r| r.tier == Tier::Structural));
    assert_eq!(report.metadata.requested_tiers, vec![Tier::Structural]);
    assert_eq!(report.tier_scores.keys().copied().collect::<Vec<_>>(), vec![Tier::Structural]);
}

#[tokio::test]
async fn test_missing_equity_only_affects_dependent_results() {
    let current = FinancialPeriod::new(2024)
        .with(TotalAssets, 1_000_000.0)
        .with(TotalLiabilities, 600_000.0)
        .with(CurrentAssets, 400_000.0)
        .with(CurrentLiabilities, 200_000.0);
    let request = AnalysisRequest::new(current).with_tiers([Tier::Structural]);

    let report = orchestrator(NoBenchmarks, EngineConfig::default()).run(request).await.unwrap();
    let equity = report.result("equity_ratio").unwrap();
    assert!(!equity.computed);
    assert!(equity.value.is_none());
    assert_eq!(equity.data_quality, DataQuality::Low);
    assert_eq!(equity.confidence, 0);
    assert!(equity.interpretation.contains("total_equity"));

    for id in ["debt_ratio", "current_assets_share", "working_capital"] {
        assert!(report.result(id).unwrap().computed, "{} should compute", id);
    }
}

#[tokio::test]
async fn test_zero_denominator_is_not_computed() {
    let current = FinancialPeriod::new(2024)
        .with(CurrentAssets, 500_000.0)
        .with(CurrentLiabilities, 0.0)
        .with(Cash, 10_000.0);
    let request = AnalysisRequest::new(current).with_categories(["liquidity"]);

    let report = orchestrator(NoBenchmarks, EngineConfig::default()).run(request).await.unwrap();
    let result = report.result("current_ratio").unwrap();
    assert!(!result.computed);
    assert!(result.interpretation.contains("Division by zero"));
    for r in &report.results {
        if let Some(value) = &r.value {
            assert!(value.is_finite());
        }
    }
}

#[tokio::test]
async fn test_without_benchmarks_results_are_average_and_capped() {
    let request = AnalysisRequest::new(sample_period(2024, 1.0)).with_tiers([Tier::Ratio]);
    let report = orchestrator(NoBenchmarks, EngineConfig::default()).run(request).await.unwrap();

    for result in report.results.iter().filter(|r| r.computed) {
        assert_eq!(result.status, Status::Average, "{}", result.id);
        assert!(result.confidence <= 50, "{}", result.id);
        assert_eq!(result.benchmark_outcome, BenchmarkOutcome::NoBenchmark);
    }
    assert!(report.findings.is_empty());
    assert!(report.recommendations.is_empty());
    assert!((report.overall_score - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_full_run_invariants() {
    let report = orchestrator(benchmarks(), EngineConfig::default())
        .run(full_request())
        .await
        .unwrap();

    assert_eq!(report.results.len(), formula_library::catalog().len());
    assert!(report.results.windows(2).all(|w| w[0].ordinal < w[1].ordinal));
    for result in &report.results {
        assert!(result.confidence <= 100);
        if result.computed {
            assert!(result.value.as_ref().unwrap().is_finite());
        }
    }
    assert!((0.0..=100.0).contains(&report.overall_score));
    assert!(report.findings.len() <= 5);
    assert!(report.recommendations.len() <= 5);
    assert_eq!(
        report.metadata.analyses_run,
        report.metadata.analyses_computed + report.metadata.analyses_failed
    );
    assert_eq!(report.metadata.period_range.first_year, 2021);
    assert_eq!(report.metadata.requested_tiers, Tier::ALL.to_vec());
}

#[tokio::test]
async fn test_same_input_same_report() {
    let engine = orchestrator(benchmarks(), EngineConfig::default());
    let first = engine.run(full_request()).await.unwrap();
    let second = engine.run(full_request()).await.unwrap();

    assert_eq!(first.results, second.results);
    assert_eq!(first.overall_score, second.overall_score);
    assert_eq!(first.tier_scores, second.tier_scores);
    assert_eq!(first.findings, second.findings);
    assert_eq!(first.recommendations, second.recommendations);
}

#[tokio::test]
async fn test_historical_benchmark_is_derived() {
    let request = AnalysisRequest::new(sample_period(2024, 1.0))
        .with_prior(vec![sample_period(2023, 1.0).with(CurrentLiabilities, 500_000.0)])
        .with_analyses(["current_ratio"]);

    let report = orchestrator(NoBenchmarks, EngineConfig::default()).run(request.clone()).await.unwrap();
    let result = report.result("current_ratio").unwrap();
    let historical = result
        .benchmarks
        .iter()
        .find(|b| b.scope == BenchmarkScope::CompanyHistorical)
        .unwrap();
    // 2023: 500k / 500k
    assert!((historical.value - 1.0).abs() < 1e-9);
    assert_eq!(result.benchmark_outcome, BenchmarkOutcome::Anchored);
    assert_eq!(result.status, Status::Excellent);

    let report = orchestrator(NoBenchmarks, no_history_config()).run(request).await.unwrap();
    assert!(report.result("current_ratio").unwrap().benchmarks.is_empty());
}

#[tokio::test]
async fn test_multiple_benchmarks_take_median() {
    // net margin 13% is critical against both 25% and 30%
    let request = AnalysisRequest::new(sample_period(2024, 1.0)).with_analyses(["net_margin"]);
    let report = orchestrator(benchmarks(), no_history_config()).run(request).await.unwrap();
    let result = report.result("net_margin").unwrap();
    assert_eq!(result.benchmarks.len(), 2);
    assert_eq!(result.status, Status::Critical);
    assert!(result.confidence >= 95);
    assert_eq!(report.recommendations[0].analysis_id, "net_margin");
}

#[tokio::test]
async fn test_estimated_inputs_lower_data_quality() {
    let current = FinancialPeriod::new(2024)
        .with(Revenue, 1_000_000.0)
        .with(GrossProfit, 455_000.0);
    let request = AnalysisRequest::new(current).with_analyses(["gross_margin"]);

    let report = orchestrator(benchmarks(), no_history_config()).run(request).await.unwrap();
    let result = report.result("gross_margin").unwrap();
    assert!(result.computed);
    assert_eq!(result.data_quality, DataQuality::Medium);
    assert!(!result.estimated_inputs.is_empty());
    // single benchmark confidence 70, scaled by 0.85
    assert_eq!(result.confidence, 60);
}

#[tokio::test]
async fn test_provider_timeout_degrades_to_no_benchmark() {
    let config = EngineConfig {
        benchmark_timeout: Duration::from_millis(20),
        ..no_history_config()
    };
    let request = AnalysisRequest::new(sample_period(2024, 1.0)).with_analyses(["current_ratio", "quick_ratio"]);

    let report = orchestrator(SlowProvider { delay: Duration::from_secs(5) }, config)
        .run(request)
        .await
        .unwrap();
    for result in &report.results {
        assert_eq!(result.benchmark_outcome, BenchmarkOutcome::ProviderTimeout);
        assert_eq!(result.status, Status::Average);
        assert!(result.confidence <= 50);
    }
}

#[tokio::test]
async fn test_provider_error_degrades_to_no_benchmark() {
    let request = AnalysisRequest::new(sample_period(2024, 1.0)).with_tiers([Tier::CashFlow]);
    let report = orchestrator(FailingProvider, no_history_config()).run(request).await.unwrap();
    assert!(report
        .results
        .iter()
        .filter(|r| r.computed)
        .all(|r| r.benchmark_outcome == BenchmarkOutcome::ProviderError));
}

#[tokio::test]
async fn test_cancellation_discards_run() {
    let engine = orchestrator(SlowProvider { delay: Duration::from_secs(5) }, no_history_config());
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let result = engine.run_with_cancel(full_request(), token).await;
    assert!(matches!(result, Err(AnalysisError::Cancelled)));

    let token = CancellationToken::new();
    token.cancel();
    let result = engine.run_with_cancel(full_request(), token).await;
    assert!(matches!(result, Err(AnalysisError::Cancelled)));
}

#[tokio::test]
async fn test_validation_errors_are_fatal() {
    let engine = orchestrator(NoBenchmarks, EngineConfig::default());

    let request = full_request().with_categories(["astrology"]);
    assert!(matches!(
        engine.run(request).await,
        Err(AnalysisError::Validation(ValidationError::UnknownCategory(_)))
    ));

    let request = AnalysisRequest::new(sample_period(2024, 1.0).with(Cash, -5.0));
    assert!(matches!(
        engine.run(request).await,
        Err(AnalysisError::Validation(ValidationError::NegativeValue { .. }))
    ));
}

#[tokio::test]
async fn test_context_overrides_period_classification() {
    let current = FinancialPeriod::new(2024)
        .with_classification("Utilities", "Electric")
        .with(CurrentAssets, 500_000.0)
        .with(CurrentLiabilities, 250_000.0);
    let request = AnalysisRequest::new(current)
        .with_analyses(["current_ratio"])
        .with_context(CompanyContext {
            sector: Some("Technology".into()),
            industry: None,
            geography: None,
        });

    let report = orchestrator(benchmarks(), no_history_config()).run(request).await.unwrap();
    assert_eq!(report.results[0].benchmarks.len(), 1);
}

#[tokio::test]
async fn test_non_finite_benchmarks_are_discarded() {
    let request = AnalysisRequest::new(sample_period(2024, 1.0)).with_analyses(["current_ratio", "quick_ratio"]);
    let report = orchestrator(NanProvider, no_history_config()).run(request).await.unwrap();

    let quick = report.result("quick_ratio").unwrap();
    assert!(quick.benchmarks.is_empty());
    assert_eq!(quick.benchmark_outcome, BenchmarkOutcome::NoBenchmark);
    assert_eq!(quick.status, Status::Average);
    assert!(!quick.interpretation.contains("NaN"));

    let current = report.result("current_ratio").unwrap();
    assert_eq!(current.benchmarks.len(), 1);
    assert_eq!(current.benchmarks[0].scope, BenchmarkScope::Industry);
    assert_eq!(current.benchmark_outcome, BenchmarkOutcome::Anchored);
    assert_eq!(current.status, Status::Good);

    let json = export::to_flat_json(&report).unwrap();
    assert_eq!(export::from_flat_json(&json).unwrap(), report);
}

#[tokio::test]
async fn test_private_altman_uses_private_zones() {
    // Z' about 1.64: grey zone for private firms, distress under the listed model
    let current = FinancialPeriod::new(2024)
        .with(TotalAssets, 1_000.0)
        .with(CurrentAssets, 300.0)
        .with(CurrentLiabilities, 200.0)
        .with(TotalEquity, 400.0)
        .with(OperatingIncome, 50.0)
        .with(TotalLiabilities, 600.0)
        .with(Revenue, 800.0);
    let request = AnalysisRequest::new(current).with_analyses(["altman_z_score"]);

    let report = orchestrator(NoBenchmarks, EngineConfig::default()).run(request).await.unwrap();
    let result = report.result("altman_z_score").unwrap();
    assert!(result.computed);
    assert_eq!(result.risk_level, RiskLevel::Medium);
}

#[tokio::test]
async fn test_flat_export_round_trips() {
    let report = orchestrator(benchmarks(), EngineConfig::default())
        .run(full_request())
        .await
        .unwrap();

    let json = export::to_flat_json(&report).unwrap();
    let restored = export::from_flat_json(&json).unwrap();
    assert_eq!(restored, report);

    let flat = FlatReport::from(&report);
    assert!(flat.analyses.contains_key("dupont_analysis"));
    assert_eq!(AnalysisReport::from(flat), report);
}

#[test]
fn test_invalid_policy_rejected() {
    let mut config = EngineConfig::default();
    config.policy.good_multiplier = 2.0;
    assert!(AnalysisOrchestrator::new(Arc::new(NoBenchmarks), config).is_err());
}
