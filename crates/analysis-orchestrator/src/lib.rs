use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use classification_engine::Classifier;
use formula_library::{catalog, AnalysisDefinition, Catalog, Computation, FormulaInput};
use statement_core::{
    AnalysisError, AnalysisReport, AnalysisRequest, AnalysisResult, BenchmarkOutcome, BenchmarkProvider,
    BenchmarkQuery, BenchmarkScope, BenchmarkValue, Classification, CompanyContext, ComputationError, DataQuality,
    ProviderError, RiskLevel, RunMetadata, Status, Tier,
};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod aggregate;
pub mod config;
pub mod export;
pub mod interpret;
pub mod phase;
pub mod validation;

#[cfg(test)]
mod tests;

pub use config::EngineConfig;
pub use export::FlatReport;
pub use phase::{RunPhase, RunTracker};

/// What the computing phase produced for one definition.
enum UnitOutcome {
    Computed {
        computation: Computation,
        /// Same formula evaluated one period earlier
        historical: Option<(i32, f64)>,
    },
    NotComputed(ComputationError),
    Aborted(String),
}

struct ComputedUnit {
    ordinal: usize,
    def: &'static AnalysisDefinition,
    outcome: UnitOutcome,
}

struct BenchmarkLookup {
    benchmarks: Vec<BenchmarkValue>,
    outcome: BenchmarkOutcome,
}

/// Runs requested analyses over a company's statements and assembles the report.
pub struct AnalysisOrchestrator {
    provider: Arc<dyn BenchmarkProvider>,
    classifier: Classifier,
    config: EngineConfig,
    catalog: &'static Catalog,
}

impl AnalysisOrchestrator {
    pub fn new(provider: Arc<dyn BenchmarkProvider>, config: EngineConfig) -> Result<Self, AnalysisError> {
        let classifier = Classifier::new(config.policy)
            .map_err(|e| AnalysisError::Internal(format!("invalid classification policy: {}", e)))?;
        Ok(Self {
            provider,
            classifier,
            config,
            catalog: catalog(),
        })
    }

    pub fn with_defaults(provider: Arc<dyn BenchmarkProvider>) -> Self {
        Self {
            provider,
            classifier: Classifier::default(),
            config: EngineConfig::default(),
            catalog: catalog(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Execute one run. Cancelling `token` abandons outstanding benchmark
    /// lookups and discards everything computed so far.
    pub async fn run_with_cancel(
        &self,
        request: AnalysisRequest,
        token: CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError> {
        let mut tracker = RunTracker::new();
        let result = self.execute(request, &token, &mut tracker).await;
        if let Err(e) = &result {
            tracker.fail(&e.to_string());
        }
        result
    }

    async fn execute(
        &self,
        request: AnalysisRequest,
        token: &CancellationToken,
        tracker: &mut RunTracker,
    ) -> Result<AnalysisReport, AnalysisError> {
        tracker.advance(RunPhase::Validating)?;
        let scope = validation::validate_request(&request, self.catalog)?;
        info!(
            year = request.current.year,
            analyses = scope.len(),
            prior_periods = request.prior.len(),
            provider = self.provider.provider_name(),
            "Starting statement analysis"
        );
        ensure_active(token)?;

        tracker.advance(RunPhase::Computing)?;
        let request = Arc::new(request);
        let units = self.compute_all(&scope, &request).await;
        ensure_active(token)?;

        tracker.advance(RunPhase::Classifying)?;
        let context = request.effective_context();
        let lookups = self.lookup_all(&units, &context, request.current.year, token).await?;
        let results: Vec<AnalysisResult> = units
            .into_iter()
            .zip(lookups)
            .map(|(unit, lookup)| self.assemble(unit, lookup))
            .collect();
        ensure_active(token)?;

        tracker.advance(RunPhase::Aggregating)?;
        let report = self.aggregate(&request, results);

        tracker.advance(RunPhase::Completed)?;
        info!(
            score = report.overall_score,
            computed = report.metadata.analyses_computed,
            failed = report.metadata.analyses_failed,
            "Statement analysis complete"
        );
        Ok(report)
    }

    /// Evaluate every in-scope formula on its own task. A failing or panicking
    /// formula only affects its own result.
    async fn compute_all(
        &self,
        scope: &[validation::ScopedDefinition],
        request: &Arc<AnalysisRequest>,
    ) -> Vec<ComputedUnit> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let derive_historical = self.config.derive_historical_benchmarks;
        let mut handles = Vec::with_capacity(scope.len());

        for &(ordinal, def) in scope {
            let semaphore = Arc::clone(&semaphore);
            let request = Arc::clone(request);
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let input = validation::formula_input(&request);
                compute_unit(def, &input, derive_historical)
            });
            handles.push((ordinal, def, handle));
        }

        let mut units = Vec::with_capacity(handles.len());
        for (ordinal, def, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(analysis = def.id, error = %e, "Analysis task aborted");
                    UnitOutcome::Aborted(e.to_string())
                }
            };
            units.push(ComputedUnit { ordinal, def, outcome });
        }
        units
    }

    /// One benchmark lookup per computed unit, bounded like the computing phase.
    async fn lookup_all(
        &self,
        units: &[ComputedUnit],
        context: &CompanyContext,
        year: i32,
        token: &CancellationToken,
    ) -> Result<Vec<Option<BenchmarkLookup>>, AnalysisError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(units.len());

        for unit in units {
            if !matches!(unit.outcome, UnitOutcome::Computed { .. }) {
                handles.push(None);
                continue;
            }
            let query = BenchmarkQuery {
                analysis_id: unit.def.id.to_string(),
                sector: context.sector.clone(),
                industry: context.industry.clone(),
                geography: context.geography.clone(),
                period: year,
            };
            let semaphore = Arc::clone(&semaphore);
            let provider = Arc::clone(&self.provider);
            let token = token.clone();
            let timeout = self.config.benchmark_timeout;
            handles.push(Some(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                lookup_benchmarks(provider, query, timeout, token).await
            })));
        }

        let mut lookups = Vec::with_capacity(handles.len());
        for handle in handles {
            let Some(handle) = handle else {
                lookups.push(None);
                continue;
            };
            let lookup = match handle.await {
                Ok(Some(lookup)) => lookup,
                Ok(None) => return Err(AnalysisError::Cancelled),
                Err(e) => {
                    warn!(error = %e, "Benchmark lookup task aborted");
                    BenchmarkLookup {
                        benchmarks: Vec::new(),
                        outcome: BenchmarkOutcome::ProviderError,
                    }
                }
            };
            lookups.push(Some(lookup));
        }
        Ok(lookups)
    }

    fn assemble(&self, unit: ComputedUnit, lookup: Option<BenchmarkLookup>) -> AnalysisResult {
        let ComputedUnit { ordinal, def, outcome } = unit;

        let (computation, historical) = match outcome {
            UnitOutcome::Computed {
                computation,
                historical,
            } => (computation, historical),
            UnitOutcome::NotComputed(err) => {
                debug!(analysis = def.id, error = %err, "Analysis not computable");
                return not_computed(ordinal, def, interpret::not_computed(&err));
            }
            UnitOutcome::Aborted(reason) => return not_computed(ordinal, def, interpret::failed(&reason)),
        };

        let BenchmarkLookup {
            mut benchmarks,
            mut outcome,
        } = lookup.unwrap_or(BenchmarkLookup {
            benchmarks: Vec::new(),
            outcome: BenchmarkOutcome::NoBenchmark,
        });

        if let Some((year, value)) = historical {
            let provided = benchmarks.iter().any(|b| b.scope == BenchmarkScope::CompanyHistorical);
            if !provided && value.is_finite() {
                benchmarks.push(BenchmarkValue {
                    scope: BenchmarkScope::CompanyHistorical,
                    value,
                    source: Some(format!("company {}", year)),
                });
            }
        }
        if !benchmarks.is_empty() {
            outcome = BenchmarkOutcome::Anchored;
        }

        let headline = computation.value.headline();
        let data_quality = if computation.estimated.is_empty() {
            DataQuality::High
        } else {
            DataQuality::Medium
        };
        let risk_band = computation.risk_band.or(def.risk_band);
        let classification = self.classifier.classify(headline, def.direction, &benchmarks, risk_band);
        let Classification {
            status,
            risk_level,
            confidence,
        } = self.classifier.adjust_for_quality(classification, data_quality);

        let interpretation = interpret::computed(
            def,
            &computation.value,
            status,
            &benchmarks,
            outcome,
            &computation.estimated,
        );
        debug!(analysis = def.id, value = headline, status = status.to_label(), confidence, "Analysis classified");

        AnalysisResult {
            id: def.id.to_string(),
            ordinal,
            name: def.localized_name(),
            tier: def.tier,
            category: def.category.to_string(),
            computed: true,
            value: Some(computation.value),
            formula: def.formula_text.to_string(),
            interpretation,
            benchmarks,
            benchmark_outcome: outcome,
            status,
            risk_level,
            confidence,
            data_quality,
            estimated_inputs: computation.estimated,
        }
    }

    fn aggregate(&self, request: &AnalysisRequest, results: Vec<AnalysisResult>) -> AnalysisReport {
        let computed = results.iter().filter(|r| r.computed).count();
        let requested_tiers = if request.tiers.is_empty() {
            Tier::ALL.to_vec()
        } else {
            let mut tiers = request.tiers.clone();
            tiers.sort();
            tiers.dedup();
            tiers
        };

        let metadata = RunMetadata {
            requested_tiers,
            requested_categories: request.categories.clone(),
            requested_analyses: request.analyses.clone(),
            period_range: request.period_range(),
            generated_at: Utc::now(),
            analyses_run: results.len(),
            analyses_computed: computed,
            analyses_failed: results.len() - computed,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        AnalysisReport {
            overall_score: aggregate::weighted_score(&results),
            tier_scores: aggregate::tier_scores(&results),
            findings: aggregate::findings(&results, self.config.top_findings),
            recommendations: aggregate::recommendations(&results, self.catalog, self.config.top_recommendations),
            results,
            metadata,
        }
    }
}

fn ensure_active(token: &CancellationToken) -> Result<(), AnalysisError> {
    if token.is_cancelled() {
        Err(AnalysisError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run one formula, refusing inputs it cannot use and non-finite output.
fn evaluate(def: &AnalysisDefinition, input: &FormulaInput<'_>) -> Result<Computation, ComputationError> {
    if let Some(field) = def.missing_fields(input).into_iter().next() {
        return Err(ComputationError::MissingField(field));
    }
    if input.prior.len() < def.min_history {
        return Err(ComputationError::InsufficientHistory {
            required: def.min_history,
            available: input.prior.len(),
        });
    }

    let computation = def.evaluate(input)?;
    if !computation.value.is_finite() {
        return Err(ComputationError::NonFinite(def.id.to_string()));
    }
    Ok(computation)
}

fn compute_unit(def: &AnalysisDefinition, input: &FormulaInput<'_>, derive_historical: bool) -> UnitOutcome {
    match evaluate(def, input) {
        Ok(computation) => {
            let historical = if derive_historical {
                input.shifted().and_then(|previous| {
                    evaluate(def, &previous)
                        .ok()
                        .map(|c| (previous.current.year, c.value.headline()))
                })
            } else {
                None
            };
            UnitOutcome::Computed {
                computation,
                historical,
            }
        }
        Err(err) => UnitOutcome::NotComputed(err),
    }
}

/// `None` when the run was cancelled while waiting on the provider.
async fn lookup_benchmarks(
    provider: Arc<dyn BenchmarkProvider>,
    query: BenchmarkQuery,
    timeout: Duration,
    token: CancellationToken,
) -> Option<BenchmarkLookup> {
    let result = tokio::select! {
        _ = token.cancelled() => return None,
        result = tokio::time::timeout(timeout, provider.lookup(&query)) => result,
    };

    let lookup = match result {
        Ok(Ok(mut benchmarks)) => {
            let returned = benchmarks.len();
            benchmarks.retain(|b| b.value.is_finite());
            if benchmarks.len() < returned {
                warn!(
                    analysis = %query.analysis_id,
                    dropped = returned - benchmarks.len(),
                    "Provider returned non-finite benchmark values"
                );
            }
            let outcome = if benchmarks.is_empty() {
                BenchmarkOutcome::NoBenchmark
            } else {
                BenchmarkOutcome::Anchored
            };
            BenchmarkLookup { benchmarks, outcome }
        }
        Ok(Err(ProviderError::Timeout)) | Err(_) => {
            warn!(analysis = %query.analysis_id, "Benchmark lookup timed out");
            BenchmarkLookup {
                benchmarks: Vec::new(),
                outcome: BenchmarkOutcome::ProviderTimeout,
            }
        }
        Ok(Err(e)) => {
            warn!(analysis = %query.analysis_id, error = %e, "Benchmark lookup failed");
            BenchmarkLookup {
                benchmarks: Vec::new(),
                outcome: BenchmarkOutcome::ProviderError,
            }
        }
    };
    Some(lookup)
}

fn not_computed(ordinal: usize, def: &AnalysisDefinition, interpretation: String) -> AnalysisResult {
    AnalysisResult {
        id: def.id.to_string(),
        ordinal,
        name: def.localized_name(),
        tier: def.tier,
        category: def.category.to_string(),
        computed: false,
        value: None,
        formula: def.formula_text.to_string(),
        interpretation,
        benchmarks: Vec::new(),
        benchmark_outcome: BenchmarkOutcome::Skipped,
        status: Status::Average,
        risk_level: RiskLevel::Medium,
        confidence: 0,
        data_quality: DataQuality::Low,
        estimated_inputs: Vec::new(),
    }
}
