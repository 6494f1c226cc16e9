use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::period::FinancialPeriod;

/// Escalating complexity groupings of analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Structural,
    Ratio,
    CashFlow,
    Advanced,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Structural, Tier::Ratio, Tier::CashFlow, Tier::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Structural => "structural",
            Tier::Ratio => "ratio",
            Tier::CashFlow => "cash_flow",
            Tier::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "structural" => Ok(Tier::Structural),
            "ratio" => Ok(Tier::Ratio),
            "cash_flow" | "cashflow" => Ok(Tier::CashFlow),
            "advanced" => Ok(Tier::Advanced),
            other => Err(ValidationError::UnknownTier(other.to_string())),
        }
    }
}

/// How a value should be compared against its benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonDirection {
    HigherIsBetter,
    LowerIsBetter,
    TargetRange,
}

impl ComparisonDirection {
    pub fn describe(&self) -> &'static str {
        match self {
            ComparisonDirection::HigherIsBetter => "higher is better",
            ComparisonDirection::LowerIsBetter => "lower is better",
            ComparisonDirection::TargetRange => "closer to benchmark is better",
        }
    }
}

/// Five-level qualitative classification, ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Excellent,
    Good,
    Average,
    Poor,
    Critical,
}

impl Status {
    /// Score used by report aggregation (excellent=100 … critical=0)
    pub fn to_score(&self) -> f64 {
        match self {
            Status::Excellent => 100.0,
            Status::Good => 75.0,
            Status::Average => 50.0,
            Status::Poor => 25.0,
            Status::Critical => 0.0,
        }
    }

    /// Severity rank: 0 for excellent up to 4 for critical.
    pub fn severity(&self) -> usize {
        match self {
            Status::Excellent => 0,
            Status::Good => 1,
            Status::Average => 2,
            Status::Poor => 3,
            Status::Critical => 4,
        }
    }

    pub fn from_severity(rank: usize) -> Self {
        match rank {
            0 => Status::Excellent,
            1 => Status::Good,
            2 => Status::Average,
            3 => Status::Poor,
            _ => Status::Critical,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Status::Excellent => "excellent",
            Status::Good => "good",
            Status::Average => "average",
            Status::Poor => "poor",
            Status::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_status(status: Status) -> Self {
        match status {
            Status::Excellent | Status::Good => RiskLevel::Low,
            Status::Average => RiskLevel::Medium,
            Status::Poor | Status::Critical => RiskLevel::High,
        }
    }
}

/// Absolute danger thresholds for volatility-type analyses (leverage,
/// liquidity, coverage, distress scores). Risk for these is read off the raw
/// value instead of being mirrored from the benchmark status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskBand {
    /// Low risk at or above `safe_above`, high risk below `danger_below`
    Floor { safe_above: f64, danger_below: f64 },
    /// Low risk at or below `safe_below`, high risk above `danger_above`
    Ceiling { safe_below: f64, danger_above: f64 },
}

impl RiskBand {
    pub fn assess(&self, value: f64) -> RiskLevel {
        match *self {
            RiskBand::Floor {
                safe_above,
                danger_below,
            } => {
                if value >= safe_above {
                    RiskLevel::Low
                } else if value < danger_below {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                }
            }
            RiskBand::Ceiling {
                safe_below,
                danger_above,
            } => {
                if value <= safe_below {
                    RiskLevel::Low
                } else if value > danger_above {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                }
            }
        }
    }
}

/// How complete the inputs behind a result were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    High,
    Medium,
    Low,
}

/// Where a benchmark figure comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkScope {
    CompanyHistorical,
    Industry,
    Sector,
    National,
    Regional,
    Global,
}

impl BenchmarkScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkScope::CompanyHistorical => "company_historical",
            BenchmarkScope::Industry => "industry",
            BenchmarkScope::Sector => "sector",
            BenchmarkScope::National => "national",
            BenchmarkScope::Regional => "regional",
            BenchmarkScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkValue {
    pub scope: BenchmarkScope,
    pub value: f64,
    #[serde(default)]
    pub source: Option<String>,
}

impl BenchmarkValue {
    pub fn new(scope: BenchmarkScope, value: f64) -> Self {
        Self {
            scope,
            value,
            source: None,
        }
    }
}

/// What happened when benchmarks were looked up for a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkOutcome {
    Anchored,
    NoBenchmark,
    ProviderTimeout,
    ProviderError,
    /// Value was never computed, so no lookup happened
    Skipped,
}

/// Lookup key handed to a benchmark provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchmarkQuery {
    pub analysis_id: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub geography: Option<String>,
    pub period: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub en: String,
    pub ar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub value: f64,
}

/// Computed value of an analysis.
///
/// Every variant carries a `primary` headline figure so classification can
/// treat structured outputs uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisValue {
    Scalar {
        value: f64,
    },
    Breakdown {
        primary: f64,
        components: BTreeMap<String, f64>,
    },
    Trend {
        primary: f64,
        points: Vec<TrendPoint>,
    },
}

impl AnalysisValue {
    pub fn scalar(value: f64) -> Self {
        AnalysisValue::Scalar { value }
    }

    pub fn headline(&self) -> f64 {
        match self {
            AnalysisValue::Scalar { value } => *value,
            AnalysisValue::Breakdown { primary, .. } => *primary,
            AnalysisValue::Trend { primary, .. } => *primary,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            AnalysisValue::Scalar { value } => value.is_finite(),
            AnalysisValue::Breakdown { primary, components } => {
                primary.is_finite() && components.values().all(|v| v.is_finite())
            }
            AnalysisValue::Trend { primary, points } => {
                primary.is_finite() && points.iter().all(|p| p.value.is_finite())
            }
        }
    }
}

/// Outcome of classifying one value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub status: Status,
    pub risk_level: RiskLevel,
    pub confidence: u8,
}

/// One analysis, fully evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    /// Position in the catalog, used to keep report order stable
    pub ordinal: usize,
    pub name: LocalizedName,
    pub tier: Tier,
    pub category: String,
    pub computed: bool,
    pub value: Option<AnalysisValue>,
    pub formula: String,
    pub interpretation: String,
    pub benchmarks: Vec<BenchmarkValue>,
    pub benchmark_outcome: BenchmarkOutcome,
    pub status: Status,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub data_quality: DataQuality,
    #[serde(default)]
    pub estimated_inputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub analysis_id: String,
    pub name: String,
    pub status: Status,
    pub confidence: u8,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub analysis_id: String,
    pub name: String,
    pub priority: Priority,
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub first_year: i32,
    pub last_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub requested_tiers: Vec<Tier>,
    #[serde(default)]
    pub requested_categories: Vec<String>,
    #[serde(default)]
    pub requested_analyses: Vec<String>,
    pub period_range: PeriodRange,
    pub generated_at: DateTime<Utc>,
    pub analyses_run: usize,
    pub analyses_computed: usize,
    pub analyses_failed: usize,
    pub engine_version: String,
}

/// Final output of one engine run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub results: Vec<AnalysisResult>,
    pub overall_score: f64,
    pub tier_scores: BTreeMap<Tier, f64>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub metadata: RunMetadata,
}

impl AnalysisReport {
    pub fn result(&self, id: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn results_for_tier(&self, tier: Tier) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter().filter(move |r| r.tier == tier)
    }
}

/// Company context used for benchmark lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyContext {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub geography: Option<String>,
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub current: FinancialPeriod,
    /// Ordered oldest to newest, all before `current`
    #[serde(default)]
    pub prior: Vec<FinancialPeriod>,
    #[serde(default)]
    pub peers: Vec<FinancialPeriod>,
    /// Empty means every tier
    #[serde(default)]
    pub tiers: Vec<Tier>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub analyses: Vec<String>,
    #[serde(default)]
    pub context: CompanyContext,
}

impl AnalysisRequest {
    pub fn new(current: FinancialPeriod) -> Self {
        Self {
            current,
            prior: Vec::new(),
            peers: Vec::new(),
            tiers: Vec::new(),
            categories: Vec::new(),
            analyses: Vec::new(),
            context: CompanyContext::default(),
        }
    }

    pub fn with_prior(mut self, prior: Vec<FinancialPeriod>) -> Self {
        self.prior = prior;
        self
    }

    pub fn with_peers(mut self, peers: Vec<FinancialPeriod>) -> Self {
        self.peers = peers;
        self
    }

    pub fn with_tiers(mut self, tiers: impl IntoIterator<Item = Tier>) -> Self {
        self.tiers = tiers.into_iter().collect();
        self
    }

    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_analyses<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.analyses = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, context: CompanyContext) -> Self {
        self.context = context;
        self
    }

    /// Context fields fall back to the current period's own classification.
    pub fn effective_context(&self) -> CompanyContext {
        CompanyContext {
            sector: self.context.sector.clone().or_else(|| self.current.sector.clone()),
            industry: self.context.industry.clone().or_else(|| self.current.industry.clone()),
            geography: self.context.geography.clone(),
        }
    }

    pub fn period_range(&self) -> PeriodRange {
        PeriodRange {
            first_year: self.prior.first().map_or(self.current.year, |p| p.year),
            last_year: self.current.year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing() {
        assert_eq!("structural".parse::<Tier>().unwrap(), Tier::Structural);
        assert_eq!("Cash-Flow".parse::<Tier>().unwrap(), Tier::CashFlow);
        assert!(matches!(
            "quantum".parse::<Tier>(),
            Err(ValidationError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_status_severity_roundtrip() {
        for status in [
            Status::Excellent,
            Status::Good,
            Status::Average,
            Status::Poor,
            Status::Critical,
        ] {
            assert_eq!(Status::from_severity(status.severity()), status);
        }
        assert!(Status::Excellent.to_score() > Status::Critical.to_score());
    }

    #[test]
    fn test_risk_mirrors_status() {
        assert_eq!(RiskLevel::from_status(Status::Good), RiskLevel::Low);
        assert_eq!(RiskLevel::from_status(Status::Average), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_status(Status::Critical), RiskLevel::High);
    }

    #[test]
    fn test_risk_band_assessment() {
        let liquidity = RiskBand::Floor {
            safe_above: 1.5,
            danger_below: 1.0,
        };
        assert_eq!(liquidity.assess(2.0), RiskLevel::Low);
        assert_eq!(liquidity.assess(1.2), RiskLevel::Medium);
        assert_eq!(liquidity.assess(0.8), RiskLevel::High);

        let leverage = RiskBand::Ceiling {
            safe_below: 1.0,
            danger_above: 2.0,
        };
        assert_eq!(leverage.assess(0.5), RiskLevel::Low);
        assert_eq!(leverage.assess(2.0), RiskLevel::Medium);
        assert_eq!(leverage.assess(3.5), RiskLevel::High);
    }

    #[test]
    fn test_value_tagging() {
        let value = AnalysisValue::scalar(2.0);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["kind"], "scalar");
        assert_eq!(value.headline(), 2.0);

        let bad = AnalysisValue::Breakdown {
            primary: 1.0,
            components: BTreeMap::from([("x".to_string(), f64::NAN)]),
        };
        assert!(!bad.is_finite());
    }

    #[test]
    fn test_effective_context_falls_back_to_period() {
        let period = FinancialPeriod::new(2024).with_classification("energy", "oil_gas");
        let request = AnalysisRequest::new(period).with_context(CompanyContext {
            sector: None,
            industry: Some("refining".into()),
            geography: Some("SA".into()),
        });
        let ctx = request.effective_context();
        assert_eq!(ctx.sector.as_deref(), Some("energy"));
        assert_eq!(ctx.industry.as_deref(), Some("refining"));
        assert_eq!(ctx.geography.as_deref(), Some("SA"));
    }
}
