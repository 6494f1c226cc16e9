use statement_core::{
    BenchmarkValue, Classification, ComparisonDirection, DataQuality, RiskBand, RiskLevel, Status,
};
use tracing::debug;

use crate::policy::{ClassificationPolicy, PolicyError};

/// Absorbs rounding noise at band edges (e.g. `40.0 * 1.1` vs `44.0`).
const BAND_TOLERANCE: f64 = 1e-9;
const MEDIUM_QUALITY_FACTOR: f64 = 0.85;
const MIN_SPLIT_CONFIDENCE: f64 = 20.0;
const MAX_SPLIT_CONFIDENCE: f64 = 90.0;

/// Grades computed values against benchmarks.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    policy: ClassificationPolicy,
}

impl Classifier {
    pub fn new(policy: ClassificationPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    /// Status of `value` against a single benchmark figure.
    pub fn status_against(&self, value: f64, benchmark: f64, direction: ComparisonDirection) -> Status {
        if benchmark.abs() < f64::EPSILON {
            return compare_by_sign(value, direction);
        }

        match direction {
            ComparisonDirection::HigherIsBetter => {
                grade_outperformance((value - benchmark) / benchmark.abs(), self.policy.directional_bands())
            }
            ComparisonDirection::LowerIsBetter => {
                grade_outperformance((benchmark - value) / benchmark.abs(), self.policy.directional_bands())
            }
            ComparisonDirection::TargetRange => {
                let deviation = (value - benchmark).abs() / benchmark.abs();
                let bands = self.policy.target_bands();
                let rank = bands
                    .iter()
                    .position(|limit| deviation <= limit + BAND_TOLERANCE)
                    .unwrap_or(bands.len());
                Status::from_severity(rank)
            }
        }
    }

    /// Classify a computed value.
    ///
    /// Non-finite benchmark figures are ignored. Risk mirrors the status
    /// unless the analysis carries an absolute risk band.
    pub fn classify(
        &self,
        value: f64,
        direction: ComparisonDirection,
        benchmarks: &[BenchmarkValue],
        risk_band: Option<RiskBand>,
    ) -> Classification {
        let usable: Vec<&BenchmarkValue> = benchmarks.iter().filter(|b| b.value.is_finite()).collect();
        if usable.len() < benchmarks.len() {
            debug!(
                dropped = benchmarks.len() - usable.len(),
                "Ignoring non-finite benchmark values"
            );
        }

        let (status, confidence) = match usable.len() {
            0 => (Status::Average, self.policy.no_benchmark_confidence_cap),
            1 => (
                self.status_against(value, usable[0].value, direction),
                self.policy.single_benchmark_confidence,
            ),
            _ => {
                let statuses: Vec<Status> = usable
                    .iter()
                    .map(|b| self.status_against(value, b.value, direction))
                    .collect();
                consensus(&statuses, self.policy.single_benchmark_confidence)
            }
        };

        let risk_level = match risk_band {
            Some(band) => band.assess(value),
            None => RiskLevel::from_status(status),
        };

        Classification {
            status,
            risk_level,
            confidence: confidence.min(100),
        }
    }

    /// Scale confidence down for results that relied on estimated inputs.
    /// Results that were never computed carry no confidence at all.
    pub fn adjust_for_quality(&self, classification: Classification, quality: DataQuality) -> Classification {
        let confidence = match quality {
            DataQuality::High => classification.confidence,
            DataQuality::Medium => (classification.confidence as f64 * MEDIUM_QUALITY_FACTOR).round() as u8,
            DataQuality::Low => 0,
        };
        Classification {
            confidence,
            ..classification
        }
    }
}

/// Map a relative outperformance to a status using descending lower bounds.
fn grade_outperformance(relative: f64, bands: [f64; 4]) -> Status {
    let rank = bands
        .iter()
        .position(|floor| relative >= floor - BAND_TOLERANCE)
        .unwrap_or(bands.len());
    Status::from_severity(rank)
}

/// A zero benchmark has no scale, so only the side of zero matters.
fn compare_by_sign(value: f64, direction: ComparisonDirection) -> Status {
    let at_benchmark = value.abs() < f64::EPSILON;
    match direction {
        ComparisonDirection::TargetRange if at_benchmark => Status::Excellent,
        ComparisonDirection::TargetRange => Status::Poor,
        _ if at_benchmark => Status::Good,
        ComparisonDirection::HigherIsBetter if value > 0.0 => Status::Excellent,
        ComparisonDirection::LowerIsBetter if value < 0.0 => Status::Excellent,
        _ => Status::Critical,
    }
}

/// Median status across benchmarks and a confidence reflecting how well the
/// benchmarks agree. With an even count the worse of the two middle statuses
/// wins, which for severities sorted ascending is always index `n / 2`.
fn consensus(statuses: &[Status], single_confidence: u8) -> (Status, u8) {
    let mut severities: Vec<usize> = statuses.iter().map(Status::severity).collect();
    severities.sort_unstable();
    let n = severities.len();
    let median = severities[n / 2];
    let spread = severities[n - 1] - severities[0];

    if spread == 0 {
        let confidence = (95 + (n - 2).min(5)) as u8;
        return (Status::from_severity(median), confidence);
    }

    let agreement = severities.iter().filter(|s| **s == median).count() as f64 / n as f64;
    let confidence = single_confidence as f64 * (0.5 + 0.5 * agreement) - 5.0 * (spread as f64 - 1.0);
    let confidence = confidence.clamp(MIN_SPLIT_CONFIDENCE, MAX_SPLIT_CONFIDENCE).round() as u8;
    (Status::from_severity(median), confidence)
}
