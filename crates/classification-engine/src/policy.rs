use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("{name} must be a positive finite number, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{higher} ({higher_value}) must be greater than {lower} ({lower_value})")]
    Unordered {
        higher: &'static str,
        higher_value: f64,
        lower: &'static str,
        lower_value: f64,
    },

    #[error("{name} must be within 0..=100, got {value}")]
    ConfidenceOutOfRange { name: &'static str, value: u8 },
}

/// Benchmark multipliers and confidence settings used to grade a value.
///
/// For higher-is-better analyses a value at or above `benchmark × excellent`
/// is excellent, at or above `benchmark × good` is good, and so on down to
/// critical. Lower-is-better analyses mirror the bands around 1.0, and
/// target-range analyses derive symmetric deviation bands from the same
/// multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    pub excellent_multiplier: f64,
    pub good_multiplier: f64,
    pub average_multiplier: f64,
    pub poor_multiplier: f64,
    /// Highest confidence a result without any benchmark may carry
    pub no_benchmark_confidence_cap: u8,
    /// Confidence for a result graded against exactly one benchmark
    pub single_benchmark_confidence: u8,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            excellent_multiplier: 1.1,
            good_multiplier: 1.0,
            average_multiplier: 0.85,
            poor_multiplier: 0.6,
            no_benchmark_confidence_cap: 50,
            single_benchmark_confidence: 70,
        }
    }
}

impl ClassificationPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        let multipliers = [
            ("excellent_multiplier", self.excellent_multiplier),
            ("good_multiplier", self.good_multiplier),
            ("average_multiplier", self.average_multiplier),
            ("poor_multiplier", self.poor_multiplier),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(PolicyError::NonPositive { name, value });
            }
        }
        for pair in multipliers.windows(2) {
            let (higher, higher_value) = pair[0];
            let (lower, lower_value) = pair[1];
            if higher_value <= lower_value {
                return Err(PolicyError::Unordered {
                    higher,
                    higher_value,
                    lower,
                    lower_value,
                });
            }
        }
        for (name, value) in [
            ("no_benchmark_confidence_cap", self.no_benchmark_confidence_cap),
            ("single_benchmark_confidence", self.single_benchmark_confidence),
        ] {
            if value > 100 {
                return Err(PolicyError::ConfidenceOutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Minimum relative outperformance for excellent, good, average and poor,
    /// in that order. Used for both directional comparisons.
    pub(crate) fn directional_bands(&self) -> [f64; 4] {
        [
            self.excellent_multiplier - 1.0,
            self.good_multiplier - 1.0,
            self.average_multiplier - 1.0,
            self.poor_multiplier - 1.0,
        ]
    }

    /// Maximum absolute relative deviation for excellent, good, average and
    /// poor on target-range analyses (5%, 10%, 15%, 40% by default).
    pub(crate) fn target_bands(&self) -> [f64; 4] {
        let good = (self.excellent_multiplier - 1.0).abs();
        [
            good / 2.0,
            good,
            (1.0 - self.average_multiplier).abs(),
            (1.0 - self.poor_multiplier).abs(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(ClassificationPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_unordered_multipliers_rejected() {
        let policy = ClassificationPolicy {
            average_multiplier: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::Unordered { higher: "good_multiplier", .. })
        ));
    }

    #[test]
    fn test_non_positive_multiplier_rejected() {
        let policy = ClassificationPolicy {
            poor_multiplier: 0.0,
            ..Default::default()
        };
        assert!(matches!(policy.validate(), Err(PolicyError::NonPositive { .. })));
    }

    #[test]
    fn test_confidence_cap_range() {
        let policy = ClassificationPolicy {
            no_benchmark_confidence_cap: 101,
            ..Default::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_target_bands() {
        let bands = ClassificationPolicy::default().target_bands();
        let expected = [0.05, 0.10, 0.15, 0.40];
        for (band, want) in bands.iter().zip(expected) {
            assert!((band - want).abs() < 1e-9);
        }
    }
}
