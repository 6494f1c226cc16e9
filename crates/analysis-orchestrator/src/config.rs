use anyhow::{Context, Result};
use classification_engine::ClassificationPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Engine settings, normally read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Concurrent analysis units (defaults to available cores)
    pub max_concurrency: usize,
    pub benchmark_timeout: Duration,
    pub top_findings: usize,
    pub top_recommendations: usize,
    /// Add the company's own prior-period value as a benchmark
    pub derive_historical_benchmarks: bool,
    pub policy: ClassificationPolicy,
    pub benchmark_cache_ttl_secs: i64,
    pub benchmark_api_url: Option<String>,
}

fn available_cores() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: available_cores(),
            benchmark_timeout: Duration::from_millis(2000),
            top_findings: 5,
            top_recommendations: 5,
            derive_historical_benchmarks: true,
            policy: ClassificationPolicy::default(),
            benchmark_cache_ttl_secs: 300,
            benchmark_api_url: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        fn read<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            get(key)
                .unwrap_or_else(|| default.to_string())
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for {}", key))
        }

        let cores = available_cores().to_string();
        let config = Self {
            max_concurrency: read(&get, "ENGINE_MAX_CONCURRENCY", &cores)?,
            benchmark_timeout: Duration::from_millis(read(&get, "BENCHMARK_TIMEOUT_MS", "2000")?),
            top_findings: read(&get, "REPORT_TOP_FINDINGS", "5")?,
            top_recommendations: read(&get, "REPORT_TOP_RECOMMENDATIONS", "5")?,
            derive_historical_benchmarks: read(&get, "DERIVE_HISTORICAL_BENCHMARKS", "true")?,
            policy: ClassificationPolicy {
                excellent_multiplier: read(&get, "CLASSIFY_EXCELLENT_MULTIPLIER", "1.1")?,
                good_multiplier: read(&get, "CLASSIFY_GOOD_MULTIPLIER", "1.0")?,
                average_multiplier: read(&get, "CLASSIFY_AVERAGE_MULTIPLIER", "0.85")?,
                poor_multiplier: read(&get, "CLASSIFY_POOR_MULTIPLIER", "0.6")?,
                no_benchmark_confidence_cap: read(&get, "NO_BENCHMARK_CONFIDENCE_CAP", "50")?,
                ..ClassificationPolicy::default()
            },
            benchmark_cache_ttl_secs: read(&get, "BENCHMARK_CACHE_TTL_SECS", "300")?,
            benchmark_api_url: get("BENCHMARK_API_URL").filter(|url| !url.trim().is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            anyhow::bail!("ENGINE_MAX_CONCURRENCY must be at least 1");
        }
        if self.benchmark_timeout.is_zero() {
            anyhow::bail!("BENCHMARK_TIMEOUT_MS must be greater than 0");
        }
        self.policy
            .validate()
            .context("Invalid classification policy")?;
        Ok(())
    }
}
