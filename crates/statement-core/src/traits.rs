use async_trait::async_trait;

use crate::{BenchmarkQuery, BenchmarkValue, ProviderError};

/// Source of comparison figures for computed analyses.
///
/// Implementations must return `Ok(vec![])` for analysis ids they do not know
/// rather than an error.
#[async_trait]
pub trait BenchmarkProvider: Send + Sync {
    async fn lookup(&self, query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError>;

    fn provider_name(&self) -> &'static str;
}

/// Provider that never has a benchmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBenchmarks;

#[async_trait]
impl BenchmarkProvider for NoBenchmarks {
    async fn lookup(&self, _query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError> {
        Ok(Vec::new())
    }

    fn provider_name(&self) -> &'static str {
        "none"
    }
}
