use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statement_core::{BenchmarkProvider, BenchmarkQuery, BenchmarkScope, BenchmarkValue, ProviderError};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read benchmark table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse benchmark table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One row of a benchmark table. Filters left empty match any query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub analysis_id: String,
    pub scope: BenchmarkScope,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl BenchmarkEntry {
    pub fn new(analysis_id: impl Into<String>, scope: BenchmarkScope, value: f64) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            scope,
            value,
            sector: None,
            industry: None,
            geography: None,
            year: None,
            source: None,
        }
    }

    pub fn for_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn for_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn for_geography(mut self, geography: impl Into<String>) -> Self {
        self.geography = Some(geography.into());
        self
    }

    pub fn for_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn matches(&self, query: &BenchmarkQuery) -> bool {
        fn filter_ok(filter: &Option<String>, wanted: &Option<String>) -> bool {
            match (filter, wanted) {
                (None, _) => true,
                (Some(f), Some(w)) => f.eq_ignore_ascii_case(w),
                (Some(_), None) => false,
            }
        }

        self.analysis_id == query.analysis_id
            && filter_ok(&self.sector, &query.sector)
            && filter_ok(&self.industry, &query.industry)
            && filter_ok(&self.geography, &query.geography)
            && self.year.map_or(true, |y| y == query.period)
    }

    /// How many filters this entry pins down; more specific rows win.
    fn specificity(&self) -> usize {
        [
            self.sector.is_some(),
            self.industry.is_some(),
            self.geography.is_some(),
            self.year.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// In-memory benchmark table.
///
/// For each scope the most specific matching row is returned, so a table can
/// carry a generic global figure next to year- or sector-specific overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticBenchmarkProvider {
    entries: Vec<BenchmarkEntry>,
}

impl StaticBenchmarkProvider {
    pub fn new(entries: Vec<BenchmarkEntry>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array of entries.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let entries: Vec<BenchmarkEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: BenchmarkEntry) {
        self.entries.push(entry);
    }

    /// Synchronous lookup backing the provider implementation.
    pub fn find(&self, query: &BenchmarkQuery) -> Vec<BenchmarkValue> {
        let mut best: BTreeMap<BenchmarkScope, &BenchmarkEntry> = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| e.matches(query)) {
            match best.get(&entry.scope) {
                Some(current) if current.specificity() >= entry.specificity() => {}
                _ => {
                    best.insert(entry.scope, entry);
                }
            }
        }

        best.into_values()
            .map(|entry| BenchmarkValue {
                scope: entry.scope,
                value: entry.value,
                source: entry.source.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl BenchmarkProvider for StaticBenchmarkProvider {
    async fn lookup(&self, query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError> {
        let found = self.find(query);
        debug!(analysis = %query.analysis_id, count = found.len(), "Static benchmark lookup");
        Ok(found)
    }

    fn provider_name(&self) -> &'static str {
        "static"
    }
}
