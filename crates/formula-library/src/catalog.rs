use std::collections::BTreeSet;
use std::sync::LazyLock;

use statement_core::Tier;

use crate::definition::AnalysisDefinition;
use crate::{advanced, cash_flow, ratio, structural};

static CATALOG: LazyLock<Catalog> = LazyLock::new(Catalog::build);

/// The process-wide analysis catalog.
pub fn catalog() -> &'static Catalog {
    &CATALOG
}

/// Every registered analysis in catalog order. The position of a definition
/// is its ordinal and fixes its place in every report.
#[derive(Debug)]
pub struct Catalog {
    definitions: Vec<AnalysisDefinition>,
}

impl Catalog {
    fn build() -> Self {
        let mut definitions = structural::definitions();
        definitions.extend(ratio::definitions());
        definitions.extend(cash_flow::definitions());
        definitions.extend(advanced::definitions());
        Self { definitions }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AnalysisDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn ordinal(&self, id: &str) -> Option<usize> {
        self.definitions.iter().position(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AnalysisDefinition)> {
        self.definitions.iter().enumerate()
    }

    pub fn by_tier(&self, tier: Tier) -> impl Iterator<Item = &AnalysisDefinition> {
        self.definitions.iter().filter(move |d| d.tier == tier)
    }

    pub fn categories(&self) -> BTreeSet<&'static str> {
        self.definitions.iter().map(|d| d.category).collect()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.definitions.iter().any(|d| d.category == category)
    }

    /// Definitions in scope, in catalog order.
    ///
    /// An empty `tiers` slice means every tier. Categories and ids narrow the
    /// selection further when non-empty. Unknown names simply match nothing;
    /// callers validate names first.
    pub fn select(&self, tiers: &[Tier], categories: &[String], ids: &[String]) -> Vec<(usize, &AnalysisDefinition)> {
        self.iter()
            .filter(|(_, d)| tiers.is_empty() || tiers.contains(&d.tier))
            .filter(|(_, d)| categories.is_empty() || categories.iter().any(|c| c == d.category))
            .filter(|(_, d)| ids.is_empty() || ids.iter().any(|id| id == d.id))
            .collect()
    }
}
