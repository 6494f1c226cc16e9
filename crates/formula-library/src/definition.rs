use serde::Serialize;
use statement_core::{ComparisonDirection, FinancialField, LocalizedName, RiskBand, Tier};

use crate::formula::{FormulaFn, FormulaInput};

/// How a value is expressed, used when rendering interpretations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percent,
    Ratio,
    Times,
    Days,
    Currency,
    PerShare,
    Score,
}

impl Unit {
    pub fn format(&self, value: f64) -> String {
        match self {
            Unit::Percent => format!("{:.2}%", value),
            Unit::Ratio => format!("{:.2}", value),
            Unit::Times => format!("{:.2}x", value),
            Unit::Days => format!("{:.1} days", value),
            Unit::Currency => format!("{:.0}", value),
            Unit::PerShare => format!("{:.2} per share", value),
            Unit::Score => format!("{:.2}", value),
        }
    }
}

/// Static description of one analysis. Built once with the catalog.
#[derive(Debug, Clone)]
pub struct AnalysisDefinition {
    pub id: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
    pub tier: Tier,
    pub category: &'static str,
    pub subcategory: &'static str,
    pub direction: ComparisonDirection,
    pub unit: Unit,
    pub formula: FormulaFn,
    pub formula_text: &'static str,
    pub methodology: &'static str,
    /// Inputs without which the formula cannot run at all
    pub required: &'static [FinancialField],
    pub min_history: usize,
    pub risk_band: Option<RiskBand>,
    pub remediation: &'static str,
}

impl AnalysisDefinition {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &'static str,
        name_en: &'static str,
        name_ar: &'static str,
        tier: Tier,
        category: &'static str,
        subcategory: &'static str,
        direction: ComparisonDirection,
        unit: Unit,
        formula: FormulaFn,
        formula_text: &'static str,
        required: &'static [FinancialField],
    ) -> Self {
        Self {
            id,
            name_en,
            name_ar,
            tier,
            category,
            subcategory,
            direction,
            unit,
            formula,
            formula_text,
            methodology: "",
            required,
            min_history: 0,
            risk_band: None,
            remediation: "",
        }
    }

    pub fn methodology(mut self, text: &'static str) -> Self {
        self.methodology = text;
        self
    }

    pub fn history(mut self, periods: usize) -> Self {
        self.min_history = periods;
        self
    }

    pub fn risk(mut self, band: RiskBand) -> Self {
        self.risk_band = Some(band);
        self
    }

    pub fn remediation(mut self, text: &'static str) -> Self {
        self.remediation = text;
        self
    }

    pub fn localized_name(&self) -> LocalizedName {
        LocalizedName {
            en: self.name_en.to_string(),
            ar: self.name_ar.to_string(),
        }
    }

    /// Required fields absent from the current period.
    pub fn missing_fields(&self, input: &FormulaInput<'_>) -> Vec<FinancialField> {
        self.required
            .iter()
            .copied()
            .filter(|f| !input.current.has(*f))
            .collect()
    }

    /// Whether the input carries the minimum this analysis needs.
    pub fn is_attemptable(&self, input: &FormulaInput<'_>) -> bool {
        input.prior.len() >= self.min_history && self.missing_fields(input).is_empty()
    }

    pub fn evaluate(&self, input: &FormulaInput<'_>) -> crate::FormulaResult {
        (self.formula)(input)
    }
}

/// Serializable view of a definition for catalog listings.
#[derive(Debug, Clone, Serialize)]
pub struct DefinitionSummary {
    pub id: &'static str,
    pub name: LocalizedName,
    pub tier: Tier,
    pub category: &'static str,
    pub subcategory: &'static str,
    pub direction: ComparisonDirection,
    pub unit: Unit,
    pub formula: &'static str,
    pub methodology: &'static str,
    pub required: Vec<FinancialField>,
    pub min_history: usize,
    pub volatility_flagged: bool,
}

impl From<&AnalysisDefinition> for DefinitionSummary {
    fn from(def: &AnalysisDefinition) -> Self {
        Self {
            id: def.id,
            name: def.localized_name(),
            tier: def.tier,
            category: def.category,
            subcategory: def.subcategory,
            direction: def.direction,
            unit: def.unit,
            formula: def.formula_text,
            methodology: def.methodology,
            required: def.required.to_vec(),
            min_history: def.min_history,
            volatility_flagged: def.risk_band.is_some(),
        }
    }
}
