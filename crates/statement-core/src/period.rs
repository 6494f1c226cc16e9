use serde::{Deserialize, Serialize};
use std::fmt;

/// One company-year of normalized statement figures.
///
/// Every monetary field is optional: `None` means the figure was not reported,
/// which is different from a reported zero. Formulas treat the two cases
/// differently (missing field vs. division by zero).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub year: i32,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,

    // Balance sheet: assets
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub current_assets: Option<f64>,
    #[serde(default)]
    pub fixed_assets: Option<f64>,
    #[serde(default)]
    pub cash: Option<f64>,
    #[serde(default)]
    pub inventory: Option<f64>,
    #[serde(default)]
    pub receivables: Option<f64>,

    // Balance sheet: liabilities and equity
    #[serde(default)]
    pub total_liabilities: Option<f64>,
    #[serde(default)]
    pub current_liabilities: Option<f64>,
    #[serde(default)]
    pub long_term_debt: Option<f64>,
    #[serde(default)]
    pub total_equity: Option<f64>,

    // Income statement
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub gross_profit: Option<f64>,
    #[serde(default)]
    pub operating_income: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,
    #[serde(default)]
    pub cogs: Option<f64>,
    #[serde(default)]
    pub operating_expenses: Option<f64>,
    #[serde(default)]
    pub interest_expense: Option<f64>,

    // Cash flow statement
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub investing_cash_flow: Option<f64>,
    #[serde(default)]
    pub financing_cash_flow: Option<f64>,
    #[serde(default)]
    pub free_cash_flow: Option<f64>,

    // Market data
    #[serde(default)]
    pub market_value: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    #[serde(default)]
    pub stock_price: Option<f64>,
}

impl FinancialPeriod {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    /// Builder-style setter, mostly used when assembling periods by hand.
    pub fn with(mut self, field: FinancialField, value: f64) -> Self {
        *self.slot_mut(field) = Some(value);
        self
    }

    pub fn with_classification(mut self, sector: impl Into<String>, industry: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self.industry = Some(industry.into());
        self
    }

    pub fn get(&self, field: FinancialField) -> Option<f64> {
        match field {
            FinancialField::TotalAssets => self.total_assets,
            FinancialField::CurrentAssets => self.current_assets,
            FinancialField::FixedAssets => self.fixed_assets,
            FinancialField::Cash => self.cash,
            FinancialField::Inventory => self.inventory,
            FinancialField::Receivables => self.receivables,
            FinancialField::TotalLiabilities => self.total_liabilities,
            FinancialField::CurrentLiabilities => self.current_liabilities,
            FinancialField::LongTermDebt => self.long_term_debt,
            FinancialField::TotalEquity => self.total_equity,
            FinancialField::Revenue => self.revenue,
            FinancialField::GrossProfit => self.gross_profit,
            FinancialField::OperatingIncome => self.operating_income,
            FinancialField::NetIncome => self.net_income,
            FinancialField::Cogs => self.cogs,
            FinancialField::OperatingExpenses => self.operating_expenses,
            FinancialField::InterestExpense => self.interest_expense,
            FinancialField::OperatingCashFlow => self.operating_cash_flow,
            FinancialField::InvestingCashFlow => self.investing_cash_flow,
            FinancialField::FinancingCashFlow => self.financing_cash_flow,
            FinancialField::FreeCashFlow => self.free_cash_flow,
            FinancialField::MarketValue => self.market_value,
            FinancialField::SharesOutstanding => self.shares_outstanding,
            FinancialField::StockPrice => self.stock_price,
        }
    }

    fn slot_mut(&mut self, field: FinancialField) -> &mut Option<f64> {
        match field {
            FinancialField::TotalAssets => &mut self.total_assets,
            FinancialField::CurrentAssets => &mut self.current_assets,
            FinancialField::FixedAssets => &mut self.fixed_assets,
            FinancialField::Cash => &mut self.cash,
            FinancialField::Inventory => &mut self.inventory,
            FinancialField::Receivables => &mut self.receivables,
            FinancialField::TotalLiabilities => &mut self.total_liabilities,
            FinancialField::CurrentLiabilities => &mut self.current_liabilities,
            FinancialField::LongTermDebt => &mut self.long_term_debt,
            FinancialField::TotalEquity => &mut self.total_equity,
            FinancialField::Revenue => &mut self.revenue,
            FinancialField::GrossProfit => &mut self.gross_profit,
            FinancialField::OperatingIncome => &mut self.operating_income,
            FinancialField::NetIncome => &mut self.net_income,
            FinancialField::Cogs => &mut self.cogs,
            FinancialField::OperatingExpenses => &mut self.operating_expenses,
            FinancialField::InterestExpense => &mut self.interest_expense,
            FinancialField::OperatingCashFlow => &mut self.operating_cash_flow,
            FinancialField::InvestingCashFlow => &mut self.investing_cash_flow,
            FinancialField::FinancingCashFlow => &mut self.financing_cash_flow,
            FinancialField::FreeCashFlow => &mut self.free_cash_flow,
            FinancialField::MarketValue => &mut self.market_value,
            FinancialField::SharesOutstanding => &mut self.shares_outstanding,
            FinancialField::StockPrice => &mut self.stock_price,
        }
    }

    pub fn has(&self, field: FinancialField) -> bool {
        self.get(field).is_some()
    }

    /// Reported fields that must not be negative but are.
    pub fn negative_fields(&self) -> Vec<(FinancialField, f64)> {
        FinancialField::ALL
            .iter()
            .filter(|f| !f.may_be_negative())
            .filter_map(|&f| self.get(f).filter(|v| *v < 0.0).map(|v| (f, v)))
            .collect()
    }

    /// Relative gap between assets and liabilities + equity, as a fraction of assets.
    /// Returns `None` when any of the three totals is missing or assets are zero.
    pub fn balance_gap(&self) -> Option<f64> {
        let assets = self.total_assets?;
        let liabilities = self.total_liabilities?;
        let equity = self.total_equity?;
        if assets == 0.0 {
            return None;
        }
        Some((assets - (liabilities + equity)).abs() / assets)
    }
}

/// Every monetary field of a [`FinancialPeriod`], addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialField {
    TotalAssets,
    CurrentAssets,
    FixedAssets,
    Cash,
    Inventory,
    Receivables,
    TotalLiabilities,
    CurrentLiabilities,
    LongTermDebt,
    TotalEquity,
    Revenue,
    GrossProfit,
    OperatingIncome,
    NetIncome,
    Cogs,
    OperatingExpenses,
    InterestExpense,
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
    FreeCashFlow,
    MarketValue,
    SharesOutstanding,
    StockPrice,
}

impl FinancialField {
    pub const ALL: [FinancialField; 24] = [
        FinancialField::TotalAssets,
        FinancialField::CurrentAssets,
        FinancialField::FixedAssets,
        FinancialField::Cash,
        FinancialField::Inventory,
        FinancialField::Receivables,
        FinancialField::TotalLiabilities,
        FinancialField::CurrentLiabilities,
        FinancialField::LongTermDebt,
        FinancialField::TotalEquity,
        FinancialField::Revenue,
        FinancialField::GrossProfit,
        FinancialField::OperatingIncome,
        FinancialField::NetIncome,
        FinancialField::Cogs,
        FinancialField::OperatingExpenses,
        FinancialField::InterestExpense,
        FinancialField::OperatingCashFlow,
        FinancialField::InvestingCashFlow,
        FinancialField::FinancingCashFlow,
        FinancialField::FreeCashFlow,
        FinancialField::MarketValue,
        FinancialField::SharesOutstanding,
        FinancialField::StockPrice,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FinancialField::TotalAssets => "total_assets",
            FinancialField::CurrentAssets => "current_assets",
            FinancialField::FixedAssets => "fixed_assets",
            FinancialField::Cash => "cash",
            FinancialField::Inventory => "inventory",
            FinancialField::Receivables => "receivables",
            FinancialField::TotalLiabilities => "total_liabilities",
            FinancialField::CurrentLiabilities => "current_liabilities",
            FinancialField::LongTermDebt => "long_term_debt",
            FinancialField::TotalEquity => "total_equity",
            FinancialField::Revenue => "revenue",
            FinancialField::GrossProfit => "gross_profit",
            FinancialField::OperatingIncome => "operating_income",
            FinancialField::NetIncome => "net_income",
            FinancialField::Cogs => "cogs",
            FinancialField::OperatingExpenses => "operating_expenses",
            FinancialField::InterestExpense => "interest_expense",
            FinancialField::OperatingCashFlow => "operating_cash_flow",
            FinancialField::InvestingCashFlow => "investing_cash_flow",
            FinancialField::FinancingCashFlow => "financing_cash_flow",
            FinancialField::FreeCashFlow => "free_cash_flow",
            FinancialField::MarketValue => "market_value",
            FinancialField::SharesOutstanding => "shares_outstanding",
            FinancialField::StockPrice => "stock_price",
        }
    }

    /// Signed fields: results, cash flows and interest can legitimately go below zero.
    pub fn may_be_negative(&self) -> bool {
        matches!(
            self,
            FinancialField::NetIncome
                | FinancialField::OperatingIncome
                | FinancialField::InterestExpense
                | FinancialField::OperatingCashFlow
                | FinancialField::InvestingCashFlow
                | FinancialField::FinancingCashFlow
                | FinancialField::FreeCashFlow
        )
    }
}

impl fmt::Display for FinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let period = FinancialPeriod::new(2024)
            .with(FinancialField::CurrentAssets, 500_000.0)
            .with(FinancialField::CurrentLiabilities, 250_000.0);

        assert_eq!(period.get(FinancialField::CurrentAssets), Some(500_000.0));
        assert_eq!(period.current_liabilities, Some(250_000.0));
        assert!(!period.has(FinancialField::Revenue));
    }

    #[test]
    fn test_negative_fields_respect_signed_set() {
        let period = FinancialPeriod::new(2024)
            .with(FinancialField::NetIncome, -10.0)
            .with(FinancialField::FreeCashFlow, -5.0)
            .with(FinancialField::Inventory, -1.0);

        let negatives = period.negative_fields();
        assert_eq!(negatives, vec![(FinancialField::Inventory, -1.0)]);
    }

    #[test]
    fn test_balance_gap() {
        let period = FinancialPeriod::new(2024)
            .with(FinancialField::TotalAssets, 1_000.0)
            .with(FinancialField::TotalLiabilities, 600.0)
            .with(FinancialField::TotalEquity, 390.0);
        assert!((period.balance_gap().unwrap() - 0.01).abs() < 1e-9);

        let incomplete = FinancialPeriod::new(2024).with(FinancialField::TotalAssets, 1_000.0);
        assert!(incomplete.balance_gap().is_none());
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let json = r#"{"year": 2023, "revenue": 1000.0}"#;
        let period: FinancialPeriod = serde_json::from_str(json).unwrap();
        assert_eq!(period.year, 2023);
        assert_eq!(period.revenue, Some(1000.0));
        assert!(period.total_equity.is_none());
    }
}
