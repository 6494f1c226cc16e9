//! Ratio tier: liquidity, leverage, profitability, efficiency and market ratios.

use statement_core::{
    ComparisonDirection::{HigherIsBetter, LowerIsBetter},
    ComputationError,
    FinancialField::*,
    RiskBand, Tier,
};

use crate::definition::{AnalysisDefinition, Unit};
use crate::formula::{self, percent, ratio, Computation, FormulaInput, FormulaResult};

const DAYS_PER_YEAR: f64 = 365.0;

// ---------------------------------------------------------------------------
// Liquidity
// ---------------------------------------------------------------------------

pub fn current_ratio(input: &FormulaInput<'_>) -> FormulaResult {
    let ca = input.field(CurrentAssets)?;
    let cl = input.field(CurrentLiabilities)?;
    Ok(Computation::scalar(ratio(ca, cl, "current_liabilities")?))
}

/// Acid test. Missing inventory is treated as zero and flagged as an estimate.
pub fn quick_ratio(input: &FormulaInput<'_>) -> FormulaResult {
    let ca = input.field(CurrentAssets)?;
    let cl = input.field(CurrentLiabilities)?;
    let mut estimated = Vec::new();
    let inventory = match input.current.inventory {
        Some(inv) => inv,
        None => {
            estimated.push("inventory=0".to_string());
            0.0
        }
    };
    Ok(Computation::scalar(ratio(ca - inventory, cl, "current_liabilities")?).with_estimates(estimated))
}

pub fn cash_ratio(input: &FormulaInput<'_>) -> FormulaResult {
    let cash = input.field(Cash)?;
    let cl = input.field(CurrentLiabilities)?;
    Ok(Computation::scalar(ratio(cash, cl, "current_liabilities")?))
}

// ---------------------------------------------------------------------------
// Leverage
// ---------------------------------------------------------------------------

pub fn debt_to_equity(input: &FormulaInput<'_>) -> FormulaResult {
    let liabilities = input.field(TotalLiabilities)?;
    let equity = input.field(TotalEquity)?;
    Ok(Computation::scalar(ratio(liabilities, equity, "total_equity")?))
}

pub fn long_term_debt_to_equity(input: &FormulaInput<'_>) -> FormulaResult {
    let ltd = input.field(LongTermDebt)?;
    let equity = input.field(TotalEquity)?;
    Ok(Computation::scalar(ratio(ltd, equity, "total_equity")?))
}

/// Interest expense may be reported with either sign; only its magnitude counts.
pub fn interest_coverage(input: &FormulaInput<'_>) -> FormulaResult {
    let operating_income = input.field(OperatingIncome)?;
    let interest = input.field(InterestExpense)?.abs();
    Ok(Computation::scalar(ratio(operating_income, interest, "interest_expense")?))
}

pub fn equity_multiplier(input: &FormulaInput<'_>) -> FormulaResult {
    let ta = input.field(TotalAssets)?;
    let equity = input.field(TotalEquity)?;
    Ok(Computation::scalar(ratio(ta, equity, "total_equity")?))
}

// ---------------------------------------------------------------------------
// Profitability
// ---------------------------------------------------------------------------

/// (revenue − COGS) / revenue. Falls back to reported gross profit when COGS is absent.
pub fn gross_margin(input: &FormulaInput<'_>) -> FormulaResult {
    let revenue = input.field(Revenue)?;
    match input.current.cogs {
        Some(cogs) => Ok(Computation::scalar(percent(revenue - cogs, revenue, "revenue")?)),
        None => {
            let gross_profit = input
                .field(GrossProfit)
                .map_err(|_| ComputationError::MissingField(Cogs))?;
            Ok(Computation::scalar(percent(gross_profit, revenue, "revenue")?)
                .with_estimates(vec!["revenue-cogs=gross_profit".to_string()]))
        }
    }
}

pub fn operating_margin(input: &FormulaInput<'_>) -> FormulaResult {
    let operating_income = input.field(OperatingIncome)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(percent(operating_income, revenue, "revenue")?))
}

pub fn net_margin(input: &FormulaInput<'_>) -> FormulaResult {
    let net_income = input.field(NetIncome)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(percent(net_income, revenue, "revenue")?))
}

pub fn return_on_assets(input: &FormulaInput<'_>) -> FormulaResult {
    let net_income = input.field(NetIncome)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(percent(net_income, ta, "total_assets")?))
}

pub fn return_on_equity(input: &FormulaInput<'_>) -> FormulaResult {
    let net_income = input.field(NetIncome)?;
    let equity = input.field(TotalEquity)?;
    Ok(Computation::scalar(percent(net_income, equity, "total_equity")?))
}

// ---------------------------------------------------------------------------
// Efficiency
// ---------------------------------------------------------------------------

pub fn asset_turnover(input: &FormulaInput<'_>) -> FormulaResult {
    let revenue = input.field(Revenue)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(ratio(revenue, ta, "total_assets")?))
}

pub fn inventory_turnover(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let cogs = formula::cogs(input.current, &mut estimated)?;
    let inventory = input.field(Inventory)?;
    Ok(Computation::scalar(ratio(cogs, inventory, "inventory")?).with_estimates(estimated))
}

pub fn days_inventory_outstanding(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let cogs = formula::cogs(input.current, &mut estimated)?;
    let inventory = input.field(Inventory)?;
    let days = ratio(inventory, cogs, "cogs")? * DAYS_PER_YEAR;
    Ok(Computation::scalar(days).with_estimates(estimated))
}

pub fn receivables_turnover(input: &FormulaInput<'_>) -> FormulaResult {
    let revenue = input.field(Revenue)?;
    let receivables = input.field(Receivables)?;
    Ok(Computation::scalar(ratio(revenue, receivables, "receivables")?))
}

pub fn days_sales_outstanding(input: &FormulaInput<'_>) -> FormulaResult {
    let receivables = input.field(Receivables)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(ratio(receivables, revenue, "revenue")? * DAYS_PER_YEAR))
}

pub fn fixed_asset_turnover(input: &FormulaInput<'_>) -> FormulaResult {
    let revenue = input.field(Revenue)?;
    let fa = input.field(FixedAssets)?;
    Ok(Computation::scalar(ratio(revenue, fa, "fixed_assets")?))
}

// ---------------------------------------------------------------------------
// Market value
// ---------------------------------------------------------------------------

pub fn earnings_per_share(input: &FormulaInput<'_>) -> FormulaResult {
    let net_income = input.field(NetIncome)?;
    let shares = input.field(SharesOutstanding)?;
    Ok(Computation::scalar(ratio(net_income, shares, "shares_outstanding")?))
}

pub fn book_value_per_share(input: &FormulaInput<'_>) -> FormulaResult {
    let equity = input.field(TotalEquity)?;
    let shares = input.field(SharesOutstanding)?;
    Ok(Computation::scalar(ratio(equity, shares, "shares_outstanding")?))
}

/// P/E is undefined for loss-making companies.
pub fn price_to_earnings(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let price = formula::stock_price(input.current, &mut estimated)?;
    let eps = ratio(input.field(NetIncome)?, input.field(SharesOutstanding)?, "shares_outstanding")?;
    if eps <= 0.0 {
        return Err(ComputationError::Undefined("earnings per share is not positive".into()));
    }
    Ok(Computation::scalar(ratio(price, eps, "earnings_per_share")?).with_estimates(estimated))
}

pub fn price_to_book(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let mv = formula::market_value(input.current, &mut estimated)?;
    let equity = input.field(TotalEquity)?;
    Ok(Computation::scalar(ratio(mv, equity, "total_equity")?).with_estimates(estimated))
}

pub fn price_to_sales(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let mv = formula::market_value(input.current, &mut estimated)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(ratio(mv, revenue, "revenue")?).with_estimates(estimated))
}

pub fn earnings_yield(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let mv = formula::market_value(input.current, &mut estimated)?;
    let net_income = input.field(NetIncome)?;
    Ok(Computation::scalar(percent(net_income, mv, "market_value")?).with_estimates(estimated))
}

pub(crate) fn definitions() -> Vec<AnalysisDefinition> {
    use Tier::Ratio;

    vec![
        AnalysisDefinition::new(
            "current_ratio", "Current Ratio", "نسبة التداول",
            Ratio, "liquidity", "short_term_solvency", HigherIsBetter, Unit::Ratio,
            current_ratio, "current_assets / current_liabilities",
            &[CurrentAssets, CurrentLiabilities],
        )
        .methodology("Ability to cover obligations due within a year from current assets.")
        .risk(RiskBand::Floor { safe_above: 1.5, danger_below: 1.0 })
        .remediation("Improve liquidity by converting inventory and receivables to cash or refinancing short-term debt."),
        AnalysisDefinition::new(
            "quick_ratio", "Quick Ratio", "نسبة السيولة السريعة",
            Ratio, "liquidity", "short_term_solvency", HigherIsBetter, Unit::Ratio,
            quick_ratio, "(current_assets − inventory) / current_liabilities",
            &[CurrentAssets, CurrentLiabilities],
        )
        .methodology("Acid-test liquidity excluding inventory.")
        .risk(RiskBand::Floor { safe_above: 1.0, danger_below: 0.7 })
        .remediation("Build liquid reserves; reduce reliance on inventory to meet obligations."),
        AnalysisDefinition::new(
            "cash_ratio", "Cash Ratio", "نسبة النقدية",
            Ratio, "liquidity", "short_term_solvency", HigherIsBetter, Unit::Ratio,
            cash_ratio, "cash / current_liabilities",
            &[Cash, CurrentLiabilities],
        )
        .methodology("Strictest liquidity test: cash alone against current liabilities.")
        .risk(RiskBand::Floor { safe_above: 0.5, danger_below: 0.2 })
        .remediation("Increase cash buffers or secure committed credit lines."),
        AnalysisDefinition::new(
            "debt_to_equity", "Debt to Equity", "نسبة الديون إلى حقوق الملكية",
            Ratio, "leverage", "capital_structure", LowerIsBetter, Unit::Ratio,
            debt_to_equity, "total_liabilities / total_equity",
            &[TotalLiabilities, TotalEquity],
        )
        .methodology("Creditor financing per unit of owner financing.")
        .risk(RiskBand::Ceiling { safe_below: 1.0, danger_above: 2.0 })
        .remediation("Reduce leverage by paying down debt or raising equity."),
        AnalysisDefinition::new(
            "long_term_debt_to_equity", "Long-Term Debt to Equity", "نسبة الديون طويلة الأجل إلى حقوق الملكية",
            Ratio, "leverage", "capital_structure", LowerIsBetter, Unit::Ratio,
            long_term_debt_to_equity, "long_term_debt / total_equity",
            &[LongTermDebt, TotalEquity],
        )
        .methodology("Funded long-term debt per unit of equity.")
        .risk(RiskBand::Ceiling { safe_below: 0.5, danger_above: 1.5 })
        .remediation("Extend equity funding or retire long-term borrowings."),
        AnalysisDefinition::new(
            "interest_coverage", "Interest Coverage", "نسبة تغطية الفوائد",
            Ratio, "leverage", "debt_service", HigherIsBetter, Unit::Times,
            interest_coverage, "operating_income / |interest_expense|",
            &[OperatingIncome, InterestExpense],
        )
        .methodology("How many times operating profit covers interest charges.")
        .risk(RiskBand::Floor { safe_above: 3.0, danger_below: 1.5 })
        .remediation("Lower the interest burden by refinancing at better rates or reducing debt."),
        AnalysisDefinition::new(
            "equity_multiplier", "Equity Multiplier", "مضاعف حقوق الملكية",
            Ratio, "leverage", "capital_structure", LowerIsBetter, Unit::Times,
            equity_multiplier, "total_assets / total_equity",
            &[TotalAssets, TotalEquity],
        )
        .methodology("Assets supported per unit of equity; the leverage leg of DuPont.")
        .risk(RiskBand::Ceiling { safe_below: 2.5, danger_above: 4.0 })
        .remediation("Fund growth with more equity and less debt."),
        AnalysisDefinition::new(
            "gross_margin", "Gross Margin", "هامش الربح الإجمالي",
            Ratio, "profitability", "margins", HigherIsBetter, Unit::Percent,
            gross_margin, "(revenue − cogs) / revenue × 100",
            &[Revenue],
        )
        .methodology("Share of revenue left after direct costs. Uses reported gross profit when COGS is missing.")
        .remediation("Raise prices where the market allows or reduce direct costs."),
        AnalysisDefinition::new(
            "operating_margin", "Operating Margin", "هامش الربح التشغيلي",
            Ratio, "profitability", "margins", HigherIsBetter, Unit::Percent,
            operating_margin, "operating_income / revenue × 100",
            &[OperatingIncome, Revenue],
        )
        .methodology("Share of revenue left after operating costs.")
        .remediation("Control operating costs and focus on higher-margin products."),
        AnalysisDefinition::new(
            "net_margin", "Net Profit Margin", "هامش صافي الربح",
            Ratio, "profitability", "margins", HigherIsBetter, Unit::Percent,
            net_margin, "net_income / revenue × 100",
            &[NetIncome, Revenue],
        )
        .methodology("Share of revenue retained as profit after all charges.")
        .remediation("Address cost structure, financing charges and tax efficiency."),
        AnalysisDefinition::new(
            "return_on_assets", "Return on Assets", "العائد على الأصول",
            Ratio, "profitability", "returns", HigherIsBetter, Unit::Percent,
            return_on_assets, "net_income / total_assets × 100",
            &[NetIncome, TotalAssets],
        )
        .methodology("Profit generated per unit of assets.")
        .remediation("Improve asset productivity or divest low-return assets."),
        AnalysisDefinition::new(
            "return_on_equity", "Return on Equity", "العائد على حقوق الملكية",
            Ratio, "profitability", "returns", HigherIsBetter, Unit::Percent,
            return_on_equity, "net_income / total_equity × 100",
            &[NetIncome, TotalEquity],
        )
        .methodology("Profit generated per unit of owner capital.")
        .remediation("Lift margins and asset turnover rather than leverage to improve shareholder returns."),
        AnalysisDefinition::new(
            "asset_turnover", "Asset Turnover", "معدل دوران الأصول",
            Ratio, "efficiency", "turnover", HigherIsBetter, Unit::Times,
            asset_turnover, "revenue / total_assets",
            &[Revenue, TotalAssets],
        )
        .methodology("Revenue generated per unit of assets.")
        .remediation("Increase sales volume on the existing asset base or shed idle assets."),
        AnalysisDefinition::new(
            "inventory_turnover", "Inventory Turnover", "معدل دوران المخزون",
            Ratio, "efficiency", "turnover", HigherIsBetter, Unit::Times,
            inventory_turnover, "cogs / inventory",
            &[Inventory],
        )
        .methodology("How many times inventory is sold through in a year.")
        .remediation("Clear slow-moving stock and align purchasing with demand."),
        AnalysisDefinition::new(
            "days_inventory_outstanding", "Days Inventory Outstanding", "متوسط فترة بقاء المخزون",
            Ratio, "efficiency", "cycle", LowerIsBetter, Unit::Days,
            days_inventory_outstanding, "inventory / cogs × 365",
            &[Inventory],
        )
        .methodology("Average days inventory is held before sale.")
        .remediation("Shorten holding periods through demand planning and just-in-time purchasing."),
        AnalysisDefinition::new(
            "receivables_turnover", "Receivables Turnover", "معدل دوران الذمم المدينة",
            Ratio, "efficiency", "turnover", HigherIsBetter, Unit::Times,
            receivables_turnover, "revenue / receivables",
            &[Revenue, Receivables],
        )
        .methodology("How many times receivables are collected in a year.")
        .remediation("Enforce credit limits and follow up overdue accounts."),
        AnalysisDefinition::new(
            "days_sales_outstanding", "Days Sales Outstanding", "متوسط فترة التحصيل",
            Ratio, "efficiency", "cycle", LowerIsBetter, Unit::Days,
            days_sales_outstanding, "receivables / revenue × 365",
            &[Receivables, Revenue],
        )
        .methodology("Average days to collect a sale.")
        .remediation("Offer early-payment discounts and tighten collection processes."),
        AnalysisDefinition::new(
            "fixed_asset_turnover", "Fixed Asset Turnover", "معدل دوران الأصول الثابتة",
            Ratio, "efficiency", "turnover", HigherIsBetter, Unit::Times,
            fixed_asset_turnover, "revenue / fixed_assets",
            &[Revenue, FixedAssets],
        )
        .methodology("Revenue generated per unit of fixed assets.")
        .remediation("Raise utilisation of plant and equipment or lease instead of owning."),
        AnalysisDefinition::new(
            "earnings_per_share", "Earnings per Share", "ربحية السهم",
            Ratio, "market_value", "per_share", HigherIsBetter, Unit::PerShare,
            earnings_per_share, "net_income / shares_outstanding",
            &[NetIncome, SharesOutstanding],
        )
        .methodology("Net income attributable to each share.")
        .remediation("Grow earnings and avoid dilutive share issuance."),
        AnalysisDefinition::new(
            "book_value_per_share", "Book Value per Share", "القيمة الدفترية للسهم",
            Ratio, "market_value", "per_share", HigherIsBetter, Unit::PerShare,
            book_value_per_share, "total_equity / shares_outstanding",
            &[TotalEquity, SharesOutstanding],
        )
        .methodology("Accounting equity attributable to each share.")
        .remediation("Retain earnings to rebuild book value."),
        AnalysisDefinition::new(
            "price_to_earnings", "Price to Earnings", "مكرر الربحية",
            Ratio, "market_value", "valuation", LowerIsBetter, Unit::Times,
            price_to_earnings, "stock_price / earnings_per_share",
            &[NetIncome, SharesOutstanding],
        )
        .methodology("Price paid per unit of earnings; undefined when earnings are not positive.")
        .remediation("Valuation is stretched relative to earnings; reassess growth expectations."),
        AnalysisDefinition::new(
            "price_to_book", "Price to Book", "مضاعف القيمة الدفترية",
            Ratio, "market_value", "valuation", LowerIsBetter, Unit::Times,
            price_to_book, "market_value / total_equity",
            &[TotalEquity],
        )
        .methodology("Market value relative to accounting equity.")
        .remediation("Market prices the company well above its book value; confirm the premium is earned by returns."),
        AnalysisDefinition::new(
            "price_to_sales", "Price to Sales", "مضاعف المبيعات",
            Ratio, "market_value", "valuation", LowerIsBetter, Unit::Times,
            price_to_sales, "market_value / revenue",
            &[Revenue],
        )
        .methodology("Market value relative to revenue.")
        .remediation("Valuation is rich relative to sales; margins must expand to justify it."),
        AnalysisDefinition::new(
            "earnings_yield", "Earnings Yield", "عائد الأرباح",
            Ratio, "market_value", "valuation", HigherIsBetter, Unit::Percent,
            earnings_yield, "net_income / market_value × 100",
            &[NetIncome],
        )
        .methodology("Inverse of P/E expressed as a yield.")
        .remediation("Earnings are thin relative to market value; compare against the cost of capital."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_core::FinancialPeriod;

    fn scalar(result: FormulaResult) -> f64 {
        result.unwrap().value.headline()
    }

    #[test]
    fn test_current_ratio_scenario() {
        let period = FinancialPeriod::new(2024)
            .with(CurrentAssets, 500_000.0)
            .with(CurrentLiabilities, 250_000.0);
        let input = FormulaInput::single(&period);
        assert!((scalar(current_ratio(&input)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_gross_margin_scenario() {
        let period = FinancialPeriod::new(2024)
            .with(Revenue, 1_000_000.0)
            .with(Cogs, 545_000.0);
        let input = FormulaInput::single(&period);
        let computation = gross_margin(&input).unwrap();
        assert!((computation.value.headline() - 45.5).abs() < 1e-9);
        assert!(computation.estimated.is_empty());
    }

    #[test]
    fn test_gross_margin_falls_back_to_gross_profit() {
        let period = FinancialPeriod::new(2024)
            .with(Revenue, 1_000.0)
            .with(GrossProfit, 300.0);
        let computation = gross_margin(&FormulaInput::single(&period)).unwrap();
        assert!((computation.value.headline() - 30.0).abs() < 1e-9);
        assert_eq!(computation.estimated.len(), 1);
    }

    #[test]
    fn test_quick_ratio_estimates_missing_inventory() {
        let period = FinancialPeriod::new(2024)
            .with(CurrentAssets, 300.0)
            .with(CurrentLiabilities, 200.0);
        let computation = quick_ratio(&FormulaInput::single(&period)).unwrap();
        assert!((computation.value.headline() - 1.5).abs() < 1e-9);
        assert_eq!(computation.estimated, vec!["inventory=0".to_string()]);
    }

    #[test]
    fn test_interest_coverage_ignores_sign() {
        let period = FinancialPeriod::new(2024)
            .with(OperatingIncome, 900.0)
            .with(InterestExpense, -300.0);
        assert!((scalar(interest_coverage(&FormulaInput::single(&period))) - 3.0).abs() < 1e-9);

        let zero = period.with(InterestExpense, 0.0);
        assert!(matches!(
            interest_coverage(&FormulaInput::single(&zero)),
            Err(ComputationError::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_price_to_earnings() {
        let period = FinancialPeriod::new(2024)
            .with(NetIncome, 1_000.0)
            .with(SharesOutstanding, 100.0)
            .with(MarketValue, 15_000.0);
        // price estimated as 150, EPS 10
        let computation = price_to_earnings(&FormulaInput::single(&period)).unwrap();
        assert!((computation.value.headline() - 15.0).abs() < 1e-9);
        assert_eq!(computation.estimated.len(), 1);

        let loss = period.with(NetIncome, -50.0);
        assert!(matches!(
            price_to_earnings(&FormulaInput::single(&loss)),
            Err(ComputationError::Undefined(_))
        ));
    }

    #[test]
    fn test_turnover_and_days_agree() {
        let period = FinancialPeriod::new(2024)
            .with(Revenue, 3_650.0)
            .with(Receivables, 365.0);
        let input = FormulaInput::single(&period);
        assert!((scalar(receivables_turnover(&input)) - 10.0).abs() < 1e-9);
        assert!((scalar(days_sales_outstanding(&input)) - 36.5).abs() < 1e-9);
    }
}
