//! Structural tier: vertical (common-size) and horizontal (year-over-year)
//! analysis of the statements.

use statement_core::{
    ComparisonDirection::{HigherIsBetter, LowerIsBetter, TargetRange},
    FinancialField::*,
    RiskBand, Tier,
};

use crate::definition::{AnalysisDefinition, Unit};
use crate::formula::{change_pct, percent, Computation, FormulaInput, FormulaResult};

pub fn current_assets_share(input: &FormulaInput<'_>) -> FormulaResult {
    let ca = input.field(CurrentAssets)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(percent(ca, ta, "total_assets")?))
}

pub fn fixed_assets_share(input: &FormulaInput<'_>) -> FormulaResult {
    let fa = input.field(FixedAssets)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(percent(fa, ta, "total_assets")?))
}

pub fn cash_share(input: &FormulaInput<'_>) -> FormulaResult {
    let cash = input.field(Cash)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(percent(cash, ta, "total_assets")?))
}

pub fn inventory_share(input: &FormulaInput<'_>) -> FormulaResult {
    let inventory = input.field(Inventory)?;
    let ca = input.field(CurrentAssets)?;
    Ok(Computation::scalar(percent(inventory, ca, "current_assets")?))
}

pub fn receivables_share(input: &FormulaInput<'_>) -> FormulaResult {
    let receivables = input.field(Receivables)?;
    let ca = input.field(CurrentAssets)?;
    Ok(Computation::scalar(percent(receivables, ca, "current_assets")?))
}

pub fn equity_ratio(input: &FormulaInput<'_>) -> FormulaResult {
    let equity = input.field(TotalEquity)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(percent(equity, ta, "total_assets")?))
}

pub fn debt_ratio(input: &FormulaInput<'_>) -> FormulaResult {
    let liabilities = input.field(TotalLiabilities)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(percent(liabilities, ta, "total_assets")?))
}

pub fn current_liabilities_share(input: &FormulaInput<'_>) -> FormulaResult {
    let cl = input.field(CurrentLiabilities)?;
    let tl = input.field(TotalLiabilities)?;
    Ok(Computation::scalar(percent(cl, tl, "total_liabilities")?))
}

pub fn long_term_debt_share(input: &FormulaInput<'_>) -> FormulaResult {
    let ltd = input.field(LongTermDebt)?;
    let tl = input.field(TotalLiabilities)?;
    Ok(Computation::scalar(percent(ltd, tl, "total_liabilities")?))
}

pub fn cogs_to_revenue(input: &FormulaInput<'_>) -> FormulaResult {
    let cogs = input.field(Cogs)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(percent(cogs, revenue, "revenue")?))
}

pub fn opex_to_revenue(input: &FormulaInput<'_>) -> FormulaResult {
    let opex = input.field(OperatingExpenses)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(percent(opex, revenue, "revenue")?))
}

pub fn working_capital(input: &FormulaInput<'_>) -> FormulaResult {
    let ca = input.field(CurrentAssets)?;
    let cl = input.field(CurrentLiabilities)?;
    Ok(Computation::scalar(ca - cl))
}

/// Gap between assets and liabilities + equity as a percentage of assets.
pub fn balance_sheet_consistency(input: &FormulaInput<'_>) -> FormulaResult {
    let ta = input.field(TotalAssets)?;
    let tl = input.field(TotalLiabilities)?;
    let te = input.field(TotalEquity)?;
    Ok(Computation::scalar(percent((ta - (tl + te)).abs(), ta, "total_assets")?))
}

pub fn revenue_change(input: &FormulaInput<'_>) -> FormulaResult {
    let current = input.field(Revenue)?;
    let previous = input.prev_field(Revenue)?;
    Ok(Computation::scalar(change_pct(current, previous, "prior revenue")?))
}

pub fn total_assets_change(input: &FormulaInput<'_>) -> FormulaResult {
    let current = input.field(TotalAssets)?;
    let previous = input.prev_field(TotalAssets)?;
    Ok(Computation::scalar(change_pct(current, previous, "prior total_assets")?))
}

pub fn net_income_change(input: &FormulaInput<'_>) -> FormulaResult {
    let current = input.field(NetIncome)?;
    let previous = input.prev_field(NetIncome)?;
    Ok(Computation::scalar(change_pct(current, previous, "prior net_income")?))
}

pub(crate) fn definitions() -> Vec<AnalysisDefinition> {
    use Tier::Structural;

    vec![
        AnalysisDefinition::new(
            "current_assets_share", "Current Assets Share", "نسبة الأصول المتداولة",
            Structural, "asset_structure", "vertical", TargetRange, Unit::Percent,
            current_assets_share, "current_assets / total_assets × 100",
            &[CurrentAssets, TotalAssets],
        )
        .methodology("Common-size share of total assets held in current assets.")
        .remediation("Review the balance between short-term and long-term assets against the business model."),
        AnalysisDefinition::new(
            "fixed_assets_share", "Fixed Assets Share", "نسبة الأصول الثابتة",
            Structural, "asset_structure", "vertical", TargetRange, Unit::Percent,
            fixed_assets_share, "fixed_assets / total_assets × 100",
            &[FixedAssets, TotalAssets],
        )
        .methodology("Common-size share of total assets tied up in fixed assets.")
        .remediation("Assess capital intensity; dispose of or lease under-utilised fixed assets."),
        AnalysisDefinition::new(
            "cash_share", "Cash Share of Assets", "نسبة النقدية إلى الأصول",
            Structural, "asset_structure", "vertical", TargetRange, Unit::Percent,
            cash_share, "cash / total_assets × 100",
            &[Cash, TotalAssets],
        )
        .methodology("Cash as a share of total assets; too little limits flexibility, too much drags returns.")
        .remediation("Rebalance cash holdings toward the sector norm through investment or liquidity building."),
        AnalysisDefinition::new(
            "inventory_share", "Inventory Share of Current Assets", "نسبة المخزون إلى الأصول المتداولة",
            Structural, "asset_structure", "vertical", LowerIsBetter, Unit::Percent,
            inventory_share, "inventory / current_assets × 100",
            &[Inventory, CurrentAssets],
        )
        .methodology("Share of current assets held as inventory, the least liquid current asset.")
        .remediation("Reduce slow-moving inventory and tighten purchasing to free working capital."),
        AnalysisDefinition::new(
            "receivables_share", "Receivables Share of Current Assets", "نسبة الذمم المدينة إلى الأصول المتداولة",
            Structural, "asset_structure", "vertical", LowerIsBetter, Unit::Percent,
            receivables_share, "receivables / current_assets × 100",
            &[Receivables, CurrentAssets],
        )
        .methodology("Share of current assets owed by customers.")
        .remediation("Tighten credit terms and accelerate collections."),
        AnalysisDefinition::new(
            "equity_ratio", "Equity Ratio", "نسبة حقوق الملكية",
            Structural, "capital_structure", "vertical", HigherIsBetter, Unit::Percent,
            equity_ratio, "total_equity / total_assets × 100",
            &[TotalEquity, TotalAssets],
        )
        .methodology("Share of assets financed by owners rather than creditors.")
        .remediation("Strengthen the equity base through retained earnings or capital injection."),
        AnalysisDefinition::new(
            "debt_ratio", "Debt Ratio", "نسبة المديونية",
            Structural, "capital_structure", "vertical", LowerIsBetter, Unit::Percent,
            debt_ratio, "total_liabilities / total_assets × 100",
            &[TotalLiabilities, TotalAssets],
        )
        .methodology("Share of assets financed by liabilities.")
        .risk(RiskBand::Ceiling { safe_below: 50.0, danger_above: 70.0 })
        .remediation("Deleverage by repaying debt or converting liabilities to equity."),
        AnalysisDefinition::new(
            "current_liabilities_share", "Current Liabilities Share", "نسبة الخصوم المتداولة",
            Structural, "capital_structure", "vertical", LowerIsBetter, Unit::Percent,
            current_liabilities_share, "current_liabilities / total_liabilities × 100",
            &[CurrentLiabilities, TotalLiabilities],
        )
        .methodology("Share of obligations falling due within a year.")
        .remediation("Refinance short-term obligations into longer maturities."),
        AnalysisDefinition::new(
            "long_term_debt_share", "Long-Term Debt Share", "نسبة الديون طويلة الأجل",
            Structural, "capital_structure", "vertical", TargetRange, Unit::Percent,
            long_term_debt_share, "long_term_debt / total_liabilities × 100",
            &[LongTermDebt, TotalLiabilities],
        )
        .methodology("Share of liabilities carried as long-term debt.")
        .remediation("Align the debt maturity profile with the life of the assets it funds."),
        AnalysisDefinition::new(
            "cogs_to_revenue", "Cost of Sales to Revenue", "نسبة تكلفة المبيعات إلى الإيرادات",
            Structural, "income_structure", "vertical", LowerIsBetter, Unit::Percent,
            cogs_to_revenue, "cogs / revenue × 100",
            &[Cogs, Revenue],
        )
        .methodology("Common-size cost of sales.")
        .remediation("Renegotiate supplier terms or improve production efficiency to lower unit costs."),
        AnalysisDefinition::new(
            "opex_to_revenue", "Operating Expenses to Revenue", "نسبة المصروفات التشغيلية إلى الإيرادات",
            Structural, "income_structure", "vertical", LowerIsBetter, Unit::Percent,
            opex_to_revenue, "operating_expenses / revenue × 100",
            &[OperatingExpenses, Revenue],
        )
        .methodology("Common-size operating expenses.")
        .remediation("Cut discretionary overhead and automate recurring processes."),
        AnalysisDefinition::new(
            "working_capital", "Working Capital", "رأس المال العامل",
            Structural, "asset_structure", "liquidity_position", HigherIsBetter, Unit::Currency,
            working_capital, "current_assets − current_liabilities",
            &[CurrentAssets, CurrentLiabilities],
        )
        .methodology("Net short-term resources available to run operations.")
        .remediation("Rebuild working capital by collecting receivables faster and extending payables."),
        AnalysisDefinition::new(
            "balance_sheet_consistency", "Balance Sheet Consistency", "اتساق الميزانية العمومية",
            Structural, "data_integrity", "consistency", LowerIsBetter, Unit::Percent,
            balance_sheet_consistency, "|total_assets − (total_liabilities + total_equity)| / total_assets × 100",
            &[TotalAssets, TotalLiabilities, TotalEquity],
        )
        .methodology("Soft check of the accounting identity; a large gap signals mis-keyed or partial data.")
        .remediation("Reconcile the balance sheet totals before relying on the other analyses."),
        AnalysisDefinition::new(
            "revenue_change_yoy", "Revenue Change (YoY)", "التغير السنوي في الإيرادات",
            Structural, "horizontal", "year_over_year", HigherIsBetter, Unit::Percent,
            revenue_change, "(revenue − prior revenue) / |prior revenue| × 100",
            &[Revenue],
        )
        .history(1)
        .methodology("Horizontal analysis of the top line against the preceding period.")
        .remediation("Investigate lost volume or pricing and revisit the commercial strategy."),
        AnalysisDefinition::new(
            "total_assets_change_yoy", "Total Assets Change (YoY)", "التغير السنوي في إجمالي الأصول",
            Structural, "horizontal", "year_over_year", HigherIsBetter, Unit::Percent,
            total_assets_change, "(total_assets − prior total_assets) / |prior total_assets| × 100",
            &[TotalAssets],
        )
        .history(1)
        .methodology("Horizontal analysis of the asset base.")
        .remediation("Check whether asset shrinkage reflects disposals, impairments or losses."),
        AnalysisDefinition::new(
            "net_income_change_yoy", "Net Income Change (YoY)", "التغير السنوي في صافي الدخل",
            Structural, "horizontal", "year_over_year", HigherIsBetter, Unit::Percent,
            net_income_change, "(net_income − prior net_income) / |prior net_income| × 100",
            &[NetIncome],
        )
        .history(1)
        .methodology("Horizontal analysis of the bottom line; measured against the absolute prior value so loss reductions count as gains.")
        .remediation("Identify the cost or revenue drivers behind the earnings decline."),
    ]
}
