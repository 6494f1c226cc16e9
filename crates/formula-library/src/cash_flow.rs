//! Cash-flow tier: adequacy, quality and valuation of cash generation.

use statement_core::{
    ComparisonDirection::{HigherIsBetter, LowerIsBetter},
    ComputationError,
    FinancialField::*,
    RiskBand, Tier,
};

use crate::definition::{AnalysisDefinition, Unit};
use crate::formula::{self, percent, ratio, Computation, FormulaInput, FormulaResult};

pub fn operating_cash_flow_ratio(input: &FormulaInput<'_>) -> FormulaResult {
    let ocf = input.field(OperatingCashFlow)?;
    let cl = input.field(CurrentLiabilities)?;
    Ok(Computation::scalar(ratio(ocf, cl, "current_liabilities")?))
}

pub fn cash_flow_margin(input: &FormulaInput<'_>) -> FormulaResult {
    let ocf = input.field(OperatingCashFlow)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(percent(ocf, revenue, "revenue")?))
}

pub fn free_cash_flow_margin(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let fcf = formula::free_cash_flow(input.current, &mut estimated)?;
    let revenue = input.field(Revenue)?;
    Ok(Computation::scalar(percent(fcf, revenue, "revenue")?).with_estimates(estimated))
}

/// Operating cash flow per unit of net income. Only meaningful for profitable periods.
pub fn quality_of_earnings(input: &FormulaInput<'_>) -> FormulaResult {
    let ocf = input.field(OperatingCashFlow)?;
    let net_income = input.field(NetIncome)?;
    if net_income < 0.0 {
        return Err(ComputationError::Undefined("net income is negative".into()));
    }
    Ok(Computation::scalar(ratio(ocf, net_income, "net_income")?))
}

pub fn cash_flow_to_debt(input: &FormulaInput<'_>) -> FormulaResult {
    let ocf = input.field(OperatingCashFlow)?;
    let liabilities = input.field(TotalLiabilities)?;
    Ok(Computation::scalar(ratio(ocf, liabilities, "total_liabilities")?))
}

/// Operating cash flow against investing outflows, the capex proxy.
pub fn capex_coverage(input: &FormulaInput<'_>) -> FormulaResult {
    let ocf = input.field(OperatingCashFlow)?;
    let investing = input.field(InvestingCashFlow)?;
    if investing > 0.0 {
        return Err(ComputationError::Undefined(
            "investing cash flow is a net inflow".into(),
        ));
    }
    Ok(Computation::scalar(ratio(ocf, investing.abs(), "investing_cash_flow")?))
}

pub fn free_cash_flow_yield(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let fcf = formula::free_cash_flow(input.current, &mut estimated)?;
    let mv = formula::market_value(input.current, &mut estimated)?;
    Ok(Computation::scalar(percent(fcf, mv, "market_value")?).with_estimates(estimated))
}

pub fn cash_return_on_assets(input: &FormulaInput<'_>) -> FormulaResult {
    let ocf = input.field(OperatingCashFlow)?;
    let ta = input.field(TotalAssets)?;
    Ok(Computation::scalar(percent(ocf, ta, "total_assets")?))
}

pub fn free_cash_flow_per_share(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let fcf = formula::free_cash_flow(input.current, &mut estimated)?;
    let shares = input.field(SharesOutstanding)?;
    Ok(Computation::scalar(ratio(fcf, shares, "shares_outstanding")?).with_estimates(estimated))
}

/// Financing inflows relative to operating cash generation. Net repayments
/// give a negative value.
pub fn financing_dependency(input: &FormulaInput<'_>) -> FormulaResult {
    let financing = input.field(FinancingCashFlow)?;
    let ocf = input.field(OperatingCashFlow)?;
    Ok(Computation::scalar(percent(financing, ocf.abs(), "operating_cash_flow")?))
}

/// (OCF + interest paid) / interest paid
pub fn cash_interest_coverage(input: &FormulaInput<'_>) -> FormulaResult {
    let ocf = input.field(OperatingCashFlow)?;
    let interest = input.field(InterestExpense)?.abs();
    Ok(Computation::scalar(ratio(ocf + interest, interest, "interest_expense")?))
}

/// Days inventory outstanding + days sales outstanding.
pub fn operating_cycle(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let cogs = formula::cogs(input.current, &mut estimated)?;
    let inventory = input.field(Inventory)?;
    let receivables = input.field(Receivables)?;
    let revenue = input.field(Revenue)?;
    let dio = ratio(inventory, cogs, "cogs")? * 365.0;
    let dso = ratio(receivables, revenue, "revenue")? * 365.0;
    Ok(Computation::scalar(dio + dso).with_estimates(estimated))
}

pub(crate) fn definitions() -> Vec<AnalysisDefinition> {
    use Tier::CashFlow;

    vec![
        AnalysisDefinition::new(
            "operating_cash_flow_ratio", "Operating Cash Flow Ratio", "نسبة التدفق النقدي التشغيلي",
            CashFlow, "cash_adequacy", "liquidity", HigherIsBetter, Unit::Ratio,
            operating_cash_flow_ratio, "operating_cash_flow / current_liabilities",
            &[OperatingCashFlow, CurrentLiabilities],
        )
        .methodology("Whether cash from operations alone covers short-term obligations.")
        .risk(RiskBand::Floor { safe_above: 1.0, danger_below: 0.5 })
        .remediation("Strengthen operating cash generation before taking on further short-term obligations."),
        AnalysisDefinition::new(
            "cash_flow_margin", "Cash Flow Margin", "هامش التدفق النقدي",
            CashFlow, "cash_quality", "margins", HigherIsBetter, Unit::Percent,
            cash_flow_margin, "operating_cash_flow / revenue × 100",
            &[OperatingCashFlow, Revenue],
        )
        .methodology("Cash converted from each unit of revenue.")
        .remediation("Improve cash conversion by tightening working capital management."),
        AnalysisDefinition::new(
            "free_cash_flow_margin", "Free Cash Flow Margin", "هامش التدفق النقدي الحر",
            CashFlow, "cash_quality", "margins", HigherIsBetter, Unit::Percent,
            free_cash_flow_margin, "free_cash_flow / revenue × 100",
            &[Revenue],
        )
        .methodology("Cash left after investment per unit of revenue. Estimated as OCF + investing CF when FCF is not reported.")
        .remediation("Prioritise capital spending and improve operating cash flow."),
        AnalysisDefinition::new(
            "quality_of_earnings", "Quality of Earnings", "جودة الأرباح",
            CashFlow, "cash_quality", "accruals", HigherIsBetter, Unit::Ratio,
            quality_of_earnings, "operating_cash_flow / net_income",
            &[OperatingCashFlow, NetIncome],
        )
        .methodology("Cash backing of reported profit; below 1 signals accrual-heavy earnings.")
        .risk(RiskBand::Floor { safe_above: 1.0, danger_below: 0.5 })
        .remediation("Investigate accruals and revenue recognition; earnings are not converting to cash."),
        AnalysisDefinition::new(
            "cash_flow_to_debt", "Cash Flow to Debt", "نسبة التدفق النقدي إلى الديون",
            CashFlow, "cash_adequacy", "solvency", HigherIsBetter, Unit::Ratio,
            cash_flow_to_debt, "operating_cash_flow / total_liabilities",
            &[OperatingCashFlow, TotalLiabilities],
        )
        .methodology("Share of total liabilities that one year of operating cash could retire.")
        .risk(RiskBand::Floor { safe_above: 0.2, danger_below: 0.1 })
        .remediation("Reduce debt or raise operating cash flow to restore debt capacity."),
        AnalysisDefinition::new(
            "capex_coverage", "Capital Expenditure Coverage", "تغطية النفقات الرأسمالية",
            CashFlow, "cash_adequacy", "investment", HigherIsBetter, Unit::Times,
            capex_coverage, "operating_cash_flow / |investing_cash_flow|",
            &[OperatingCashFlow, InvestingCashFlow],
        )
        .methodology("Whether investment is funded internally. Net investing outflow is the capex proxy.")
        .remediation("Pace investment to what operations can fund or secure long-term financing."),
        AnalysisDefinition::new(
            "free_cash_flow_yield", "Free Cash Flow Yield", "عائد التدفق النقدي الحر",
            CashFlow, "cash_valuation", "yield", HigherIsBetter, Unit::Percent,
            free_cash_flow_yield, "free_cash_flow / market_value × 100",
            &[],
        )
        .methodology("Free cash flow earned per unit of market value.")
        .remediation("Cash generation is low relative to valuation; revisit capital allocation."),
        AnalysisDefinition::new(
            "cash_return_on_assets", "Cash Return on Assets", "العائد النقدي على الأصول",
            CashFlow, "cash_quality", "returns", HigherIsBetter, Unit::Percent,
            cash_return_on_assets, "operating_cash_flow / total_assets × 100",
            &[OperatingCashFlow, TotalAssets],
        )
        .methodology("Operating cash generated per unit of assets.")
        .remediation("Improve asset productivity in cash terms."),
        AnalysisDefinition::new(
            "free_cash_flow_per_share", "Free Cash Flow per Share", "التدفق النقدي الحر للسهم",
            CashFlow, "cash_valuation", "per_share", HigherIsBetter, Unit::PerShare,
            free_cash_flow_per_share, "free_cash_flow / shares_outstanding",
            &[SharesOutstanding],
        )
        .methodology("Free cash flow attributable to each share.")
        .remediation("Grow free cash flow and avoid dilution."),
        AnalysisDefinition::new(
            "financing_dependency", "Financing Dependency", "الاعتماد على التمويل",
            CashFlow, "cash_adequacy", "funding", LowerIsBetter, Unit::Percent,
            financing_dependency, "financing_cash_flow / |operating_cash_flow| × 100",
            &[FinancingCashFlow, OperatingCashFlow],
        )
        .methodology("External financing raised relative to internally generated cash.")
        .risk(RiskBand::Ceiling { safe_below: 25.0, danger_above: 75.0 })
        .remediation("Reduce reliance on external funding by improving internal cash generation."),
        AnalysisDefinition::new(
            "cash_interest_coverage", "Cash Interest Coverage", "التغطية النقدية للفوائد",
            CashFlow, "cash_adequacy", "debt_service", HigherIsBetter, Unit::Times,
            cash_interest_coverage, "(operating_cash_flow + |interest_expense|) / |interest_expense|",
            &[OperatingCashFlow, InterestExpense],
        )
        .methodology("Interest coverage measured on cash rather than accrual profit.")
        .risk(RiskBand::Floor { safe_above: 3.0, danger_below: 1.5 })
        .remediation("Refinance or reduce debt; operating cash barely services interest."),
        AnalysisDefinition::new(
            "operating_cycle", "Operating Cycle", "الدورة التشغيلية",
            CashFlow, "cash_efficiency", "cycle", LowerIsBetter, Unit::Days,
            operating_cycle, "inventory / cogs × 365 + receivables / revenue × 365",
            &[Inventory, Receivables, Revenue],
        )
        .methodology("Days from buying inventory to collecting cash from the sale.")
        .remediation("Shorten the cycle through faster inventory turns and collections."),
    ]
}
