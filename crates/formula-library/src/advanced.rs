//! Advanced tier: decompositions, distress and quality scores, multi-period
//! trends, intrinsic value and peer comparison.

use std::collections::BTreeMap;

use statement_core::{
    stats, AnalysisValue,
    ComparisonDirection::{HigherIsBetter, LowerIsBetter, TargetRange},
    ComputationError,
    FinancialField::{self, *},
    FinancialPeriod, RiskBand, Tier, TrendPoint,
};

use crate::definition::{AnalysisDefinition, Unit};
use crate::formula::{self, change_pct, finite, percent, ratio, require, Computation, FormulaInput, FormulaResult};

/// Statutory rate used to approximate NOPAT (21% US corporate rate).
const NOPAT_TAX_RATE: f64 = 0.21;
const CAGR_WINDOW_YEARS: i32 = 3;
const GRAHAM_MULTIPLIER: f64 = 22.5;
const MIN_FSCORE_SIGNALS: usize = 5;

// Altman distress zones: Z for listed companies, Z' for the private-firm model
const ALTMAN_PUBLIC_ZONES: RiskBand = RiskBand::Floor {
    safe_above: 2.99,
    danger_below: 1.81,
};
const ALTMAN_PRIVATE_ZONES: RiskBand = RiskBand::Floor {
    safe_above: 2.9,
    danger_below: 1.23,
};

// DCF-lite assumptions
const RISK_FREE_RATE: f64 = 0.045;
const EQUITY_RISK_PREMIUM: f64 = 0.055;
const TERMINAL_GROWTH: f64 = 0.03;
const DEFAULT_GROWTH: f64 = 0.03;
const PROJECTION_YEARS: i32 = 5;

fn breakdown(primary: f64, components: &[(&str, f64)]) -> AnalysisValue {
    AnalysisValue::Breakdown {
        primary,
        components: components
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// ROE split into margin × turnover × leverage.
pub fn dupont_analysis(input: &FormulaInput<'_>) -> FormulaResult {
    let net_income = input.field(NetIncome)?;
    let revenue = input.field(Revenue)?;
    let ta = input.field(TotalAssets)?;
    let equity = input.field(TotalEquity)?;

    let net_margin = ratio(net_income, revenue, "revenue")?;
    let turnover = ratio(revenue, ta, "total_assets")?;
    let multiplier = ratio(ta, equity, "total_equity")?;
    let roe = finite(net_margin * turnover * multiplier * 100.0, "return_on_equity")?;

    Ok(Computation::new(breakdown(
        roe,
        &[
            ("net_margin_pct", net_margin * 100.0),
            ("asset_turnover", turnover),
            ("equity_multiplier", multiplier),
            ("return_on_equity_pct", roe),
        ],
    )))
}

/// Altman Z-score. Retained earnings are not part of the data model, so
/// equity stands in for them. Without market data the private-firm Z' weights
/// are used with book equity.
pub fn altman_z_score(input: &FormulaInput<'_>) -> FormulaResult {
    let ta = input.field(TotalAssets)?;
    let working_capital = input.field(CurrentAssets)? - input.field(CurrentLiabilities)?;
    let equity = input.field(TotalEquity)?;
    let ebit = input.field(OperatingIncome)?;
    let liabilities = input.field(TotalLiabilities)?;
    let revenue = input.field(Revenue)?;

    let mut estimated = vec!["retained_earnings=total_equity".to_string()];
    let x1 = ratio(working_capital, ta, "total_assets")?;
    let x2 = ratio(equity, ta, "total_assets")?;
    let x3 = ratio(ebit, ta, "total_assets")?;
    let x5 = ratio(revenue, ta, "total_assets")?;

    let (z, x4, private_model, zones) = match formula::market_value(input.current, &mut estimated) {
        Ok(mv) => {
            let x4 = ratio(mv, liabilities, "total_liabilities")?;
            (1.2 * x1 + 1.4 * x2 + 3.3 * x3 + 0.6 * x4 + 1.0 * x5, x4, 0.0, ALTMAN_PUBLIC_ZONES)
        }
        Err(_) => {
            estimated.push("market_value=total_equity (private-firm model)".to_string());
            let x4 = ratio(equity, liabilities, "total_liabilities")?;
            (
                0.717 * x1 + 0.847 * x2 + 3.107 * x3 + 0.420 * x4 + 0.998 * x5,
                x4,
                1.0,
                ALTMAN_PRIVATE_ZONES,
            )
        }
    };
    let z = finite(z, "z_score")?;

    Ok(Computation::new(breakdown(
        z,
        &[
            ("x1_working_capital", x1),
            ("x2_retained_earnings", x2),
            ("x3_ebit", x3),
            ("x4_equity_to_liabilities", x4),
            ("x5_sales", x5),
            ("private_model", private_model),
        ],
    ))
    .with_estimates(estimated)
    .with_risk_band(zones))
}

/// Revenue CAGR over up to three years of history.
pub fn revenue_cagr(input: &FormulaInput<'_>) -> FormulaResult {
    let current_revenue = input.field(Revenue)?;
    let window_start = input.current.year - CAGR_WINDOW_YEARS;

    let window: Vec<&FinancialPeriod> = input
        .series()
        .filter(|p| p.year >= window_start && p.revenue.is_some())
        .collect();
    let base = window
        .first()
        .filter(|p| p.year < input.current.year)
        .ok_or(ComputationError::InsufficientHistory {
            required: 1,
            available: window.len().saturating_sub(1),
        })?;
    let base_revenue = require(base, Revenue)?;
    let years = (input.current.year - base.year) as f64;

    let growth = stats::cagr(base_revenue, current_revenue, years)
        .ok_or_else(|| ComputationError::Undefined("revenue must be positive at both ends".into()))?;
    let points = window
        .iter()
        .filter_map(|p| p.revenue.map(|value| TrendPoint { year: p.year, value }))
        .collect();

    Ok(Computation::new(AnalysisValue::Trend {
        primary: finite(growth * 100.0, "revenue_cagr")?,
        points,
    }))
}

/// Revenue CAGR from the oldest reported year inside the window to the
/// current year, as a fraction.
fn windowed_revenue_growth(input: &FormulaInput<'_>) -> Option<f64> {
    let current_revenue = input.current.revenue?;
    let window_start = input.current.year - CAGR_WINDOW_YEARS;
    let base = input
        .prior
        .iter()
        .find(|p| p.year >= window_start && p.year < input.current.year && p.revenue.is_some())?;
    stats::cagr(base.revenue?, current_revenue, (input.current.year - base.year) as f64)
}

/// Least-squares slope of net income, as a percentage of average absolute
/// net income per year.
pub fn net_income_trend(input: &FormulaInput<'_>) -> FormulaResult {
    let points: Vec<TrendPoint> = input
        .series()
        .filter_map(|p| p.net_income.map(|value| TrendPoint { year: p.year, value }))
        .collect();
    if points.len() < 2 {
        return Err(ComputationError::InsufficientHistory {
            required: 1,
            available: points.len().saturating_sub(1),
        });
    }

    let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.year as f64, p.value)).collect();
    let slope = stats::linear_slope(&xy)
        .ok_or_else(|| ComputationError::Undefined("periods share the same year".into()))?;
    let values: Vec<f64> = points.iter().map(|p| p.value.abs()).collect();
    let scale = stats::mean(&values);

    Ok(Computation::new(AnalysisValue::Trend {
        primary: percent(slope, scale, "average net_income")?,
        points,
    }))
}

fn gross_margin_of(period: &FinancialPeriod) -> Result<f64, ComputationError> {
    let revenue = require(period, Revenue)?;
    let cogs = formula::cogs(period, &mut Vec::new())?;
    ratio(revenue - cogs, revenue, "revenue")
}

fn roa(period: &FinancialPeriod) -> Result<f64, ComputationError> {
    ratio(require(period, NetIncome)?, require(period, TotalAssets)?, "total_assets")
}

fn share_of_assets(period: &FinancialPeriod, field: FinancialField) -> Result<f64, ComputationError> {
    ratio(require(period, field)?, require(period, TotalAssets)?, "total_assets")
}

fn current_ratio_of(period: &FinancialPeriod) -> Result<f64, ComputationError> {
    ratio(require(period, CurrentAssets)?, require(period, CurrentLiabilities)?, "current_liabilities")
}

type Signal = fn(&FinancialPeriod, &FinancialPeriod) -> Result<bool, ComputationError>;

fn roa_positive(c: &FinancialPeriod, _: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(roa(c)? > 0.0)
}

fn ocf_positive(c: &FinancialPeriod, _: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(require(c, OperatingCashFlow)? > 0.0)
}

fn roa_improving(c: &FinancialPeriod, p: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(roa(c)? > roa(p)?)
}

fn cash_exceeds_earnings(c: &FinancialPeriod, _: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(require(c, OperatingCashFlow)? > require(c, NetIncome)?)
}

fn leverage_falling(c: &FinancialPeriod, p: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(share_of_assets(c, LongTermDebt)? < share_of_assets(p, LongTermDebt)?)
}

fn liquidity_improving(c: &FinancialPeriod, p: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(current_ratio_of(c)? > current_ratio_of(p)?)
}

fn no_dilution(c: &FinancialPeriod, p: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(require(c, SharesOutstanding)? <= require(p, SharesOutstanding)?)
}

fn margin_improving(c: &FinancialPeriod, p: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(gross_margin_of(c)? > gross_margin_of(p)?)
}

fn turnover_improving(c: &FinancialPeriod, p: &FinancialPeriod) -> Result<bool, ComputationError> {
    Ok(share_of_assets(c, Revenue)? > share_of_assets(p, Revenue)?)
}

const FSCORE_SIGNALS: [(&str, Signal); 9] = [
    ("roa_positive", roa_positive),
    ("ocf_positive", ocf_positive),
    ("roa_improving", roa_improving),
    ("cash_exceeds_earnings", cash_exceeds_earnings),
    ("leverage_falling", leverage_falling),
    ("liquidity_improving", liquidity_improving),
    ("no_dilution", no_dilution),
    ("margin_improving", margin_improving),
    ("turnover_improving", turnover_improving),
];

/// Piotroski F-score over nine binary signals. Signals whose inputs are
/// missing are skipped and the score is rescaled to the nine-point basis.
pub fn piotroski_f_score(input: &FormulaInput<'_>) -> FormulaResult {
    let current = input.current;
    let previous = input.previous()?;

    let mut components = Vec::new();
    let mut estimated = Vec::new();
    let mut passed = 0usize;
    for (name, signal) in FSCORE_SIGNALS {
        match signal(current, previous) {
            Ok(hit) => {
                if hit {
                    passed += 1;
                }
                components.push((name, if hit { 1.0 } else { 0.0 }));
            }
            Err(_) => estimated.push(format!("{} unavailable", name)),
        }
    }

    let evaluated = components.len();
    if evaluated < MIN_FSCORE_SIGNALS {
        return Err(ComputationError::Undefined(format!(
            "only {} of 9 F-score signals could be evaluated",
            evaluated
        )));
    }
    let score = passed as f64 * FSCORE_SIGNALS.len() as f64 / evaluated as f64;
    components.push(("signals_evaluated", evaluated as f64));

    Ok(Computation::new(breakdown(score, &components)).with_estimates(estimated))
}

/// % change in operating income per % change in revenue.
pub fn degree_of_operating_leverage(input: &FormulaInput<'_>) -> FormulaResult {
    let oi_change = change_pct(input.field(OperatingIncome)?, input.prev_field(OperatingIncome)?, "prior operating_income")?;
    let revenue_change = change_pct(input.field(Revenue)?, input.prev_field(Revenue)?, "prior revenue")?;
    Ok(Computation::scalar(ratio(oi_change, revenue_change, "revenue change")?))
}

pub fn degree_of_financial_leverage(input: &FormulaInput<'_>) -> FormulaResult {
    let oi = input.field(OperatingIncome)?;
    let interest = input.field(InterestExpense)?.abs();
    let ebt = oi - interest;
    if ebt <= 0.0 {
        return Err(ComputationError::Undefined(
            "operating income does not cover interest".into(),
        ));
    }
    Ok(Computation::scalar(ratio(oi, ebt, "operating_income - interest_expense")?))
}

/// NOPAT / (equity + long-term debt)
pub fn return_on_invested_capital(input: &FormulaInput<'_>) -> FormulaResult {
    let oi = input.field(OperatingIncome)?;
    let invested = input.field(TotalEquity)? + input.field(LongTermDebt)?;
    let nopat = oi * (1.0 - NOPAT_TAX_RATE);
    Ok(Computation::scalar(percent(nopat, invested, "invested_capital")?))
}

pub fn ev_to_ebit(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let mv = formula::market_value(input.current, &mut estimated)?;
    let debt = input.field(LongTermDebt)?;
    let cash = match input.current.cash {
        Some(cash) => cash,
        None => {
            estimated.push("cash=0".to_string());
            0.0
        }
    };
    let ebit = input.field(OperatingIncome)?;
    if ebit < 0.0 {
        return Err(ComputationError::Undefined("operating income is negative".into()));
    }
    let ev = mv + debt - cash;
    Ok(Computation::scalar(ratio(ev, ebit, "operating_income")?).with_estimates(estimated))
}

/// Price relative to the Graham number √(22.5 × EPS × BVPS).
pub fn price_to_graham_number(input: &FormulaInput<'_>) -> FormulaResult {
    let shares = input.field(SharesOutstanding)?;
    let eps = ratio(input.field(NetIncome)?, shares, "shares_outstanding")?;
    let bvps = ratio(input.field(TotalEquity)?, shares, "shares_outstanding")?;
    if eps <= 0.0 || bvps <= 0.0 {
        return Err(ComputationError::Undefined(
            "Graham number needs positive earnings and book value".into(),
        ));
    }
    let graham = (GRAHAM_MULTIPLIER * eps * bvps).sqrt();
    let mut estimated = Vec::new();
    let price = formula::stock_price(input.current, &mut estimated)?;
    let value = ratio(price, graham, "graham_number")?;

    Ok(Computation::new(breakdown(
        value,
        &[
            ("graham_number", graham),
            ("earnings_per_share", eps),
            ("book_value_per_share", bvps),
            ("stock_price", price),
        ],
    ))
    .with_estimates(estimated))
}

/// Five-year DCF on free cash flow per share with a Gordon terminal value.
/// Growth is the three-year revenue CAGR, clamped to [-5%, 25%].
pub fn dcf_price_to_fair_value(input: &FormulaInput<'_>) -> FormulaResult {
    let mut estimated = Vec::new();
    let fcf = formula::free_cash_flow(input.current, &mut estimated)?;
    let shares = input.field(SharesOutstanding)?;
    let price = formula::stock_price(input.current, &mut estimated)?;

    let fcf_per_share = ratio(fcf, shares, "shares_outstanding")?;
    if fcf_per_share <= 0.0 {
        return Err(ComputationError::Undefined("free cash flow is not positive".into()));
    }

    let growth_rate = match windowed_revenue_growth(input) {
        Some(growth) => growth.clamp(-0.05, 0.25),
        None => {
            estimated.push(format!("growth_rate={}", DEFAULT_GROWTH));
            DEFAULT_GROWTH
        }
    };
    let discount_rate = (RISK_FREE_RATE + EQUITY_RISK_PREMIUM).max(0.08);

    let projected: f64 = (1..=PROJECTION_YEARS)
        .map(|i| fcf_per_share * (1.0 + growth_rate).powi(i) / (1.0 + discount_rate).powi(i))
        .sum();
    let terminal_value = fcf_per_share * (1.0 + growth_rate).powi(PROJECTION_YEARS) * (1.0 + TERMINAL_GROWTH)
        / (discount_rate - TERMINAL_GROWTH);
    let terminal_pv = terminal_value / (1.0 + discount_rate).powi(PROJECTION_YEARS);
    let fair_value = finite(projected + terminal_pv, "fair_value")?;

    Ok(Computation::new(breakdown(
        ratio(price, fair_value, "fair_value")?,
        &[
            ("fair_value_per_share", fair_value),
            ("growth_rate", growth_rate),
            ("discount_rate", discount_rate),
            ("free_cash_flow_per_share", fcf_per_share),
        ],
    ))
    .with_estimates(estimated))
}

/// Coefficient of variation of net income across all supplied periods.
pub fn earnings_volatility(input: &FormulaInput<'_>) -> FormulaResult {
    let values: Vec<f64> = input.series().filter_map(|p| p.net_income).collect();
    if values.len() < 3 {
        return Err(ComputationError::InsufficientHistory {
            required: 2,
            available: values.len().saturating_sub(1),
        });
    }
    let cv = stats::coefficient_of_variation(&values)
        .ok_or_else(|| ComputationError::DivisionByZero("average net_income".into()))?;
    Ok(Computation::scalar(cv * 100.0))
}

/// Share of combined peer-group revenue, with the revenue percentile alongside.
pub fn peer_revenue_share(input: &FormulaInput<'_>) -> FormulaResult {
    let revenue = input.field(Revenue)?;
    let peers: Vec<f64> = input.peers.iter().filter_map(|p| p.revenue).collect();
    if peers.is_empty() {
        return Err(ComputationError::Undefined("no peer revenue data".into()));
    }
    let total = revenue + peers.iter().sum::<f64>();
    let share = percent(revenue, total, "peer group revenue")?;

    let mut group = peers.clone();
    group.push(revenue);
    let percentile = stats::percentile_rank(revenue, &group) * 100.0;

    Ok(Computation::new(breakdown(
        share,
        &[
            ("revenue_share_pct", share),
            ("revenue_percentile", percentile),
            ("peer_count", peers.len() as f64),
        ],
    )))
}

pub(crate) fn definitions() -> Vec<AnalysisDefinition> {
    use Tier::Advanced;

    vec![
        AnalysisDefinition::new(
            "dupont_analysis", "DuPont Analysis", "تحليل ديوبونت",
            Advanced, "profitability_decomposition", "dupont", HigherIsBetter, Unit::Percent,
            dupont_analysis, "ROE = (net_income / revenue) × (revenue / total_assets) × (total_assets / total_equity)",
            &[NetIncome, Revenue, TotalAssets, TotalEquity],
        )
        .methodology("Three-step DuPont decomposition of return on equity into margin, turnover and leverage.")
        .remediation("Identify which DuPont leg drags ROE and target it: pricing for margin, utilisation for turnover."),
        AnalysisDefinition::new(
            "altman_z_score", "Altman Z-Score", "نموذج ألتمان للتنبؤ بالتعثر",
            Advanced, "distress", "bankruptcy_prediction", HigherIsBetter, Unit::Score,
            altman_z_score, "1.2·X1 + 1.4·X2 + 3.3·X3 + 0.6·X4 + 1.0·X5",
            &[CurrentAssets, CurrentLiabilities, TotalAssets, TotalEquity, OperatingIncome, TotalLiabilities, Revenue],
        )
        .methodology("Altman public-company model; Z' private-firm weights when market value is unavailable. Equity proxies retained earnings.")
        .risk(ALTMAN_PUBLIC_ZONES)
        .remediation("Distress indicators are elevated; prioritise liquidity, deleveraging and profitability recovery."),
        AnalysisDefinition::new(
            "revenue_cagr", "Revenue CAGR (3Y)", "معدل النمو السنوي المركب للإيرادات",
            Advanced, "growth", "trend", HigherIsBetter, Unit::Percent,
            revenue_cagr, "(revenue / revenue 3 years earlier)^(1/years) − 1",
            &[Revenue],
        )
        .history(1)
        .methodology("Compound annual growth over up to three years, using the oldest period inside the window.")
        .remediation("Growth is lagging; review market share, pricing and new revenue streams."),
        AnalysisDefinition::new(
            "net_income_trend", "Net Income Trend", "اتجاه صافي الدخل",
            Advanced, "growth", "trend", HigherIsBetter, Unit::Percent,
            net_income_trend, "least-squares slope of net_income / mean |net_income| × 100",
            &[NetIncome],
        )
        .history(1)
        .methodology("Direction and steepness of the earnings trend across all supplied periods.")
        .remediation("Earnings are trending down; address the structural cost or revenue pressure behind it."),
        AnalysisDefinition::new(
            "piotroski_f_score", "Piotroski F-Score", "مؤشر بيوتروسكي",
            Advanced, "quality_scoring", "composite", HigherIsBetter, Unit::Score,
            piotroski_f_score, "sum of nine binary profitability, leverage and efficiency signals",
            &[NetIncome, TotalAssets],
        )
        .history(1)
        .methodology("Nine-signal fundamental strength score; rescaled to nine points when signals are unavailable.")
        .risk(RiskBand::Floor { safe_above: 6.0, danger_below: 3.0 })
        .remediation("Several fundamental signals are deteriorating; review profitability, funding and efficiency trends together."),
        AnalysisDefinition::new(
            "degree_of_operating_leverage", "Degree of Operating Leverage", "درجة الرافعة التشغيلية",
            Advanced, "leverage_analysis", "operating", TargetRange, Unit::Times,
            degree_of_operating_leverage, "%Δ operating_income / %Δ revenue",
            &[OperatingIncome, Revenue],
        )
        .history(1)
        .methodology("Sensitivity of operating profit to revenue changes.")
        .remediation("Profit is highly sensitive to sales; consider converting fixed costs to variable."),
        AnalysisDefinition::new(
            "degree_of_financial_leverage", "Degree of Financial Leverage", "درجة الرافعة المالية",
            Advanced, "leverage_analysis", "financial", LowerIsBetter, Unit::Times,
            degree_of_financial_leverage, "operating_income / (operating_income − |interest_expense|)",
            &[OperatingIncome, InterestExpense],
        )
        .methodology("Sensitivity of pre-tax earnings to operating income given fixed interest charges.")
        .risk(RiskBand::Ceiling { safe_below: 1.5, danger_above: 3.0 })
        .remediation("Fixed financing costs amplify earnings swings; reduce interest-bearing debt."),
        AnalysisDefinition::new(
            "return_on_invested_capital", "Return on Invested Capital", "العائد على رأس المال المستثمر",
            Advanced, "profitability_decomposition", "returns", HigherIsBetter, Unit::Percent,
            return_on_invested_capital, "operating_income × (1 − 21%) / (total_equity + long_term_debt) × 100",
            &[OperatingIncome, TotalEquity, LongTermDebt],
        )
        .methodology("After-tax operating return on the capital supplied by owners and lenders.")
        .remediation("Returns trail the capital base; redeploy capital to higher-return uses."),
        AnalysisDefinition::new(
            "ev_to_ebit", "EV / EBIT", "قيمة المنشأة إلى الأرباح التشغيلية",
            Advanced, "valuation", "enterprise", LowerIsBetter, Unit::Times,
            ev_to_ebit, "(market_value + long_term_debt − cash) / operating_income",
            &[LongTermDebt, OperatingIncome],
        )
        .methodology("Enterprise value relative to operating profit.")
        .remediation("Enterprise valuation is rich against operating profit; confirm growth supports it."),
        AnalysisDefinition::new(
            "price_to_graham_number", "Price to Graham Number", "السعر إلى رقم جراهام",
            Advanced, "valuation", "intrinsic", LowerIsBetter, Unit::Ratio,
            price_to_graham_number, "stock_price / √(22.5 × EPS × BVPS)",
            &[NetIncome, TotalEquity, SharesOutstanding],
        )
        .methodology("Graham's defensive-investor ceiling price combining earnings and book value.")
        .remediation("The share trades above Graham's defensive ceiling; margin of safety is thin."),
        AnalysisDefinition::new(
            "dcf_price_to_fair_value", "DCF Price to Fair Value", "السعر إلى القيمة العادلة (التدفقات المخصومة)",
            Advanced, "valuation", "intrinsic", LowerIsBetter, Unit::Ratio,
            dcf_price_to_fair_value, "stock_price / Σ PV(FCF per share, 5y) + PV(terminal value)",
            &[SharesOutstanding],
        )
        .methodology("DCF-lite: five-year projection at clamped revenue growth, 10% discount rate, 3% terminal growth.")
        .remediation("Price exceeds the cash-flow-based fair value estimate; reassess the valuation."),
        AnalysisDefinition::new(
            "earnings_volatility", "Earnings Volatility", "تقلب الأرباح",
            Advanced, "stability", "dispersion", LowerIsBetter, Unit::Percent,
            earnings_volatility, "stdev(net_income) / |mean(net_income)| × 100",
            &[NetIncome],
        )
        .history(2)
        .methodology("Coefficient of variation of net income across at least three periods.")
        .risk(RiskBand::Ceiling { safe_below: 25.0, danger_above: 60.0 })
        .remediation("Earnings are unstable; diversify revenue and hedge key cost exposures."),
        AnalysisDefinition::new(
            "peer_revenue_share", "Peer Revenue Share", "الحصة من إيرادات المنافسين",
            Advanced, "peer_comparison", "scale", HigherIsBetter, Unit::Percent,
            peer_revenue_share, "revenue / (revenue + Σ peer revenue) × 100",
            &[Revenue],
        )
        .methodology("Scale of the company within the supplied peer group.")
        .remediation("The company is sub-scale against peers; evaluate growth or partnership options."),
    ]
}
