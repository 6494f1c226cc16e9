use statement_core::{AnalysisValue, ComputationError, FinancialField, FinancialPeriod, RiskBand};

/// Read-only view a formula evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct FormulaInput<'a> {
    pub current: &'a FinancialPeriod,
    /// Oldest to newest
    pub prior: &'a [FinancialPeriod],
    pub peers: &'a [FinancialPeriod],
}

impl<'a> FormulaInput<'a> {
    pub fn new(current: &'a FinancialPeriod, prior: &'a [FinancialPeriod], peers: &'a [FinancialPeriod]) -> Self {
        Self {
            current,
            prior,
            peers,
        }
    }

    pub fn single(current: &'a FinancialPeriod) -> Self {
        Self::new(current, &[], &[])
    }

    /// The period immediately before `current`.
    pub fn previous(&self) -> Result<&'a FinancialPeriod, ComputationError> {
        self.prior.last().ok_or(ComputationError::InsufficientHistory {
            required: 1,
            available: 0,
        })
    }

    pub fn field(&self, field: FinancialField) -> Result<f64, ComputationError> {
        require(self.current, field)
    }

    pub fn prev_field(&self, field: FinancialField) -> Result<f64, ComputationError> {
        require(self.previous()?, field)
    }

    /// The same input seen one period earlier: the last prior period becomes
    /// current. Peers are dropped since they belong to the current year.
    pub fn shifted(&self) -> Option<FormulaInput<'a>> {
        let (last, rest) = self.prior.split_last()?;
        Some(FormulaInput {
            current: last,
            prior: rest,
            peers: &[],
        })
    }

    /// All periods, oldest to newest, ending with `current`.
    pub fn series(&self) -> impl Iterator<Item = &'a FinancialPeriod> {
        self.prior.iter().chain(std::iter::once(self.current))
    }
}

/// A successfully computed value plus any inputs that had to be estimated.
#[derive(Debug, Clone, PartialEq)]
pub struct Computation {
    pub value: AnalysisValue,
    pub estimated: Vec<String>,
    /// Overrides the definition's risk band when the formula picked a model
    /// with its own danger zones
    pub risk_band: Option<RiskBand>,
}

impl Computation {
    pub fn new(value: AnalysisValue) -> Self {
        Self {
            value,
            estimated: Vec::new(),
            risk_band: None,
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self::new(AnalysisValue::scalar(value))
    }

    pub fn with_estimates(mut self, estimated: Vec<String>) -> Self {
        self.estimated = estimated;
        self
    }

    pub fn with_risk_band(mut self, band: RiskBand) -> Self {
        self.risk_band = Some(band);
        self
    }
}

pub type FormulaResult = Result<Computation, ComputationError>;

/// Every analysis is a plain function pointer so definitions stay `'static` data.
pub type FormulaFn = fn(&FormulaInput<'_>) -> FormulaResult;

pub fn require(period: &FinancialPeriod, field: FinancialField) -> Result<f64, ComputationError> {
    period.get(field).ok_or(ComputationError::MissingField(field))
}

/// `num / den`, refusing a zero denominator and non-finite results.
pub fn ratio(num: f64, den: f64, den_label: &str) -> Result<f64, ComputationError> {
    if den.abs() < f64::EPSILON {
        return Err(ComputationError::DivisionByZero(den_label.to_string()));
    }
    finite(num / den, den_label)
}

/// `num / den * 100`
pub fn percent(num: f64, den: f64, den_label: &str) -> Result<f64, ComputationError> {
    ratio(num, den, den_label).map(|r| r * 100.0)
}

/// Percentage change from `previous` to `current`, measured against |previous|.
pub fn change_pct(current: f64, previous: f64, label: &str) -> Result<f64, ComputationError> {
    percent(current - previous, previous.abs(), label)
}

pub fn finite(value: f64, label: &str) -> Result<f64, ComputationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputationError::NonFinite(label.to_string()))
    }
}

/// Market capitalisation, estimated from price × shares when not reported.
pub(crate) fn market_value(period: &FinancialPeriod, estimated: &mut Vec<String>) -> Result<f64, ComputationError> {
    if let Some(mv) = period.market_value {
        return Ok(mv);
    }
    let price = require(period, FinancialField::StockPrice)
        .map_err(|_| ComputationError::MissingField(FinancialField::MarketValue))?;
    let shares = require(period, FinancialField::SharesOutstanding)
        .map_err(|_| ComputationError::MissingField(FinancialField::MarketValue))?;
    estimated.push("market_value=stock_price*shares_outstanding".to_string());
    Ok(price * shares)
}

/// Share price, estimated from market value / shares when not reported.
pub(crate) fn stock_price(period: &FinancialPeriod, estimated: &mut Vec<String>) -> Result<f64, ComputationError> {
    if let Some(price) = period.stock_price {
        return Ok(price);
    }
    let mv = require(period, FinancialField::MarketValue)
        .map_err(|_| ComputationError::MissingField(FinancialField::StockPrice))?;
    let shares = require(period, FinancialField::SharesOutstanding)?;
    estimated.push("stock_price=market_value/shares_outstanding".to_string());
    ratio(mv, shares, "shares_outstanding")
}

/// Cost of goods sold, estimated as revenue − gross profit when not reported.
pub(crate) fn cogs(period: &FinancialPeriod, estimated: &mut Vec<String>) -> Result<f64, ComputationError> {
    if let Some(cogs) = period.cogs {
        return Ok(cogs);
    }
    let revenue = require(period, FinancialField::Revenue)?;
    let gross_profit = require(period, FinancialField::GrossProfit)
        .map_err(|_| ComputationError::MissingField(FinancialField::Cogs))?;
    estimated.push("cogs=revenue-gross_profit".to_string());
    Ok(revenue - gross_profit)
}

/// Free cash flow, estimated as operating + investing cash flow when not
/// reported. Investing flows stand in for capex and include acquisitions.
pub(crate) fn free_cash_flow(period: &FinancialPeriod, estimated: &mut Vec<String>) -> Result<f64, ComputationError> {
    if let Some(fcf) = period.free_cash_flow {
        return Ok(fcf);
    }
    let ocf = require(period, FinancialField::OperatingCashFlow)
        .map_err(|_| ComputationError::MissingField(FinancialField::FreeCashFlow))?;
    let cfi = require(period, FinancialField::InvestingCashFlow)
        .map_err(|_| ComputationError::MissingField(FinancialField::FreeCashFlow))?;
    estimated.push("free_cash_flow=operating_cash_flow+investing_cash_flow".to_string());
    Ok(ocf + cfi)
}
