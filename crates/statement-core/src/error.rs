use thiserror::Error;

use crate::period::FinancialField;

/// Fatal errors: the run either never starts or is abandoned.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Request rejected before any formula runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown analysis id: {0}")]
    UnknownAnalysis(String),

    #[error("Requested scope selects no analyses")]
    EmptyScope,

    #[error("Field {field} is negative ({value}) in period {year}")]
    NegativeValue {
        field: FinancialField,
        year: i32,
        value: f64,
    },

    #[error("Prior periods must be ordered oldest to newest and precede {current_year}; found {found}")]
    PeriodOrder { current_year: i32, found: String },

    #[error("Insufficient data: no analysis in scope has its required inputs (missing: {missing})")]
    InsufficientData { missing: String },
}

/// A single formula could not produce a value. Recovered per analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationError {
    #[error("Missing field: {0}")]
    MissingField(FinancialField),

    #[error("Division by zero: {0} is zero")]
    DivisionByZero(String),

    #[error("Insufficient history: need {required} prior period(s), have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Result is not a finite number: {0}")]
    NonFinite(String),

    #[error("Undefined: {0}")]
    Undefined(String),
}

/// Failures reported by a benchmark provider. Never fatal to a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Benchmark lookup timed out")]
    Timeout,

    #[error("Benchmark provider unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid benchmark response: {0}")]
    InvalidResponse(String),
}
