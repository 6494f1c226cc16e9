pub mod advanced;
pub mod cash_flow;
pub mod catalog;
pub mod definition;
pub mod formula;
pub mod ratio;
pub mod structural;

pub use catalog::{catalog, Catalog};
pub use definition::{AnalysisDefinition, DefinitionSummary, Unit};
pub use formula::{Computation, FormulaFn, FormulaInput, FormulaResult};
