use std::collections::BTreeSet;

use formula_library::{AnalysisDefinition, Catalog, FormulaInput};
use statement_core::{AnalysisRequest, ComputationError, ValidationError};

/// A definition selected for the run together with its catalog position.
pub type ScopedDefinition = (usize, &'static AnalysisDefinition);

/// Check a request and resolve its scope. Fails fast on the first problem.
pub fn validate_request(
    request: &AnalysisRequest,
    catalog: &'static Catalog,
) -> Result<Vec<ScopedDefinition>, ValidationError> {
    if let Some(unknown) = request.categories.iter().find(|c| !catalog.has_category(c)) {
        return Err(ValidationError::UnknownCategory(unknown.clone()));
    }
    if let Some(unknown) = request.analyses.iter().find(|id| catalog.get(id).is_none()) {
        return Err(ValidationError::UnknownAnalysis(unknown.clone()));
    }

    let scope = catalog.select(&request.tiers, &request.categories, &request.analyses);
    if scope.is_empty() {
        return Err(ValidationError::EmptyScope);
    }

    check_signs(request)?;
    check_period_order(request)?;
    check_minimum_inputs(request, &scope)?;

    Ok(scope)
}

fn check_signs(request: &AnalysisRequest) -> Result<(), ValidationError> {
    let periods = std::iter::once(&request.current)
        .chain(request.prior.iter())
        .chain(request.peers.iter());
    for period in periods {
        if let Some((field, value)) = period.negative_fields().into_iter().next() {
            return Err(ValidationError::NegativeValue {
                field,
                year: period.year,
                value,
            });
        }
    }
    Ok(())
}

fn check_period_order(request: &AnalysisRequest) -> Result<(), ValidationError> {
    let years: Vec<i32> = request.prior.iter().map(|p| p.year).collect();
    let ascending = years.windows(2).all(|w| w[0] < w[1]);
    let before_current = years.last().map_or(true, |last| *last < request.current.year);
    if ascending && before_current {
        return Ok(());
    }

    Err(ValidationError::PeriodOrder {
        current_year: request.current.year,
        found: years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// At least one definition in scope must have its inputs. Formulas that can
/// estimate around gaps declare few required fields, so the formula itself
/// is asked as well.
fn check_minimum_inputs(request: &AnalysisRequest, scope: &[ScopedDefinition]) -> Result<(), ValidationError> {
    let input = formula_input(request);
    let mut missing: BTreeSet<&'static str> = BTreeSet::new();

    for (_, def) in scope {
        let declared = def.missing_fields(&input);
        if !declared.is_empty() {
            missing.extend(declared.iter().map(|f| f.name()));
            continue;
        }
        if input.prior.len() < def.min_history {
            continue;
        }
        match def.evaluate(&input) {
            Err(ComputationError::MissingField(field)) => {
                missing.insert(field.name());
            }
            Err(ComputationError::InsufficientHistory { .. }) => {}
            _ => return Ok(()),
        }
    }

    let missing = if missing.is_empty() {
        "prior periods".to_string()
    } else {
        missing.into_iter().collect::<Vec<_>>().join(", ")
    };
    Err(ValidationError::InsufficientData { missing })
}

/// The periods a formula sees, borrowed from the request.
pub fn formula_input(request: &AnalysisRequest) -> FormulaInput<'_> {
    FormulaInput::new(&request.current, &request.prior, &request.peers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_library::catalog;
    use statement_core::{FinancialField::*, FinancialPeriod, Tier};

    fn liquid(year: i32) -> FinancialPeriod {
        FinancialPeriod::new(year)
            .with(CurrentAssets, 500_000.0)
            .with(CurrentLiabilities, 250_000.0)
    }

    #[test]
    fn test_scope_resolution() {
        let request = AnalysisRequest::new(liquid(2024)).with_tiers([Tier::Ratio]);
        let scope = validate_request(&request, catalog()).unwrap();
        assert!(scope.iter().all(|(_, d)| d.tier == Tier::Ratio));
        assert!(scope.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_unknown_names() {
        let request = AnalysisRequest::new(liquid(2024)).with_categories(["astrology"]);
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::UnknownCategory(c)) if c == "astrology"
        ));

        let request = AnalysisRequest::new(liquid(2024)).with_analyses(["magic_ratio"]);
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::UnknownAnalysis(id)) if id == "magic_ratio"
        ));
    }

    #[test]
    fn test_disjoint_filters_are_empty_scope() {
        let request = AnalysisRequest::new(liquid(2024))
            .with_tiers([Tier::Structural])
            .with_categories(["liquidity"]);
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::EmptyScope)
        ));
    }

    #[test]
    fn test_negative_inventory_rejected() {
        let request = AnalysisRequest::new(liquid(2024).with(Inventory, -1.0));
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::NegativeValue { field: Inventory, year: 2024, .. })
        ));

        // Losses are legitimate
        let request = AnalysisRequest::new(liquid(2024).with(NetIncome, -10.0));
        assert!(validate_request(&request, catalog()).is_ok());
    }

    #[test]
    fn test_period_order() {
        let request = AnalysisRequest::new(liquid(2024)).with_prior(vec![liquid(2023), liquid(2022)]);
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::PeriodOrder { current_year: 2024, .. })
        ));

        let request = AnalysisRequest::new(liquid(2024)).with_prior(vec![liquid(2024)]);
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::PeriodOrder { .. })
        ));
    }

    #[test]
    fn test_insufficient_data() {
        let request = AnalysisRequest::new(FinancialPeriod::new(2024)).with_analyses(["current_ratio"]);
        match validate_request(&request, catalog()) {
            Err(ValidationError::InsufficientData { missing }) => {
                assert!(missing.contains("current_liabilities"));
            }
            other => panic!("expected insufficient data, got {:?}", other),
        }

        let request = AnalysisRequest::new(liquid(2024)).with_analyses(["revenue_cagr"]);
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::InsufficientData { .. })
        ));

        // No declared requirements, but nothing to estimate market value from
        let request = AnalysisRequest::new(liquid(2024)).with_analyses(["free_cash_flow_yield"]);
        assert!(matches!(
            validate_request(&request, catalog()),
            Err(ValidationError::InsufficientData { .. })
        ));
    }
}
