//! Fold category results into per-scope and grand totals.

use crate::calc::category::calculate_category;
use crate::domain::{CategoryData, Questionnaire, Scope, TotalEmissions};
use crate::factors::EmissionFactorTable;

/// Aggregate a questionnaire with the standard factor table.
pub fn calculate_total_emissions(questionnaire: &Questionnaire) -> TotalEmissions {
    calculate_total_emissions_with(questionnaire, EmissionFactorTable::standard())
}

/// Aggregate a questionnaire with an explicit factor table.
///
/// Empty categories and categories computing to zero are left out of
/// `by_category`; the rest keep input order.
pub fn calculate_total_emissions_with(
    questionnaire: &Questionnaire,
    table: &EmissionFactorTable,
) -> TotalEmissions {
    let mut out = TotalEmissions::default();

    for data in questionnaire.iter() {
        let category = data.category();
        if data.is_empty() {
            log::debug!("{category}: no data, skipped");
            continue;
        }

        let result = calculate_category(data, table);
        if !(result.emissions.is_finite() && result.emissions > 0.0) {
            log::debug!("{category}: zero emissions, left out of breakdown");
            continue;
        }

        match result.scope {
            Scope::Direct => out.scope1 += result.emissions,
            Scope::PurchasedEnergy => out.scope2 += result.emissions,
            Scope::ValueChain => out.scope3 += result.emissions,
        }
        out.by_category.push(result);
    }

    out.total = out.scope1 + out.scope2 + out.scope3;
    out
}

/// Emissions of a single category record, or 0 when it would be left out.
pub fn category_total(data: &CategoryData, table: &EmissionFactorTable) -> f64 {
    let r = calculate_category(data, table);
    if r.emissions.is_finite() && r.emissions > 0.0 {
        r.emissions
    } else {
        0.0
    }
}
