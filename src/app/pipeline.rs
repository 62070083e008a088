//! Shared "assessment pipeline" logic used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! questionnaire input -> aggregation -> recommendations
//!
//! The command handlers can then focus on presentation and persistence.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::calc::calculate_total_emissions_with;
use crate::domain::{Questionnaire, Recommendation, TotalEmissions};
use crate::error::AppError;
use crate::factors::EmissionFactorTable;
use crate::io::{entity_name, load_entity, load_questionnaire};
use crate::report::{EntitySummary, RecommendationPolicy, generate_recommendations};

/// All computed outputs of a single assessment.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub source: String,
    pub questionnaire: Questionnaire,
    pub totals: TotalEmissions,
    pub recommendations: Vec<Recommendation>,
}

/// Load a questionnaire and run the full assessment on it.
pub fn run_assessment(
    input: &Path,
    table: &EmissionFactorTable,
    policy: &RecommendationPolicy,
) -> Result<RunOutput, AppError> {
    let questionnaire = load_questionnaire(input)?;
    Ok(assess(entity_name(input), questionnaire, table, policy))
}

/// Run the assessment on an in-memory questionnaire.
pub fn assess(
    source: String,
    questionnaire: Questionnaire,
    table: &EmissionFactorTable,
    policy: &RecommendationPolicy,
) -> RunOutput {
    let totals = calculate_total_emissions_with(&questionnaire, table);
    log::info!(
        "{source}: {} categories, {:.3} tCO2e",
        totals.by_category.len(),
        totals.total
    );
    let recommendations = generate_recommendations(&totals, policy);
    RunOutput {
        source,
        questionnaire,
        totals,
        recommendations,
    }
}

/// Compute every input in parallel. Output order matches input order.
pub fn compare_entities(
    inputs: &[PathBuf],
    table: &EmissionFactorTable,
) -> Result<Vec<EntitySummary>, AppError> {
    inputs
        .par_iter()
        .map(|path| -> Result<EntitySummary, AppError> {
            let (questionnaire, profile) = load_entity(path)?;
            Ok(EntitySummary {
                name: entity_name(path),
                totals: calculate_total_emissions_with(&questionnaire, table),
                profile,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::temp_dir;
    use std::fs;

    #[test]
    fn compare_entities_keeps_input_order() {
        let dir = temp_dir("compare-entities");
        fs::create_dir_all(&dir).unwrap();
        let small = dir.join("small.json");
        let large = dir.join("large.json");
        fs::write(&small, r#"{"dechets": {"hazardous": 1}}"#).unwrap();
        fs::write(
            &large,
            r#"{"entity": {"surface": 500}, "flotte-propre": {"diesel": 10000}, "deplacements-domicile": {"employees": 4}}"#,
        )
        .unwrap();

        let out = compare_entities(&[small, large], EmissionFactorTable::standard()).unwrap();
        let names: Vec<&str> = out.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["small", "large"]);
        assert!((out[0].totals.total - 0.75).abs() < 1e-9);
        assert_eq!(out[1].profile.surface, Some(500.0));
        assert_eq!(out[1].profile.employees, Some(4.0));
        assert_eq!(out[0].intensity(), None);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn compare_entities_fails_on_missing_file() {
        let err = compare_entities(
            &[PathBuf::from("/nonexistent/ges/a.json")],
            EmissionFactorTable::standard(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn assess_attaches_recommendations() {
        let q = Questionnaire::from_json_str(r#"{"flotte-propre": {"diesel": 10000}}"#).unwrap();
        let run = assess(
            "fleet".to_string(),
            q,
            EmissionFactorTable::standard(),
            &RecommendationPolicy::default(),
        );
        assert_eq!(run.recommendations.len(), 2);
        assert_eq!(run.source, "fleet");
    }
}
