//! Saved what-if scenarios and their comparison.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Calculator;
use crate::domain::{EmissionCategory, Questionnaire, Scope, TotalEmissions};
use crate::error::AppError;
use crate::store::{KeyValueStore, SCENARIOS_KEY};

/// Emissions snapshot stored with a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEmissions {
    pub total: f64,
    pub by_category: BTreeMap<EmissionCategory, f64>,
    /// Keyed by scope number ("1", "2", "3").
    pub by_scope: BTreeMap<String, f64>,
}

impl ScenarioEmissions {
    pub fn from_totals(totals: &TotalEmissions) -> Self {
        Self {
            total: totals.total,
            by_category: totals
                .by_category
                .iter()
                .map(|r| (r.category, r.emissions))
                .collect(),
            by_scope: Scope::ALL
                .into_iter()
                .map(|s| (s.number().to_string(), totals.scope_total(s)))
                .collect(),
        }
    }

    pub fn scope(&self, scope: Scope) -> f64 {
        self.by_scope
            .get(&scope.number().to_string())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn category(&self, category: EmissionCategory) -> f64 {
        self.by_category.get(&category).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data: Questionnaire,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub emissions: ScenarioEmissions,
}

/// All saved scenarios, in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioBook {
    scenarios: Vec<Scenario>,
}

impl ScenarioBook {
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, AppError> {
        let Some(json) = store.get(SCENARIOS_KEY)? else {
            return Ok(Self::default());
        };
        let scenarios: Vec<Scenario> = serde_json::from_str(&json)
            .map_err(|e| AppError::store(format!("Saved scenarios are unreadable: {e}")))?;
        Ok(Self { scenarios })
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), AppError> {
        let json = serde_json::to_string(&self.scenarios)
            .map_err(|e| AppError::internal(format!("Failed to serialize scenarios: {e}")))?;
        store.set(SCENARIOS_KEY, &json)
    }

    /// Save `data` under `name`, replacing an existing scenario of the same name.
    ///
    /// A replaced scenario keeps its id and creation time.
    pub fn upsert(
        &mut self,
        name: &str,
        description: &str,
        data: Questionnaire,
        calculator: &mut Calculator,
        now: DateTime<Utc>,
    ) -> Result<&Scenario, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::input("Scenario name must not be empty."));
        }
        let emissions = ScenarioEmissions::from_totals(&calculator.compute(&data));

        let idx = match self.scenarios.iter().position(|s| s.name == name) {
            Some(idx) => {
                let existing = &mut self.scenarios[idx];
                existing.description = description.to_string();
                existing.data = data;
                existing.updated_at = now;
                existing.emissions = emissions;
                log::info!("updated scenario '{name}' ({})", existing.id);
                idx
            }
            None => {
                let id = self.next_id(now);
                log::info!("created scenario '{name}' ({id})");
                self.scenarios.push(Scenario {
                    id,
                    name: name.to_string(),
                    description: description.to_string(),
                    data,
                    created_at: now,
                    updated_at: now,
                    emissions,
                });
                self.scenarios.len() - 1
            }
        };
        Ok(&self.scenarios[idx])
    }

    pub fn remove(&mut self, id: &str) -> Option<Scenario> {
        let idx = self.scenarios.iter().position(|s| s.id == id)?;
        Some(self.scenarios.remove(idx))
    }

    /// Look a scenario up by id, then by name.
    pub fn find(&self, id_or_name: &str) -> Option<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.id == id_or_name)
            .or_else(|| self.scenarios.iter().find(|s| s.name == id_or_name))
    }

    /// Recompute every snapshot with the calculator's factor table.
    pub fn refresh(&mut self, calculator: &mut Calculator) {
        for s in &mut self.scenarios {
            s.emissions = ScenarioEmissions::from_totals(&calculator.compute(&s.data));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn next_id(&self, now: DateTime<Utc>) -> String {
        let stamp = now.format("%Y%m%d%H%M%S");
        (self.scenarios.len() + 1..)
            .map(|n| format!("ges_{stamp}_{n}"))
            .find(|id| self.scenarios.iter().all(|s| &s.id != id))
            .unwrap_or_else(|| format!("ges_{stamp}"))
    }
}

/// One line of a scenario comparison: a metric across scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    pub values: Vec<f64>,
}

impl ComparisonRow {
    /// Absolute change of scenario `idx` against the baseline (first column).
    pub fn delta(&self, idx: usize) -> f64 {
        match (self.values.first(), self.values.get(idx)) {
            (Some(base), Some(v)) => v - base,
            _ => 0.0,
        }
    }

    /// Relative change in percent; `None` when the baseline is zero.
    pub fn delta_pct(&self, idx: usize) -> Option<f64> {
        let base = *self.values.first()?;
        if base == 0.0 {
            return None;
        }
        Some(self.delta(idx) / base * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    /// Scenario names; the first is the baseline.
    pub names: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

/// Compare scenarios against the first one.
///
/// Rows: total, the three scopes, then every category present in any scenario.
pub fn compare_scenarios(scenarios: &[&Scenario]) -> ScenarioComparison {
    let names = scenarios.iter().map(|s| s.name.clone()).collect();
    let mut rows = vec![ComparisonRow {
        label: "Total".to_string(),
        values: scenarios.iter().map(|s| s.emissions.total).collect(),
    }];

    for scope in Scope::ALL {
        rows.push(ComparisonRow {
            label: scope.to_string(),
            values: scenarios.iter().map(|s| s.emissions.scope(scope)).collect(),
        });
    }

    for category in EmissionCategory::ALL {
        if scenarios
            .iter()
            .any(|s| s.emissions.by_category.contains_key(&category))
        {
            rows.push(ComparisonRow {
                label: category.display_name().to_string(),
                values: scenarios.iter().map(|s| s.emissions.category(category)).collect(),
            });
        }
    }

    ScenarioComparison { names, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::EmissionFactorTable;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn q(json: &str) -> Questionnaire {
        Questionnaire::from_json_str(json).unwrap()
    }

    fn calculator() -> Calculator {
        Calculator::new(EmissionFactorTable::standard().clone(), 16)
    }

    #[test]
    fn upsert_by_name_keeps_identity() {
        let mut book = ScenarioBook::default();
        let mut calc = calculator();

        let first = book
            .upsert("Baseline", "", q(r#"{"flotte-propre": {"diesel": 1000}}"#), &mut calc, at(10))
            .unwrap()
            .clone();
        assert!((first.emissions.total - 2.51).abs() < 1e-9);
        assert_eq!(first.emissions.scope(Scope::Direct), first.emissions.total);

        let updated = book
            .upsert("Baseline", "less diesel", q(r#"{"flotte-propre": {"diesel": 500}}"#), &mut calc, at(20))
            .unwrap()
            .clone();
        assert_eq!(book.len(), 1);
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.created_at, at(10));
        assert_eq!(updated.updated_at, at(20));
        assert_eq!(updated.description, "less diesel");
        assert!((updated.emissions.total - 1.255).abs() < 1e-9);
    }

    #[test]
    fn ids_are_unique_within_one_second() {
        let mut book = ScenarioBook::default();
        let mut calc = calculator();
        let a = book.upsert("A", "", Questionnaire::new(), &mut calc, at(5)).unwrap().id.clone();
        let b = book.upsert("B", "", Questionnaire::new(), &mut calc, at(5)).unwrap().id.clone();
        assert_ne!(a, b);
        assert!(a.starts_with("ges_"));

        assert!(book.remove(&a).is_some());
        assert!(book.remove(&a).is_none());
        let c = book.upsert("C", "", Questionnaire::new(), &mut calc, at(5)).unwrap().id.clone();
        assert_ne!(c, b);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut book = ScenarioBook::default();
        let err = book
            .upsert("  ", "", Questionnaire::new(), &mut calculator(), at(0))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn persists_through_store() {
        let mut store = MemoryStore::new();
        let mut book = ScenarioBook::load(&store).unwrap();
        assert!(book.is_empty());
        book.upsert("Plan", "", q(r#"{"dechets": {"recyclable": 2}}"#), &mut calculator(), at(0))
            .unwrap();
        book.save(&mut store).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&store.get(SCENARIOS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw[0]["name"], "Plan");
        assert!(raw[0]["emissions"]["byCategory"]["dechets"].is_number());
        assert!(raw[0]["emissions"]["byScope"]["3"].is_number());

        let reloaded = ScenarioBook::load(&store).unwrap();
        assert_eq!(reloaded, book);
        assert!(reloaded.find("Plan").is_some());
    }

    #[test]
    fn corrupt_store_is_a_store_error() {
        let mut store = MemoryStore::new();
        store.set(SCENARIOS_KEY, "[{").unwrap();
        assert_eq!(ScenarioBook::load(&store).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn comparison_uses_first_as_baseline() {
        let mut book = ScenarioBook::default();
        let mut calc = calculator();
        book.upsert("Now", "", q(r#"{"flotte-propre": {"diesel": 1000}}"#), &mut calc, at(0))
            .unwrap();
        book.upsert(
            "Target",
            "",
            q(r#"{"flotte-propre": {"diesel": 500}, "dechets": {"hazardous": 1}}"#),
            &mut calc,
            at(1),
        )
        .unwrap();

        let all: Vec<&Scenario> = book.iter().collect();
        let cmp = compare_scenarios(&all);
        assert_eq!(cmp.names, vec!["Now", "Target"]);

        let labels: Vec<&str> = cmp.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Total", "Scope 1", "Scope 2", "Scope 3", "Own fleet", "Waste"]
        );

        let fleet = &cmp.rows[4];
        assert!((fleet.delta(1) + 1.255).abs() < 1e-9);
        assert!((fleet.delta_pct(1).unwrap() + 50.0).abs() < 1e-9);

        let waste = &cmp.rows[5];
        assert_eq!(waste.values[0], 0.0);
        assert_eq!(waste.delta_pct(1), None);
    }
}
