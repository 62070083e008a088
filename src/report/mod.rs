//! Reporting utilities: recommendations, entity rankings, and formatted terminal output.

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{EntityProfile, TotalEmissions};

pub mod format;
pub mod recommend;

pub use format::*;
pub use recommend::*;

/// Computed emissions of one named entity (site, department, file).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub name: String,
    pub totals: TotalEmissions,
    pub profile: EntityProfile,
}

impl EntitySummary {
    /// tCO2e per employee.
    pub fn intensity(&self) -> Option<f64> {
        per_unit(self.totals.total, self.profile.employees)
    }

    /// tCO2e per m² of floor area.
    pub fn efficiency(&self) -> Option<f64> {
        per_unit(self.totals.total, self.profile.surface)
    }
}

fn per_unit(total: f64, amount: Option<f64>) -> Option<f64> {
    amount.filter(|a| *a > 0.0).map(|a| total / a)
}

/// Ranking order for an entity comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankBy {
    /// Highest total first.
    #[default]
    Total,
    /// Highest tCO2e per employee first.
    Intensity,
    /// Lowest tCO2e per m² first.
    Efficiency,
}

/// Position of an entity's total relative to the group average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Benchmark {
    /// Below 80% of the average.
    Excellent,
    /// Below the average.
    Good,
    /// Below 120% of the average.
    Average,
    Poor,
}

impl Benchmark {
    pub fn classify(value: f64, average: f64) -> Self {
        if average <= 0.0 {
            Benchmark::Average
        } else if value < average * 0.8 {
            Benchmark::Excellent
        } else if value < average {
            Benchmark::Good
        } else if value < average * 1.2 {
            Benchmark::Average
        } else {
            Benchmark::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Benchmark::Excellent => "excellent",
            Benchmark::Good => "good",
            Benchmark::Average => "average",
            Benchmark::Poor => "poor",
        }
    }
}

/// One line of an entity ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRank {
    pub rank: usize,
    pub name: String,
    pub total: f64,
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
    /// tCO2e per employee.
    pub intensity: Option<f64>,
    /// tCO2e per m².
    pub efficiency: Option<f64>,
    /// Total as a share of the largest entity's total (%).
    pub share_of_max_pct: f64,
    pub benchmark: Benchmark,
}

/// Group means. Intensity and efficiency average the entities that have them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityAverages {
    pub total: f64,
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
    pub intensity: Option<f64>,
    pub efficiency: Option<f64>,
}

impl EntityAverages {
    pub fn of(entities: &[EntitySummary]) -> Self {
        let totals = || entities.iter().map(|e| &e.totals);
        Self {
            total: mean(totals().map(|t| t.total)).unwrap_or(0.0),
            scope1: mean(totals().map(|t| t.scope1)).unwrap_or(0.0),
            scope2: mean(totals().map(|t| t.scope2)).unwrap_or(0.0),
            scope3: mean(totals().map(|t| t.scope3)).unwrap_or(0.0),
            intensity: mean(entities.iter().filter_map(EntitySummary::intensity)),
            efficiency: mean(entities.iter().filter_map(EntitySummary::efficiency)),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Ranked entities plus the group averages they are benchmarked against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRanking {
    pub rank_by: RankBy,
    pub rows: Vec<EntityRank>,
    pub average: EntityAverages,
}

impl EntityRanking {
    /// Entity with the lowest tCO2e per employee.
    pub fn lowest_intensity(&self) -> Option<&EntityRank> {
        self.rows
            .iter()
            .filter(|r| r.intensity.is_some())
            .min_by(|a, b| a.intensity.unwrap_or(0.0).total_cmp(&b.intensity.unwrap_or(0.0)))
    }
}

/// Rank entities by `rank_by`. Entities lacking the ratio go last; ties keep
/// input order.
pub fn rank_entities(entities: &[EntitySummary], rank_by: RankBy) -> EntityRanking {
    let mut sorted: Vec<&EntitySummary> = entities.iter().collect();
    match rank_by {
        RankBy::Total => sorted.sort_by(|a, b| b.totals.total.total_cmp(&a.totals.total)),
        RankBy::Intensity => sorted.sort_by(|a, b| {
            let (a, b) = (a.intensity(), b.intensity());
            b.is_some().cmp(&a.is_some()).then_with(|| {
                b.unwrap_or(0.0).total_cmp(&a.unwrap_or(0.0))
            })
        }),
        RankBy::Efficiency => sorted.sort_by(|a, b| {
            let (a, b) = (a.efficiency(), b.efficiency());
            b.is_some().cmp(&a.is_some()).then_with(|| {
                a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0))
            })
        }),
    }

    let average = EntityAverages::of(entities);
    let max = entities.iter().map(|e| e.totals.total).fold(0.0, f64::max);
    let rows = sorted
        .into_iter()
        .enumerate()
        .map(|(i, e)| EntityRank {
            rank: i + 1,
            name: e.name.clone(),
            total: e.totals.total,
            scope1: e.totals.scope1,
            scope2: e.totals.scope2,
            scope3: e.totals.scope3,
            intensity: e.intensity(),
            efficiency: e.efficiency(),
            share_of_max_pct: if max > 0.0 {
                e.totals.total / max * 100.0
            } else {
                0.0
            },
            benchmark: Benchmark::classify(e.totals.total, average.total),
        })
        .collect();

    EntityRanking {
        rank_by,
        rows,
        average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, total: f64) -> EntitySummary {
        sized(name, total, None, None)
    }

    fn sized(name: &str, total: f64, employees: Option<f64>, surface: Option<f64>) -> EntitySummary {
        EntitySummary {
            name: name.to_string(),
            totals: TotalEmissions {
                total,
                scope3: total,
                ..Default::default()
            },
            profile: EntityProfile { employees, surface },
        }
    }

    fn names(ranking: &EntityRanking) -> Vec<&str> {
        ranking.rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn rank_entities_basic() {
        let entities = [entity("a", 5.0), entity("b", 20.0), entity("c", 5.0)];
        let ranking = rank_entities(&entities, RankBy::Total);
        assert_eq!(names(&ranking), vec!["b", "a", "c"]);
        assert_eq!(ranking.rows[0].rank, 1);
        assert_eq!(ranking.rows[0].share_of_max_pct, 100.0);
        assert_eq!(ranking.rows[1].share_of_max_pct, 25.0);
        assert_eq!(ranking.rows[2].rank, 3);
        assert_eq!(ranking.average.total, 10.0);
    }

    #[test]
    fn rank_entities_all_zero() {
        let ranking = rank_entities(&[entity("a", 0.0), entity("b", 0.0)], RankBy::Total);
        assert!(ranking.rows.iter().all(|r| r.share_of_max_pct == 0.0));
        assert!(ranking.rows.iter().all(|r| r.benchmark == Benchmark::Average));
        assert!(rank_entities(&[], RankBy::Total).rows.is_empty());
    }

    #[test]
    fn intensity_ranks_per_employee_and_puts_unknown_headcount_last() {
        let entities = [
            sized("hq", 100.0, Some(200.0), None),
            sized("depot", 60.0, Some(20.0), None),
            sized("kiosk", 5.0, None, None),
            sized("lab", 30.0, Some(0.0), None),
        ];
        let ranking = rank_entities(&entities, RankBy::Intensity);
        assert_eq!(names(&ranking), vec!["depot", "hq", "kiosk", "lab"]);
        assert_eq!(ranking.rows[0].intensity, Some(3.0));
        assert_eq!(ranking.rows[1].intensity, Some(0.5));
        assert_eq!(ranking.rows[3].intensity, None);
        assert_eq!(ranking.average.intensity, Some(1.75));
        assert_eq!(ranking.lowest_intensity().map(|r| r.name.as_str()), Some("hq"));
    }

    #[test]
    fn efficiency_ranks_lowest_per_square_metre_first() {
        let entities = [
            sized("office", 50.0, None, Some(1000.0)),
            sized("warehouse", 80.0, None, Some(8000.0)),
            sized("shop", 10.0, None, None),
        ];
        let ranking = rank_entities(&entities, RankBy::Efficiency);
        assert_eq!(names(&ranking), vec!["warehouse", "office", "shop"]);
        assert_eq!(ranking.rows[0].efficiency, Some(0.01));
        assert!((ranking.average.efficiency.unwrap() - 0.03).abs() < 1e-12);
        assert_eq!(ranking.average.intensity, None);
    }

    #[test]
    fn benchmark_compares_totals_with_the_group_mean() {
        // Mean total is 100.
        let entities = [
            entity("a", 70.0),
            entity("b", 90.0),
            entity("c", 110.0),
            entity("d", 130.0),
        ];
        let ranking = rank_entities(&entities, RankBy::Total);
        let marks: Vec<Benchmark> = ranking.rows.iter().map(|r| r.benchmark).collect();
        assert_eq!(
            marks,
            vec![Benchmark::Poor, Benchmark::Average, Benchmark::Good, Benchmark::Excellent]
        );
        assert_eq!(Benchmark::classify(80.0, 100.0), Benchmark::Good);
        assert_eq!(Benchmark::classify(100.0, 100.0), Benchmark::Average);
        assert_eq!(Benchmark::classify(120.0, 100.0), Benchmark::Poor);
    }
}
