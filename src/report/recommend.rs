//! Rule-based recommendations.
//!
//! Rules are simple share/threshold checks on the computed breakdown. The
//! thresholds and reduction ratios live in `RecommendationPolicy` so they can be
//! tuned from configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{EmissionCategory, Priority, Recommendation, TotalEmissions};

/// Thresholds and reduction ratios used by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPolicy {
    /// Buildings share of the total (%) above which building work is high priority.
    pub buildings_share_pct: f64,
    /// Fleet emissions (tCO2e) above which electrification is high priority.
    pub fleet_emissions_t: f64,
    /// Commute share of the total (%) above which mobility actions are suggested.
    pub commute_share_pct: f64,
    pub buildings_reduction: f64,
    pub fleet_reduction: f64,
    pub commute_reduction: f64,
    pub awareness_reduction: f64,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            buildings_share_pct: 25.0,
            fleet_emissions_t: 10.0,
            commute_share_pct: 15.0,
            buildings_reduction: 0.3,
            fleet_reduction: 0.6,
            commute_reduction: 0.4,
            awareness_reduction: 0.05,
        }
    }
}

/// Build the recommendation list, highest priority first.
pub fn generate_recommendations(
    emissions: &TotalEmissions,
    policy: &RecommendationPolicy,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    for result in &emissions.by_category {
        let share = emissions.share_pct(result.emissions);
        match result.category {
            EmissionCategory::Buildings if share > policy.buildings_share_pct => {
                out.push(Recommendation {
                    priority: Priority::High,
                    category: Some(result.category),
                    title: "Improve building energy performance".to_string(),
                    description: format!(
                        "Buildings account for {share:.0}% of your emissions. Consider an energy \
                         retrofit, on-site solar panels or a green electricity contract."
                    ),
                    impact: (result.emissions * policy.buildings_reduction).round(),
                    actions: actions(&[
                        "Energy audit",
                        "Thermal insulation",
                        "LED lighting and presence sensors",
                        "Photovoltaic panels",
                    ]),
                });
            }
            EmissionCategory::Fleet if result.emissions > policy.fleet_emissions_t => {
                out.push(Recommendation {
                    priority: Priority::High,
                    category: Some(result.category),
                    title: "Electrify the vehicle fleet".to_string(),
                    description: "Moving to electric or hydrogen vehicles can cut fleet emissions \
                                  by up to 70%."
                        .to_string(),
                    impact: (result.emissions * policy.fleet_reduction).round(),
                    actions: actions(&[
                        "Fleet renewal plan",
                        "Charging stations",
                        "Eco-driving training",
                        "Route optimisation",
                    ]),
                });
            }
            EmissionCategory::Commute if share > policy.commute_share_pct => {
                out.push(Recommendation {
                    priority: Priority::Medium,
                    category: Some(result.category),
                    title: "Encourage sustainable commuting".to_string(),
                    description: "Promote alternatives to solo car use for home-work trips."
                        .to_string(),
                    impact: (result.emissions * policy.commute_reduction).round(),
                    actions: actions(&[
                        "Sustainable mobility allowance",
                        "Remote work",
                        "Car pooling",
                        "Company shuttles",
                    ]),
                });
            }
            _ => {}
        }
    }

    out.push(Recommendation {
        priority: Priority::Low,
        category: None,
        title: "Raise awareness and train teams".to_string(),
        description: "Staff awareness programmes typically save 5 to 10% of emissions.".to_string(),
        impact: (emissions.total * policy.awareness_reduction).round(),
        actions: actions(&[
            "Eco-gesture training",
            "Internal challenges",
            "Regular communication",
            "Climate ambassadors",
        ]),
    });

    // Stable: rules of equal priority keep breakdown order.
    out.sort_by_key(|r| r.priority);
    out
}

fn actions(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
