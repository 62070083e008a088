//! Emission factor table.
//!
//! Coefficients are kg CO2e per declared unit (kWh, liter, kg, km, t·km, meal,
//! unit, tonne, euro). The standard table is built once and never mutated; an
//! override document can be merged over it to produce a new table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Broad resource group a factor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FactorGroup {
    Energy,
    Fuels,
    Vehicles,
    Travel,
    Food,
    Purchases,
    Waste,
    Services,
}

impl FactorGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            FactorGroup::Energy => "energy",
            FactorGroup::Fuels => "fuels",
            FactorGroup::Vehicles => "vehicles",
            FactorGroup::Travel => "travel",
            FactorGroup::Food => "food",
            FactorGroup::Purchases => "purchases",
            FactorGroup::Waste => "waste",
            FactorGroup::Services => "services",
        }
    }
}

/// (group, name, kg CO2e per unit, unit)
const STANDARD_FACTORS: &[(FactorGroup, &str, f64, &str)] = &[
    (FactorGroup::Energy, "electricity_france", 0.0571, "kWh"),
    (FactorGroup::Energy, "electricity_renewable", 0.011, "kWh"),
    (FactorGroup::Energy, "natural_gas", 0.227, "kWh"),
    (FactorGroup::Energy, "fuel_oil", 3.25, "L"),
    (FactorGroup::Energy, "district_heating", 0.109, "kWh"),
    (FactorGroup::Energy, "wood_pellets", 0.030, "kWh"),
    (FactorGroup::Energy, "wood_logs", 460.0, "t"),
    (FactorGroup::Fuels, "gasoline_e10", 2.28, "L"),
    (FactorGroup::Fuels, "gasoline_e85", 1.11, "L"),
    (FactorGroup::Fuels, "diesel_b7", 2.51, "L"),
    (FactorGroup::Fuels, "diesel_b30", 2.04, "L"),
    (FactorGroup::Fuels, "lpg", 1.86, "L"),
    (FactorGroup::Fuels, "cng", 2.16, "kg"),
    // Green hydrogen.
    (FactorGroup::Fuels, "hydrogen", 0.0, "kg"),
    (FactorGroup::Fuels, "electricity_vehicle", 0.0571, "kWh"),
    (FactorGroup::Vehicles, "bike", 0.0, "km"),
    (FactorGroup::Vehicles, "ebike", 0.002, "km"),
    (FactorGroup::Vehicles, "scooter_electric", 0.015, "km"),
    (FactorGroup::Vehicles, "car_small_gasoline", 0.104, "km"),
    (FactorGroup::Vehicles, "car_small_diesel", 0.098, "km"),
    (FactorGroup::Vehicles, "car_small_electric", 0.020, "km"),
    (FactorGroup::Vehicles, "car_medium_gasoline", 0.139, "km"),
    (FactorGroup::Vehicles, "car_medium_diesel", 0.131, "km"),
    (FactorGroup::Vehicles, "car_medium_electric", 0.025, "km"),
    (FactorGroup::Vehicles, "van_diesel", 0.198, "km"),
    (FactorGroup::Vehicles, "van_electric", 0.040, "km"),
    (FactorGroup::Vehicles, "truck_small", 0.663, "km"),
    (FactorGroup::Vehicles, "truck_medium", 0.868, "km"),
    (FactorGroup::Vehicles, "truck_large", 1.082, "km"),
    // Mixed-fleet average, used when only distance is known.
    (FactorGroup::Vehicles, "fleet_average", 0.15, "km"),
    (FactorGroup::Vehicles, "road_freight", 0.1, "t.km"),
    (FactorGroup::Travel, "train_ter", 0.0314, "p.km"),
    (FactorGroup::Travel, "train_intercites", 0.0115, "p.km"),
    (FactorGroup::Travel, "train_tgv", 0.0032, "p.km"),
    (FactorGroup::Travel, "metro", 0.0031, "p.km"),
    (FactorGroup::Travel, "tramway", 0.0033, "p.km"),
    (FactorGroup::Travel, "bus_city", 0.103, "p.km"),
    (FactorGroup::Travel, "bus_coach", 0.0288, "p.km"),
    (FactorGroup::Travel, "plane_domestic", 0.258, "p.km"),
    (FactorGroup::Travel, "plane_medium", 0.187, "p.km"),
    (FactorGroup::Travel, "plane_long", 0.152, "p.km"),
    (FactorGroup::Travel, "ferry", 0.267, "p.km"),
    (FactorGroup::Food, "meal_meat", 4.08, "meal"),
    (FactorGroup::Food, "meal_poultry", 1.58, "meal"),
    (FactorGroup::Food, "meal_fish", 1.42, "meal"),
    (FactorGroup::Food, "meal_vegetarian", 0.51, "meal"),
    (FactorGroup::Food, "meal_vegan", 0.39, "meal"),
    (FactorGroup::Food, "coffee", 0.005, "cup"),
    (FactorGroup::Food, "tea", 0.002, "cup"),
    (FactorGroup::Food, "water_bottle", 0.193, "L"),
    (FactorGroup::Purchases, "paper_virgin", 1.84, "kg"),
    (FactorGroup::Purchases, "paper_recycled", 0.919, "kg"),
    (FactorGroup::Purchases, "cardboard", 0.688, "kg"),
    (FactorGroup::Purchases, "plastic_pet", 2.15, "kg"),
    (FactorGroup::Purchases, "plastic_pp", 1.95, "kg"),
    (FactorGroup::Purchases, "laptop", 415.0, "unit"),
    (FactorGroup::Purchases, "desktop_computer", 520.0, "unit"),
    (FactorGroup::Purchases, "monitor", 245.0, "unit"),
    (FactorGroup::Purchases, "smartphone", 85.0, "unit"),
    (FactorGroup::Purchases, "printer", 155.0, "unit"),
    (FactorGroup::Purchases, "furniture_desk", 47.0, "unit"),
    (FactorGroup::Purchases, "furniture_chair", 22.0, "unit"),
    (FactorGroup::Purchases, "office_supplies", 0.1, "EUR"),
    (FactorGroup::Waste, "mixed_waste", 467.0, "t"),
    (FactorGroup::Waste, "organic_composting", 82.0, "t"),
    (FactorGroup::Waste, "paper_recycling", 21.0, "t"),
    (FactorGroup::Waste, "cardboard_recycling", 21.0, "t"),
    (FactorGroup::Waste, "plastic_recycling", 1100.0, "t"),
    (FactorGroup::Waste, "glass_recycling", 21.0, "t"),
    (FactorGroup::Waste, "metal_recycling", 21.0, "t"),
    (FactorGroup::Waste, "hazardous_treatment", 750.0, "t"),
    (FactorGroup::Waste, "electronic_recycling", 21.0, "t"),
    (FactorGroup::Services, "it_services", 0.080, "EUR"),
    (FactorGroup::Services, "consulting", 0.050, "EUR"),
    (FactorGroup::Services, "cleaning", 0.095, "EUR"),
    (FactorGroup::Services, "maintenance", 0.120, "EUR"),
    (FactorGroup::Services, "logistics", 0.150, "EUR"),
];

static STANDARD: LazyLock<EmissionFactorTable> = LazyLock::new(|| {
    EmissionFactorTable::from_entries(
        STANDARD_FACTORS
            .iter()
            .map(|&(group, name, value, _)| (group, name, value)),
    )
});

/// Read-only `group → name → kg CO2e per unit` lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionFactorTable {
    groups: BTreeMap<FactorGroup, BTreeMap<String, f64>>,
}

impl EmissionFactorTable {
    /// The built-in table.
    pub fn standard() -> &'static EmissionFactorTable {
        &STANDARD
    }

    /// Build a table from explicit entries (no standard values).
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (FactorGroup, &'a str, f64)>) -> Self {
        let mut groups: BTreeMap<FactorGroup, BTreeMap<String, f64>> = BTreeMap::new();
        for (group, name, value) in entries {
            groups.entry(group).or_default().insert(name.to_string(), value);
        }
        Self { groups }
    }

    /// Coefficient for `group.name`, if the table has one.
    pub fn get(&self, group: FactorGroup, name: &str) -> Option<f64> {
        self.groups.get(&group).and_then(|g| g.get(name)).copied()
    }

    /// Declared unit of a built-in factor.
    pub fn unit(group: FactorGroup, name: &str) -> Option<&'static str> {
        STANDARD_FACTORS
            .iter()
            .find(|(g, n, _, _)| *g == group && *n == name)
            .map(|&(_, _, _, unit)| unit)
    }

    /// All entries, ordered by group then name.
    pub fn entries(&self) -> impl Iterator<Item = (FactorGroup, &str, f64)> {
        self.groups
            .iter()
            .flat_map(|(&group, names)| names.iter().map(move |(name, &v)| (group, name.as_str(), v)))
    }

    /// Merge a `{ group: { name: value } }` JSON document over this table.
    ///
    /// Every coefficient must be finite and non-negative.
    pub fn merged_with_json(&self, json: &str) -> Result<EmissionFactorTable, AppError> {
        let overrides: BTreeMap<FactorGroup, BTreeMap<String, f64>> = serde_json::from_str(json)
            .map_err(|e| AppError::input(format!("Invalid emission factor JSON: {e}")))?;

        let mut merged = self.clone();
        for (group, names) in overrides {
            for (name, value) in names {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(AppError::input(format!(
                        "Invalid emission factor {}.{name}={value} (must be finite and >= 0).",
                        group.as_str()
                    )));
                }
                log::debug!("factor override {}.{name} = {value}", group.as_str());
                merged.groups.entry(group).or_default().insert(name, value);
            }
        }
        Ok(merged)
    }

    /// Load an override file and merge it over the standard table.
    pub fn load_json(path: &Path) -> Result<EmissionFactorTable, AppError> {
        let json = fs::read_to_string(path).map_err(|e| {
            AppError::input(format!("Failed to read emission factors '{}': {e}", path.display()))
        })?;
        Self::standard().merged_with_json(&json)
    }
}
