//! Per-category emission handlers.
//!
//! Every handler multiplies declared quantities by kg CO2e factors into a
//! `Ledger`; the ledger converts kilograms to tonnes once, when the result is
//! built. Absent quantities and missing factors contribute nothing.

use std::collections::BTreeMap;

use crate::domain::{
    AttendanceData, BuildingsData, BusinessTravelData, CategoryData, CommuteData,
    EmissionCategory, EmissionResult, FleetData, FoodData, PurchasesData,
    SubcontractedTransportData, WasteData,
};
use crate::factors::{EmissionFactorTable, FactorGroup};

pub const KG_PER_TONNE: f64 = 1000.0;

/// Home-work round trip.
const COMMUTE_TRIPS_PER_DAY: f64 = 2.0;
const WORKING_DAYS_PER_YEAR: f64 = 220.0;

/// Compute the emissions of one category record.
pub fn calculate_category(data: &CategoryData, table: &EmissionFactorTable) -> EmissionResult {
    let mut ledger = Ledger::new(table);
    match data {
        CategoryData::Buildings(d) => buildings(d, &mut ledger),
        CategoryData::Fleet(d) => fleet(d, &mut ledger),
        CategoryData::SubcontractedTransport(d) => subcontracted_transport(d, &mut ledger),
        CategoryData::Commute(d) => commute(d, &mut ledger),
        CategoryData::BusinessTravel(d) => business_travel(d, &mut ledger),
        CategoryData::Attendance(d) => attendance(d, &mut ledger),
        CategoryData::Food(d) => food(d, &mut ledger),
        CategoryData::Purchases(d) => purchases(d, &mut ledger),
        CategoryData::Waste(d) => waste(d, &mut ledger),
    }
    ledger.finish(data.category())
}

/// Renewable share of the electricity supply in `[0, 1]`.
///
/// An explicit "no renewable contract" wins; otherwise the declared percentage
/// applies, and a contract without a percentage counts as fully renewable.
pub fn renewable_ratio(d: &BuildingsData) -> f64 {
    match (d.renewable_energy, d.renewable_percentage) {
        (Some(false), _) => 0.0,
        (_, Some(pct)) => (pct / 100.0).clamp(0.0, 1.0),
        (Some(true), None) => 1.0,
        (None, None) => 0.0,
    }
}

fn electricity_factor(d: &BuildingsData, table: &EmissionFactorTable) -> Option<f64> {
    let r = renewable_ratio(d);
    let grid = if r < 1.0 {
        table.get(FactorGroup::Energy, "electricity_france")?
    } else {
        0.0
    };
    let green = if r > 0.0 {
        table.get(FactorGroup::Energy, "electricity_renewable")?
    } else {
        0.0
    };
    Some(grid * (1.0 - r) + green * r)
}

fn buildings(d: &BuildingsData, ledger: &mut Ledger<'_>) {
    if let (Some(kwh), Some(factor)) = (d.electricity, electricity_factor(d, ledger.table)) {
        ledger.add_kg("electricity", kwh * factor);
    }
    ledger.add("gas", d.gas, FactorGroup::Energy, "natural_gas");
    ledger.add("fuel", d.fuel, FactorGroup::Energy, "fuel_oil");
    ledger.add("district_heating", d.district_heating, FactorGroup::Energy, "district_heating");
    ledger.add("wood", d.wood, FactorGroup::Energy, "wood_logs");

    for (idx, b) in d.buildings.iter().enumerate() {
        let label = b.label(idx);
        ledger.add(
            format!("{label}/natural_gas"),
            b.natural_gas_consumption,
            FactorGroup::Energy,
            "natural_gas",
        );
        ledger.add(format!("{label}/propane"), b.propane_consumption, FactorGroup::Fuels, "lpg");
    }
}

fn fleet(d: &FleetData, ledger: &mut Ledger<'_>) {
    ledger.add("gasoline", d.essence, FactorGroup::Fuels, "gasoline_e10");
    ledger.add("diesel", d.diesel, FactorGroup::Fuels, "diesel_b7");
    ledger.add("cng", d.gnv, FactorGroup::Fuels, "cng");
    ledger.add("electricity", d.elec_kwh, FactorGroup::Fuels, "electricity_vehicle");
    ledger.add("hydrogen", d.hydrogene, FactorGroup::Fuels, "hydrogen");

    if !d.has_fuel_data() {
        ledger.add("estimated", d.km_total, FactorGroup::Vehicles, "fleet_average");
    }
}

fn subcontracted_transport(d: &SubcontractedTransportData, ledger: &mut Ledger<'_>) {
    if let (Some(km), Some(tonnes)) = (d.distance, d.tonnage) {
        ledger.add("transport", Some(km * tonnes), FactorGroup::Vehicles, "road_freight");
    }
}

fn commute(d: &CommuteData, ledger: &mut Ledger<'_>) {
    if let (Some(employees), Some(km)) = (d.employees, d.avg_distance) {
        let yearly_km = employees * km * COMMUTE_TRIPS_PER_DAY * WORKING_DAYS_PER_YEAR;
        ledger.add("commute", Some(yearly_km), FactorGroup::Vehicles, "car_medium_gasoline");
    }
}

fn business_travel(d: &BusinessTravelData, ledger: &mut Ledger<'_>) {
    ledger.add("train", d.train, FactorGroup::Travel, "train_tgv");
    ledger.add("plane", d.plane, FactorGroup::Travel, "plane_domestic");
    ledger.add("car", d.car, FactorGroup::Vehicles, "car_medium_gasoline");
}

fn attendance(d: &AttendanceData, ledger: &mut Ledger<'_>) {
    if let (Some(visitors), Some(km)) = (d.visitors, d.avg_distance) {
        ledger.add("visitors", Some(visitors * km), FactorGroup::Vehicles, "car_medium_gasoline");
    }
}

fn food(d: &FoodData, ledger: &mut Ledger<'_>) {
    let Some(meals) = d.meals else {
        return;
    };
    let veg = d
        .vegetarian_percentage
        .map(|pct| (pct / 100.0).clamp(0.0, 1.0))
        .unwrap_or(0.0);
    ledger.add("meat_meals", Some(meals * (1.0 - veg)), FactorGroup::Food, "meal_meat");
    ledger.add("veg_meals", Some(meals * veg), FactorGroup::Food, "meal_vegetarian");
}

fn purchases(d: &PurchasesData, ledger: &mut Ledger<'_>) {
    // Paper is declared in tonnes, its factor is per kg.
    ledger.add(
        "paper",
        d.paper.map(|t| t * KG_PER_TONNE),
        FactorGroup::Purchases,
        "paper_virgin",
    );
    ledger.add("it", d.it_equipment, FactorGroup::Purchases, "laptop");
    ledger.add("supplies", d.supplies, FactorGroup::Purchases, "office_supplies");
}

fn waste(d: &WasteData, ledger: &mut Ledger<'_>) {
    ledger.add("recyclable", d.recyclable, FactorGroup::Waste, "paper_recycling");
    ledger.add("non_recyclable", d.non_recyclable, FactorGroup::Waste, "mixed_waste");
    ledger.add("hazardous", d.hazardous, FactorGroup::Waste, "hazardous_treatment");
}

/// kg CO2e accumulator for one category.
struct Ledger<'a> {
    table: &'a EmissionFactorTable,
    details_kg: BTreeMap<String, f64>,
}

impl<'a> Ledger<'a> {
    fn new(table: &'a EmissionFactorTable) -> Self {
        Self {
            table,
            details_kg: BTreeMap::new(),
        }
    }

    /// Add `quantity × factor` under `key`. Zero quantities are not recorded.
    fn add(&mut self, key: impl Into<String>, quantity: Option<f64>, group: FactorGroup, name: &str) {
        let Some(quantity) = quantity.filter(|q| *q != 0.0).map(saturate) else {
            return;
        };
        match self.table.get(group, name) {
            Some(factor) => self.add_kg(key, quantity * factor),
            None => log::debug!("no factor {}.{name}, skipping", group.as_str()),
        }
    }

    fn add_kg(&mut self, key: impl Into<String>, kg: f64) {
        let slot = self.details_kg.entry(key.into()).or_insert(0.0);
        *slot = saturate(*slot + saturate(kg));
    }

    fn finish(self, category: EmissionCategory) -> EmissionResult {
        let total_kg = self
            .details_kg
            .values()
            .fold(0.0, |acc, kg| saturate(acc + kg));
        let details = self
            .details_kg
            .into_iter()
            .map(|(key, kg)| (key, kg / KG_PER_TONNE))
            .collect();
        EmissionResult {
            category,
            scope: category.scope(),
            emissions: total_kg / KG_PER_TONNE,
            details,
        }
    }
}

/// Clamp overflowed products and sums to the largest finite value.
///
/// Quantities and factors are non-negative, so this keeps every result finite
/// without ever lowering it.
fn saturate(x: f64) -> f64 {
    x.min(f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildingRecord, Scope};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn run(data: CategoryData) -> EmissionResult {
        calculate_category(&data, EmissionFactorTable::standard())
    }

    #[test]
    fn gasoline_thousand_liters() {
        let r = run(CategoryData::Fleet(FleetData {
            essence: Some(1000.0),
            ..Default::default()
        }));
        assert!(close(r.emissions, 2.28), "{}", r.emissions);
        assert_eq!(r.scope, Scope::Direct);
        assert!(close(r.details["gasoline"], 2.28));
    }

    #[test]
    fn waste_tonnes_apply_per_tonne_factors_once() {
        let r = run(CategoryData::Waste(WasteData {
            recyclable: Some(2.0),
            non_recyclable: Some(1.0),
            hazardous: None,
        }));
        assert!(close(r.emissions, 0.509), "{}", r.emissions);
        assert_eq!(r.scope, Scope::ValueChain);
    }

    #[test]
    fn fleet_distance_fallback_only_without_fuel_data() {
        let estimated = run(CategoryData::Fleet(FleetData {
            km_total: Some(10_000.0),
            ..Default::default()
        }));
        assert!(close(estimated.emissions, 1.5));
        assert!(estimated.details.contains_key("estimated"));

        let with_fuel = run(CategoryData::Fleet(FleetData {
            diesel: Some(100.0),
            km_total: Some(10_000.0),
            ..Default::default()
        }));
        assert!(close(with_fuel.emissions, 0.251));
        assert!(!with_fuel.details.contains_key("estimated"));
    }

    #[test]
    fn hydrogen_alone_disables_fallback_and_counts_zero() {
        let r = run(CategoryData::Fleet(FleetData {
            hydrogene: Some(50.0),
            km_total: Some(10_000.0),
            ..Default::default()
        }));
        assert_eq!(r.emissions, 0.0);
        assert_eq!(r.details.get("hydrogen"), Some(&0.0));
    }

    #[test]
    fn electricity_blends_by_renewable_share() {
        let base = BuildingsData {
            electricity: Some(100_000.0),
            ..Default::default()
        };
        let grid = run(CategoryData::Buildings(base.clone()));
        assert!(close(grid.emissions, 100_000.0 * 0.0571 / 1000.0));

        let half = run(CategoryData::Buildings(BuildingsData {
            renewable_energy: Some(true),
            renewable_percentage: Some(50.0),
            ..base.clone()
        }));
        let expected = 100_000.0 * (0.0571 * 0.5 + 0.011 * 0.5) / 1000.0;
        assert!(close(half.emissions, expected), "{}", half.emissions);

        let contract_only = run(CategoryData::Buildings(BuildingsData {
            renewable_energy: Some(true),
            ..base.clone()
        }));
        assert!(close(contract_only.emissions, 1.1));

        let opted_out = run(CategoryData::Buildings(BuildingsData {
            renewable_energy: Some(false),
            renewable_percentage: Some(80.0),
            ..base
        }));
        assert!(close(opted_out.emissions, grid.emissions));
    }

    #[test]
    fn per_building_records_are_detailed() {
        let r = run(CategoryData::Buildings(BuildingsData {
            buildings: vec![
                BuildingRecord {
                    building_name: Some("Tri".to_string()),
                    natural_gas_consumption: Some(10_000.0),
                    ..Default::default()
                },
                BuildingRecord {
                    propane_consumption: Some(1000.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }));
        assert!(close(r.details["Tri #1/natural_gas"], 2.27));
        assert!(close(r.details["#2/propane"], 1.86));
        assert!(close(r.emissions, 4.13));
        assert_eq!(r.scope, Scope::PurchasedEnergy);
    }

    #[test]
    fn building_named_like_a_position_keeps_its_own_detail() {
        let r = run(CategoryData::Buildings(BuildingsData {
            buildings: vec![
                BuildingRecord {
                    building_name: Some("#2".to_string()),
                    natural_gas_consumption: Some(10_000.0),
                    ..Default::default()
                },
                BuildingRecord {
                    natural_gas_consumption: Some(1000.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }));
        assert_eq!(r.details.len(), 2);
        assert!(close(r.details["#2 #1/natural_gas"], 2.27));
        assert!(close(r.details["#2/natural_gas"], 0.227));
    }

    #[test]
    fn zero_fuel_entry_still_disables_distance_fallback() {
        // Any declared fuel field, even at zero, switches off the km estimate.
        let r = run(CategoryData::Fleet(FleetData {
            essence: Some(0.0),
            km_total: Some(10_000.0),
            ..Default::default()
        }));
        assert_eq!(r.emissions, 0.0);
        assert!(!r.details.contains_key("estimated"));
    }

    #[test]
    fn food_splits_meals_by_vegetarian_share() {
        let r = run(CategoryData::Food(FoodData {
            meals: Some(1000.0),
            vegetarian_percentage: Some(20.0),
        }));
        assert!(close(r.details["meat_meals"], 800.0 * 4.08 / 1000.0));
        assert!(close(r.details["veg_meals"], 200.0 * 0.51 / 1000.0));
        assert!(close(r.emissions, (800.0 * 4.08 + 200.0 * 0.51) / 1000.0));
    }

    #[test]
    fn commute_and_attendance_need_both_fields() {
        let partial = run(CategoryData::Commute(CommuteData {
            employees: Some(10.0),
            avg_distance: None,
        }));
        assert_eq!(partial.emissions, 0.0);

        let full = run(CategoryData::Commute(CommuteData {
            employees: Some(10.0),
            avg_distance: Some(5.0),
        }));
        assert!(close(full.emissions, 10.0 * 5.0 * 2.0 * 220.0 * 0.139 / 1000.0));

        let visits = run(CategoryData::Attendance(AttendanceData {
            visitors: Some(1000.0),
            avg_distance: Some(3.0),
        }));
        assert!(close(visits.emissions, 0.417));
    }

    #[test]
    fn purchases_paper_is_declared_in_tonnes() {
        let r = run(CategoryData::Purchases(PurchasesData {
            paper: Some(2.0),
            it_equipment: Some(3.0),
            supplies: Some(5000.0),
        }));
        assert!(close(r.details["paper"], 3.68));
        assert!(close(r.details["it"], 1.245));
        assert!(close(r.details["supplies"], 0.5));
    }

    #[test]
    fn missing_factor_contributes_zero() {
        let sparse = EmissionFactorTable::from_entries([(FactorGroup::Travel, "train_tgv", 0.0032)]);
        let r = calculate_category(
            &CategoryData::BusinessTravel(BusinessTravelData {
                train: Some(1000.0),
                plane: Some(1000.0),
                car: Some(1000.0),
            }),
            &sparse,
        );
        assert!(close(r.emissions, 0.0032));
        assert_eq!(r.details.len(), 1);
    }

    #[test]
    fn subcontracted_freight_uses_tonne_km() {
        let r = run(CategoryData::SubcontractedTransport(SubcontractedTransportData {
            distance: Some(50_000.0),
            tonnage: Some(2.0),
        }));
        assert!(close(r.emissions, 10.0));
    }
}
