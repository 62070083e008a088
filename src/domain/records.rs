//! Typed per-category questionnaire records.
//!
//! Field names are the wire names used by the questionnaire JSON. Every numeric
//! field is optional: an absent field contributes nothing, which keeps the
//! "missing field ⇒ zero" rule explicit instead of relying on lookups.
//! Unknown fields are ignored by serde.

use serde::{Deserialize, Serialize};

use crate::domain::{CategoryData, EmissionCategory, Questionnaire, lenient};

/// Buildings (`batiments`): site-level energy use plus optional per-building records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingsData {
    /// Electricity consumption (kWh/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub electricity: Option<f64>,
    /// Natural gas consumption (kWh/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub gas: Option<f64>,
    /// Heating oil (liters/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub fuel: Option<f64>,
    /// District heating (kWh/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub district_heating: Option<f64>,
    /// Wood logs (tonnes/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub wood: Option<f64>,
    /// Whether a renewable electricity contract is in place.
    #[serde(deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub renewable_energy: Option<bool>,
    /// Renewable share of the electricity supply (0-100).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub renewable_percentage: Option<f64>,
    #[serde(deserialize_with = "lenient::records", skip_serializing_if = "Vec::is_empty")]
    pub buildings: Vec<BuildingRecord>,
}

/// One building of the site inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingRecord {
    #[serde(deserialize_with = "lenient::label", skip_serializing_if = "Option::is_none")]
    pub building_number: Option<String>,
    #[serde(deserialize_with = "lenient::label", skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    #[serde(deserialize_with = "lenient::label", skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub construction_year: Option<f64>,
    /// Total floor area (m²).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub surface_total: Option<f64>,
    /// Occupied floor area (m²).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub surface_occupied: Option<f64>,
    /// Water consumption (m³/year). No factor applies.
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub water_consumption: Option<f64>,
    /// Natural gas consumption (kWh/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub natural_gas_consumption: Option<f64>,
    /// Propane consumption (liters/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub propane_consumption: Option<f64>,
}

impl BuildingRecord {
    /// Label used in detail keys: name (else number) followed by the 1-based
    /// position, or the position alone. The text after the last `#` is always
    /// the position, so two buildings never share a label.
    pub fn label(&self, index: usize) -> String {
        let position = index + 1;
        match self.building_name.as_ref().or(self.building_number.as_ref()) {
            Some(name) => format!("{name} #{position}"),
            None => format!("#{position}"),
        }
    }

    fn is_empty(&self) -> bool {
        self.natural_gas_consumption.is_none() && self.propane_consumption.is_none()
    }
}

impl BuildingsData {
    pub fn is_empty(&self) -> bool {
        self.electricity.is_none()
            && self.gas.is_none()
            && self.fuel.is_none()
            && self.district_heating.is_none()
            && self.wood.is_none()
            && self.buildings.iter().all(BuildingRecord::is_empty)
    }
}

/// Own fleet (`flotte-propre`): fuel purchases and an optional distance fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetData {
    /// Gasoline (liters/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub essence: Option<f64>,
    /// Diesel (liters/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub diesel: Option<f64>,
    /// Compressed natural gas (kg/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub gnv: Option<f64>,
    /// Charging electricity (kWh/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub elec_kwh: Option<f64>,
    /// Hydrogen (kg/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub hydrogene: Option<f64>,
    /// Total distance driven (km/year); only used when no fuel data is given.
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub km_total: Option<f64>,
}

impl FleetData {
    pub fn has_fuel_data(&self) -> bool {
        self.essence.is_some()
            || self.diesel.is_some()
            || self.gnv.is_some()
            || self.elec_kwh.is_some()
            || self.hydrogene.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_fuel_data() && self.km_total.is_none()
    }
}

/// Subcontracted freight (`transport-sous-traite`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubcontractedTransportData {
    /// Distance (km/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Average load (tonnes).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub tonnage: Option<f64>,
}

/// Home-work commute (`deplacements-domicile`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommuteData {
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub employees: Option<f64>,
    /// One-way distance (km).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub avg_distance: Option<f64>,
}

/// Business travel (`deplacements-professionnels`), all in km/year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessTravelData {
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub train: Option<f64>,
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub plane: Option<f64>,
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub car: Option<f64>,
}

/// Visitor attendance (`frequentation`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceData {
    /// Visits per year.
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub visitors: Option<f64>,
    /// Average distance per visit (km).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub avg_distance: Option<f64>,
}

/// Catering (`alimentation`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodData {
    /// Meals served per year.
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub meals: Option<f64>,
    /// Share of vegetarian meals (0-100).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub vegetarian_percentage: Option<f64>,
}

/// Purchases (`achats`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchasesData {
    /// Paper (tonnes/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub paper: Option<f64>,
    /// IT equipment (units/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub it_equipment: Option<f64>,
    /// Office supplies spend (€/year).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub supplies: Option<f64>,
}

/// Waste (`dechets`), all in tonnes/year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasteData {
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub recyclable: Option<f64>,
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub non_recyclable: Option<f64>,
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub hazardous: Option<f64>,
}

/// Headcount and floor area of an assessed entity, used to normalise its
/// emissions when entities are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityProfile {
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub employees: Option<f64>,
    /// Floor area (m²).
    #[serde(deserialize_with = "lenient::quantity", skip_serializing_if = "Option::is_none")]
    pub surface: Option<f64>,
}

impl EntityProfile {
    /// Fill missing values from the questionnaire: the commute headcount and
    /// the summed `surface_total` of the declared buildings.
    pub fn or_derived(self, questionnaire: &Questionnaire) -> Self {
        let employees = self.employees.or_else(|| match questionnaire.get(EmissionCategory::Commute) {
            Some(CategoryData::Commute(c)) => c.employees,
            _ => None,
        });
        let surface = self.surface.or_else(|| match questionnaire.get(EmissionCategory::Buildings) {
            Some(CategoryData::Buildings(b)) => {
                b.buildings.iter().filter_map(|r| r.surface_total).reduce(|a, b| a + b)
            }
            _ => None,
        });
        Self { employees, surface }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_falls_back_to_questionnaire_values() {
        let q = Questionnaire::from_json_str(
            r#"{
                "deplacements-domicile": {"employees": 120, "avg_distance": 12},
                "batiments": {"buildings": [{"surface_total": 800}, {"surface_total": "1200"}, {}]}
            }"#,
        )
        .unwrap();
        let derived = EntityProfile::default().or_derived(&q);
        assert_eq!(derived.employees, Some(120.0));
        assert_eq!(derived.surface, Some(2000.0));

        let declared = EntityProfile {
            employees: Some(90.0),
            surface: None,
        }
        .or_derived(&q);
        assert_eq!(declared.employees, Some(90.0));
        assert_eq!(declared.surface, Some(2000.0));

        assert_eq!(EntityProfile::default().or_derived(&Questionnaire::new()), EntityProfile::default());
    }
}
