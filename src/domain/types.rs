//! Shared domain types.
//!
//! These types are intentionally kept serializable so they can be:
//!
//! - decoded from questionnaire JSON (forgivingly, see `lenient`)
//! - computed on in-memory by the aggregator
//! - exported to JSON/CSV and persisted in the key-value store

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::domain::records::{
    AttendanceData, BusinessTravelData, BuildingsData, CommuteData, FleetData, FoodData,
    PurchasesData, SubcontractedTransportData, WasteData,
};

/// The nine activity domains of the questionnaire.
///
/// Serialized with the questionnaire's own identifiers; English aliases are
/// accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EmissionCategory {
    #[serde(rename = "batiments", alias = "buildings")]
    Buildings,
    #[serde(rename = "flotte-propre", alias = "clean-fleet")]
    Fleet,
    #[serde(rename = "transport-sous-traite", alias = "subcontracted-transport")]
    SubcontractedTransport,
    #[serde(rename = "deplacements-domicile", alias = "home-work-commute")]
    Commute,
    #[serde(rename = "deplacements-professionnels", alias = "business-travel")]
    BusinessTravel,
    #[serde(rename = "frequentation", alias = "attendance")]
    Attendance,
    #[serde(rename = "alimentation", alias = "food")]
    Food,
    #[serde(rename = "achats", alias = "purchases")]
    Purchases,
    #[serde(rename = "dechets", alias = "waste")]
    Waste,
}

impl EmissionCategory {
    pub const ALL: [EmissionCategory; 9] = [
        EmissionCategory::Buildings,
        EmissionCategory::Fleet,
        EmissionCategory::SubcontractedTransport,
        EmissionCategory::Commute,
        EmissionCategory::BusinessTravel,
        EmissionCategory::Attendance,
        EmissionCategory::Food,
        EmissionCategory::Purchases,
        EmissionCategory::Waste,
    ];

    /// Wire identifier (JSON key).
    pub fn as_str(self) -> &'static str {
        match self {
            EmissionCategory::Buildings => "batiments",
            EmissionCategory::Fleet => "flotte-propre",
            EmissionCategory::SubcontractedTransport => "transport-sous-traite",
            EmissionCategory::Commute => "deplacements-domicile",
            EmissionCategory::BusinessTravel => "deplacements-professionnels",
            EmissionCategory::Attendance => "frequentation",
            EmissionCategory::Food => "alimentation",
            EmissionCategory::Purchases => "achats",
            EmissionCategory::Waste => "dechets",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            EmissionCategory::Buildings => "buildings",
            EmissionCategory::Fleet => "clean-fleet",
            EmissionCategory::SubcontractedTransport => "subcontracted-transport",
            EmissionCategory::Commute => "home-work-commute",
            EmissionCategory::BusinessTravel => "business-travel",
            EmissionCategory::Attendance => "attendance",
            EmissionCategory::Food => "food",
            EmissionCategory::Purchases => "purchases",
            EmissionCategory::Waste => "waste",
        }
    }

    /// Resolve a wire identifier or its English alias.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == key || c.alias() == key)
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            EmissionCategory::Buildings => "Buildings",
            EmissionCategory::Fleet => "Own fleet",
            EmissionCategory::SubcontractedTransport => "Subcontracted transport",
            EmissionCategory::Commute => "Home-work commute",
            EmissionCategory::BusinessTravel => "Business travel",
            EmissionCategory::Attendance => "Visitor attendance",
            EmissionCategory::Food => "Catering",
            EmissionCategory::Purchases => "Purchases",
            EmissionCategory::Waste => "Waste",
        }
    }

    /// Fixed reporting scope of the category.
    pub fn scope(self) -> Scope {
        match self {
            EmissionCategory::Fleet => Scope::Direct,
            EmissionCategory::Buildings => Scope::PurchasedEnergy,
            _ => Scope::ValueChain,
        }
    }
}

impl fmt::Display for EmissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GHG Protocol reporting scope, serialized as the integer 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Scope {
    /// Scope 1: direct emissions.
    Direct,
    /// Scope 2: purchased energy.
    PurchasedEnergy,
    /// Scope 3: everything else in the value chain.
    ValueChain,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Direct, Scope::PurchasedEnergy, Scope::ValueChain];

    pub fn number(self) -> u8 {
        match self {
            Scope::Direct => 1,
            Scope::PurchasedEnergy => 2,
            Scope::ValueChain => 3,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scope::Direct => "Direct emissions",
            Scope::PurchasedEnergy => "Purchased energy",
            Scope::ValueChain => "Value chain",
        }
    }
}

impl From<Scope> for u8 {
    fn from(value: Scope) -> Self {
        value.number()
    }
}

impl TryFrom<u8> for Scope {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Scope::Direct),
            2 => Ok(Scope::PurchasedEnergy),
            3 => Ok(Scope::ValueChain),
            other => Err(format!("invalid scope {other}, expected 1, 2 or 3")),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope {}", self.number())
    }
}

/// Input record of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryData {
    Buildings(BuildingsData),
    Fleet(FleetData),
    SubcontractedTransport(SubcontractedTransportData),
    Commute(CommuteData),
    BusinessTravel(BusinessTravelData),
    Attendance(AttendanceData),
    Food(FoodData),
    Purchases(PurchasesData),
    Waste(WasteData),
}

impl CategoryData {
    pub fn category(&self) -> EmissionCategory {
        match self {
            CategoryData::Buildings(_) => EmissionCategory::Buildings,
            CategoryData::Fleet(_) => EmissionCategory::Fleet,
            CategoryData::SubcontractedTransport(_) => EmissionCategory::SubcontractedTransport,
            CategoryData::Commute(_) => EmissionCategory::Commute,
            CategoryData::BusinessTravel(_) => EmissionCategory::BusinessTravel,
            CategoryData::Attendance(_) => EmissionCategory::Attendance,
            CategoryData::Food(_) => EmissionCategory::Food,
            CategoryData::Purchases(_) => EmissionCategory::Purchases,
            CategoryData::Waste(_) => EmissionCategory::Waste,
        }
    }

    /// An all-absent record for `category`.
    pub fn empty(category: EmissionCategory) -> Self {
        match category {
            EmissionCategory::Buildings => CategoryData::Buildings(Default::default()),
            EmissionCategory::Fleet => CategoryData::Fleet(Default::default()),
            EmissionCategory::SubcontractedTransport => {
                CategoryData::SubcontractedTransport(Default::default())
            }
            EmissionCategory::Commute => CategoryData::Commute(Default::default()),
            EmissionCategory::BusinessTravel => CategoryData::BusinessTravel(Default::default()),
            EmissionCategory::Attendance => CategoryData::Attendance(Default::default()),
            EmissionCategory::Food => CategoryData::Food(Default::default()),
            EmissionCategory::Purchases => CategoryData::Purchases(Default::default()),
            EmissionCategory::Waste => CategoryData::Waste(Default::default()),
        }
    }

    /// Decode a category record from loosely typed JSON.
    ///
    /// Never fails: a value that is not an object becomes an empty record.
    pub fn from_value(category: EmissionCategory, value: Value) -> Self {
        if !value.is_object() {
            if !value.is_null() {
                log::warn!("ignoring {category}: expected an object, got {value}");
            }
            return Self::empty(category);
        }

        fn decode<T: serde::de::DeserializeOwned + Default>(
            category: EmissionCategory,
            value: Value,
        ) -> T {
            serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("ignoring malformed {category} record: {e}");
                T::default()
            })
        }

        match category {
            EmissionCategory::Buildings => CategoryData::Buildings(decode(category, value)),
            EmissionCategory::Fleet => CategoryData::Fleet(decode(category, value)),
            EmissionCategory::SubcontractedTransport => {
                CategoryData::SubcontractedTransport(decode(category, value))
            }
            EmissionCategory::Commute => CategoryData::Commute(decode(category, value)),
            EmissionCategory::BusinessTravel => CategoryData::BusinessTravel(decode(category, value)),
            EmissionCategory::Attendance => CategoryData::Attendance(decode(category, value)),
            EmissionCategory::Food => CategoryData::Food(decode(category, value)),
            EmissionCategory::Purchases => CategoryData::Purchases(decode(category, value)),
            EmissionCategory::Waste => CategoryData::Waste(decode(category, value)),
        }
    }

    /// True when no field that could carry emissions is present.
    pub fn is_empty(&self) -> bool {
        match self {
            CategoryData::Buildings(d) => d.is_empty(),
            CategoryData::Fleet(d) => d.is_empty(),
            CategoryData::SubcontractedTransport(d) => d.distance.is_none() && d.tonnage.is_none(),
            CategoryData::Commute(d) => d.employees.is_none() && d.avg_distance.is_none(),
            CategoryData::BusinessTravel(d) => {
                d.train.is_none() && d.plane.is_none() && d.car.is_none()
            }
            CategoryData::Attendance(d) => d.visitors.is_none() && d.avg_distance.is_none(),
            CategoryData::Food(d) => d.meals.is_none(),
            CategoryData::Purchases(d) => {
                d.paper.is_none() && d.it_equipment.is_none() && d.supplies.is_none()
            }
            CategoryData::Waste(d) => {
                d.recyclable.is_none() && d.non_recyclable.is_none() && d.hazardous.is_none()
            }
        }
    }
}

/// The full questionnaire input: category records in input order.
///
/// Serializes as a JSON object keyed by category identifier. On decode, unknown
/// keys are skipped and a repeated key replaces the earlier record in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Questionnaire {
    entries: Vec<CategoryData>,
}

impl Questionnaire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its category (position of first insert kept).
    pub fn insert(&mut self, data: CategoryData) {
        let category = data.category();
        match self.entries.iter_mut().find(|e| e.category() == category) {
            Some(slot) => *slot = data,
            None => self.entries.push(data),
        }
    }

    pub fn get(&self, category: EmissionCategory) -> Option<&CategoryData> {
        self.entries.iter().find(|e| e.category() == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryData> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl FromIterator<CategoryData> for Questionnaire {
    fn from_iter<I: IntoIterator<Item = CategoryData>>(iter: I) -> Self {
        let mut q = Questionnaire::new();
        for data in iter {
            q.insert(data);
        }
        q
    }
}

impl Serialize for Questionnaire {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for data in &self.entries {
            map.serialize_entry(data.category().as_str(), data)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Questionnaire {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuestionnaireVisitor;

        impl<'de> Visitor<'de> for QuestionnaireVisitor {
            type Value = Questionnaire;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by emission category")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut q = Questionnaire::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    match EmissionCategory::from_key(&key) {
                        Some(category) => q.insert(CategoryData::from_value(category, value)),
                        None => log::warn!("ignoring unknown category '{key}'"),
                    }
                }
                Ok(q)
            }
        }

        deserializer.deserialize_map(QuestionnaireVisitor)
    }
}

/// Computed emissions of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionResult {
    pub category: EmissionCategory,
    pub scope: Scope,
    /// tCO2e.
    pub emissions: f64,
    /// Per-field contributions (tCO2e).
    pub details: BTreeMap<String, f64>,
}

/// Aggregate emissions across categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalEmissions {
    pub total: f64,
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
    /// Non-zero category results, in input order.
    pub by_category: Vec<EmissionResult>,
}

impl TotalEmissions {
    pub fn scope_total(&self, scope: Scope) -> f64 {
        match scope {
            Scope::Direct => self.scope1,
            Scope::PurchasedEnergy => self.scope2,
            Scope::ValueChain => self.scope3,
        }
    }

    pub fn category(&self, category: EmissionCategory) -> Option<&EmissionResult> {
        self.by_category.iter().find(|r| r.category == category)
    }

    /// Share of the grand total in percent (0 when the total is 0).
    pub fn share_pct(&self, value: f64) -> f64 {
        if self.total > 0.0 {
            value / self.total * 100.0
        } else {
            0.0
        }
    }

    /// Category results sorted by decreasing emissions.
    pub fn ranked(&self) -> Vec<&EmissionResult> {
        let mut out: Vec<&EmissionResult> = self.by_category.iter().collect();
        out.sort_by(|a, b| b.emissions.total_cmp(&a.emissions));
        out
    }
}

/// Recommendation urgency. Orders high → low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn display_name(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// One advisory entry derived from computed emissions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    /// Target category; `None` means an organisation-wide ("general") action.
    #[serde(serialize_with = "serialize_topic")]
    pub category: Option<EmissionCategory>,
    pub title: String,
    pub description: String,
    /// Estimated reduction potential, whole tCO2e.
    pub impact: f64,
    pub actions: Vec<String>,
}

fn serialize_topic<S: Serializer>(
    category: &Option<EmissionCategory>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(category.map(EmissionCategory::as_str).unwrap_or("general"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_keys_and_aliases_resolve() {
        assert_eq!(EmissionCategory::from_key("batiments"), Some(EmissionCategory::Buildings));
        assert_eq!(EmissionCategory::from_key("clean-fleet"), Some(EmissionCategory::Fleet));
        assert_eq!(EmissionCategory::from_key("dechets"), Some(EmissionCategory::Waste));
        assert_eq!(EmissionCategory::from_key("unknown"), None);
    }

    #[test]
    fn scopes_follow_fixed_table() {
        for category in EmissionCategory::ALL {
            let expected = match category {
                EmissionCategory::Buildings => 2,
                EmissionCategory::Fleet => 1,
                _ => 3,
            };
            assert_eq!(category.scope().number(), expected, "{category}");
        }
    }

    #[test]
    fn scope_serializes_as_integer() {
        assert_eq!(serde_json::to_value(Scope::PurchasedEnergy).unwrap(), json!(2));
        let scope: Scope = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(scope, Scope::ValueChain);
        assert!(serde_json::from_value::<Scope>(json!(4)).is_err());
    }

    #[test]
    fn questionnaire_keeps_input_order_and_skips_unknown_keys() {
        let q = Questionnaire::from_json_str(
            r#"{"dechets": {"recyclable": 2}, "nope": {"x": 1}, "flotte-propre": {"essence": "1000"}}"#,
        )
        .unwrap();
        let order: Vec<EmissionCategory> = q.iter().map(CategoryData::category).collect();
        assert_eq!(order, vec![EmissionCategory::Waste, EmissionCategory::Fleet]);

        match q.get(EmissionCategory::Fleet) {
            Some(CategoryData::Fleet(f)) => assert_eq!(f.essence, Some(1000.0)),
            other => panic!("unexpected fleet record: {other:?}"),
        }
    }

    #[test]
    fn repeated_key_replaces_in_place() {
        let q = Questionnaire::from_json_str(
            r#"{"achats": {"paper": 1}, "dechets": {"hazardous": 1}, "achats": {"paper": 3}}"#,
        )
        .unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.iter().next().map(CategoryData::category), Some(EmissionCategory::Purchases));
        match q.get(EmissionCategory::Purchases) {
            Some(CategoryData::Purchases(p)) => assert_eq!(p.paper, Some(3.0)),
            other => panic!("unexpected purchases record: {other:?}"),
        }
    }

    #[test]
    fn malformed_category_value_becomes_empty() {
        let q = Questionnaire::from_json_str(r#"{"batiments": 42, "alimentation": {"meals": "n/a"}}"#)
            .unwrap();
        assert!(q.iter().all(CategoryData::is_empty));
    }

    #[test]
    fn questionnaire_serializes_back_to_keyed_object() {
        let q = Questionnaire::from_json_str(r#"{"frequentation": {"visitors": 10, "avg_distance": 5}}"#)
            .unwrap();
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value, json!({"frequentation": {"visitors": 10.0, "avg_distance": 5.0}}));
        let back: Questionnaire = serde_json::from_value(value).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn buildings_list_tolerates_bad_entries() {
        let q = Questionnaire::from_json_str(
            r#"{"batiments": {"buildings": [{"building_name": "Centre", "natural_gas_consumption": "1200"}, 7]}}"#,
        )
        .unwrap();
        match q.get(EmissionCategory::Buildings) {
            Some(CategoryData::Buildings(b)) => {
                assert_eq!(b.buildings.len(), 1);
                assert_eq!(b.buildings[0].label(0), "Centre #1");
                assert_eq!(b.buildings[0].natural_gas_consumption, Some(1200.0));
            }
            other => panic!("unexpected buildings record: {other:?}"),
        }
    }
}
