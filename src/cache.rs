//! Bounded LRU cache for repeated calculations.
//!
//! The aggregator itself is pure; callers that recompute the same questionnaire
//! many times (scenario listings, comparisons) go through a `Calculator`, which
//! keys results by the serialized questionnaire.

use std::collections::HashMap;

use crate::calc::calculate_total_emissions_with;
use crate::domain::{Questionnaire, TotalEmissions};
use crate::factors::EmissionFactorTable;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: TotalEmissions,
    last_used: u64,
}

/// Least-recently-used map of `key → TotalEmissions` with a fixed capacity.
#[derive(Debug, Clone)]
pub struct CalculationCache {
    capacity: usize,
    clock: u64,
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl CalculationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: 0,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<TotalEmissions> {
        self.clock += 1;
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = self.clock;
                self.hits += 1;
                Some(entry.value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: String, value: TotalEmissions) {
        self.clock += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                log::debug!("calculation cache full ({}), evicting one entry", self.capacity);
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_used: self.clock,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// A factor table plus a calculation cache.
#[derive(Debug, Clone)]
pub struct Calculator {
    table: EmissionFactorTable,
    cache: CalculationCache,
}

impl Calculator {
    pub fn new(table: EmissionFactorTable, capacity: usize) -> Self {
        Self {
            table,
            cache: CalculationCache::new(capacity),
        }
    }

    pub fn table(&self) -> &EmissionFactorTable {
        &self.table
    }

    pub fn cache(&self) -> &CalculationCache {
        &self.cache
    }

    /// Compute totals, reusing a cached result for an identical questionnaire.
    pub fn compute(&mut self, questionnaire: &Questionnaire) -> TotalEmissions {
        let key = match serde_json::to_string(questionnaire) {
            Ok(key) => key,
            Err(e) => {
                log::warn!("questionnaire not cacheable: {e}");
                return calculate_total_emissions_with(questionnaire, &self.table);
            }
        };

        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let totals = calculate_total_emissions_with(questionnaire, &self.table);
        self.cache.insert(key, totals.clone());
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(total: f64) -> TotalEmissions {
        TotalEmissions {
            total,
            ..Default::default()
        }
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = CalculationCache::new(2);
        cache.insert("a".into(), totals(1.0));
        cache.insert("b".into(), totals(2.0));
        assert!(cache.get("a").is_some());
        cache.insert("c".into(), totals(3.0));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinserting_existing_key_does_not_evict() {
        let mut cache = CalculationCache::new(2);
        cache.insert("a".into(), totals(1.0));
        cache.insert("b".into(), totals(2.0));
        cache.insert("a".into(), totals(10.0));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").map(|t| t.total), Some(10.0));
    }

    #[test]
    fn calculator_reuses_identical_questionnaires() {
        let mut calc = Calculator::new(EmissionFactorTable::standard().clone(), 4);
        let q = Questionnaire::from_json_str(r#"{"flotte-propre": {"essence": 1000}}"#).unwrap();

        let first = calc.compute(&q);
        let second = calc.compute(&q);
        assert_eq!(first, second);
        assert_eq!(calc.cache().stats(), (1, 1));
        assert_eq!(calc.cache().len(), 1);
    }
}
