//! Runtime configuration from the environment (and `.env`).
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `GES_STORE_DIR` | `.ges` | directory of the file-backed key-value store |
//! | `GES_FACTORS` | unset | JSON emission factor overrides |
//! | `GES_CACHE_CAPACITY` | `100` | calculation cache size |
//! | `GES_REC_BUILDINGS_SHARE` | `25` | buildings share (%) triggering a recommendation |
//! | `GES_REC_FLEET_TONNES` | `10` | fleet tCO2e triggering a recommendation |
//! | `GES_REC_COMMUTE_SHARE` | `15` | commute share (%) triggering a recommendation |

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;
use crate::factors::EmissionFactorTable;
use crate::report::RecommendationPolicy;

const DEFAULT_STORE_DIR: &str = ".ges";
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub store_dir: PathBuf,
    pub factors_path: Option<PathBuf>,
    pub cache_capacity: usize,
    pub policy: RecommendationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            factors_path: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            policy: RecommendationPolicy::default(),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Config::default();

        if let Some(dir) = lookup("GES_STORE_DIR").filter(|s| !s.trim().is_empty()) {
            config.store_dir = PathBuf::from(dir);
        }
        config.factors_path = lookup("GES_FACTORS")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(capacity) = parse_var::<usize>(&lookup, "GES_CACHE_CAPACITY")? {
            if capacity == 0 {
                return Err(AppError::input("GES_CACHE_CAPACITY must be > 0."));
            }
            config.cache_capacity = capacity;
        }

        if let Some(v) = parse_threshold(&lookup, "GES_REC_BUILDINGS_SHARE")? {
            config.policy.buildings_share_pct = v;
        }
        if let Some(v) = parse_threshold(&lookup, "GES_REC_FLEET_TONNES")? {
            config.policy.fleet_emissions_t = v;
        }
        if let Some(v) = parse_threshold(&lookup, "GES_REC_COMMUTE_SHARE")? {
            config.policy.commute_share_pct = v;
        }

        Ok(config)
    }

    /// The factor table to use: standard, or standard merged with `factors_path`.
    pub fn factor_table(&self) -> Result<EmissionFactorTable, AppError> {
        match &self.factors_path {
            Some(path) => {
                log::info!("loading emission factor overrides from {}", path.display());
                EmissionFactorTable::load_json(path)
            }
            None => Ok(EmissionFactorTable::standard().clone()),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::input(format!("Invalid {key}='{raw}': {e}"))),
    }
}

fn parse_threshold(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<f64>, AppError> {
    let value = parse_var::<f64>(lookup, key)?;
    match value {
        Some(v) if !(v.is_finite() && v >= 0.0) => {
            Err(AppError::input(format!("{key} must be finite and >= 0 (got {v}).")))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store_dir, PathBuf::from(".ges"));
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.policy, RecommendationPolicy::default());
        assert!(config.factors_path.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GES_STORE_DIR", "/tmp/ges"),
            ("GES_CACHE_CAPACITY", "8"),
            ("GES_REC_BUILDINGS_SHARE", "40"),
            ("GES_REC_FLEET_TONNES", " 2.5 "),
        ]))
        .unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/ges"));
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.policy.buildings_share_pct, 40.0);
        assert_eq!(config.policy.fleet_emissions_t, 2.5);
        assert_eq!(config.policy.commute_share_pct, 15.0);
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[("GES_CACHE_CAPACITY", "lots")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(Config::from_lookup(lookup(&[("GES_CACHE_CAPACITY", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("GES_REC_COMMUTE_SHARE", "-1")])).is_err());
    }
}
