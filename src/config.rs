use std::fs;
use std::path::Path;

use serde::{Serialize,Deserialize};

use super::error::{Result,Error};


pub const WEEKLY_INCIDENCE_LIMITS_PER_100K: [f64; 6] = [35.0, 50.0, 200.0, 500.0, 1000.0, 2000.0];


/// Tunables of the metrics engine. Every field has a default, so a TOML
/// file only needs to name what it overrides.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Weekly new cases per 100,000 population, strictly ascending.
    pub weekly_incidence_limits_per_100k: Vec<f64>,
    /// Centered windows of the short and long rolling-mean curves.
    pub rolling_mean_windows: (usize,usize),
    pub incidence_window: usize,
    /// Look-back days of `new_last_14days` and `new_last_7days`.
    pub weekly_sum_days: (usize,usize),
    pub reff_lag: usize,
    pub reff_window: usize,
    pub whole_region_name: String,
    pub expected_total_population: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
	Self {
	    weekly_incidence_limits_per_100k: WEEKLY_INCIDENCE_LIMITS_PER_100K.to_vec(),
	    rolling_mean_windows: (7,14),
	    incidence_window: 7,
	    weekly_sum_days: (14,7),
	    reff_lag: 4,
	    reff_window: 7,
	    whole_region_name: "Deutschland".to_string(),
	    expected_total_population: None,
	}
    }
}

impl EngineConfig {

    pub fn load(path: &Path) -> Result<Self> {
	let config : Self = toml::from_str(&fs::read_to_string(path)?)?;
	config.validate()?;
	Ok(config)
    }

    pub fn validate(&self) -> Result<()> {

	let limits = &self.weekly_incidence_limits_per_100k;
	if limits.is_empty() {
	    return Err(Error::InvalidConfig("no weekly incidence limits".to_string()));
	}
	if limits.iter().any(|l| !l.is_finite() || *l <= 0.0) {
	    return Err(Error::InvalidConfig(format!(
		"weekly incidence limits must be positive: {:?}", limits)));
	}
	if limits.windows(2).any(|w| w[0] >= w[1]) {
	    return Err(Error::InvalidConfig(format!(
		"weekly incidence limits must be strictly ascending: {:?}", limits)));
	}

	let windows = [("rolling_mean_windows.0", self.rolling_mean_windows.0),
		       ("rolling_mean_windows.1", self.rolling_mean_windows.1),
		       ("incidence_window", self.incidence_window),
		       ("weekly_sum_days.0", self.weekly_sum_days.0),
		       ("weekly_sum_days.1", self.weekly_sum_days.1),
		       ("reff_window", self.reff_window),
		       ("reff_lag", self.reff_lag)];
	if let Some((name,_)) = windows.iter().find(|(_,size)| *size == 0) {
	    return Err(Error::InvalidConfig(format!("{} must be at least 1", name)));
	}

	if self.reff_lag >= self.reff_window {
	    return Err(Error::InvalidConfig(format!(
		"reff_lag ({}) must be smaller than reff_window ({})",
		self.reff_lag, self.reff_window)));
	}

	if self.whole_region_name.trim().is_empty() {
	    return Err(Error::InvalidConfig("whole_region_name is empty".to_string()));
	}

	Ok(())

    }

}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn default_is_valid() {
	let config = EngineConfig::default();
	assert!(config.validate().is_ok());
	assert_eq!(config.weekly_incidence_limits_per_100k.len(), 6);
	assert_eq!(config.weekly_incidence_limits_per_100k[..3], [35.0, 50.0, 200.0]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
	let config : EngineConfig = toml::from_str(
	    "reff_lag = 3\nwhole_region_name = \"Germany\"\n").unwrap();
	assert_eq!(config.reff_lag, 3);
	assert_eq!(config.reff_window, 7);
	assert_eq!(config.whole_region_name, "Germany");
    }

    #[test]
    fn rejects_unordered_limits() {
	let config = EngineConfig {
	    weekly_incidence_limits_per_100k: vec![50.0, 35.0],
	    ..EngineConfig::default()
	};
	assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_lag_not_below_window() {
	let config = EngineConfig { reff_lag: 7, ..EngineConfig::default() };
	assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
	assert!(toml::from_str::<EngineConfig>("reff_lagg = 3\n").is_err());
    }

    #[test]
    fn load_validates() {
	let path = std::env::temp_dir().join(format!("engine-config-{}.toml", std::process::id()));
	fs::write(&path, "weekly_incidence_limits_per_100k = [50.0, 100.0]\n").unwrap();
	assert_eq!(EngineConfig::load(&path).unwrap().weekly_incidence_limits_per_100k,
		   vec![50.0, 100.0]);
	fs::write(&path, "reff_lag = 9\n").unwrap();
	assert!(matches!(EngineConfig::load(&path), Err(Error::InvalidConfig(_))));
	fs::remove_file(&path).unwrap();
    }

}
