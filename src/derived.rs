//! Derived columns shared by the district and the federal-state table.

use chrono::naive::NaiveDate;
use serde::Serialize;

use super::aggregate::RegionSeries;
use super::center::temporal_center;
use super::config::EngineConfig;
use super::estimate::Estimate;
use super::reproduction::reff_4_7;
use super::rolling;
use super::table::{Level,RegionKey};


#[derive(Clone,Debug,PartialEq,Serialize)]
pub struct DerivedRow {
    pub key: RegionKey,
    pub name: String,
    pub parent: Option<String>,
    /// None for districts without metadata.
    pub population: Option<u64>,
    pub cumulative: Vec<i64>,
    pub temporal_center: Estimate,
    pub new_last_14days: Option<i64>,
    pub new_last_7days: Option<i64>,
    pub reproduction_number: Estimate,
    /// Change of the cumulative count on the last day.
    pub new_cases: Option<i64>,
    pub incidence_1mio_last_7days: Option<f64>,
    pub incidence_1mio_last_14days: Option<f64>,
    pub prevalence_1mio: Option<f64>,
}

impl DerivedRow {

    pub fn total(&self) -> Option<i64> {
	self.cumulative.last().copied()
    }

    pub fn prevalence_100k(&self) -> Option<f64> {
	self.prevalence_1mio.map(|p| p / 10.0)
    }

}


#[derive(Clone,Debug,PartialEq,Serialize)]
pub struct DerivedTable {
    pub level: Level,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<DerivedRow>,
}

impl DerivedTable {

    /// Adds the derived columns to every region and orders the rows by
    /// descending temporal center, undefined centers last.
    pub fn new(level: Level, dates: Vec<NaiveDate>, regions: Vec<RegionSeries>,
	       config: &EngineConfig) -> Self {
	let mut rows : Vec<DerivedRow> = regions.into_iter()
	    .map(|region| derive_row(region, config))
	    .collect();
	rows.sort_by(|a,b| a.temporal_center.cmp_descending(&b.temporal_center));
	Self { level, dates, rows }
    }

    pub fn get(&self, key: &RegionKey) -> Option<&DerivedRow> {
	self.rows.iter().find(|r| &r.key == key)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
	self.dates.last().copied()
    }

    /// Highest cumulative cases per 100,000 population over all rows.
    pub fn max_prevalence_100k(&self) -> f64 {
	self.rows.iter().filter_map(DerivedRow::prevalence_100k)
	    .fold(0.0, f64::max)
    }

}


fn per_population(value: Option<i64>, population: Option<u64>, per: f64) -> Option<f64> {
    let population = population.filter(|p| *p != 0)?;
    value.map(|v| v as f64 * per / population as f64)
}

fn derive_row(region: RegionSeries, config: &EngineConfig) -> DerivedRow {

    let daily = rolling::daily(&region.cumulative);

    let temporal_center = temporal_center(&daily).center;
    let new_last_14days = new_cases_since(&region.cumulative, config.weekly_sum_days.0);
    let new_last_7days = new_cases_since(&region.cumulative, config.weekly_sum_days.1);
    let reproduction_number = reff_4_7(&daily, None, config);

    let new_cases = new_cases_since(&region.cumulative, 1);
    let incidence_1mio_last_7days = per_population(new_last_7days, region.population, 1e6);
    let incidence_1mio_last_14days = per_population(new_last_14days, region.population, 1e6);
    let prevalence_1mio = per_population(region.cumulative.last().copied(), region.population, 1e6);

    DerivedRow {
	key: region.key,
	name: region.name,
	parent: region.parent,
	population: region.population,
	cumulative: region.cumulative,
	temporal_center,
	new_last_14days,
	new_last_7days,
	reproduction_number,
	new_cases,
	incidence_1mio_last_7days,
	incidence_1mio_last_14days,
	prevalence_1mio,
    }

}


/// Cumulative count on the last day minus the one `days` days earlier.
pub fn new_cases_since(cumulative: &[i64], days: usize) -> Option<i64> {
    let last = cumulative.len().checked_sub(1)?;
    let before = last.checked_sub(days)?;
    Some(cumulative[last] - cumulative[before])
}

/// Trailing `window`-day mean of the cumulative counts, differenced over
/// `days` days at the last day.
pub fn cumulative_smoothed_last_week_incidence(cumulative: &[i64], window: usize,
					       days: usize) -> Estimate {
    let averaged = rolling::trailing_mean(&rolling::to_values(cumulative), window);
    difference_back(&averaged, &averaged, days)
}

/// Last day's raw cumulative count minus the centered `window`-day mean
/// `days` days earlier.
pub fn cumulative_today_minus_last_week_smoothed(cumulative: &[i64], window: usize,
						 days: usize) -> Estimate {
    let values = rolling::to_values(cumulative);
    let averaged = rolling::centered_mean(&values, window);
    difference_back(&values, &averaged, days)
}

fn difference_back(now: &[Option<f64>], before: &[Option<f64>], days: usize) -> Estimate {
    let last = match now.len().checked_sub(1) {
	Some(last) => last,
	None => return Estimate::InsufficientHistory,
    };
    match last.checked_sub(days) {
	None => Estimate::InsufficientHistory,
	Some(i) => match (now[last], before[i]) {
	    (Some(a),Some(b)) => Estimate::from_f64(a - b),
	    _ => Estimate::Undefined,
	},
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::table::RegionId;

    fn series(id: u32, population: u64, cumulative: Vec<i64>) -> RegionSeries {
	RegionSeries {
	    key: RegionKey::District(RegionId(id)),
	    name: format!("District {}", id),
	    parent: Some("P".to_string()),
	    population: Some(population),
	    cumulative,
	}
    }

    fn dates(n: usize) -> Vec<NaiveDate> {
	let start = NaiveDate::from_ymd_opt(2020, 3, 5).unwrap();
	(0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    #[test]
    fn weekly_sums_need_history() {
	let cumulative = vec![0, 1, 3, 6, 10, 15, 21, 28];
	assert_eq!(new_cases_since(&cumulative, 7), Some(28));
	assert_eq!(new_cases_since(&cumulative, 14), None);
	assert_eq!(new_cases_since(&cumulative, 1), Some(7));
	assert_eq!(new_cases_since(&[], 1), None);
    }

    #[test]
    fn derives_all_columns() {
	let table = DerivedTable::new(Level::District, dates(8),
				      vec![series(1, 100_000, vec![0, 1, 3, 6, 10, 15, 21, 28])],
				      &EngineConfig::default());
	let row = &table.rows[0];
	assert_eq!(row.new_last_7days, Some(28));
	assert_eq!(row.new_last_14days, None);
	assert_eq!(row.new_cases, Some(7));
	assert_eq!(row.reproduction_number, Estimate::InsufficientHistory);
	assert_eq!(row.incidence_1mio_last_7days, Some(280.0));
	assert_eq!(row.prevalence_1mio, Some(280.0));
	assert_eq!(row.prevalence_100k(), Some(28.0));
	// (1*1 + 2*2 + ... + 7*7) / 28 = 140 / 28
	assert_eq!(row.temporal_center, Estimate::Defined(5.0));
    }

    #[test]
    fn rows_ordered_by_latest_center() {
	let table = DerivedTable::new(Level::District, dates(5), vec![
	    series(1, 10, vec![0, 5, 5, 5, 5]),
	    series(2, 10, vec![0, 0, 0, 0, 0]),
	    series(3, 10, vec![0, 0, 0, 0, 5]),
	    series(4, 10, vec![0, 0, 5, 5, 5]),
	], &EngineConfig::default());
	let order : Vec<RegionKey> = table.rows.iter().map(|r| r.key.clone()).collect();
	assert_eq!(order, vec![RegionKey::District(RegionId(3)), RegionKey::District(RegionId(4)),
			       RegionKey::District(RegionId(1)), RegionKey::District(RegionId(2))]);
	assert_eq!(table.rows[3].temporal_center, Estimate::Undefined);
    }

    #[test]
    fn unknown_population_leaves_rates_undefined() {
	let mut region = series(1, 0, vec![0, 2, 4]);
	region.population = None;
	let table = DerivedTable::new(Level::District, dates(3), vec![region], &EngineConfig::default());
	let row = &table.rows[0];
	assert_eq!(row.new_cases, Some(2));
	assert_eq!(row.prevalence_1mio, None);
	assert_eq!(row.incidence_1mio_last_7days, None);
	assert_eq!(table.max_prevalence_100k(), 0.0);
    }

    #[test]
    fn max_prevalence_over_rows() {
	let table = DerivedTable::new(Level::District, dates(2), vec![
	    series(1, 100_000, vec![0, 50]),
	    series(2, 200_000, vec![0, 300]),
	], &EngineConfig::default());
	assert!((table.max_prevalence_100k() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn smoothed_weekly_estimators() {
	let cumulative : Vec<i64> = (0..22).map(|i| 10 * i).collect();
	// linear growth: any smoothing keeps the weekly difference at 70
	let a = cumulative_smoothed_last_week_incidence(&cumulative, 7, 7);
	assert!((a.to_f64() - 70.0).abs() < 1e-9);
	// the centered mean a week ago is the raw value a week ago
	let b = cumulative_today_minus_last_week_smoothed(&cumulative, 7, 7);
	assert!((b.to_f64() - 70.0).abs() < 1e-9);
	assert_eq!(cumulative_smoothed_last_week_incidence(&cumulative[..5], 7, 7),
		   Estimate::InsufficientHistory);
	assert_eq!(cumulative_smoothed_last_week_incidence(&cumulative[..10], 7, 7),
		   Estimate::Undefined);
    }

}
