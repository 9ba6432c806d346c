//! Per-region metrics for the reporting collaborators.

use chrono::naive::NaiveDate;
use serde::Serialize;
use unidecode::unidecode;

use super::center::temporal_center;
use super::config::EngineConfig;
use super::derived::{DerivedRow,DerivedTable};
use super::error::{Result,Error};
use super::estimate::Estimate;
use super::metadata::{MetadataTable,RegionType};
use super::rolling::{self,Sequence};
use super::table::{RegionId,RegionKey};


/// Fields only districts have.
#[derive(Clone,Debug,PartialEq,Serialize)]
pub struct DistrictInfo {
    pub id: RegionId,
    /// Zero-padded id, as used in file names.
    pub ags: String,
    /// `<name>_<type abbreviation>`, as in link titles.
    pub name_and_type: String,
    pub region_type: RegionType,
    pub federal_state: String,
    pub federal_state_population: u64,
    pub federal_state_cases: u64,
    pub sources: String,
}

#[derive(Clone,Debug,PartialEq,Serialize)]
#[serde(tag = "level")]
pub enum Area {
    District(DistrictInfo),
    FederalState,
}


#[derive(Clone,Debug,PartialEq,Serialize)]
pub struct RegionMetrics {
    pub key: RegionKey,
    pub name: String,
    pub population: u64,
    pub cumulative: Vec<i64>,
    pub daily: Sequence,
    pub total: i64,
    pub prevalence_1mio: f64,
    pub prevalence_100k: f64,
    pub rolling_mean_short: Sequence,
    pub rolling_mean_long: Sequence,
    /// Trailing sum of new cases over the incidence window.
    pub incidence_sums: Sequence,
    /// `incidence_sums` per 100,000 population, rounded to 2 decimals.
    pub incidence_values: Sequence,
    pub center: Estimate,
    pub center_date: Option<NaiveDate>,
    pub reproduction_number: Estimate,
    pub new_last_7days: Option<i64>,
    pub incidence_sum7_1mio: Option<f64>,
    pub incidence_sum7_100k: Option<f64>,
    /// The configured weekly incidence limits, in cases for this population.
    pub weekly_incidence_limits: Vec<f64>,
    pub max_overall_prevalence_100k: f64,
    pub title: String,
    pub filename: String,
    pub link: String,
    pub area: Area,
}

impl RegionMetrics {

    /// Highest limit the last incidence sum has reached; none while the
    /// sum is undefined or below every limit.
    pub fn incidence_level(&self) -> Option<usize> {
	let sum = self.incidence_sums.last().copied().flatten()?;
	self.weekly_incidence_limits.iter().rposition(|limit| sum >= *limit)
    }

}


/// Everything a metrics build reads besides the region itself.
pub struct Sources<'a> {
    pub config: &'a EngineConfig,
    pub metadata: &'a MetadataTable,
    pub table: &'a DerivedTable,
    pub max_prevalence_100k: f64,
}

pub fn build(key: &RegionKey, sources: &Sources<'_>) -> Result<RegionMetrics> {

    let not_found = || Error::RegionNotFound(key.clone());
    if key.level() != sources.table.level {
	return Err(not_found());
    }

    let row = sources.table.get(key).ok_or_else(not_found)?;
    // districts without metadata have no population
    let population = row.population.ok_or_else(not_found)?;

    let (name, area) = match key {
	RegionKey::District(id) => {
	    let meta = sources.metadata.get(*id)?;
	    (meta.name.clone(), Area::District(DistrictInfo {
		id: *id,
		ags: id.to_string(),
		name_and_type: meta.name_and_type(),
		region_type: meta.region_type.clone(),
		federal_state: meta.parent.clone(),
		federal_state_population: meta.parent_population,
		federal_state_cases: meta.parent_cases,
		sources: sources_links(&meta.source_links),
	    }))
	},
	RegionKey::FederalState(_) => (row.name.clone(), Area::FederalState),
    };

    Ok(metrics(row, Region { name, population, area }, sources))

}


/// Identity of the region a metrics object is built for.
struct Region {
    name: String,
    population: u64,
    area: Area,
}

fn metrics(row: &DerivedRow, region: Region, sources: &Sources<'_>) -> RegionMetrics {

    let config = sources.config;
    let population = region.population as f64;
    let daily = rolling::daily(&row.cumulative);
    let total = row.total().unwrap_or(0);

    let incidence_sums = rolling::trailing_sum(&daily, config.incidence_window);
    let incidence_values = incidence_sums.iter()
	.map(|s| s.map(|s| (s * 100_000.0 / population * 100.0).round() / 100.0))
	.collect();

    let tc = temporal_center(&daily);
    let center_date = tc.index().and_then(|i| sources.table.dates.get(i).copied());

    let (title, filename, link) = display(&region, config);

    RegionMetrics {
	key: row.key.clone(),
	name: region.name,
	population: region.population,
	cumulative: row.cumulative.clone(),
	total,
	prevalence_1mio: total as f64 * 1e6 / population,
	prevalence_100k: total as f64 * 1e5 / population,
	rolling_mean_short: rolling::centered_mean(&daily, config.rolling_mean_windows.0),
	rolling_mean_long: rolling::centered_mean(&daily, config.rolling_mean_windows.1),
	incidence_sums,
	incidence_values,
	center: tc.center,
	center_date,
	reproduction_number: row.reproduction_number,
	new_last_7days: row.new_last_7days,
	incidence_sum7_1mio: row.new_last_7days.map(|n| n as f64 * 1e6 / population),
	incidence_sum7_100k: row.new_last_7days.map(|n| n as f64 * 1e5 / population),
	weekly_incidence_limits: config.weekly_incidence_limits_per_100k.iter()
	    .map(|limit| limit * population / 100_000.0).collect(),
	max_overall_prevalence_100k: sources.max_prevalence_100k,
	title,
	filename,
	link,
	area: region.area,
	daily,
    }

}


fn display(region: &Region, config: &EngineConfig) -> (String,String,String) {
    let name = &region.name;
    match &region.area {
	Area::District(info) => (
	    format!("{} ({} #{}, {}) Population={}", name, info.region_type.name(),
		    info.ags, info.federal_state, region.population),
	    format!("Kreis_{}.png", info.ags),
	    format!("<a title=\"{}\" href=\"Kreis_{}.html\">{} ({})</a>",
		    info.name_and_type, info.ags, name, info.region_type.abbreviation()),
	),
	Area::FederalState => (
	    format!("{} Population={}", name, region.population),
	    match *name == config.whole_region_name {
		true => format!("{}.png", unidecode(name)),
		false => format!("bundesland_{}.png", unidecode(name)),
	    },
	    format!("<a title=\"{name}\" href=\"{name}.html\">{name}</a>", name = name),
	),
    }
}

fn sources_links(urls: &[String]) -> String {
    match urls.is_empty() {
	true => "[unknown]".to_string(),
	false => urls.iter().enumerate().map(
	    |(i,url)| format!("<a href=\"{url}\" target=\"_blank\" title=\"{url}\">{}</a>",
			      i + 1, url = url)
	).collect::<Vec<_>>().join(", "),
    }
}
