use std::collections::BTreeMap;

use chrono::naive::NaiveDate;
use log::{info,warn};

use super::config::EngineConfig;
use super::error::{Result,Error};
use super::metadata::MetadataTable;
use super::table::{RawSeriesTable,RegionId,RegionKey};


/// Cumulative counts of one region together with its population.
#[derive(Clone,Debug,PartialEq)]
pub struct RegionSeries {
    pub key: RegionKey,
    pub name: String,
    /// Federal state of a district; none for federal states and for
    /// districts without metadata.
    pub parent: Option<String>,
    pub population: Option<u64>,
    pub cumulative: Vec<i64>,
}

#[derive(Clone,Debug,PartialEq)]
pub struct Aggregation {
    pub dates: Vec<NaiveDate>,
    pub districts: Vec<RegionSeries>,
    /// One row per federal state, then the whole country.
    pub federal_states: Vec<RegionSeries>,
    /// Identifiers of source rows left out for missing values.
    pub dropped: Vec<String>,
    /// Districts kept without metadata, outside every federal state.
    pub unmatched: Vec<RegionId>,
}


/// Left-joins the district rows with their metadata and sums the matched
/// ones up per federal state, plus one row for the whole country.
pub fn aggregate(raw: &RawSeriesTable, metadata: &MetadataTable,
		 config: &EngineConfig) -> Result<Aggregation> {

    let (rows, dropped) = raw.complete_rows();
    let days = raw.dates.len();

    let mut unmatched = Vec::new();
    let districts : Vec<RegionSeries> = rows.into_iter().map(|row| {
	let meta = metadata.get(row.id).ok();
	if meta.is_none() {
	    unmatched.push(row.id);
	}
	RegionSeries {
	    key: RegionKey::District(row.id),
	    name: row.name,
	    parent: meta.map(|m| m.parent.clone()),
	    population: meta.map(|m| m.population),
	    cumulative: row.cumulative,
	}
    }).collect();

    if !unmatched.is_empty() {
	warn!("{} districts without metadata left out of the federal states: {}",
	      unmatched.len(),
	      unmatched.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "));
    }

    let mut by_state : BTreeMap<&str,(u64,Vec<i64>)> = BTreeMap::new();
    for district in &districts {
	if let (Some(parent),Some(population)) = (&district.parent, district.population) {
	    let (sum, sums) = by_state.entry(parent.as_str())
		.or_insert_with(|| (0, vec![0; days]));
	    *sum += population;
	    add_to(sums, &district.cumulative);
	}
    }

    if by_state.contains_key(config.whole_region_name.as_str()) {
	return Err(Error::DuplicateRegion(config.whole_region_name.clone()));
    }

    let mut federal_states : Vec<RegionSeries> = by_state.into_iter().map(
	|(name,(population,cumulative))| RegionSeries {
	    key: RegionKey::FederalState(name.to_string()),
	    name: name.to_string(),
	    parent: None,
	    population: Some(population),
	    cumulative,
	}).collect();

    let mut population = 0;
    let mut cumulative = vec![0; days];
    for state in &federal_states {
	population += state.population.unwrap_or(0);
	add_to(&mut cumulative, &state.cumulative);
    }
    let whole = RegionSeries {
	key: RegionKey::FederalState(config.whole_region_name.clone()),
	name: config.whole_region_name.clone(),
	parent: None,
	population: Some(population),
	cumulative,
    };

    check_consistency(&whole, &districts, &federal_states, metadata, config);
    federal_states.push(whole);

    Ok(Aggregation { dates: raw.dates.clone(), districts, federal_states, dropped, unmatched })

}


fn add_to(sums: &mut [i64], values: &[i64]) {
    for (sum,value) in sums.iter_mut().zip(values) {
	*sum += value;
    }
}


/// Logs deviations of the aggregated totals from independently known ones.
fn check_consistency(whole: &RegionSeries, districts: &[RegionSeries],
		     federal_states: &[RegionSeries], metadata: &MetadataTable,
		     config: &EngineConfig) {

    let total = whole.population.unwrap_or(0);
    info!("consistency check, {} population: {}", whole.name, total);

    let mut direct = vec![0; whole.cumulative.len()];
    for district in districts.iter().filter(|d| d.population.is_some()) {
	add_to(&mut direct, &district.cumulative);
    }
    if direct != whole.cumulative {
	warn!("{} cumulative counts differ from the sum over the matched districts", whole.name);
    }

    if let Some(expected) = config.expected_total_population {
	if expected != total {
	    warn!("{} population {} differs from the expected {}", whole.name, total, expected);
	}
    }

    let stated = metadata.parent_populations();
    for state in federal_states {
	let summed = state.population.unwrap_or(0);
	match stated.get(state.name.as_str()) {
	    Some(&population) if population != 0 && population != summed =>
		warn!("population of {} sums to {} but is stated as {}",
		      state.name, summed, population),
	    _ => (),
	}
    }

}
