use std::sync::Arc;

use log::info;

use super::aggregate::aggregate;
use super::cache::MetricsCache;
use super::config::EngineConfig;
use super::derived::DerivedTable;
use super::error::{Result,Error};
use super::metadata::MetadataTable;
use super::metrics::{self,RegionMetrics,Sources};
use super::rank::{self,RankMetric};
use super::reproduction::ReffComparison;
use super::rolling::{self,Sequence};
use super::table::{Level,RawSeriesTable,RegionId,RegionKey};


/// Derived tables of both aggregation levels and the metrics built from
/// them on request.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    metadata: MetadataTable,
    dropped: Vec<String>,
    unmatched: Vec<RegionId>,
    districts: DerivedTable,
    federal_states: DerivedTable,
    /// Peer maxima of the prevalence per 100,000, per level.
    max_prevalence_100k: (f64,f64),
    cache: MetricsCache,
}

impl Engine {

    pub fn new(raw: &RawSeriesTable, metadata: MetadataTable, config: EngineConfig) -> Result<Self> {

	config.validate()?;

	let aggregation = aggregate(raw, &metadata, &config)?;
	let districts = DerivedTable::new(Level::District, aggregation.dates.clone(),
					  aggregation.districts, &config);
	let federal_states = DerivedTable::new(Level::FederalState, aggregation.dates,
					       aggregation.federal_states, &config);

	info!("derived {} districts and {} federal states up to {}",
	      districts.rows.len(), federal_states.rows.len(),
	      districts.last_date().map_or_else(|| "-".to_string(), |d| d.to_string()));

	Ok(Self {
	    config,
	    metadata,
	    dropped: aggregation.dropped,
	    unmatched: aggregation.unmatched,
	    max_prevalence_100k: (districts.max_prevalence_100k(),
				  federal_states.max_prevalence_100k()),
	    districts,
	    federal_states,
	    cache: MetricsCache::new(),
	})

    }

    pub fn config(&self) -> &EngineConfig {
	&self.config
    }

    pub fn metadata(&self) -> &MetadataTable {
	&self.metadata
    }

    /// Source rows left out for missing values.
    pub fn dropped(&self) -> &[String] {
	&self.dropped
    }

    /// Districts without metadata. They keep their series but belong to no
    /// federal state and have no metrics.
    pub fn unmatched(&self) -> &[RegionId] {
	&self.unmatched
    }

    /// Derived table of a level, ordered by descending temporal center.
    pub fn table(&self, level: Level) -> &DerivedTable {
	match level {
	    Level::District => &self.districts,
	    Level::FederalState => &self.federal_states,
	}
    }

    pub fn cache(&self) -> &MetricsCache {
	&self.cache
    }

    /// Built on the first request for `key`, shared afterwards.
    pub fn get_region_metrics(&self, key: &RegionKey) -> Result<Arc<RegionMetrics>> {
	let level = key.level();
	let sources = Sources {
	    config: &self.config,
	    metadata: &self.metadata,
	    table: self.table(level),
	    max_prevalence_100k: match level {
		Level::District => self.max_prevalence_100k.0,
		Level::FederalState => self.max_prevalence_100k.1,
	    },
	};
	self.cache.get_or_build(key, || metrics::build(key, &sources))
    }

    pub fn district(&self, id: RegionId) -> Result<Arc<RegionMetrics>> {
	self.get_region_metrics(&RegionKey::District(id))
    }

    pub fn federal_state(&self, name: &str) -> Result<Arc<RegionMetrics>> {
	self.get_region_metrics(&RegionKey::FederalState(name.to_string()))
    }

    /// Drops every built metrics object.
    pub fn reset_cache(&self) {
	self.cache.reset();
    }

    pub fn cumulative(&self, key: &RegionKey) -> Result<&[i64]> {
	self.table(key.level()).get(key)
	    .map(|row| row.cumulative.as_slice())
	    .ok_or_else(|| Error::RegionNotFound(key.clone()))
    }

    pub fn daily(&self, key: &RegionKey) -> Result<Sequence> {
	Ok(rolling::daily(self.cumulative(key)?))
    }

    pub fn reff_comparison(&self, key: &RegionKey) -> Result<ReffComparison> {
	Ok(ReffComparison::new(self.cumulative(key)?, &self.config))
    }

    /// Keys of a level ranked by `metric`, cut to the first `top` if given.
    pub fn rank(&self, level: Level, metric: RankMetric, top: Option<usize>) -> Vec<RegionKey> {
	let mut ranked = rank::rank_table(self.table(level), metric);
	if let Some(n) = top {
	    ranked.truncate(n);
	}
	ranked
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::estimate::Estimate;
    use crate::metadata::district;
    use crate::table::{ID_COLUMN,NAME_COLUMN};
    use std::thread;

    fn raw(rows: &[(&str, Vec<i64>)]) -> RawSeriesTable {
	let days = rows.first().map_or(0, |(_,c)| c.len());
	let header : Vec<String> = vec![ID_COLUMN.to_string(), NAME_COLUMN.to_string()].into_iter()
	    .chain((0..days).map(|d| format!("{:02}.04.2020", d + 1)))
	    .collect();
	let records : Vec<Vec<String>> = rows.iter().map(|(key,counts)| {
	    vec![key.to_string(), format!("District {}", key)].into_iter()
		.chain(counts.iter().map(|c| c.to_string()))
		.collect()
	}).collect();
	RawSeriesTable::from_records(&header, records).unwrap()
    }

    fn engine() -> Engine {
	let raw = raw(&[("01001", (0..15).map(|i| i * i).collect()),
			("01002", (0..15).map(|i| 2 * i).collect()),
			("02000", vec![0; 15])]);
	let metadata = MetadataTable::new(vec![
	    district(1001, "Flensburg", 100_000, "Schleswig-Holstein"),
	    district(1002, "Kiel", 100_000, "Schleswig-Holstein"),
	    district(2000, "Hamburg", 200_000, "Hamburg"),
	]).unwrap();
	Engine::new(&raw, metadata, EngineConfig::default()).unwrap()
    }

    #[test]
    fn metrics_are_built_once() {
	let engine = engine();
	let a = engine.district(RegionId(1001)).unwrap();
	let b = engine.district(RegionId(1001)).unwrap();
	assert!(Arc::ptr_eq(&a, &b));
	assert_eq!(engine.cache().builds(), 1);

	engine.reset_cache();
	let c = engine.district(RegionId(1001)).unwrap();
	assert_eq!(*a, *c);
	assert_eq!(engine.cache().builds(), 1);
    }

    #[test]
    fn federal_state_metrics() {
	let engine = engine();
	let sh = engine.federal_state("Schleswig-Holstein").unwrap();
	assert_eq!(sh.population, 200_000);
	assert_eq!(sh.total, 196 + 28);
	assert_eq!(sh.max_overall_prevalence_100k, 112.0);
	let de = engine.federal_state("Deutschland").unwrap();
	assert_eq!(de.population, 400_000);
	assert_eq!(de.total, 224);
    }

    #[test]
    fn unknown_regions_are_not_found() {
	let engine = engine();
	assert!(matches!(engine.district(RegionId(11006)), Err(Error::RegionNotFound(_))));
	assert!(matches!(engine.federal_state("Bayern"), Err(Error::RegionNotFound(_))));
	assert!(engine.cache().is_empty());
    }

    #[test]
    fn district_without_metadata_keeps_its_series() {
	let raw = raw(&[("01001", vec![0, 1, 2]), ("11006", vec![5, 6, 9])]);
	let metadata = MetadataTable::new(vec![
	    district(1001, "Flensburg", 100_000, "Schleswig-Holstein")]).unwrap();
	let engine = Engine::new(&raw, metadata, EngineConfig::default()).unwrap();

	let berlin = RegionKey::District(RegionId(11006));
	assert_eq!(engine.unmatched(), &[RegionId(11006)]);
	assert_eq!(engine.cumulative(&berlin).unwrap(), &[5, 6, 9]);
	assert_eq!(engine.rank(Level::District, RankMetric::Population, None).last(), Some(&berlin));
	assert!(matches!(engine.get_region_metrics(&berlin), Err(Error::RegionNotFound(_))));
	assert!(engine.district(RegionId(1001)).is_ok());
	assert_eq!(engine.federal_state("Deutschland").unwrap().total, 2);
    }

    #[test]
    fn default_order_and_ranking() {
	let engine = engine();
	let districts = engine.table(Level::District);
	assert_eq!(districts.rows.last().map(|r| r.temporal_center), Some(Estimate::Undefined));
	assert_eq!(engine.rank(Level::District, RankMetric::NewLast7Days, Some(2)),
		   vec![RegionKey::District(RegionId(1001)), RegionKey::District(RegionId(1002))]);
	assert_eq!(engine.rank(Level::FederalState, RankMetric::Population, None)[0],
		   RegionKey::FederalState("Deutschland".to_string()));
    }

    #[test]
    fn built_metrics_rank_like_the_table() {
	let engine = engine();
	let built : Vec<Arc<RegionMetrics>> = districts_of(&engine).iter()
	    .map(|key| engine.get_region_metrics(key).unwrap())
	    .collect();
	for metric in [RankMetric::NewCases, RankMetric::NewLast7Days, RankMetric::Prevalence1Mio,
		       RankMetric::TemporalCenter, RankMetric::Incidence1MioLast14Days] {
	    assert_eq!(rank::rank_metrics(&built, metric),
		       engine.rank(Level::District, metric, None), "{}", metric);
	}
    }

    fn districts_of(engine: &Engine) -> Vec<RegionKey> {
	engine.table(Level::District).rows.iter().map(|r| r.key.clone()).collect()
    }

    #[test]
    fn series_helpers() {
	let engine = engine();
	let key = RegionKey::District(RegionId(1002));
	assert_eq!(engine.cumulative(&key).unwrap()[14], 28);
	assert_eq!(engine.daily(&key).unwrap()[1], Some(2.0));
	let comparison = engine.reff_comparison(&key).unwrap();
	assert_eq!(comparison.reff_4_7[14], Estimate::Defined(1.0));
	assert_eq!(comparison.reff_4_7[5], Estimate::InsufficientHistory);
    }

    #[test]
    fn parallel_requests_share_builds() {
	let engine = engine();
	let keys = [RegionKey::District(RegionId(1001)), RegionKey::District(RegionId(1002)),
		    RegionKey::FederalState("Hamburg".to_string())];
	thread::scope(|scope| {
	    for _ in 0..4 {
		for key in &keys {
		    let engine = &engine;
		    scope.spawn(move || engine.get_region_metrics(key).unwrap());
		}
	    }
	});
	assert_eq!(engine.cache().builds(), keys.len());
    }

}
