use std::str::FromStr;
use std::sync::Arc;

use strum::{AsRefStr,Display,EnumIter,EnumString};

use super::derived::{DerivedRow,DerivedTable};
use super::error::{Result,Error};
use super::estimate::Estimate;
use super::metrics::RegionMetrics;
use super::table::RegionKey;


/// Columns a table or a set of metrics can be ranked by.
#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash,AsRefStr,Display,EnumIter,EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RankMetric {
    NewCases,
    #[strum(serialize = "new_last_7days")]
    NewLast7Days,
    #[strum(serialize = "new_last_14days")]
    NewLast14Days,
    #[strum(serialize = "incidence_1mio_last_7days")]
    Incidence1MioLast7Days,
    #[strum(serialize = "incidence_1mio_last_14days")]
    Incidence1MioLast14Days,
    #[strum(serialize = "prevalence_1mio")]
    Prevalence1Mio,
    TemporalCenter,
    ReproductionNumber,
    Population,
}

impl RankMetric {

    pub fn parse(name: &str) -> Result<Self> {
	Self::from_str(name.trim()).map_err(|_| Error::UnknownMetric(name.to_string()))
    }

    pub fn of_row(&self, row: &DerivedRow) -> Estimate {
	match self {
	    Self::NewCases => row.new_cases.map(|v| v as f64).into(),
	    Self::NewLast7Days => row.new_last_7days.map(|v| v as f64).into(),
	    Self::NewLast14Days => row.new_last_14days.map(|v| v as f64).into(),
	    Self::Incidence1MioLast7Days => row.incidence_1mio_last_7days.into(),
	    Self::Incidence1MioLast14Days => row.incidence_1mio_last_14days.into(),
	    Self::Prevalence1Mio => row.prevalence_1mio.into(),
	    Self::TemporalCenter => row.temporal_center,
	    Self::ReproductionNumber => row.reproduction_number,
	    Self::Population => row.population.map(|p| p as f64).into(),
	}
    }

    pub fn of_metrics(&self, metrics: &RegionMetrics) -> Estimate {
	let new_since = |days: usize| -> Estimate {
	    let c = &metrics.cumulative;
	    c.len().checked_sub(days + 1)
		.map_or(Estimate::InsufficientHistory,
			|i| Estimate::Defined((c[c.len() - 1] - c[i]) as f64))
	};
	let per_1mio = |e: Estimate| e.map(|v| v * 1e6 / metrics.population as f64);
	match self {
	    Self::NewCases => new_since(1),
	    Self::NewLast7Days => metrics.new_last_7days.map(|v| v as f64).into(),
	    Self::NewLast14Days => new_since(14),
	    Self::Incidence1MioLast7Days => metrics.incidence_sum7_1mio.into(),
	    Self::Incidence1MioLast14Days => per_1mio(new_since(14)),
	    Self::Prevalence1Mio => Estimate::from_f64(metrics.prevalence_1mio),
	    Self::TemporalCenter => metrics.center,
	    Self::ReproductionNumber => metrics.reproduction_number,
	    Self::Population => Estimate::Defined(metrics.population as f64),
	}
    }

}


/// Stable descending sort of `items` by `value`; undefined values go last
/// and ties keep their input order.
pub fn rank_by<T,F>(items: &[T], value: F) -> Vec<&T>
where F: Fn(&T) -> Estimate {
    let mut ranked : Vec<(Estimate,&T)> = items.iter().map(|item| (value(item), item)).collect();
    ranked.sort_by(|a,b| a.0.cmp_descending(&b.0));
    ranked.into_iter().map(|(_,item)| item).collect()
}

/// Region keys of a derived table, best first.
pub fn rank_table(table: &DerivedTable, metric: RankMetric) -> Vec<RegionKey> {
    rank_by(&table.rows, |row| metric.of_row(row)).into_iter()
	.map(|row| row.key.clone())
	.collect()
}

/// Region keys of built metrics, best first.
pub fn rank_metrics(metrics: &[Arc<RegionMetrics>], metric: RankMetric) -> Vec<RegionKey> {
    rank_by(metrics, |m| metric.of_metrics(m)).into_iter()
	.map(|m| m.key.clone())
	.collect()
}
