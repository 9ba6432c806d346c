//! Effective reproduction number estimates from daily new cases.
//!
//! `reff_4_7` is the published estimator: the mean of the last 7 days
//! divided by the mean of the 7 days ending 4 days earlier, 4 days being
//! taken as one generation interval. `reff_4_4` and `reff_7_4` only serve
//! to cross-check it.

use serde::Serialize;

use super::config::EngineConfig;
use super::estimate::Estimate;
use super::rolling::{self,Sequence};


fn window_mean(data: &[Option<f64>], end: usize, window: usize) -> Option<f64> {
    data[end + 1 - window..=end].iter()
	.try_fold(0.0, |sum,v| v.map(|v| sum + v))
	.map(|sum| sum / window as f64)
}

fn ratio(now: Option<f64>, before: Option<f64>) -> Estimate {
    match (now, before) {
	(Some(now),Some(before)) if before != 0.0 => Estimate::from_f64(now / before),
	_ => Estimate::Undefined,
    }
}

fn last_index(len: usize, index: Option<usize>) -> Option<usize> {
    match index {
	Some(i) => Some(i),
	None => len.checked_sub(1),
    }
}


/// First index at which `reproduction_number` can be defined: both
/// windows, `lag` days apart, must fit.
pub fn first_index(lag: usize, window: usize) -> Option<usize> {
    (lag + window).checked_sub(1).filter(|_| window > 0)
}

/// Ratio of the trailing `window`-day mean at `index` to the one `lag`
/// days earlier. Negative daily values are clipped to zero first.
/// `index` defaults to the last day.
pub fn reproduction_number(daily: &[Option<f64>], index: Option<usize>,
			   lag: usize, window: usize) -> Estimate {

    let i = match last_index(daily.len(), index) {
	Some(i) if i < daily.len() => i,
	_ => return Estimate::InsufficientHistory,
    };
    match first_index(lag, window) {
	Some(first) if i >= first => (),
	_ => return Estimate::InsufficientHistory,
    }

    let d = rolling::clip_negative(daily);
    ratio(window_mean(&d, i, window), window_mean(&d, i - lag, window))

}

/// `reproduction_number` with the configured lag and window (4 and 7).
pub fn reff_4_7(daily: &[Option<f64>], index: Option<usize>, config: &EngineConfig) -> Estimate {
    reproduction_number(daily, index, config.reff_lag, config.reff_window)
}

/// Sum of the last 4 days over the sum of the 4 days before.
pub fn reff_4_4(daily: &[Option<f64>], index: Option<usize>) -> Estimate {
    match last_index(daily.len(), index) {
	Some(i) if i >= 7 && i < daily.len() =>
	    ratio(window_mean(daily, i, 4), window_mean(daily, i - 4, 4)),
	_ => Estimate::InsufficientHistory,
    }
}

/// Weekly growth of the cumulative count, rescaled by the power 4/7 to a
/// 4-day generation interval.
pub fn reff_7_4(cumulative: &[i64], index: Option<usize>) -> Estimate {
    match last_index(cumulative.len(), index) {
	Some(i) if i >= 14 && i < cumulative.len() => {
	    let c = cumulative;
	    let now = (c[i] - c[i-7]) as f64;
	    let before = (c[i-7] - c[i-14]) as f64;
	    ratio(Some(now), Some(before)).map(|r| r.powf(4.0 / 7.0))
	},
	_ => Estimate::InsufficientHistory,
    }
}


/// The published estimator next to the alternatives, at every day.
#[derive(Clone,Debug,Serialize)]
pub struct ReffComparison {
    pub reff_4_4: Vec<Estimate>,
    pub reff_4_7: Vec<Estimate>,
    pub reff_4_4_smoothed: Vec<Estimate>,
    pub reff_7_4: Vec<Estimate>,
}

impl ReffComparison {

    pub fn new(cumulative: &[i64], config: &EngineConfig) -> Self {
	let daily = rolling::daily(cumulative);
	let smoothed : Sequence = rolling::centered_mean(&daily, 7);
	let days = 0..cumulative.len();
	Self {
	    reff_4_4: days.clone().map(|i| reff_4_4(&daily, Some(i))).collect(),
	    reff_4_7: days.clone().map(|i| reff_4_7(&daily, Some(i), config)).collect(),
	    reff_4_4_smoothed: days.clone().map(|i| reff_4_4(&smoothed, Some(i))).collect(),
	    reff_7_4: days.map(|i| reff_7_4(cumulative, Some(i))).collect(),
	}
    }

}
