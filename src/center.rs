use log::warn;

use super::estimate::Estimate;


#[derive(Clone,Debug,PartialEq)]
pub struct TemporalCenter {
    /// Count-weighted mean day, indexing the original sequence.
    pub center: Estimate,
    /// Zero except for a spike of a quarter of the maximum at the rounded
    /// center, for plotting alongside the daily cases.
    pub signal: Vec<f64>,
}

impl TemporalCenter {
    /// Position of the center in the original sequence.
    pub fn index(&self) -> Option<usize> {
	self.center.value().map(|c| c.round() as usize)
    }
}


/// The "expectation day" of a daily-cases sequence.
///
/// The first element has no predecessor and is dropped; the remaining
/// values are weighted by their 1-based position, which equals their index
/// in the original sequence. Undefined entries do not contribute. A zero
/// weight sum has no center.
pub fn temporal_center(daily: &[Option<f64>]) -> TemporalCenter {

    let mut signal = vec![0.0; daily.len()];
    let values = daily.iter().enumerate().skip(1)
	.filter_map(|(i,v)| v.map(|v| (i,v)));

    let (productsum, sum, max) = values.fold(
	(0.0, 0.0, f64::NEG_INFINITY),
	|(p,s,m),(i,v)| (p + v * i as f64, s + v, m.max(v)));

    if sum == 0.0 {
	return TemporalCenter { center: Estimate::Undefined, signal };
    }

    let last = daily.len() - 1;
    let mut center = productsum / sum;

    if center < 0.0 {
	warn!("temporal center index negative = {:.2}", center);
	center = 0.0;
    }
    if center.round() as usize > last {
	warn!("temporal center index {:.2} beyond last day {}", center, last);
	center = last as f64;
    }

    signal[center.round() as usize] = max * 0.25;

    TemporalCenter { center: Estimate::from_f64(center), signal }

}
