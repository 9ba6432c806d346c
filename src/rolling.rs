//! Rolling-window statistics over day-indexed sequences.
//!
//! `None` marks an undefined position. A window that reaches outside the
//! series or covers an undefined value yields `None`; partial windows are
//! never averaged.


pub type Sequence = Vec<Option<f64>>;


/// Differences between consecutive cumulative counts. The first position
/// has nothing to diff against and is undefined.
pub fn daily(cumulative: &[i64]) -> Sequence {
    (0..cumulative.len()).map(
	|i| match i {
	    0 => None,
	    i => Some((cumulative[i] - cumulative[i-1]) as f64),
	}
    ).collect()
}

/// Sets negative values (retroactive corrections) to zero.
pub fn clip_negative(data: &[Option<f64>]) -> Sequence {
    data.iter().map(|v| v.map(|v| v.max(0.0))).collect()
}

pub fn to_values(data: &[i64]) -> Sequence {
    data.iter().map(|v| Some(*v as f64)).collect()
}

fn window_sum(data: &[Option<f64>], start: usize, end: usize) -> Option<f64> {
    data[start..=end].iter().try_fold(0.0, |sum,v| v.map(|v| sum + v))
}

/// Sum of positions `i-w+1 ..= i`.
pub fn trailing_sum(data: &[Option<f64>], window: usize) -> Sequence {
    (0..data.len()).map(
	|i| match window > 0 && i + 1 >= window {
	    false => None,
	    true => window_sum(data, i + 1 - window, i),
	}
    ).collect()
}

pub fn trailing_mean(data: &[Option<f64>], window: usize) -> Sequence {
    trailing_sum(data, window).into_iter()
	.map(|s| s.map(|s| s / window as f64))
	.collect()
}

/// Mean of positions `i-⌊w/2⌋ ..= i+⌊(w-1)/2⌋`.
///
/// For odd windows this is symmetric around `i`; for even windows the
/// extra position lies before `i`.
pub fn centered_mean(data: &[Option<f64>], window: usize) -> Sequence {
    let before = window / 2;
    let after = window.saturating_sub(1) / 2;
    (0..data.len()).map(
	|i| match window > 0 && i >= before && i + after < data.len() {
	    false => None,
	    true => window_sum(data, i - before, i + after).map(|s| s / window as f64),
	}
    ).collect()
}


#[cfg(test)]
mod tests {

    use super::*;

    fn some(values: &[f64]) -> Sequence {
	values.iter().map(|v| Some(*v)).collect()
    }

    #[test]
    fn daily_starts_undefined() {
	assert_eq!(daily(&[0, 1, 3, 6]), vec![None, Some(1.0), Some(2.0), Some(3.0)]);
	assert!(daily(&[]).is_empty());
    }

    #[test]
    fn daily_keeps_corrections() {
	assert_eq!(daily(&[5, 4]), vec![None, Some(-1.0)]);
	assert_eq!(clip_negative(&daily(&[5, 4])), vec![None, Some(0.0)]);
    }

    #[test]
    fn trailing_sum_needs_a_full_window() {
	let sums = trailing_sum(&some(&[1.0, 2.0, 3.0, 4.0]), 3);
	assert_eq!(sums, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn undefined_input_poisons_the_window() {
	let sums = trailing_sum(&daily(&[0, 1, 3, 6, 10]), 3);
	assert_eq!(sums, vec![None, None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn centered_mean_odd_window() {
	let means = centered_mean(&some(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
	assert_eq!(means, vec![None, Some(2.0), Some(3.0), Some(4.0), None]);
    }

    #[test]
    fn centered_mean_even_window_leans_back() {
	let means = centered_mean(&some(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]), 4);
	assert_eq!(means, vec![None, None, Some(1.5), Some(2.5), Some(3.5), None]);
    }

    #[test]
    fn window_longer_than_series() {
	assert!(centered_mean(&some(&[1.0, 2.0]), 7).iter().all(Option::is_none));
	assert!(trailing_mean(&some(&[1.0, 2.0]), 7).iter().all(Option::is_none));
    }

}
