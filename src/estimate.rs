use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize,Serializer};


/// Outcome of an estimator that may lack the data to produce a number.
///
/// `InsufficientHistory` means the series is too short for the requested
/// index, `Undefined` means the inputs were there but the formula has no
/// value (a zero denominator, an undefined input inside the window).
#[derive(Clone,Copy,Debug,PartialEq)]
pub enum Estimate {
    Defined(f64),
    InsufficientHistory,
    Undefined,
}

impl Estimate {

    /// Wraps a computed ratio, mapping non-finite results to `Undefined`.
    pub fn from_f64(value: f64) -> Self {
	match value.is_finite() {
	    true => Self::Defined(value),
	    false => Self::Undefined,
	}
    }

    pub fn value(&self) -> Option<f64> {
	match self {
	    Self::Defined(v) => Some(*v),
	    _ => None,
	}
    }

    pub fn is_defined(&self) -> bool {
	matches!(self, Self::Defined(_))
    }

    /// NaN for anything that is not defined, for numeric consumers.
    pub fn to_f64(&self) -> f64 {
	self.value().unwrap_or(f64::NAN)
    }

    pub fn map<F: FnOnce(f64) -> f64>(self, f: F) -> Self {
	match self {
	    Self::Defined(v) => Self::from_f64(f(v)),
	    other => other,
	}
    }

    /// Descending order with every undefined value after every defined one.
    pub fn cmp_descending(&self, other: &Self) -> Ordering {
	match (self.value(), other.value()) {
	    (Some(a),Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	    (Some(_),None) => Ordering::Less,
	    (None,Some(_)) => Ordering::Greater,
	    (None,None) => Ordering::Equal,
	}
    }

}

impl From<Option<f64>> for Estimate {
    fn from(value: Option<f64>) -> Self {
	value.map_or(Self::Undefined, Self::from_f64)
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	match self {
	    Self::Defined(v) => match f.precision() {
		Some(p) => write!(f, "{:.*}", p, v),
		None => write!(f, "{}", v),
	    },
	    Self::InsufficientHistory => write!(f, "n/a"),
	    Self::Undefined => write!(f, "-"),
	}
    }
}

impl Serialize for Estimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
	match self.value() {
	    Some(v) => serializer.serialize_f64(v),
	    None => serializer.serialize_none(),
	}
    }
}
