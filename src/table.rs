use std::fmt;

use chrono::naive::NaiveDate;
use log::{info,warn};
use serde::{Serialize,Deserialize};

use super::error::{Result,Error};


pub const DATE_FORMAT: &str = "%d.%m.%Y";
pub const ID_COLUMN: &str = "AGS";
pub const NAME_COLUMN: &str = "ADMIN";


/// Numeric district identifier (AGS), displayed zero-padded to 5 digits.
#[derive(Clone,Copy,Debug,PartialEq,Eq,PartialOrd,Ord,Hash,Serialize,Deserialize)]
pub struct RegionId(pub u32);

impl RegionId {
    pub fn parse(raw: &str) -> Result<Self> {
	Ok(Self(raw.trim().parse()?))
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	write!(f, "{:05}", self.0)
    }
}


#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash,Serialize)]
pub enum Level {
    District,
    FederalState,
}

impl Level {
    pub fn name(&self) -> &'static str {
	match self {
	    Self::District => "district",
	    Self::FederalState => "federal state",
	}
    }
}


/// A region at either aggregation level.
#[derive(Clone,Debug,PartialEq,Eq,Hash,Serialize)]
pub enum RegionKey {
    District(RegionId),
    FederalState(String),
}

impl RegionKey {
    pub fn level(&self) -> Level {
	match self {
	    Self::District(_) => Level::District,
	    Self::FederalState(_) => Level::FederalState,
	}
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	match self {
	    Self::District(id) => write!(f, "district {}", id),
	    Self::FederalState(name) => write!(f, "federal state {}", name),
	}
    }
}


#[derive(Clone,Debug,PartialEq)]
pub enum ColumnKind {
    Id,
    Name,
    Date(NaiveDate),
}

#[derive(Clone,Debug,PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column layout of a case-count table: id, name, then strictly
/// ascending dates.
#[derive(Clone,Debug,PartialEq)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {

    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self> {

	let mut names = header.iter().map(|h| h.as_ref().trim());

	let mut columns = Vec::new();
	for (expected,kind) in [(ID_COLUMN, ColumnKind::Id), (NAME_COLUMN, ColumnKind::Name)] {
	    match names.next() {
		Some(name) if name == expected =>
		    columns.push(Column { name: name.to_string(), kind }),
		Some(name) => return Err(Error::MalformedHeader(format!(
		    "expected column {} but found {}", expected, name))),
		None => return Err(Error::MissingColumn(expected.to_string())),
	    }
	}

	for name in names {
	    let date = NaiveDate::parse_from_str(name, DATE_FORMAT)?;
	    if let Some(ColumnKind::Date(prev)) = columns.last().map(|c| &c.kind) {
		if *prev >= date {
		    return Err(Error::UnorderedDates(*prev, date));
		}
	    }
	    columns.push(Column { name: name.to_string(), kind: ColumnKind::Date(date) });
	}

	if columns.len() == 2 {
	    return Err(Error::MissingData);
	}

	Ok(Self { columns })

    }

    pub fn dates(&self) -> Vec<NaiveDate> {
	self.columns.iter().filter_map(|c| match c.kind {
	    ColumnKind::Date(date) => Some(date),
	    _ => None,
	}).collect()
    }

}


#[derive(Clone,Debug,PartialEq)]
pub struct RawSeriesRow {
    pub key: String,
    pub name: String,
    pub counts: Vec<Option<i64>>,
}

/// A district row with every date present and a numeric id.
#[derive(Clone,Debug,PartialEq)]
pub struct SeriesRow {
    pub id: RegionId,
    pub name: String,
    pub cumulative: Vec<i64>,
}

/// Cumulative case counts per district and date, as supplied.
#[derive(Clone,Debug,PartialEq)]
pub struct RawSeriesTable {
    pub schema: Schema,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<RawSeriesRow>,
}

impl RawSeriesTable {

    /// Builds the table from a header and string records. Empty or
    /// unparsable count cells become missing values; a record of the wrong
    /// width is padded with missing values.
    pub fn from_records<S: AsRef<str>>(header: &[S], records: Vec<Vec<String>>) -> Result<Self> {

	let schema = Schema::from_header(header)?;
	let dates = schema.dates();

	let rows = records.into_iter().map(|record| {
	    let mut cells = record.into_iter();
	    let key = cells.next().unwrap_or_default().trim().to_string();
	    let name = cells.next().unwrap_or_default().trim().to_string();
	    let mut counts : Vec<Option<i64>> = cells.take(dates.len())
		.map(|c| parse_count(&c)).collect();
	    counts.resize(dates.len(), None);
	    RawSeriesRow { key, name, counts }
	}).collect();

	Ok(Self { schema, dates, rows })

    }

    /// Rows with every count present and a numeric id. The identifiers of
    /// the other rows (footers, notes, malformed ids) are returned
    /// separately, in source order.
    pub fn complete_rows(&self) -> (Vec<SeriesRow>,Vec<String>) {

	let mut complete = Vec::new();
	let mut dropped = Vec::new();
	let mut incomplete = 0;

	for row in &self.rows {
	    let counts : Option<Vec<i64>> = row.counts.iter().copied().collect();
	    match (RegionId::parse(&row.key), counts) {
		(Ok(id),Some(cumulative)) => complete.push(SeriesRow {
		    id, name: row.name.clone(), cumulative
		}),
		(_,None) => {
		    incomplete += 1;
		    dropped.push(row.key.clone());
		},
		(Err(_),Some(_)) => dropped.push(row.key.clone()),
	    }
	}

	let bad = self.bad_identifiers();
	if !bad.is_empty() {
	    warn!("dropped {} complete rows with a malformed district id: {:?}", bad.len(), bad);
	}
	if incomplete > 0 {
	    info!("dropped {} incomplete rows", incomplete);
	}

	(complete, dropped)

    }

    /// Identifiers of rows that have every count but no valid district id.
    /// Unlike footers these are likely data errors.
    pub fn bad_identifiers(&self) -> Vec<&str> {
	self.rows.iter()
	    .filter(|row| row.counts.iter().all(Option::is_some))
	    .filter(|row| RegionId::parse(&row.key).is_err())
	    .map(|row| row.key.as_str())
	    .collect()
    }

    /// Rows whose display name contains `fragment`.
    pub fn find_regions(&self, fragment: &str) -> Vec<&RawSeriesRow> {
	self.rows.iter().filter(|r| r.name.contains(fragment)).collect()
    }

}


fn parse_count(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>().ok().or_else(
	|| cell.parse::<f64>().ok()
	    .filter(|v| v.is_finite() && v.fract() == 0.0)
	    .map(|v| v as i64))
}
