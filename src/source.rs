//! CSV readers for the case-count and district-metadata files.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use encoding_rs::mem::decode_latin1;
use log::info;

use super::error::{Result,Error};
use super::metadata::{MetadataTable,RegionMetadata,RegionType};
use super::table::{RawSeriesTable,RegionId};


pub const METADATA_ID: &str = "AGS";
pub const METADATA_NAME: &str = "GEN";
pub const METADATA_TYPE: &str = "BEZ";
pub const METADATA_POPULATION: &str = "Population";
pub const METADATA_PARENT: &str = "Bundesland";
pub const METADATA_PARENT_POPULATION: &str = "Population_Bundesland";
pub const METADATA_PARENT_CASES: &str = "Infections_Bundesland";
pub const METADATA_SOURCES: &str = "Sources";


/// The files are UTF-8 when exported by hand, Latin-1 when exported by
/// the spreadsheet.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
	Ok(text) => Cow::Borrowed(text),
	Err(_) => decode_latin1(bytes),
    }
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
	.flexible(true)
	.trim(csv::Trim::All)
	.from_reader(text.as_bytes())
}


pub fn read_series(path: &Path) -> Result<RawSeriesTable> {
    let table = parse_series(&fs::read(path)?)?;
    info!("read {} rows over {} dates from {}", table.rows.len(), table.dates.len(),
	  path.display());
    Ok(table)
}

pub fn parse_series(bytes: &[u8]) -> Result<RawSeriesTable> {
    let text = decode(bytes);
    let mut reader = reader(&text);
    let header : Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let records = reader.records()
	.map(|r| -> Result<Vec<String>> { Ok(r?.iter().map(String::from).collect()) })
	.collect::<Result<Vec<_>>>()?;
    RawSeriesTable::from_records(&header, records)
}


pub fn read_metadata(path: &Path) -> Result<MetadataTable> {
    let table = parse_metadata(&fs::read(path)?)?;
    info!("read metadata of {} districts from {}", table.len(), path.display());
    Ok(table)
}

pub fn parse_metadata(bytes: &[u8]) -> Result<MetadataTable> {

    let text = decode(bytes);
    let mut reader = reader(&text);
    let header = reader.headers()?.clone();

    let column = |name: &str| header.iter().position(|h| h == name)
	.ok_or_else(|| Error::MissingColumn(name.to_string()));
    let id = column(METADATA_ID)?;
    let name = column(METADATA_NAME)?;
    let region_type = column(METADATA_TYPE)?;
    let population = column(METADATA_POPULATION)?;
    let parent = column(METADATA_PARENT)?;
    let parent_population = column(METADATA_PARENT_POPULATION)?;
    let parent_cases = column(METADATA_PARENT_CASES)?;
    let sources = column(METADATA_SOURCES).ok();

    let rows = reader.records().map(|record| -> Result<RegionMetadata> {
	let record = record?;
	let cell = |i: usize| record.get(i).unwrap_or("");
	let id = RegionId::parse(cell(id))?;
	Ok(RegionMetadata {
	    id,
	    name: cell(name).to_string(),
	    region_type: RegionType(cell(region_type).to_string()),
	    population: count(id, METADATA_POPULATION, cell(population))?,
	    parent: cell(parent).to_string(),
	    parent_population: count(id, METADATA_PARENT_POPULATION, cell(parent_population))?,
	    parent_cases: count(id, METADATA_PARENT_CASES, cell(parent_cases))?,
	    source_links: sources.map_or_else(Vec::new, |i| split_links(cell(i))),
	})
    }).collect::<Result<Vec<_>>>()?;

    MetadataTable::new(rows)

}


/// Non-negative whole number; spreadsheet exports write these as `1234.0`.
fn count(id: RegionId, column: &str, cell: &str) -> Result<u64> {
    cell.parse::<u64>().ok()
	.or_else(|| cell.parse::<f64>().ok()
		 .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
		 .map(|v| v as u64))
	.ok_or_else(|| Error::InvalidMetadata(format!(
	    "{} of {} is not a count: {:?}", column, id, cell)))
}

fn split_links(cell: &str) -> Vec<String> {
    cell.split(|c: char| c == ';' || c.is_whitespace())
	.filter(|s| !s.is_empty())
	.map(String::from)
	.collect()
}


#[cfg(test)]
mod tests {

    use super::*;

    const METADATA: &str = "\
AGS,GEN,BEZ,Population,Bundesland,Population_Bundesland,Infections_Bundesland,Sources
1001,Flensburg,Kreisfreie Stadt,89504,Schleswig-Holstein,2896712,3105,https://a.example https://b.example
5370,Heinsberg,Kreis,254322.0,Nordrhein-Westfalen,17932651,36590,
";

    #[test]
    fn reads_series_with_footer() {
	let csv = "AGS,ADMIN,05.03.2020,06.03.2020\n\
		   01001,Flensburg,0,1\n\
		   05370,Heinsberg,200,250\n\
		   (c) Risklayer,,\n";
	let table = parse_series(csv.as_bytes()).unwrap();
	assert_eq!(table.dates.len(), 2);
	assert_eq!(table.rows.len(), 3);
	let (complete, dropped) = table.complete_rows();
	assert_eq!(complete.len(), 2);
	assert_eq!(complete[1].cumulative, vec![200, 250]);
	assert_eq!(dropped, vec!["(c) Risklayer".to_string()]);
    }

    #[test]
    fn reads_metadata() {
	let table = parse_metadata(METADATA.as_bytes()).unwrap();
	let flensburg = table.get(RegionId(1001)).unwrap();
	assert_eq!(flensburg.region_type.abbreviation(), "KS");
	assert_eq!(flensburg.parent_population, 2_896_712);
	assert_eq!(flensburg.source_links.len(), 2);
	let heinsberg = table.get(RegionId(5370)).unwrap();
	assert_eq!(heinsberg.population, 254_322);
	assert!(heinsberg.source_links.is_empty());
    }

    #[test]
    fn latin1_names_are_decoded() {
	let mut bytes = b"AGS,GEN,BEZ,Population,Bundesland,Population_Bundesland,Infections_Bundesland\n\
			  9162,M".to_vec();
	bytes.push(0xfc);
	bytes.extend_from_slice(b"nchen,Kreisfreie Stadt,1484226,Bayern,13124737,44000\n");
	let table = parse_metadata(&bytes).unwrap();
	assert_eq!(table.get(RegionId(9162)).unwrap().name, "München");
    }

    #[test]
    fn metadata_columns_are_required() {
	let csv = "AGS,GEN,BEZ,Population,Bundesland\n1001,Flensburg,Kreisfreie Stadt,89504,SH\n";
	assert!(matches!(parse_metadata(csv.as_bytes()),
			 Err(Error::MissingColumn(c)) if c == METADATA_PARENT_POPULATION));
    }

    #[test]
    fn population_must_be_a_count() {
	let csv = METADATA.replace("89504", "n/a");
	assert!(matches!(parse_metadata(csv.as_bytes()), Err(Error::InvalidMetadata(_))));
    }

}
