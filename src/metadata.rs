use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Serialize,Deserialize};

use super::error::{Result,Error};
use super::table::{RegionId,RegionKey};


lazy_static! {
    static ref ABBREVIATIONS: HashMap<&'static str,&'static str> = vec![
	("Kreis", "KR"),
	("Kreisfreie Stadt", "KS"),
	("Landkreis", "LK"),
	("Stadtkreis", "SK"),
    ].into_iter().collect();
}


/// Kind of district ("Bezeichnung"), as given by the metadata source.
#[derive(Clone,Debug,PartialEq,Eq,Serialize,Deserialize)]
#[serde(transparent)]
pub struct RegionType(pub String);

impl RegionType {

    pub fn name(&self) -> &str {
	&self.0
    }

    /// Short code for known types, the full name otherwise.
    pub fn abbreviation(&self) -> &str {
	ABBREVIATIONS.get(self.0.as_str()).copied().unwrap_or(self.0.as_str())
    }

}


#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct RegionMetadata {
    pub id: RegionId,
    pub name: String,
    pub region_type: RegionType,
    pub population: u64,
    pub parent: String,
    pub parent_population: u64,
    pub parent_cases: u64,
    pub source_links: Vec<String>,
}

impl RegionMetadata {

    /// `"<name>_<type abbreviation>"`, e.g. `Heinsberg_KR`.
    pub fn name_and_type(&self) -> String {
	format!("{}_{}", self.name, self.region_type.abbreviation())
    }

}


/// District metadata, one row per district id.
#[derive(Clone,Debug,Default)]
pub struct MetadataTable {
    rows: HashMap<RegionId,RegionMetadata>,
}

impl MetadataTable {

    pub fn new(rows: Vec<RegionMetadata>) -> Result<Self> {
	let mut table = HashMap::with_capacity(rows.len());
	for row in rows {
	    if row.population == 0 {
		return Err(Error::InvalidMetadata(format!(
		    "population of {} must be positive", row.id)));
	    }
	    let id = row.id;
	    if table.insert(id, row).is_some() {
		return Err(Error::DuplicateRegion(id.to_string()));
	    }
	}
	Ok(Self { rows: table })
    }

    pub fn get(&self, id: RegionId) -> Result<&RegionMetadata> {
	self.rows.get(&id).ok_or_else(|| Error::RegionNotFound(RegionKey::District(id)))
    }

    pub fn len(&self) -> usize {
	self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
	self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionMetadata> {
	self.rows.values()
    }

    /// Population per federal state, as stated by the metadata source.
    pub fn parent_populations(&self) -> HashMap<&str,u64> {
	self.rows.values().map(|r| (r.parent.as_str(), r.parent_population)).collect()
    }

}


#[cfg(test)]
pub(crate) fn district(id: u32, name: &str, population: u64, parent: &str) -> RegionMetadata {
    RegionMetadata {
	id: RegionId(id),
	name: name.to_string(),
	region_type: RegionType("Landkreis".to_string()),
	population,
	parent: parent.to_string(),
	parent_population: 0,
	parent_cases: 0,
	source_links: vec![],
    }
}
