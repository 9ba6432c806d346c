use std::{io,num};

use chrono::naive::NaiveDate;
use thiserror::Error;

use super::table::RegionKey;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug,Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    IO(#[from] io::Error),
    #[error("CSV error: {0}")]
    CSV(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JSON(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    TOML(#[from] toml::de::Error),
    #[error("Integer parse error: {0}")]
    ParseInt(#[from] num::ParseIntError),
    #[error("Date parse error: {0}")]
    ParseDate(#[from] chrono::format::ParseError),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("Date columns out of order: {0} is followed by {1}")]
    UnorderedDates(NaiveDate,NaiveDate),
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("Duplicate region: {0}")]
    DuplicateRegion(String),
    #[error("Region not found: {0}")]
    RegionNotFound(RegionKey),
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("No data!")]
    MissingData,
}
