use std::io;
use std::fs::File;
use std::path::{Path,PathBuf};

use clap::Parser;
use log::{info,warn};
use serde_json::json;

use covid19_regional_metrics::{source,Engine,EngineConfig,Error,Level,RankMetric,RegionKey,Result};


#[derive(Parser)]
#[command(name = "covid19-regional-metrics", about = "Derived metrics of regional case counts")]
struct Cli {
    /// Cumulative cases per district: AGS, ADMIN, then one column per date
    #[arg(long)]
    series: PathBuf,
    /// District metadata: AGS, GEN, BEZ, Population, Bundesland, ...
    #[arg(long)]
    metadata: PathBuf,
    /// TOML file overriding the engine defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Metric to rank the districts by
    #[arg(long, default_value = "new_last_7days")]
    rank: String,
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Write both derived tables here as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}


fn main() -> Result<()> {

    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
	Some(path) => EngineConfig::load(path)?,
	None => EngineConfig::default(),
    };
    let metric = RankMetric::parse(&cli.rank)?;

    let raw = source::read_series(&cli.series)?;
    let metadata = source::read_metadata(&cli.metadata)?;
    let engine = Engine::new(&raw, metadata, config)?;

    let states : Vec<RegionKey> = engine.table(Level::FederalState).rows.iter()
	.map(|row| row.key.clone()).collect();
    report(&engine, "federal states", &states)?;
    report(&engine, &format!("top {} districts by {}", cli.top, metric),
	   &engine.rank(Level::District, metric, Some(cli.top)))?;

    if let Some(path) = &cli.json {
	write_json(&engine, path)?;
    }

    Ok(())

}


fn report(engine: &Engine, title: &str, keys: &[RegionKey]) -> Result<()> {
    info!("{}:", title);
    for key in keys {
	match engine.get_region_metrics(key) {
	    Ok(m) => info!("{:<30} total {:>8}  7 days/100k {:>8.1}  Reff {:>5}  center {}",
			   m.name, m.total, m.incidence_sum7_100k.unwrap_or(f64::NAN),
			   format!("{:.2}", m.reproduction_number),
			   m.center_date.map_or_else(|| "-".to_string(), |d| d.to_string())),
	    Err(Error::RegionNotFound(key)) => warn!("skipping {}: no metadata", key),
	    Err(err) => return Err(err),
	}
    }
    Ok(())
}


fn write_json(engine: &Engine, path: &Path) -> Result<()> {
    let data = json!({
	"date": engine.table(Level::District).last_date(),
	"districts": engine.table(Level::District),
	"federal_states": engine.table(Level::FederalState),
    });
    serde_json::to_writer(io::BufWriter::new(File::create(path)?), &data)?;
    info!("wrote {}", path.display());
    Ok(())
}
