use std::path::PathBuf;

use clap::Parser;
use database::{DatabaseConnectionInfo, PgDatabase, DEFAULT_DATABASE_URL};
use importer::{collect_batches, import_all, Source};
use model::establishment::{GAS_STATION, PHARMACY};

/// Loads GeoJSON establishment data into the database, replacing the
/// establishments of every imported category.
#[derive(Debug, Parser)]
#[command(name = "geoconsulta-import", version)]
struct Args {
    /// GeoJSON file with pharmacies.
    #[arg(long, value_name = "PATH")]
    pharmacies: Option<PathBuf>,

    /// GeoJSON file with gas stations.
    #[arg(long, value_name = "PATH")]
    gas_stations: Option<PathBuf>,

    /// Additional source of any other category.
    #[arg(long = "source", value_name = "CATEGORY=PATH")]
    sources: Vec<Source>,

    /// Database connection string.
    #[arg(long, env = "DATABASE_URL")]
    db_url: Option<String>,
}

impl Args {
    fn sources(&self) -> Vec<Source> {
        let flagged = [(PHARMACY, &self.pharmacies), (GAS_STATION, &self.gas_stations)];
        flagged
            .into_iter()
            .filter_map(|(category, path)| {
                path.as_ref().map(|path| Source::new(category, path.clone()))
            })
            .chain(self.sources.iter().cloned())
            .collect()
    }

    fn connection_info(&self) -> DatabaseConnectionInfo {
        self.db_url
            .as_deref()
            .map(DatabaseConnectionInfo::from_url)
            .or_else(DatabaseConnectionInfo::from_env)
            .unwrap_or_else(|| DatabaseConnectionInfo::from_url(DEFAULT_DATABASE_URL))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let batches = collect_batches(&args.sources()).await;

    let database = PgDatabase::connect(&args.connection_info())
        .await
        .map_err(|why| anyhow::anyhow!("could not connect to database: {}", why))?;

    let summary = import_all(&database, &batches).await?;
    for (category, inserted) in &summary.by_category {
        log::info!("{}: {} establishments", category, inserted);
    }
    log::info!("import finished, {} establishments in total", summary.inserted);

    Ok(())
}
