use anyhow::Context;
use database::PgDatabase;
use web::{config::Config, start_web_server, WebState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.default_log_filter()),
    )
    .init();
    log::debug!("{:?}", config);

    // database
    let database = PgDatabase::connect(&config.database)
        .await
        .map_err(|why| anyhow::anyhow!("could not connect to database: {}", why))?;

    // web server
    start_web_server(
        config.address(),
        WebState::new(database, config.development),
    )
    .await
    .context("web server failed")?;

    Ok(())
}
