mod api;
mod dashboard;
mod database;
mod interpreter;
mod settings;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::{
    database::Database,
    settings::{Args, Settings},
    web::Tls,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = Settings::from_file(&args.config)
        .with_context(|| format!("cannot load settings from {}", args.config.display()))?;
    let database = Database::connect(&settings.database.path)?;
    info!("Using database at {}", database.path().display());

    if let Some(text) = args.query {
        let presentation =
            tokio::task::spawn_blocking(move || api::consult(&database, &text)).await?;
        println!("{}", serde_json::to_string_pretty(&presentation)?);
        return Ok(());
    }

    let tls = args.cert.zip(args.key).map(|(cert, key)| Tls { cert, key });
    web::serve(api::schema(database), settings.web.address, tls).await;
    Ok(())
}
