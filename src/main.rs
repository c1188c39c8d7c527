mod api;
mod catalog;
mod cli;
mod config;
mod db;
mod entities;
mod error;
mod ingest;
mod leaderboard;
mod models;
mod routes;
mod templates;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::Parser;
use sea_orm::DatabaseConnection;

use crate::{
    cli::{Cli, Commands},
    config::Config,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,moviehub=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = db::connect_and_migrate(&config.database_url).await?;

    match cli.command {
        Commands::Serve => {
            let app = routes::router(Arc::new(AppState { db }));

            let listener = tokio::net::TcpListener::bind(config.addr).await?;
            tracing::info!(addr = %config.addr, "listening");
            axum::serve(listener, app).await?;
        },
        Commands::Load { path } => {
            let path = path.unwrap_or(config.movie_data_path);
            let summary = ingest::load_file(&db, &path).await?;
            tracing::info!(
                path = %path.display(),
                elapsed_secs = summary.finished_at.duration_since(summary.started_at).as_secs_f64(),
                "load finished"
            );
        },
    }

    Ok(())
}
