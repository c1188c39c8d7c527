use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "moviehub")]
#[command(about = "Movie catalog with CSV ingestion and leaderboards", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serves the HTML pages and the JSON API
    Serve,

    /// Loads a movie CSV into the catalog
    Load {
        /// CSV file to ingest (defaults to MOVIE_DATA_PATH)
        path: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_path_is_optional() {
        let cli = Cli::try_parse_from(["moviehub", "load"]).unwrap();
        assert!(matches!(cli.command, Commands::Load { path: None }));

        let cli = Cli::try_parse_from(["moviehub", "load", "data/movies.csv"]).unwrap();
        match cli.command {
            Commands::Load { path } => assert_eq!(path, Some(PathBuf::from("data/movies.csv"))),
            Commands::Serve => panic!("expected load"),
        }
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["moviehub"]).is_err());
    }
}
