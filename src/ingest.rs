//! Bulk loader: CSV rows into the catalog, one transaction per row.

use std::{collections::HashSet, io, path::Path};

use jiff::Timestamp;
use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{catalog, error::CatalogError, models::MovieRecord};

pub const REQUIRED_COLUMNS: [&str; 14] = [
    "director_name",
    "language",
    "country",
    "content_rating",
    "movie_title",
    "duration",
    "gross",
    "budget",
    "title_year",
    "imdb_score",
    "actor_1_name",
    "actor_2_name",
    "actor_3_name",
    "genres",
];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to read csv header: {0}")]
    Header(#[from] csv::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<DbErr> for IngestError {
    fn from(err: DbErr) -> Self {
        Self::Catalog(CatalogError::from(err))
    }
}

/// One CSV record by column name. Absent and empty cells are `None`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawRow {
    pub director_name: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub content_rating: Option<String>,
    pub movie_title: Option<String>,
    pub duration: Option<String>,
    pub gross: Option<String>,
    pub budget: Option<String>,
    pub title_year: Option<String>,
    pub imdb_score: Option<String>,
    pub actor_1_name: Option<String>,
    pub actor_2_name: Option<String>,
    pub actor_3_name: Option<String>,
    pub genres: Option<String>,
}

/// A validated row, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieRow {
    pub director: String,
    pub language: String,
    pub country: String,
    pub content_rating: String,
    pub title: String,
    pub duration: i32,
    pub gross: i64,
    pub budget: i64,
    pub year: i32,
    pub imdb_score: f64,
    /// Distinct actor names in column order.
    pub actors: Vec<String>,
    /// Distinct, non-empty genre names in list order.
    pub genres: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("unreadable record: {0}")]
    Malformed(String),

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("{column} is not a valid number: {value:?}")]
    InvalidNumber { column: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowOutcome {
    pub movie_id: i32,
    pub actors_linked: usize,
    pub genres_linked: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RowDiagnostic {
    pub line: u64,
    pub title: Option<String>,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct IngestSummary {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub processed: usize,
    /// Rows dropped by validation.
    pub skipped: Vec<RowDiagnostic>,
    /// Rows rejected by the store and rolled back.
    pub failed: Vec<RowDiagnostic>,
}

fn required<'a>(column: &'static str, value: &'a Option<String>) -> Result<&'a str, SkipReason> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SkipReason::MissingField(column)),
    }
}

fn number<T: std::str::FromStr>(column: &'static str, value: &str) -> Result<T, SkipReason> {
    value
        .parse()
        .map_err(|_| SkipReason::InvalidNumber { column, value: value.to_string() })
}

fn distinct<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Checks presence of every required column, then coerces the numeric ones.
pub fn parse_row(raw: &RawRow) -> Result<MovieRow, SkipReason> {
    let director = required("director_name", &raw.director_name)?;
    let language = required("language", &raw.language)?;
    let country = required("country", &raw.country)?;
    let content_rating = required("content_rating", &raw.content_rating)?;
    let title = required("movie_title", &raw.movie_title)?;
    let duration = required("duration", &raw.duration)?;
    let gross = required("gross", &raw.gross)?;
    let budget = required("budget", &raw.budget)?;
    let year = required("title_year", &raw.title_year)?;
    let imdb_score = required("imdb_score", &raw.imdb_score)?;
    let actor_1 = required("actor_1_name", &raw.actor_1_name)?;
    let actor_2 = required("actor_2_name", &raw.actor_2_name)?;
    let actor_3 = required("actor_3_name", &raw.actor_3_name)?;
    let genres = required("genres", &raw.genres)?;

    let duration: i32 = number("duration", duration)?;
    if duration < 0 {
        return Err(SkipReason::InvalidNumber { column: "duration", value: duration.to_string() });
    }
    let score: f64 = number("imdb_score", imdb_score)?;
    if !score.is_finite() {
        return Err(SkipReason::InvalidNumber {
            column: "imdb_score",
            value: imdb_score.to_string(),
        });
    }

    Ok(MovieRow {
        director: director.to_string(),
        language: language.to_string(),
        country: country.to_string(),
        content_rating: content_rating.to_string(),
        title: title.to_string(),
        duration,
        gross: number("gross", gross)?,
        budget: number("budget", budget)?,
        year: number("title_year", year)?,
        imdb_score: score,
        actors: distinct([actor_1, actor_2, actor_3]),
        genres: distinct(genres.split('|')),
    })
}

/// Writes one validated row: lookups, the movie, then its actor and genre links.
pub async fn apply_row<C: ConnectionTrait>(
    db: &C,
    row: &MovieRow,
) -> Result<RowOutcome, CatalogError> {
    let (director, _) = catalog::get_or_create_director(db, &row.director).await?;
    let (language, _) = catalog::get_or_create_language(db, &row.language).await?;
    let (country, _) = catalog::get_or_create_country(db, &row.country).await?;
    let (rating, _) = catalog::get_or_create_content_rating(db, &row.content_rating).await?;

    let record = MovieRecord {
        title: row.title.clone(),
        director_id: director.id,
        language_id: language.id,
        country_id: country.id,
        content_rating_id: rating.id,
        duration: row.duration,
        gross: row.gross,
        budget: row.budget,
        year: row.year,
        imdb_score: row.imdb_score,
    };
    let movie = catalog::create_movie(db, &record).await?;

    for name in &row.actors {
        let (actor, _) = catalog::get_or_create_actor(db, name).await?;
        catalog::link_actor(db, movie.id, actor.id).await?;
    }
    for name in &row.genres {
        let (genre, _) = catalog::get_or_create_genre(db, name).await?;
        catalog::link_genre(db, movie.id, genre.id).await?;
    }

    Ok(RowOutcome {
        movie_id: movie.id,
        actors_linked: row.actors.len(),
        genres_linked: row.genres.len(),
    })
}

pub async fn load_file<C>(db: &C, path: &Path) -> Result<IngestSummary, IngestError>
where
    C: ConnectionTrait + TransactionTrait,
{
    info!(path = %path.display(), "loading movie data");
    let file = std::fs::File::open(path)
        .map_err(|source| IngestError::Io { path: path.display().to_string(), source })?;
    load_reader(db, file).await
}

/// Ingests every record of a CSV stream.
///
/// Validation failures skip the row. Uniqueness or foreign-key failures roll
/// the row back and are reported under `failed`. Any other store error aborts
/// the run.
pub async fn load_reader<C, R>(db: &C, input: R) -> Result<IngestSummary, IngestError>
where
    C: ConnectionTrait + TransactionTrait,
    R: io::Read,
{
    let started_at = Timestamp::now();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let title_column = headers.iter().position(|h| h == "movie_title");
    info!(headers = ?headers.iter().collect::<Vec<_>>(), "csv headers");
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            warn!(column, "required column absent from header, every row will be skipped");
        }
    }

    let mut summary = IngestSummary {
        started_at,
        finished_at: started_at,
        processed: 0,
        skipped: Vec::new(),
        failed: Vec::new(),
    };

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or_default();
                warn!(line, error = %err, "skipping unreadable record");
                summary.skipped.push(RowDiagnostic {
                    line,
                    title: None,
                    reason: SkipReason::Malformed(err.to_string()).to_string(),
                });
                continue;
            },
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let parsed = record
            .deserialize::<RawRow>(Some(&headers))
            .map_err(|err| SkipReason::Malformed(err.to_string()))
            .and_then(|raw| parse_row(&raw));

        let row = match parsed {
            Ok(row) => row,
            Err(reason) => {
                if let SkipReason::MissingField(_) = reason {
                    debug!(line, reason = %reason, "skipping incomplete row");
                } else {
                    warn!(line, reason = %reason, row = ?record, "skipping row");
                }
                summary.skipped.push(RowDiagnostic {
                    line,
                    title: title_column
                        .and_then(|i| record.get(i))
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                    reason: reason.to_string(),
                });
                continue;
            },
        };

        debug!(line, title = %row.title, director = %row.director, year = row.year, "processing row");

        let txn = db.begin().await?;
        match apply_row(&txn, &row).await {
            Ok(outcome) => {
                txn.commit().await?;
                summary.processed += 1;
                debug!(
                    line,
                    movie_id = outcome.movie_id,
                    actors = outcome.actors_linked,
                    genres = outcome.genres_linked,
                    "saved movie"
                );
            },
            Err(err @ (CatalogError::Conflict(_) | CatalogError::Integrity(_))) => {
                txn.rollback().await?;
                warn!(line, title = %row.title, error = %err, row = ?record, "row rejected by store");
                summary.failed.push(RowDiagnostic {
                    line,
                    title: Some(row.title.clone()),
                    reason: err.to_string(),
                });
            },
            Err(err) => return Err(err.into()),
        }
    }

    summary.finished_at = Timestamp::now();
    info!(
        processed = summary.processed,
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "finished loading movie data"
    );
    Ok(summary)
}
