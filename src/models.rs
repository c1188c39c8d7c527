use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{
    entities::{actor, content_rating, country, director, genre, language, movie},
    error::{CatalogError, CatalogResult},
};

/// Scalar columns and foreign keys of a movie row.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub director_id: i32,
    pub language_id: i32,
    pub country_id: i32,
    pub content_rating_id: i32,
    pub duration: i32,
    pub gross: i64,
    pub budget: i64,
    pub year: i32,
    pub imdb_score: f64,
}

/// Body of the movie create/update API calls.
#[derive(Clone, Debug, Deserialize)]
pub struct MovieInput {
    pub title: String,
    pub director_id: i32,
    pub language_id: i32,
    pub country_id: i32,
    pub content_rating_id: i32,
    pub duration: i32,
    pub gross: i64,
    pub budget: i64,
    pub year: i32,
    pub imdb_score: f64,
    #[serde(default)]
    pub actors: Vec<i32>,
    #[serde(default)]
    pub genres: Vec<i32>,
}

impl MovieInput {
    pub fn validate(&self) -> CatalogResult<()> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::validation("title", "must not be blank"));
        }
        if self.duration < 0 {
            return Err(CatalogError::validation("duration", "must not be negative"));
        }
        Ok(())
    }

    pub fn record(&self) -> MovieRecord {
        MovieRecord {
            title: self.title.trim().to_string(),
            director_id: self.director_id,
            language_id: self.language_id,
            country_id: self.country_id,
            content_rating_id: self.content_rating_id,
            duration: self.duration,
            gross: self.gross,
            budget: self.budget,
            year: self.year,
            imdb_score: self.imdb_score,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: movie::Model,
    pub director: director::Model,
    pub language: language::Model,
    pub country: country::Model,
    pub content_rating: content_rating::Model,
    pub actors: Vec<actor::Model>,
    pub genres: Vec<genre::Model>,
}

impl From<&MovieDetail> for MovieInput {
    fn from(detail: &MovieDetail) -> Self {
        let movie = &detail.movie;
        Self {
            title: movie.title.clone(),
            director_id: movie.director_id,
            language_id: movie.language_id,
            country_id: movie.country_id,
            content_rating_id: movie.content_rating_id,
            duration: movie.duration,
            gross: movie.gross,
            budget: movie.budget,
            year: movie.year,
            imdb_score: movie.imdb_score,
            actors: detail.actors.iter().map(|a| a.id).collect(),
            genres: detail.genres.iter().map(|g| g.id).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Movie browse filters. Text filters other than `initial` and `q` match exactly.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieFilter {
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub initial: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub content_rating: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub actor: Option<String>,
}

/// Director and actor browse filters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NameFilter {
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub initial: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub q: Option<String>,
}

// Browse forms submit every field, so `year=` has to mean "no filter".
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> MovieInput {
        serde_json::from_value(serde_json::json!({
            "title": "  Heat ",
            "director_id": 1,
            "language_id": 1,
            "country_id": 1,
            "content_rating_id": 1,
            "duration": 170,
            "gross": 67436818,
            "budget": 60000000,
            "year": 1995,
            "imdb_score": 8.3
        }))
        .unwrap()
    }

    #[test]
    fn movie_input_defaults_link_lists_and_trims_title() {
        let input = input();
        assert!(input.actors.is_empty());
        assert!(input.genres.is_empty());
        assert_eq!(input.record().title, "Heat");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut input = input();
        input.title = "   ".into();
        let err = input.validate().unwrap_err();
        assert!(matches!(err, CatalogError::Validation { field: "title", .. }));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut input = input();
        input.duration = -1;
        assert!(matches!(
            input.validate().unwrap_err(),
            CatalogError::Validation { field: "duration", .. }
        ));
    }

    #[test]
    fn empty_query_values_mean_no_filter() {
        let filter: MovieFilter =
            serde_json::from_value(serde_json::json!({ "year": "", "genre": " ", "order": "desc" }))
                .unwrap();
        assert_eq!(filter.year, None);
        assert_eq!(filter.genre, None);
        assert_eq!(filter.order, SortOrder::Desc);
    }

    #[test]
    fn year_filter_parses_numbers() {
        let filter: MovieFilter =
            serde_json::from_value(serde_json::json!({ "year": "1999" })).unwrap();
        assert_eq!(filter.year, Some(1999));
        assert_eq!(filter.order, SortOrder::Asc);
    }
}
