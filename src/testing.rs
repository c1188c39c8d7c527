//! Fixtures shared by the unit tests.

use sea_orm::DatabaseConnection;

use crate::{
    catalog,
    db::connect_and_migrate,
    entities::movie,
    models::{MovieInput, MovieRecord},
};

pub async fn memory_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:").await.expect("in-memory database")
}

/// Builder for a movie row plus the lookup rows and links it needs.
pub struct MovieSeed {
    title: String,
    director: String,
    language: String,
    country: String,
    rating: String,
    gross: i64,
    imdb_score: f64,
    year: i32,
    actors: Vec<String>,
    genres: Vec<String>,
}

impl MovieSeed {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            director: "Jane Doe".to_string(),
            language: "English".to_string(),
            country: "USA".to_string(),
            rating: "PG-13".to_string(),
            gross: 1_000_000,
            imdb_score: 7.0,
            year: 2000,
            actors: Vec::new(),
            genres: Vec::new(),
        }
    }

    pub fn director(mut self, name: &str) -> Self {
        self.director = name.to_string();
        self
    }

    pub fn language(mut self, name: &str) -> Self {
        self.language = name.to_string();
        self
    }

    pub fn rating(mut self, rating: &str) -> Self {
        self.rating = rating.to_string();
        self
    }

    pub fn gross(mut self, gross: i64) -> Self {
        self.gross = gross;
        self
    }

    pub fn imdb_score(mut self, score: f64) -> Self {
        self.imdb_score = score;
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn actors(mut self, names: &[&str]) -> Self {
        self.actors = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn genres(mut self, names: &[&str]) -> Self {
        self.genres = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

pub async fn seed_movie(db: &DatabaseConnection, seed: MovieSeed) -> movie::Model {
    let (director, _) = catalog::get_or_create_director(db, &seed.director).await.unwrap();
    let (language, _) = catalog::get_or_create_language(db, &seed.language).await.unwrap();
    let (country, _) = catalog::get_or_create_country(db, &seed.country).await.unwrap();
    let (rating, _) = catalog::get_or_create_content_rating(db, &seed.rating).await.unwrap();

    let record = MovieRecord {
        title: seed.title,
        director_id: director.id,
        language_id: language.id,
        country_id: country.id,
        content_rating_id: rating.id,
        duration: 100,
        gross: seed.gross,
        budget: 500_000,
        year: seed.year,
        imdb_score: seed.imdb_score,
    };
    let movie = catalog::create_movie(db, &record).await.unwrap();

    for name in &seed.actors {
        let (actor, _) = catalog::get_or_create_actor(db, name).await.unwrap();
        catalog::link_actor(db, movie.id, actor.id).await.unwrap();
    }
    for name in &seed.genres {
        let (genre, _) = catalog::get_or_create_genre(db, name).await.unwrap();
        catalog::link_genre(db, movie.id, genre.id).await.unwrap();
    }

    movie
}

/// A valid record whose lookup rows exist but which is not yet inserted.
pub async fn lookup_record(db: &DatabaseConnection, title: &str) -> MovieRecord {
    let (director, _) = catalog::get_or_create_director(db, "Jane Doe").await.unwrap();
    let (language, _) = catalog::get_or_create_language(db, "English").await.unwrap();
    let (country, _) = catalog::get_or_create_country(db, "USA").await.unwrap();
    let (rating, _) = catalog::get_or_create_content_rating(db, "R").await.unwrap();

    MovieRecord {
        title: title.to_string(),
        director_id: director.id,
        language_id: language.id,
        country_id: country.id,
        content_rating_id: rating.id,
        duration: 95,
        gross: 10,
        budget: 20,
        year: 2010,
        imdb_score: 6.5,
    }
}

pub fn input_from(record: &MovieRecord, actors: Vec<i32>, genres: Vec<i32>) -> MovieInput {
    MovieInput {
        title: record.title.clone(),
        director_id: record.director_id,
        language_id: record.language_id,
        country_id: record.country_id,
        content_rating_id: record.content_rating_id,
        duration: record.duration,
        gross: record.gross,
        budget: record.budget,
        year: record.year,
        imdb_score: record.imdb_score,
        actors,
        genres,
    }
}
