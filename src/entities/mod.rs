pub mod actor;
pub mod content_rating;
pub mod country;
pub mod director;
pub mod genre;
pub mod language;
pub mod movie;
pub mod movie_actor;
pub mod movie_genre;
