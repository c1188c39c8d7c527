use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};

use crate::{
    AppState, catalog,
    entities::{actor, director, movie},
    error::{ApiError, ApiResult},
    leaderboard::{self, ActorAppearances, DirectorGross, DirectorScore, DirectorVersatility},
    models::{MovieDetail, MovieFilter, MovieInput, NameFilter},
};

// Extractors whose rejections render as the API's JSON error body.

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct JsonBody<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
struct Path<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
struct Query<T>(T);

const ENDPOINTS: &[(&str, &str)] = &[
    ("GET", "/api/movies"),
    ("POST", "/api/movies"),
    ("GET", "/api/movies/{id}"),
    ("PUT", "/api/movies/{id}"),
    ("DELETE", "/api/movies/{id}"),
    ("GET", "/api/movies/top-grossing"),
    ("GET", "/api/movies/top-by-imdb"),
    ("GET", "/api/movies-by-genre/{genre}"),
    ("GET", "/api/directors"),
    ("GET", "/api/directors/top-by-gross"),
    ("GET", "/api/directors/top-by-imdb"),
    ("GET", "/api/directors/top-versatile"),
    ("GET", "/api/directors/{id}/actors"),
    ("GET", "/api/actors"),
];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api", get(index))
        .route("/api/movies", get(list_movies).post(create_movie))
        .route("/api/movies/top-grossing", get(top_grossing))
        .route("/api/movies/top-by-imdb", get(top_by_imdb))
        .route("/api/movies/{id}", get(get_movie).put(replace_movie).delete(delete_movie))
        .route("/api/movies-by-genre/{genre}", get(movies_by_genre))
        .route("/api/directors", get(list_directors))
        .route("/api/directors/top-by-gross", get(top_directors_by_gross))
        .route("/api/directors/top-by-imdb", get(top_directors_by_imdb))
        .route("/api/directors/top-versatile", get(top_versatile_directors))
        .route("/api/directors/{id}/actors", get(actors_with_director))
        .route("/api/actors", get(list_actors))
}

async fn index() -> Json<Value> {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|(method, path)| json!({ "method": method, "path": path }))
        .collect();
    Json(json!({ "endpoints": endpoints }))
}

async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovieFilter>,
) -> ApiResult<Json<Vec<movie::Model>>> {
    Ok(Json(catalog::list_movies(&state.db, &filter).await?))
}

async fn create_movie(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<MovieInput>,
) -> ApiResult<(StatusCode, Json<MovieDetail>)> {
    let detail = catalog::save_movie(&state.db, &input).await?;
    tracing::info!(id = detail.movie.id, title = %detail.movie.title, "movie created");
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<MovieDetail>> {
    Ok(Json(catalog::get_movie(&state.db, id).await?))
}

async fn replace_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    JsonBody(input): JsonBody<MovieInput>,
) -> ApiResult<Json<MovieDetail>> {
    let detail = catalog::replace_movie(&state.db, id, &input).await?;
    tracing::info!(id, "movie updated");
    Ok(Json(detail))
}

async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    catalog::delete_movie(&state.db, id).await?;
    tracing::info!(id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn top_grossing(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<movie::Model>>> {
    Ok(Json(leaderboard::top_grossing_movies(&state.db).await?))
}

async fn top_by_imdb(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<movie::Model>>> {
    Ok(Json(leaderboard::top_movies_by_imdb(&state.db).await?))
}

async fn movies_by_genre(
    State(state): State<Arc<AppState>>,
    Path(genre): Path<String>,
) -> ApiResult<Json<Vec<movie::Model>>> {
    Ok(Json(catalog::movies_by_genre(&state.db, &genre).await?))
}

async fn list_directors(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<NameFilter>,
) -> ApiResult<Json<Vec<director::Model>>> {
    Ok(Json(catalog::list_directors(&state.db, &filter).await?))
}

async fn top_directors_by_gross(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DirectorGross>>> {
    Ok(Json(leaderboard::top_directors_by_gross(&state.db).await?))
}

async fn top_directors_by_imdb(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DirectorScore>>> {
    Ok(Json(leaderboard::top_directors_by_imdb(&state.db).await?))
}

async fn top_versatile_directors(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DirectorVersatility>>> {
    Ok(Json(leaderboard::top_versatile_directors(&state.db).await?))
}

async fn actors_with_director(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Vec<ActorAppearances>>> {
    Ok(Json(leaderboard::actors_with_director(&state.db, id).await?))
}

async fn list_actors(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<NameFilter>,
) -> ApiResult<Json<Vec<actor::Model>>> {
    Ok(Json(catalog::list_actors(&state.db, &filter).await?))
}
