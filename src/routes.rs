use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRequest, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState, api, catalog,
    error::{AppError, AppResult, CatalogError, CatalogResult},
    leaderboard,
    models::{MovieFilter, MovieInput, NameFilter},
    templates::{self, BrowseOptions, EditorChoices},
};

/// Urlencoded form body; repeated keys (`actors=1&actors=2`) collect into a `Vec`.
#[derive(FromRequest)]
#[from_request(via(axum_extra::extract::Form), rejection(AppError))]
pub struct MovieForm<T>(T);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/movies", get(movies))
        .route("/movies/top-grossing", get(top_grossing))
        .route("/movies/top-by-imdb", get(top_by_imdb))
        .route("/movies/new", get(new_movie).post(create_movie))
        .route("/movies/{id}", get(movie))
        .route("/movies/{id}/edit", get(edit_movie).post(update_movie))
        .route("/movies/{id}/delete", get(confirm_delete).post(delete_movie))
        .route("/directors", get(directors))
        .route("/directors/top-by-gross", get(top_directors_by_gross))
        .route("/directors/top-by-imdb", get(top_directors_by_imdb))
        .route("/directors/top-versatile", get(top_versatile_directors))
        .route("/directors/{id}/actors", get(director_actors))
        .route("/actors", get(actors))
        .merge(api::routes())
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn index(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let movies = catalog::count_movies(&state.db).await?;
    let countries = catalog::list_countries(&state.db).await?.len();
    Ok(Html(templates::index_page(movies, countries)))
}

pub async fn movies(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovieFilter>,
) -> AppResult<Html<String>> {
    let movies = catalog::list_movies(&state.db, &filter).await?;
    let options = BrowseOptions {
        genres: catalog::list_genres(&state.db).await?,
        years: catalog::list_years(&state.db).await?,
        content_ratings: catalog::list_content_ratings(&state.db).await?,
        languages: catalog::list_languages(&state.db).await?,
    };
    Ok(Html(templates::movie_list_page(&movies, &filter, &options)))
}

pub async fn movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let detail = catalog::get_movie(&state.db, id).await?;
    Ok(Html(templates::movie_detail_page(&detail)))
}

async fn editor_choices(db: &DatabaseConnection) -> CatalogResult<EditorChoices> {
    Ok(EditorChoices {
        directors: catalog::list_directors(db, &NameFilter::default()).await?,
        languages: catalog::list_languages(db).await?,
        countries: catalog::list_countries(db).await?,
        content_ratings: catalog::list_content_ratings(db).await?,
        actors: catalog::list_actors(db, &NameFilter::default()).await?,
        genres: catalog::list_genres(db).await?,
    })
}

// Input the user can correct re-renders the form instead of an error page.
fn correctable(err: &CatalogError) -> bool {
    matches!(
        err,
        CatalogError::Validation { .. } | CatalogError::Integrity(_) | CatalogError::Conflict(_)
    )
}

async fn form_with_error(
    db: &DatabaseConnection,
    heading: &str,
    action: &str,
    input: &MovieInput,
    err: &CatalogError,
) -> AppResult<Response> {
    let choices = editor_choices(db).await?;
    let body =
        templates::movie_form_page(heading, action, Some(input), &choices, Some(&err.to_string()));
    Ok((StatusCode::BAD_REQUEST, Html(body)).into_response())
}

pub async fn new_movie(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let choices = editor_choices(&state.db).await?;
    Ok(Html(templates::movie_form_page("Add movie", "/movies/new", None, &choices, None)))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    MovieForm(input): MovieForm<MovieInput>,
) -> AppResult<Response> {
    match catalog::save_movie(&state.db, &input).await {
        Ok(detail) => {
            tracing::info!(id = detail.movie.id, title = %detail.movie.title, "movie created");
            Ok(Redirect::to(&format!("/movies/{}", detail.movie.id)).into_response())
        },
        Err(err) if correctable(&err) => {
            form_with_error(&state.db, "Add movie", "/movies/new", &input, &err).await
        },
        Err(err) => Err(err.into()),
    }
}

pub async fn edit_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let detail = catalog::get_movie(&state.db, id).await?;
    let choices = editor_choices(&state.db).await?;
    let values = MovieInput::from(&detail);
    Ok(Html(templates::movie_form_page(
        &format!("Edit {}", detail.movie.title),
        &format!("/movies/{id}/edit"),
        Some(&values),
        &choices,
        None,
    )))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    MovieForm(input): MovieForm<MovieInput>,
) -> AppResult<Response> {
    match catalog::replace_movie(&state.db, id, &input).await {
        Ok(_) => {
            tracing::info!(id, "movie updated");
            Ok(Redirect::to(&format!("/movies/{id}")).into_response())
        },
        Err(err) if correctable(&err) => {
            let action = format!("/movies/{id}/edit");
            form_with_error(&state.db, "Edit movie", &action, &input, &err).await
        },
        Err(err) => Err(err.into()),
    }
}

pub async fn confirm_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let detail = catalog::get_movie(&state.db, id).await?;
    Ok(Html(templates::movie_delete_page(&detail.movie)))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    catalog::delete_movie(&state.db, id).await?;
    tracing::info!(id, "movie deleted");
    Ok(Redirect::to("/movies"))
}

pub async fn directors(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<NameFilter>,
) -> AppResult<Html<String>> {
    let directors = catalog::list_directors(&state.db, &filter).await?;
    Ok(Html(templates::director_list_page(&directors, &filter)))
}

pub async fn actors(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<NameFilter>,
) -> AppResult<Html<String>> {
    let actors = catalog::list_actors(&state.db, &filter).await?;
    Ok(Html(templates::actor_list_page(&actors, &filter)))
}

pub async fn top_grossing(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let movies = leaderboard::top_grossing_movies(&state.db).await?;
    Ok(Html(templates::movie_board_page("Top grossing movies", &movies)))
}

pub async fn top_by_imdb(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let movies = leaderboard::top_movies_by_imdb(&state.db).await?;
    Ok(Html(templates::movie_board_page("Top movies by IMDb score", &movies)))
}

pub async fn top_directors_by_gross(
    State(state): State<Arc<AppState>>,
) -> AppResult<Html<String>> {
    let rows = leaderboard::top_directors_by_gross(&state.db).await?;
    Ok(Html(templates::director_gross_page(&rows)))
}

pub async fn top_directors_by_imdb(
    State(state): State<Arc<AppState>>,
) -> AppResult<Html<String>> {
    let rows = leaderboard::top_directors_by_imdb(&state.db).await?;
    Ok(Html(templates::director_score_page(&rows)))
}

pub async fn top_versatile_directors(
    State(state): State<Arc<AppState>>,
) -> AppResult<Html<String>> {
    let rows = leaderboard::top_versatile_directors(&state.db).await?;
    Ok(Html(templates::versatility_page(&rows)))
}

pub async fn director_actors(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let director = catalog::get_director(&state.db, id).await?;
    let rows = leaderboard::actors_with_director(&state.db, id).await?;
    Ok(Html(templates::actors_with_director_page(&director, &rows)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{self, MovieSeed};

    async fn page(state: &Arc<AppState>, uri: &str) -> (StatusCode, String) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post_form(state: &Arc<AppState>, uri: &str, body: String) -> (StatusCode, String, String) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, location, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn form_body(record: &crate::models::MovieRecord, actors: &[i32], genres: &[i32]) -> String {
        let mut fields = vec![
            format!("title={}", urlencoding::encode(&record.title)),
            format!("director_id={}", record.director_id),
            format!("language_id={}", record.language_id),
            format!("country_id={}", record.country_id),
            format!("content_rating_id={}", record.content_rating_id),
            format!("duration={}", record.duration),
            format!("gross={}", record.gross),
            format!("budget={}", record.budget),
            format!("year={}", record.year),
            format!("imdb_score={}", record.imdb_score),
        ];
        fields.extend(actors.iter().map(|id| format!("actors={id}")));
        fields.extend(genres.iter().map(|id| format!("genres={id}")));
        fields.join("&")
    }

    #[tokio::test]
    async fn pages_render_seeded_catalog() {
        let state = Arc::new(AppState { db: testing::memory_db().await });
        let movie = testing::seed_movie(
            &state.db,
            MovieSeed::new("Arrival")
                .director("Denis Villeneuve")
                .actors(&["Amy Adams"])
                .genres(&["Sci-Fi"])
                .year(2016),
        )
        .await;

        let (status, body) = page(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Leaderboards"));
        assert!(body.contains("1 movies from 1 countries"));

        let (status, body) = page(&state, "/movies?genre=Sci-Fi&year=").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Arrival"));
        assert!(body.contains(r#"<option value="2016">2016</option>"#));

        let (_, body) = page(&state, &format!("/movies/{}", movie.id)).await;
        assert!(body.contains("Amy Adams"));
        assert!(body.contains("/movies?actor=Amy%20Adams"));

        let (_, body) = page(&state, "/directors/top-versatile").await;
        assert!(body.contains("Denis Villeneuve"));

        let (_, body) = page(&state, &format!("/directors/{}/actors", movie.director_id)).await;
        assert!(body.contains("Actors who worked with Denis Villeneuve"));
    }

    #[tokio::test]
    async fn missing_movie_renders_error_page() {
        let state = Arc::new(AppState { db: testing::memory_db().await });

        let (status, body) = page(&state, "/movies/12").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("movie 12 not found"));
    }

    #[tokio::test]
    async fn new_movie_form_lists_choices() {
        let state = Arc::new(AppState { db: testing::memory_db().await });
        testing::seed_movie(&state.db, MovieSeed::new("Heat").actors(&["Al Pacino"])).await;

        let (status, body) = page(&state, "/movies/new").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"action="/movies/new""#));
        assert!(body.contains("Jane Doe"));
        assert!(body.contains("Al Pacino"));
    }

    #[tokio::test]
    async fn create_form_saves_and_redirects_to_detail() {
        let state = Arc::new(AppState { db: testing::memory_db().await });
        let record = testing::lookup_record(&state.db, "New Movie").await;
        let (first, _) = catalog::get_or_create_actor(&state.db, "Ana").await.unwrap();
        let (second, _) = catalog::get_or_create_actor(&state.db, "Ben").await.unwrap();
        let (genre, _) = catalog::get_or_create_genre(&state.db, "Drama").await.unwrap();

        let (status, location, _) = post_form(
            &state,
            "/movies/new",
            form_body(&record, &[first.id, second.id], &[genre.id]),
        )
        .await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        let movies = catalog::list_movies(&state.db, &MovieFilter::default()).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(location, format!("/movies/{}", movies[0].id));
        let detail = catalog::get_movie(&state.db, movies[0].id).await.unwrap();
        assert_eq!(detail.actors.len(), 2);
        assert_eq!(detail.genres[0].name, "Drama");
    }

    #[tokio::test]
    async fn create_form_with_blank_title_rerenders_form() {
        let state = Arc::new(AppState { db: testing::memory_db().await });
        let mut record = testing::lookup_record(&state.db, "x").await;
        record.title = " ".to_string();

        let (status, _, body) = post_form(&state, "/movies/new", form_body(&record, &[], &[])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("must not be blank"));
        assert!(body.contains(r#"action="/movies/new""#));
        assert_eq!(catalog::count_movies(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unparseable_form_is_bad_request() {
        let state = Arc::new(AppState { db: testing::memory_db().await });

        let (status, _, _) = post_form(&state, "/movies/new", "title=Heat&gross=lots".into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn edit_form_prefills_and_updates() {
        let state = Arc::new(AppState { db: testing::memory_db().await });
        let movie = testing::seed_movie(&state.db, MovieSeed::new("Old Title")).await;

        let (status, body) = page(&state, &format!("/movies/{}/edit", movie.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"value="Old Title""#));

        let mut record = testing::lookup_record(&state.db, "Updated Movie").await;
        record.year = 2023;
        let uri = format!("/movies/{}/edit", movie.id);
        let (status, location, _) = post_form(&state, &uri, form_body(&record, &[], &[])).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location, format!("/movies/{}", movie.id));
        let detail = catalog::get_movie(&state.db, movie.id).await.unwrap();
        assert_eq!(detail.movie.title, "Updated Movie");
        assert_eq!(detail.movie.year, 2023);
    }

    #[tokio::test]
    async fn edit_unknown_movie_is_not_found() {
        let state = Arc::new(AppState { db: testing::memory_db().await });

        let (status, _) = page(&state, "/movies/99/edit").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_confirms_then_removes_movie() {
        let state = Arc::new(AppState { db: testing::memory_db().await });
        let movie = testing::seed_movie(&state.db, MovieSeed::new("Doomed")).await;
        let uri = format!("/movies/{}/delete", movie.id);

        let (status, body) = page(&state, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Delete Doomed?"));

        let (status, location, _) = post_form(&state, &uri, String::new()).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location, "/movies");
        assert_eq!(catalog::count_movies(&state.db).await.unwrap(), 0);
    }
}
