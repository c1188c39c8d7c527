use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set, Unchanged},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, TransactionTrait,
    sea_query::{LikeExpr, OnConflict},
};

use crate::{
    entities::{
        actor, content_rating, country, director, genre, language, movie, movie_actor, movie_genre,
    },
    error::{CatalogError, CatalogResult},
    models::{MovieDetail, MovieFilter, MovieInput, MovieRecord, NameFilter, SortOrder},
};

/// Generates a get-or-create for a lookup table keyed by one unique column.
///
/// Inserts with `ON CONFLICT DO NOTHING`, then reads the row back. The returned
/// flag is `true` when this call inserted the row.
macro_rules! get_or_create {
    ($fn_name:ident, $module:ident, $field:ident, $column:ident) => {
        pub async fn $fn_name<C: ConnectionTrait>(
            db: &C,
            key: &str,
        ) -> CatalogResult<($module::Model, bool)> {
            let row = $module::ActiveModel { id: NotSet, $field: Set(key.to_string()) };
            let inserted = $module::Entity::insert(row)
                .on_conflict(OnConflict::column($module::Column::$column).do_nothing().to_owned())
                .exec_without_returning(db)
                .await?;

            let model = $module::Entity::find()
                .filter($module::Column::$column.eq(key))
                .one(db)
                .await?
                .ok_or_else(|| {
                    CatalogError::Database(DbErr::RecordNotFound(format!(
                        "{} {key:?}",
                        stringify!($module)
                    )))
                })?;

            Ok((model, inserted > 0))
        }
    };
}

get_or_create!(get_or_create_director, director, name, Name);
get_or_create!(get_or_create_actor, actor, name, Name);
get_or_create!(get_or_create_genre, genre, name, Name);
get_or_create!(get_or_create_language, language, name, Name);
get_or_create!(get_or_create_country, country, name, Name);
get_or_create!(get_or_create_content_rating, content_rating, rating, Rating);

fn movie_columns(record: &MovieRecord) -> movie::ActiveModel {
    movie::ActiveModel {
        id: NotSet,
        title: Set(record.title.clone()),
        director_id: Set(record.director_id),
        duration: Set(record.duration),
        gross: Set(record.gross),
        language_id: Set(record.language_id),
        country_id: Set(record.country_id),
        content_rating_id: Set(record.content_rating_id),
        budget: Set(record.budget),
        year: Set(record.year),
        imdb_score: Set(record.imdb_score),
    }
}

/// Inserts a movie. Unknown director/language/country/rating ids fail with
/// [`CatalogError::Integrity`].
pub async fn create_movie<C: ConnectionTrait>(
    db: &C,
    record: &MovieRecord,
) -> CatalogResult<movie::Model> {
    Ok(movie_columns(record).insert(db).await?)
}

pub async fn update_movie<C: ConnectionTrait>(
    db: &C,
    id: i32,
    record: &MovieRecord,
) -> CatalogResult<movie::Model> {
    let existing = movie::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::not_found("movie", id))?;

    let mut model = movie_columns(record);
    model.id = Unchanged(existing.id);
    Ok(model.update(db).await?)
}

/// Deletes a movie and, through the foreign-key cascade, its link rows.
pub async fn delete_movie<C: ConnectionTrait>(db: &C, id: i32) -> CatalogResult<()> {
    let res = movie::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(CatalogError::not_found("movie", id));
    }
    Ok(())
}

/// Links an actor to a movie. An existing pair fails with [`CatalogError::Conflict`].
pub async fn link_actor<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    actor_id: i32,
) -> CatalogResult<()> {
    let link =
        movie_actor::ActiveModel { id: NotSet, movie_id: Set(movie_id), actor_id: Set(actor_id) };
    movie_actor::Entity::insert(link).exec_without_returning(db).await?;
    Ok(())
}

/// Links a genre to a movie. An existing pair fails with [`CatalogError::Conflict`].
pub async fn link_genre<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    genre_id: i32,
) -> CatalogResult<()> {
    let link =
        movie_genre::ActiveModel { id: NotSet, movie_id: Set(movie_id), genre_id: Set(genre_id) };
    movie_genre::Entity::insert(link).exec_without_returning(db).await?;
    Ok(())
}

async fn replace_links<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    actors: &[i32],
    genres: &[i32],
) -> CatalogResult<()> {
    movie_actor::Entity::delete_many()
        .filter(movie_actor::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;
    movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;

    let mut seen = HashSet::new();
    for &actor_id in actors {
        if seen.insert(actor_id) {
            link_actor(db, movie_id, actor_id).await?;
        }
    }

    seen.clear();
    for &genre_id in genres {
        if seen.insert(genre_id) {
            link_genre(db, movie_id, genre_id).await?;
        }
    }

    Ok(())
}

/// Creates a movie with its actor and genre sets in one transaction.
pub async fn save_movie<C>(db: &C, input: &MovieInput) -> CatalogResult<MovieDetail>
where
    C: ConnectionTrait + TransactionTrait,
{
    input.validate()?;

    let txn = db.begin().await?;
    let movie = create_movie(&txn, &input.record()).await?;
    replace_links(&txn, movie.id, &input.actors, &input.genres).await?;
    txn.commit().await?;

    tracing::debug!(movie_id = movie.id, title = %movie.title, "created movie");
    get_movie(db, movie.id).await
}

/// Rewrites a movie and replaces its actor and genre sets in one transaction.
pub async fn replace_movie<C>(db: &C, id: i32, input: &MovieInput) -> CatalogResult<MovieDetail>
where
    C: ConnectionTrait + TransactionTrait,
{
    input.validate()?;

    let txn = db.begin().await?;
    update_movie(&txn, id, &input.record()).await?;
    replace_links(&txn, id, &input.actors, &input.genres).await?;
    txn.commit().await?;

    tracing::debug!(movie_id = id, "updated movie");
    get_movie(db, id).await
}

fn dangling(what: &str, movie_id: i32) -> CatalogError {
    CatalogError::Integrity(format!("movie {movie_id} references a missing {what}"))
}

pub async fn get_movie<C: ConnectionTrait>(db: &C, id: i32) -> CatalogResult<MovieDetail> {
    let movie = movie::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::not_found("movie", id))?;

    let director = movie
        .find_related(director::Entity)
        .one(db)
        .await?
        .ok_or_else(|| dangling("director", id))?;
    let language = movie
        .find_related(language::Entity)
        .one(db)
        .await?
        .ok_or_else(|| dangling("language", id))?;
    let country = movie
        .find_related(country::Entity)
        .one(db)
        .await?
        .ok_or_else(|| dangling("country", id))?;
    let content_rating = movie
        .find_related(content_rating::Entity)
        .one(db)
        .await?
        .ok_or_else(|| dangling("content rating", id))?;

    let actors = movie
        .find_related(actor::Entity)
        .order_by_asc(actor::Column::Name)
        .all(db)
        .await?;
    let genres = movie
        .find_related(genre::Entity)
        .order_by_asc(genre::Column::Name)
        .all(db)
        .await?;

    Ok(MovieDetail { movie, director, language, country, content_rating, actors, genres })
}

// `%` and `_` in user input match themselves.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn prefix_pattern(input: &str) -> LikeExpr {
    LikeExpr::new(format!("{}%", escape_like(input))).escape('\\')
}

fn substring_pattern(input: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(input))).escape('\\')
}

pub async fn list_movies<C: ConnectionTrait>(
    db: &C,
    filter: &MovieFilter,
) -> CatalogResult<Vec<movie::Model>> {
    let mut query = movie::Entity::find();

    if let Some(initial) = &filter.initial {
        query = query.filter(movie::Column::Title.like(prefix_pattern(initial)));
    }
    if let Some(q) = &filter.q {
        query = query.filter(movie::Column::Title.like(substring_pattern(q)));
    }
    if let Some(year) = filter.year {
        query = query.filter(movie::Column::Year.eq(year));
    }
    if let Some(name) = &filter.genre {
        let ids = movie_genre::Entity::find()
            .select_only()
            .column(movie_genre::Column::MovieId)
            .inner_join(genre::Entity)
            .filter(genre::Column::Name.eq(name.as_str()))
            .into_query();
        query = query.filter(movie::Column::Id.in_subquery(ids));
    }
    if let Some(name) = &filter.actor {
        let ids = movie_actor::Entity::find()
            .select_only()
            .column(movie_actor::Column::MovieId)
            .inner_join(actor::Entity)
            .filter(actor::Column::Name.eq(name.as_str()))
            .into_query();
        query = query.filter(movie::Column::Id.in_subquery(ids));
    }
    if let Some(rating) = &filter.content_rating {
        let ids = content_rating::Entity::find()
            .select_only()
            .column(content_rating::Column::Id)
            .filter(content_rating::Column::Rating.eq(rating.as_str()))
            .into_query();
        query = query.filter(movie::Column::ContentRatingId.in_subquery(ids));
    }
    if let Some(name) = &filter.language {
        let ids = language::Entity::find()
            .select_only()
            .column(language::Column::Id)
            .filter(language::Column::Name.eq(name.as_str()))
            .into_query();
        query = query.filter(movie::Column::LanguageId.in_subquery(ids));
    }

    let query = match filter.order {
        SortOrder::Asc => query.order_by_asc(movie::Column::Title),
        SortOrder::Desc => query.order_by_desc(movie::Column::Title),
    };

    Ok(query.order_by_asc(movie::Column::Id).all(db).await?)
}

/// Movies linked to the genre with exactly this name.
pub async fn movies_by_genre<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> CatalogResult<Vec<movie::Model>> {
    let filter = MovieFilter { genre: Some(name.to_string()), ..Default::default() };
    list_movies(db, &filter).await
}

pub async fn count_movies<C: ConnectionTrait>(db: &C) -> CatalogResult<u64> {
    Ok(movie::Entity::find().count(db).await?)
}

pub async fn get_director<C: ConnectionTrait>(db: &C, id: i32) -> CatalogResult<director::Model> {
    director::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::not_found("director", id))
}

pub async fn list_directors<C: ConnectionTrait>(
    db: &C,
    filter: &NameFilter,
) -> CatalogResult<Vec<director::Model>> {
    let mut query = director::Entity::find();
    if let Some(initial) = &filter.initial {
        query = query.filter(director::Column::Name.like(prefix_pattern(initial)));
    }
    if let Some(q) = &filter.q {
        query = query.filter(director::Column::Name.like(substring_pattern(q)));
    }
    let query = match filter.order {
        SortOrder::Asc => query.order_by_asc(director::Column::Name),
        SortOrder::Desc => query.order_by_desc(director::Column::Name),
    };
    Ok(query.all(db).await?)
}

pub async fn list_actors<C: ConnectionTrait>(
    db: &C,
    filter: &NameFilter,
) -> CatalogResult<Vec<actor::Model>> {
    let mut query = actor::Entity::find();
    if let Some(initial) = &filter.initial {
        query = query.filter(actor::Column::Name.like(prefix_pattern(initial)));
    }
    if let Some(q) = &filter.q {
        query = query.filter(actor::Column::Name.like(substring_pattern(q)));
    }
    let query = match filter.order {
        SortOrder::Asc => query.order_by_asc(actor::Column::Name),
        SortOrder::Desc => query.order_by_desc(actor::Column::Name),
    };
    Ok(query.all(db).await?)
}

pub async fn list_genres<C: ConnectionTrait>(db: &C) -> CatalogResult<Vec<genre::Model>> {
    Ok(genre::Entity::find().order_by_asc(genre::Column::Name).all(db).await?)
}

pub async fn list_languages<C: ConnectionTrait>(db: &C) -> CatalogResult<Vec<language::Model>> {
    Ok(language::Entity::find().order_by_asc(language::Column::Name).all(db).await?)
}

pub async fn list_countries<C: ConnectionTrait>(db: &C) -> CatalogResult<Vec<country::Model>> {
    Ok(country::Entity::find().order_by_asc(country::Column::Name).all(db).await?)
}

pub async fn list_content_ratings<C: ConnectionTrait>(
    db: &C,
) -> CatalogResult<Vec<content_rating::Model>> {
    Ok(content_rating::Entity::find().order_by_asc(content_rating::Column::Rating).all(db).await?)
}

pub async fn list_years<C: ConnectionTrait>(db: &C) -> CatalogResult<Vec<i32>> {
    Ok(movie::Entity::find()
        .select_only()
        .column(movie::Column::Year)
        .distinct()
        .order_by_asc(movie::Column::Year)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}
