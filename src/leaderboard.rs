//! Fixed aggregate queries over the movie/director/actor graph.
//!
//! Every ranking breaks ties on the entity id, ascending.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
    sea_query::{Expr, Func, SimpleExpr},
};
use serde::Serialize;

use crate::{
    catalog,
    entities::{actor, director, movie, movie_actor},
    error::CatalogResult,
};

const TOP_MOVIES: u64 = 10;
const TOP_DIRECTORS: u64 = 10;
const TOP_VERSATILE: u64 = 5;

#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize)]
pub struct DirectorGross {
    pub director_id: i32,
    pub name: String,
    pub total_gross: i64,
}

#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize)]
pub struct DirectorScore {
    pub director_id: i32,
    pub name: String,
    pub average_imdb: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct DirectorVersatility {
    pub director_id: i32,
    pub name: String,
    pub unique_actors: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ActorAppearances {
    pub actor_id: i32,
    pub name: String,
    pub count: i64,
}

pub async fn top_grossing_movies<C: ConnectionTrait>(db: &C) -> CatalogResult<Vec<movie::Model>> {
    Ok(movie::Entity::find()
        .order_by_desc(movie::Column::Gross)
        .order_by_asc(movie::Column::Id)
        .limit(TOP_MOVIES)
        .all(db)
        .await?)
}

pub async fn top_movies_by_imdb<C: ConnectionTrait>(db: &C) -> CatalogResult<Vec<movie::Model>> {
    Ok(movie::Entity::find()
        .order_by_desc(movie::Column::ImdbScore)
        .order_by_asc(movie::Column::Id)
        .limit(TOP_MOVIES)
        .all(db)
        .await?)
}

pub async fn top_directors_by_gross<C: ConnectionTrait>(
    db: &C,
) -> CatalogResult<Vec<DirectorGross>> {
    let total: SimpleExpr = Func::sum(Expr::col((movie::Entity, movie::Column::Gross))).into();

    Ok(director::Entity::find()
        .select_only()
        .column_as(director::Column::Id, "director_id")
        .column(director::Column::Name)
        .expr_as(total.clone(), "total_gross")
        .join(JoinType::InnerJoin, director::Relation::Movie.def())
        .group_by(director::Column::Id)
        .group_by(director::Column::Name)
        .order_by_desc(total)
        .order_by_asc(director::Column::Id)
        .limit(TOP_DIRECTORS)
        .into_model::<DirectorGross>()
        .all(db)
        .await?)
}

/// Directors without movies have no average and never appear.
pub async fn top_directors_by_imdb<C: ConnectionTrait>(
    db: &C,
) -> CatalogResult<Vec<DirectorScore>> {
    let average: SimpleExpr =
        Func::avg(Expr::col((movie::Entity, movie::Column::ImdbScore))).into();

    Ok(director::Entity::find()
        .select_only()
        .column_as(director::Column::Id, "director_id")
        .column(director::Column::Name)
        .expr_as(average.clone(), "average_imdb")
        .join(JoinType::InnerJoin, director::Relation::Movie.def())
        .group_by(director::Column::Id)
        .group_by(director::Column::Name)
        .order_by_desc(average)
        .order_by_asc(director::Column::Id)
        .limit(TOP_DIRECTORS)
        .into_model::<DirectorScore>()
        .all(db)
        .await?)
}

/// Ranks directors by how many distinct actors appear across their movies.
pub async fn top_versatile_directors<C: ConnectionTrait>(
    db: &C,
) -> CatalogResult<Vec<DirectorVersatility>> {
    let unique_actors: SimpleExpr =
        Func::count_distinct(Expr::col((movie_actor::Entity, movie_actor::Column::ActorId))).into();

    Ok(director::Entity::find()
        .select_only()
        .column_as(director::Column::Id, "director_id")
        .column(director::Column::Name)
        .expr_as(unique_actors.clone(), "unique_actors")
        .join(JoinType::InnerJoin, director::Relation::Movie.def())
        .join(JoinType::InnerJoin, movie::Relation::MovieActor.def())
        .group_by(director::Column::Id)
        .group_by(director::Column::Name)
        .order_by_desc(unique_actors)
        .order_by_asc(director::Column::Id)
        .limit(TOP_VERSATILE)
        .into_model::<DirectorVersatility>()
        .all(db)
        .await?)
}

/// Counts how often each actor appears in the given director's movies.
pub async fn actors_with_director<C: ConnectionTrait>(
    db: &C,
    director_id: i32,
) -> CatalogResult<Vec<ActorAppearances>> {
    catalog::get_director(db, director_id).await?;

    let count: SimpleExpr =
        Func::count(Expr::col((movie_actor::Entity, movie_actor::Column::Id))).into();

    Ok(movie_actor::Entity::find()
        .select_only()
        .column_as(actor::Column::Id, "actor_id")
        .column(actor::Column::Name)
        .expr_as(count.clone(), "count")
        .join(JoinType::InnerJoin, movie_actor::Relation::Movie.def())
        .join(JoinType::InnerJoin, movie_actor::Relation::Actor.def())
        .filter(movie::Column::DirectorId.eq(director_id))
        .group_by(actor::Column::Id)
        .group_by(actor::Column::Name)
        .order_by_desc(count)
        .order_by_asc(actor::Column::Id)
        .into_model::<ActorAppearances>()
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::CatalogError,
        testing::{self, MovieSeed},
    };

    #[tokio::test]
    async fn top_grossing_breaks_ties_by_id() {
        let db = testing::memory_db().await;
        let five = testing::seed_movie(&db, MovieSeed::new("Five").gross(5)).await;
        let first_hundred = testing::seed_movie(&db, MovieSeed::new("Hundred A").gross(100)).await;
        let second_hundred = testing::seed_movie(&db, MovieSeed::new("Hundred B").gross(100)).await;
        let three = testing::seed_movie(&db, MovieSeed::new("Three").gross(3)).await;

        let ids: Vec<_> =
            top_grossing_movies(&db).await.unwrap().into_iter().map(|m| m.id).collect();

        assert_eq!(ids, vec![first_hundred.id, second_hundred.id, five.id, three.id]);
    }

    #[tokio::test]
    async fn top_lists_stop_at_ten() {
        let db = testing::memory_db().await;
        for i in 0..12 {
            testing::seed_movie(
                &db,
                MovieSeed::new(&format!("Movie {i}"))
                    .director(&format!("Director {i}"))
                    .gross(i)
                    .imdb_score(i as f64 / 2.0),
            )
            .await;
        }

        let grossing = top_grossing_movies(&db).await.unwrap();
        assert_eq!(grossing.len(), 10);
        assert_eq!(grossing[0].gross, 11);

        let rated = top_movies_by_imdb(&db).await.unwrap();
        assert_eq!(rated.len(), 10);
        assert_eq!(rated[0].imdb_score, 5.5);
        assert_eq!(rated[9].imdb_score, 1.0);

        assert_eq!(top_directors_by_gross(&db).await.unwrap().len(), 10);
        assert_eq!(top_directors_by_imdb(&db).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn directors_ranked_by_total_gross() {
        let db = testing::memory_db().await;
        testing::seed_movie(&db, MovieSeed::new("A1").director("Ann").gross(40)).await;
        testing::seed_movie(&db, MovieSeed::new("A2").director("Ann").gross(70)).await;
        testing::seed_movie(&db, MovieSeed::new("B1").director("Bob").gross(100)).await;
        catalog::get_or_create_director(&db, "Idle").await.unwrap();

        let ranked = top_directors_by_gross(&db).await.unwrap();

        let rows: Vec<_> = ranked.iter().map(|d| (d.name.as_str(), d.total_gross)).collect();
        assert_eq!(rows, [("Ann", 110), ("Bob", 100)]);
    }

    #[tokio::test]
    async fn directors_ranked_by_average_score_exclude_empty() {
        let db = testing::memory_db().await;
        testing::seed_movie(&db, MovieSeed::new("A1").director("Ann").imdb_score(9.0)).await;
        testing::seed_movie(&db, MovieSeed::new("A2").director("Ann").imdb_score(6.0)).await;
        testing::seed_movie(&db, MovieSeed::new("B1").director("Bob").imdb_score(8.0)).await;
        catalog::get_or_create_director(&db, "Idle").await.unwrap();

        let ranked = top_directors_by_imdb(&db).await.unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Bob");
        assert_eq!(ranked[1].name, "Ann");
        assert!((ranked[1].average_imdb - 7.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn versatility_counts_distinct_actors() {
        let db = testing::memory_db().await;
        let cast = ["Ana", "Ben", "Cy"];
        testing::seed_movie(&db, MovieSeed::new("One").director("Same Cast").actors(&cast)).await;
        testing::seed_movie(&db, MovieSeed::new("Two").director("Same Cast").actors(&cast)).await;
        testing::seed_movie(
            &db,
            MovieSeed::new("Three").director("Wide Cast").actors(&["Dee", "Eve", "Fay", "Gus"]),
        )
        .await;

        let ranked = top_versatile_directors(&db).await.unwrap();

        let rows: Vec<_> = ranked.iter().map(|d| (d.name.as_str(), d.unique_actors)).collect();
        assert_eq!(rows, [("Wide Cast", 4), ("Same Cast", 3)]);
    }

    #[tokio::test]
    async fn versatility_stops_at_five() {
        let db = testing::memory_db().await;
        for i in 0..7 {
            testing::seed_movie(
                &db,
                MovieSeed::new(&format!("M{i}"))
                    .director(&format!("D{i}"))
                    .actors(&[&format!("Actor {i}")]),
            )
            .await;
        }

        assert_eq!(top_versatile_directors(&db).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn actors_with_director_counts_appearances() {
        let db = testing::memory_db().await;
        testing::seed_movie(&db, MovieSeed::new("One").director("Nolan").actors(&["Caine", "Bale"]))
            .await;
        let last = testing::seed_movie(
            &db,
            MovieSeed::new("Two").director("Nolan").actors(&["Caine", "Murphy"]),
        )
        .await;
        testing::seed_movie(&db, MovieSeed::new("Other").director("Villeneuve").actors(&["Bale"]))
            .await;

        let rows = actors_with_director(&db, last.director_id).await.unwrap();

        let counts: Vec<_> = rows.iter().map(|a| (a.name.as_str(), a.count)).collect();
        assert_eq!(counts, [("Caine", 2), ("Bale", 1), ("Murphy", 1)]);
    }

    #[tokio::test]
    async fn actors_with_director_without_movies_is_empty() {
        let db = testing::memory_db().await;
        let (director, _) = catalog::get_or_create_director(&db, "Newcomer").await.unwrap();

        assert!(actors_with_director(&db, director.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn actors_with_unknown_director_is_not_found() {
        let db = testing::memory_db().await;

        let err = actors_with_director(&db, 999).await.unwrap_err();

        assert!(matches!(err, CatalogError::NotFound { entity: "director", id: 999 }));
    }
}
