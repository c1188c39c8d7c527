use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, html};

use crate::{
    entities::{actor, content_rating, country, director, genre, language, movie},
    leaderboard::{ActorAppearances, DirectorGross, DirectorScore, DirectorVersatility},
    models::{MovieDetail, MovieFilter, MovieInput, NameFilter, SortOrder},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

/// Option lists for the movie browse form.
pub struct BrowseOptions {
    pub genres: Vec<genre::Model>,
    pub years: Vec<i32>,
    pub content_ratings: Vec<content_rating::Model>,
    pub languages: Vec<language::Model>,
}

/// Every row the movie editor can pick from.
pub struct EditorChoices {
    pub directors: Vec<director::Model>,
    pub languages: Vec<language::Model>,
    pub countries: Vec<country::Model>,
    pub content_ratings: Vec<content_rating::Model>,
    pub actors: Vec<actor::Model>,
    pub genres: Vec<genre::Model>,
}

pub fn index_page(movies: u64, countries: usize) -> String {
    page(
        "Moviehub",
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Moviehub" }
            p class="mt-2 text-gray-600" { (movies) " movies from " (countries) " countries." }

            div class="mt-8 grid gap-6 md:grid-cols-2" {
                div class="bg-white shadow rounded-lg p-6" {
                    h2 class="text-lg font-semibold text-gray-900" { "Browse" }
                    ul class="mt-3 space-y-2" {
                        li { (link("/movies", "All movies")) }
                        li { (link("/directors", "Directors")) }
                        li { (link("/actors", "Actors")) }
                    }
                }
                div class="bg-white shadow rounded-lg p-6" {
                    h2 class="text-lg font-semibold text-gray-900" { "Leaderboards" }
                    ul class="mt-3 space-y-2" {
                        li { (link("/movies/top-grossing", "Top grossing movies")) }
                        li { (link("/movies/top-by-imdb", "Top movies by IMDb score")) }
                        li { (link("/directors/top-by-gross", "Top directors by gross")) }
                        li { (link("/directors/top-by-imdb", "Top directors by IMDb score")) }
                        li { (link("/directors/top-versatile", "Most versatile directors")) }
                    }
                }
            }
        },
    )
}

pub fn movie_list_page(
    movies: &[movie::Model],
    filter: &MovieFilter,
    options: &BrowseOptions,
) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    page(
        "Movies",
        html! {
            (header("Movies", movies.len()))
            a class="mt-4 inline-block rounded-md bg-green-600 px-4 py-2 font-semibold text-white hover:bg-green-700" href="/movies/new" { "Add movie" }

            form class="mt-6 bg-white shadow rounded-lg p-6 grid gap-4 md:grid-cols-4" method="get" action="/movies" {
                (text_input("q", "Title contains", &text(&filter.q)))
                (text_input("initial", "Starts with", &text(&filter.initial)))
                (text_input("actor", "Actor", &text(&filter.actor)))
                (order_select(filter.order))

                (select("genre", "Genre", filter.genre.as_deref(), options.genres.iter().map(|g| g.name.as_str())))
                (select("content_rating", "Rating", filter.content_rating.as_deref(), options.content_ratings.iter().map(|r| r.rating.as_str())))
                (select("language", "Language", filter.language.as_deref(), options.languages.iter().map(|l| l.name.as_str())))
                div {
                    label class="block text-sm font-medium text-gray-700" for="year" { "Year" }
                    select class=(FIELD) name="year" id="year" {
                        option value="" { "Any" }
                        @for year in &options.years {
                            option value=(year) selected[filter.year == Some(*year)] { (year) }
                        }
                    }
                }

                button class="md:col-span-4 rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Filter" }
            }

            (movie_table(movies))
        },
    )
}

pub fn movie_detail_page(detail: &MovieDetail) -> String {
    let movie = &detail.movie;

    page(
        &movie.title,
        html! {
            div class="bg-white shadow rounded-lg p-8" {
                h1 class="text-3xl font-bold text-gray-900" {
                    (movie.title)
                    span class="ml-2 font-normal text-gray-500" { "(" (movie.year) ")" }
                }
                p class="mt-2 text-gray-600" {
                    "Directed by "
                    (link(&format!("/directors/{}/actors", detail.director.id), &detail.director.name))
                }
                div class="mt-4 flex gap-4 text-sm" {
                    (link(&format!("/movies/{}/edit", movie.id), "Edit"))
                    (link(&format!("/movies/{}/delete", movie.id), "Delete"))
                }

                dl class="mt-6 grid gap-4 md:grid-cols-3" {
                    (fact("Duration", format!("{} min", movie.duration)))
                    (fact("IMDb score", format!("{:.1}", movie.imdb_score)))
                    (fact("Rating", detail.content_rating.rating.clone()))
                    (fact("Gross", money(movie.gross)))
                    (fact("Budget", money(movie.budget)))
                    (fact("Language", detail.language.name.clone()))
                    (fact("Country", detail.country.name.clone()))
                }

                h2 class="mt-8 text-lg font-semibold text-gray-900" { "Cast" }
                ul class="mt-2 flex flex-wrap gap-2" {
                    @for actor in &detail.actors {
                        li class="rounded bg-gray-100 px-3 py-1 text-sm" {
                            (link(&format!("/movies?actor={}", urlencoding::encode(&actor.name)), &actor.name))
                        }
                    }
                }

                h2 class="mt-6 text-lg font-semibold text-gray-900" { "Genres" }
                ul class="mt-2 flex flex-wrap gap-2" {
                    @for genre in &detail.genres {
                        li class="rounded bg-gray-100 px-3 py-1 text-sm" {
                            (link(&format!("/movies?genre={}", urlencoding::encode(&genre.name)), &genre.name))
                        }
                    }
                }
            }
        },
    )
}

/// Create/edit form. `values` pre-fills the fields; `error` is shown above them.
pub fn movie_form_page(
    heading: &str,
    action: &str,
    values: Option<&MovieInput>,
    choices: &EditorChoices,
    error: Option<&str>,
) -> String {
    let number = |get: fn(&MovieInput) -> String| values.map(get).unwrap_or_default();
    let picked = |get: fn(&MovieInput) -> i32| values.map(get);
    let actors = values.map(|v| v.actors.as_slice()).unwrap_or_default();
    let genres = values.map(|v| v.genres.as_slice()).unwrap_or_default();

    page(
        heading,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { (heading) }

            @if let Some(error) = error {
                div class="mt-6 rounded-md bg-red-50 p-4 text-red-700" { (error) }
            }

            form class="mt-6 bg-white shadow rounded-lg p-6 grid gap-4 md:grid-cols-2" method="post" action=(action) {
                div class="md:col-span-2" {
                    (text_input("title", "Title", values.map(|v| v.title.as_str()).unwrap_or_default()))
                }
                (id_select("director_id", "Director", picked(|v| v.director_id), choices.directors.iter().map(|d| (d.id, d.name.as_str()))))
                (id_select("language_id", "Language", picked(|v| v.language_id), choices.languages.iter().map(|l| (l.id, l.name.as_str()))))
                (id_select("country_id", "Country", picked(|v| v.country_id), choices.countries.iter().map(|c| (c.id, c.name.as_str()))))
                (id_select("content_rating_id", "Rating", picked(|v| v.content_rating_id), choices.content_ratings.iter().map(|r| (r.id, r.rating.as_str()))))
                (number_input("duration", "Duration (min)", &number(|v| v.duration.to_string()), "1"))
                (number_input("year", "Year", &number(|v| v.year.to_string()), "1"))
                (number_input("gross", "Gross", &number(|v| v.gross.to_string()), "1"))
                (number_input("budget", "Budget", &number(|v| v.budget.to_string()), "1"))
                (number_input("imdb_score", "IMDb score", &number(|v| v.imdb_score.to_string()), "0.1"))
                div {}
                (multi_select("actors", "Actors", actors, choices.actors.iter().map(|a| (a.id, a.name.as_str()))))
                (multi_select("genres", "Genres", genres, choices.genres.iter().map(|g| (g.id, g.name.as_str()))))

                button class="md:col-span-2 rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Save" }
            }
        },
    )
}

pub fn movie_delete_page(movie: &movie::Model) -> String {
    page(
        "Delete movie",
        html! {
            div class="bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { "Delete " (movie.title) "?" }
                p class="mt-4 text-gray-700" { "Its cast and genre links are removed with it." }
                form class="mt-6 flex gap-4" method="post" action=(format!("/movies/{}/delete", movie.id)) {
                    button class="rounded-md bg-red-600 px-4 py-2 font-semibold text-white hover:bg-red-700" type="submit" { "Delete" }
                    a class="px-4 py-2 text-gray-600 hover:text-gray-900" href=(format!("/movies/{}", movie.id)) { "Cancel" }
                }
            }
        },
    )
}

pub fn director_list_page(directors: &[director::Model], filter: &NameFilter) -> String {
    name_list_page(
        "Directors",
        "/directors",
        filter,
        directors.iter().map(|d| (format!("/directors/{}/actors", d.id), d.name.as_str())),
    )
}

pub fn actor_list_page(actors: &[actor::Model], filter: &NameFilter) -> String {
    name_list_page(
        "Actors",
        "/actors",
        filter,
        actors
            .iter()
            .map(|a| (format!("/movies?actor={}", urlencoding::encode(&a.name)), a.name.as_str())),
    )
}

fn name_list_page<'a>(
    title: &str,
    action: &str,
    filter: &NameFilter,
    rows: impl Iterator<Item = (String, &'a str)>,
) -> String {
    let rows: Vec<_> = rows.collect();

    page(
        title,
        html! {
            (header(title, rows.len()))

            form class="mt-6 bg-white shadow rounded-lg p-6 grid gap-4 md:grid-cols-4" method="get" action=(action) {
                (text_input("q", "Name contains", filter.q.as_deref().unwrap_or_default()))
                (text_input("initial", "Starts with", filter.initial.as_deref().unwrap_or_default()))
                (order_select(filter.order))
                div class="flex items-end" {
                    button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Filter" }
                }
            }

            ul class="mt-6 bg-white shadow rounded-lg divide-y" {
                @for (href, name) in &rows {
                    li class="px-6 py-3" { (link(href, name)) }
                }
            }
        },
    )
}

pub fn movie_board_page(title: &str, movies: &[movie::Model]) -> String {
    page(
        title,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { (title) }
            (movie_table(movies))
        },
    )
}

pub fn director_gross_page(rows: &[DirectorGross]) -> String {
    director_board(
        "Top directors by gross",
        "Total gross",
        rows.iter().map(|r| (r.director_id, r.name.as_str(), money(r.total_gross))),
    )
}

pub fn director_score_page(rows: &[DirectorScore]) -> String {
    director_board(
        "Top directors by IMDb score",
        "Average score",
        rows.iter().map(|r| (r.director_id, r.name.as_str(), format!("{:.2}", r.average_imdb))),
    )
}

pub fn versatility_page(rows: &[DirectorVersatility]) -> String {
    director_board(
        "Most versatile directors",
        "Unique actors",
        rows.iter().map(|r| (r.director_id, r.name.as_str(), r.unique_actors.to_string())),
    )
}

fn director_board<'a>(
    title: &str,
    metric: &str,
    rows: impl Iterator<Item = (i32, &'a str, String)>,
) -> String {
    page(
        title,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { (title) }
            table class="mt-6 w-full bg-white shadow rounded-lg" {
                thead {
                    tr class="text-left text-sm text-gray-500" {
                        th class="px-6 py-3" { "#" }
                        th class="px-6 py-3" { "Director" }
                        th class="px-6 py-3" { (metric) }
                    }
                }
                tbody {
                    @for (rank, (id, name, value)) in rows.enumerate() {
                        tr class="border-t" {
                            td class="px-6 py-3 text-gray-500" { (rank + 1) }
                            td class="px-6 py-3" { (link(&format!("/directors/{id}/actors"), name)) }
                            td class="px-6 py-3" { (value) }
                        }
                    }
                }
            }
        },
    )
}

pub fn actors_with_director_page(director: &director::Model, rows: &[ActorAppearances]) -> String {
    let title = format!("Actors who worked with {}", director.name);

    page(
        &title,
        html! {
            (header(&title, rows.len()))
            table class="mt-6 w-full bg-white shadow rounded-lg" {
                thead {
                    tr class="text-left text-sm text-gray-500" {
                        th class="px-6 py-3" { "Actor" }
                        th class="px-6 py-3" { "Movies together" }
                    }
                }
                tbody {
                    @for row in rows {
                        tr class="border-t" {
                            td class="px-6 py-3" {
                                (link(&format!("/movies?actor={}", urlencoding::encode(&row.name)), &row.name))
                            }
                            td class="px-6 py-3" { (row.count) }
                        }
                    }
                }
            }
        },
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    page(
        "Error",
        html! {
            div class="bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { (status.as_u16()) " " (status.canonical_reason().unwrap_or("Error")) }
                p class="mt-4 text-gray-700" { (message) }
                a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
            }
        },
    )
}

const FIELD: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Moviehub" }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                nav class="bg-white shadow" {
                    div class="max-w-5xl mx-auto px-6 py-4 flex gap-6 text-sm font-medium" {
                        a class="text-gray-900" href="/" { "Moviehub" }
                        a class="text-gray-600 hover:text-gray-900" href="/movies" { "Movies" }
                        a class="text-gray-600 hover:text-gray-900" href="/directors" { "Directors" }
                        a class="text-gray-600 hover:text-gray-900" href="/actors" { "Actors" }
                    }
                }
                main class="max-w-5xl mx-auto px-6 py-10" { (body) }
            }
        }
    }
    .into_string()
}

fn header(title: &str, count: usize) -> Markup {
    html! {
        div class="flex items-baseline justify-between gap-6" {
            h1 class="text-3xl font-bold text-gray-900" { (title) }
            span class="text-sm text-gray-500" { (count) " results" }
        }
    }
}

fn link(href: &str, label: &str) -> Markup {
    html! { a class="text-blue-600 hover:text-blue-800" href=(href) { (label) } }
}

fn fact(label: &str, value: String) -> Markup {
    html! {
        div {
            dt class="text-sm text-gray-500" { (label) }
            dd class="font-medium text-gray-900" { (value) }
        }
    }
}

fn text_input(name: &str, label: &str, value: &str) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            input class=(FIELD) name=(name) id=(name) value=(value);
        }
    }
}

fn select<'a>(
    name: &str,
    label: &str,
    current: Option<&str>,
    values: impl Iterator<Item = &'a str>,
) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            select class=(FIELD) name=(name) id=(name) {
                option value="" { "Any" }
                @for value in values {
                    option value=(value) selected[current == Some(value)] { (value) }
                }
            }
        }
    }
}

fn number_input(name: &str, label: &str, value: &str, step: &str) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            input class=(FIELD) type="number" step=(step) name=(name) id=(name) value=(value);
        }
    }
}

fn id_select<'a>(
    name: &str,
    label: &str,
    current: Option<i32>,
    rows: impl Iterator<Item = (i32, &'a str)>,
) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            select class=(FIELD) name=(name) id=(name) required {
                option value="" { "Choose" }
                @for (id, text) in rows {
                    option value=(id) selected[current == Some(id)] { (text) }
                }
            }
        }
    }
}

fn multi_select<'a>(
    name: &str,
    label: &str,
    chosen: &[i32],
    rows: impl Iterator<Item = (i32, &'a str)>,
) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            select class=(FIELD) name=(name) id=(name) multiple size="8" {
                @for (id, text) in rows {
                    option value=(id) selected[chosen.contains(&id)] { (text) }
                }
            }
        }
    }
}

fn order_select(order: SortOrder) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for="order" { "Order" }
            select class=(FIELD) name="order" id="order" {
                @for (value, label) in [(SortOrder::Asc, "A to Z"), (SortOrder::Desc, "Z to A")] {
                    option value=(value.as_str()) selected[order == value] { (label) }
                }
            }
        }
    }
}

fn movie_table(movies: &[movie::Model]) -> Markup {
    html! {
        @if movies.is_empty() {
            div class="mt-6 bg-white shadow rounded-lg p-8" {
                p class="text-gray-600" { "No movies found." }
            }
        } @else {
            table class="mt-6 w-full bg-white shadow rounded-lg" {
                thead {
                    tr class="text-left text-sm text-gray-500" {
                        th class="px-6 py-3" { "Title" }
                        th class="px-6 py-3" { "Year" }
                        th class="px-6 py-3" { "IMDb" }
                        th class="px-6 py-3" { "Gross" }
                    }
                }
                tbody {
                    @for movie in movies {
                        tr class="border-t" {
                            td class="px-6 py-3" { (link(&format!("/movies/{}", movie.id), &movie.title)) }
                            td class="px-6 py-3" { (movie.year) }
                            td class="px-6 py-3" { (format!("{:.1}", movie.imdb_score)) }
                            td class="px-6 py-3" { (money(movie.gross)) }
                        }
                    }
                }
            }
        }
    }
}

fn money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0 { format!("-${out}") } else { format!("${out}") }
}
