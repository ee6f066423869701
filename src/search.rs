//! Free-text search with a handful of natural-language shortcuts.
//!
//! Queries are matched against [`SearchIntent`] patterns in order; anything
//! unrecognised becomes a multi search across movies and series.

use chrono::{Datelike, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::catalog::{CatalogClient, DiscoverQuery, ListEndpoint, Locale};
use crate::media::{ApiError, ContentItem, MediaType, RawCatalogItem};
use crate::normalize::{normalize_all, normalize_all_from, NormalizeMode};

pub const MAX_SUGGESTIONS: usize = 5;

pub const NO_RESULTS: &str = "No results found.";
pub const NO_ACTOR: &str = "No actor found.";
pub const NO_ACTOR_MOVIES: &str = "No movies found for this actor.";
pub const NO_MOVIES: &str = "No movies found.";
pub const NO_SERIES: &str = "No series found.";
pub const SEARCH_ERROR: &str = "Error fetching results. Please try again.";
pub const SUGGESTION_ERROR: &str = "Error fetching suggestions.";

static RELEASING_IN_MONTH_PT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)filmes que (?:vão|vai) chegar em (\w+) de (\d{4})")
        .expect("month release regex should compile")
});
static RELEASING_IN_MONTH_EN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)movies (?:coming|releasing|arriving) in (\w+),? (\d{4})")
        .expect("month release regex should compile")
});
static WITH_ACTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:filmes com|movies with) (.+)").expect("actor regex should compile")
});
static UPCOMING_MOVIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)filmes que (?:vão|vai) chegar em breve|upcoming movies")
        .expect("upcoming movies regex should compile")
});
static UPCOMING_SERIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)s[ée]ries que (?:vão|vai) chegar em breve|upcoming (?:series|shows)")
        .expect("upcoming series regex should compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchIntent {
    ReleasingInMonth { year: i32, month: u32 },
    WithActor(String),
    Upcoming(MediaType),
    Multi(String),
}

impl SearchIntent {
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        for pattern in [&*RELEASING_IN_MONTH_PT, &*RELEASING_IN_MONTH_EN] {
            if let Some(caps) = pattern.captures(query) {
                let month = caps.get(1).and_then(|m| month_number(m.as_str()));
                let year = caps.get(2).and_then(|y| y.as_str().parse().ok());
                if let (Some(month), Some(year)) = (month, year) {
                    return SearchIntent::ReleasingInMonth { year, month };
                }
            }
        }
        if let Some(name) = WITH_ACTOR
            .captures(query)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|name| !name.is_empty())
        {
            return SearchIntent::WithActor(name.to_string());
        }
        if UPCOMING_MOVIES.is_match(query) {
            return SearchIntent::Upcoming(MediaType::Movie);
        }
        if UPCOMING_SERIES.is_match(query) {
            return SearchIntent::Upcoming(MediaType::Tv);
        }
        SearchIntent::Multi(query.to_string())
    }

    /// Catalog path the intent's results come from. Multi search tags each
    /// hit itself.
    fn source(&self) -> Option<MediaType> {
        match self {
            SearchIntent::ReleasingInMonth { .. } | SearchIntent::WithActor(_) => {
                Some(MediaType::Movie)
            }
            SearchIntent::Upcoming(media_type) => Some(*media_type),
            SearchIntent::Multi(_) => None,
        }
    }

    fn empty_message(&self) -> &'static str {
        match self {
            SearchIntent::WithActor(_) => NO_ACTOR_MOVIES,
            SearchIntent::Upcoming(MediaType::Movie) => NO_MOVIES,
            SearchIntent::Upcoming(MediaType::Tv) => NO_SERIES,
            SearchIntent::ReleasingInMonth { .. } | SearchIntent::Multi(_) => NO_RESULTS,
        }
    }
}

/// Month number for a Portuguese or English month name or abbreviation.
pub fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "janeiro" | "january" | "jan" => 1,
        "fevereiro" | "february" | "feb" => 2,
        "março" | "marco" | "march" | "mar" => 3,
        "abril" | "april" | "apr" => 4,
        "maio" | "may" => 5,
        "junho" | "june" | "jun" => 6,
        "julho" | "july" | "jul" => 7,
        "agosto" | "august" | "aug" => 8,
        "setembro" | "september" | "sep" | "sept" => 9,
        "outubro" | "october" | "oct" => 10,
        "novembro" | "november" | "nov" => 11,
        "dezembro" | "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// First and last day of a calendar month.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<ContentItem>,
    pub message: Option<String>,
}

impl SearchOutcome {
    fn message(message: &str) -> Self {
        Self {
            results: Vec::new(),
            message: Some(message.to_string()),
        }
    }
}

enum SearchFailure {
    NoActor,
    Api(ApiError),
}

impl From<ApiError> for SearchFailure {
    fn from(e: ApiError) -> Self {
        SearchFailure::Api(e)
    }
}

/// Multi-search hits for people are not browsable content.
fn browsable(items: Vec<RawCatalogItem>) -> Vec<RawCatalogItem> {
    items
        .into_iter()
        .filter(|item| item.text("media_type") != Some("person"))
        .collect()
}

async fn run_intent<C: CatalogClient + ?Sized>(
    client: &C,
    intent: &SearchIntent,
    locale: &Locale,
    today: NaiveDate,
) -> Result<Vec<RawCatalogItem>, SearchFailure> {
    match intent {
        SearchIntent::ReleasingInMonth { year, month } => {
            let Some((from, to)) = month_range(*year, *month) else {
                return Ok(Vec::new());
            };
            let mut query = DiscoverQuery::new(MediaType::Movie);
            query.release_date_from = Some(from);
            query.release_date_to = Some(to);
            Ok(client.discover(&query, &locale.language).await?)
        }
        SearchIntent::WithActor(name) => {
            let people = client.search_person(name, &locale.language).await?;
            let actor = people.first().ok_or(SearchFailure::NoActor)?;
            debug!(actor = %actor.name, id = actor.id, "resolved actor");
            let mut query = DiscoverQuery::new(MediaType::Movie);
            query.with_cast = Some(actor.id);
            Ok(client.discover(&query, &locale.language).await?)
        }
        SearchIntent::Upcoming(media_type) => {
            let (endpoint, date_field) = match media_type {
                MediaType::Movie => (ListEndpoint::upcoming_movies(), "release_date"),
                MediaType::Tv => (ListEndpoint::tv_on_the_air(), "first_air_date"),
            };
            let items = client.list_by_endpoint(&endpoint, &locale.language).await?;
            Ok(items
                .into_iter()
                .filter(|item| {
                    item.date(date_field)
                        .is_some_and(|date| date.year() >= today.year())
                })
                .collect())
        }
        SearchIntent::Multi(query) => Ok(browsable(
            client.search_multi(query, &locale.language).await?,
        )),
    }
}

pub async fn search<C: CatalogClient + ?Sized>(
    client: &C,
    query: &str,
    locale: &Locale,
    today: NaiveDate,
) -> SearchOutcome {
    if query.trim().is_empty() {
        return SearchOutcome::default();
    }
    let intent = SearchIntent::parse(query);
    debug!(?intent, "search");

    match run_intent(client, &intent, locale, today).await {
        Ok(raw) => {
            let results = match intent.source() {
                Some(source) => normalize_all_from(&raw, source, NormalizeMode::Lenient),
                None => normalize_all(&raw, NormalizeMode::Lenient),
            };
            if results.is_empty() {
                SearchOutcome::message(intent.empty_message())
            } else {
                SearchOutcome {
                    results,
                    message: None,
                }
            }
        }
        Err(SearchFailure::NoActor) => SearchOutcome::message(NO_ACTOR),
        Err(SearchFailure::Api(e)) => {
            warn!(error = %e, "search failed");
            SearchOutcome::message(SEARCH_ERROR)
        }
    }
}

/// Autosuggest for a partially typed query.
pub async fn suggestions<C: CatalogClient + ?Sized>(
    client: &C,
    partial: &str,
    locale: &Locale,
) -> SearchOutcome {
    let partial = partial.trim();
    if partial.is_empty() {
        return SearchOutcome::default();
    }
    match client.search_multi(partial, &locale.language).await {
        Ok(raw) => {
            let mut results = normalize_all(&browsable(raw), NormalizeMode::Lenient);
            results.truncate(MAX_SUGGESTIONS);
            SearchOutcome {
                results,
                message: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "suggestion lookup failed");
            SearchOutcome::message(SUGGESTION_ERROR)
        }
    }
}
