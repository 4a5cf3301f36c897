use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::config::SiteConfig;
use crate::db::{SitemapSlugs, Store};
use crate::error::{not_found_response, SiteError};
use crate::metadata::{artist_path, event_path, venue_path};
use crate::pages::{ArtistPage, EventPage, HomePage, SitemapXml, VenuePage};
use crate::timezone::EASTERN;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    config: Arc<SiteConfig>,
}

impl AppState {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Opens the store on a blocking thread and runs `query` against it.
    async fn with_store<T, F>(&self, query: F) -> Result<T, SiteError>
    where
        F: FnOnce(&Store) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.config.database_path();
        let result = tokio::task::spawn_blocking(move || -> rusqlite::Result<T> {
            let store = Store::open_read_only(&path)?;
            query(&store)
        })
        .await??;
        Ok(result)
    }

    fn not_found(&self) -> SiteError {
        SiteError::NotFound(self.config.site_name.clone())
    }
}

/// Calendar date in New York at `now`.
pub fn eastern_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&EASTERN).date_naive()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/events/{slug}", get(event_page))
        .route("/artists/{slug}", get(artist_page))
        .route("/venues/{slug}", get(venue_page))
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots))
        .route("/healthz", get(|| async { "ok" }))
        .fallback(fallback)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// GET / - upcoming events across every venue
async fn home(State(state): State<AppState>) -> Result<Html<String>, SiteError> {
    let now = Utc::now();
    let today = eastern_today(now);
    let upcoming = state
        .with_store(move |store| store.upcoming_events(today))
        .await?;

    debug!(candidates = upcoming.len(), "rendering home page");
    Ok(Html(HomePage::build(upcoming, now, state.config()).render()?))
}

/// GET /events/{slug}
async fn event_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, SiteError> {
    let now = Utc::now();
    let today = eastern_today(now);
    let lookup_slug = slug.clone();
    let found = state
        .with_store(move |store| {
            let Some(event) = store.event_by_slug(&lookup_slug)? else {
                return Ok(None);
            };
            let artist_events = match &event.artist {
                Some(artist) => store.events_for_artist(artist.id, today)?,
                None => Vec::new(),
            };
            Ok(Some((event, artist_events)))
        })
        .await?;

    let (event, artist_events) = found.ok_or_else(|| state.not_found())?;
    debug!(%slug, related = artist_events.len(), "rendering event page");
    Ok(Html(
        EventPage::build(event, artist_events, now, state.config()).render()?,
    ))
}

/// GET /artists/{slug}
async fn artist_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, SiteError> {
    let now = Utc::now();
    let today = eastern_today(now);
    let lookup_slug = slug.clone();
    let artist = state
        .with_store(move |store| store.artist_by_slug(&lookup_slug, today))
        .await?
        .ok_or_else(|| state.not_found())?;

    debug!(%slug, events = artist.events.len(), "rendering artist page");
    Ok(Html(ArtistPage::build(artist, now, state.config()).render()?))
}

/// GET /venues/{slug}
async fn venue_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, SiteError> {
    let now = Utc::now();
    let today = eastern_today(now);
    let lookup_slug = slug.clone();
    let found = state
        .with_store(move |store| {
            let Some(venue) = store.venue_by_slug(&lookup_slug)? else {
                return Ok(None);
            };
            let events = store.events_at_venue(venue.id, today)?;
            Ok(Some((venue, events)))
        })
        .await?;

    let (venue, events) = found.ok_or_else(|| state.not_found())?;
    debug!(%slug, events = events.len(), "rendering venue page");
    Ok(Html(
        VenuePage::build(venue, events, now, state.config()).render()?,
    ))
}

async fn sitemap(State(state): State<AppState>) -> Result<Response, SiteError> {
    let slugs = state.with_store(|store| store.sitemap_slugs()).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        sitemap_xml(state.config(), &slugs)?,
    )
        .into_response())
}

async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!(
            "User-agent: *\nAllow: /\nSitemap: {}\n",
            state.config().page_url("/sitemap.xml")
        ),
    )
}

async fn fallback(State(state): State<AppState>) -> Response {
    not_found_response(&state.config().site_name)
}

pub fn sitemap_xml(config: &SiteConfig, slugs: &SitemapSlugs) -> Result<String, askama::Error> {
    let locations = std::iter::once("/".to_string())
        .chain(slugs.events.iter().map(|slug| event_path(slug)))
        .chain(slugs.artists.iter().map(|slug| artist_path(slug)))
        .chain(slugs.venues.iter().map(|slug| venue_path(slug)))
        .map(|path| config.page_url(&path))
        .collect();
    SitemapXml { locations }.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn eastern_today_lags_utc_late_at_night() {
        let now = DateTime::parse_from_rfc3339("2024-07-05T02:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(eastern_today(now), NaiveDate::from_ymd_opt(2024, 7, 4).unwrap());
    }

    #[test_log::test]
    fn sitemap_lists_home_and_every_slug() {
        let config = SiteConfig {
            site_url: "https://jazz.example.com".to_string(),
            ..SiteConfig::default()
        };
        let slugs = SitemapSlugs {
            events: vec!["trio-night".to_string()],
            artists: vec!["r&b-quartet".to_string()],
            venues: vec!["birdland".to_string()],
        };

        let xml = sitemap_xml(&config, &slugs).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("r&amp;b-quartet"));
        assert!(!xml.contains("r&b"));

        let document = scraper::Html::parse_fragment(&xml);
        let selector = scraper::Selector::parse("loc").unwrap();
        let locations: Vec<String> = document
            .select(&selector)
            .map(|loc| loc.text().collect())
            .collect();
        assert_eq!(
            locations,
            vec![
                "https://jazz.example.com/",
                "https://jazz.example.com/events/trio-night",
                "https://jazz.example.com/artists/r&b-quartet",
                "https://jazz.example.com/venues/birdland",
            ]
        );
    }
}
