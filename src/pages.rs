use askama::Template;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::SiteConfig;
use crate::media::{self, VideoEmbed};
use crate::metadata::{artist_path, event_path, venue_path, PageMetadata};
use crate::models::{Artist, Event, Venue};
use crate::schedule::{self, EventInstants, InstantOptions};
use crate::structured;
use crate::window;

pub struct LinkView {
    pub label: String,
    pub url: String,
}

pub struct PerformerView {
    pub name: String,
    pub instrument: Option<String>,
}

pub struct VenueView {
    pub name: String,
    pub url: String,
    pub address: Option<String>,
    pub map_url: Option<String>,
    pub website: Option<String>,
}

impl VenueView {
    fn from_venue(venue: &Venue) -> Self {
        Self {
            name: venue.name.clone(),
            url: venue_path(&venue.slug),
            address: venue.address_line(),
            map_url: venue.map_url.clone(),
            website: venue.url.clone(),
        }
    }
}

/// One row in an event listing.
pub struct EventCard {
    pub name: String,
    pub url: String,
    pub date_label: String,
    pub times_label: Option<String>,
    pub venue_name: String,
    pub venue_url: String,
}

impl EventCard {
    pub fn from_event(event: &Event) -> Self {
        Self {
            name: event.title(),
            url: event_path(&event.slug),
            date_label: schedule::format_short_date(&event.date),
            times_label: schedule::display_set_times(&event.set_times),
            venue_name: event.venue.name.clone(),
            venue_url: venue_path(&event.venue.slug),
        }
    }
}

fn cards(events: &[Event]) -> Vec<EventCard> {
    events.iter().map(EventCard::from_event).collect()
}

fn instants_or_warn(event: &Event, options: &InstantOptions) -> Option<EventInstants> {
    match schedule::event_instants(&event.date, &event.set_times, options) {
        Ok(instants) => Some(instants),
        Err(err) => {
            warn!(slug = %event.slug, "no structured data for event: {err}");
            None
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub meta: PageMetadata,
    pub json_ld: Option<String>,
    pub look_ahead_days: i64,
    pub events: Vec<EventCard>,
}

impl HomePage {
    pub fn build(upcoming: Vec<Event>, now: DateTime<Utc>, config: &SiteConfig) -> Self {
        let events = window::upcoming_within(upcoming, None, now, config.look_ahead_days);
        Self {
            meta: PageMetadata::for_home(config),
            json_ld: None,
            look_ahead_days: config.look_ahead_days,
            events: cards(&events),
        }
    }
}

#[derive(Template)]
#[template(path = "event.html")]
pub struct EventPage {
    pub meta: PageMetadata,
    pub json_ld: Option<String>,
    pub name: String,
    pub date_label: String,
    pub times_label: Option<String>,
    pub summary: Option<String>,
    pub ticket_url: Option<String>,
    pub artist: Option<LinkView>,
    pub venue: VenueView,
    pub performers: Vec<PerformerView>,
    pub more_dates: Vec<EventCard>,
}

impl EventPage {
    /// `artist_events` are the artist's upcoming events in date order; the
    /// page keeps those inside the look-ahead window, minus this event.
    pub fn build(
        event: Event,
        artist_events: Vec<Event>,
        now: DateTime<Utc>,
        config: &SiteConfig,
    ) -> Self {
        let meta = PageMetadata::for_event(&event, config);
        let page_url = config.page_url(&event_path(&event.slug));
        let venue_url = config.page_url(&venue_path(&event.venue.slug));

        let json_ld = instants_or_warn(&event, &config.instant_options()).map(|instants| {
            structured::to_script_body(&structured::music_event(
                &event,
                Some(&instants),
                &page_url,
                Some(&venue_url),
            ))
        });

        let more_dates = window::upcoming_within(
            artist_events,
            Some(event.slug.as_str()),
            now,
            config.look_ahead_days,
        );

        Self {
            meta,
            json_ld,
            name: event.title(),
            date_label: schedule::format_long_date(&event.date),
            times_label: schedule::display_set_times(&event.set_times),
            summary: event.summary.clone().filter(|s| !s.trim().is_empty()),
            ticket_url: event.ticket_url.clone().filter(|u| !u.trim().is_empty()),
            artist: event.artist.as_ref().map(|artist| LinkView {
                label: artist.name.clone(),
                url: artist_path(&artist.slug),
            }),
            venue: VenueView::from_venue(&event.venue),
            performers: event
                .performers
                .iter()
                .map(|p| PerformerView {
                    name: p.name.clone(),
                    instrument: p.instrument.clone().filter(|i| !i.trim().is_empty()),
                })
                .collect(),
            more_dates: cards(&more_dates),
        }
    }
}

#[derive(Template)]
#[template(path = "artist.html")]
pub struct ArtistPage {
    pub meta: PageMetadata,
    pub json_ld: Option<String>,
    pub name: String,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub social: Vec<LinkView>,
    pub videos: Vec<VideoEmbed>,
    pub events: Vec<EventCard>,
}

impl ArtistPage {
    pub fn build(mut artist: Artist, now: DateTime<Utc>, config: &SiteConfig) -> Self {
        let meta = PageMetadata::for_artist(&artist, config);
        let page_url = config.page_url(&artist_path(&artist.slug));
        let options = config.instant_options();

        let events = window::upcoming_within(
            std::mem::take(&mut artist.events),
            None,
            now,
            config.look_ahead_days,
        );
        let event_nodes = events
            .iter()
            .filter_map(|event| {
                let instants = instants_or_warn(event, &options)?;
                let url = config.page_url(&event_path(&event.slug));
                Some(structured::event_summary(event, &instants, &url))
            })
            .collect::<Vec<_>>();
        let json_ld = structured::to_script_body(&structured::music_group(
            &artist,
            &page_url,
            event_nodes,
        ));

        Self {
            meta,
            json_ld: Some(json_ld),
            social: artist
                .social_links
                .labelled()
                .into_iter()
                .map(|(label, url)| LinkView {
                    label: label.to_string(),
                    url: url.trim().to_string(),
                })
                .collect(),
            videos: media::embeds_for(&artist.videos),
            events: cards(&events),
            name: artist.name,
            biography: artist.biography.filter(|b| !b.trim().is_empty()),
            website: artist.website.filter(|w| !w.trim().is_empty()),
        }
    }
}

#[derive(Template)]
#[template(path = "venue.html")]
pub struct VenuePage {
    pub meta: PageMetadata,
    pub json_ld: Option<String>,
    pub description: Option<String>,
    pub venue: VenueView,
    pub events: Vec<EventCard>,
}

impl VenuePage {
    pub fn build(
        venue: Venue,
        upcoming: Vec<Event>,
        now: DateTime<Utc>,
        config: &SiteConfig,
    ) -> Self {
        let page_url = config.page_url(&venue_path(&venue.slug));
        let events = window::upcoming_within(upcoming, None, now, config.look_ahead_days);
        Self {
            meta: PageMetadata::for_venue(&venue, config),
            json_ld: Some(structured::to_script_body(&structured::venue_document(
                &venue, &page_url,
            ))),
            description: venue.description.clone().filter(|d| !d.trim().is_empty()),
            venue: VenueView::from_venue(&venue),
            events: cards(&events),
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub meta: PageMetadata,
    pub json_ld: Option<String>,
}

impl NotFoundPage {
    pub fn for_site(site_name: &str) -> Self {
        Self {
            meta: PageMetadata::not_found(site_name),
            json_ld: None,
        }
    }
}

/// `sitemap.xml`; askama's xml escaper handles `&` and quotes in slugs.
#[derive(Template)]
#[template(path = "sitemap.xml")]
pub struct SitemapXml {
    pub locations: Vec<String>,
}
