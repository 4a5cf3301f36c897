//! `<head>` metadata: title, description, canonical link and Open Graph.

use crate::config::SiteConfig;
use crate::models::{Artist, Event, Venue};
use crate::schedule;
use crate::utils::clean_text;

pub const DESCRIPTION_LIMIT: usize = 160;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub canonical_url: Option<String>,
    pub og_type: &'static str,
    pub site_name: String,
}

impl PageMetadata {
    pub fn for_home(config: &SiteConfig) -> Self {
        Self {
            title: format!("{} | NYC jazz listings", config.site_name),
            description: format!(
                "Jazz in New York City over the next {} days: who is playing, where and when.",
                config.look_ahead_days
            ),
            canonical_url: Some(config.page_url("/")),
            og_type: "website",
            site_name: config.site_name.clone(),
        }
    }

    pub fn for_event(event: &Event, config: &SiteConfig) -> Self {
        let fallback = format!(
            "{} at {} on {}.",
            event.title(),
            event.venue.name,
            schedule::format_long_date(&event.date)
        );
        Self {
            title: format!("{} at {} | {}", event.title(), event.venue.name, config.site_name),
            description: describe(event.summary.as_deref(), &fallback),
            canonical_url: Some(config.page_url(&event_path(&event.slug))),
            og_type: "website",
            site_name: config.site_name.clone(),
        }
    }

    pub fn for_artist(artist: &Artist, config: &SiteConfig) -> Self {
        let fallback = format!("Upcoming New York jazz dates for {}.", artist.name);
        Self {
            title: format!("{} | {}", artist.name, config.site_name),
            description: describe(artist.biography.as_deref(), &fallback),
            canonical_url: Some(config.page_url(&artist_path(&artist.slug))),
            og_type: "website",
            site_name: config.site_name.clone(),
        }
    }

    pub fn for_venue(venue: &Venue, config: &SiteConfig) -> Self {
        let fallback = format!("Upcoming jazz at {} in New York City.", venue.name);
        Self {
            title: format!("{} | {}", venue.name, config.site_name),
            description: describe(venue.description.as_deref(), &fallback),
            canonical_url: Some(config.page_url(&venue_path(&venue.slug))),
            og_type: "website",
            site_name: config.site_name.clone(),
        }
    }

    pub fn not_found(site_name: &str) -> Self {
        Self {
            title: format!("Page not found | {site_name}"),
            description: "The page you asked for does not exist.".to_string(),
            canonical_url: None,
            og_type: "website",
            site_name: site_name.to_string(),
        }
    }
}

pub fn event_path(slug: &str) -> String {
    format!("/events/{slug}")
}

pub fn artist_path(slug: &str) -> String {
    format!("/artists/{slug}")
}

pub fn venue_path(slug: &str) -> String {
    format!("/venues/{slug}")
}

fn describe(text: Option<&str>, fallback: &str) -> String {
    let cleaned = text.map(clean_text).unwrap_or_default();
    if cleaned.is_empty() {
        truncate(&clean_text(fallback), DESCRIPTION_LIMIT)
    } else {
        truncate(&cleaned, DESCRIPTION_LIMIT)
    }
}

/// Cuts to at most `limit` characters, ending in `…` when shortened.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
