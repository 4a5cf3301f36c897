use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub map_url: Option<String>,
    pub url: Option<String>,
}

impl Venue {
    /// One-line postal address, skipping whatever parts are missing.
    pub fn address_line(&self) -> Option<String> {
        let locality = [self.city.as_deref(), self.region.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        let locality = match self.postal_code.as_deref() {
            Some(zip) if !locality.is_empty() => format!("{locality} {zip}"),
            Some(zip) => zip.to_string(),
            None => locality,
        };

        let parts = [self.street_address.clone(), Some(locality)]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SocialLinks {
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub youtube: Option<String>,
    pub bandcamp: Option<String>,
}

impl SocialLinks {
    pub fn labelled(&self) -> Vec<(&'static str, &str)> {
        [
            ("Instagram", self.instagram.as_deref()),
            ("Facebook", self.facebook.as_deref()),
            ("Twitter", self.twitter.as_deref()),
            ("YouTube", self.youtube.as_deref()),
            ("Bandcamp", self.bandcamp.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.filter(|u| !u.trim().is_empty()).map(|u| (label, u)))
        .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Performer {
    pub name: String,
    #[serde(default)]
    pub instrument: Option<String>,
}

/// The slice of an artist an event row carries along.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub website: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub date: String, // YYYY-MM-DD, as entered upstream
    pub summary: Option<String>,
    pub set_times: Vec<String>,
    pub ticket_url: Option<String>,
    pub artist: Option<ArtistRef>,
    pub venue: Venue,
    pub performers: Vec<Performer>,
}

impl Event {
    pub fn title(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.clone();
        }
        if let Some(artist) = self.artist.as_ref().filter(|a| !a.name.trim().is_empty()) {
            return artist.name.clone();
        }
        if !self.venue.name.trim().is_empty() {
            return format!("Live at {}", self.venue.name.trim());
        }
        "Untitled Event".to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub social_links: SocialLinks,
    pub videos: Vec<String>,
    pub events: Vec<Event>,
}

impl Artist {
    pub fn as_ref_entry(&self) -> ArtistRef {
        ArtistRef {
            id: self.id,
            slug: self.slug.clone(),
            name: self.name.clone(),
            website: self.website.clone(),
        }
    }
}
