//! schema.org JSON-LD for event, artist and venue pages.
//!
//! Optional fields are left out of the object entirely rather than written
//! as `null`.

use serde_json::{json, Map, Value};

use crate::models::{Artist, Event, Venue};
use crate::schedule::EventInstants;

const CONTEXT: &str = "https://schema.org";

fn put(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

pub fn postal_address(venue: &Venue) -> Option<Value> {
    let mut address = Map::new();
    put(&mut address, "streetAddress", venue.street_address.as_deref());
    put(&mut address, "addressLocality", venue.city.as_deref());
    put(&mut address, "addressRegion", venue.region.as_deref());
    put(&mut address, "postalCode", venue.postal_code.as_deref());
    put(&mut address, "addressCountry", venue.country.as_deref());
    if address.is_empty() {
        return None;
    }
    address.insert("@type".to_string(), json!("PostalAddress"));
    Some(Value::Object(address))
}

/// `MusicVenue` node. `page_url` is our own venue page when we have one.
pub fn music_venue(venue: &Venue, page_url: Option<&str>) -> Value {
    let mut node = Map::new();
    node.insert("@type".to_string(), json!("MusicVenue"));
    node.insert("name".to_string(), json!(venue.name));
    put(&mut node, "description", venue.description.as_deref());
    if let Some(address) = postal_address(venue) {
        node.insert("address".to_string(), address);
    }
    put(&mut node, "hasMap", venue.map_url.as_deref());
    put(&mut node, "url", page_url.or(venue.url.as_deref()));
    if page_url.is_some() {
        if let Some(external) = venue.url.as_deref().filter(|u| !u.trim().is_empty()) {
            node.insert("sameAs".to_string(), json!([external]));
        }
    }
    Value::Object(node)
}

fn performers(event: &Event) -> Option<Value> {
    if let Some(artist) = &event.artist {
        let mut group = Map::new();
        group.insert("@type".to_string(), json!("MusicGroup"));
        group.insert("name".to_string(), json!(artist.name));
        put(&mut group, "url", artist.website.as_deref());
        return Some(Value::Object(group));
    }

    let people: Vec<Value> = event
        .performers
        .iter()
        .filter(|p| !p.name.trim().is_empty())
        .map(|p| {
            let mut person = Map::new();
            person.insert("@type".to_string(), json!("Person"));
            person.insert("name".to_string(), json!(p.name.trim()));
            put(&mut person, "roleName", p.instrument.as_deref());
            Value::Object(person)
        })
        .collect();
    if people.is_empty() {
        None
    } else {
        Some(Value::Array(people))
    }
}

/// Full `MusicEvent` document for an event page.
///
/// `instants` is `None` when the stored date could not be read; the node is
/// then emitted without dates and callers usually skip it.
pub fn music_event(
    event: &Event,
    instants: Option<&EventInstants>,
    page_url: &str,
    venue_page_url: Option<&str>,
) -> Value {
    let mut node = Map::new();
    node.insert("@context".to_string(), json!(CONTEXT));
    node.insert("@type".to_string(), json!("MusicEvent"));
    node.insert("name".to_string(), json!(event.title()));
    if let Some(instants) = instants {
        node.insert("startDate".to_string(), json!(instants.start));
        put(&mut node, "endDate", instants.end.as_deref());
    }
    node.insert(
        "eventStatus".to_string(),
        json!("https://schema.org/EventScheduled"),
    );
    node.insert(
        "eventAttendanceMode".to_string(),
        json!("https://schema.org/OfflineEventAttendanceMode"),
    );
    put(&mut node, "description", event.summary.as_deref());
    node.insert(
        "location".to_string(),
        music_venue(&event.venue, venue_page_url),
    );
    if let Some(performer) = performers(event) {
        node.insert("performer".to_string(), performer);
    }
    if let Some(ticket_url) = event.ticket_url.as_deref().filter(|u| !u.trim().is_empty()) {
        node.insert(
            "offers".to_string(),
            json!({
                "@type": "Offer",
                "url": ticket_url.trim(),
                "availability": "https://schema.org/InStock",
            }),
        );
    }
    node.insert("url".to_string(), json!(page_url));
    Value::Object(node)
}

/// Condensed `MusicEvent` used inside an artist's `event` list.
pub fn event_summary(event: &Event, instants: &EventInstants, page_url: &str) -> Value {
    let mut node = Map::new();
    node.insert("@type".to_string(), json!("MusicEvent"));
    node.insert("name".to_string(), json!(event.title()));
    node.insert("startDate".to_string(), json!(instants.start));
    put(&mut node, "endDate", instants.end.as_deref());
    node.insert(
        "location".to_string(),
        json!({ "@type": "MusicVenue", "name": event.venue.name }),
    );
    node.insert("url".to_string(), json!(page_url));
    Value::Object(node)
}

pub fn music_group(artist: &Artist, page_url: &str, events: Vec<Value>) -> Value {
    let mut node = Map::new();
    node.insert("@context".to_string(), json!(CONTEXT));
    node.insert("@type".to_string(), json!("MusicGroup"));
    node.insert("name".to_string(), json!(artist.name));
    put(&mut node, "description", artist.biography.as_deref());
    node.insert("url".to_string(), json!(page_url));

    let same_as: Vec<&str> = artist
        .website
        .as_deref()
        .into_iter()
        .chain(artist.social_links.labelled().into_iter().map(|(_, url)| url))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .collect();
    if !same_as.is_empty() {
        node.insert("sameAs".to_string(), json!(same_as));
    }
    if !events.is_empty() {
        node.insert("event".to_string(), Value::Array(events));
    }
    Value::Object(node)
}

pub fn venue_document(venue: &Venue, page_url: &str) -> Value {
    let mut node = match music_venue(venue, Some(page_url)) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    node.insert("@context".to_string(), json!(CONTEXT));
    Value::Object(node)
}

/// Serialises for an inline `<script type="application/ld+json">` block.
pub fn to_script_body(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtistRef, Performer, SocialLinks};

    fn venue() -> Venue {
        Venue {
            id: 1,
            name: "Village Vanguard".to_string(),
            slug: "village-vanguard".to_string(),
            description: None,
            street_address: Some("178 7th Ave S".to_string()),
            city: Some("New York".to_string()),
            region: Some("NY".to_string()),
            postal_code: Some("10014".to_string()),
            country: None,
            map_url: Some("https://maps.google.com/?q=178+7th+Ave+S".to_string()),
            url: Some("https://villagevanguard.com".to_string()),
        }
    }

    fn event() -> Event {
        Event {
            id: 1,
            slug: "trio-night".to_string(),
            name: "Trio Night".to_string(),
            date: "2024-07-04".to_string(),
            summary: None,
            set_times: vec!["20:00".to_string(), "22:00".to_string()],
            ticket_url: Some("https://tickets.example.com/trio".to_string()),
            artist: None,
            venue: venue(),
            performers: vec![
                Performer {
                    name: "Sample Pianist".to_string(),
                    instrument: Some("piano".to_string()),
                },
                Performer {
                    name: "Sample Drummer".to_string(),
                    instrument: None,
                },
            ],
        }
    }

    fn instants() -> EventInstants {
        EventInstants {
            start: "2024-07-04T20:00:00-04:00".to_string(),
            end: Some("2024-07-04T23:30:00-04:00".to_string()),
        }
    }

    #[test_log::test]
    fn music_event_carries_dates_location_and_offer() {
        let doc = music_event(
            &event(),
            Some(&instants()),
            "https://jazz.example.com/events/trio-night",
            Some("https://jazz.example.com/venues/village-vanguard"),
        );

        assert_eq!(doc["@type"], "MusicEvent");
        assert_eq!(doc["startDate"], "2024-07-04T20:00:00-04:00");
        assert_eq!(doc["endDate"], "2024-07-04T23:30:00-04:00");
        assert_eq!(doc["location"]["address"]["postalCode"], "10014");
        assert_eq!(doc["location"]["sameAs"][0], "https://villagevanguard.com");
        assert_eq!(doc["offers"]["url"], "https://tickets.example.com/trio");
        assert!(doc.get("description").is_none());
        assert!(doc["location"]["address"].get("addressCountry").is_none());
    }

    #[test_log::test]
    fn performers_list_people_when_no_artist() {
        let doc = music_event(&event(), Some(&instants()), "https://x/events/trio-night", None);

        assert_eq!(doc["performer"][0]["roleName"], "piano");
        assert!(doc["performer"][1].get("roleName").is_none());
        assert_eq!(doc["location"]["url"], "https://villagevanguard.com");
    }

    #[test_log::test]
    fn artist_replaces_performer_list() {
        let mut event = event();
        event.artist = Some(ArtistRef {
            id: 2,
            slug: "sample-trio".to_string(),
            name: "Sample Trio".to_string(),
            website: None,
        });

        let doc = music_event(&event, None, "https://x/events/trio-night", None);

        assert_eq!(doc["performer"]["@type"], "MusicGroup");
        assert!(doc.get("startDate").is_none());
    }

    #[test_log::test]
    fn music_group_collects_same_as_links() {
        let artist = Artist {
            id: 2,
            slug: "sample-trio".to_string(),
            name: "Sample Trio".to_string(),
            biography: Some("Standards.".to_string()),
            website: Some("https://trio.example.com".to_string()),
            social_links: SocialLinks {
                bandcamp: Some("https://sampletrio.bandcamp.com".to_string()),
                ..SocialLinks::default()
            },
            videos: Vec::new(),
            events: Vec::new(),
        };

        let doc = music_group(&artist, "https://x/artists/sample-trio", Vec::new());

        assert_eq!(
            doc["sameAs"],
            json!(["https://trio.example.com", "https://sampletrio.bandcamp.com"])
        );
        assert!(doc.get("event").is_none());
    }

    #[test_log::test]
    fn script_body_escapes_closing_tags() {
        let body = to_script_body(&json!({ "description": "</script><b>" }));
        assert!(!body.contains("</"));
    }
}
