use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{Artist, ArtistRef, Event, Performer, SocialLinks, Venue};
use crate::utils;

pub struct Store {
    conn: Connection,
}

/// Slugs for every page the sitemap lists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SitemapSlugs {
    pub events: Vec<String>,
    pub artists: Vec<String>,
    pub venues: Vec<String>,
}

const EVENT_SELECT: &str = "
    SELECT e.id, e.slug, e.name, e.date, e.summary, e.set_times, e.ticket_url, e.performers,
           v.id, v.name, v.slug, v.description, v.street_address, v.city, v.region,
           v.postal_code, v.country, v.map_url, v.url,
           a.id, a.slug, a.name, a.website
    FROM events e
    JOIN venues v ON v.id = e.venue_id
    LEFT JOIN artists a ON a.id = e.artist_id";

const VENUE_SELECT: &str = "
    SELECT id, name, slug, description, street_address, city, region, postal_code, country,
           map_url, url
    FROM venues";

impl Store {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an existing database for page rendering. A missing file is an
    /// error and the schema is left untouched.
    pub fn open_read_only(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA query_only = ON;")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS venues(
                id INTEGER PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                description TEXT,
                street_address TEXT,
                city TEXT,
                region TEXT,
                postal_code TEXT,
                country TEXT,
                map_url TEXT,
                url TEXT
            );
            CREATE TABLE IF NOT EXISTS artists(
                id INTEGER PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                biography TEXT,
                website TEXT,
                social_links TEXT NOT NULL DEFAULT '{}',
                videos TEXT NOT NULL DEFAULT '[]'
            );
            CREATE TABLE IF NOT EXISTS events(
                id INTEGER PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                date TEXT NOT NULL,
                summary TEXT,
                set_times TEXT NOT NULL DEFAULT '[]',
                ticket_url TEXT,
                artist_id INTEGER REFERENCES artists(id),
                venue_id INTEGER NOT NULL REFERENCES venues(id),
                performers TEXT NOT NULL DEFAULT '[]'
            );
            CREATE INDEX IF NOT EXISTS events_artist_date ON events(artist_id, date);
            CREATE INDEX IF NOT EXISTS events_venue_date ON events(venue_id, date);",
        )?;
        Ok(())
    }

    pub fn is_empty(&self) -> rusqlite::Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    pub fn upsert_venue(&self, venue: &Venue) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO venues (id, slug, name, description, street_address, city, region,
                                 postal_code, country, map_url, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
               slug = excluded.slug,
               name = excluded.name,
               description = excluded.description,
               street_address = excluded.street_address,
               city = excluded.city,
               region = excluded.region,
               postal_code = excluded.postal_code,
               country = excluded.country,
               map_url = excluded.map_url,
               url = excluded.url",
            params![
                venue.id,
                venue.slug,
                venue.name,
                venue.description,
                venue.street_address,
                venue.city,
                venue.region,
                venue.postal_code,
                venue.country,
                venue.map_url,
                venue.url
            ],
        )?;
        Ok(())
    }

    /// Stores the artist row only; `artist.events` is ignored.
    pub fn upsert_artist(&self, artist: &Artist) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO artists (id, slug, name, biography, website, social_links, videos)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
               slug = excluded.slug,
               name = excluded.name,
               biography = excluded.biography,
               website = excluded.website,
               social_links = excluded.social_links,
               videos = excluded.videos",
            params![
                artist.id,
                artist.slug,
                artist.name,
                artist.biography,
                artist.website,
                encode_json(&artist.social_links)?,
                encode_json(&artist.videos)?
            ],
        )?;
        Ok(())
    }

    /// The event's venue (and artist, if any) must already be stored.
    pub fn upsert_event(&self, event: &Event) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO events (id, slug, name, date, summary, set_times, ticket_url,
                                 artist_id, venue_id, performers)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
               slug = excluded.slug,
               name = excluded.name,
               date = excluded.date,
               summary = excluded.summary,
               set_times = excluded.set_times,
               ticket_url = excluded.ticket_url,
               artist_id = excluded.artist_id,
               venue_id = excluded.venue_id,
               performers = excluded.performers",
            params![
                event.id,
                event.slug,
                event.name,
                event.date,
                event.summary,
                encode_json(&event.set_times)?,
                event.ticket_url,
                event.artist.as_ref().map(|artist| artist.id),
                event.venue.id,
                encode_json(&event.performers)?
            ],
        )?;
        Ok(())
    }

    pub fn event_by_slug(&self, slug: &str) -> rusqlite::Result<Option<Event>> {
        self.conn
            .query_row(
                &format!("{EVENT_SELECT} WHERE e.slug = ?1"),
                params![slug],
                event_from_row,
            )
            .optional()
    }

    /// Artist with their events dated `from` or later, earliest first.
    pub fn artist_by_slug(&self, slug: &str, from: NaiveDate) -> rusqlite::Result<Option<Artist>> {
        let artist = self
            .conn
            .query_row(
                "SELECT id, slug, name, biography, website, social_links, videos
                 FROM artists WHERE slug = ?1",
                params![slug],
                artist_from_row,
            )
            .optional()?;

        match artist {
            Some(mut artist) => {
                artist.events = self.events_for_artist(artist.id, from)?;
                Ok(Some(artist))
            }
            None => Ok(None),
        }
    }

    pub fn events_for_artist(&self, artist_id: i64, from: NaiveDate) -> rusqlite::Result<Vec<Event>> {
        self.query_events(
            &format!(
                "{EVENT_SELECT} WHERE e.artist_id = ?1 AND substr(e.date, 1, 10) >= ?2
                 ORDER BY substr(e.date, 1, 10) ASC, e.id ASC"
            ),
            params![artist_id, day_key(from)],
        )
    }

    pub fn venue_by_slug(&self, slug: &str) -> rusqlite::Result<Option<Venue>> {
        self.conn
            .query_row(
                &format!("{VENUE_SELECT} WHERE slug = ?1"),
                params![slug],
                |row| venue_from_row(row, 0),
            )
            .optional()
    }

    pub fn events_at_venue(&self, venue_id: i64, from: NaiveDate) -> rusqlite::Result<Vec<Event>> {
        self.query_events(
            &format!(
                "{EVENT_SELECT} WHERE e.venue_id = ?1 AND substr(e.date, 1, 10) >= ?2
                 ORDER BY substr(e.date, 1, 10) ASC, e.id ASC"
            ),
            params![venue_id, day_key(from)],
        )
    }

    pub fn upcoming_events(&self, from: NaiveDate) -> rusqlite::Result<Vec<Event>> {
        self.query_events(
            &format!(
                "{EVENT_SELECT} WHERE substr(e.date, 1, 10) >= ?1
                 ORDER BY substr(e.date, 1, 10) ASC, e.id ASC"
            ),
            params![day_key(from)],
        )
    }

    pub fn sitemap_slugs(&self) -> rusqlite::Result<SitemapSlugs> {
        Ok(SitemapSlugs {
            events: self.slugs("SELECT slug FROM events ORDER BY date ASC, id ASC")?,
            artists: self.slugs("SELECT slug FROM artists ORDER BY name ASC")?,
            venues: self.slugs("SELECT slug FROM venues ORDER BY name ASC")?,
        })
    }

    fn slugs(&self, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let slugs = rows.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(slugs)
    }

    fn query_events(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> rusqlite::Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, event_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Fills an empty database with a handful of real Manhattan rooms and
    /// listings dated relative to `today`.
    pub fn seed_if_empty(&self, today: NaiveDate) -> rusqlite::Result<bool> {
        if !self.is_empty()? {
            return Ok(false);
        }

        let vanguard = sample_venue(
            1,
            "Village Vanguard",
            "village-vanguard",
            "178 7th Ave S",
            "10014",
            "https://villagevanguard.com",
        );
        let smalls = sample_venue(
            2,
            "Smalls Jazz Club",
            "smalls-jazz-club",
            "183 W 10th St",
            "10014",
            "https://www.smallslive.com",
        );
        let birdland = sample_venue(
            3,
            "Birdland",
            "birdland",
            "315 W 44th St",
            "10036",
            "https://www.birdlandjazz.com",
        );
        for venue in [&vanguard, &smalls, &birdland] {
            self.upsert_venue(venue)?;
        }

        let trio = Artist {
            id: 1,
            slug: "sample-piano-trio".to_string(),
            name: "Sample Piano Trio".to_string(),
            biography: Some("A working piano trio playing standards and originals.".to_string()),
            website: Some("https://trio.example.com".to_string()),
            social_links: SocialLinks {
                instagram: Some("https://instagram.com/samplepianotrio".to_string()),
                ..SocialLinks::default()
            },
            videos: vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()],
            events: Vec::new(),
        };
        self.upsert_artist(&trio)?;

        let trio_ref = trio.as_ref_entry();
        let samples = [
            (1, &vanguard, 0, vec!["20:00", "22:00"]),
            (2, &smalls, 6, vec!["19:30", "21:00", "23:15"]),
            (3, &birdland, 14, vec!["20:30"]),
            (4, &vanguard, 45, vec![]),
        ];
        for (id, venue, offset, times) in samples {
            let date = today + chrono::Duration::days(offset);
            self.upsert_event(&Event {
                id,
                slug: format!("sample-piano-trio-{}-{}", venue.slug, date.format("%Y-%m-%d")),
                name: format!("Sample Piano Trio at {}", venue.name),
                date: day_key(date),
                summary: Some("Two sets of standards and originals.".to_string()),
                set_times: times.into_iter().map(str::to_string).collect(),
                ticket_url: venue.url.clone(),
                artist: Some(trio_ref.clone()),
                venue: venue.clone(),
                performers: vec![
                    Performer {
                        name: "Sample Pianist".to_string(),
                        instrument: Some("piano".to_string()),
                    },
                    Performer {
                        name: "Sample Bassist".to_string(),
                        instrument: Some("bass".to_string()),
                    },
                ],
            })?;
        }

        Ok(true)
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn encode_json<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
}

fn decode_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let payload: String = row.get(idx)?;
    serde_json::from_str(&payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn venue_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Venue> {
    Ok(Venue {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        slug: row.get(base + 2)?,
        description: row.get(base + 3)?,
        street_address: row.get(base + 4)?,
        city: row.get(base + 5)?,
        region: row.get(base + 6)?,
        postal_code: row.get(base + 7)?,
        country: row.get(base + 8)?,
        map_url: row.get(base + 9)?,
        url: row.get(base + 10)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let artist_id: Option<i64> = row.get(19)?;
    let artist = match artist_id {
        Some(id) => Some(ArtistRef {
            id,
            slug: row.get(20)?,
            name: row.get(21)?,
            website: row.get(22)?,
        }),
        None => None,
    };

    Ok(Event {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        date: row.get(3)?,
        summary: row.get(4)?,
        set_times: decode_json(row, 5)?,
        ticket_url: row.get(6)?,
        performers: decode_json(row, 7)?,
        venue: venue_from_row(row, 8)?,
        artist,
    })
}

fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        biography: row.get(3)?,
        website: row.get(4)?,
        social_links: decode_json(row, 5)?,
        videos: decode_json(row, 6)?,
        events: Vec::new(),
    })
}

fn sample_venue(id: i64, name: &str, slug: &str, street: &str, zip: &str, url: &str) -> Venue {
    Venue {
        id,
        name: name.to_string(),
        slug: slug.to_string(),
        description: Some(format!("{name}, a Manhattan jazz room.")),
        street_address: Some(street.to_string()),
        city: Some("New York".to_string()),
        region: Some("NY".to_string()),
        postal_code: Some(zip.to_string()),
        country: Some("US".to_string()),
        map_url: Some(format!(
            "https://maps.google.com/?q={}",
            format!("{street}, New York, NY {zip}").replace(' ', "+")
        )),
        url: Some(url.to_string()),
    }
}
