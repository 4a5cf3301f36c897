use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use jazz_nyc_lib::config::SiteConfig;
use jazz_nyc_lib::db::Store;
use jazz_nyc_lib::models::{Artist, ArtistRef, Event, Performer, SocialLinks, Venue};
use jazz_nyc_lib::routes::{self, AppState};
use jazz_nyc_lib::timezone;
use scraper::{Html, Selector};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

struct Site {
    _dir: TempDir,
    app: Router,
    today: NaiveDate,
}

fn vanguard() -> Venue {
    Venue {
        id: 1,
        name: "Village Vanguard".to_string(),
        slug: "village-vanguard".to_string(),
        description: Some("Wedge-shaped basement on Seventh Avenue.".to_string()),
        street_address: Some("178 7th Ave S".to_string()),
        city: Some("New York".to_string()),
        region: Some("NY".to_string()),
        postal_code: Some("10014".to_string()),
        country: Some("US".to_string()),
        map_url: Some("https://maps.google.com/?q=178+7th+Ave+S".to_string()),
        url: Some("https://villagevanguard.com".to_string()),
    }
}

fn quartet() -> Artist {
    Artist {
        id: 1,
        slug: "sample-quartet".to_string(),
        name: "Sample Quartet".to_string(),
        biography: Some("Working band, mostly originals.".to_string()),
        website: Some("https://quartet.example.com".to_string()),
        social_links: SocialLinks {
            instagram: Some("https://instagram.com/samplequartet".to_string()),
            ..SocialLinks::default()
        },
        videos: vec!["https://youtu.be/dQw4w9WgXcQ".to_string()],
        events: Vec::new(),
    }
}

fn listing(id: i64, slug: &str, date: NaiveDate, times: &[&str], with_artist: bool) -> Event {
    Event {
        id,
        slug: slug.to_string(),
        name: format!("Listing {slug}"),
        date: date.format("%Y-%m-%d").to_string(),
        summary: Some("Two sets.".to_string()),
        set_times: times.iter().map(|t| t.to_string()).collect(),
        ticket_url: Some("https://tickets.example.com".to_string()),
        artist: with_artist.then(|| ArtistRef {
            id: 1,
            slug: "sample-quartet".to_string(),
            name: "Sample Quartet".to_string(),
            website: Some("https://quartet.example.com".to_string()),
        }),
        venue: vanguard(),
        performers: vec![Performer {
            name: "Sample Pianist".to_string(),
            instrument: Some("piano".to_string()),
        }],
    }
}

fn site() -> Site {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listings.sqlite");
    let today = routes::eastern_today(Utc::now());

    let store = Store::open(&path).unwrap();
    store.upsert_venue(&vanguard()).unwrap();
    store.upsert_artist(&quartet()).unwrap();
    for event in [
        listing(1, "yesterday", today - Duration::days(1), &["20:00"], true),
        listing(2, "tonight", today, &["20:00", "22:00"], true),
        listing(3, "no-times", today + Duration::days(2), &[], false),
        listing(4, "plus-10", today + Duration::days(10), &["21:00"], true),
        listing(5, "plus-40", today + Duration::days(40), &["21:00"], true),
    ] {
        store.upsert_event(&event).unwrap();
    }
    drop(store);

    let config = SiteConfig {
        site_url: "https://jazz.example.com".to_string(),
        database_path: Some(path),
        ..SiteConfig::default()
    };

    Site {
        _dir: dir,
        app: routes::router(AppState::new(config)),
        today,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn json_ld(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    document
        .select(&selector)
        .next()
        .map(|script| serde_json::from_str(&script.text().collect::<String>()).unwrap())
}

fn hrefs(html: &str, css: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(css).unwrap();
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href").map(str::to_string))
        .collect()
}

fn texts(markup: &str, css: &str) -> Vec<String> {
    let document = Html::parse_fragment(markup);
    let selector = Selector::parse(css).unwrap();
    document
        .select(&selector)
        .map(|node| node.text().collect())
        .collect()
}

#[test_log::test(tokio::test)]
async fn event_page_renders_instants_and_more_dates() {
    let site = site();

    let (status, _, html) = get(&site.app, "/events/tonight").await;

    assert_eq!(status, StatusCode::OK);
    let ld = json_ld(&html).expect("json-ld block");
    let offset = timezone::utc_offset(site.today);
    let day = site.today.format("%Y-%m-%d");
    assert_eq!(ld["@type"], "MusicEvent");
    assert_eq!(ld["startDate"], format!("{day}T20:00:00{offset}"));
    assert_eq!(ld["endDate"], format!("{day}T23:30:00{offset}"));
    assert_eq!(ld["location"]["address"]["streetAddress"], "178 7th Ave S");
    assert_eq!(ld["performer"]["name"], "Sample Quartet");
    assert_eq!(ld["url"], "https://jazz.example.com/events/tonight");

    assert_eq!(
        hrefs(&html, ".more-dates a.event-name"),
        vec!["/events/plus-10".to_string()]
    );
    assert_eq!(
        hrefs(&html, r#"link[rel="canonical"]"#),
        vec!["https://jazz.example.com/events/tonight".to_string()]
    );
}

#[test_log::test(tokio::test)]
async fn event_without_set_times_starts_at_zoned_midnight() {
    let site = site();
    let date = site.today + Duration::days(2);

    let (status, _, html) = get(&site.app, "/events/no-times").await;

    assert_eq!(status, StatusCode::OK);
    let ld = json_ld(&html).expect("json-ld block");
    assert_eq!(
        ld["startDate"],
        timezone::eastern_midnight(date).to_rfc3339()
    );
    assert!(ld.get("endDate").is_none());
    assert_eq!(ld["performer"][0]["roleName"], "piano");
    assert!(hrefs(&html, ".more-dates a").is_empty());
}

#[test_log::test(tokio::test)]
async fn unknown_slugs_and_routes_are_not_found() {
    let site = site();

    for uri in ["/events/nope", "/artists/nope", "/venues/nope", "/nowhere"] {
        let (status, _, html) = get(&site.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(html.contains("Page not found"), "{uri}");
    }
}

#[test_log::test(tokio::test)]
async fn artist_page_lists_window_and_links() {
    let site = site();

    let (status, _, html) = get(&site.app, "/artists/sample-quartet").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        hrefs(&html, ".upcoming a.event-name"),
        vec!["/events/tonight".to_string(), "/events/plus-10".to_string()]
    );
    let ld = json_ld(&html).expect("json-ld block");
    assert_eq!(ld["@type"], "MusicGroup");
    assert_eq!(ld["event"].as_array().map(Vec::len), Some(2));
    assert!(hrefs(&html, ".links a").contains(&"https://instagram.com/samplequartet".to_string()));
    assert!(html.contains("<iframe"));
}

#[test_log::test(tokio::test)]
async fn venue_page_carries_address_markup() {
    let site = site();

    let (status, _, html) = get(&site.app, "/venues/village-vanguard").await;

    assert_eq!(status, StatusCode::OK);
    let ld = json_ld(&html).expect("json-ld block");
    assert_eq!(ld["@type"], "MusicVenue");
    assert_eq!(ld["address"]["postalCode"], "10014");
    assert_eq!(ld["url"], "https://jazz.example.com/venues/village-vanguard");
    assert_eq!(
        hrefs(&html, ".upcoming a.event-name"),
        vec![
            "/events/tonight".to_string(),
            "/events/no-times".to_string(),
            "/events/plus-10".to_string(),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn home_page_skips_past_and_far_events() {
    let site = site();

    let (status, _, html) = get(&site.app, "/").await;

    assert_eq!(status, StatusCode::OK);
    let listed = hrefs(&html, "main a.event-name");
    assert_eq!(
        listed,
        vec![
            "/events/tonight".to_string(),
            "/events/no-times".to_string(),
            "/events/plus-10".to_string(),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn sitemap_and_robots() {
    let site = site();

    let (status, content_type, xml) = get(&site.app, "/sitemap.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap_or_default().starts_with("application/xml"));
    let locations = texts(&xml, "loc");
    for expected in [
        "https://jazz.example.com/events/plus-40",
        "https://jazz.example.com/artists/sample-quartet",
        "https://jazz.example.com/venues/village-vanguard",
    ] {
        assert!(locations.iter().any(|loc| loc == expected), "{expected}");
    }

    let (status, _, robots) = get(&site.app, "/robots.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert!(robots.contains("Sitemap: https://jazz.example.com/sitemap.xml"));

    let (status, _, health) = get(&site.app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health, "ok");
}

#[test_log::test(tokio::test)]
async fn missing_database_fails_without_being_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("missing.sqlite");
    let app = routes::router(AppState::new(SiteConfig {
        database_path: Some(path.clone()),
        ..SiteConfig::default()
    }));

    let (status, _, html) = get(&app, "/events/tonight").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!html.contains("Page not found"));
    assert!(!path.exists());
    assert!(!dir.path().join("nested").exists());
}
