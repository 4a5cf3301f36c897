use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::Event;
use crate::schedule;
use crate::timezone;

/// Events dated no later than `now + horizon_days`, minus the one being
/// viewed.
///
/// Input order is kept as-is; the store already sorts by date.
/// Events with an unreadable date are dropped.
pub fn upcoming_within(
    events: Vec<Event>,
    current_slug: Option<&str>,
    now: DateTime<Utc>,
    horizon_days: i64,
) -> Vec<Event> {
    let cutoff = Duration::try_days(horizon_days)
        .and_then(|horizon| now.checked_add_signed(horizon))
        .unwrap_or(if horizon_days < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });

    events
        .into_iter()
        .filter(|event| current_slug != Some(event.slug.as_str()))
        .filter(|event| match schedule::parse_event_date(&event.date) {
            Ok(day) => timezone::eastern_midnight(day).with_timezone(&Utc) <= cutoff,
            Err(err) => {
                debug!(slug = %event.slug, "skipping event: {err}");
                false
            }
        })
        .collect()
}
