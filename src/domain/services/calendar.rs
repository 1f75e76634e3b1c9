use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};
use url::Url;

use crate::domain::models::event::Event;
use crate::error::AppError;

const GOOGLE_CALENDAR_URL: &str = "https://calendar.google.com/calendar/render";

fn google_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

fn event_window(event: &Event) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = event.starts_at()
        .ok_or_else(|| AppError::Validation(format!("Event has an invalid start time '{}'", event.start_time)))?;
    let end = event.ends_at().unwrap_or(start);
    Ok((start, end))
}

/// "Add to Google Calendar" template link.
pub fn google_calendar_url(event: &Event) -> Result<String, AppError> {
    let (start, end) = event_window(event)?;

    let mut url = Url::parse(GOOGLE_CALENDAR_URL)
        .map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("action", "TEMPLATE");
        query.append_pair("text", &event.title);
        query.append_pair("dates", &format!("{}/{}", google_stamp(start), google_stamp(end)));
        if !event.location.is_empty() {
            query.append_pair("location", &event.location);
        }
        query.append_pair("details", &event.description);
    }
    Ok(url.into())
}

/// Generates an iCalendar (.ics) document for the event
pub fn generate_ics(event: &Event) -> Result<String, AppError> {
    let (start, end) = event_window(event)?;
    let mut calendar = Calendar::new();

    let mut ical_event = IcalEvent::new();
    ical_event
        .summary(&event.title)
        .description(&event.description)
        .starts(start)
        .ends(end)
        .uid(&event.id);
    if !event.location.is_empty() {
        ical_event.location(&event.location);
    }

    calendar.push(ical_event.done());
    Ok(calendar.to_string())
}

pub fn ics_filename(event: &Event) -> String {
    let stem = event.title.split_whitespace().collect::<Vec<_>>().join("_");
    if stem.is_empty() {
        "event.ics".to_string()
    } else {
        format!("{}.ics", stem)
    }
}
