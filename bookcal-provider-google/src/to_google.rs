//! Conversion between bookcal event drafts and Google events.
//!
//! Google all-day events end on the day *after* the last day; bookcal bounds
//! are inclusive on both ends.

use anyhow::Result;
use bookcal_core::remote::{RemoteEvent, RemoteEventDraft, RemoteEventId};
use chrono::{Days, NaiveDate};
use google_calendar::types::{Event, EventDateTime};

fn all_day(date: NaiveDate) -> EventDateTime {
    EventDateTime {
        date: Some(date),
        date_time: None,
        time_zone: String::new(),
    }
}

pub fn to_google_event(draft: &RemoteEventDraft) -> Event {
    let end = if draft.all_day {
        draft.end.checked_add_days(Days::new(1)).unwrap_or(draft.end)
    } else {
        draft.end
    };

    Event {
        summary: draft.title.clone(),
        start: Some(all_day(draft.start)),
        end: Some(all_day(end)),
        ..Default::default()
    }
}

fn event_date(time: &EventDateTime) -> Option<NaiveDate> {
    time.date.or_else(|| time.date_time.map(|dt| dt.date_naive()))
}

pub fn from_google_event(event: Event, calendar_id: &str) -> Result<RemoteEvent> {
    let start = event
        .start
        .as_ref()
        .and_then(event_date)
        .ok_or_else(|| anyhow::anyhow!("Event {} has no start", event.id))?;
    let end = event
        .end
        .as_ref()
        .and_then(event_date)
        .ok_or_else(|| anyhow::anyhow!("Event {} has no end", event.id))?;

    let all_day = event.start.as_ref().is_some_and(|s| s.date.is_some());
    let end = if all_day {
        end.checked_sub_days(Days::new(1)).unwrap_or(end)
    } else {
        end
    };

    Ok(RemoteEvent {
        id: RemoteEventId::new(event.id),
        calendar_id: calendar_id.to_string(),
        all_day,
        start,
        end,
        title: event.summary,
    })
}
