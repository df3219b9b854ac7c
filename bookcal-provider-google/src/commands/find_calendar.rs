use anyhow::{Context, Result};
use bookcal_core::provider::protocol::FindCalendar;
use bookcal_core::remote::RemoteCalendarInfo;
use google_calendar::types::MinAccessRole;

use crate::errors::NotFound;
use crate::session::client_for_token;

/// Google's alias for the account's main calendar
const PRIMARY_CALENDAR_ID: &str = "primary";

pub async fn handle(cmd: FindCalendar) -> Result<RemoteCalendarInfo> {
    let client = client_for_token(cmd.session.token());

    let calendars = client
        .calendar_list()
        .list_all(MinAccessRole::default(), false, false)
        .await
        .context("Failed to fetch calendars")?
        .body;

    let calendar = calendars
        .into_iter()
        .find(|cal| {
            cal.id == cmd.calendar_ref || (cmd.calendar_ref == PRIMARY_CALENDAR_ID && cal.primary)
        })
        .ok_or_else(|| NotFound(format!("Calendar {}", cmd.calendar_ref)))?;

    Ok(RemoteCalendarInfo {
        id: calendar.id,
        name: Some(calendar.summary).filter(|s| !s.is_empty()),
    })
}
