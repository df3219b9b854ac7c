use anyhow::{Context, Result};
use bookcal_core::provider::protocol::FindEvent;
use bookcal_core::remote::RemoteEvent;

use crate::errors::NotFound;
use crate::session::client_for_token;
use crate::to_google::from_google_event;

pub async fn handle(cmd: FindEvent) -> Result<RemoteEvent> {
    let client = client_for_token(cmd.session.token());
    let calendar_id = &cmd.calendar.id;

    let response = client
        .events()
        .get(calendar_id, cmd.event_id.as_str(), 0, "")
        .await
        .with_context(|| format!("Failed to fetch event: {}", cmd.event_id))?;

    let event = response.body;

    // Deleted events stay fetchable with status "cancelled".
    if event.status == "cancelled" {
        return Err(NotFound(format!("Event {}", cmd.event_id)).into());
    }

    from_google_event(event, calendar_id)
}
