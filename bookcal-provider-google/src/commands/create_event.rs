use anyhow::{Context, Result};
use bookcal_core::provider::protocol::CreateEvent;
use bookcal_core::remote::RemoteEventId;
use google_calendar::types::SendUpdates;

use crate::session::client_for_token;
use crate::to_google::to_google_event;

pub async fn handle(cmd: CreateEvent) -> Result<RemoteEventId> {
    let client = client_for_token(cmd.session.token());

    // Google assigns the event id.
    let google_event = to_google_event(&cmd.draft);

    let response = client
        .events()
        .insert(
            &cmd.calendar.id,
            0,
            0,
            false,
            SendUpdates::None,
            false,
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to create event in calendar {}", cmd.calendar.id))?;

    Ok(RemoteEventId::new(response.body.id))
}
