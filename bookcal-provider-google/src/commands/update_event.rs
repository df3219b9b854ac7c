use anyhow::{Context, Result};
use bookcal_core::provider::protocol::UpdateEvent;
use google_calendar::types::SendUpdates;

use crate::session::client_for_token;
use crate::to_google::to_google_event;

pub async fn handle(cmd: UpdateEvent) -> Result<()> {
    let client = client_for_token(cmd.session.token());

    let mut google_event = to_google_event(&cmd.draft);
    google_event.id = cmd.event.id.as_str().to_string();

    client
        .events()
        .update(
            &cmd.event.calendar_id,
            cmd.event.id.as_str(),
            0,
            0,
            false,
            SendUpdates::None,
            false,
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to update event: {}", cmd.event.id))?;

    Ok(())
}
