use anyhow::{Context, Result};
use bookcal_core::provider::protocol::DeleteEvent;
use google_calendar::types::SendUpdates;

use crate::session::client_for_token;

pub async fn handle(cmd: DeleteEvent) -> Result<()> {
    let client = client_for_token(cmd.session.token());
    let event_id = cmd.event.id.as_str();

    client
        .events()
        .delete(&cmd.event.calendar_id, event_id, false, SendUpdates::None)
        .await
        .with_context(|| format!("Failed to delete event: {}", event_id))?;

    Ok(())
}
