use anyhow::Result;
use bookcal_core::provider::protocol::Authenticate;
use bookcal_core::remote::SessionHandle;

use crate::remote_config::GoogleRemoteConfig;
use crate::session::Session;

pub async fn handle(cmd: Authenticate) -> Result<SessionHandle> {
    let config = GoogleRemoteConfig::try_from(&cmd.remote_config)?;
    let session = Session::load_valid(&config.google_account).await?;

    Ok(SessionHandle::new(session.access_token()))
}
