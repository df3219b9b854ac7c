//! Google-specific remote configuration, read from the flattened
//! `[remote]` parameters of each request.

use anyhow::Result;
use bookcal_core::provider::protocol::RemoteConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleRemoteConfig {
    pub google_account: String,
}

impl TryFrom<&RemoteConfig> for GoogleRemoteConfig {
    type Error = anyhow::Error;

    fn try_from(map: &RemoteConfig) -> Result<Self> {
        let google_account = map
            .get("google_account")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing required field: google_account"))?
            .to_string();

        Ok(Self { google_account })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_google_account() {
        let mut map = RemoteConfig::new();
        assert!(GoogleRemoteConfig::try_from(&map).is_err());

        map.insert("google_account".into(), json!("studio@example.com"));
        let config = GoogleRemoteConfig::try_from(&map).unwrap();
        assert_eq!(config.google_account, "studio@example.com");
    }
}
