//! Wires settings, the local store and the remote calendar together.

use std::sync::Arc;

use anyhow::{Context, Result};
use bookcal_core::provider::{Provider, ProviderCalendar};
use bookcal_core::store::{MemoryStore, Storage};
use bookcal_core::{CalendarSync, DemandLifecycle, Settings, User};

pub struct App {
    settings: Settings,
    store: MemoryStore,
}

impl App {
    pub async fn open(settings: Settings) -> Result<Self> {
        let path = settings.store_path();
        let store = MemoryStore::open(&path)
            .await
            .with_context(|| format!("Failed to open store at {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Store opened");

        Ok(App { settings, store })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// A lifecycle talking to the configured calendar provider.
    pub fn lifecycle(&self) -> DemandLifecycle {
        let remote = &self.settings.remote;
        let provider = Provider::from_name(&remote.provider).with_timeout(self.settings.timeout());
        let calendar = Arc::new(ProviderCalendar::new(provider, remote.params.clone()));

        let sync = CalendarSync::new(calendar.clone(), calendar).with_timeout(self.settings.timeout());

        DemandLifecycle::new(Arc::new(self.store.clone()), sync)
            .with_settings(self.settings.lifecycle())
    }

    pub async fn user_by_email(&self, email: &str) -> Result<User> {
        match self.store.find_user_by_email(email).await? {
            Some(user) => Ok(user),
            None => anyhow::bail!(
                "No user with email {}.\n\
                Register one with `bookcal user add`",
                email
            ),
        }
    }
}
