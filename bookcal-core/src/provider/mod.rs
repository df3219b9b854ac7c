//! Provider subprocess protocol.
//!
//! This module handles communication with external provider binaries
//! (e.g., `bookcal-provider-google`) using JSON over stdin/stdout.
//!
//! Providers manage their own credentials and tokens. Core just passes
//! provider-specific parameters from the `[remote]` settings.

pub mod protocol;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{AuthError, ProviderError, RemoteError};
use crate::remote::{
    AuthProvider, RemoteCalendar, RemoteCalendarInfo, RemoteEvent, RemoteEventDraft,
    RemoteEventId, SessionHandle,
};
use protocol::{
    Authenticate, Command, CreateEvent, DeleteEvent, ErrorKind, FindCalendar, FindEvent,
    ProviderCommand, RemoteConfig, Request, Response, UpdateEvent,
};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct Provider {
    name: String,
    timeout: Duration,
}

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider {
            name: name.to_string(),
            timeout: PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn binary_name(&self) -> String {
        format!("bookcal-provider-{}", self.name)
    }

    fn binary_path(&self) -> Result<std::path::PathBuf, ProviderError> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| ProviderError::NotInstalled(binary_name))
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> Result<C::Response, ProviderError> {
        timeout(self.timeout, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> Result<R, ProviderError> {
        let params = serde_json::to_value(params)
            .map_err(|e| ProviderError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| ProviderError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.name, ?command, "Calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ProviderError::Process(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Process("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ProviderError::Process(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(ProviderError::Process(
                "Provider returned no response".into(),
            ));
        }

        let response: Response<R> = serde_json::from_str(response_str.trim())
            .map_err(|e| ProviderError::Process(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { kind, error } => Err(ProviderError::Remote {
                kind,
                message: error,
            }),
        }
    }
}

impl From<ProviderError> for RemoteError {
    fn from(error: ProviderError) -> Self {
        let message = error.to_string();
        match error {
            ProviderError::Remote {
                kind: ErrorKind::NotFound,
                ..
            } => RemoteError::not_found(message),
            ProviderError::Remote {
                kind: ErrorKind::Rejected | ErrorKind::Auth,
                ..
            }
            | ProviderError::NotInstalled(_) => RemoteError::rejected(message),
            ProviderError::Remote {
                kind: ErrorKind::Transport,
                ..
            }
            | ProviderError::Timeout(_)
            | ProviderError::Process(_)
            | ProviderError::Io(_)
            | ProviderError::Serialization(_) => RemoteError::transport(message),
        }
    }
}

/// The remote calendar behind a provider binary.
#[derive(Clone, Debug)]
pub struct ProviderCalendar {
    provider: Provider,
    remote_config: RemoteConfig,
}

impl ProviderCalendar {
    pub fn new(provider: Provider, remote_config: RemoteConfig) -> Self {
        ProviderCalendar {
            provider,
            remote_config,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

#[async_trait]
impl AuthProvider for ProviderCalendar {
    async fn authenticate(&self) -> Result<SessionHandle, AuthError> {
        self.provider
            .call(Authenticate {
                remote_config: self.remote_config.clone(),
            })
            .await
            .map_err(|e| AuthError(e.to_string()))
    }
}

#[async_trait]
impl RemoteCalendar for ProviderCalendar {
    async fn find_calendar(
        &self,
        calendar_ref: &str,
        session: &SessionHandle,
    ) -> Result<RemoteCalendarInfo, RemoteError> {
        let cmd = FindCalendar {
            remote_config: self.remote_config.clone(),
            session: session.clone(),
            calendar_ref: calendar_ref.to_string(),
        };
        Ok(self.provider.call(cmd).await?)
    }

    async fn create_event(
        &self,
        draft: &RemoteEventDraft,
        calendar: &RemoteCalendarInfo,
        session: &SessionHandle,
    ) -> Result<RemoteEventId, RemoteError> {
        let cmd = CreateEvent {
            remote_config: self.remote_config.clone(),
            session: session.clone(),
            calendar: calendar.clone(),
            draft: draft.clone(),
        };
        Ok(self.provider.call(cmd).await?)
    }

    async fn find_event(
        &self,
        id: &RemoteEventId,
        calendar: &RemoteCalendarInfo,
        session: &SessionHandle,
    ) -> Result<RemoteEvent, RemoteError> {
        let cmd = FindEvent {
            remote_config: self.remote_config.clone(),
            session: session.clone(),
            calendar: calendar.clone(),
            event_id: id.clone(),
        };
        Ok(self.provider.call(cmd).await?)
    }

    async fn update_event(
        &self,
        event: &RemoteEvent,
        draft: &RemoteEventDraft,
        session: &SessionHandle,
    ) -> Result<(), RemoteError> {
        let cmd = UpdateEvent {
            remote_config: self.remote_config.clone(),
            session: session.clone(),
            event: event.clone(),
            draft: draft.clone(),
        };
        Ok(self.provider.call(cmd).await?)
    }

    async fn delete_event(
        &self,
        event: &RemoteEvent,
        session: &SessionHandle,
    ) -> Result<(), RemoteError> {
        let cmd = DeleteEvent {
            remote_config: self.remote_config.clone(),
            session: session.clone(),
            event: event.clone(),
        };
        Ok(self.provider.call(cmd).await?)
    }
}
