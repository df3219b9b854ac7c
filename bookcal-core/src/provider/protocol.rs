//! Defines the JSON protocol used between bookcal and provider binaries
//! over stdin/stdout.
//!
//! Every request carries the provider parameters from settings
//! (`remote_config`, flattened) next to the command's own fields.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::remote::{
    RemoteCalendarInfo, RemoteEvent, RemoteEventDraft, RemoteEventId, SessionHandle,
};

pub type RemoteConfig = serde_json::Map<String, serde_json::Value>;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Authenticate,
    FindCalendar,
    CreateEvent,
    FindEvent,
    UpdateEvent,
    DeleteEvent,
}

/// Category of a provider-side failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Rejected,
    Auth,
    #[default]
    Transport,
}

/// Request sent from bookcal to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to bookcal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success {
        data: T,
    },
    Error {
        #[serde(default)]
        kind: ErrorKind,
        error: String,
    },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap_or_else(|e| {
            Response::<()>::error(
                ErrorKind::Transport,
                &format!("Failed to serialize response: {e}"),
            )
        })
    }
}

impl Response<()> {
    pub fn error(kind: ErrorKind, msg: &str) -> String {
        serde_json::json!({
            "status": "error",
            "kind": kind,
            "error": msg,
        })
        .to_string()
    }
}

/// Obtain a session for the configured account.
#[derive(Debug, Serialize, Deserialize)]
pub struct Authenticate {
    #[serde(flatten)]
    pub remote_config: RemoteConfig,
}

impl ProviderCommand for Authenticate {
    type Response = SessionHandle;
    fn command() -> Command {
        Command::Authenticate
    }
}

/// Resolve a calendar reference (a resource's `calendar_id`).
#[derive(Debug, Serialize, Deserialize)]
pub struct FindCalendar {
    #[serde(flatten)]
    pub remote_config: RemoteConfig,
    pub session: SessionHandle,
    pub calendar_ref: String,
}

impl ProviderCommand for FindCalendar {
    type Response = RemoteCalendarInfo;
    fn command() -> Command {
        Command::FindCalendar
    }
}

/// Create an event; the provider assigns its id.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub remote_config: RemoteConfig,
    pub session: SessionHandle,
    pub calendar: RemoteCalendarInfo,
    pub draft: RemoteEventDraft,
}

impl ProviderCommand for CreateEvent {
    type Response = RemoteEventId;
    fn command() -> Command {
        Command::CreateEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindEvent {
    #[serde(flatten)]
    pub remote_config: RemoteConfig,
    pub session: SessionHandle,
    pub calendar: RemoteCalendarInfo,
    pub event_id: RemoteEventId,
}

impl ProviderCommand for FindEvent {
    type Response = RemoteEvent;
    fn command() -> Command {
        Command::FindEvent
    }
}

/// Overwrite an existing event with the draft's fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub remote_config: RemoteConfig,
    pub session: SessionHandle,
    pub event: RemoteEvent,
    pub draft: RemoteEventDraft,
}

impl ProviderCommand for UpdateEvent {
    type Response = ();
    fn command() -> Command {
        Command::UpdateEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: RemoteConfig,
    pub session: SessionHandle,
    pub event: RemoteEvent,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}
