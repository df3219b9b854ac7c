//! Error types for bookcal.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::demand::{Demand, DemandId};

/// A required attribute of an identity, resource or demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    StartAt,
    EndAt,
    Consumer,
    Resource,
    Intensity,
    Name,
    Email,
    CalendarId,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::StartAt => "start_at",
            Field::EndAt => "end_at",
            Field::Consumer => "consumer",
            Field::Resource => "resource",
            Field::Intensity => "intensity",
            Field::Name => "name",
            Field::Email => "email",
            Field::CalendarId => "calendar_id",
        };
        f.write_str(name)
    }
}

/// A single reason a user, resource or demand was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("{0} is required")]
    MissingRequiredField(Field),

    #[error("intensity '{0}' is not one of LIGHT, MODERATE, HEAVY, OCCUPY")]
    InvalidIntensity(String),

    #[error("resource and both dates are needed to check the booking range")]
    MissingReferenceData,

    #[error("date range should be within the resource date range")]
    OutOfResourceRange,

    #[error("must be a provider or a consumer")]
    IdentityHasNoRole,

    #[error("consumer does not exist")]
    UnknownConsumer,

    #[error("user is not a consumer")]
    NotAConsumer,

    #[error("user is not a provider")]
    NotAProvider,

    #[error("start_at must not be after end_at")]
    InvertedRange,
}

/// Every failure found while validating one candidate, in the order found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationFailure>);

impl ValidationErrors {
    pub fn push(&mut self, failure: ValidationFailure) {
        if !self.0.contains(&failure) {
            self.0.push(failure);
        }
    }

    pub fn contains(&self, failure: &ValidationFailure) -> bool {
        self.0.contains(failure)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.iter()
    }

    /// `Ok(value)` when nothing was collected, the collected failures otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<ValidationFailure> for ValidationErrors {
    fn from(failure: ValidationFailure) -> Self {
        ValidationErrors(vec![failure])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Email already taken: {0}")]
    DuplicateEmail(String),

    #[error("Resource {0} still has demands")]
    StillReferenced(String),

    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// The authentication provider could not produce a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Authentication failed: {0}")]
pub struct AuthError(pub String);

/// How a remote calendar call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The calendar or event does not exist remotely.
    NotFound,
    /// The remote calendar refused the request.
    Rejected,
    /// The request did not complete (network, process, malformed response).
    #[default]
    Transport,
}

/// Error returned by a [`crate::remote::RemoteCalendar`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        RemoteError {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Rejected, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transport, message)
    }
}

/// The remote projection being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Create,
    Update,
    Delete,
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOp::Create => f.write_str("create event"),
            SyncOp::Update => f.write_str("update event"),
            SyncOp::Delete => f.write_str("delete event"),
        }
    }
}

/// Underlying reason of a [`SyncFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncCause {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Remote calendar or event not found: {0}")]
    NotFound(String),

    #[error("Remote calendar rejected the request: {0}")]
    Rejected(String),

    #[error("Remote calendar unreachable: {0}")]
    Transport(String),

    #[error("Remote calendar timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Demand has no remote event yet")]
    MissingEventId,
}

impl From<RemoteError> for SyncCause {
    fn from(error: RemoteError) -> Self {
        match error.kind {
            RemoteErrorKind::NotFound => SyncCause::NotFound(error.message),
            RemoteErrorKind::Rejected => SyncCause::Rejected(error.message),
            RemoteErrorKind::Transport => SyncCause::Transport(error.message),
        }
    }
}

/// A remote projection of a demand failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to {op}: {cause}")]
pub struct SyncFailure {
    pub op: SyncOp,
    #[source]
    pub cause: SyncCause,
}

impl SyncFailure {
    pub fn new(op: SyncOp, cause: impl Into<SyncCause>) -> Self {
        SyncFailure {
            op,
            cause: cause.into(),
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.cause, SyncCause::Transport(_) | SyncCause::Timeout(_))
    }
}

/// Error returned by the demand lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Demand rejected: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The remote calendar could not be brought in line. `demand` holds the
    /// local record as it was left behind, if one remains.
    #[error("{failure}")]
    Sync {
        demand: Option<Box<Demand>>,
        #[source]
        failure: SyncFailure,
    },

    #[error("Demand not found: {0}")]
    NotFound(DemandId),
}

impl LifecycleError {
    pub fn validation_failures(&self) -> Option<&ValidationErrors> {
        match self {
            LifecycleError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Errors talking to a provider binary.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider '{0}' not found in PATH")]
    NotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    Timeout(u64),

    #[error("Provider error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The provider answered with an error response.
    #[error("{message}")]
    Remote {
        kind: crate::provider::protocol::ErrorKind,
        message: String,
    },
}

/// Errors loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
