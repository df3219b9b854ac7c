//! Interfaces of the external calendar a demand is mirrored into.
//!
//! Implementations live outside the core (see [`crate::provider`] for the
//! subprocess-backed one). Sessions are obtained per operation and never
//! cached: every gateway call starts with [`AuthProvider::authenticate`].

mod draft;

pub use draft::RemoteEventDraft;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, RemoteError};

/// Opaque credential for a single remote operation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(token: impl Into<String>) -> Self {
        SessionHandle(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionHandle(<redacted>)")
    }
}

/// Provider-assigned identifier of a remote event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteEventId(String);

impl RemoteEventId {
    pub fn new(id: impl Into<String>) -> Self {
        RemoteEventId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id refers to `event_id` in `calendar_id`. Older records
    /// hold the feed-style `{calendar}/private/full/{event}` form.
    pub fn refers_to(&self, calendar_id: &str, event_id: &str) -> bool {
        self.0 == event_id || self.0 == format!("{calendar_id}/private/full/{event_id}")
    }
}

impl fmt::Display for RemoteEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A calendar resolved on the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCalendarInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An existing remote event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: RemoteEventId,
    pub calendar_id: String,
    pub all_day: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub title: String,
}

/// Supplies a fresh session for each remote operation.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self) -> Result<SessionHandle, AuthError>;
}

/// The external calendar events are projected into.
#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    async fn find_calendar(
        &self,
        calendar_ref: &str,
        session: &SessionHandle,
    ) -> Result<RemoteCalendarInfo, RemoteError>;

    async fn create_event(
        &self,
        draft: &RemoteEventDraft,
        calendar: &RemoteCalendarInfo,
        session: &SessionHandle,
    ) -> Result<RemoteEventId, RemoteError>;

    async fn find_event(
        &self,
        id: &RemoteEventId,
        calendar: &RemoteCalendarInfo,
        session: &SessionHandle,
    ) -> Result<RemoteEvent, RemoteError>;

    async fn update_event(
        &self,
        event: &RemoteEvent,
        draft: &RemoteEventDraft,
        session: &SessionHandle,
    ) -> Result<(), RemoteError>;

    async fn delete_event(
        &self,
        event: &RemoteEvent,
        session: &SessionHandle,
    ) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_handle_debug_hides_token() {
        let session = SessionHandle::new("ya29.secret");
        assert_eq!(format!("{session:?}"), "SessionHandle(<redacted>)");
        assert_eq!(session.token(), "ya29.secret");
    }

    #[test]
    fn test_event_id_matches_bare_and_feed_forms() {
        let bare = RemoteEventId::new("abc123");
        let feed = RemoteEventId::new("cal@example.com/private/full/abc123");

        assert!(bare.refers_to("cal@example.com", "abc123"));
        assert!(feed.refers_to("cal@example.com", "abc123"));
        assert!(!feed.refers_to("other@example.com", "abc123"));
        assert!(!bare.refers_to("cal@example.com", "abc"));
    }
}
