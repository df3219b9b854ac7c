//! Projects demand transitions onto the remote calendar.
//!
//! `CalendarSync` keeps no state between calls: each projection
//! authenticates, resolves the resource's calendar and acts on it. The remote
//! event id lives on the [`Demand`] and nowhere else.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::demand::Demand;
use crate::error::{SyncCause, SyncFailure, SyncOp};
use crate::remote::{
    AuthProvider, RemoteCalendar, RemoteCalendarInfo, RemoteEvent, RemoteEventDraft,
    RemoteEventId, SessionHandle,
};
use crate::resource::Resource;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct CalendarSync {
    auth: Arc<dyn AuthProvider>,
    calendar: Arc<dyn RemoteCalendar>,
    timeout: Duration,
}

impl CalendarSync {
    pub fn new(auth: Arc<dyn AuthProvider>, calendar: Arc<dyn RemoteCalendar>) -> Self {
        CalendarSync {
            auth,
            calendar,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound applied to each remote step.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The event fields `demand` would be written as.
    pub fn draft_for(&self, demand: &Demand, resource: &Resource) -> RemoteEventDraft {
        RemoteEventDraft::from_demand(demand, resource)
    }

    /// Creates the remote event for a newly booked demand.
    pub async fn project_create(
        &self,
        demand: &Demand,
        resource: &Resource,
    ) -> Result<RemoteEventId, SyncFailure> {
        let op = SyncOp::Create;
        let (session, calendar) = self.open(op, resource).await?;

        let draft = self.draft_for(demand, resource);
        debug!(demand = %demand.id, calendar = %calendar.id, title = %draft.title, "Creating remote event");

        let event_id = self
            .bounded(op, self.calendar.create_event(&draft, &calendar, &session))
            .await?;
        debug!(demand = %demand.id, event = %event_id, "Remote event created");
        Ok(event_id)
    }

    /// Rewrites the demand's existing remote event with its current values.
    pub async fn project_update(
        &self,
        demand: &Demand,
        resource: &Resource,
    ) -> Result<(), SyncFailure> {
        let op = SyncOp::Update;
        let event_id = Self::event_id(op, demand)?;
        let (session, calendar) = self.open(op, resource).await?;
        let event = self.find(op, event_id, &calendar, &session).await?;

        let draft = self.draft_for(demand, resource);
        debug!(demand = %demand.id, event = %event.id, title = %draft.title, "Updating remote event");

        self.bounded(op, self.calendar.update_event(&event, &draft, &session))
            .await
    }

    /// Removes the demand's remote event.
    pub async fn project_delete(
        &self,
        demand: &Demand,
        resource: &Resource,
    ) -> Result<(), SyncFailure> {
        let op = SyncOp::Delete;
        let event_id = Self::event_id(op, demand)?;
        let (session, calendar) = self.open(op, resource).await?;
        let event = self.find(op, event_id, &calendar, &session).await?;

        debug!(demand = %demand.id, event = %event.id, "Deleting remote event");
        self.bounded(op, self.calendar.delete_event(&event, &session))
            .await
    }

    fn event_id(op: SyncOp, demand: &Demand) -> Result<&RemoteEventId, SyncFailure> {
        demand
            .event_id
            .as_ref()
            .ok_or_else(|| SyncFailure::new(op, SyncCause::MissingEventId))
    }

    /// Authenticates afresh and resolves the resource's calendar.
    async fn open(
        &self,
        op: SyncOp,
        resource: &Resource,
    ) -> Result<(SessionHandle, RemoteCalendarInfo), SyncFailure> {
        let session = self.bounded(op, self.auth.authenticate()).await?;
        let calendar = self
            .bounded(
                op,
                self.calendar.find_calendar(&resource.calendar_id, &session),
            )
            .await?;
        Ok((session, calendar))
    }

    async fn find(
        &self,
        op: SyncOp,
        id: &RemoteEventId,
        calendar: &RemoteCalendarInfo,
        session: &SessionHandle,
    ) -> Result<RemoteEvent, SyncFailure> {
        self.bounded(op, self.calendar.find_event(id, calendar, session))
            .await
    }

    async fn bounded<T, E>(
        &self,
        op: SyncOp,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, SyncFailure>
    where
        E: Into<SyncCause>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| SyncFailure::new(op, e)),
            Err(_) => Err(SyncFailure::new(op, SyncCause::Timeout(self.timeout))),
        }
    }
}
