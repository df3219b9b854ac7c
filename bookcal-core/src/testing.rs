//! Fixtures and collaborator fakes for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::demand::{Demand, DemandDraft, DemandId, Intensity, SyncState};
use crate::error::{AuthError, RemoteError};
use crate::identity::{Role, Roles, User};
use crate::remote::{
    AuthProvider, RemoteCalendar, RemoteCalendarInfo, RemoteEvent, RemoteEventDraft,
    RemoteEventId, SessionHandle,
};
use crate::resource::{NewResource, Resource};
use crate::store::{MemoryStore, Storage};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A provider, a consumer and a resource open for January 2024.
pub struct Fixture {
    pub provider: User,
    pub consumer: User,
    pub resource: Resource,
}

impl Fixture {
    pub fn new() -> Self {
        let provider =
            User::new("Pat Provider", "pat@example.com", Roles::new([Role::Provider])).unwrap();
        let consumer =
            User::new("Cam Consumer", "cam@example.com", Roles::new([Role::Consumer])).unwrap();
        let resource = Resource::publish(
            &provider,
            NewResource {
                name: "Studio A".to_string(),
                calendar_id: "studio-a@group.calendar.google.com".to_string(),
                start_at: date(2024, 1, 1),
                end_at: date(2024, 1, 31),
                description: Some("Live room".to_string()),
            },
        )
        .unwrap();

        Fixture {
            provider,
            consumer,
            resource,
        }
    }

    /// A validated-looking demand for 2024-01-05..=2024-01-10 not yet synced.
    pub fn demand(&self, intensity: Intensity, short_description: &str) -> Demand {
        Demand {
            id: DemandId::new(),
            consumer: self.consumer.id,
            resource: self.resource.id,
            start_at: date(2024, 1, 5),
            end_at: date(2024, 1, 10),
            intensity,
            description: None,
            short_description: Some(short_description.to_string()),
            event_id: None,
            sync_state: SyncState::PendingSync,
        }
    }

    pub fn draft(&self, intensity: &str) -> DemandDraft {
        DemandDraft {
            consumer: Some(self.consumer.id),
            resource: Some(self.resource.id),
            start_at: Some(date(2024, 1, 5)),
            end_at: Some(date(2024, 1, 10)),
            intensity: Some(intensity.to_string()),
            description: Some("Two rooms, full backline".to_string()),
            short_description: Some("Rehearsal".to_string()),
        }
    }

    /// A store holding the fixture's users and resource.
    pub async fn store(&self) -> MemoryStore {
        self.seed(MemoryStore::new()).await
    }

    /// Like [`Fixture::store`], persisted to `path`.
    pub async fn store_at(&self, path: &Path) -> MemoryStore {
        self.seed(MemoryStore::open(path).await.unwrap()).await
    }

    async fn seed(&self, store: MemoryStore) -> MemoryStore {
        store.save_user(self.provider.clone()).await.unwrap();
        store.save_user(self.consumer.clone()).await.unwrap();
        store.save_resource(self.resource.clone()).await.unwrap();
        store
    }
}

/// Counts authentications; optionally always fails.
#[derive(Default)]
pub struct FakeAuth {
    calls: AtomicUsize,
    failure: Option<String>,
}

impl FakeAuth {
    pub fn failing(message: &str) -> Self {
        FakeAuth {
            calls: AtomicUsize::new(0),
            failure: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn authenticate(&self) -> Result<SessionHandle, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.failure {
            Some(message) => Err(AuthError(message.clone())),
            None => Ok(SessionHandle::new(format!("token-{n}"))),
        }
    }
}

#[derive(Default)]
struct CalendarState {
    events: BTreeMap<String, RemoteEvent>,
    next_id: usize,
    create_faults: VecDeque<RemoteError>,
    update_faults: VecDeque<RemoteError>,
    delete_faults: VecDeque<RemoteError>,
    creates: usize,
    updates: usize,
    deletes: usize,
    delay: Option<Duration>,
}

/// Remote calendar holding events in memory. Any calendar ref resolves.
#[derive(Default)]
pub struct FakeCalendar {
    state: Mutex<CalendarState>,
}

impl FakeCalendar {
    pub fn fail_next_creates(&self, n: usize, error: RemoteError) {
        let mut state = self.state.lock().unwrap();
        state.create_faults.extend(std::iter::repeat_n(error, n));
    }

    pub fn fail_next_updates(&self, n: usize, error: RemoteError) {
        let mut state = self.state.lock().unwrap();
        state.update_faults.extend(std::iter::repeat_n(error, n));
    }

    pub fn fail_next_deletes(&self, n: usize, error: RemoteError) {
        let mut state = self.state.lock().unwrap();
        state.delete_faults.extend(std::iter::repeat_n(error, n));
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn event(&self, id: &RemoteEventId) -> Option<RemoteEvent> {
        self.state.lock().unwrap().events.get(id.as_str()).cloned()
    }

    pub fn remove_event(&self, id: &RemoteEventId) {
        self.state.lock().unwrap().events.remove(id.as_str());
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().events.is_empty()
    }

    /// Attempted (creates, updates, deletes), failed ones included.
    pub fn attempts(&self) -> (usize, usize, usize) {
        let state = self.state.lock().unwrap();
        (state.creates, state.updates, state.deletes)
    }

    async fn pause(&self) {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RemoteCalendar for FakeCalendar {
    async fn find_calendar(
        &self,
        calendar_ref: &str,
        _session: &SessionHandle,
    ) -> Result<RemoteCalendarInfo, RemoteError> {
        self.pause().await;
        Ok(RemoteCalendarInfo {
            id: calendar_ref.to_string(),
            name: None,
        })
    }

    async fn create_event(
        &self,
        draft: &RemoteEventDraft,
        calendar: &RemoteCalendarInfo,
        _session: &SessionHandle,
    ) -> Result<RemoteEventId, RemoteError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        if let Some(error) = state.create_faults.pop_front() {
            return Err(error);
        }

        state.next_id += 1;
        let id = RemoteEventId::new(format!("evt-{}", state.next_id));
        state.events.insert(
            id.as_str().to_string(),
            RemoteEvent {
                id: id.clone(),
                calendar_id: calendar.id.clone(),
                all_day: draft.all_day,
                start: draft.start,
                end: draft.end,
                title: draft.title.clone(),
            },
        );
        Ok(id)
    }

    async fn find_event(
        &self,
        id: &RemoteEventId,
        calendar: &RemoteCalendarInfo,
        _session: &SessionHandle,
    ) -> Result<RemoteEvent, RemoteError> {
        self.pause().await;
        self.state
            .lock()
            .unwrap()
            .events
            .get(id.as_str())
            .filter(|event| event.calendar_id == calendar.id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("event {id}")))
    }

    async fn update_event(
        &self,
        event: &RemoteEvent,
        draft: &RemoteEventDraft,
        _session: &SessionHandle,
    ) -> Result<(), RemoteError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.updates += 1;
        if let Some(error) = state.update_faults.pop_front() {
            return Err(error);
        }

        let stored = state
            .events
            .get_mut(event.id.as_str())
            .ok_or_else(|| RemoteError::not_found(format!("event {}", event.id)))?;
        stored.all_day = draft.all_day;
        stored.start = draft.start;
        stored.end = draft.end;
        stored.title = draft.title.clone();
        Ok(())
    }

    async fn delete_event(
        &self,
        event: &RemoteEvent,
        _session: &SessionHandle,
    ) -> Result<(), RemoteError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.deletes += 1;
        if let Some(error) = state.delete_faults.pop_front() {
            return Err(error);
        }

        state
            .events
            .remove(event.id.as_str())
            .map(|_| ())
            .ok_or_else(|| RemoteError::not_found(format!("event {}", event.id)))
    }
}
