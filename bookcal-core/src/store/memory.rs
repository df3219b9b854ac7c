//! In-process store, optionally persisted as a TOML snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{Storage, Transaction, split_event_id};
use crate::demand::{Demand, DemandId};
use crate::error::{StorageError, StorageResult};
use crate::identity::{User, UserId};
use crate::resource::{Resource, ResourceId};

/// Serializable copy of every committed record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub demands: Vec<Demand>,
}

#[derive(Clone, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    resources: BTreeMap<ResourceId, Resource>,
    demands: BTreeMap<DemandId, Demand>,
}

impl State {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.values().cloned().collect(),
            resources: self.resources.values().cloned().collect(),
            demands: self.demands.values().cloned().collect(),
        }
    }

    fn check_demand_references(&self, demand: &Demand) -> StorageResult<()> {
        if !self.users.contains_key(&demand.consumer) {
            return Err(StorageError::UnknownReference(format!(
                "consumer {}",
                demand.consumer
            )));
        }
        if !self.resources.contains_key(&demand.resource) {
            return Err(StorageError::UnknownReference(format!(
                "resource {}",
                demand.resource
            )));
        }
        Ok(())
    }
}

impl From<Snapshot> for State {
    fn from(snapshot: Snapshot) -> Self {
        State {
            users: snapshot.users.into_iter().map(|u| (u.id, u)).collect(),
            resources: snapshot.resources.into_iter().map(|r| (r.id, r)).collect(),
            demands: snapshot.demands.into_iter().map(|d| (d.id, d)).collect(),
        }
    }
}

/// Thread-safe store keeping every record in memory.
///
/// Stores created with [`MemoryStore::open`] rewrite their snapshot file
/// after each committed change.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    path: Option<Arc<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        MemoryStore {
            state: Arc::new(RwLock::new(snapshot.into())),
            path: None,
        }
    }

    /// Loads the snapshot at `path` (if any) and persists back to it.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => toml::from_str(&contents).map_err(|e| {
                StorageError::Serialization(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), "Opened store");

        Ok(MemoryStore {
            path: Some(Arc::new(path)),
            ..Self::from_snapshot(snapshot)
        })
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    /// Persists `next` and only then makes it the visible state. A failed
    /// write leaves `state` untouched.
    async fn replace(&self, state: &mut State, next: State) -> StorageResult<()> {
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    /// Writes the snapshot file. Called with the write lock held so files
    /// land in commit order.
    async fn persist(&self, state: &State) -> StorageResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let contents = toml::to_string_pretty(&state.snapshot())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn find_user_by_id(&self, id: UserId) -> StorageResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_resource_by_id(&self, id: ResourceId) -> StorageResult<Option<Resource>> {
        Ok(self.state.read().await.resources.get(&id).cloned())
    }

    async fn find_demand_by_id(&self, id: DemandId) -> StorageResult<Option<Demand>> {
        Ok(self.state.read().await.demands.get(&id).cloned())
    }

    async fn find_demand_by_event_id(&self, event_id: &str) -> StorageResult<Option<Demand>> {
        let (calendar, bare) = split_event_id(event_id);
        let state = self.state.read().await;

        Ok(state
            .demands
            .values()
            .find(|demand| {
                let Some(stored) = &demand.event_id else {
                    return false;
                };
                match state.resources.get(&demand.resource) {
                    Some(resource) => {
                        calendar.is_none_or(|calendar| calendar == resource.calendar_id)
                            && stored.refers_to(&resource.calendar_id, bare)
                    }
                    None => calendar.is_none() && stored.as_str() == bare,
                }
            })
            .cloned())
    }

    async fn demands_for_resource(&self, id: ResourceId) -> StorageResult<Vec<Demand>> {
        let state = self.state.read().await;
        Ok(state
            .demands
            .values()
            .filter(|d| d.resource == id)
            .cloned()
            .collect())
    }

    async fn list_resources(&self) -> StorageResult<Vec<Resource>> {
        Ok(self.state.read().await.resources.values().cloned().collect())
    }

    async fn save_user(&self, user: User) -> StorageResult<User> {
        let mut state = self.state.write().await;

        let taken = state
            .users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(StorageError::DuplicateEmail(user.email));
        }

        let mut next = state.clone();
        next.users.insert(user.id, user.clone());
        self.replace(&mut state, next).await?;
        Ok(user)
    }

    async fn save_resource(&self, resource: Resource) -> StorageResult<Resource> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&resource.provider) {
            return Err(StorageError::UnknownReference(format!(
                "provider {}",
                resource.provider
            )));
        }

        let mut next = state.clone();
        next.resources.insert(resource.id, resource.clone());
        self.replace(&mut state, next).await?;
        Ok(resource)
    }

    async fn delete_resource(&self, id: ResourceId) -> StorageResult<()> {
        let mut state = self.state.write().await;

        if !state.resources.contains_key(&id) {
            return Err(StorageError::NotFound(format!("resource {id}")));
        }
        if state.demands.values().any(|d| d.resource == id) {
            return Err(StorageError::StillReferenced(id.to_string()));
        }

        let mut next = state.clone();
        next.resources.remove(&id);
        self.replace(&mut state, next).await
    }

    async fn begin(&self) -> StorageResult<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            staged: BTreeMap::new(),
        }))
    }
}

/// Staged demand writes; `None` marks a deletion.
struct MemoryTransaction {
    store: MemoryStore,
    staged: BTreeMap<DemandId, Option<Demand>>,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn save_demand(&mut self, demand: Demand) -> StorageResult<Demand> {
        self.store
            .state
            .read()
            .await
            .check_demand_references(&demand)?;

        self.staged.insert(demand.id, Some(demand.clone()));
        Ok(demand)
    }

    async fn delete_demand(&mut self, id: DemandId) -> StorageResult<()> {
        let exists = match self.staged.get(&id) {
            Some(staged) => staged.is_some(),
            None => self.store.state.read().await.demands.contains_key(&id),
        };
        if !exists {
            return Err(StorageError::NotFound(format!("demand {id}")));
        }

        self.staged.insert(id, None);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction { store, staged } = *self;
        let mut state = store.state.write().await;

        // References may have gone away since the write was staged.
        for demand in staged.values().flatten() {
            state.check_demand_references(demand)?;
        }

        let writes = staged.len();
        let mut next = state.clone();
        for (id, staged) in staged {
            match staged {
                Some(demand) => {
                    next.demands.insert(id, demand);
                }
                None => {
                    next.demands.remove(&id);
                }
            }
        }

        store.replace(&mut state, next).await?;
        debug!(writes, "Committed transaction");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        debug!(writes = self.staged.len(), "Rolled back transaction");
        Ok(())
    }
}
