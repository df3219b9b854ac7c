//! Storage collaborator.
//!
//! Demands are only ever written through a [`Transaction`]: the lifecycle
//! stages a record, talks to the remote calendar, and commits once the
//! outcome is known. Staged writes are invisible to every reader until
//! `commit`.

mod memory;

pub use memory::{MemoryStore, Snapshot};

use async_trait::async_trait;

use crate::demand::{Demand, DemandId};
use crate::error::StorageResult;
use crate::identity::{User, UserId};
use crate::resource::{Resource, ResourceId};

#[async_trait]
pub trait Storage: Send + Sync {
    async fn find_user_by_id(&self, id: UserId) -> StorageResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    async fn find_resource_by_id(&self, id: ResourceId) -> StorageResult<Option<Resource>>;

    async fn find_demand_by_id(&self, id: DemandId) -> StorageResult<Option<Demand>>;

    /// Looks a demand up by the id of its remote event, given either bare or
    /// in the `{calendar}/private/full/{event}` form.
    /// The feed form only matches demands whose resource is on that calendar.
    async fn find_demand_by_event_id(&self, event_id: &str) -> StorageResult<Option<Demand>>;

    async fn demands_for_resource(&self, id: ResourceId) -> StorageResult<Vec<Demand>>;

    async fn list_resources(&self) -> StorageResult<Vec<Resource>>;

    /// Inserts or replaces a user. Emails are unique.
    async fn save_user(&self, user: User) -> StorageResult<User>;

    /// Inserts or replaces a resource. Its provider must exist.
    async fn save_resource(&self, resource: Resource) -> StorageResult<Resource>;

    /// Fails with `StillReferenced` while any demand books the resource.
    async fn delete_resource(&self, id: ResourceId) -> StorageResult<()>;

    async fn begin(&self) -> StorageResult<Box<dyn Transaction>>;
}

/// A unit of demand writes. Dropping it without `commit` discards it.
#[async_trait]
pub trait Transaction: Send {
    /// Stages an insert or replace. Consumer and resource must exist.
    async fn save_demand(&mut self, demand: Demand) -> StorageResult<Demand>;

    async fn delete_demand(&mut self, id: DemandId) -> StorageResult<()>;

    async fn commit(self: Box<Self>) -> StorageResult<()>;

    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}

/// Splits a feed-style `{calendar}/private/full/{event}` id into its
/// calendar and event parts. Bare ids have no calendar.
pub(crate) fn split_event_id(event_id: &str) -> (Option<&str>, &str) {
    match event_id.rsplit_once("/private/full/") {
        Some((calendar, bare)) => (Some(calendar), bare),
        None => (None, event_id),
    }
}
