//! Demand lifecycle: validate, persist, then mirror to the remote calendar.
//!
//! Each transition holds its demand's lock from first read to final commit,
//! so transitions on one demand never interleave. The local record is staged
//! in a transaction while the remote call runs; readers see the record and
//! its remote event id appear together.
//!
//! When the remote side fails after the booking changed locally:
//! - create discards the staged record, or keeps it `PendingSync` when
//!   configured with [`CreateFailurePolicy::MarkPending`];
//! - update keeps the new values flagged `OutOfSync`;
//! - delete refuses to remove the local record.

mod locks;

pub use locks::{DemandGuard, DemandLocks};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::demand::{Demand, DemandChanges, DemandDraft, DemandId, SyncState};
use crate::error::{LifecycleError, StorageError, StorageResult, SyncFailure, ValidationFailure};
use crate::remote::RemoteEventId;
use crate::resource::{Resource, ResourceId};
use crate::store::{Storage, Transaction};
use crate::sync::CalendarSync;
use crate::validate::{ValidDemand, validate};

/// What happens to a new booking whose remote event could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateFailurePolicy {
    /// Discard the booking.
    #[default]
    Compensate,
    /// Keep the booking as `PendingSync` for a later resync.
    MarkPending,
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub create_failure: CreateFailurePolicy,
    /// Attempts per remote projection, first one included.
    pub max_sync_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        LifecycleSettings {
            create_failure: CreateFailurePolicy::Compensate,
            max_sync_attempts: 3,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

pub struct DemandLifecycle {
    storage: Arc<dyn Storage>,
    sync: CalendarSync,
    locks: DemandLocks,
    settings: LifecycleSettings,
}

impl DemandLifecycle {
    pub fn new(storage: Arc<dyn Storage>, sync: CalendarSync) -> Self {
        DemandLifecycle {
            storage,
            sync,
            locks: DemandLocks::new(),
            settings: LifecycleSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: LifecycleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn sync(&self) -> &CalendarSync {
        &self.sync
    }

    /// Checks a draft against its stored resource and consumer without
    /// writing anything.
    pub async fn validate(&self, draft: &DemandDraft) -> Result<ValidDemand, LifecycleError> {
        let resource = match draft.resource {
            Some(id) => self.storage.find_resource_by_id(id).await?,
            None => None,
        };
        let consumer = match draft.consumer {
            Some(id) => self.storage.find_user_by_id(id).await?,
            None => None,
        };

        let outcome = validate(draft, resource.as_ref(), consumer.as_ref());

        if draft.consumer.is_some() && consumer.is_none() {
            let mut errors = outcome.err().unwrap_or_default();
            errors.push(ValidationFailure::UnknownConsumer);
            return Err(errors.into());
        }

        Ok(outcome?)
    }

    #[tracing::instrument(skip_all)]
    pub async fn create(&self, draft: DemandDraft) -> Result<Demand, LifecycleError> {
        let valid = self.validate(&draft).await?;
        let resource = self.require_resource(valid.resource()).await?;
        let demand = valid.into_demand(DemandId::new());
        let _guard = self.locks.acquire(demand.id).await;

        let mut tx = self.storage.begin().await?;
        tx.save_demand(demand.clone()).await?;

        let outcome = self
            .with_retries(|| self.sync.project_create(&demand, &resource))
            .await;

        match outcome {
            Ok(event_id) => {
                let created = self.record_event(tx, demand, event_id, &resource).await?;
                info!(demand = %created.id, resource = %resource.id, "Demand created");
                Ok(created)
            }
            Err(failure) => match self.settings.create_failure {
                CreateFailurePolicy::Compensate => {
                    tx.rollback().await?;
                    warn!(demand = %demand.id, error = %failure, "Remote create failed, booking discarded");
                    Err(LifecycleError::Sync {
                        demand: None,
                        failure,
                    })
                }
                CreateFailurePolicy::MarkPending => {
                    tx.commit().await?;
                    warn!(demand = %demand.id, error = %failure, "Remote create failed, booking kept pending");
                    Err(LifecycleError::Sync {
                        demand: Some(Box::new(demand)),
                        failure,
                    })
                }
            },
        }
    }

    #[tracing::instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: DemandId,
        changes: DemandChanges,
    ) -> Result<Demand, LifecycleError> {
        let _guard = self.locks.acquire(id).await;
        let current = self.require_demand(id).await?;

        let valid = self.validate(&changes.apply_to(&current)).await?;
        let resource = self.require_resource(current.resource).await?;

        let mut updated = valid.into_demand(id);
        updated.event_id = current.event_id.clone();

        if updated.event_id.is_none() {
            // Never reached the remote calendar; resync creates it.
            let saved = save_and_commit(self.storage.begin().await?, updated).await?;
            info!(demand = %id, "Pending demand updated locally");
            return Ok(saved);
        }

        let mut tx = self.storage.begin().await?;
        tx.save_demand(updated.clone()).await?;

        let outcome = self
            .with_retries(|| self.sync.project_update(&updated, &resource))
            .await;

        match outcome {
            Ok(()) => {
                updated.sync_state = SyncState::InSync;
                let saved = save_and_commit(tx, updated).await?;
                info!(demand = %id, "Demand updated");
                Ok(saved)
            }
            Err(failure) => {
                updated.sync_state = SyncState::OutOfSync;
                let saved = save_and_commit(tx, updated).await?;
                warn!(demand = %id, error = %failure, "Remote update failed, demand out of sync");
                Err(LifecycleError::Sync {
                    demand: Some(Box::new(saved)),
                    failure,
                })
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: DemandId) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(id).await;
        let demand = self.require_demand(id).await?;

        if demand.event_id.is_some() {
            let resource = self.require_resource(demand.resource).await?;
            let outcome = self
                .with_retries(|| self.sync.project_delete(&demand, &resource))
                .await;

            if let Err(failure) = outcome {
                warn!(demand = %id, error = %failure, "Remote delete failed, demand kept");
                return Err(LifecycleError::Sync {
                    demand: Some(Box::new(demand)),
                    failure,
                });
            }
        }

        let mut tx = self.storage.begin().await?;
        tx.delete_demand(id).await?;
        tx.commit().await?;

        info!(demand = %id, "Demand deleted");
        Ok(())
    }

    /// Retries the remote projection of a `PendingSync` or `OutOfSync` demand.
    #[tracing::instrument(skip(self))]
    pub async fn resync(&self, id: DemandId) -> Result<Demand, LifecycleError> {
        let _guard = self.locks.acquire(id).await;
        let demand = self.require_demand(id).await?;

        if demand.sync_state == SyncState::InSync {
            debug!(demand = %id, "Already in sync");
            return Ok(demand);
        }

        let resource = self.require_resource(demand.resource).await?;

        if demand.event_id.is_none() {
            let outcome = self
                .with_retries(|| self.sync.project_create(&demand, &resource))
                .await;

            return match outcome {
                Ok(event_id) => {
                    let tx = self.storage.begin().await?;
                    let created = self.record_event(tx, demand, event_id, &resource).await?;
                    info!(demand = %id, "Pending demand synced");
                    Ok(created)
                }
                Err(failure) => Err(LifecycleError::Sync {
                    demand: Some(Box::new(demand)),
                    failure,
                }),
            };
        }

        let outcome = self
            .with_retries(|| self.sync.project_update(&demand, &resource))
            .await;

        match outcome {
            Ok(()) => {
                let synced = Demand {
                    sync_state: SyncState::InSync,
                    ..demand
                };
                let saved = save_and_commit(self.storage.begin().await?, synced).await?;
                info!(demand = %id, "Demand back in sync");
                Ok(saved)
            }
            Err(failure) => Err(LifecycleError::Sync {
                demand: Some(Box::new(demand)),
                failure,
            }),
        }
    }

    /// Stores the id of a freshly created remote event. If that fails the
    /// remote event is removed again so no event outlives its booking.
    async fn record_event(
        &self,
        tx: Box<dyn Transaction>,
        demand: Demand,
        event_id: RemoteEventId,
        resource: &Resource,
    ) -> Result<Demand, LifecycleError> {
        let created = Demand {
            event_id: Some(event_id),
            sync_state: SyncState::InSync,
            ..demand
        };

        match save_and_commit(tx, created.clone()).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                warn!(demand = %created.id, error = %e, "Storing remote event id failed, removing remote event");
                if let Err(failure) = self.sync.project_delete(&created, resource).await {
                    warn!(demand = %created.id, error = %failure, "Remote event left behind");
                }
                Err(e.into())
            }
        }
    }

    async fn with_retries<T, F, Fut>(&self, mut attempt: F) -> Result<T, SyncFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncFailure>>,
    {
        let max_attempts = self.settings.max_sync_attempts.max(1);
        let mut attempts = 1;

        loop {
            let outcome = attempt().await;
            match outcome {
                Err(failure) if failure.is_retryable() && attempts < max_attempts => {
                    debug!(attempt = attempts, error = %failure, "Retrying remote call");
                    attempts += 1;
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn require_demand(&self, id: DemandId) -> Result<Demand, LifecycleError> {
        self.storage
            .find_demand_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    async fn require_resource(&self, id: ResourceId) -> Result<Resource, LifecycleError> {
        let resource = self.storage.find_resource_by_id(id).await?;
        Ok(resource.ok_or_else(|| StorageError::NotFound(format!("resource {id}")))?)
    }
}

async fn save_and_commit(mut tx: Box<dyn Transaction>, demand: Demand) -> StorageResult<Demand> {
    let saved = tx.save_demand(demand).await?;
    tx.commit().await?;
    Ok(saved)
}
