//! bookcal-core: booking validation and calendar event synchronization.
//!
//! Providers publish [`Resource`]s, consumers book them with [`Demand`]s, and
//! every demand is mirrored as an all-day event in a remote calendar through
//! [`DemandLifecycle`].

pub mod demand;
pub mod error;
mod id;
pub mod identity;
pub mod lifecycle;
pub mod provider;
pub mod remote;
pub mod resource;
pub mod settings;
pub mod store;
pub mod sync;
pub mod validate;

#[cfg(test)]
mod testing;

pub use demand::{Demand, DemandChanges, DemandDraft, DemandId, Intensity, SyncState};
pub use error::{
    LifecycleError, StorageError, SyncFailure, ValidationErrors, ValidationFailure,
};
pub use identity::{Role, Roles, User, UserId};
pub use lifecycle::{CreateFailurePolicy, DemandLifecycle, LifecycleSettings};
pub use resource::{NewResource, Resource, ResourceId};
pub use settings::Settings;
pub use sync::CalendarSync;
