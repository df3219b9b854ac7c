//! Resources published by providers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationErrors, ValidationFailure};
use crate::id::uuid_id;
use crate::identity::{User, UserId};

uuid_id!(
    /// Identifier of a [`Resource`].
    ResourceId
);

/// A provider's offerable time window. Its bounds are fixed at publication
/// and are the authority every demand on it is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub provider: UserId,
    pub name: String,
    /// Remote calendar that events for this resource are created in.
    pub calendar_id: String,
    start_at: NaiveDate,
    end_at: NaiveDate,
    pub description: Option<String>,
}

/// Input for [`Resource::publish`].
#[derive(Debug, Clone)]
pub struct NewResource {
    pub name: String,
    pub calendar_id: String,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    pub description: Option<String>,
}

impl Resource {
    pub fn publish(provider: &User, new: NewResource) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if !provider.roles().is_provider() {
            errors.push(ValidationFailure::NotAProvider);
        }
        if new.name.trim().is_empty() {
            errors.push(ValidationFailure::MissingRequiredField(Field::Name));
        }
        if new.calendar_id.trim().is_empty() {
            errors.push(ValidationFailure::MissingRequiredField(Field::CalendarId));
        }
        if new.start_at > new.end_at {
            errors.push(ValidationFailure::InvertedRange);
        }

        errors.into_result(Resource {
            id: ResourceId::new(),
            provider: provider.id,
            name: new.name,
            calendar_id: new.calendar_id,
            start_at: new.start_at,
            end_at: new.end_at,
            description: new.description,
        })
    }

    pub fn start_at(&self) -> NaiveDate {
        self.start_at
    }

    pub fn end_at(&self) -> NaiveDate {
        self.end_at
    }

    /// Whether `[start, end]` lies within the resource's closed interval.
    pub fn contains(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_at <= start && end <= self.end_at
    }
}
