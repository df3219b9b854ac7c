//! Demands (bookings) placed by consumers against resources.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::uuid_id;
use crate::identity::UserId;
use crate::remote::RemoteEventId;
use crate::resource::ResourceId;

uuid_id!(
    /// Identifier of a [`Demand`].
    DemandId
);

/// How heavily a demand uses its resource, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intensity {
    Light,
    Moderate,
    Heavy,
    Occupy,
}

impl Intensity {
    pub const ALL: [Intensity; 4] = [
        Intensity::Light,
        Intensity::Moderate,
        Intensity::Heavy,
        Intensity::Occupy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Light => "LIGHT",
            Intensity::Moderate => "MODERATE",
            Intensity::Heavy => "HEAVY",
            Intensity::Occupy => "OCCUPY",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIntensity(pub String);

impl FromStr for Intensity {
    type Err = UnknownIntensity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intensity::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| UnknownIntensity(s.to_string()))
    }
}

/// Whether the remote calendar reflects the local record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    InSync,
    /// No remote event has been created yet.
    PendingSync,
    /// Local changes were kept but the remote event still shows older values.
    OutOfSync,
}

/// A booking of a resource by a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    pub id: DemandId,
    pub consumer: UserId,
    pub resource: ResourceId,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    pub intensity: Intensity,
    pub description: Option<String>,
    pub short_description: Option<String>,
    /// Remote calendar event mirroring this demand, once one exists.
    pub event_id: Option<RemoteEventId>,
    #[serde(default)]
    pub sync_state: SyncState,
}

impl Demand {
    /// The demand's current values as a candidate, for re-validation.
    pub fn to_draft(&self) -> DemandDraft {
        DemandDraft {
            consumer: Some(self.consumer),
            resource: Some(self.resource),
            start_at: Some(self.start_at),
            end_at: Some(self.end_at),
            intensity: Some(self.intensity.to_string()),
            description: self.description.clone(),
            short_description: self.short_description.clone(),
        }
    }
}

/// A proposed demand whose fields have not been checked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandDraft {
    pub consumer: Option<UserId>,
    pub resource: Option<ResourceId>,
    pub start_at: Option<NaiveDate>,
    pub end_at: Option<NaiveDate>,
    /// Raw intensity name, kept as text so unknown values can be reported.
    pub intensity: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
}

/// New values for an existing demand. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandChanges {
    pub start_at: Option<NaiveDate>,
    pub end_at: Option<NaiveDate>,
    pub intensity: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
}

impl DemandChanges {
    pub fn is_empty(&self) -> bool {
        *self == DemandChanges::default()
    }

    pub fn apply_to(&self, demand: &Demand) -> DemandDraft {
        let mut draft = demand.to_draft();
        if let Some(start_at) = self.start_at {
            draft.start_at = Some(start_at);
        }
        if let Some(end_at) = self.end_at {
            draft.end_at = Some(end_at);
        }
        if let Some(intensity) = &self.intensity {
            draft.intensity = Some(intensity.clone());
        }
        if let Some(description) = &self.description {
            draft.description = Some(description.clone());
        }
        if let Some(short_description) = &self.short_description {
            draft.short_description = Some(short_description.clone());
        }
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_parses_exact_names_only() {
        assert_eq!("HEAVY".parse::<Intensity>(), Ok(Intensity::Heavy));
        assert_eq!(
            "heavy".parse::<Intensity>(),
            Err(UnknownIntensity("heavy".to_string()))
        );
        assert!("EXTREME".parse::<Intensity>().is_err());
    }

    #[test]
    fn test_intensity_is_ordered_by_severity() {
        assert!(Intensity::Light < Intensity::Moderate);
        assert!(Intensity::Moderate < Intensity::Heavy);
        assert!(Intensity::Heavy < Intensity::Occupy);
    }

    #[test]
    fn test_changes_only_touch_given_fields() {
        let demand = Demand {
            id: DemandId::new(),
            consumer: UserId::new(),
            resource: ResourceId::new(),
            start_at: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            end_at: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            intensity: Intensity::Heavy,
            description: Some("Rehearsals".to_string()),
            short_description: Some("Band".to_string()),
            event_id: None,
            sync_state: SyncState::InSync,
        };

        let changes = DemandChanges {
            end_at: NaiveDate::from_ymd_opt(2024, 1, 12),
            intensity: Some("LIGHT".to_string()),
            ..Default::default()
        };
        let draft = changes.apply_to(&demand);

        assert_eq!(draft.start_at, Some(demand.start_at));
        assert_eq!(draft.end_at, NaiveDate::from_ymd_opt(2024, 1, 12));
        assert_eq!(draft.intensity.as_deref(), Some("LIGHT"));
        assert_eq!(draft.short_description.as_deref(), Some("Band"));
        assert_eq!(draft.consumer, Some(demand.consumer));
    }
}
