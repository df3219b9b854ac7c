//! Decides whether a proposed demand is legal against its resource.
//!
//! [`validate`] is pure: it looks only at its arguments, reports every
//! failure it finds rather than the first, and never touches storage or the
//! network. Callers resolve the resource (and optionally the consumer) first.

use chrono::NaiveDate;

use crate::demand::{Demand, DemandDraft, DemandId, Intensity, SyncState};
use crate::error::{Field, ValidationErrors, ValidationFailure};
use crate::identity::{User, UserId};
use crate::resource::{Resource, ResourceId};

/// A draft that passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDemand {
    consumer: UserId,
    resource: ResourceId,
    start_at: NaiveDate,
    end_at: NaiveDate,
    intensity: Intensity,
    description: Option<String>,
    short_description: Option<String>,
}

impl ValidDemand {
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// Builds a demand that has not been mirrored remotely yet.
    pub fn into_demand(self, id: DemandId) -> Demand {
        Demand {
            id,
            consumer: self.consumer,
            resource: self.resource,
            start_at: self.start_at,
            end_at: self.end_at,
            intensity: self.intensity,
            description: self.description,
            short_description: self.short_description,
            event_id: None,
            sync_state: SyncState::PendingSync,
        }
    }
}

/// Validates `draft` against `resource`.
///
/// `resource` must be the resource the draft refers to; a missing or
/// different resource is reported as [`ValidationFailure::MissingReferenceData`].
/// When `consumer` is given, it must hold the consumer role.
pub fn validate(
    draft: &DemandDraft,
    resource: Option<&Resource>,
    consumer: Option<&User>,
) -> Result<ValidDemand, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let required = [
        (draft.start_at.is_none(), Field::StartAt),
        (draft.end_at.is_none(), Field::EndAt),
        (draft.consumer.is_none(), Field::Consumer),
        (draft.resource.is_none(), Field::Resource),
        (draft.intensity.is_none(), Field::Intensity),
    ];
    for (missing, field) in required {
        if missing {
            errors.push(ValidationFailure::MissingRequiredField(field));
        }
    }

    let intensity = match draft.intensity.as_deref() {
        Some(raw) => match raw.parse::<Intensity>() {
            Ok(intensity) => Some(intensity),
            Err(_) => {
                errors.push(ValidationFailure::InvalidIntensity(raw.to_string()));
                None
            }
        },
        None => None,
    };

    if let Some(user) = consumer {
        if !user.roles().is_consumer() {
            errors.push(ValidationFailure::NotAConsumer);
        }
    }

    // An incomplete booking is never reported as out of range.
    let resource = resource.filter(|r| Some(r.id) == draft.resource);
    match (resource, draft.start_at, draft.end_at) {
        (Some(resource), Some(start_at), Some(end_at)) => {
            if draft.consumer.is_some() && !resource.contains(start_at, end_at) {
                errors.push(ValidationFailure::OutOfResourceRange);
            }
        }
        _ => errors.push(ValidationFailure::MissingReferenceData),
    }

    match (
        errors.is_empty(),
        draft.consumer,
        draft.resource,
        draft.start_at,
        draft.end_at,
        intensity,
    ) {
        (true, Some(consumer), Some(resource), Some(start_at), Some(end_at), Some(intensity)) => {
            Ok(ValidDemand {
                consumer,
                resource,
                start_at,
                end_at,
                intensity,
                description: draft.description.clone(),
                short_description: draft.short_description.clone(),
            })
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Role, Roles};
    use crate::resource::NewResource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn provider() -> User {
        User::new("Provider", "provider@example.com", Roles::new([Role::Provider])).unwrap()
    }

    fn consumer() -> User {
        User::new("Consumer", "consumer@example.com", Roles::new([Role::Consumer])).unwrap()
    }

    fn january() -> Resource {
        Resource::publish(
            &provider(),
            NewResource {
                name: "Studio A".to_string(),
                calendar_id: "studio-a".to_string(),
                start_at: date(2024, 1, 1),
                end_at: date(2024, 1, 31),
                description: None,
            },
        )
        .unwrap()
    }

    fn draft(resource: &Resource, start: NaiveDate, end: NaiveDate, intensity: &str) -> DemandDraft {
        DemandDraft {
            consumer: Some(UserId::new()),
            resource: Some(resource.id),
            start_at: Some(start),
            end_at: Some(end),
            intensity: Some(intensity.to_string()),
            description: None,
            short_description: Some("Band practice".to_string()),
        }
    }

    #[test]
    fn test_demand_inside_resource_range_is_valid() {
        let resource = january();
        let draft = draft(&resource, date(2024, 1, 5), date(2024, 1, 10), "HEAVY");

        let valid = validate(&draft, Some(&resource), None).unwrap();
        assert_eq!(valid.intensity(), Intensity::Heavy);
        assert_eq!(valid.resource(), resource.id);

        let demand = valid.into_demand(DemandId::new());
        assert_eq!(demand.sync_state, SyncState::PendingSync);
        assert!(demand.event_id.is_none());
    }

    #[test]
    fn test_demand_starting_before_resource_is_out_of_range() {
        let resource = january();
        let draft = draft(&resource, date(2023, 12, 20), date(2024, 1, 10), "LIGHT");

        let err = validate(&draft, Some(&resource), None).unwrap_err();
        assert_eq!(err, ValidationErrors::from(ValidationFailure::OutOfResourceRange));
    }

    #[test]
    fn test_demand_ending_after_resource_is_out_of_range() {
        let resource = january();
        let draft = draft(&resource, date(2024, 1, 20), date(2024, 2, 1), "LIGHT");

        let err = validate(&draft, Some(&resource), None).unwrap_err();
        assert!(err.contains(&ValidationFailure::OutOfResourceRange));
    }

    #[test]
    fn test_bounds_equal_to_resource_bounds_are_valid() {
        let resource = january();
        let draft = draft(&resource, date(2024, 1, 1), date(2024, 1, 31), "OCCUPY");
        assert!(validate(&draft, Some(&resource), None).is_ok());
    }

    #[test]
    fn test_unknown_intensity_is_rejected() {
        let resource = january();
        let draft = draft(&resource, date(2024, 1, 5), date(2024, 1, 10), "EXTREME");

        let err = validate(&draft, Some(&resource), None).unwrap_err();
        assert_eq!(
            err,
            ValidationErrors::from(ValidationFailure::InvalidIntensity("EXTREME".to_string()))
        );
    }

    #[test]
    fn test_missing_fields_never_report_out_of_range() {
        let resource = january();
        let base = draft(&resource, date(2023, 1, 1), date(2025, 1, 1), "HEAVY");

        let cases: [(fn(&mut DemandDraft), Field); 4] = [
            (|d| d.start_at = None, Field::StartAt),
            (|d| d.end_at = None, Field::EndAt),
            (|d| d.consumer = None, Field::Consumer),
            (|d| d.resource = None, Field::Resource),
        ];

        for (clear, field) in cases {
            let mut candidate = base.clone();
            clear(&mut candidate);

            let err = validate(&candidate, Some(&resource), None).unwrap_err();
            assert!(
                err.contains(&ValidationFailure::MissingRequiredField(field)),
                "{field} missing should be reported, got: {err}"
            );
            assert!(
                !err.contains(&ValidationFailure::OutOfResourceRange),
                "{field} missing must not report a range violation, got: {err}"
            );
        }
    }

    #[test]
    fn test_missing_resource_or_dates_is_missing_reference_data() {
        let resource = january();
        let mut candidate = draft(&resource, date(2024, 1, 5), date(2024, 1, 10), "HEAVY");
        candidate.end_at = None;

        let err = validate(&candidate, Some(&resource), None).unwrap_err();
        assert!(err.contains(&ValidationFailure::MissingReferenceData));

        let complete = draft(&resource, date(2024, 1, 5), date(2024, 1, 10), "HEAVY");
        let err = validate(&complete, None, None).unwrap_err();
        assert_eq!(err, ValidationErrors::from(ValidationFailure::MissingReferenceData));
    }

    #[test]
    fn test_resource_other_than_the_referenced_one_is_missing_reference_data() {
        let resource = january();
        let other = january();
        let candidate = draft(&resource, date(2024, 1, 5), date(2024, 1, 10), "HEAVY");

        let err = validate(&candidate, Some(&other), None).unwrap_err();
        assert_eq!(err, ValidationErrors::from(ValidationFailure::MissingReferenceData));
    }

    #[test]
    fn test_every_violation_is_reported_at_once() {
        let empty = DemandDraft {
            intensity: Some("EXTREME".to_string()),
            ..Default::default()
        };

        let err = validate(&empty, None, None).unwrap_err();
        assert!(err.contains(&ValidationFailure::MissingRequiredField(Field::StartAt)));
        assert!(err.contains(&ValidationFailure::MissingRequiredField(Field::EndAt)));
        assert!(err.contains(&ValidationFailure::MissingRequiredField(Field::Consumer)));
        assert!(err.contains(&ValidationFailure::MissingRequiredField(Field::Resource)));
        assert!(err.contains(&ValidationFailure::InvalidIntensity("EXTREME".to_string())));
        assert!(err.contains(&ValidationFailure::MissingReferenceData));
        assert_eq!(err.len(), 6);
    }

    #[test]
    fn test_consumer_must_hold_consumer_role() {
        let resource = january();
        let provider = provider();
        let mut candidate = draft(&resource, date(2024, 1, 5), date(2024, 1, 10), "LIGHT");
        candidate.consumer = Some(provider.id);

        let err = validate(&candidate, Some(&resource), Some(&provider)).unwrap_err();
        assert_eq!(err, ValidationErrors::from(ValidationFailure::NotAConsumer));

        let consumer = consumer();
        candidate.consumer = Some(consumer.id);
        assert!(validate(&candidate, Some(&resource), Some(&consumer)).is_ok());
    }

    #[test]
    fn test_validity_matches_range_containment() {
        let resource = january();
        let days: Vec<NaiveDate> = (0..50)
            .map(|offset| date(2023, 12, 15) + chrono::Duration::days(offset))
            .collect();

        for start in days.iter().step_by(3) {
            for end in days.iter().step_by(4) {
                let candidate = draft(&resource, *start, *end, "MODERATE");
                let expected = resource.start_at() <= *start && *end <= resource.end_at();
                assert_eq!(
                    validate(&candidate, Some(&resource), None).is_ok(),
                    expected,
                    "start {start}, end {end}"
                );
            }
        }
    }
}
