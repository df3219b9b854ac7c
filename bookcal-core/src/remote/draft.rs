use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::demand::{Demand, Intensity};
use crate::resource::Resource;

/// The fields a demand projects onto its remote event.
///
/// The mapping is fixed so events written by earlier versions keep matching:
/// all-day, spanning `start_at..=end_at`, titled `"[INTENSITY] short description"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEventDraft {
    pub calendar_ref: String,
    pub all_day: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub title: String,
}

impl RemoteEventDraft {
    pub fn from_demand(demand: &Demand, resource: &Resource) -> Self {
        RemoteEventDraft {
            calendar_ref: resource.calendar_id.clone(),
            all_day: true,
            start: demand.start_at,
            end: demand.end_at,
            title: Self::title(demand.intensity, demand.short_description.as_deref()),
        }
    }

    pub fn title(intensity: Intensity, short_description: Option<&str>) -> String {
        format!("[{}] {}", intensity, short_description.unwrap_or_default())
    }
}
