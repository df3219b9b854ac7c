use anyhow::Result;
use bookcal_core::store::Storage;
use bookcal_core::{
    Demand, DemandChanges, DemandDraft, DemandId, LifecycleError, ResourceId, SyncState, UserId,
};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;

use crate::app::App;

/// Demand fields as given on the command line. Everything is optional so
/// that validation can report every missing field at once.
#[derive(Args)]
pub struct DemandArgs {
    /// Email of the booking consumer
    #[arg(short, long)]
    consumer: Option<String>,

    /// Id of the booked resource
    #[arg(short, long)]
    resource: Option<ResourceId>,

    /// First booked day (e.g., "2025-03-20")
    #[arg(short, long)]
    start: Option<NaiveDate>,

    /// Last booked day, inclusive
    #[arg(short, long)]
    end: Option<NaiveDate>,

    /// LIGHT, MODERATE, HEAVY or OCCUPY
    #[arg(short, long)]
    intensity: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Shown in the calendar event title
    #[arg(long)]
    short: Option<String>,
}

#[derive(Subcommand)]
pub enum DemandCommand {
    /// Check a booking without saving it
    Validate(DemandArgs),
    /// Book a resource and create its calendar event
    Create(DemandArgs),
    /// Change a booking and its calendar event
    Update {
        id: DemandId,

        #[arg(short, long)]
        start: Option<NaiveDate>,

        #[arg(short, long)]
        end: Option<NaiveDate>,

        #[arg(short, long)]
        intensity: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        short: Option<String>,
    },
    /// Cancel a booking and remove its calendar event
    Delete {
        id: DemandId,
    },
    /// Retry the calendar event of a pending or out-of-sync booking
    Resync {
        id: DemandId,
    },
    /// List bookings, optionally for one resource
    List {
        #[arg(short, long)]
        resource: Option<ResourceId>,
    },
    /// Find the booking behind a calendar event
    Event {
        event_id: String,
    },
}

impl DemandArgs {
    async fn into_draft(self, app: &App) -> Result<DemandDraft> {
        // An unknown email becomes an id no user has, so validation reports
        // it as an unknown consumer next to every other failure.
        let consumer = match self.consumer {
            Some(email) => match app.store().find_user_by_email(&email).await? {
                Some(user) => Some(user.id),
                None => Some(UserId::new()),
            },
            None => None,
        };

        Ok(DemandDraft {
            consumer,
            resource: self.resource,
            start_at: self.start,
            end_at: self.end,
            intensity: self.intensity,
            description: self.description,
            short_description: self.short,
        })
    }
}

fn sync_label(state: SyncState) -> String {
    match state {
        SyncState::InSync => "in sync".green().to_string(),
        SyncState::PendingSync => "pending".yellow().to_string(),
        SyncState::OutOfSync => "out of sync".red().to_string(),
    }
}

fn print_demand(demand: &Demand) {
    println!(
        "{} → {}  [{}] {}  ({})",
        demand.start_at,
        demand.end_at,
        demand.intensity,
        demand.short_description.as_deref().unwrap_or("").bold(),
        sync_label(demand.sync_state)
    );
    println!("  {}", demand.id.dimmed());
    if let Some(event_id) = &demand.event_id {
        println!("  event: {}", event_id.dimmed());
    }
}

fn require_changes(changes: DemandChanges) -> Result<DemandChanges> {
    if changes.is_empty() {
        anyhow::bail!(
            "Nothing to update. Pass at least one of --start, --end, --intensity, --description, --short"
        );
    }
    Ok(changes)
}

/// Turns a lifecycle error into output plus an error for the exit code.
fn report(error: LifecycleError) -> anyhow::Error {
    match error {
        LifecycleError::Validation(errors) => super::rejected("Demand", &errors),
        LifecycleError::Sync {
            demand: Some(demand),
            failure,
        } => {
            eprintln!("{} {}", "Calendar sync failed:".red(), failure);
            eprintln!("Local record left as:");
            print_demand(&demand);
            if demand.sync_state != SyncState::InSync {
                eprintln!(
                    "{}",
                    format!("Run `bookcal demand resync {}` to retry", demand.id).dimmed()
                );
            }
            anyhow::anyhow!("{}", failure)
        }
        other => other.into(),
    }
}

pub async fn run(app: &App, command: DemandCommand) -> Result<()> {
    let lifecycle = app.lifecycle();

    match command {
        DemandCommand::Validate(args) => {
            let draft = args.into_draft(app).await?;
            let valid = lifecycle.validate(&draft).await.map_err(report)?;

            println!(
                "{} {} booking of {}",
                "Valid".green(),
                valid.intensity(),
                valid.resource()
            );
        }
        DemandCommand::Create(args) => {
            let draft = args.into_draft(app).await?;
            let demand = lifecycle.create(draft).await.map_err(report)?;

            print!("{} ", "Booked".green());
            print_demand(&demand);
        }
        DemandCommand::Update {
            id,
            start,
            end,
            intensity,
            description,
            short,
        } => {
            let changes = require_changes(DemandChanges {
                start_at: start,
                end_at: end,
                intensity,
                description,
                short_description: short,
            })?;

            let demand = lifecycle.update(id, changes).await.map_err(report)?;

            print!("{} ", "Updated".green());
            print_demand(&demand);
        }
        DemandCommand::Delete { id } => {
            lifecycle.delete(id).await.map_err(report)?;
            println!("{} {}", "Deleted".red(), id);
        }
        DemandCommand::Resync { id } => {
            let demand = lifecycle.resync(id).await.map_err(report)?;

            print!("{} ", "Synced".green());
            print_demand(&demand);
        }
        DemandCommand::List { resource } => {
            let resources = match resource {
                Some(id) => vec![id],
                None => app
                    .store()
                    .list_resources()
                    .await?
                    .into_iter()
                    .map(|r| r.id)
                    .collect(),
            };

            let mut any = false;
            for id in resources {
                for demand in app.store().demands_for_resource(id).await? {
                    print_demand(&demand);
                    any = true;
                }
            }

            if !any {
                println!("{}", "No demands".dimmed());
            }
        }
        DemandCommand::Event { event_id } => match app.store().find_demand_by_event_id(&event_id).await? {
            Some(demand) => print_demand(&demand),
            None => anyhow::bail!("No demand is mirrored by event {}", event_id),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookcal_core::error::{SyncCause, SyncOp};
    use bookcal_core::{SyncFailure, ValidationErrors, ValidationFailure};

    #[test]
    fn test_update_needs_at_least_one_change() {
        let err = require_changes(DemandChanges::default()).unwrap_err();
        assert!(err.to_string().starts_with("Nothing to update"));

        let changes = DemandChanges {
            intensity: Some("LIGHT".to_string()),
            ..Default::default()
        };
        assert_eq!(require_changes(changes.clone()).unwrap(), changes);
    }

    #[test]
    fn test_report_counts_every_validation_failure() {
        let mut errors = ValidationErrors::from(ValidationFailure::UnknownConsumer);
        errors.push(ValidationFailure::OutOfResourceRange);

        let err = report(LifecycleError::Validation(errors));
        assert_eq!(err.to_string(), "Demand rejected with 2 error(s)");
    }

    #[test]
    fn test_report_keeps_sync_failure_message() {
        let failure = SyncFailure::new(SyncOp::Update, SyncCause::Transport("reset".to_string()));
        let demand = Demand {
            id: DemandId::new(),
            consumer: UserId::new(),
            resource: ResourceId::new(),
            start_at: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            end_at: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            intensity: bookcal_core::Intensity::Heavy,
            description: None,
            short_description: Some("Album".to_string()),
            event_id: None,
            sync_state: SyncState::OutOfSync,
        };

        let err = report(LifecycleError::Sync {
            demand: Some(Box::new(demand)),
            failure: failure.clone(),
        });
        assert_eq!(err.to_string(), failure.to_string());

        let discarded = report(LifecycleError::Sync {
            demand: None,
            failure: failure.clone(),
        });
        assert_eq!(discarded.to_string(), failure.to_string());
    }

    #[test]
    fn test_report_passes_other_errors_through() {
        let id = DemandId::new();
        let err = report(LifecycleError::NotFound(id));
        assert_eq!(err.to_string(), format!("Demand not found: {id}"));
    }
}
