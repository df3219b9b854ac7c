use anyhow::Result;
use bookcal_core::store::Storage;
use bookcal_core::{NewResource, Resource, ResourceId};
use chrono::NaiveDate;
use clap::Subcommand;
use owo_colors::OwoColorize;

use crate::app::App;

#[derive(Subcommand)]
pub enum ResourceCommand {
    /// Publish a resource owned by a provider
    Post {
        /// Email of the providing user
        #[arg(short, long)]
        provider: String,

        /// Resource name
        #[arg(short, long)]
        name: String,

        /// Remote calendar the resource's bookings are mirrored to
        #[arg(short, long)]
        calendar: String,

        /// First bookable day (e.g., "2025-03-01")
        #[arg(short, long)]
        start: NaiveDate,

        /// Last bookable day, inclusive
        #[arg(short, long)]
        end: NaiveDate,

        #[arg(long)]
        description: Option<String>,
    },
    /// List all resources
    List,
    /// Delete a resource nobody books any more
    Delete {
        id: ResourceId,
    },
}

fn print_resource(resource: &Resource) {
    println!(
        "{}  {} → {}  {}",
        resource.name.bold(),
        resource.start_at(),
        resource.end_at(),
        resource.calendar_id.dimmed()
    );
    println!("  {}", resource.id.dimmed());
}

pub async fn run(app: &App, command: ResourceCommand) -> Result<()> {
    match command {
        ResourceCommand::Post {
            provider,
            name,
            calendar,
            start,
            end,
            description,
        } => {
            let provider = app.user_by_email(&provider).await?;
            let new = NewResource {
                name,
                calendar_id: calendar,
                start_at: start,
                end_at: end,
                description,
            };

            let resource = Resource::publish(&provider, new)
                .map_err(|errors| super::rejected("Resource", &errors))?;
            let resource = app.store().save_resource(resource).await?;

            print!("{} ", "Published".green());
            print_resource(&resource);
        }
        ResourceCommand::List => {
            let resources = app.store().list_resources().await?;

            if resources.is_empty() {
                println!("{}", "No resources".dimmed());
            }
            for resource in &resources {
                print_resource(resource);
            }
        }
        ResourceCommand::Delete { id } => {
            app.store().delete_resource(id).await?;
            println!("{} {}", "Deleted".red(), id);
        }
    }

    Ok(())
}
