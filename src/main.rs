mod app;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bookcal_core::Settings;

use crate::app::App;
use crate::commands::{demand::DemandCommand, resource::ResourceCommand, user::UserCommand};

#[derive(Parser)]
#[command(name = "bookcal")]
#[command(about = "Book provider resources and mirror every booking to a remote calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register providers and consumers
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Publish and inspect bookable resources
    Resource {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Book resources and keep their calendar events in sync
    Demand {
        #[command(subcommand)]
        command: DemandCommand,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load()?;
    init_tracing(&settings.logging.level);

    let app = App::open(settings).await?;

    match cli.command {
        Commands::User { command } => commands::user::run(&app, command).await,
        Commands::Resource { command } => commands::resource::run(&app, command).await,
        Commands::Demand { command } => commands::demand::run(&app, command).await,
    }
}
