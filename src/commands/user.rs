use anyhow::Result;
use bookcal_core::store::Storage;
use bookcal_core::{Roles, User};
use clap::Subcommand;
use owo_colors::OwoColorize;

use crate::app::App;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user; at least one of --provider or --consumer is required
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email, unique across users
        #[arg(short, long)]
        email: String,

        /// The user publishes resources
        #[arg(long)]
        provider: bool,

        /// The user books resources
        #[arg(long)]
        consumer: bool,

        /// The user administers bookcal
        #[arg(long)]
        admin: bool,
    },
    /// Show a user by email
    Show {
        email: String,
    },
}

pub async fn run(app: &App, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::Add {
            name,
            email,
            provider,
            consumer,
            admin,
        } => {
            let roles = Roles::from_flags(provider, consumer, admin);
            let user = User::new(name, email, roles)
                .map_err(|errors| super::rejected("User", &errors))?;

            let user = app.store().save_user(user).await?;

            println!(
                "{} {} <{}> ({})",
                "Added".green(),
                user.name.bold(),
                user.email,
                user.identity_label()
            );
            println!("  {}", user.id.dimmed());
        }
        UserCommand::Show { email } => {
            let user = app.user_by_email(&email).await?;

            println!("{} <{}>", user.name.bold(), user.email);
            println!("  id:    {}", user.id);
            let roles: Vec<String> = user.roles().iter().map(|r| format!("{:?}", r)).collect();
            println!("  roles: {}", roles.join(", "));
        }
    }

    Ok(())
}
