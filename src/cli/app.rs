use super::commands::auth::AuthCommands;
use super::commands::builder::BuilderCommands;
use super::commands::events::EventCommands;
use super::commands::master_data::MasterDataCommands;
use super::commands::route::RouteCommands;
use super::commands::settings::SettingsCommands;
use super::commands::users::UserCommands;
use crate::api::client::ApiResult;
use crate::config::Config;
use crate::session::Session;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "survey-admin")]
#[command(about = "Administration console for the survey platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and out of the survey backend
    Auth(AuthCommands),
    /// Survey event management
    Events(EventCommands),
    /// Survey builder: pages, elements, preview and sync
    Builder(BuilderCommands),
    /// Business units, divisions, departments, functions and applications
    MasterData(MasterDataCommands),
    /// Admin user management
    Users(UserCommands),
    /// Application settings management
    Settings(SettingsCommands),
    /// Resolve console paths and legacy redirects
    Route(RouteCommands),
}

/// Everything a command handler needs
pub struct AppContext {
    pub config: Config,
    pub session: Session,
}

impl AppContext {
    pub fn new(config: Config, session: Session) -> Self {
        Self { config, session }
    }

    /// Unwrap a backend result, ending the session if the token was rejected
    pub async fn settle<T>(&mut self, result: ApiResult<T>) -> Result<T> {
        Ok(self.session.guard(result).await?)
    }
}

pub async fn run(cli: Cli, ctx: &mut AppContext) -> Result<()> {
    match cli.command {
        Commands::Auth(args) => super::commands::auth::auth_command(args, ctx).await,
        Commands::Events(args) => super::commands::events::events_command(args, ctx).await,
        Commands::Builder(args) => super::commands::builder::builder_command(args, ctx).await,
        Commands::MasterData(args) => {
            super::commands::master_data::master_data_command(args, ctx).await
        }
        Commands::Users(args) => super::commands::users::users_command(args, ctx).await,
        Commands::Settings(args) => super::commands::settings::settings_command(args, ctx),
        Commands::Route(args) => super::commands::route::route_command(args, ctx),
    }
}
