//! Authentication commands

use crate::cli::app::AppContext;
use crate::cli::ui;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Sign in with email and password
    Login {
        /// Account email; prompted when omitted
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and clear stored credentials
    Logout,
    /// Display the current session
    Status,
}

pub async fn auth_command(args: AuthCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        AuthSubcommands::Login { email } => login_command(email, ctx).await,
        AuthSubcommands::Logout => logout_command(ctx).await,
        AuthSubcommands::Status => status_command(ctx),
    }
}

async fn login_command(email: Option<String>, ctx: &mut AppContext) -> Result<()> {
    let email = ui::prompt_email(email)?;
    let password = ui::prompt_password()?;

    let user = ctx.session.login(email.trim(), &password).await?;
    ui::success(format!(
        "Logged in as {} ({})",
        user.name.bright_yellow().bold(),
        user.email
    ));
    Ok(())
}

async fn logout_command(ctx: &mut AppContext) -> Result<()> {
    if !ctx.session.is_authenticated() {
        println!("{}", "Not logged in".dimmed());
        return Ok(());
    }
    ctx.session.logout().await?;
    ui::success("Logged out");
    Ok(())
}

fn status_command(ctx: &AppContext) -> Result<()> {
    ui::heading("Session");
    println!("  {:<12} {}", "Backend:", ctx.session.client().api_root());
    match ctx.session.user() {
        Some(user) => {
            println!("  {:<12} {}", "Status:", "signed in".bright_green());
            println!("  {:<12} {} <{}>", "User:", user.name, user.email);
            println!("  {:<12} {}", "Role:", user.role);
        }
        None if ctx.session.is_authenticated() => {
            println!("  {:<12} {}", "Status:", "token stored, profile unknown".yellow());
        }
        None => println!("  {:<12} {}", "Status:", "signed out".dimmed()),
    }
    Ok(())
}
