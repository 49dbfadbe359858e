//! Admin user commands

use crate::api::{QueryBuilder, UserInput};
use crate::cli::app::AppContext;
use crate::cli::ui;
use crate::excel;
use crate::suggest::UserSuggestions;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct UserCommands {
    #[command(subcommand)]
    pub command: UserSubcommands,
}

#[derive(Subcommand)]
pub enum UserSubcommands {
    /// List users
    List {
        #[arg(short, long)]
        search: Option<String>,
        /// active or inactive
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Suggest admin users matching a query
    Search { query: String },
    /// Create a user
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        department: Option<String>,
        /// Prompt for an initial password
        #[arg(long)]
        with_password: bool,
    },
    /// Update a user
    Update {
        id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        department: Option<String>,
    },
    /// Delete a user
    Delete {
        id: String,
        #[arg(short, long)]
        force: bool,
    },
    /// Check and upload an Excel sheet of users
    Import {
        file: PathBuf,
        /// Only run the local checks
        #[arg(long)]
        dry_run: bool,
    },
    /// Export users to an Excel file
    Export {
        output: PathBuf,
        /// Build the workbook locally instead of downloading the backend export
        #[arg(long)]
        local: bool,
    },
}

pub async fn users_command(args: UserCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        UserSubcommands::List {
            search,
            status,
            page,
        } => {
            let result = ctx.session.require_auth()?.list_users().await;
            let users = ctx.settle(result).await?;

            let mut query = QueryBuilder::new()
                .page(page)
                .per_page(ctx.config.settings.page_size);
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(status) = status {
                query = query.status(status);
            }
            let listing = query.build().apply(&users);

            println!("{:<8} {:<32} {:<24} {:<12} {}", "ID", "Email", "Name", "Role", "Active");
            println!("{}", "-".repeat(86));
            for user in &listing.items {
                let active = if user.is_active { "yes".green() } else { "no".dimmed() };
                println!(
                    "{:<8} {:<32} {:<24} {:<12} {}",
                    ui::truncate(&user.id, 8),
                    ui::truncate(&user.email, 32),
                    ui::truncate(&user.name, 24),
                    user.role,
                    active
                );
            }
            println!();
            println!(
                "Page {} of {} ({} users)",
                listing.page,
                listing.total_pages(),
                listing.total
            );
            Ok(())
        }
        UserSubcommands::Search { query } => {
            let debounce = Duration::from_millis(ctx.config.settings.suggestion_debounce_ms);
            let suggestions = UserSuggestions::new(ctx.session.require_auth()?, debounce);
            let result = suggestions.suggest(&query).await;
            let users = ctx.settle(result).await?.unwrap_or_default();
            if users.is_empty() {
                println!("{}", "No matching users".dimmed());
            }
            for user in users {
                println!("  {:<24} {}", user.name, user.email.dimmed());
            }
            Ok(())
        }
        UserSubcommands::Create {
            email,
            name,
            role,
            department,
            with_password,
        } => {
            let password = if with_password {
                Some(ui::prompt_password()?)
            } else {
                None
            };
            let input = UserInput {
                email,
                name,
                role,
                department,
                password,
            };
            let result = ctx.session.require_auth()?.create_user(&input).await;
            let user = ctx.settle(result).await?;
            ui::success(format!("Created user {} with id {}", user.email, user.id));
            Ok(())
        }
        UserSubcommands::Update {
            id,
            email,
            name,
            role,
            department,
        } => {
            let input = UserInput {
                email,
                name,
                role,
                department,
                password: None,
            };
            let result = ctx.session.require_auth()?.update_user(&id, &input).await;
            let user = ctx.settle(result).await?;
            ui::success(format!("Updated user {}", user.email));
            Ok(())
        }
        UserSubcommands::Delete { id, force } => {
            if !ui::confirm_removal(&format!("user {}", id), force)? {
                return Ok(());
            }
            let result = ctx.session.require_auth()?.delete_user(&id).await;
            ctx.settle(result).await?;
            ui::success(format!("Deleted user {}", id));
            Ok(())
        }
        UserSubcommands::Import { file, dry_run } => import_command(ctx, file, dry_run).await,
        UserSubcommands::Export { output, local } => {
            if local {
                let result = ctx.session.require_auth()?.list_users().await;
                let users = ctx.settle(result).await?;
                excel::export_users(&users, &output)?;
            } else {
                let result = ctx.session.require_auth()?.export_users().await;
                let bytes = ctx.settle(result).await?;
                std::fs::write(&output, bytes)
                    .with_context(|| format!("Failed to write export: {}", output.display()))?;
            }
            ui::success(format!("Users exported to {}", output.display()));
            Ok(())
        }
    }
}

async fn import_command(ctx: &mut AppContext, file: PathBuf, dry_run: bool) -> Result<()> {
    let check = excel::check_user_import(&file)?;
    if !check.is_valid() {
        ui::warning(format!("{} problems found in {}", check.problems.len(), file.display()));
        for problem in &check.problems {
            println!("  {} {}", "•".red(), problem);
        }
        anyhow::bail!("Fix the sheet before importing");
    }
    ui::success(format!("{} rows look valid", check.rows));
    if dry_run {
        return Ok(());
    }

    let result = ctx.session.require_auth()?.import_users(&file).await;
    let summary = ctx.settle(result).await?;
    ui::success(format!(
        "Import finished: {} created, {} updated, {} failed",
        summary.created, summary.updated, summary.failed
    ));
    for error in &summary.errors {
        ui::warning(error);
    }
    Ok(())
}
