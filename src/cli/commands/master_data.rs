//! Master-data commands

use crate::api::query::Listable;
use crate::api::{MasterDataKind, QueryBuilder, SurveyClient};
use crate::api::client::ApiResult;
use crate::cli::app::AppContext;
use crate::cli::ui;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

#[derive(Args)]
pub struct MasterDataCommands {
    #[command(subcommand)]
    pub command: MasterDataSubcommands,
}

#[derive(Subcommand)]
pub enum MasterDataSubcommands {
    /// List records of one collection
    List {
        #[arg(value_enum)]
        kind: MasterDataKind,
        #[arg(short, long)]
        search: Option<String>,
        /// Include inactive records
        #[arg(long)]
        all: bool,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Create a record
    Create {
        #[arg(value_enum)]
        kind: MasterDataKind,
        name: String,
        /// Parent business unit (divisions) or division (departments)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Rename or (de)activate a record
    Update {
        #[arg(value_enum)]
        kind: MasterDataKind,
        id: String,
        name: String,
        /// Mark the record inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a record
    Delete {
        #[arg(value_enum)]
        kind: MasterDataKind,
        id: String,
        #[arg(short, long)]
        force: bool,
    },
    /// Applications mapped to a department or function
    Mapped {
        /// Department name
        #[arg(long, conflicts_with = "function", required_unless_present = "function")]
        department: Option<String>,
        /// Function name
        #[arg(long)]
        function: Option<String>,
    },
}

/// Common shape of every master-data record for display
#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: String,
    name: String,
    parent: Option<String>,
    is_active: bool,
}

impl Listable for Row {
    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn status(&self) -> Option<&str> {
        Some(if self.is_active { "active" } else { "inactive" })
    }
}

async fn fetch_rows(client: &SurveyClient, kind: MasterDataKind) -> ApiResult<Vec<Row>> {
    let rows = match kind {
        MasterDataKind::BusinessUnits => client
            .business_units()
            .await?
            .into_iter()
            .map(|r| Row { id: r.id, name: r.name, parent: None, is_active: r.is_active })
            .collect(),
        MasterDataKind::Divisions => client
            .divisions()
            .await?
            .into_iter()
            .map(|r| Row { id: r.id, name: r.name, parent: r.business_unit_id, is_active: r.is_active })
            .collect(),
        MasterDataKind::Departments => client
            .departments()
            .await?
            .into_iter()
            .map(|r| Row { id: r.id, name: r.name, parent: r.division_id, is_active: r.is_active })
            .collect(),
        MasterDataKind::Functions => client
            .functions()
            .await?
            .into_iter()
            .map(|r| Row { id: r.id, name: r.name, parent: None, is_active: r.is_active })
            .collect(),
        MasterDataKind::Applications => client
            .applications()
            .await?
            .into_iter()
            .map(|r| Row { id: r.id, name: r.name, parent: r.code, is_active: r.is_active })
            .collect(),
    };
    Ok(rows)
}

pub async fn master_data_command(args: MasterDataCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        MasterDataSubcommands::List {
            kind,
            search,
            all,
            page,
        } => {
            let result = fetch_rows(ctx.session.require_auth()?, kind).await;
            let rows = ctx.settle(result).await?;

            let mut query = QueryBuilder::new()
                .page(page)
                .per_page(ctx.config.settings.page_size);
            if let Some(search) = search {
                query = query.search(search);
            }
            if !all {
                query = query.status("active");
            }
            let listing = query.build().apply(&rows);

            let parent_header = match kind {
                MasterDataKind::Divisions => "Business unit",
                MasterDataKind::Departments => "Division",
                MasterDataKind::Applications => "Code",
                _ => "",
            };
            println!("{:<10} {:<36} {:<14} {}", "ID", "Name", parent_header, "Active");
            println!("{}", "-".repeat(70));
            for row in &listing.items {
                let active = if row.is_active { "yes".green() } else { "no".dimmed() };
                println!(
                    "{:<10} {:<36} {:<14} {}",
                    ui::truncate(&row.id, 10),
                    ui::truncate(&row.name, 36),
                    row.parent.as_deref().unwrap_or_default(),
                    active
                );
            }
            println!();
            println!(
                "Page {} of {} ({} {})",
                listing.page,
                listing.total_pages(),
                listing.total,
                kind.path()
            );
            Ok(())
        }
        MasterDataSubcommands::Create { kind, name, parent } => {
            if parent.is_some() && kind.parent_field().is_none() {
                ui::warning(format!("{} have no parent; --parent ignored", kind.path()));
            }
            let result = ctx
                .session
                .require_auth()?
                .create_master(kind, &name, parent.as_deref())
                .await;
            ctx.settle(result).await?;
            ui::success(format!("Created '{}' in {}", name.trim(), kind.path()));
            Ok(())
        }
        MasterDataSubcommands::Update {
            kind,
            id,
            name,
            inactive,
        } => {
            let result = ctx
                .session
                .require_auth()?
                .update_master(kind, &id, &name, !inactive)
                .await;
            ctx.settle(result).await?;
            ui::success(format!("Updated {} {}", kind.path(), id));
            Ok(())
        }
        MasterDataSubcommands::Delete { kind, id, force } => {
            if !ui::confirm_removal(&format!("{} {}", kind.path(), id), force)? {
                return Ok(());
            }
            let result = ctx.session.require_auth()?.delete_master(kind, &id).await;
            ctx.settle(result).await?;
            ui::success(format!("Deleted {} {}", kind.path(), id));
            Ok(())
        }
        MasterDataSubcommands::Mapped { department, function } => {
            let client = ctx.session.require_auth()?;
            let result = match (&department, &function) {
                (Some(department), _) => client.applications_for_department(department).await,
                (None, Some(function)) => client.applications_for_function(function).await,
                (None, None) => Ok(Vec::new()),
            };
            let applications = ctx.settle(result).await?;
            if applications.is_empty() {
                println!("{}", "No mapped applications".dimmed());
            }
            for application in applications {
                println!("  {}", application);
            }
            Ok(())
        }
    }
}
