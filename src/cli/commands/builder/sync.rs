//! Sync plan and execution

use super::{open_draft, save_draft};
use crate::cli::app::AppContext;
use crate::cli::ui;
use crate::sync::{self, Operation};
use anyhow::Result;
use colored::*;

pub(super) async fn plan_command(ctx: &mut AppContext, survey: &str) -> Result<()> {
    let draft = open_draft(ctx, survey).await?;
    let result = ctx.session.require_auth()?.list_questions(survey).await;
    let remote = ctx.settle(result).await?;

    let plan = sync::plan(&draft, &remote);
    if plan.is_empty() {
        println!("{}", "Nothing to sync".dimmed());
        return Ok(());
    }

    println!("{:<8} {}", "Method", "Operation");
    println!("{}", "-".repeat(50));
    for operation in &plan.operations {
        let method = match operation {
            Operation::Create { .. } => operation.http_method().green(),
            Operation::Update { .. } => operation.http_method().yellow(),
            Operation::Delete { .. } => operation.http_method().red(),
        };
        println!("{:<8} {}", method, operation);
    }
    println!();
    println!(
        "{} create, {} update, {} delete",
        plan.creates(),
        plan.updates(),
        plan.deletes()
    );
    Ok(())
}

pub(super) async fn sync_command(ctx: &mut AppContext, survey: &str) -> Result<()> {
    let mut draft = open_draft(ctx, survey).await?;
    let result = sync::sync_draft(ctx.session.require_auth()?, &mut draft).await;

    // Keep ids of questions created before a failure so they are not
    // created twice on the next run
    save_draft(ctx, &draft).await?;
    let report = ctx.settle(result).await?;

    ui::success(format!(
        "Synced survey {}: {} created, {} updated, {} deleted",
        survey, report.created, report.updated, report.deleted
    ));
    for warning in &report.warnings {
        ui::warning(warning);
    }
    Ok(())
}
