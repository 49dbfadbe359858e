//! Respondent preview and answer validation

use super::open_draft;
use crate::builder::preview::{self, PreviewPage};
use crate::builder::{Answers, Draft, ElementType, MasterData, Selection};
use crate::cli::app::AppContext;
use crate::cli::ui;
use crate::suggest::ApplicationLookup;
use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};

fn read_answers(path: Option<&Path>) -> Result<Answers> {
    let Some(path) = path else {
        return Ok(Answers::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Answers file is not valid JSON: {}", path.display()))?;
    Answers::from_json(&value)
}

/// Master data plus the selection implied by the answers, with mapped
/// applications fetched for the selected department and function
async fn render_pages(ctx: &mut AppContext, draft: &Draft, answers: &Answers) -> Result<Vec<PreviewPage>> {
    let result = ctx.session.require_auth()?.master_data().await;
    let master: MasterData = ctx.settle(result).await?;

    let mut selection: Selection = preview::selection_from_answers(draft, answers);
    let lookup = ApplicationLookup::new(ctx.session.require_auth()?);
    let result = lookup.fill(&master, &mut selection).await;
    ctx.settle(result).await?;

    Ok(preview::render(draft, &master, &selection, answers))
}

pub(super) async fn preview_command(
    ctx: &mut AppContext,
    survey: &str,
    answers: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let draft = open_draft(ctx, survey).await?;
    let answers = read_answers(answers.as_deref())?;
    let pages = render_pages(ctx, &draft, &answers).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
        return Ok(());
    }

    ui::heading(&draft.meta.title);
    for page in &pages {
        println!();
        println!("  {}", format!("Page {}: {}", page.id, page.title).cyan().bold());
        for widget in &page.widgets {
            let marker = if widget.required { "*".red().bold() } else { " ".normal() };
            let context = widget
                .context
                .as_deref()
                .map(|value| format!(" [{}]", value))
                .unwrap_or_default();
            println!("    {}{}{}", marker, widget.title, context.bright_blue());
            if !widget.subtitle.is_empty() {
                println!("      {}", widget.subtitle.dimmed());
            }
            match widget.element_type {
                ElementType::Rating => {
                    let scale = widget.scale.unwrap_or_default();
                    println!("      {}", format!("1 .. {}", scale).dimmed());
                }
                _ if !widget.options.is_empty() => {
                    println!("      {}", widget.options.join(" | ").dimmed());
                }
                _ => {}
            }
        }
    }
    Ok(())
}

pub(super) async fn validate_command(ctx: &mut AppContext, survey: &str, answers: Option<PathBuf>) -> Result<()> {
    let draft = open_draft(ctx, survey).await?;
    let answers = read_answers(answers.as_deref())?;
    let pages = render_pages(ctx, &draft, &answers).await?;

    let missing = preview::missing_required(&pages, &answers);
    if missing.is_empty() {
        ui::success("All required questions are answered");
        return Ok(());
    }

    ui::warning(format!("{} required answers missing", missing.len()));
    for key in &missing {
        match &key.repetition {
            Some(repetition) => println!("  {} {} [{}]", "•".red(), key.element, repetition),
            None => println!("  {} {}", "•".red(), key.element),
        }
    }
    anyhow::bail!("Survey answers are incomplete")
}
