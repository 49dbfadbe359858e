//! Survey event commands

use crate::api::events::validate_event;
use crate::api::{Event, EventInput, QueryBuilder};
use crate::cli::app::AppContext;
use crate::cli::ui;
use anyhow::{Context, Result, anyhow};
use base64::Engine;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::*;
use std::path::PathBuf;

#[derive(Args)]
pub struct EventCommands {
    #[command(subcommand)]
    pub command: EventSubcommands,
}

#[derive(Args, Clone, Default)]
pub struct EventFields {
    /// Event title
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Start time (RFC 3339)
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,
    /// End time (RFC 3339)
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,
    #[arg(long)]
    pub target_respondents: Option<u32>,
    /// Target score in percent
    #[arg(long)]
    pub target_score: Option<u32>,
}

#[derive(Subcommand)]
pub enum EventSubcommands {
    /// List events
    List {
        /// Case-insensitive search over title and description
        #[arg(short, long)]
        search: Option<String>,
        /// Only events with this status
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        /// Rows per page; defaults to settings.page_size
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Show one event
    Show { id: String },
    /// Create an event
    Create {
        #[command(flatten)]
        fields: EventFields,
    },
    /// Update an event; omitted fields keep their value
    Update {
        id: String,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event
    Delete {
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Publish an event
    Publish { id: String },
    /// Schedule an event window
    Schedule {
        id: String,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Print the respondent link and optionally save the QR image
    Qr {
        id: String,
        /// Write the QR code PNG here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn events_command(args: EventCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        EventSubcommands::List {
            search,
            status,
            page,
            per_page,
        } => list_command(ctx, search, status, page, per_page).await,
        EventSubcommands::Show { id } => {
            let result = ctx.session.require_auth()?.get_event(&id).await;
            let event = ctx.settle(result).await?;
            print_event(&event);
            Ok(())
        }
        EventSubcommands::Create { fields } => create_command(ctx, fields).await,
        EventSubcommands::Update { id, fields } => update_command(ctx, &id, fields).await,
        EventSubcommands::Delete { id, force } => {
            if !ui::confirm_removal(&format!("event {}", id), force)? {
                return Ok(());
            }
            let result = ctx.session.require_auth()?.delete_event(&id).await;
            ctx.settle(result).await?;
            // A cached draft for a deleted survey is useless
            ctx.session.store().delete_draft(&id).await?;
            ui::success(format!("Deleted event {}", id));
            Ok(())
        }
        EventSubcommands::Publish { id } => {
            let result = ctx.session.require_auth()?.publish_event(&id).await;
            let event = ctx.settle(result).await?;
            ui::success(format!("'{}' is now {}", event.title, event.status.as_str()));
            Ok(())
        }
        EventSubcommands::Schedule { id, start, end } => {
            let result = ctx
                .session
                .require_auth()?
                .schedule_event(&id, start, end)
                .await;
            let event = ctx.settle(result).await?;
            ui::success(format!(
                "'{}' scheduled from {} to {}",
                event.title,
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ));
            Ok(())
        }
        EventSubcommands::Qr { id, output } => qr_command(ctx, &id, output).await,
    }
}

async fn list_command(
    ctx: &mut AppContext,
    search: Option<String>,
    status: Option<String>,
    page: usize,
    per_page: Option<usize>,
) -> Result<()> {
    let result = ctx.session.require_auth()?.list_events().await;
    let events = ctx.settle(result).await?;

    let mut query = QueryBuilder::new()
        .page(page)
        .per_page(per_page.unwrap_or(ctx.config.settings.page_size));
    if let Some(search) = search {
        query = query.search(search);
    }
    if let Some(status) = status {
        query = query.status(status);
    }
    let listing = query.build().apply(&events);

    if listing.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    println!("{:<10} {:<40} {:<10} {:>9}", "ID", "Title", "Status", "Responses");
    println!("{}", "-".repeat(72));
    for event in &listing.items {
        println!(
            "{:<10} {:<40} {:<10} {:>9}",
            ui::truncate(&event.id, 10),
            ui::truncate(&event.title, 40),
            status_label(event),
            event.response_count
        );
    }
    println!();
    println!(
        "Page {} of {} ({} events)",
        listing.page,
        listing.total_pages(),
        listing.total
    );
    Ok(())
}

fn status_label(event: &Event) -> ColoredString {
    use crate::api::EventStatus;
    let label = format!("{:<10}", event.status.as_str());
    match event.status {
        EventStatus::Active => label.bright_green(),
        EventStatus::Scheduled => label.cyan(),
        EventStatus::Closed => label.dimmed(),
        _ => label.normal(),
    }
}

fn print_event(event: &Event) {
    ui::heading(&event.title);
    println!("  {:<20} {}", "ID:", event.id);
    println!("  {:<20} {}", "Status:", status_label(event));
    if let Some(description) = &event.description {
        println!("  {:<20} {}", "Description:", description);
    }
    if let (Some(start), Some(end)) = (event.start_date, event.end_date) {
        println!(
            "  {:<20} {} to {}",
            "Window:",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        );
    }
    if let Some(target) = event.target_respondents {
        println!("  {:<20} {}", "Target respondents:", target);
    }
    if let Some(score) = event.target_score {
        println!("  {:<20} {}%", "Target score:", score);
    }
    println!("  {:<20} {}", "Responses:", event.response_count);
}

/// Overlay provided fields on an existing input
fn merge_fields(mut input: EventInput, fields: EventFields) -> EventInput {
    if let Some(title) = fields.title {
        input.title = title;
    }
    if fields.description.is_some() {
        input.description = fields.description;
    }
    if fields.start.is_some() {
        input.start_date = fields.start;
    }
    if fields.end.is_some() {
        input.end_date = fields.end;
    }
    if fields.target_respondents.is_some() {
        input.target_respondents = fields.target_respondents;
    }
    if fields.target_score.is_some() {
        input.target_score = fields.target_score;
    }
    input
}

fn report_invalid(error: &crate::api::ApiError) {
    if let crate::api::ApiError::Validation { details, .. } = error {
        for detail in details {
            println!("  {} {}", "•".red(), detail);
        }
    }
}

async fn create_command(ctx: &mut AppContext, fields: EventFields) -> Result<()> {
    let input = merge_fields(EventInput::default(), fields);
    if let Err(error) = validate_event(&input) {
        report_invalid(&error);
        return Err(error.into());
    }

    let result = ctx.session.require_auth()?.create_event(&input).await;
    let event = ctx.settle(result).await?;
    ui::success(format!(
        "Created event '{}' with id {}",
        event.title.bright_yellow().bold(),
        event.id
    ));
    Ok(())
}

async fn update_command(ctx: &mut AppContext, id: &str, fields: EventFields) -> Result<()> {
    let result = ctx.session.require_auth()?.get_event(id).await;
    let current = ctx.settle(result).await?;
    let base = EventInput {
        title: current.title,
        description: current.description,
        start_date: current.start_date,
        end_date: current.end_date,
        target_respondents: current.target_respondents,
        target_score: current.target_score,
    };
    let input = merge_fields(base, fields);
    if let Err(error) = validate_event(&input) {
        report_invalid(&error);
        return Err(error.into());
    }

    let result = ctx.session.require_auth()?.update_event(id, &input).await;
    let event = ctx.settle(result).await?;
    ui::success(format!("Updated event '{}'", event.title));
    Ok(())
}

async fn qr_command(ctx: &mut AppContext, id: &str, output: Option<PathBuf>) -> Result<()> {
    let result = ctx.session.require_auth()?.event_qr_code(id).await;
    let qr = ctx.settle(result).await?;
    println!("{}", qr.url);

    let Some(output) = output else {
        return Ok(());
    };
    let image = qr
        .image
        .ok_or_else(|| anyhow!("Backend returned no QR image for event {}", id))?;
    let bytes = decode_data_url(&image)?;
    std::fs::write(&output, bytes)
        .with_context(|| format!("Failed to write QR code: {}", output.display()))?;
    ui::success(format!("QR code saved to {}", output.display()));
    Ok(())
}

/// Decode a base64 data URL into raw bytes
fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let encoded = data_url
        .split_once(";base64,")
        .map(|(_, data)| data)
        .unwrap_or(data_url);
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .context("QR image is not valid base64")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let base = EventInput {
            title: "Pulse".to_string(),
            description: Some("Quarterly".to_string()),
            target_score: Some(80),
            ..EventInput::default()
        };
        let merged = merge_fields(
            base,
            EventFields {
                title: Some("Pulse Q3".to_string()),
                ..EventFields::default()
            },
        );
        assert_eq!(merged.title, "Pulse Q3");
        assert_eq!(merged.description.as_deref(), Some("Quarterly"));
        assert_eq!(merged.target_score, Some(80));
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(decode_data_url("data:image/png;base64,aGk=").unwrap(), b"hi");
        assert_eq!(decode_data_url("aGk=").unwrap(), b"hi");
        assert!(decode_data_url("data:image/png;base64,***").is_err());
    }
}
