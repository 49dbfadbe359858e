//! Survey builder commands
//!
//! Every editing command loads the survey's draft, applies one change and
//! writes the draft back to the local cache. Nothing reaches the backend
//! until `sync`.

use crate::api::ApiError;
use crate::builder::{
    DataSource, Draft, DraftLoader, ElementId, ElementType, OptionLayout,
};
use crate::cli::app::AppContext;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use std::path::PathBuf;

mod edit;
mod preview;
mod sync;

#[derive(Args)]
pub struct BuilderCommands {
    #[command(subcommand)]
    pub command: BuilderSubcommands,
}

#[derive(Subcommand)]
pub enum BuilderSubcommands {
    /// Show the pages and elements of a survey draft
    Show { survey: String },
    /// List locally cached drafts
    Drafts,
    /// Drop the cached draft so the next load starts from the backend
    Discard {
        survey: String,
        #[arg(short, long)]
        force: bool,
    },
    /// Add a page, appended or inserted at a position
    AddPage {
        survey: String,
        /// Page id the new page should get
        #[arg(long)]
        at: Option<usize>,
    },
    /// Remove a page and its elements
    RemovePage { survey: String, page: usize },
    /// Move a page to another position
    MovePage {
        survey: String,
        page: usize,
        to: usize,
    },
    /// Rename a page
    RenamePage {
        survey: String,
        page: usize,
        title: String,
    },
    /// Add an element to a page
    AddElement {
        survey: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long = "type", value_parser = parse_element_type)]
        element_type: ElementType,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        required: bool,
        /// Option label; repeat for several
        #[arg(long = "option")]
        options: Vec<String>,
        /// Where options come from (selectable types)
        #[arg(long, value_parser = parse_data_source)]
        source: Option<DataSource>,
        /// Show only once a mapped application is selected
        #[arg(long)]
        after_selection: bool,
    },
    /// Change an element's texts, requirement or layout
    EditElement {
        survey: String,
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subtitle: Option<String>,
        #[arg(long)]
        required: Option<bool>,
        #[arg(long, value_parser = parse_layout)]
        layout: Option<OptionLayout>,
        /// Rating scale (3 to 10)
        #[arg(long)]
        scale: Option<u8>,
        /// Hero cover image file
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Remove an element
    RemoveElement { survey: String, id: String },
    /// Move an element to a page and position
    MoveElement {
        survey: String,
        id: String,
        #[arg(long)]
        page: usize,
        /// Position within the page, 0-based; defaults to the end
        #[arg(long)]
        index: Option<usize>,
    },
    /// Copy an element right after itself
    DuplicateElement { survey: String, id: String },
    /// Append an option
    AddOption {
        survey: String,
        id: String,
        label: String,
    },
    /// Replace an option label
    SetOption {
        survey: String,
        id: String,
        index: usize,
        label: String,
    },
    /// Remove an option by index
    RemoveOption {
        survey: String,
        id: String,
        index: usize,
    },
    /// Switch an element's data source and refresh its options
    SetSource {
        survey: String,
        id: String,
        #[arg(value_parser = parse_data_source)]
        source: DataSource,
    },
    /// Make an element required when a rating is below a threshold
    RequireWhen {
        survey: String,
        id: String,
        /// Rating element id
        #[arg(long)]
        rating: Option<String>,
        /// Ratings from 1 up to this value minus one trigger the requirement
        #[arg(long, default_value_t = 7)]
        threshold: u8,
        /// Remove the rule instead
        #[arg(long, conflicts_with = "rating")]
        clear: bool,
    },
    /// Survey description and targets
    Meta {
        survey: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        target_respondents: Option<u32>,
        #[arg(long)]
        target_score: Option<u32>,
    },
    /// Logo, background and font
    Style {
        survey: String,
        #[arg(long)]
        logo: Option<PathBuf>,
        #[arg(long)]
        background: Option<PathBuf>,
        #[arg(long)]
        font: Option<String>,
    },
    /// Render the survey as a respondent would see it
    Preview {
        survey: String,
        /// JSON file of simulated answers keyed by element id
        #[arg(long)]
        answers: Option<PathBuf>,
        /// Print the rendered pages as JSON
        #[arg(long)]
        json: bool,
    },
    /// List required widgets that the given answers leave empty
    Validate {
        survey: String,
        #[arg(long)]
        answers: Option<PathBuf>,
    },
    /// Show the operations a sync would run
    Plan { survey: String },
    /// Push the draft to the backend
    Sync { survey: String },
}

fn parse_element_type(value: &str) -> Result<ElementType, String> {
    ElementType::parse(value).ok_or_else(|| format!("unknown element type '{}'", value))
}

fn parse_data_source(value: &str) -> Result<DataSource, String> {
    DataSource::parse(value).ok_or_else(|| {
        let known: Vec<&str> = DataSource::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown data source '{}' (expected one of {})", value, known.join(", "))
    })
}

fn parse_layout(value: &str) -> Result<OptionLayout, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "vertical" => Ok(OptionLayout::Vertical),
        "horizontal" => Ok(OptionLayout::Horizontal),
        other => Err(format!("unknown layout '{}'", other)),
    }
}

pub async fn builder_command(args: BuilderCommands, ctx: &mut AppContext) -> Result<()> {
    use BuilderSubcommands as B;
    match args.command {
        B::Show { survey } => {
            let draft = open_draft(ctx, &survey).await?;
            print_draft(&draft);
            Ok(())
        }
        B::Drafts => list_drafts(ctx).await,
        B::Discard { survey, force } => {
            if !crate::cli::ui::confirm_removal(&format!("the local draft of survey {}", survey), force)? {
                return Ok(());
            }
            if ctx.session.store().delete_draft(&survey).await? {
                crate::cli::ui::success(format!("Discarded local draft of survey {}", survey));
            } else {
                println!("{}", "No local draft".dimmed());
            }
            Ok(())
        }
        B::Preview {
            survey,
            answers,
            json,
        } => preview::preview_command(ctx, &survey, answers, json).await,
        B::Validate { survey, answers } => preview::validate_command(ctx, &survey, answers).await,
        B::Plan { survey } => sync::plan_command(ctx, &survey).await,
        B::Sync { survey } => sync::sync_command(ctx, &survey).await,
        B::AddPage { survey, at } => edit::apply(ctx, &survey, |d| edit::add_page(d, at)).await,
        B::RemovePage { survey, page } => {
            edit::apply(ctx, &survey, |d| edit::remove_page(d, page)).await
        }
        B::MovePage { survey, page, to } => {
            edit::apply(ctx, &survey, |d| edit::move_page(d, page, to)).await
        }
        B::RenamePage {
            survey,
            page,
            title,
        } => edit::apply(ctx, &survey, |d| edit::rename_page(d, page, title)).await,
        B::AddElement {
            survey,
            page,
            element_type,
            title,
            required,
            options,
            source,
            after_selection,
        } => {
            let element = edit::NewElement {
                page,
                element_type,
                title,
                required,
                options,
                source,
                after_selection,
            };
            edit::add_element_command(ctx, &survey, element).await
        }
        B::EditElement {
            survey,
            id,
            title,
            subtitle,
            required,
            layout,
            scale,
            image,
        } => {
            let changes = edit::ElementChanges {
                title,
                subtitle,
                required,
                layout,
                scale,
                image,
            };
            edit::apply(ctx, &survey, |d| edit::edit_element(d, &id, changes)).await
        }
        B::RemoveElement { survey, id } => {
            edit::apply(ctx, &survey, |d| edit::remove_element(d, &id)).await
        }
        B::MoveElement {
            survey,
            id,
            page,
            index,
        } => edit::apply(ctx, &survey, |d| edit::move_element(d, &id, page, index)).await,
        B::DuplicateElement { survey, id } => {
            edit::apply(ctx, &survey, |d| edit::duplicate_element(d, &id)).await
        }
        B::AddOption { survey, id, label } => {
            edit::apply(ctx, &survey, |d| edit::add_option(d, &id, label)).await
        }
        B::SetOption {
            survey,
            id,
            index,
            label,
        } => edit::apply(ctx, &survey, |d| edit::set_option(d, &id, index, label)).await,
        B::RemoveOption { survey, id, index } => {
            edit::apply(ctx, &survey, |d| edit::remove_option(d, &id, index)).await
        }
        B::SetSource { survey, id, source } => {
            edit::set_source_command(ctx, &survey, &id, source).await
        }
        B::RequireWhen {
            survey,
            id,
            rating,
            threshold,
            clear,
        } => {
            let rating = if clear { None } else { rating };
            edit::apply(ctx, &survey, |d| {
                edit::require_when(d, &id, rating.as_deref(), threshold)
            })
            .await
        }
        B::Meta {
            survey,
            title,
            description,
            target_respondents,
            target_score,
        } => {
            let changes = edit::MetaChanges {
                title,
                description,
                target_respondents,
                target_score,
            };
            edit::apply(ctx, &survey, |d| edit::update_meta(d, changes)).await
        }
        B::Style {
            survey,
            logo,
            background,
            font,
        } => {
            edit::apply(ctx, &survey, |d| {
                edit::update_style(d, logo.as_deref(), background.as_deref(), font)
            })
            .await
        }
    }
}

/// Load a survey's draft: local cache, backend questions, legacy template
/// or a blank draft, in that order
pub(crate) async fn open_draft(ctx: &mut AppContext, survey: &str) -> Result<Draft> {
    let cached = {
        let client = ctx.session.require_auth()?;
        DraftLoader::new(ctx.session.store(), client, &ctx.config.legacy_templates)
            .load_cached(survey)
            .await?
    };
    if let Some(draft) = cached {
        return Ok(draft);
    }

    let result = ctx.session.require_auth()?.get_event(survey).await;
    let title = ctx.settle(result).await?.title;

    let loaded = {
        let client = ctx.session.require_auth()?;
        DraftLoader::new(ctx.session.store(), client, &ctx.config.legacy_templates)
            .load_fresh(survey, &title)
            .await
    };
    let (draft, origin) = match loaded {
        Ok(loaded) => loaded,
        Err(error) => {
            if error
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::is_unauthorized)
            {
                ctx.session.clear().await?;
            }
            return Err(error);
        }
    };

    println!("{}", format!("Draft built from {}", origin.as_str()).dimmed());
    Ok(draft)
}

pub(crate) async fn save_draft(ctx: &AppContext, draft: &Draft) -> Result<()> {
    ctx.session.store().save_draft(draft).await
}

async fn list_drafts(ctx: &AppContext) -> Result<()> {
    let drafts = ctx.session.store().list_drafts().await?;
    if drafts.is_empty() {
        println!("{}", "No local drafts".dimmed());
        return Ok(());
    }
    println!("{:<16} {}", "Survey", "Last saved");
    println!("{}", "-".repeat(40));
    for entry in drafts {
        println!(
            "{:<16} {}",
            entry.survey_id,
            entry.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn print_draft(draft: &Draft) {
    crate::cli::ui::heading(format!("{} (survey {})", draft.meta.title, draft.survey_id));
    if !draft.meta.description.is_empty() {
        println!("  {}", draft.meta.description.dimmed());
    }

    for page in &draft.pages {
        println!();
        println!("  {} {}", format!("[{}]", page.id).cyan().bold(), page.title.bold());
        if page.elements.is_empty() {
            println!("      {}", "(empty)".dimmed());
        }
        for element in &page.elements {
            let mut flags = Vec::new();
            if element.required {
                flags.push("required".to_string());
            }
            if !element.data_source.is_manual() {
                flags.push(format!("source={}", element.data_source.as_str()));
            }
            if let Some(rule) = &element.conditional_required {
                flags.push(format!("required if {} < {}", rule.source_id, rule.threshold));
            }
            if element.display_condition != crate::builder::DisplayCondition::Always {
                flags.push("after selection".to_string());
            }

            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!("({})", flags.join(", "))
            };
            println!(
                "      {:<22} {:<10} {} {}",
                element.id.as_str().dimmed(),
                element.element_type.as_str(),
                element.title,
                flags.yellow()
            );
            if element.element_type.is_selectable() && !element.options.is_empty() {
                println!("      {:<22} {}", "", element.options.join(" | ").dimmed());
            }
        }
    }
}

/// Element id argument; `q-` prefixes may be omitted for remote questions
pub(crate) fn element_id(draft: &Draft, raw: &str) -> ElementId {
    let direct = ElementId::new(raw.trim());
    if draft.locate(&direct).is_some() {
        return direct;
    }
    let remote = ElementId::remote(raw.trim());
    if draft.locate(&remote).is_some() { remote } else { direct }
}
