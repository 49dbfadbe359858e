//! Settings commands

use crate::cli::app::AppContext;
use crate::cli::ui;
use crate::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

#[derive(Args)]
pub struct SettingsCommands {
    #[command(subcommand)]
    pub command: SettingsSubcommands,
}

#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show all settings
    Show,
    /// Get a specific setting value
    Get {
        /// Setting key, e.g. api.base_url
        key: String,
    },
    /// Set a setting value
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// Survey titles that fall back to the legacy template
    #[command(subcommand)]
    LegacyTemplates(LegacyTemplateCommands),
}

#[derive(Subcommand)]
pub enum LegacyTemplateCommands {
    /// List configured title fragments
    List,
    /// Add a title fragment (case-insensitive substring)
    Add { fragment: String },
    /// Remove a title fragment
    Remove { fragment: String },
}

pub fn settings_command(args: SettingsCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        SettingsSubcommands::Show => {
            show_command(&ctx.config);
            Ok(())
        }
        SettingsSubcommands::Get { key } => {
            println!("{}", ctx.config.get_setting(&key)?);
            Ok(())
        }
        SettingsSubcommands::Set { key, value } => {
            ctx.config.set_setting(&key, &value)?;
            ctx.config.save()?;
            ui::success(format!("{} = {}", key.bright_yellow(), ctx.config.get_setting(&key)?));
            Ok(())
        }
        SettingsSubcommands::LegacyTemplates(command) => legacy_templates_command(command, &mut ctx.config),
    }
}

fn show_command(config: &Config) {
    ui::heading("Settings");
    for key in Config::SETTING_KEYS {
        let value = config.get_setting(key).unwrap_or_default();
        println!("  {:<34} {}", key.cyan(), value);
    }
    println!();
    println!("  {:<34} {}", "legacy_templates".cyan(), config.legacy_templates.join(", "));
}

fn legacy_templates_command(command: LegacyTemplateCommands, config: &mut Config) -> Result<()> {
    match command {
        LegacyTemplateCommands::List => {
            if config.legacy_templates.is_empty() {
                println!("{}", "No legacy template titles configured".dimmed());
            }
            for fragment in &config.legacy_templates {
                println!("  {}", fragment);
            }
        }
        LegacyTemplateCommands::Add { fragment } => {
            config.add_legacy_template(fragment.clone())?;
            ui::success(format!("Titles containing '{}' now use the legacy template", fragment.trim()));
        }
        LegacyTemplateCommands::Remove { fragment } => {
            config.remove_legacy_template(&fragment)?;
            ui::success(format!("Removed '{}'", fragment));
        }
    }
    Ok(())
}
