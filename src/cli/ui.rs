//! Terminal prompts and output helpers

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Input, Select};

/// Interactive confirmation prompt using arrow-key navigable selection
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

/// Ask before a destructive action unless `force` was given
pub fn confirm_removal(what: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    let confirmed = prompt_confirmation(&format!("Delete {}?", what), false)?;
    if !confirmed {
        println!("{}", "Cancelled".dimmed());
    }
    Ok(confirmed)
}

pub fn prompt_email(default: Option<String>) -> Result<String> {
    if let Some(email) = default {
        return Ok(email);
    }
    let email = Input::<String>::new().with_prompt("Email").interact_text()?;
    Ok(email)
}

pub fn prompt_password() -> Result<String> {
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

pub fn success(message: impl AsRef<str>) {
    println!("{} {}", "✓".bright_green().bold(), message.as_ref());
}

pub fn warning(message: impl AsRef<str>) {
    println!("{} {}", "⚠".bright_yellow().bold(), message.as_ref().yellow());
}

pub fn heading(title: impl AsRef<str>) {
    println!();
    println!("  {}", title.as_ref().bright_white().bold());
    println!("  {}", "-".repeat(50).dimmed());
}

/// Cut a value to `width` characters for table columns
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Customer satisfaction", 10), "Customer …");
    }

    #[test]
    fn test_forced_removal_skips_prompt() {
        assert!(confirm_removal("event 4", true).unwrap());
    }
}
