//! Spreadsheet exchange for user import and export

use crate::api::User;
use anyhow::{Context, Result, anyhow};
use calamine::{Reader, open_workbook_auto};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Columns an import sheet must have
pub const REQUIRED_COLUMNS: [&str; 3] = ["email", "name", "role"];

const EXPORT_HEADERS: [&str; 5] = ["Email", "Name", "Role", "Department", "Active"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportCheck {
    /// Non-empty data rows found
    pub rows: usize,
    pub problems: Vec<String>,
}

impl ImportCheck {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"))
}

/// Check a user import sheet before uploading it.
/// Fails outright when the file cannot be read or a required column is
/// missing; row-level issues are collected as problems.
pub fn check_user_import(path: &Path) -> Result<ImportCheck> {
    if !is_spreadsheet(path) {
        anyhow::bail!("Only .xlsx and .xls files can be imported: {}", path.display());
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Spreadsheet contains no sheets"))?
        .map_err(|e| anyhow!("Error reading first sheet: {}", e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| anyhow!("Spreadsheet is empty"))?
        .iter()
        .map(|cell| cell.to_string().trim().to_lowercase())
        .collect();

    let mut columns = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for required in REQUIRED_COLUMNS {
        let index = headers
            .iter()
            .position(|h| h == required)
            .ok_or_else(|| anyhow!("Missing required column '{}'", required))?;
        columns.push((required, index));
    }

    let mut check = ImportCheck::default();
    for (offset, row) in rows.enumerate() {
        // Spreadsheet row number: header is row 1
        let row_number = offset + 2;
        let cells: Vec<String> = row.iter().map(|cell| cell.to_string().trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        check.rows += 1;

        for (column, index) in &columns {
            let value = cells.get(*index).map(String::as_str).unwrap_or_default();
            if value.is_empty() {
                check.problems.push(format!("Row {}: missing {}", row_number, column));
            } else if *column == "email" && !value.contains('@') {
                check.problems.push(format!("Row {}: invalid email '{}'", row_number, value));
            }
        }
    }

    log::debug!(
        "Checked import sheet {}: {} rows, {} problems",
        path.display(),
        check.rows,
        check.problems.len()
    );
    Ok(check)
}

fn users_workbook(users: &[User]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Users")?;

    let header_format = Format::new().set_bold();
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, user) in users.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, &user.email)?;
        sheet.write_string(row, 1, &user.name)?;
        sheet.write_string(row, 2, &user.role)?;
        sheet.write_string(row, 3, user.department.as_deref().unwrap_or_default())?;
        sheet.write_boolean(row, 4, user.is_active)?;
    }

    sheet.set_column_width(0, 32.0)?;
    sheet.set_column_width(1, 24.0)?;
    Ok(workbook)
}

/// Write users to an .xlsx file with a bold header row
pub fn export_users(users: &[User], path: &Path) -> Result<()> {
    let mut workbook = users_workbook(users)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;
    log::info!("Exported {} users to {}", users.len(), path.display());
    Ok(())
}
