//! XLSX to member updates.
//!
//! Parsing is all-or-nothing: a structurally broken sheet is rejected before
//! anything is written. Applying is row by row; a failing row is reported
//! and the rest still apply.

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use serde::{Deserialize, Serialize};

use super::columns::Column;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{FieldValue, MemberChanges};

/// One data row of an uploaded sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// 1-based spreadsheet row number, or list position for inline edits.
    pub row: usize,
    pub member_id: i64,
    pub changes: MemberChanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    pub row: usize,
    pub member_id: i64,
    pub message: String,
}

/// Outcome of applying a list of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub attempted: usize,
    pub updated: usize,
    pub failures: Vec<RowFailure>,
}

/// Read the first sheet of an XLSX workbook into row updates.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<ImportRow>, AppError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::MalformedInput("Workbook has no sheets".to_string()))??;

    parse_range(&range)
}

fn parse_range(range: &Range<Data>) -> Result<Vec<ImportRow>, AppError> {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| AppError::MalformedInput("Sheet is empty".to_string()))?;
    let columns = map_header(header)?;
    let id_index = columns
        .iter()
        .position(|c| *c == Some(Column::Id))
        .ok_or_else(|| {
            AppError::MalformedInput(format!("Missing '{}' column", Column::Id.header()))
        })?;

    let mut parsed = Vec::new();
    for (offset, cells) in rows.enumerate() {
        // Header is row first_row + 1 in spreadsheet numbering.
        let row = first_row + offset + 2;

        if cells.iter().all(is_blank) {
            continue;
        }

        let member_id = cells
            .get(id_index)
            .and_then(cell_id)
            .ok_or_else(|| AppError::MalformedInput(format!("Row {}: invalid member id", row)))?;

        let mut changes = MemberChanges::new();
        for (index, column) in columns.iter().enumerate() {
            let Some(Column::Field(field)) = column else {
                continue;
            };
            let value = match cells.get(index) {
                Some(cell) => cell_text(cell).map_err(|e| {
                    AppError::MalformedInput(format!("Row {}, {}: {}", row, field.header(), e))
                })?,
                None => None,
            };
            changes.insert(*field, FieldValue::from(value));
        }

        parsed.push(ImportRow {
            row,
            member_id,
            changes,
        });
    }

    Ok(parsed)
}

/// Map header cells to columns. Blank headers are ignored; unknown or
/// repeated headers reject the sheet.
fn map_header(cells: &[Data]) -> Result<Vec<Option<Column>>, AppError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(cells.len());

    for cell in cells {
        let text = match cell_text(cell) {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            _ => {
                columns.push(None);
                continue;
            }
        };

        let column = Column::from_header(&text)
            .ok_or_else(|| AppError::MalformedInput(format!("Unknown column '{}'", text.trim())))?;
        if !seen.insert(column.header()) {
            return Err(AppError::MalformedInput(format!(
                "Duplicate column '{}'",
                column.header()
            )));
        }
        columns.push(Some(column));
    }

    Ok(columns)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_id(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text form of a cell as it would be stored. `None` for an empty cell.
fn cell_text(cell: &Data) -> Result<Option<String>, String> {
    let text = match cell {
        Data::Empty => return Ok(None),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(true) => "Ναι".to_string(),
        Data::Bool(false) => "Όχι".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.date().format("%Y-%m-%d").to_string(),
            None => format_number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s.split('T').next().unwrap_or(s).to_string(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => return Err(format!("cell error {:?}", e)),
    };
    Ok(Some(text))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Apply each row through the member store, in order, without rollback.
pub async fn apply_rows(repo: &Repository, rows: &[ImportRow]) -> ApplyReport {
    let mut report = ApplyReport {
        attempted: rows.len(),
        ..ApplyReport::default()
    };

    for row in rows {
        match repo.update_member(row.member_id, &row.changes).await {
            Ok(_) => report.updated += 1,
            Err(e) => {
                tracing::warn!(
                    "Row {} (member {}) not applied: {}",
                    row.row,
                    row.member_id,
                    e
                );
                report.failures.push(RowFailure {
                    row: row.row,
                    member_id: row.member_id,
                    message: e.message().to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Applied {} of {} rows ({} failed)",
        report.updated,
        report.attempted,
        report.failures.len()
    );
    report
}
