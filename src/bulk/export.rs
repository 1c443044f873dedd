//! Member listing to XLSX.

use rust_xlsxwriter::{Format, Workbook};

use super::columns::{export_columns, Column};
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Member, MemberFilter};

pub const SHEET_NAME: &str = "Μέλη";

/// Export the members matching `filter` as an XLSX workbook.
pub async fn export_members(repo: &Repository, filter: &MemberFilter) -> Result<Vec<u8>, AppError> {
    let members = repo.list_members(filter).await?;
    let bytes = write_workbook(&members)?;
    tracing::info!("Exported {} members to spreadsheet", members.len());
    Ok(bytes)
}

/// One bold header row, then one row per member. NULL stays a blank cell.
pub fn write_workbook(members: &[Member]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, column) in export_columns().enumerate() {
        sheet.write_string_with_format(0, col as u16, column.header(), &header_format)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (i, member) in members.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, column) in export_columns().enumerate() {
            let col = col as u16;
            match column {
                Column::Id => {
                    sheet.write_number(row, col, member.member_id as f64)?;
                }
                Column::Field(field) => {
                    if let Some(value) = member.get(field) {
                        sheet.write_string(row, col, value)?;
                    }
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
