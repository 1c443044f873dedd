//! Spreadsheet export/import, bulk field changes and inline grid edits.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use chrono::Local;
use serde::Deserialize;

use super::{success, ApiResult, Download, XLSX_CONTENT_TYPE};
use crate::bulk::{
    apply_bulk_change, apply_rows, export_members, parse_workbook, ApplyReport, BulkChangeReport,
    BulkChangeRequest, ImportRow,
};
use crate::errors::AppError;
use crate::models::{MemberChanges, MemberFilter};
use crate::AppState;

/// One edited row from the dashboard grid.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineEdit {
    pub member_id: i64,
    pub changes: MemberChanges,
}

/// GET /api/members/export - XLSX of the matching members.
pub async fn export_spreadsheet(
    State(state): State<AppState>,
    Query(filter): Query<MemberFilter>,
) -> Result<Download, AppError> {
    let bytes = export_members(&state.repo, &filter).await?;
    let file_name = format!("Mitroo_Melon_{}.xlsx", Local::now().format("%Y%m%d"));
    Ok(Download::new(XLSX_CONTENT_TYPE, file_name, bytes))
}

/// POST /api/members/import - Raw XLSX body.
///
/// A malformed sheet is rejected before any write; otherwise rows apply
/// independently and failures are listed in the report.
pub async fn import_spreadsheet(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<ApplyReport> {
    if body.is_empty() {
        return Err(AppError::MalformedInput("Empty upload".to_string()));
    }
    let rows = parse_workbook(&body)?;
    tracing::info!("Importing {} spreadsheet rows", rows.len());
    success(apply_rows(&state.repo, &rows).await)
}

/// POST /api/members/bulk-change - Overwrite one field on every matching member.
pub async fn bulk_change(
    State(state): State<AppState>,
    Json(request): Json<BulkChangeRequest>,
) -> ApiResult<BulkChangeReport> {
    success(apply_bulk_change(&state.repo, &request.filter, request.field, &request.value).await?)
}

/// PUT /api/members/batch - Apply several inline edits.
pub async fn batch_update_members(
    State(state): State<AppState>,
    Json(edits): Json<Vec<InlineEdit>>,
) -> ApiResult<ApplyReport> {
    let rows: Vec<ImportRow> = edits
        .into_iter()
        .enumerate()
        .map(|(index, edit)| ImportRow {
            row: index + 1,
            member_id: edit.member_id,
            changes: edit.changes,
        })
        .collect();

    success(apply_rows(&state.repo, &rows).await)
}
