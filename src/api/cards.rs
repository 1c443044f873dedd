//! Member card downloads.

use axum::extract::{Path, Query, State};
use chrono::Local;

use super::Download;
use crate::cards::{render_archive, render_card};
use crate::errors::AppError;
use crate::models::MemberFilter;
use crate::AppState;

/// GET /api/members/{id}/card - PDF card for one member.
pub async fn download_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Download, AppError> {
    let issue_date = Local::now().date_naive();

    match render_card(&state.repo, &state.cards, id, issue_date).await? {
        Some(card) => Ok(Download::new("application/pdf", card.file_name, card.bytes)),
        None => Err(AppError::member_not_found(id)),
    }
}

/// GET /api/cards/archive - ZIP of cards for every matching member.
pub async fn download_card_archive(
    State(state): State<AppState>,
    Query(filter): Query<MemberFilter>,
) -> Result<Download, AppError> {
    let now = Local::now();
    let ids: Vec<i64> = state
        .repo
        .list_members(&filter)
        .await?
        .iter()
        .map(|m| m.member_id)
        .collect();

    let archive = render_archive(&state.repo, &state.cards, &ids, now.date_naive()).await?;
    let skipped: Vec<String> = archive
        .skipped
        .iter()
        .map(|s| s.member_id.to_string())
        .collect();

    Ok(Download::new(
        "application/zip",
        format!("Karteles_Melon_{}.zip", now.format("%Y%m%d_%H%M")),
        archive.bytes,
    )
    .with_header("x-cards-rendered", archive.entries.len())
    .with_header("x-cards-skipped", skipped.join(",")))
}
