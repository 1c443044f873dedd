//! Batch card rendering into a single ZIP archive.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use chrono::NaiveDate;
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{card_file_name, CardRenderer};
use crate::db::Repository;
use crate::errors::AppError;

/// A member left out of an archive and why.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCard {
    pub member_id: i64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct CardArchive {
    pub bytes: Vec<u8>,
    /// Entry names in insertion order.
    pub entries: Vec<String>,
    pub skipped: Vec<SkippedCard>,
}

/// Render every id independently; failures are skipped, not fatal.
pub async fn render_archive(
    repo: &Repository,
    renderer: &CardRenderer,
    ids: &[i64],
    issue_date: NaiveDate,
) -> Result<CardArchive, AppError> {
    let mut rendered: Vec<(String, Vec<u8>)> = Vec::new();
    let mut skipped = Vec::new();
    let mut used_names = HashSet::new();

    for &id in ids {
        let member = match repo.get_member(id).await? {
            Some(member) => member,
            None => {
                tracing::warn!("Skipping card for member {}: not found", id);
                skipped.push(SkippedCard {
                    member_id: id,
                    reason: AppError::member_not_found(id).message().to_string(),
                });
                continue;
            }
        };

        let bytes = match renderer.render(&member, issue_date) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Skipping card for member {}: {}", id, e);
                skipped.push(SkippedCard {
                    member_id: id,
                    reason: e.message().to_string(),
                });
                continue;
            }
        };

        let name = unique_entry_name(&mut used_names, card_file_name(&member), id);
        rendered.push((name, bytes));
    }

    let bytes = write_zip(&rendered)?;
    let entries: Vec<String> = rendered.into_iter().map(|(name, _)| name).collect();

    tracing::info!(
        "Card archive built: {} rendered, {} skipped",
        entries.len(),
        skipped.len()
    );

    Ok(CardArchive {
        bytes,
        entries,
        skipped,
    })
}

/// Claim `name`, or the first free `<stem>_<id>[_n].pdf` variant of it.
fn unique_entry_name(used: &mut HashSet<String>, name: String, id: i64) -> String {
    if used.insert(name.clone()) {
        return name;
    }

    let stem = name.trim_end_matches(".pdf");
    let mut candidate = format!("{}_{}.pdf", stem, id);
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}_{}_{}.pdf", stem, id, n);
        n += 1;
    }
    candidate
}

fn write_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in files {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        zip.finish()?;
    }
    Ok(buf.into_inner())
}
