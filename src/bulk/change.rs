//! Set one field to one value across every member matching a filter.

use serde::{Deserialize, Serialize};

use super::import::RowFailure;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{FieldValue, MemberChanges, MemberField, MemberFilter};

/// Fields that may be changed in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkField {
    Rank,
    MemberStatus,
    FinancialStatus,
    InitiationLodge,
}

impl BulkField {
    pub fn field(self) -> MemberField {
        match self {
            BulkField::Rank => MemberField::CurrentDegree,
            BulkField::MemberStatus => MemberField::MemberStatus,
            BulkField::FinancialStatus => MemberField::FinancialStatus,
            BulkField::InitiationLodge => MemberField::InitiationLodge,
        }
    }
}

/// Request body: the member filter plus the field and its new value.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkChangeRequest {
    #[serde(flatten)]
    pub filter: MemberFilter,
    pub field: BulkField,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkChangeReport {
    pub matched: usize,
    pub updated: usize,
    pub failures: Vec<RowFailure>,
}

/// Overwrite `field` with `value` on every matching member.
///
/// The value is validated once before any member is touched.
pub async fn apply_bulk_change(
    repo: &Repository,
    filter: &MemberFilter,
    field: BulkField,
    value: &str,
) -> Result<BulkChangeReport, AppError> {
    let value = FieldValue::from_text(value);
    if value == FieldValue::Clear {
        return Err(AppError::Validation(format!(
            "A value is required for {}",
            field.field().column()
        )));
    }
    field.field().validate(&value)?;

    let members = repo.list_members(filter).await?;
    let changes = MemberChanges::single(field.field(), value);

    let mut report = BulkChangeReport {
        matched: members.len(),
        ..BulkChangeReport::default()
    };

    for (index, member) in members.iter().enumerate() {
        match repo.update_member(member.member_id, &changes).await {
            Ok(_) => report.updated += 1,
            Err(e) => {
                tracing::warn!("Bulk change skipped member {}: {}", member.member_id, e);
                report.failures.push(RowFailure {
                    row: index + 1,
                    member_id: member.member_id,
                    message: e.message().to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Bulk change of {}: {} of {} members updated",
        field.field().column(),
        report.updated,
        report.matched
    );
    Ok(report)
}
