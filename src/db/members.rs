//! Member store: search, fetch, create, partial update and statistics.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::Repository;
use crate::errors::AppError;
use crate::models::{
    normalize_rank_label, Member, MemberChanges, MemberFilter, MemberStatistics, MemberStatus,
};

/// Label used for members whose grouping column is NULL.
pub const UNSET_GROUP: &str = "—";

impl Repository {
    /// List members matching a filter, ordered by name.
    pub async fn list_members(&self, filter: &MemberFilter) -> Result<Vec<Member>, AppError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM members WHERE 1 = 1");

        if let Some(term) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            let pattern = format!("%{}%", term);
            builder
                .push(" AND (last_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR first_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR mobile_phone LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(status) = filter.status {
            builder
                .push(" AND member_status = ")
                .push_bind(status.as_str());
        }

        if let Some(rank) = filter.rank {
            builder.push(" AND current_degree IN (");
            let mut labels = builder.separated(", ");
            for label in rank.stored_labels() {
                labels.push_bind(*label);
            }
            labels.push_unseparated(")");
        }

        if let Some(financial) = filter.financial {
            builder
                .push(" AND financial_status = ")
                .push_bind(financial.as_str());
        }

        builder.push(" ORDER BY last_name, first_name, member_id");

        let members = builder
            .build_query_as::<Member>()
            .fetch_all(&self.pool)
            .await?;
        Ok(members)
    }

    /// Get a member by ID.
    pub async fn get_member(&self, id: i64) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    /// Insert a new member. Fields absent from `changes` take their column default.
    pub async fn create_member(&self, changes: &MemberChanges) -> Result<Member, AppError> {
        changes.validate()?;
        let now = Utc::now().to_rfc3339();

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO members (");
        let mut columns = builder.separated(", ");
        for (field, _) in changes.iter() {
            columns.push(field.column());
        }
        columns.push("updated_at");

        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        for (_, value) in changes.iter() {
            values.push_bind(value.as_deref().map(str::to_owned));
        }
        values.push_bind(now);
        builder.push(")");

        let result = builder.build().execute(&self.pool).await?;
        let id = result.last_insert_rowid();

        tracing::debug!("Created member {}", id);
        self.get_member(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Member {} vanished after insert", id)))
    }

    /// Apply a partial update: one statement touching only the supplied columns.
    ///
    /// This is the single mutation entry point for member records.
    pub async fn update_member(
        &self,
        id: i64,
        changes: &MemberChanges,
    ) -> Result<Member, AppError> {
        if changes.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        changes.validate()?;

        let now = Utc::now().to_rfc3339();

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE members SET ");
        let mut assignments = builder.separated(", ");
        for (field, value) in changes.iter() {
            assignments.push(format!("{} = ", field.column()));
            assignments.push_bind_unseparated(value.as_deref().map(str::to_owned));
        }
        assignments.push("updated_at = ");
        assignments.push_bind_unseparated(now);

        builder.push(" WHERE member_id = ").push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::member_not_found(id));
        }

        self.get_member(id)
            .await?
            .ok_or_else(|| AppError::member_not_found(id))
    }

    /// Count members overall, by status, canonical rank and financial standing,
    /// plus rank cross-tabulations.
    pub async fn member_statistics(&self) -> Result<MemberStatistics, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        let groups: Vec<(Option<String>, Option<String>, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT current_degree, member_status, financial_status, COUNT(*)
            FROM members
            GROUP BY current_degree, member_status, financial_status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = MemberStatistics {
            total,
            ..MemberStatistics::default()
        };

        for (rank, status, financial, count) in groups {
            let rank = rank
                .as_deref()
                .map(normalize_rank_label)
                .unwrap_or_else(|| UNSET_GROUP.to_string());
            let status = status.unwrap_or_else(|| UNSET_GROUP.to_string());
            let financial = financial.unwrap_or_else(|| UNSET_GROUP.to_string());

            *stats.by_status.entry(status.clone()).or_insert(0) += count;
            *stats.by_rank.entry(rank.clone()).or_insert(0) += count;
            *stats.by_financial.entry(financial.clone()).or_insert(0) += count;
            *stats
                .rank_by_status
                .entry(rank.clone())
                .or_default()
                .entry(status)
                .or_insert(0) += count;
            *stats
                .rank_by_financial
                .entry(rank)
                .or_default()
                .entry(financial)
                .or_insert(0) += count;
        }

        stats.active = stats
            .by_status
            .get(MemberStatus::Active.as_str())
            .copied()
            .unwrap_or(0);

        Ok(stats)
    }
}
