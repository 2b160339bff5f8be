use crate::error::Result;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;

#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
}

#[derive(Debug, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub total_candidates: i64,
    pub candidates_by_status: BTreeMap<String, i64>,
    pub candidates_by_source: BTreeMap<String, i64>,
    pub applications_by_status: BTreeMap<String, i64>,
    pub open_jobs: i64,
    pub candidates_per_day: Vec<DailyCount>,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self) -> Result<SummaryReport> {
        let candidates_by_status = self
            .grouped_counts("SELECT status, COUNT(*) FROM candidates GROUP BY status")
            .await?;
        let candidates_by_source = self
            .grouped_counts(
                "SELECT COALESCE(recruitment_source, 'unknown'), COUNT(*) FROM candidates GROUP BY 1",
            )
            .await?;
        let applications_by_status = self
            .grouped_counts("SELECT status, COUNT(*) FROM job_applications GROUP BY status")
            .await?;

        let open_jobs: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE status = 'open'")
            .fetch_one(&self.pool)
            .await?;

        let daily: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT TO_CHAR(created_at, 'YYYY-MM-DD') AS date, COUNT(*) AS count
            FROM candidates
            WHERE created_at > NOW() - INTERVAL '30 days'
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(SummaryReport {
            total_candidates: candidates_by_status.values().sum(),
            candidates_by_status,
            candidates_by_source,
            applications_by_status,
            open_jobs: open_jobs.0,
            candidates_per_day: daily
                .into_iter()
                .map(|(date, count)| DailyCount { date, count })
                .collect(),
        })
    }

    async fn grouped_counts(&self, query: &str) -> Result<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }
}
