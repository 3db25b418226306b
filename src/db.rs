use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{InactiveThesis, StatusCount, StatusRow, ThesisRecord};
use crate::store::ThesisStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Inserts the five-status taxonomy and a six-thesis fixture with guidance
/// history spanning the 30/90-day windows. Safe to re-run.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    // Ongoing/Slow/at_risk are assigned by the classifier; completed and
    // failed belong to supervisor workflows.
    for name in ["Ongoing", "Slow", "at_risk", "completed", "failed"] {
        sqlx::query(
            r#"
            INSERT INTO thesis_tracker.thesis_statuses (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();
    let days_ago = |n: i64| now - Duration::days(n);

    let theses = vec![
        (
            Uuid::parse_str("7b1d2f60-59c2-4b1a-9a93-0f35c4e2a101")?,
            "Decision Support System for Lab Scheduling",
            days_ago(200),
        ),
        (
            Uuid::parse_str("8c42a8d1-6f3b-4a7e-b2d4-1a46d5f3b202")?,
            "Business Intelligence Dashboard for Faculty KPIs",
            days_ago(200),
        ),
        (
            Uuid::parse_str("9d53b9e2-7a4c-4b8f-c3e5-2b57e6a4c303")?,
            "Machine Learning for Student Dropout Prediction",
            days_ago(200),
        ),
        (
            Uuid::parse_str("ae64caf3-8b5d-4c9a-d4f6-3c68f7b5d404")?,
            "Enterprise Application for Internship Tracking",
            days_ago(45),
        ),
        (
            Uuid::parse_str("bf75dba4-9c6e-4dab-e5a7-4d79a8c6e505")?,
            "Mobile Attendance with Geofencing",
            days_ago(10),
        ),
        (
            Uuid::parse_str("ca86ecb5-ad7f-4ebc-f6b8-5e8ab9d7f606")?,
            "Knowledge Graph for Curriculum Mapping",
            days_ago(120),
        ),
    ];

    for (id, title, start_date) in &theses {
        sqlx::query(
            r#"
            INSERT INTO thesis_tracker.theses (id, title, start_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title, start_date = EXCLUDED.start_date
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(start_date)
        .execute(pool)
        .await?;
    }

    // Guidance history: three completions for the first thesis, two for the
    // second (one inside 30 days), one for the third, none for the rest.
    let sessions = vec![
        (theses[0].0, "completed", days_ago(10)),
        (theses[0].0, "completed", days_ago(40)),
        (theses[0].0, "completed", days_ago(80)),
        (theses[1].0, "completed", days_ago(10)),
        (theses[1].0, "completed", days_ago(70)),
        (theses[2].0, "completed", days_ago(60)),
        (theses[3].0, "cancelled", days_ago(20)),
    ];

    for (index, (thesis_id, status, guidance_date)) in sessions.iter().enumerate() {
        let session_id = Uuid::parse_str(&format!("00000000-0000-4000-8000-{:012x}", index + 1))?;
        sqlx::query(
            r#"
            INSERT INTO thesis_tracker.guidance_sessions (id, thesis_id, status, guidance_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET thesis_id = EXCLUDED.thesis_id,
                status = EXCLUDED.status,
                guidance_date = EXCLUDED.guidance_date
            "#,
        )
        .bind(session_id)
        .bind(thesis_id)
        .bind(status)
        .bind(guidance_date)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThesisStore for PgStore {
    async fn list_statuses(&self) -> anyhow::Result<Vec<StatusRow>> {
        let rows = sqlx::query("SELECT id, name FROM thesis_tracker.thesis_statuses")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatusRow {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn list_theses_page(
        &self,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<ThesisRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, thesis_status_id, start_date
            FROM thesis_tracker.theses
            ORDER BY id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ThesisRecord {
                id: row.get("id"),
                status_id: row.get("thesis_status_id"),
                start_date: row.get("start_date"),
            })
            .collect())
    }

    async fn count_completed_guidance_since(
        &self,
        thesis_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> anyhow::Result<HashMap<Uuid, i64>> {
        let rows = sqlx::query(
            r#"
            SELECT thesis_id, COUNT(*) AS completed
            FROM thesis_tracker.guidance_sessions
            WHERE thesis_id = ANY($1)
              AND status = 'completed'
              AND guidance_date >= $2
            GROUP BY thesis_id
            "#,
        )
        .bind(thesis_ids)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::new();
        for row in rows {
            counts.insert(row.get("thesis_id"), row.get("completed"));
        }
        Ok(counts)
    }

    async fn update_thesis_status(&self, thesis_id: Uuid, status_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE thesis_tracker.theses SET thesis_status_id = $2 WHERE id = $1")
            .bind(thesis_id)
            .bind(status_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub async fn fetch_status_distribution(pool: &PgPool) -> anyhow::Result<Vec<StatusCount>> {
    let rows = sqlx::query(
        r#"
        SELECT COALESCE(s.name, 'unassigned') AS status_name, COUNT(t.id) AS thesis_count
        FROM thesis_tracker.theses t
        LEFT JOIN thesis_tracker.thesis_statuses s ON s.id = t.thesis_status_id
        GROUP BY s.name
        ORDER BY thesis_count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| StatusCount {
            status_name: row.get("status_name"),
            thesis_count: row.get("thesis_count"),
        })
        .collect())
}

/// Theses with no completed guidance session since `since`, oldest first.
pub async fn fetch_inactive_theses(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<InactiveThesis>> {
    let rows = sqlx::query(
        r#"
        SELECT t.title, s.name AS status_name, t.start_date
        FROM thesis_tracker.theses t
        LEFT JOIN thesis_tracker.thesis_statuses s ON s.id = t.thesis_status_id
        WHERE NOT EXISTS (
            SELECT 1
            FROM thesis_tracker.guidance_sessions g
            WHERE g.thesis_id = t.id
              AND g.status = 'completed'
              AND g.guidance_date >= $1
        )
        ORDER BY t.start_date ASC NULLS FIRST
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| InactiveThesis {
            title: row.get("title"),
            status_name: row.get("status_name"),
            start_date: row.get("start_date"),
        })
        .collect())
}
