use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{StatusRow, ThesisRecord};

/// Persistence seam the classifier runs against. The production
/// implementation is Postgres-backed; tests use an in-memory store.
#[async_trait]
pub trait ThesisStore: Sync {
    /// All rows of the status taxonomy.
    async fn list_statuses(&self) -> anyhow::Result<Vec<StatusRow>>;

    /// One page of theses, ordered by id ascending so pagination covers the
    /// table without gaps or duplicates.
    async fn list_theses_page(&self, offset: i64, limit: i64)
        -> anyhow::Result<Vec<ThesisRecord>>;

    /// Completed guidance sessions per thesis since `since`, grouped by
    /// thesis id. Theses with no matching sessions are absent from the map.
    async fn count_completed_guidance_since(
        &self,
        thesis_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> anyhow::Result<HashMap<Uuid, i64>>;

    async fn update_thesis_status(&self, thesis_id: Uuid, status_id: Uuid) -> anyhow::Result<()>;
}
