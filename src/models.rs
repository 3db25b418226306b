use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One row of the thesis status taxonomy. The table is small and fixed;
/// besides the three names the classifier assigns it may also hold terminal
/// states like `completed` and `failed` owned by other workflows.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ThesisRecord {
    pub id: Uuid,
    pub status_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
}

/// Counts of theses moved *into* each status during one run. Unchanged
/// theses are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ongoing: u64,
    pub slow: u64,
    pub at_risk: u64,
}

#[derive(Debug, Clone)]
pub struct StatusCount {
    pub status_name: String,
    pub thesis_count: i64,
}

#[derive(Debug, Clone)]
pub struct InactiveThesis {
    pub title: String,
    pub status_name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
}
