use std::collections::HashSet;

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use futures::{stream, StreamExt};
use uuid::Uuid;

use crate::models::{RunSummary, StatusRow};
use crate::store::ThesisStore;

const DAYS_30: i64 = 30;
const DAYS_90: i64 = 90;

/// The three statuses the classifier is authorized to assign. Terminal
/// states (`completed`, `failed`) exist in the taxonomy but are owned by
/// supervisor/administrative workflows, never written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThesisStatus {
    Ongoing,
    Slow,
    AtRisk,
}

impl ThesisStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ThesisStatus::Ongoing => "Ongoing",
            ThesisStatus::Slow => "Slow",
            ThesisStatus::AtRisk => "at_risk",
        }
    }
}

/// Maps recent guidance activity to a status. Pure and total; `now` is
/// passed in so runs are deterministic and testable.
///
/// Branch order matters: the zero-completion grace rules are checked first,
/// then the frequency tiers.
pub fn decide_status(
    completions30: i64,
    completions90: i64,
    thesis_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ThesisStatus {
    if completions90 == 0 {
        if let Some(start) = thesis_start {
            if start > now - Duration::days(DAYS_30) {
                // brand new, benefit of the doubt
                return ThesisStatus::Ongoing;
            }
            if start > now - Duration::days(DAYS_90) {
                return ThesisStatus::Slow;
            }
        }
        return ThesisStatus::AtRisk;
    }

    if completions90 >= 3 {
        return ThesisStatus::Ongoing;
    }
    if completions30 >= 1 && completions90 >= 2 {
        return ThesisStatus::Ongoing;
    }
    // 1-2 completions in 90 days
    ThesisStatus::Slow
}

/// Canonical status ids resolved once per run.
#[derive(Debug, Clone, Copy)]
struct StatusIds {
    ongoing: Uuid,
    slow: Uuid,
    at_risk: Uuid,
}

impl StatusIds {
    fn id_for(&self, status: ThesisStatus) -> Uuid {
        match status {
            ThesisStatus::Ongoing => self.ongoing,
            ThesisStatus::Slow => self.slow,
            ThesisStatus::AtRisk => self.at_risk,
        }
    }
}

fn resolve_status_ids(rows: &[StatusRow]) -> anyhow::Result<StatusIds> {
    let find = |names: &[&str]| {
        rows.iter()
            .find(|row| names.iter().any(|n| row.name.eq_ignore_ascii_case(n)))
            .map(|row| row.id)
    };

    let ongoing = find(&["ongoing"]);
    let slow = find(&["slow"]);
    let at_risk = find(&["at_risk", "at-risk"]);

    match (ongoing, slow, at_risk) {
        (Some(ongoing), Some(slow), Some(at_risk)) => Ok(StatusIds {
            ongoing,
            slow,
            at_risk,
        }),
        _ => bail!("missing thesis status rows: require 'Ongoing', 'Slow', 'at_risk'"),
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub page_size: i64,
    /// Cap on concurrent row updates within a page.
    pub update_concurrency: usize,
    /// Status names eligible for reclassification. `None` means every
    /// thesis is eligible, including ones in terminal states.
    pub eligible_statuses: Option<Vec<String>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            update_concurrency: 8,
            eligible_statuses: None,
        }
    }
}

fn resolve_eligible_ids(
    rows: &[StatusRow],
    names: &[String],
) -> anyhow::Result<HashSet<Uuid>> {
    let mut ids = HashSet::new();
    for name in names {
        let row = rows
            .iter()
            .find(|row| row.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("unknown thesis status in eligibility list: '{name}'"))?;
        ids.insert(row.id);
    }
    Ok(ids)
}

/// Recomputes every thesis's status and persists only the changes.
///
/// The status taxonomy is resolved up front and the window cutoffs derive
/// from a single `now`, so pagination cannot skew the windows. A failure
/// resolving the taxonomy aborts before any write; a failed row update
/// fails the whole run.
pub async fn run_classification<S: ThesisStore>(
    store: &S,
    now: DateTime<Utc>,
    config: &RunConfig,
) -> anyhow::Result<RunSummary> {
    let statuses = store
        .list_statuses()
        .await
        .context("failed to load thesis status taxonomy")?;
    let ids = resolve_status_ids(&statuses)?;
    let eligible_ids = match &config.eligible_statuses {
        Some(names) => Some(resolve_eligible_ids(&statuses, names)?),
        None => None,
    };

    let since30 = now - Duration::days(DAYS_30);
    let since90 = now - Duration::days(DAYS_90);
    let page_size = config.page_size.max(1);

    let mut summary = RunSummary::default();
    let mut page = 0i64;

    loop {
        let theses = store
            .list_theses_page(page * page_size, page_size)
            .await
            .with_context(|| format!("failed to fetch thesis page {page}"))?;
        if theses.is_empty() {
            break;
        }

        let thesis_ids: Vec<Uuid> = theses.iter().map(|t| t.id).collect();
        let counts90 = store
            .count_completed_guidance_since(&thesis_ids, since90)
            .await
            .context("failed to count 90-day guidance completions")?;
        let counts30 = store
            .count_completed_guidance_since(&thesis_ids, since30)
            .await
            .context("failed to count 30-day guidance completions")?;

        let mut changes: Vec<(Uuid, ThesisStatus)> = Vec::new();
        for thesis in &theses {
            if let (Some(allowed), Some(current)) = (&eligible_ids, thesis.status_id) {
                if !allowed.contains(&current) {
                    continue;
                }
            }

            let c90 = counts90.get(&thesis.id).copied().unwrap_or(0);
            let c30 = counts30.get(&thesis.id).copied().unwrap_or(0);
            let target = decide_status(c30, c90, thesis.start_date, now);
            if thesis.status_id != Some(ids.id_for(target)) {
                changes.push((thesis.id, target));
            }
        }

        tracing::debug!(
            page,
            theses = theses.len(),
            changes = changes.len(),
            "classified page"
        );

        let mut pending = stream::iter(changes.into_iter().map(|(thesis_id, target)| {
            let target_id = ids.id_for(target);
            async move {
                store
                    .update_thesis_status(thesis_id, target_id)
                    .await
                    .with_context(|| format!("failed to update status for thesis {thesis_id}"))?;
                tracing::debug!(thesis = %thesis_id, status = target.as_str(), "status updated");
                anyhow::Ok(target)
            }
        }))
        .buffer_unordered(config.update_concurrency.max(1));

        while let Some(result) = pending.next().await {
            match result? {
                ThesisStatus::Ongoing => summary.ongoing += 1,
                ThesisStatus::Slow => summary.slow += 1,
                ThesisStatus::AtRisk => summary.at_risk += 1,
            }
        }

        page += 1;
    }

    tracing::info!(
        ongoing = summary.ongoing,
        slow = summary.slow,
        at_risk = summary.at_risk,
        "thesis status run complete"
    );
    Ok(summary)
}
