use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::Role;
use crate::models::stage::{self, CaseVariant, StageDescriptor};

/// A change-of-land-use case as returned by the backend.
///
/// `can_edit`, `can_forward` and `button_name` are computed server-side for
/// the requesting officer. The record only changes through transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    #[serde(default)]
    pub application_no: String,
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub case_type: Option<CaseVariant>,
    #[serde(default)]
    pub current_workflow_sequence_id: Option<i64>,
    #[serde(default)]
    pub form_type: Option<String>,
    /// Survey checklist number (1..=4) used when `form_type` is a bare "Survey".
    #[serde(default)]
    pub survey_type: Option<u8>,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_forward: bool,
    #[serde(default)]
    pub button_name: Option<String>,
}

impl Application {
    pub fn current_stage(&self) -> Option<&'static StageDescriptor> {
        self.current_workflow_sequence_id
            .and_then(stage::stage_by_workflow_id)
    }

    /// Whether `role` may move the application from where it sits. Outside
    /// the registry the server-side `can_forward` flag decides.
    pub fn may_act(&self, role: Role) -> bool {
        match self.current_stage() {
            Some(stage) => stage.authorizes(role),
            None => self.can_forward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
    pub id: i64,
    pub name: String,
}

/// One entry of an application's workflow history. Entries are never
/// modified once the backend has recorded them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowItem {
    pub workflow_sequence_id: i64,
    #[serde(default)]
    pub from_user: Option<String>,
    #[serde(default)]
    pub from_user_id: Option<i64>,
    #[serde(default)]
    pub to_user: Option<String>,
    #[serde(default)]
    pub to_user_id: Option<i64>,
    #[serde(default)]
    pub status: Option<StatusRef>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub kml_file: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub days_held: Option<i64>,
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub is_reverification: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// History entry enriched with its routing direction.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub item: WorkflowItem,
    pub direction: Direction,
}

/// Append-only view over the ordered history returned by the backend.
#[derive(Debug, Clone, Default)]
pub struct WorkflowHistory {
    items: Vec<WorkflowItem>,
}

impl WorkflowHistory {
    pub fn new(items: Vec<WorkflowItem>) -> Self {
        WorkflowHistory { items }
    }

    pub fn items(&self) -> &[WorkflowItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The entry describing where the application currently sits.
    pub fn current(&self) -> Option<&WorkflowItem> {
        self.items.last()
    }

    /// An entry is backward when the backend flags it as a reverification,
    /// or when it hands the application back to whoever sent the previous
    /// entry.
    pub fn direction_at(&self, idx: usize) -> Direction {
        let Some(item) = self.items.get(idx) else {
            return Direction::Forward;
        };
        if let Some(flag) = item.is_reverification {
            return if flag { Direction::Backward } else { Direction::Forward };
        }
        let Some(prev) = idx.checked_sub(1).and_then(|i| self.items.get(i)) else {
            return Direction::Forward;
        };
        let returns_to_sender = item.to_user_id.is_some()
            && item.to_user_id == prev.from_user_id
            && item.from_user_id == prev.to_user_id;
        if returns_to_sender {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    pub fn directions(&self) -> Vec<Direction> {
        (0..self.items.len()).map(|idx| self.direction_at(idx)).collect()
    }

    /// Whole days the application sat at entry `idx`: until the next entry
    /// was recorded, or until `now` for the current entry.
    pub fn days_held_at(&self, idx: usize, now: DateTime<Utc>) -> Option<i64> {
        let item = self.items.get(idx)?;
        let start = parse_timestamp(item.created_at.as_deref()?)?;
        let end = match self.items.get(idx + 1) {
            Some(next) => parse_timestamp(next.created_at.as_deref()?)?,
            None => now,
        };
        Some((end - start).num_days().max(0))
    }

    /// Entries with direction attached. `days_held` is filled in from the
    /// timestamps when the backend did not supply it.
    pub fn entries(&self, now: DateTime<Utc>) -> Vec<HistoryEntry> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let mut item = item.clone();
                if item.days_held.is_none() {
                    item.days_held = self.days_held_at(idx, now);
                }
                HistoryEntry {
                    item,
                    direction: self.direction_at(idx),
                }
            })
            .collect()
    }
}

/// Accepts RFC 3339 as well as the plain `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DD` forms the backend emits for older records.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
