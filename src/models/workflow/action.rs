//! Action context resolution.
//!
//! Decides which action component applies to an application for the acting
//! officer. Precedence: the `actionContext` carried by the navigation URL,
//! then the application's own `form_type`, then the capability fallback
//! (`can_edit` gives [`ActionKind::EditOnly`], otherwise [`ActionKind::None`]).
//! A tag that names no known action falls through to the next level.

use serde::{Deserialize, Serialize};

use crate::models::application::Application;
use crate::models::role::Role;
use crate::models::stage::StatusOption;

/// One yes/no attestation on a survey checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub key: &'static str,
    pub question: &'static str,
}

const LAND_ACQUISITION: &[ChecklistItem] = &[ChecklistItem {
    key: "land_acquisition",
    question: "Is the land affected by any land acquisition proceedings?",
}];

const PADDY_LAND: &[ChecklistItem] = &[
    ChecklistItem {
        key: "paddy_ecological_impact",
        question: "Will the conversion adversely affect the ecology of adjoining paddy land?",
    },
    ChecklistItem { key: "paddy_north", question: "Is there paddy land on the north side?" },
    ChecklistItem { key: "paddy_south", question: "Is there paddy land on the south side?" },
    ChecklistItem { key: "paddy_east", question: "Is there paddy land on the east side?" },
    ChecklistItem { key: "paddy_west", question: "Is there paddy land on the west side?" },
];

const FOREST_AREA: &[ChecklistItem] = &[
    ChecklistItem {
        key: "forest_area",
        question: "Does the land fall within or adjoin a notified forest area?",
    },
    ChecklistItem {
        key: "master_plan_violation",
        question: "Does the proposed use violate the approved master plan?",
    },
];

const PADDY_DATA_BANK: &[ChecklistItem] = &[
    ChecklistItem {
        key: "paddy_ecological_impact",
        question: "Will the conversion adversely affect the ecology of adjoining paddy land?",
    },
    ChecklistItem { key: "paddy_north", question: "Is there paddy land on the north side?" },
    ChecklistItem { key: "paddy_south", question: "Is there paddy land on the south side?" },
    ChecklistItem { key: "paddy_east", question: "Is there paddy land on the east side?" },
    ChecklistItem { key: "paddy_west", question: "Is there paddy land on the west side?" },
    ChecklistItem {
        key: "data_bank_entry",
        question: "Is the land included in the paddy and wetland data bank?",
    },
];

/// Survey report form. Each variant carries its own legal checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SurveyVariant {
    LandAcquisition,
    PaddyLand,
    ForestArea,
    PaddyDataBank,
}

impl SurveyVariant {
    pub fn number(self) -> u8 {
        match self {
            SurveyVariant::LandAcquisition => 1,
            SurveyVariant::PaddyLand => 2,
            SurveyVariant::ForestArea => 3,
            SurveyVariant::PaddyDataBank => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(SurveyVariant::LandAcquisition),
            2 => Some(SurveyVariant::PaddyLand),
            3 => Some(SurveyVariant::ForestArea),
            4 => Some(SurveyVariant::PaddyDataBank),
            _ => None,
        }
    }

    pub fn checklist(self) -> &'static [ChecklistItem] {
        match self {
            SurveyVariant::LandAcquisition => LAND_ACQUISITION,
            SurveyVariant::PaddyLand => PADDY_LAND,
            SurveyVariant::ForestArea => FOREST_AREA,
            SurveyVariant::PaddyDataBank => PADDY_DATA_BANK,
        }
    }
}

impl From<SurveyVariant> for u8 {
    fn from(v: SurveyVariant) -> u8 {
        v.number()
    }
}

impl TryFrom<u8> for SurveyVariant {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        SurveyVariant::from_number(n).ok_or_else(|| format!("unknown survey variant {n}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "variant", rename_all = "snake_case")]
pub enum ActionKind {
    Forward,
    Survey(SurveyVariant),
    MarsacReport,
    FeeReport,
    LlmcReport,
    EditOnly,
    None,
}

impl ActionKind {
    /// Whether the action moves the application (as opposed to edit/view).
    pub fn is_transition(&self) -> bool {
        !matches!(self, ActionKind::EditOnly | ActionKind::None)
    }
}

/// Parses a `form_type` / `actionContext` tag. Matching ignores case,
/// spaces, dashes and underscores. Unknown tags return `None`, as does a
/// bare "Survey" whose `survey_type` is out of range. Without a
/// `survey_type` it means the first checklist.
pub fn parse_action_tag(tag: &str, survey_type: Option<u8>) -> Option<ActionKind> {
    let normalized: String = tag
        .chars()
        .filter(|c| !matches!(*c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_ascii_lowercase();

    let kind = match normalized.as_str() {
        "forward" => ActionKind::Forward,
        "survey" => ActionKind::Survey(match survey_type {
            None => SurveyVariant::LandAcquisition,
            Some(n) => SurveyVariant::from_number(n)?,
        }),
        "marsac" | "marsacreport" => ActionKind::MarsacReport,
        "fee" | "feereport" => ActionKind::FeeReport,
        "llmc" | "llmcreport" => ActionKind::LlmcReport,
        "edit" | "editonly" => ActionKind::EditOnly,
        "view" | "none" => ActionKind::None,
        other => {
            let variant = other
                .strip_prefix("survey")
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(SurveyVariant::from_number)?;
            ActionKind::Survey(variant)
        }
    };
    Some(kind)
}

fn capability_fallback(app: &Application) -> ActionKind {
    if app.can_edit {
        ActionKind::EditOnly
    } else {
        ActionKind::None
    }
}

/// Resolves the action for `app`. `url_context` is the `actionContext`
/// the list view put in the navigation URL.
pub fn resolve_action(app: &Application, url_context: Option<&str>) -> ActionKind {
    let from_url = url_context.and_then(|tag| {
        let parsed = parse_action_tag(tag, app.survey_type);
        if parsed.is_none() {
            log::debug!("Ignoring unknown actionContext '{}' for application {}", tag, app.id);
        }
        parsed
    });
    from_url
        .or_else(|| {
            app.form_type
                .as_deref()
                .and_then(|tag| parse_action_tag(tag, app.survey_type))
        })
        .unwrap_or_else(|| capability_fallback(app))
}

/// Everything an action component needs to render and submit.
#[derive(Debug, Clone, Serialize)]
pub struct ActionContext {
    pub kind: ActionKind,
    pub application_id: i64,
    pub workflow_sequence_id: Option<i64>,
    pub stage_name: Option<String>,
    pub statuses: Vec<StatusOption>,
    pub default_status_id: Option<i64>,
    pub button_name: String,
    pub can_act: bool,
    pub checklist: &'static [ChecklistItem],
}

/// Builds the action context for `role`. A role that may not act at the
/// application's current stage only gets the capability fallback. When the
/// stage is unknown the server-side `can_forward` flag decides.
pub fn build_action_context(app: &Application, url_context: Option<&str>, role: Role) -> ActionContext {
    let stage = app.current_stage();
    let can_act = app.may_act(role);

    let mut kind = resolve_action(app, url_context);
    if kind.is_transition() && !can_act {
        log::info!(
            "Role {} may not act on application {} at workflow {:?}",
            role.code(),
            app.id,
            app.current_workflow_sequence_id
        );
        kind = capability_fallback(app);
    }

    let checklist: &'static [ChecklistItem] = match kind {
        ActionKind::Survey(variant) => variant.checklist(),
        _ => &[],
    };

    ActionContext {
        kind,
        application_id: app.id,
        workflow_sequence_id: app.current_workflow_sequence_id,
        stage_name: stage.map(|s| s.display_name()),
        statuses: stage.map(|s| s.statuses.to_vec()).unwrap_or_default(),
        default_status_id: stage.map(|s| s.default_status_id),
        button_name: app
            .button_name
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| "Forward".to_string()),
        can_act,
        checklist,
    }
}
