//! Workflow stage registry.
//!
//! Maps a department review stage and a case variant to the numeric
//! workflow sequence id the backend understands, together with the roles
//! allowed to act there and the status vocabulary offered to the reviewer.
//!
//! Conversion and diversion cases run through structurally parallel stages
//! that carry *different* ids. A numeric id names exactly one stage.

use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// Legal category of the land-use change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseVariant {
    Conversion,
    Diversion,
}

impl CaseVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseVariant::Conversion => "conversion",
            CaseVariant::Diversion => "diversion",
        }
    }

    /// Parses the `type` query discriminator. Unknown values yield `None`.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.trim().to_ascii_lowercase().as_str() {
            "conversion" => Some(CaseVariant::Conversion),
            "diversion" => Some(CaseVariant::Diversion),
            _ => None,
        }
    }
}

/// Logical review stage, independent of the case variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    Enquiries,
    SdaoEnquiries,
    DfoReport,
    SdcHillReport,
    LlmcMeeting,
    LlmcReview,
    DlcRecommendations,
    LrdReport,
    Cabinet,
    CabinetDecision,
}

impl StageKey {
    pub const ALL: [StageKey; 10] = [
        StageKey::Enquiries,
        StageKey::SdaoEnquiries,
        StageKey::DfoReport,
        StageKey::SdcHillReport,
        StageKey::LlmcMeeting,
        StageKey::LlmcReview,
        StageKey::DlcRecommendations,
        StageKey::LrdReport,
        StageKey::Cabinet,
        StageKey::CabinetDecision,
    ];

    /// URL slug, also used as the permission key guarding the stage queue.
    pub fn slug(&self) -> &'static str {
        match self {
            StageKey::Enquiries => "enquiries",
            StageKey::SdaoEnquiries => "sdao-enquiries",
            StageKey::DfoReport => "dfo-report",
            StageKey::SdcHillReport => "sdc-hill-report",
            StageKey::LlmcMeeting => "llmc-meeting",
            StageKey::LlmcReview => "llmc-review",
            StageKey::DlcRecommendations => "dlc-recommendations",
            StageKey::LrdReport => "lrd-report",
            StageKey::Cabinet => "cabinet",
            StageKey::CabinetDecision => "cabinet-decision",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageKey::Enquiries => "Enquiries",
            StageKey::SdaoEnquiries => "SDAO Enquiries",
            StageKey::DfoReport => "DFO Report",
            StageKey::SdcHillReport => "SDC Hill Report",
            StageKey::LlmcMeeting => "LLMC Meeting",
            StageKey::LlmcReview => "LLMC Review",
            StageKey::DlcRecommendations => "DLC Recommendations",
            StageKey::LrdReport => "LRD Report",
            StageKey::Cabinet => "Cabinet",
            StageKey::CabinetDecision => "Cabinet Decision",
        }
    }
}

/// Verification status the reviewer may select when acting on a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    pub id: i64,
    pub name: &'static str,
}

pub const STATUS_ENQUIRY_COMPLETED: i64 = 2;
pub const STATUS_REPORT_SUBMITTED: i64 = 3;
pub const STATUS_RECOMMENDED: i64 = 4;
pub const STATUS_NOT_RECOMMENDED: i64 = 5;
pub const STATUS_FORWARDED: i64 = 6;
pub const STATUS_APPROVED: i64 = 7;
pub const STATUS_REJECTED: i64 = 8;

const ENQUIRY_STATUSES: &[StatusOption] = &[
    StatusOption { id: STATUS_ENQUIRY_COMPLETED, name: "Enquiry Completed" },
    StatusOption { id: STATUS_FORWARDED, name: "Forwarded" },
    StatusOption { id: STATUS_REJECTED, name: "Rejected" },
];

const REPORT_STATUSES: &[StatusOption] = &[
    StatusOption { id: STATUS_REPORT_SUBMITTED, name: "Report Submitted" },
    StatusOption { id: STATUS_FORWARDED, name: "Forwarded" },
    StatusOption { id: STATUS_REJECTED, name: "Rejected" },
];

const RECOMMENDATION_STATUSES: &[StatusOption] = &[
    StatusOption { id: STATUS_RECOMMENDED, name: "Recommended" },
    StatusOption { id: STATUS_NOT_RECOMMENDED, name: "Not Recommended" },
    StatusOption { id: STATUS_FORWARDED, name: "Forwarded" },
    StatusOption { id: STATUS_REJECTED, name: "Rejected" },
];

const DECISION_STATUSES: &[StatusOption] = &[
    StatusOption { id: STATUS_APPROVED, name: "Approved" },
    StatusOption { id: STATUS_REJECTED, name: "Rejected" },
];

/// Static description of one numeric workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDescriptor {
    pub workflow_id: i64,
    pub key: StageKey,
    pub variant: CaseVariant,
    pub roles: &'static [Role],
    pub statuses: &'static [StatusOption],
    pub default_status_id: i64,
}

impl StageDescriptor {
    /// Admin may act at every stage; other roles only where listed.
    pub fn authorizes(&self, role: Role) -> bool {
        role == Role::Admin || self.roles.contains(&role)
    }

    pub fn display_name(&self) -> String {
        let variant = match self.variant {
            CaseVariant::Conversion => "Conversion",
            CaseVariant::Diversion => "Diversion",
        };
        format!("{} - {}", self.key.label(), variant)
    }

    pub fn status(&self, id: i64) -> Option<StatusOption> {
        self.statuses.iter().copied().find(|s| s.id == id)
    }
}

const fn stage(
    workflow_id: i64,
    key: StageKey,
    variant: CaseVariant,
    roles: &'static [Role],
    statuses: &'static [StatusOption],
    default_status_id: i64,
) -> StageDescriptor {
    StageDescriptor { workflow_id, key, variant, roles, statuses, default_status_id }
}

use CaseVariant::{Conversion, Diversion};

// SDC hill reports exist for conversion cases only.
static STAGES: &[StageDescriptor] = &[
    stage(2, StageKey::Enquiries, Conversion, &[Role::Dc], ENQUIRY_STATUSES, STATUS_FORWARDED),
    stage(12, StageKey::Enquiries, Diversion, &[Role::Dc], ENQUIRY_STATUSES, STATUS_FORWARDED),
    stage(3, StageKey::SdaoEnquiries, Conversion, &[Role::Sdao], ENQUIRY_STATUSES, STATUS_FORWARDED),
    stage(13, StageKey::SdaoEnquiries, Diversion, &[Role::Sdao], ENQUIRY_STATUSES, STATUS_FORWARDED),
    stage(4, StageKey::DfoReport, Conversion, &[Role::Dfo], REPORT_STATUSES, STATUS_FORWARDED),
    stage(14, StageKey::DfoReport, Diversion, &[Role::Dfo], REPORT_STATUSES, STATUS_FORWARDED),
    stage(5, StageKey::SdcHillReport, Conversion, &[Role::Sdc], REPORT_STATUSES, STATUS_FORWARDED),
    stage(8, StageKey::LlmcMeeting, Conversion, &[Role::Llmc], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(16, StageKey::LlmcMeeting, Diversion, &[Role::Llmc], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(9, StageKey::LlmcReview, Conversion, &[Role::Llmc], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(17, StageKey::LlmcReview, Diversion, &[Role::Llmc], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(23, StageKey::DlcRecommendations, Conversion, &[Role::Dlc], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(20, StageKey::DlcRecommendations, Diversion, &[Role::Dlc], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(24, StageKey::LrdReport, Conversion, &[Role::Lrd], REPORT_STATUSES, STATUS_FORWARDED),
    stage(21, StageKey::LrdReport, Diversion, &[Role::Lrd], REPORT_STATUSES, STATUS_FORWARDED),
    stage(25, StageKey::Cabinet, Conversion, &[Role::Cabinet], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(22, StageKey::Cabinet, Diversion, &[Role::Cabinet], RECOMMENDATION_STATUSES, STATUS_FORWARDED),
    stage(26, StageKey::CabinetDecision, Conversion, &[Role::Cabinet], DECISION_STATUSES, STATUS_APPROVED),
    stage(27, StageKey::CabinetDecision, Diversion, &[Role::Cabinet], DECISION_STATUSES, STATUS_APPROVED),
];

pub fn all_stages() -> &'static [StageDescriptor] {
    STAGES
}

pub fn find_stage(key: StageKey, variant: CaseVariant) -> Option<&'static StageDescriptor> {
    STAGES.iter().find(|s| s.key == key && s.variant == variant)
}

/// Numeric workflow id for a stage/variant pair.
///
/// A miss returns `None`; callers list applications unfiltered in that case.
pub fn resolve_workflow_id(key: StageKey, variant: CaseVariant) -> Option<i64> {
    find_stage(key, variant).map(|s| s.workflow_id)
}

pub fn stage_by_workflow_id(workflow_id: i64) -> Option<&'static StageDescriptor> {
    STAGES.iter().find(|s| s.workflow_id == workflow_id)
}
