pub mod action;
pub mod error;
pub mod executor;
pub mod remark;
pub mod reverify;
pub mod types;

pub use action::{build_action_context, resolve_action, ActionContext, ActionKind, SurveyVariant};
pub use error::{Phase, TransitionError};
pub use executor::{BatchFailure, BatchReport, Timeouts, TransitionExecutor, TransitionOutcome};
pub use remark::{compose_remark, parse_remark, ParsedRemark, RemarkBlock};
pub use reverify::ReverificationOutcome;
pub use types::{
    AreaMeasurements, AttachmentSource, FeeAssessment, ReportPayload, TransitionKind,
    TransitionRequest,
};
