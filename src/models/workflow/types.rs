use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::action::SurveyVariant;
use super::error::TransitionError;
use super::remark::{compose_remark, RemarkBlock};
use crate::remote::{FileUpload, TransitionPayload};

/// Flavour of transition. Decides the upload field name and the backend
/// `status` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Forward,
    Reject,
    /// Survey, MARSAC, fee and LLMC reports. Forward-like on the backend.
    Report,
}

impl TransitionKind {
    pub fn upload_field(self) -> &'static str {
        match self {
            TransitionKind::Forward => "forward_attachment",
            TransitionKind::Reject => "reject_attachment",
            TransitionKind::Report => "workflow_attachment",
        }
    }

    /// `0` is reserved for outright rejection.
    pub fn status_flag(self) -> u8 {
        match self {
            TransitionKind::Reject => 0,
            TransitionKind::Forward | TransitionKind::Report => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Needs uploading before submission.
    File(FileUpload),
    /// Already stored by the backend, e.g. on a retry after a failed submit.
    Uploaded(String),
}

/// MARSAC remote-sensing area measurements, in ares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaMeasurements {
    pub total_area: f64,
    pub paddy_land: f64,
    pub wetland: f64,
    pub dry_land: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeAssessment {
    pub fair_value_per_are: f64,
    pub area: f64,
    pub fee_amount: f64,
}

/// Structured data produced by the specialised report dialogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPayload {
    Survey {
        variant: SurveyVariant,
        answers: BTreeMap<String, bool>,
    },
    Marsac(AreaMeasurements),
    Fee(FeeAssessment),
    Llmc {
        recommended: bool,
        #[serde(default)]
        meeting_date: Option<NaiveDate>,
    },
}

fn check_amount(name: &str, value: f64) -> Result<f64, TransitionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(TransitionError::validation(format!("{name} must be a non-negative number")))
    }
}

impl ReportPayload {
    /// Renders the report as a remark block. Survey answers must cover the
    /// variant's checklist exactly: a missing or foreign key is rejected so
    /// the wrong legal checklist can never be recorded.
    pub fn to_block(&self) -> Result<RemarkBlock, TransitionError> {
        match self {
            ReportPayload::Survey { variant, answers } => {
                let checklist = variant.checklist();
                if let Some(unknown) = answers
                    .keys()
                    .find(|k| !checklist.iter().any(|c| c.key == k.as_str()))
                {
                    return Err(TransitionError::validation(format!(
                        "'{}' is not on survey checklist {}",
                        unknown,
                        variant.number()
                    )));
                }
                let mut block = RemarkBlock::new(format!("SURVEY-{}", variant.number()));
                for item in checklist {
                    let answer = answers.get(item.key).copied().ok_or_else(|| {
                        TransitionError::validation(format!("'{}' must be answered", item.key))
                    })?;
                    block = block.flag(item.key, answer);
                }
                Ok(block)
            }
            ReportPayload::Marsac(m) => Ok(RemarkBlock::new("MARSAC")
                .field("total_area_ares", check_amount("total_area", m.total_area)?)
                .field("paddy_land_ares", check_amount("paddy_land", m.paddy_land)?)
                .field("wetland_ares", check_amount("wetland", m.wetland)?)
                .field("dry_land_ares", check_amount("dry_land", m.dry_land)?)),
            ReportPayload::Fee(f) => Ok(RemarkBlock::new("FEE")
                .field("fair_value_per_are", check_amount("fair_value_per_are", f.fair_value_per_are)?)
                .field("area_ares", check_amount("area", f.area)?)
                .field("fee_amount", check_amount("fee_amount", f.fee_amount)?)),
            ReportPayload::Llmc {
                recommended,
                meeting_date,
            } => {
                let block = RemarkBlock::new("LLMC").flag("recommended", *recommended);
                Ok(match meeting_date {
                    Some(date) => block.field("meeting_date", date.format("%Y-%m-%d")),
                    None => block,
                })
            }
        }
    }
}

/// Normalised transition produced by every action dialog. The target
/// application id(s) are supplied to the executor separately so one request
/// can be applied to a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub kind: TransitionKind,
    pub verification_status_id: i64,
    pub remark: String,
    pub attachment: Option<AttachmentSource>,
    pub date: Option<NaiveDate>,
}

impl TransitionRequest {
    pub fn forward(verification_status_id: i64, remark: impl Into<String>) -> Self {
        TransitionRequest {
            kind: TransitionKind::Forward,
            verification_status_id,
            remark: remark.into(),
            attachment: None,
            date: None,
        }
    }

    pub fn reject(verification_status_id: i64, remark: impl Into<String>) -> Self {
        TransitionRequest {
            kind: TransitionKind::Reject,
            ..Self::forward(verification_status_id, remark)
        }
    }

    /// Report transition; the report is serialised into the remark.
    pub fn report(
        verification_status_id: i64,
        report: &ReportPayload,
        remark: &str,
    ) -> Result<Self, TransitionError> {
        let block = report.to_block()?;
        Ok(TransitionRequest {
            kind: TransitionKind::Report,
            ..Self::forward(verification_status_id, compose_remark(&block, remark))
        })
    }

    pub fn with_attachment(mut self, attachment: AttachmentSource) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Checks that need no network call.
    pub fn validate(&self) -> Result<(), TransitionError> {
        if self.verification_status_id <= 0 {
            return Err(TransitionError::validation("a verification status must be selected"));
        }
        if self.kind == TransitionKind::Reject && self.remark.trim().is_empty() {
            return Err(TransitionError::validation("a remark is required to reject"));
        }
        if let Some(AttachmentSource::File(file)) = &self.attachment {
            if file.file_name.trim().is_empty() || file.bytes.is_empty() {
                return Err(TransitionError::validation("the attachment is empty"));
            }
        }
        Ok(())
    }

    /// Wire payload for `target` with the uploaded filename substituted.
    pub fn to_payload<T>(&self, target: T, attachment: Option<&str>) -> TransitionPayload<T> {
        TransitionPayload {
            application_details_id: target,
            verification_status_id: self.verification_status_id,
            remark: self.remark.clone(),
            attachment: attachment.unwrap_or_default().to_string(),
            status: self.kind.status_flag(),
            date: self.date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::remark::parse_remark;

    #[test]
    fn reject_requires_remark() {
        let err = TransitionRequest::reject(8, "   ").validate().unwrap_err();
        assert!(matches!(err, TransitionError::Validation(_)));
        assert!(TransitionRequest::reject(8, "incomplete documents").validate().is_ok());
        assert!(TransitionRequest::forward(6, "").validate().is_ok());
    }

    #[test]
    fn status_must_be_selected() {
        assert!(TransitionRequest::forward(0, "ok").validate().is_err());
    }

    #[test]
    fn status_flags() {
        assert_eq!(TransitionRequest::forward(6, "x").to_payload(1, None).status, 1);
        assert_eq!(TransitionRequest::reject(8, "x").to_payload(1, None).status, 0);
        let report = ReportPayload::Llmc { recommended: true, meeting_date: None };
        let req = TransitionRequest::report(4, &report, "x").unwrap();
        assert_eq!(req.to_payload(1, None).status, 1);
        assert_eq!(req.kind.upload_field(), "workflow_attachment");
    }

    #[test]
    fn survey_report_roundtrips_through_remark() {
        let mut answers = BTreeMap::new();
        answers.insert("land_acquisition".to_string(), true);
        let report = ReportPayload::Survey {
            variant: SurveyVariant::LandAcquisition,
            answers,
        };
        let req = TransitionRequest::report(3, &report, "ok").unwrap();
        let parsed = parse_remark(&req.remark);
        let block = parsed.block.unwrap();
        assert_eq!(block.tag, "SURVEY-1");
        assert_eq!(block.get_flag("land_acquisition"), Some(true));
        assert_eq!(parsed.text, "ok");
    }

    #[test]
    fn survey_answers_must_match_checklist() {
        let mut answers = BTreeMap::new();
        answers.insert("forest_area".to_string(), false);
        let wrong = ReportPayload::Survey {
            variant: SurveyVariant::LandAcquisition,
            answers,
        };
        assert!(wrong.to_block().is_err());

        let missing = ReportPayload::Survey {
            variant: SurveyVariant::ForestArea,
            answers: BTreeMap::from([("forest_area".to_string(), true)]),
        };
        assert!(missing.to_block().is_err());
    }

    #[test]
    fn negative_areas_are_rejected() {
        let report = ReportPayload::Marsac(AreaMeasurements {
            total_area: 10.0,
            paddy_land: -1.0,
            wetland: 0.0,
            dry_land: 11.0,
        });
        assert!(TransitionRequest::report(3, &report, "").is_err());
    }

    #[test]
    fn payload_dates_are_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let payload = TransitionRequest::forward(6, "ok")
            .with_date(date)
            .to_payload(vec![1, 2], Some("a.pdf"));
        assert_eq!(payload.date.as_deref(), Some("2024-05-02"));
        assert_eq!(payload.attachment, "a.pdf");
        assert_eq!(payload.application_details_id, vec![1, 2]);
    }

    #[test]
    fn report_payload_deserializes_tagged() {
        let json = r#"{"kind": "survey", "variant": 3, "answers": {"forest_area": true, "master_plan_violation": false}}"#;
        let report: ReportPayload = serde_json::from_str(json).unwrap();
        let block = report.to_block().unwrap();
        assert_eq!(block.get_flag("master_plan_violation"), Some(false));
    }
}
