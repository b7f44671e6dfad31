//! Typed records returned by the Task Service.
//!
//! Field names on the wire follow the service's PascalCase shapes (`HITId`,
//! `RequesterAnnotation`, ...) so that JMESPath queries written against the
//! service documentation keep working on our JSON output. Optional fields
//! that the service did not return are omitted rather than emitted as
//! `null`, and timestamps are integer milliseconds since the Unix epoch.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MturkError;

/// Lifecycle status of a HIT. Owned by the Task Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitStatus {
    Assignable,
    Unassignable,
    Reviewable,
    Reviewing,
    Disposed,
}

impl FromStr for HitStatus {
    type Err = MturkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Assignable" => Ok(Self::Assignable),
            "Unassignable" => Ok(Self::Unassignable),
            "Reviewable" => Ok(Self::Reviewable),
            "Reviewing" => Ok(Self::Reviewing),
            "Disposed" => Ok(Self::Disposed),
            _ => Err(MturkError::Config(format!("unknown HIT status: {s}"))),
        }
    }
}

/// Review status of a worker submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Submitted,
    Approved,
    Rejected,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = MturkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Submitted" => Ok(Self::Submitted),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            _ => Err(MturkError::Config(format!("unknown assignment status: {s}"))),
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named value substituted into a HIT layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HitLayoutParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Locale {
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<String>,
}

/// Condition a worker must meet to see or accept a HIT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QualificationRequirement {
    pub qualification_type_id: String,
    pub comparator: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub integer_values: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locale_values: Vec<Locale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_to_preview: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions_guarded: Option<String>,
}

/// A task ("HIT") as reported by the Task Service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Hit {
    #[serde(rename = "HITId")]
    pub hit_id: String,
    #[serde(rename = "HITTypeId", default, skip_serializing_if = "Option::is_none")]
    pub hit_type_id: Option<String>,
    #[serde(rename = "HITGroupId", default, skip_serializing_if = "Option::is_none")]
    pub hit_group_id: Option<String>,
    #[serde(rename = "HITLayoutId", default, skip_serializing_if = "Option::is_none")]
    pub hit_layout_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(rename = "HITStatus", default, skip_serializing_if = "Option::is_none")]
    pub hit_status: Option<HitStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_assignments: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approval_delay_in_seconds: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_duration_in_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualification_requirements: Vec<QualificationRequirement>,
    #[serde(rename = "HITReviewStatus", default, skip_serializing_if = "Option::is_none")]
    pub hit_review_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_assignments_pending: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_assignments_available: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_assignments_completed: Option<i32>,
}

/// A worker's submission against a HIT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Assignment {
    pub assignment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    #[serde(rename = "HITId")]
    pub hit_id: String,
    pub assignment_status: AssignmentStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub auto_approval_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub accept_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub submit_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub approval_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub rejection_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub deadline: Option<DateTime<Utc>>,
    /// Raw answer document as submitted by the worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_feedback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(rename = "RequestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Acknowledgement of a call that returns no payload (expire, delete,
/// approve, reject), tagged with the id it acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(rename = "HITId", default, skip_serializing_if = "Option::is_none")]
    pub hit_id: Option<String>,
    #[serde(rename = "AssignmentId", default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,
    #[serde(rename = "ResponseMetadata")]
    pub response_metadata: ResponseMetadata,
}

impl Receipt {
    pub fn for_hit(hit_id: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            hit_id: Some(hit_id.into()),
            assignment_id: None,
            response_metadata: ResponseMetadata { request_id },
        }
    }

    pub fn for_assignment(assignment_id: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            hit_id: None,
            assignment_id: Some(assignment_id.into()),
            response_metadata: ResponseMetadata { request_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    #[test]
    fn test_hit_uses_service_field_names() {
        let hit = Hit {
            hit_id: "H1".to_string(),
            hit_type_id: Some("T1".to_string()),
            requester_annotation: Some("batch-7".to_string()),
            hit_status: Some(HitStatus::Assignable),
            ..Hit::default()
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(
            value,
            json!({
                "HITId": "H1",
                "HITTypeId": "T1",
                "HITStatus": "Assignable",
                "RequesterAnnotation": "batch-7",
            })
        );
    }

    #[test]
    fn test_qualification_requirements_only_when_present() {
        let mut hit = Hit {
            hit_id: "H1".to_string(),
            ..Hit::default()
        };
        assert!(serde_json::to_value(&hit)
            .unwrap()
            .get("QualificationRequirements")
            .is_none());

        hit.qualification_requirements.push(QualificationRequirement {
            qualification_type_id: "00000000000000000071".to_string(),
            comparator: "EqualTo".to_string(),
            integer_values: vec![],
            locale_values: vec![Locale {
                country: "US".to_string(),
                subdivision: None,
            }],
            required_to_preview: None,
            actions_guarded: None,
        });
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(
            value["QualificationRequirements"],
            json!([{
                "QualificationTypeId": "00000000000000000071",
                "Comparator": "EqualTo",
                "LocaleValues": [{"Country": "US"}],
            }])
        );

        let parsed: Hit = serde_json::from_value(json!({"HITId": "H2"})).unwrap();
        assert!(parsed.qualification_requirements.is_empty());
    }

    #[test]
    fn test_timestamps_are_epoch_millis_in_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(1970, 1, 1, 2, 0, 1).unwrap();
        let hit = Hit {
            hit_id: "H1".to_string(),
            creation_time: Some(local.with_timezone(&Utc)),
            ..Hit::default()
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["CreationTime"], json!(1000));
    }

    #[test]
    fn test_receipt_shape() {
        let receipt = Receipt::for_assignment("A1", Some("req-1".to_string()));
        assert_eq!(
            serde_json::to_value(&receipt).unwrap(),
            json!({"AssignmentId": "A1", "ResponseMetadata": {"RequestId": "req-1"}})
        );
    }

    #[test]
    fn test_assignment_status_parse() {
        assert_eq!(
            "Approved".parse::<AssignmentStatus>().unwrap(),
            AssignmentStatus::Approved
        );
        assert!("approved".parse::<AssignmentStatus>().is_err());
        assert_eq!(AssignmentStatus::Submitted.to_string(), "Submitted");
    }
}
