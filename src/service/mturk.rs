//! Task Service backed by Amazon Mechanical Turk.
//!
//! [`MturkService`] maps each [`TaskService`] method onto one
//! `aws-sdk-mturk` call and converts the SDK's shapes into the crate's
//! [`model`](crate::model) types. Credentials come from the standard AWS
//! chain (optionally a named profile); the endpoint comes from the selected
//! [`Environment`](crate::config::Environment).
//!
//! ```rust,no_run
//! use mturkish::config::ClientConfig;
//! use mturkish::service::MturkService;
//!
//! # async fn example() {
//! let config = ClientConfig::new(None, true, 1000);
//! let service = MturkService::from_config(&config).await;
//! # }
//! ```

use async_trait::async_trait;
use aws_sdk_mturk::config::Region;
use aws_sdk_mturk::error::DisplayErrorContext;
use aws_sdk_mturk::operation::RequestId;
use aws_sdk_mturk::primitives::DateTime as SdkDateTime;
use aws_sdk_mturk::types as sdk;
use aws_sdk_mturk::Client;
use chrono::{DateTime, Utc};

use crate::config::ClientConfig;
use crate::error::{MturkError, Result};
use crate::model::{
    Assignment, AssignmentStatus, Hit, Locale, QualificationRequirement, Receipt,
};

use super::{ApproveRequest, CreateHitRequest, Page, PageRequest, RejectRequest, TaskService};

const CREATE_HIT: &str = "CreateHITWithHITType";
const UPDATE_EXPIRATION: &str = "UpdateExpirationForHIT";
const DELETE_HIT: &str = "DeleteHIT";
const LIST_HITS: &str = "ListHITs";
const GET_HIT: &str = "GetHIT";
const LIST_ASSIGNMENTS: &str = "ListAssignmentsForHIT";
const APPROVE_ASSIGNMENT: &str = "ApproveAssignment";
const REJECT_ASSIGNMENT: &str = "RejectAssignment";

/// The service accepts at most 100 results per listing request.
const MAX_RESULTS_LIMIT: usize = 100;

/// Task Service client for Amazon Mechanical Turk.
#[derive(Debug, Clone)]
pub struct MturkService {
    client: Client,
}

impl MturkService {
    /// Wraps a pre-built SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the AWS config chain, overriding region and
    /// endpoint from `config`.
    pub async fn from_config(config: &ClientConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        let mturk_config = aws_sdk_mturk::config::Builder::from(&sdk_config)
            .endpoint_url(config.environment.endpoint())
            .build();
        tracing::debug!(
            environment = %config.environment,
            endpoint = config.environment.endpoint(),
            "configured Task Service client"
        );
        Self::new(Client::from_conf(mturk_config))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Maps an SDK error to [`MturkError::Service`], keeping the full error
/// chain in the message.
fn map_sdk_error<E>(operation: &'static str, err: E) -> MturkError
where
    E: std::error::Error + Send + Sync + 'static,
{
    MturkError::Service {
        operation,
        message: DisplayErrorContext(&err).to_string(),
        source: Some(Box::new(err)),
    }
}

fn missing(field: &'static str, operation: &str) -> MturkError {
    MturkError::MissingField {
        field,
        context: format!("{operation} response"),
    }
}

fn to_utc(value: Option<&SdkDateTime>) -> Option<DateTime<Utc>> {
    value.and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn page_size(page: &PageRequest) -> i32 {
    // Bounded by MAX_RESULTS_LIMIT, so the cast cannot truncate.
    page.page_size.clamp(1, MAX_RESULTS_LIMIT) as i32
}

fn locale_from_sdk(locale: &sdk::Locale) -> Locale {
    Locale {
        country: locale.country().to_string(),
        subdivision: owned(locale.subdivision()),
    }
}

fn qualification_from_sdk(requirement: &sdk::QualificationRequirement) -> QualificationRequirement {
    QualificationRequirement {
        qualification_type_id: requirement.qualification_type_id().to_string(),
        comparator: requirement.comparator().as_str().to_string(),
        integer_values: requirement.integer_values().to_vec(),
        locale_values: requirement
            .locale_values()
            .iter()
            .map(locale_from_sdk)
            .collect(),
        required_to_preview: requirement.required_to_preview(),
        actions_guarded: requirement
            .actions_guarded()
            .map(|actions| actions.as_str().to_string()),
    }
}

fn hit_from_sdk(hit: &sdk::Hit) -> Hit {
    Hit {
        hit_id: hit.hit_id().unwrap_or_default().to_string(),
        hit_type_id: owned(hit.hit_type_id()),
        hit_group_id: owned(hit.hit_group_id()),
        hit_layout_id: owned(hit.hit_layout_id()),
        creation_time: to_utc(hit.creation_time()),
        title: owned(hit.title()),
        description: owned(hit.description()),
        question: owned(hit.question()),
        keywords: owned(hit.keywords()),
        hit_status: hit
            .hit_status()
            .and_then(|status| status.as_str().parse().ok()),
        max_assignments: hit.max_assignments(),
        reward: owned(hit.reward()),
        auto_approval_delay_in_seconds: hit.auto_approval_delay_in_seconds(),
        expiration: to_utc(hit.expiration()),
        assignment_duration_in_seconds: hit.assignment_duration_in_seconds(),
        requester_annotation: owned(hit.requester_annotation()),
        qualification_requirements: hit
            .qualification_requirements()
            .iter()
            .map(qualification_from_sdk)
            .collect(),
        hit_review_status: hit
            .hit_review_status()
            .map(|status| status.as_str().to_string()),
        number_of_assignments_pending: hit.number_of_assignments_pending(),
        number_of_assignments_available: hit.number_of_assignments_available(),
        number_of_assignments_completed: hit.number_of_assignments_completed(),
    }
}

fn assignment_from_sdk(assignment: &sdk::Assignment) -> Result<Assignment> {
    let assignment_status = assignment
        .assignment_status()
        .and_then(|status| status.as_str().parse::<AssignmentStatus>().ok())
        .ok_or_else(|| missing("AssignmentStatus", LIST_ASSIGNMENTS))?;

    Ok(Assignment {
        assignment_id: assignment
            .assignment_id()
            .ok_or_else(|| missing("AssignmentId", LIST_ASSIGNMENTS))?
            .to_string(),
        worker_id: owned(assignment.worker_id()),
        hit_id: assignment.hit_id().unwrap_or_default().to_string(),
        assignment_status,
        auto_approval_time: to_utc(assignment.auto_approval_time()),
        accept_time: to_utc(assignment.accept_time()),
        submit_time: to_utc(assignment.submit_time()),
        approval_time: to_utc(assignment.approval_time()),
        rejection_time: to_utc(assignment.rejection_time()),
        deadline: to_utc(assignment.deadline()),
        answer: owned(assignment.answer()),
        requester_feedback: owned(assignment.requester_feedback()),
    })
}

// ---------------------------------------------------------------------------
// TaskService implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl TaskService for MturkService {
    async fn create_hit_with_hit_type(&self, request: CreateHitRequest) -> Result<Hit> {
        let parameters = request
            .layout_parameters
            .iter()
            .map(|parameter| {
                sdk::HitLayoutParameter::builder()
                    .name(&parameter.name)
                    .value(&parameter.value)
                    .build()
                    .map_err(|e| map_sdk_error(CREATE_HIT, e))
            })
            .collect::<Result<Vec<_>>>()?;

        let output = self
            .client
            .create_hit_with_hit_type()
            .hit_type_id(&request.hit_type_id)
            .hit_layout_id(&request.hit_layout_id)
            .set_hit_layout_parameters(Some(parameters))
            .unique_request_token(&request.unique_request_token)
            .max_assignments(request.max_assignments)
            .lifetime_in_seconds(request.lifetime_in_seconds)
            .set_requester_annotation(request.requester_annotation)
            .send()
            .await
            .map_err(|e| map_sdk_error(CREATE_HIT, e))?;

        output
            .hit()
            .map(hit_from_sdk)
            .ok_or_else(|| missing("HIT", CREATE_HIT))
    }

    async fn update_expiration_for_hit(
        &self,
        hit_id: &str,
        expire_at: DateTime<Utc>,
    ) -> Result<Receipt> {
        let output = self
            .client
            .update_expiration_for_hit()
            .hit_id(hit_id)
            .expire_at(SdkDateTime::from_millis(expire_at.timestamp_millis()))
            .send()
            .await
            .map_err(|e| map_sdk_error(UPDATE_EXPIRATION, e))?;

        Ok(Receipt::for_hit(hit_id, owned(output.request_id())))
    }

    async fn delete_hit(&self, hit_id: &str) -> Result<Receipt> {
        let output = self
            .client
            .delete_hit()
            .hit_id(hit_id)
            .send()
            .await
            .map_err(|e| map_sdk_error(DELETE_HIT, e))?;

        Ok(Receipt::for_hit(hit_id, owned(output.request_id())))
    }

    async fn list_hits(&self, page: PageRequest) -> Result<Page<Hit>> {
        let output = self
            .client
            .list_hits()
            .set_next_token(page.next_token.clone())
            .max_results(page_size(&page))
            .send()
            .await
            .map_err(|e| map_sdk_error(LIST_HITS, e))?;

        Ok(Page {
            items: output.hits().iter().map(hit_from_sdk).collect(),
            next_token: owned(output.next_token()),
        })
    }

    async fn get_hit(&self, hit_id: &str) -> Result<Hit> {
        let output = self
            .client
            .get_hit()
            .hit_id(hit_id)
            .send()
            .await
            .map_err(|e| map_sdk_error(GET_HIT, e))?;

        output
            .hit()
            .map(hit_from_sdk)
            .ok_or_else(|| missing("HIT", GET_HIT))
    }

    async fn list_assignments_for_hit(
        &self,
        hit_id: &str,
        statuses: &[AssignmentStatus],
        page: PageRequest,
    ) -> Result<Page<Assignment>> {
        let statuses = statuses
            .iter()
            .map(|status| sdk::AssignmentStatus::from(status.as_str()))
            .collect();

        let output = self
            .client
            .list_assignments_for_hit()
            .hit_id(hit_id)
            .set_assignment_statuses(Some(statuses))
            .set_next_token(page.next_token.clone())
            .max_results(page_size(&page))
            .send()
            .await
            .map_err(|e| map_sdk_error(LIST_ASSIGNMENTS, e))?;

        Ok(Page {
            items: output
                .assignments()
                .iter()
                .map(assignment_from_sdk)
                .collect::<Result<Vec<_>>>()?,
            next_token: owned(output.next_token()),
        })
    }

    async fn approve_assignment(&self, request: ApproveRequest) -> Result<Receipt> {
        let output = self
            .client
            .approve_assignment()
            .assignment_id(&request.assignment_id)
            .set_requester_feedback(request.requester_feedback)
            .override_rejection(request.override_rejection)
            .send()
            .await
            .map_err(|e| map_sdk_error(APPROVE_ASSIGNMENT, e))?;

        Ok(Receipt::for_assignment(
            request.assignment_id,
            owned(output.request_id()),
        ))
    }

    async fn reject_assignment(&self, request: RejectRequest) -> Result<Receipt> {
        let output = self
            .client
            .reject_assignment()
            .assignment_id(&request.assignment_id)
            .requester_feedback(request.requester_feedback)
            .send()
            .await
            .map_err(|e| map_sdk_error(REJECT_ASSIGNMENT, e))?;

        Ok(Receipt::for_assignment(
            request.assignment_id,
            owned(output.request_id()),
        ))
    }
}
