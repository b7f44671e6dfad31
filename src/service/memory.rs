//! In-memory Task Service.
//!
//! [`InMemoryTaskService`] keeps HITs and assignments in insertion order and
//! serves them through the same cursor-paginated interface as the real
//! service. Continuation tokens are opaque offsets. Every call is recorded
//! as a [`ServiceCall`] so tests can assert on exactly which requests were
//! issued and in what order.
//!
//! # Examples
//!
//! ```
//! use mturkish::model::Hit;
//! use mturkish::service::{InMemoryTaskService, PageRequest, TaskService};
//!
//! # async fn example() {
//! let service = InMemoryTaskService::new().with_hits((0..3).map(|i| Hit {
//!     hit_id: format!("H{i}"),
//!     ..Hit::default()
//! }));
//! let page = service
//!     .list_hits(PageRequest { next_token: None, page_size: 2 })
//!     .await
//!     .unwrap();
//! assert_eq!(page.items.len(), 2);
//! assert!(page.next_token.is_some());
//! # }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{MturkError, Result};
use crate::model::{Assignment, AssignmentStatus, Hit, HitStatus, Receipt};

use super::{ApproveRequest, CreateHitRequest, Page, PageRequest, RejectRequest, TaskService};

/// A request received by [`InMemoryTaskService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    CreateHit(CreateHitRequest),
    UpdateExpiration {
        hit_id: String,
        expire_at: DateTime<Utc>,
    },
    DeleteHit(String),
    ListHits(PageRequest),
    GetHit(String),
    ListAssignments {
        hit_id: String,
        statuses: Vec<AssignmentStatus>,
        page: PageRequest,
    },
    Approve(ApproveRequest),
    Reject(RejectRequest),
}

impl ServiceCall {
    pub fn is_listing(&self) -> bool {
        matches!(self, Self::ListHits(_) | Self::ListAssignments { .. })
    }
}

#[derive(Debug, Default)]
struct State {
    hits: Vec<Hit>,
    assignments: Vec<Assignment>,
    /// Idempotency token -> HIT id.
    tokens: HashMap<String, String>,
    calls: Vec<ServiceCall>,
    next_hit: usize,
}

/// Deterministic in-process [`TaskService`].
#[derive(Debug, Default)]
pub struct InMemoryTaskService {
    state: Mutex<State>,
    /// 1-based index of the listing call that should fail.
    failing_listing: Option<usize>,
}

impl InMemoryTaskService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(self, hits: impl IntoIterator<Item = Hit>) -> Self {
        self.state.lock().hits.extend(hits);
        self
    }

    pub fn with_assignments(self, assignments: impl IntoIterator<Item = Assignment>) -> Self {
        self.state.lock().assignments.extend(assignments);
        self
    }

    /// Makes the `n`-th listing call (1-based, across both listing
    /// operations) fail with a service error.
    pub fn with_failing_listing(mut self, n: usize) -> Self {
        self.failing_listing = Some(n);
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.state.lock().calls.clone()
    }

    pub fn listing_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_listing())
            .count()
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.lock().hits.clone()
    }

    pub fn assignment(&self, assignment_id: &str) -> Option<Assignment> {
        self.state
            .lock()
            .assignments
            .iter()
            .find(|a| a.assignment_id == assignment_id)
            .cloned()
    }

    /// Records `call` and fails it if it is the configured failing listing.
    fn record(&self, state: &mut State, call: ServiceCall, operation: &'static str) -> Result<()> {
        let listing = call.is_listing();
        state.calls.push(call);
        if listing {
            let index = state.calls.iter().filter(|c| c.is_listing()).count();
            if self.failing_listing == Some(index) {
                return Err(rejected(operation, "simulated service failure"));
            }
        }
        Ok(())
    }
}

fn rejected(operation: &'static str, message: impl Into<String>) -> MturkError {
    MturkError::Service {
        operation,
        message: message.into(),
        source: None,
    }
}

/// Slices `items` according to an offset-encoded continuation token.
fn paginate<T: Clone>(items: &[T], page: &PageRequest, operation: &'static str) -> Result<Page<T>> {
    let start = match &page.next_token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| rejected(operation, format!("invalid pagination token: {token}")))?,
        None => 0,
    };
    let end = items.len().min(start.saturating_add(page.page_size.max(1)));
    let slice = items.get(start..end).unwrap_or_default().to_vec();

    Ok(Page {
        items: slice,
        next_token: (end < items.len()).then(|| end.to_string()),
    })
}

#[async_trait]
impl TaskService for InMemoryTaskService {
    async fn create_hit_with_hit_type(&self, request: CreateHitRequest) -> Result<Hit> {
        let mut state = self.state.lock();
        self.record(&mut state, ServiceCall::CreateHit(request.clone()), "CreateHITWithHITType")?;

        if let Some(existing) = state.tokens.get(&request.unique_request_token) {
            return Err(rejected(
                "CreateHITWithHITType",
                format!(
                    "The HIT with ID \"{existing}\" already exists for UniqueRequestToken \"{}\"",
                    request.unique_request_token
                ),
            ));
        }

        state.next_hit += 1;
        let created_at = Utc::now();
        let hit = Hit {
            hit_id: format!("HIT{:06}", state.next_hit),
            hit_group_id: Some(format!("GROUP-{}", request.hit_type_id)),
            hit_layout_id: Some(request.hit_layout_id.clone()),
            creation_time: Some(created_at),
            question: Some("<HTMLQuestion/>".to_string()),
            hit_status: Some(HitStatus::Assignable),
            max_assignments: Some(request.max_assignments),
            expiration: Some(created_at + chrono::Duration::seconds(request.lifetime_in_seconds)),
            requester_annotation: request.requester_annotation.clone(),
            number_of_assignments_pending: Some(0),
            number_of_assignments_available: Some(request.max_assignments),
            number_of_assignments_completed: Some(0),
            hit_type_id: Some(request.hit_type_id),
            ..Hit::default()
        };
        state
            .tokens
            .insert(request.unique_request_token, hit.hit_id.clone());
        state.hits.push(hit.clone());
        Ok(hit)
    }

    async fn update_expiration_for_hit(
        &self,
        hit_id: &str,
        expire_at: DateTime<Utc>,
    ) -> Result<Receipt> {
        let mut state = self.state.lock();
        let call = ServiceCall::UpdateExpiration {
            hit_id: hit_id.to_string(),
            expire_at,
        };
        self.record(&mut state, call, "UpdateExpirationForHIT")?;

        let hit = state
            .hits
            .iter_mut()
            .find(|hit| hit.hit_id == hit_id)
            .ok_or_else(|| rejected("UpdateExpirationForHIT", format!("HIT {hit_id} does not exist")))?;
        hit.expiration = Some(expire_at);
        Ok(Receipt::for_hit(hit_id, Some(format!("req-{}", state.calls.len()))))
    }

    async fn delete_hit(&self, hit_id: &str) -> Result<Receipt> {
        let mut state = self.state.lock();
        self.record(&mut state, ServiceCall::DeleteHit(hit_id.to_string()), "DeleteHIT")?;

        let before = state.hits.len();
        state.hits.retain(|hit| hit.hit_id != hit_id);
        if state.hits.len() == before {
            return Err(rejected("DeleteHIT", format!("HIT {hit_id} does not exist")));
        }
        Ok(Receipt::for_hit(hit_id, Some(format!("req-{}", state.calls.len()))))
    }

    async fn list_hits(&self, page: PageRequest) -> Result<Page<Hit>> {
        let mut state = self.state.lock();
        self.record(&mut state, ServiceCall::ListHits(page.clone()), "ListHITs")?;
        paginate(&state.hits, &page, "ListHITs")
    }

    async fn get_hit(&self, hit_id: &str) -> Result<Hit> {
        let mut state = self.state.lock();
        self.record(&mut state, ServiceCall::GetHit(hit_id.to_string()), "GetHIT")?;
        state
            .hits
            .iter()
            .find(|hit| hit.hit_id == hit_id)
            .cloned()
            .ok_or_else(|| rejected("GetHIT", format!("HIT {hit_id} does not exist")))
    }

    async fn list_assignments_for_hit(
        &self,
        hit_id: &str,
        statuses: &[AssignmentStatus],
        page: PageRequest,
    ) -> Result<Page<Assignment>> {
        let mut state = self.state.lock();
        let call = ServiceCall::ListAssignments {
            hit_id: hit_id.to_string(),
            statuses: statuses.to_vec(),
            page: page.clone(),
        };
        self.record(&mut state, call, "ListAssignmentsForHIT")?;

        let matching: Vec<Assignment> = state
            .assignments
            .iter()
            .filter(|a| a.hit_id == hit_id && statuses.contains(&a.assignment_status))
            .cloned()
            .collect();
        paginate(&matching, &page, "ListAssignmentsForHIT")
    }

    async fn approve_assignment(&self, request: ApproveRequest) -> Result<Receipt> {
        let mut state = self.state.lock();
        self.record(&mut state, ServiceCall::Approve(request.clone()), "ApproveAssignment")?;

        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.assignment_id == request.assignment_id)
            .ok_or_else(|| {
                rejected(
                    "ApproveAssignment",
                    format!("assignment {} does not exist", request.assignment_id),
                )
            })?;
        if assignment.assignment_status == AssignmentStatus::Rejected && !request.override_rejection {
            return Err(rejected(
                "ApproveAssignment",
                format!(
                    "assignment {} was rejected; approving it requires OverrideRejection",
                    request.assignment_id
                ),
            ));
        }
        assignment.assignment_status = AssignmentStatus::Approved;
        assignment.approval_time = Some(Utc::now());
        if request.requester_feedback.is_some() {
            assignment.requester_feedback = request.requester_feedback.clone();
        }
        let request_id = format!("req-{}", state.calls.len());
        Ok(Receipt::for_assignment(request.assignment_id, Some(request_id)))
    }

    async fn reject_assignment(&self, request: RejectRequest) -> Result<Receipt> {
        let mut state = self.state.lock();
        self.record(&mut state, ServiceCall::Reject(request.clone()), "RejectAssignment")?;

        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.assignment_id == request.assignment_id)
            .ok_or_else(|| {
                rejected(
                    "RejectAssignment",
                    format!("assignment {} does not exist", request.assignment_id),
                )
            })?;
        if assignment.assignment_status != AssignmentStatus::Submitted {
            return Err(rejected(
                "RejectAssignment",
                format!(
                    "assignment {} is {}, only Submitted assignments can be rejected",
                    request.assignment_id, assignment.assignment_status
                ),
            ));
        }
        assignment.assignment_status = AssignmentStatus::Rejected;
        assignment.rejection_time = Some(Utc::now());
        assignment.requester_feedback = Some(request.requester_feedback.clone());
        let request_id = format!("req-{}", state.calls.len());
        Ok(Receipt::for_assignment(request.assignment_id, Some(request_id)))
    }
}
