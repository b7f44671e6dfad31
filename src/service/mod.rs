//! The Task Service seam.
//!
//! [`TaskService`] is the request/response API of the crowdsourcing
//! marketplace. Authentication, request signing, retries and transport all
//! live behind it. Two implementations ship with the crate:
//!
//! - [`MturkService`](mturk::MturkService) -- the real service via
//!   `aws-sdk-mturk`, pointed at the production or sandbox endpoint.
//! - [`InMemoryTaskService`](memory::InMemoryTaskService) -- a
//!   deterministic in-process stand-in that records every call.
//!
//! Listing operations are cursor-paginated: each [`Page`] carries the
//! `next_token` to pass back in the following [`PageRequest`].

pub mod memory;
pub mod mturk;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{Assignment, AssignmentStatus, Hit, HitLayoutParameter, Receipt};

pub use memory::{InMemoryTaskService, ServiceCall};
pub use mturk::MturkService;

/// Parameters for `CreateHITWithHITType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateHitRequest {
    pub hit_type_id: String,
    pub hit_layout_id: String,
    pub layout_parameters: Vec<HitLayoutParameter>,
    /// Idempotency token; see [`crate::token`].
    pub unique_request_token: String,
    pub max_assignments: i32,
    pub lifetime_in_seconds: i64,
    pub requester_annotation: Option<String>,
}

/// Parameters for `ApproveAssignment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveRequest {
    pub assignment_id: String,
    pub requester_feedback: Option<String>,
    /// Approve even if the assignment was previously rejected.
    pub override_rejection: bool,
}

/// Parameters for `RejectAssignment`. Feedback is mandatory for rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRequest {
    pub assignment_id: String,
    pub requester_feedback: String,
}

/// Cursor and size of one page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Continuation token from the previous page. `None` for the first page.
    pub next_token: Option<String>,
    pub page_size: usize,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page. `None` once the listing is exhausted.
    pub next_token: Option<String>,
}

/// Remote operations of the Task Service.
///
/// Every call is a single request/response exchange. Errors are returned
/// as-is; implementations must not retry on the caller's behalf beyond what
/// their transport already does.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Creates a HIT from an existing HIT type and layout.
    async fn create_hit_with_hit_type(&self, request: CreateHitRequest) -> Result<Hit>;

    /// Moves the expiration of a HIT; a past instant expires it immediately.
    async fn update_expiration_for_hit(
        &self,
        hit_id: &str,
        expire_at: DateTime<Utc>,
    ) -> Result<Receipt>;

    async fn delete_hit(&self, hit_id: &str) -> Result<Receipt>;

    async fn list_hits(&self, page: PageRequest) -> Result<Page<Hit>>;

    async fn get_hit(&self, hit_id: &str) -> Result<Hit>;

    /// Lists the assignments of one HIT whose status is in `statuses`.
    async fn list_assignments_for_hit(
        &self,
        hit_id: &str,
        statuses: &[AssignmentStatus],
        page: PageRequest,
    ) -> Result<Page<Assignment>>;

    async fn approve_assignment(&self, request: ApproveRequest) -> Result<Receipt>;

    async fn reject_assignment(&self, request: RejectRequest) -> Result<Receipt>;
}
