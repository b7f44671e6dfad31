//! Assignment commands: list with flattened answers, approve and reject.

use std::io::Write;

use clap::Args;
use serde_json::Value;
use tracing::debug;

use crate::answer::flatten_answer;
use crate::collector::{resolve_assignment_ids, Listing};
use crate::error::{MturkError, Result};
use crate::model::AssignmentStatus;
use crate::output::{string_fields, write_ids, write_json};
use crate::query::Query;
use crate::service::{ApproveRequest, RejectRequest};

use super::Session;

/// Statuses shown by `list-assignments`.
pub const LISTED_STATUSES: [AssignmentStatus; 2] =
    [AssignmentStatus::Approved, AssignmentStatus::Submitted];

#[derive(Debug, Clone, Args)]
pub struct ListAssignmentsArgs {
    /// HITs whose assignments to list
    pub hit_ids: Vec<String>,

    /// Maximum number of assignments to show
    #[arg(long, short, default_value = "10")]
    pub limit: usize,

    /// JMESPath query applied to each page of assignments
    #[arg(long, short)]
    pub query: Option<String>,

    /// Only list IDs
    #[arg(long, short)]
    pub ids: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ApproveArgs {
    /// Assignments to approve, or HITs with --all
    pub ids: Vec<String>,

    /// Requester feedback
    #[arg(long, short)]
    pub message: Option<String>,

    /// Apply to all assignments of the given HITs instead
    #[arg(long, short)]
    pub all: bool,

    /// Approve even rejected assignments
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, Clone, Args)]
pub struct RejectArgs {
    /// Assignments to reject, or HITs with --all
    pub ids: Vec<String>,

    /// Requester feedback
    #[arg(long, short, required = true)]
    pub message: String,

    /// Apply to all assignments of the given HITs instead
    #[arg(long, short)]
    pub all: bool,
}

/// Lists the assignments of each HIT in turn.
///
/// The limit and query apply to each HIT's collection; results are
/// concatenated and the overall output is capped at the limit, skipping the
/// remaining HITs once it is reached.
pub async fn list_assignments(
    session: &Session,
    args: &ListAssignmentsArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let query = args.query.as_deref().map(Query::compile).transpose()?;
    let mut results = Vec::new();

    for hit_id in &args.hit_ids {
        let listing = Listing::AssignmentsForHit {
            hit_id: hit_id.clone(),
            statuses: LISTED_STATUSES.to_vec(),
        };
        let mut assignments = session
            .collector()
            .collect(session.service(), &listing, Some(args.limit), query.as_ref())
            .await?;
        for assignment in &mut assignments {
            flatten_in_place(assignment)?;
        }
        results.extend(assignments);

        if results.len() >= args.limit {
            results.truncate(args.limit);
            break;
        }
    }

    if args.ids {
        write_ids(out, string_fields(&results, "AssignmentId")?)
    } else {
        write_json(out, &results)
    }
}

/// Replaces an assignment's `Answer` document with its flattened mapping.
/// Items a query reshaped into something without a string `Answer` are left
/// alone.
fn flatten_in_place(assignment: &mut Value) -> Result<()> {
    let Some(Value::String(xml)) = assignment.get("Answer") else {
        return Ok(());
    };
    let flattened = flatten_answer(xml).map_err(|source| MturkError::Answer {
        assignment_id: assignment
            .get("AssignmentId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        source,
    })?;
    assignment["Answer"] = serde_json::to_value(flattened)?;
    Ok(())
}

/// Ids to act on: given directly, or resolved from HIT ids with `--all`.
async fn target_ids(
    session: &Session,
    ids: &[String],
    all: bool,
    include_approved: bool,
) -> Result<Vec<String>> {
    if all {
        resolve_assignment_ids(session.service(), session.collector(), ids, include_approved).await
    } else {
        Ok(ids.to_vec())
    }
}

pub async fn approve(session: &Session, args: &ApproveArgs, out: &mut dyn Write) -> Result<()> {
    let assignment_ids = target_ids(session, &args.ids, args.all, args.force).await?;

    let mut receipts = Vec::with_capacity(assignment_ids.len());
    for assignment_id in assignment_ids {
        debug!(%assignment_id, force = args.force, "approving assignment");
        let receipt = session
            .service()
            .approve_assignment(ApproveRequest {
                assignment_id,
                requester_feedback: args.message.clone(),
                override_rejection: args.force,
            })
            .await?;
        receipts.push(receipt);
    }
    write_json(out, &receipts)
}

pub async fn reject(session: &Session, args: &RejectArgs, out: &mut dyn Write) -> Result<()> {
    let assignment_ids = target_ids(session, &args.ids, args.all, false).await?;

    let mut receipts = Vec::with_capacity(assignment_ids.len());
    for assignment_id in assignment_ids {
        debug!(%assignment_id, "rejecting assignment");
        let receipt = session
            .service()
            .reject_assignment(RejectRequest {
                assignment_id,
                requester_feedback: args.message.clone(),
            })
            .await?;
        receipts.push(receipt);
    }
    write_json(out, &receipts)
}
