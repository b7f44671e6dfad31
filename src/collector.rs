//! Paginated collection of listing results.
//!
//! A [`Collector`] drives one cursor-paginated [`Listing`] to completion,
//! to a caller-supplied item limit, or to the process-wide `max_items` cap,
//! whichever comes first. Pages are fetched strictly one after another.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::model::AssignmentStatus;
use crate::output::string_field;
use crate::query::Query;
use crate::service::{PageRequest, TaskService};

/// Number of items requested per page.
pub const PAGE_SIZE: usize = 25;

/// A listing operation together with its fixed request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Every HIT of the requester.
    Hits,
    /// Assignments of one HIT, restricted to the given statuses.
    AssignmentsForHit {
        hit_id: String,
        statuses: Vec<AssignmentStatus>,
    },
}

impl Listing {
    /// Fetches one page and returns its items as JSON together with the
    /// continuation token.
    async fn fetch(
        &self,
        service: &dyn TaskService,
        page: PageRequest,
    ) -> Result<(Vec<Value>, Option<String>)> {
        match self {
            Self::Hits => {
                let page = service.list_hits(page).await?;
                Ok((to_values(&page.items)?, page.next_token))
            },
            Self::AssignmentsForHit { hit_id, statuses } => {
                let page = service
                    .list_assignments_for_hit(hit_id, statuses, page)
                    .await?;
                Ok((to_values(&page.items)?, page.next_token))
            },
        }
    }
}

fn to_values<T: serde::Serialize>(items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(Into::into))
        .collect()
}

/// Collects listing results across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collector {
    max_items: usize,
}

impl Collector {
    /// `max_items` caps the raw items pulled from the service by any single
    /// [`collect`](Self::collect) call.
    pub fn new(max_items: usize) -> Self {
        Self { max_items }
    }

    /// Collects the items of `listing` in arrival order.
    ///
    /// When `query` is given it is applied to each page before the items
    /// are accumulated, so `limit` counts filtered items. Once `limit` is
    /// reached no further page is requested and the result is truncated to
    /// exactly `limit` items. A limit of zero still fetches the first page.
    ///
    /// Any service error aborts the collection and is returned unchanged;
    /// items gathered so far are discarded.
    pub async fn collect(
        &self,
        service: &dyn TaskService,
        listing: &Listing,
        limit: Option<usize>,
        query: Option<&Query>,
    ) -> Result<Vec<Value>> {
        let mut result = Vec::new();
        let mut next_token = None;
        let mut fetched = 0;

        loop {
            let request = PageRequest {
                next_token: next_token.take(),
                page_size: PAGE_SIZE,
            };
            let (mut items, token) = listing.fetch(service, request).await?;

            let budget = self.max_items.saturating_sub(fetched);
            let capped = items.len() >= budget;
            items.truncate(budget);
            fetched += items.len();
            debug!(?listing, page_items = items.len(), fetched, "fetched page");

            let items = match query {
                Some(query) => query.apply(items)?,
                None => items,
            };
            result.extend(items);

            if let Some(limit) = limit {
                if result.len() >= limit {
                    result.truncate(limit);
                    return Ok(result);
                }
            }

            match token {
                Some(token) if !capped && !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(result)
    }
}

/// Resolves HIT ids to the ids of their assignments eligible for a bulk
/// review action.
///
/// Only `Submitted` assignments are included, plus `Approved` ones when
/// `include_approved` is set. Ids are grouped per HIT in the order the HITs
/// were given.
pub async fn resolve_assignment_ids(
    service: &dyn TaskService,
    collector: &Collector,
    hit_ids: &[String],
    include_approved: bool,
) -> Result<Vec<String>> {
    let statuses = if include_approved {
        vec![AssignmentStatus::Submitted, AssignmentStatus::Approved]
    } else {
        vec![AssignmentStatus::Submitted]
    };

    let mut assignment_ids = Vec::new();
    for hit_id in hit_ids {
        let listing = Listing::AssignmentsForHit {
            hit_id: hit_id.clone(),
            statuses: statuses.clone(),
        };
        let assignments = collector.collect(service, &listing, None, None).await?;
        for assignment in &assignments {
            assignment_ids.push(string_field(assignment, "AssignmentId")?);
        }
    }
    debug!(hits = hit_ids.len(), assignments = assignment_ids.len(), "resolved assignments");
    Ok(assignment_ids)
}
