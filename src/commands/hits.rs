//! HIT commands: create, expire, delete, list and show.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use serde_json::Value;
use tracing::{debug, info};

use crate::collector::Listing;
use crate::error::{MturkError, Result};
use crate::model::{Hit, HitLayoutParameter};
use crate::output::{string_fields, strip_fields, write_ids, write_json};
use crate::query::Query;
use crate::service::CreateHitRequest;
use crate::token::unique_request_token;

use super::Session;

/// Name of the layout parameter carrying each input line.
pub const LAYOUT_PARAMETER: &str = "json";

#[derive(Debug, Clone, Args)]
pub struct MakeHitsArgs {
    /// HIT type to create HITs with
    pub hit_type_id: String,

    /// Layout to render the HITs with
    pub hit_layout_id: String,

    /// File with one JSON object per line (defaults to standard input)
    pub filename: Option<PathBuf>,

    /// Requester annotation
    #[arg(long, short)]
    pub annotation: Option<String>,

    /// Lifetime in seconds
    #[arg(long, short = 't', default_value = "3600")]
    pub lifetime: i64,

    /// Maximum number of assignments per HIT
    #[arg(long, short, default_value = "1")]
    pub num_assignments: i32,

    /// Only list IDs
    #[arg(long, short)]
    pub ids: bool,
}

#[derive(Debug, Clone, Args)]
pub struct HitIdsArgs {
    /// HITs to act on
    pub hit_ids: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ListHitsArgs {
    /// Maximum number of HITs to show
    #[arg(long, short, default_value = "10")]
    pub limit: usize,

    /// JMESPath query applied to each page of HITs
    #[arg(long, short)]
    pub query: Option<String>,

    /// Only HITs whose requester annotation contains this text
    #[arg(long, short)]
    pub annotation: Option<String>,

    /// Only list IDs
    #[arg(long, short)]
    pub ids: bool,
}

/// Creates one HIT per input line.
///
/// Each line must be a JSON value; it is re-serialized and passed as the
/// `json` layout parameter. The idempotency token is derived from the line
/// exactly as read (without its line terminator). The first line that is
/// not JSON (a blank line included) or the first failed call aborts the
/// batch; HITs created before it stay created.
pub async fn make_hits<R: BufRead>(
    session: &Session,
    args: &MakeHitsArgs,
    input: R,
    out: &mut dyn Write,
) -> Result<()> {
    let mut hits = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let parsed: Value = serde_json::from_str(&line).map_err(|source| {
            MturkError::InvalidInput {
                line: index + 1,
                source,
            }
        })?;
        let request = CreateHitRequest {
            hit_type_id: args.hit_type_id.clone(),
            hit_layout_id: args.hit_layout_id.clone(),
            layout_parameters: vec![HitLayoutParameter {
                name: LAYOUT_PARAMETER.to_string(),
                value: serde_json::to_string(&parsed)?,
            }],
            unique_request_token: unique_request_token(
                &args.hit_type_id,
                &args.hit_layout_id,
                args.annotation.as_deref(),
                &line,
            ),
            max_assignments: args.num_assignments,
            lifetime_in_seconds: args.lifetime,
            requester_annotation: args.annotation.clone(),
        };

        let mut hit = session.service().create_hit_with_hit_type(request).await?;
        match &hit.hit_group_id {
            Some(group) => info!(
                hit_id = %hit.hit_id,
                preview = %session.environment().preview_url(group),
                "created HIT"
            ),
            None => info!(hit_id = %hit.hit_id, "created HIT"),
        }
        hit.question = None;
        hits.push(hit);
    }

    if !hits.is_empty() {
        info!(
            count = hits.len(),
            manage = session.environment().manage(),
            "batch complete"
        );
    }

    if args.ids {
        write_ids(out, hits.iter().map(|hit| hit.hit_id.as_str()))
    } else {
        write_json(out, &hits)
    }
}

/// Expires each HIT by moving its expiration to the Unix epoch.
pub async fn expire_hits(session: &Session, args: &HitIdsArgs, out: &mut dyn Write) -> Result<()> {
    let mut receipts = Vec::with_capacity(args.hit_ids.len());
    for hit_id in &args.hit_ids {
        let receipt = session
            .service()
            .update_expiration_for_hit(hit_id, DateTime::<Utc>::UNIX_EPOCH)
            .await?;
        debug!(%hit_id, "expired HIT");
        receipts.push(receipt);
    }
    write_json(out, &receipts)
}

pub async fn delete_hits(session: &Session, args: &HitIdsArgs, out: &mut dyn Write) -> Result<()> {
    let mut receipts = Vec::with_capacity(args.hit_ids.len());
    for hit_id in &args.hit_ids {
        let receipt = session.service().delete_hit(hit_id).await?;
        debug!(%hit_id, "deleted HIT");
        receipts.push(receipt);
    }
    write_json(out, &receipts)
}

/// Lists HITs, optionally filtered by annotation and a JMESPath query.
pub async fn list_hits(session: &Session, args: &ListHitsArgs, out: &mut dyn Write) -> Result<()> {
    let query = Query::for_listing(args.annotation.as_deref(), args.query.as_deref())?;
    let mut hits = session
        .collector()
        .collect(session.service(), &Listing::Hits, Some(args.limit), query.as_ref())
        .await?;
    for hit in &mut hits {
        strip_fields(hit, &["Question", "QualificationRequirements"]);
    }

    if args.ids {
        write_ids(out, string_fields(&hits, "HITId")?)
    } else {
        write_json(out, &hits)
    }
}

pub async fn get_hit(session: &Session, hit_id: &str, out: &mut dyn Write) -> Result<()> {
    let hit = Hit {
        question: None,
        ..session.service().get_hit(hit_id).await?
    };
    write_json(out, &hit)
}
