//! CLI commands.
//!
//! Each command reads its arguments from a clap `Args` struct, talks to the
//! Task Service through a [`Session`], and writes its result to an injected
//! sink:
//! - `make-hits`, `expire-hits`, `delete-hits`, `list-hits`, `get-hit`
//!   ([`hits`])
//! - `list-assignments`, `approve`, `reject` ([`assignments`])

pub mod assignments;
pub mod hits;

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use clap::Subcommand;

use crate::collector::Collector;
use crate::config::{ClientConfig, Environment};
use crate::error::Result;
use crate::service::TaskService;

pub use assignments::{ApproveArgs, ListAssignmentsArgs, RejectArgs};
pub use hits::{HitIdsArgs, ListHitsArgs, MakeHitsArgs};

/// State shared by all commands of one invocation.
#[derive(Clone)]
pub struct Session {
    service: Arc<dyn TaskService>,
    collector: Collector,
    environment: Environment,
}

impl Session {
    pub fn new(service: Arc<dyn TaskService>, config: &ClientConfig) -> Self {
        Self {
            service,
            collector: Collector::new(config.max_items),
            environment: config.environment,
        }
    }

    pub fn service(&self) -> &dyn TaskService {
        self.service.as_ref()
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create one HIT per JSON line read from FILENAME or standard input
    MakeHits(MakeHitsArgs),

    /// Expire HITs immediately
    ExpireHits(HitIdsArgs),

    /// Delete HITs
    DeleteHits(HitIdsArgs),

    /// List HITs
    ListHits(ListHitsArgs),

    /// Show one HIT
    GetHit {
        /// HIT to show
        hit_id: String,
    },

    /// List submitted and approved assignments of HITs, with flattened answers
    ListAssignments(ListAssignmentsArgs),

    /// Approve assignments
    Approve(ApproveArgs),

    /// Reject assignments
    Reject(RejectArgs),
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MakeHits(_) => "make-hits",
            Self::ExpireHits(_) => "expire-hits",
            Self::DeleteHits(_) => "delete-hits",
            Self::ListHits(_) => "list-hits",
            Self::GetHit { .. } => "get-hit",
            Self::ListAssignments(_) => "list-assignments",
            Self::Approve(_) => "approve",
            Self::Reject(_) => "reject",
        }
    }

    /// Runs the command. `input` is only read by `make-hits` when no file
    /// name was given.
    pub async fn execute(
        self,
        session: &Session,
        input: impl BufRead,
        out: &mut dyn Write,
    ) -> Result<()> {
        match self {
            Self::MakeHits(args) => match &args.filename {
                Some(path) => {
                    let file = BufReader::new(File::open(path)?);
                    hits::make_hits(session, &args, file, out).await
                },
                None => hits::make_hits(session, &args, input, out).await,
            },
            Self::ExpireHits(args) => hits::expire_hits(session, &args, out).await,
            Self::DeleteHits(args) => hits::delete_hits(session, &args, out).await,
            Self::ListHits(args) => hits::list_hits(session, &args, out).await,
            Self::GetHit { hit_id } => hits::get_hit(session, &hit_id, out).await,
            Self::ListAssignments(args) => {
                assignments::list_assignments(session, &args, out).await
            },
            Self::Approve(args) => assignments::approve(session, &args, out).await,
            Self::Reject(args) => assignments::reject(session, &args, out).await,
        }
    }
}
