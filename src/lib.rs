//! # mturkish
//!
//! A command-line client for the Mechanical Turk requester API. It creates
//! HITs in batches from JSON lines, expires and deletes them, lists HITs and
//! assignments, and approves or rejects worker submissions.
//!
//! The library half holds everything the `mturkish` binary does apart from
//! argument parsing and process setup:
//!
//! - [`service`]: the [`TaskService`](service::TaskService) seam, with an
//!   `aws-sdk-mturk` backend and an in-memory one.
//! - [`collector`]: cursor pagination with limits, queries and a global cap.
//! - [`token`]: idempotency tokens for HIT creation.
//! - [`answer`]: flattening of `QuestionFormAnswers` documents.
//! - [`query`]: JMESPath filtering of listing pages.
//! - [`commands`]: the CLI operations, writing to any `Write` sink.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mturkish::commands::{Command, Session};
//! use mturkish::config::ClientConfig;
//! use mturkish::model::Hit;
//! use mturkish::service::InMemoryTaskService;
//!
//! # async fn example() -> mturkish::Result<()> {
//! let service = InMemoryTaskService::new().with_hits([Hit {
//!     hit_id: "H1".to_string(),
//!     ..Hit::default()
//! }]);
//! let session = Session::new(Arc::new(service), &ClientConfig::default());
//!
//! let mut out = Vec::new();
//! Command::GetHit { hit_id: "H1".to_string() }
//!     .execute(&session, std::io::empty(), &mut out)
//!     .await?;
//! assert!(String::from_utf8_lossy(&out).contains("\"HITId\":\"H1\""));
//! # Ok(())
//! # }
//! ```

pub mod answer;
pub mod collector;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod query;
pub mod service;
pub mod token;

pub use collector::{resolve_assignment_ids, Collector, Listing};
pub use config::{ClientConfig, Environment};
pub use error::{MturkError, Result};
pub use service::{InMemoryTaskService, MturkService, TaskService};
