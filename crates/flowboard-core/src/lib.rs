//! flowboard-core library.
//!
//! # Conventions
//!
//! - **Errors**: library operations return [`error::CoreError`] or
//!   [`error::GatewayError`]; setup code (config, database open) returns
//!   `anyhow::Result` with context.
//! - **Logging**: `tracing` macros with structured fields
//!   (`issue_id = %id`). `debug!` for store and settle decisions, `info!`
//!   for completed operations, `warn!` for rollbacks.
//! - **Ownership**: nothing is global. An [`store::IssueStore`] and a
//!   [`gateway::PersistenceGateway`] are handed to a
//!   [`workspace::Workspace`], which owns both.

pub mod clock;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod model;
pub mod notify;
pub mod query;
pub mod store;
pub mod sync;
pub mod workflow;
pub mod workspace;

pub use error::{CoreError, ErrorCode, GatewayError};
pub use model::{Comment, CommentId, Issue, IssueDraft, IssueId, IssuePatch, IssueType, Priority, Status};
pub use workspace::Workspace;
