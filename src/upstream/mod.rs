//! Upstream accounting service integration.
//!
//! # Data Flow
//! ```text
//! incoming request handler
//!     → client.rs authenticate()      (POST /login, collect cookies)
//!     → session.rs SessionCredentials (cookies scoped to the upstream host)
//!     → client.rs fetch_* / upload_*  (cookies applied to each call)
//!     → types.rs payload or UpstreamError
//! ```
//!
//! # Constraints
//! - A resource call needs a `SessionCredentials`, which only a login yields
//! - Sessions live for one incoming request and are never cached
//! - Every call has a deadline; none is retried

pub mod client;
pub mod session;
pub mod types;

pub use client::UpstreamAccountingClient;
pub use session::SessionCredentials;
pub use types::{CompanyId, CompanyInfo, DocumentList, UpstreamError, UpstreamResult};
