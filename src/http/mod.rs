//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, metrics)
//!     → accounting.rs (resolve company, log in upstream, call upstream)
//!     → response.rs (map errors to JSON bodies)
//!     → Send to client
//! ```

pub mod accounting;
pub mod health;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer, ServerError};
