//! HTTP server for the bucket organizer.
//!
//! Exposes the object operations of [`bko_service::BucketService`] as
//! `PUT`/`GET`/`DELETE /objects/:bucket_id/:object_id`, renders failures as
//! RFC 7807 problem details, and shuts down gracefully on SIGINT/SIGTERM.

pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod problem;
pub mod router;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig, Timeouts};
pub use error::{ServerError, ServerResult};
pub use problem::{ApiError, ProblemDetails};
pub use server::{shutdown_signal, BucketServer};
pub use state::AppState;
