//! HTTP boundary: job submission, polling, artifact retrieval.
//!
//! Everything here is thin glue over [`crate::registry::JobRegistry`] and the
//! output directory; no pipeline logic lives at this layer.

pub mod handlers;
pub mod server;

pub use server::start_http_server;
