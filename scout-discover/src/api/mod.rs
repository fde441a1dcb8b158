//! HTTP API handlers for scout-discover
//!
//! REST endpoints under `/api` plus an SSE log stream and a health check.

pub mod health;
pub mod results;
pub mod saved;
pub mod search;
pub mod sse;

pub use health::health_routes;
pub use results::results_routes;
pub use saved::saved_routes;
pub use search::search_routes;
pub use sse::event_stream;
