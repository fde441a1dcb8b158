//! Service modules for player discovery
//!
//! - Filtering, storage and batch fetching
//! - The discovery engine driving a session
//! - Profile sources (trait plus the u.gg-backed implementation)

pub mod batch_fetcher;
pub mod discovery_engine;
pub mod filter_pipeline;
pub mod page_extract;
pub mod profile_source;
pub mod result_store;
pub mod ugg_source;

pub use batch_fetcher::{BatchFetcher, BatchSummary, CHUNK_WIDTH, INTER_CHUNK_DELAY};
pub use discovery_engine::{DiscoveryConfig, DiscoveryEngine, DEFAULT_OUTPUT};
pub use filter_pipeline::FilterPipeline;
pub use profile_source::{ProfileSource, SourceError};
pub use result_store::{ResultStore, SeenSet};
pub use ugg_source::UggSource;
