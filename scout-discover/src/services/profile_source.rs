//! Profile source abstraction
//!
//! The discovery engine never talks to the network directly. It resolves
//! identities and neighbor lists through a `ProfileSource`, which owns
//! whatever shared session handle the backend needs (an HTTP client for
//! `UggSource`, nothing at all for the scripted test source).

use async_trait::async_trait;
use scout_common::Identity;
use thiserror::Error;

use crate::models::{Candidate, PlayerRecord, Region};

/// Profile source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of player profiles and neighbor listings
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Resolve one identity to a profile.
    ///
    /// `Ok(None)` means the profile does not exist or is not viewable.
    async fn fetch_profile(
        &self,
        region: Region,
        identity: &Identity,
    ) -> Result<Option<PlayerRecord>, SourceError>;

    /// Co-participants from the identity's recent activity, in page order.
    ///
    /// Candidates may carry game-type and activity hints.
    async fn fetch_neighbors(
        &self,
        region: Region,
        identity: &Identity,
    ) -> Result<Vec<Candidate>, SourceError>;

    /// Release the shared session handle.
    ///
    /// A later fetch must transparently create a fresh one.
    async fn shutdown(&self);
}
