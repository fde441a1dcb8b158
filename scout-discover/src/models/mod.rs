//! Data models for scout-discover
//!
//! - Player records and neighbor candidates
//! - Session filter options and region codes
//! - Discovery session state machine

pub mod filter_options;
pub mod player;
pub mod region;
pub mod session;

pub use filter_options::{FilterOptions, GameTypeFilter};
pub use player::{Candidate, LastActivity, PlayerRecord};
pub use region::Region;
pub use session::{DiscoveryState, SessionState};
