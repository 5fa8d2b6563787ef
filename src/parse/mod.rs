//! Raw FanGraphs JSON to typed players.
//!
//! - **classify**: batter/pitcher decision from raw key presence
//! - **build**: one raw record to one `Player`
//! - **envelope**: response envelope detection and batch parsing
//! - **merge**: combine players parsed from several projection systems

pub mod build;
pub mod classify;
pub mod envelope;
pub mod merge;

pub use build::build_player;
pub use classify::classify;
pub use envelope::{extract_records, parse_all, parse_all_lenient};
pub use merge::merge_players;

use thiserror::Error;

/// Projection system assumed when none is given.
pub const DEFAULT_PROJECTION_SOURCE: &str = "steamer";

/// Errors raised while turning raw JSON into players.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Record carries neither the pitcher nor the batter key signature.
    #[error("Unknown player type from data: {keys:?}")]
    Classification { keys: Vec<String> },

    /// A required identity field could not be resolved.
    #[error("Invalid player record, field `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Envelope looked like a page-props response but the record list
    /// could not be located.
    #[error("Error unpacking API response structure at `{path}`")]
    Structural { path: String },

    /// Envelope matches none of the supported shapes.
    #[error("Unrecognized data format: {found}")]
    UnrecognizedFormat { found: String },
}

impl ParseError {
    /// True for errors that affect a single record only.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            ParseError::Classification { .. } | ParseError::Validation { .. }
        )
    }
}
