//! # FanGraphs Extractor
//!
//! Fetches baseball player projections from FanGraphs and writes them out
//! as normalized JSON.
//!
//! ## Architecture
//!
//! - **models**: Players, projections and the raw record schema
//! - **parse**: Envelope unwrapping, batter/pitcher classification, merging
//! - **fangraphs**: Projections API client
//! - **fetch**: JSON-over-HTTP fetching
//! - **storage**: Output records and JSON file writing
//! - **pipeline**: End-to-end extraction runs
//! - **config**: Configuration loading and validation

pub mod config;
pub mod fangraphs;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod storage;

pub use models::*;
