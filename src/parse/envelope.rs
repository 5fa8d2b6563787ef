//! Response envelope detection and batch parsing.
//!
//! Three shapes are accepted, tried in order:
//! 1. the Next.js page-props response
//!    (`pageProps.dehydratedState.queries[0].state.data`)
//! 2. a bare array of player records
//! 3. a single player record

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::build::{build_player, json_type};
use super::ParseError;
use crate::models::{Player, RAW_PLAYER_NAME};

/// Top-level key of the page-props envelope.
const PAGE_PROPS_KEY: &str = "pageProps";

/// Only the first few records get per-record debug output.
const DETAILED_LOG_LIMIT: usize = 5;

enum Segment {
    Key(&'static str),
    Index(usize),
}

/// Location of the player list inside `pageProps`.
const PAGE_PROPS_DATA_PATH: &[Segment] = &[
    Segment::Key("dehydratedState"),
    Segment::Key("queries"),
    Segment::Index(0),
    Segment::Key("state"),
    Segment::Key("data"),
];

/// Locate the raw player records inside an envelope.
pub fn extract_records(envelope: &Value) -> Result<Vec<&Value>, ParseError> {
    match envelope {
        Value::Object(map) if map.contains_key(PAGE_PROPS_KEY) => {
            debug!("Handling API response structure with pageProps");
            let data = resolve_page_props(&map[PAGE_PROPS_KEY])?;
            Ok(data.iter().collect())
        }
        Value::Array(items) => {
            debug!("Handling list of player data, length: {}", items.len());
            Ok(items.iter().collect())
        }
        Value::Object(map) if map.contains_key(RAW_PLAYER_NAME) => {
            debug!("Handling single player data");
            Ok(vec![envelope])
        }
        Value::Object(map) => {
            debug!(
                "Keys in data: {:?}",
                map.keys().take(10).collect::<Vec<_>>()
            );
            Err(ParseError::UnrecognizedFormat {
                found: "an object without pageProps or PlayerName".to_string(),
            })
        }
        other => Err(ParseError::UnrecognizedFormat {
            found: json_type(other).to_string(),
        }),
    }
}

/// Walk the fixed path inside `pageProps`. Any missing segment fails the
/// whole envelope.
fn resolve_page_props(page_props: &Value) -> Result<&Vec<Value>, ParseError> {
    let mut current = page_props;
    let mut path = PAGE_PROPS_KEY.to_string();

    for segment in PAGE_PROPS_DATA_PATH {
        let next = match segment {
            Segment::Key(key) => {
                path.push('.');
                path.push_str(key);
                current.get(*key)
            }
            Segment::Index(index) => {
                path.push_str(&format!("[{}]", index));
                current.get(*index)
            }
        };

        current = match next {
            Some(value) => value,
            None => {
                if let Value::Object(map) = page_props {
                    debug!(
                        "Keys in pageProps: {:?}",
                        map.keys().collect::<Vec<_>>()
                    );
                }
                return Err(ParseError::Structural { path });
            }
        };
    }

    current
        .as_array()
        .ok_or(ParseError::Structural { path })
}

/// Parse every player record in an envelope.
///
/// A record that fails to build is logged and skipped; survivors keep their
/// input order. Only an envelope that cannot be unwrapped is an error.
pub fn parse_all(envelope: &Value, projection_source: &str) -> Result<Vec<Player>, ParseError> {
    let records = extract_records(envelope)?;
    let total = records.len();
    debug!("Found {} player records", total);

    let mut players = Vec::with_capacity(total);

    for (i, record) in records.into_iter().enumerate() {
        if i < DETAILED_LOG_LIMIT {
            debug!("Processing player {} of {}", i + 1, total);
            if let Value::Object(map) = record {
                debug!(
                    "Player data keys: {:?}",
                    map.keys().take(5).collect::<Vec<_>>()
                );
            }
        }

        match build_player(record, projection_source) {
            Ok(player) => {
                if i < DETAILED_LOG_LIMIT {
                    debug!("Successfully parsed player: {} ({})", player.name, player.kind);
                }
                players.push(player);
            }
            Err(e) => {
                warn!("Error parsing individual player {}: {}", i + 1, e);
            }
        }
    }

    info!(
        "Completed processing {} of {} players successfully",
        players.len(),
        total
    );
    Ok(players)
}

/// Like [`parse_all`], but an unusable envelope is logged and yields no
/// players.
pub fn parse_all_lenient(envelope: &Value, projection_source: &str) -> Vec<Player> {
    match parse_all(envelope, projection_source) {
        Ok(players) => players,
        Err(e) => {
            error!("Top-level error in parse_players: {}", e);
            Vec::new()
        }
    }
}
