//! Player to output-record conversion.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::models::{EntityKind, Player, Projection};

/// Only the first few players get per-player debug output.
const DETAILED_LOG_LIMIT: usize = 5;

/// Progress is logged once per this many players.
const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("projection `{system}` has a non-finite value for `{field}`")]
    NonFinite { system: String, field: &'static str },
}

/// One entry of the output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlayerRecord {
    Full {
        name: String,
        ascii_name: String,
        team: String,
        player_id: String,
        mlbam_id: i64,
        team_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        league: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_position: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        adp: Option<f64>,
        kind: EntityKind,
        slug: String,
        stats_endpoint: String,
        projections: Map<String, Value>,
    },
    /// Stand-in for a player that could not be represented.
    Error {
        name: String,
        ascii_name: String,
        error: String,
    },
}

impl PlayerRecord {
    pub fn is_error(&self) -> bool {
        matches!(self, PlayerRecord::Error { .. })
    }
}

/// Convert players to output records, one per player, in order.
///
/// A player that cannot be represented becomes an error stub; the rest of
/// the batch is unaffected.
pub fn serialize_players(players: &[Player]) -> Vec<PlayerRecord> {
    debug!("Starting serialization of {} players", players.len());

    let mut records = Vec::with_capacity(players.len());

    for (i, player) in players.iter().enumerate() {
        if i < DETAILED_LOG_LIMIT {
            debug!(
                "Processing player {}: {} ({} projections)",
                i + 1,
                player.name,
                player.projections.len()
            );
        }

        let record = serialize_player(player).unwrap_or_else(|e| {
            error!("Error serializing player {}: {}", i + 1, e);
            PlayerRecord::Error {
                name: player.name.clone(),
                ascii_name: player.ascii_name(),
                error: e.to_string(),
            }
        });
        records.push(record);

        if i % PROGRESS_INTERVAL == 0 {
            info!("Serialized {}/{} players", i + 1, players.len());
        }
    }

    info!("Completed serialization with {} results", records.len());
    records
}

/// Convert a single player.
pub fn serialize_player(player: &Player) -> Result<PlayerRecord, SerializeError> {
    let mut projections = Map::new();
    for (system, projection) in &player.projections {
        projections.insert(
            system.clone(),
            Value::Object(flatten_projection(system, projection)?),
        );
    }

    Ok(PlayerRecord::Full {
        name: player.name.clone(),
        ascii_name: player.ascii_name(),
        team: player.team.clone(),
        player_id: player.player_id.to_string(),
        mlbam_id: player.mlbam_id,
        team_id: player.team_id,
        league: player.league.clone(),
        min_position: player.min_position.clone(),
        adp: player.adp.filter(|adp| adp.is_finite()),
        kind: player.kind,
        slug: player.slug(),
        stats_endpoint: player.stats_endpoint(),
        projections,
    })
}

/// Flat map of the present projection fields under canonical names.
fn flatten_projection(
    system: &str,
    projection: &Projection,
) -> Result<Map<String, Value>, SerializeError> {
    let mut out = Map::new();

    if let Some(season) = &projection.season {
        out.insert("season".to_string(), Value::String(season.clone()));
    }

    for (field, value) in projection.stats() {
        let Some(value) = value else { continue };
        let number = Number::from_f64(value).ok_or_else(|| SerializeError::NonFinite {
            system: system.to_string(),
            field,
        })?;
        out.insert(field.to_string(), Value::Number(number));
    }

    Ok(out)
}
