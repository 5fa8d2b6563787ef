//! Build one `Player` from one raw record.

use serde_json::Value;

use super::{classify, ParseError};
use crate::models::{
    coerce_string, Player, PlayerId, Projection, ProjectionSource, RawIdentity, FREE_AGENT,
    RAW_PLAYER_ID, RAW_PLAYER_NAME, UNKNOWN_ID,
};

/// Build a player carrying a single projection stored under
/// `projection_source`.
///
/// Either the whole record builds or an error is returned; no partial
/// player is ever produced.
pub fn build_player(raw: &Value, projection_source: &str) -> Result<Player, ParseError> {
    let map = raw.as_object().ok_or_else(|| ParseError::Validation {
        field: "record",
        reason: format!("expected a JSON object, got {}", json_type(raw)),
    })?;

    let kind = classify(map)?;

    let identity = RawIdentity::from_raw(raw).map_err(invalid_record)?;
    let player_id = required(identity.player_id.as_ref(), RAW_PLAYER_ID, "player_id")?;
    let name = required(identity.name.as_ref(), RAW_PLAYER_NAME, "name")?;
    let team = identity.team.unwrap_or_else(|| FREE_AGENT.to_string());

    let mut player = Player::new(PlayerId::from(player_id), name, team, kind);
    player.mlbam_id = identity.mlbam_id.unwrap_or(UNKNOWN_ID);
    player.team_id = identity.team_id.unwrap_or(UNKNOWN_ID);
    player.league = identity.league;
    player.min_position = identity.min_position;
    player.adp = identity.adp;
    player.profile_url = identity.profile_url;

    let source = ProjectionSource::from_name(projection_source);
    let projection = Projection::from_raw(raw, kind, source).map_err(invalid_record)?;

    Ok(player.with_projection(projection_source, projection))
}

/// Resolve a required string field, reporting the canonical name on failure.
fn required(
    value: Option<&Value>,
    key: &str,
    field: &'static str,
) -> Result<String, ParseError> {
    match value {
        None => Err(ParseError::Validation {
            field,
            reason: format!("missing raw key `{}`", key),
        }),
        Some(value) => coerce_string(value).ok_or_else(|| ParseError::Validation {
            field,
            reason: format!("`{}` is {}", key, describe(value)),
        }),
    }
}

fn invalid_record(err: serde_json::Error) -> ParseError {
    ParseError::Validation {
        field: "record",
        reason: err.to_string(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(_) => "an empty string".to_string(),
        other => json_type(other).to_string(),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
