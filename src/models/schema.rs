//! Raw FanGraphs record schema.
//!
//! FanGraphs keys its JSON with display headers ("PlayerName", "K/9",
//! "wRC+"). Raw records are decoded with serde: every canonical field names
//! its raw key in a `rename` and goes through one of the lenient
//! deserializers below, so a malformed value is treated as absent instead of
//! failing the record. Raw keys without a field are ignored.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Raw key of the player name; also used to spot a bare single record.
pub const RAW_PLAYER_NAME: &str = "PlayerName";

/// Raw key of the FanGraphs player id.
pub const RAW_PLAYER_ID: &str = "playerid";

/// Raw keys that must all be present for a record to be a pitcher.
pub const PITCHER_SIGNATURE: [&str; 3] = ["W", "L", "ERA"];

/// Raw keys that must all be present for a record to be a batter.
pub const BATTER_SIGNATURE: [&str; 3] = ["AB", "PA", "RBI"];

/// Team code used when FanGraphs reports no team.
pub const FREE_AGENT: &str = "FA";

/// Sentinel for missing integer ids.
pub const UNKNOWN_ID: i64 = -1;

/// Identity fields of a raw record.
///
/// `player_id` and `name` keep the raw value so the builder can tell a
/// missing key from a null one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIdentity {
    #[serde(rename = "playerid", default, deserialize_with = "deserialize_present")]
    pub player_id: Option<Value>,

    #[serde(rename = "PlayerName", default, deserialize_with = "deserialize_present")]
    pub name: Option<Value>,

    #[serde(rename = "Team", default, deserialize_with = "deserialize_lenient_string")]
    pub team: Option<String>,

    #[serde(rename = "xMLBAMID", default, deserialize_with = "deserialize_lenient_i64")]
    pub mlbam_id: Option<i64>,

    #[serde(rename = "teamid", default, deserialize_with = "deserialize_lenient_i64")]
    pub team_id: Option<i64>,

    #[serde(rename = "League", default, deserialize_with = "deserialize_lenient_string")]
    pub league: Option<String>,

    #[serde(rename = "minpos", default, deserialize_with = "deserialize_lenient_string")]
    pub min_position: Option<String>,

    #[serde(rename = "ADP", default, deserialize_with = "deserialize_lenient_f64")]
    pub adp: Option<f64>,

    #[serde(rename = "UPURL", default, deserialize_with = "deserialize_lenient_string")]
    pub profile_url: Option<String>,
}

impl RawIdentity {
    pub fn from_raw(raw: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(raw)
    }
}

/// Best-effort numeric coercion. Numbers and numeric strings are accepted,
/// everything else (including NaN and infinities) is treated as absent.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Integer coercion for ids. Whole floats (`682998.0`) are accepted.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String coercion. Numbers are rendered, empty strings count as absent.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: Option<Value> = Option::deserialize(deserializer)?;
    Ok(val.as_ref().and_then(coerce_f64))
}

pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: Option<Value> = Option::deserialize(deserializer)?;
    Ok(val.as_ref().and_then(coerce_i64))
}

pub fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: Option<Value> = Option::deserialize(deserializer)?;
    Ok(val.as_ref().and_then(coerce_string))
}

/// `Some` whenever the key is present, `Value::Null` included. Pair with
/// `default` so a missing key stays `None`.
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Declare a block of optional numeric projection fields together with the
/// raw key each one is read from.
///
/// Generates the struct with a lenient serde mapping, a `from_raw`
/// constructor and a `fields` iterator in declaration order.
macro_rules! stat_line {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $field:ident <= $raw:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
        pub struct $name {
            $(
                #[serde(
                    rename = $raw,
                    default,
                    deserialize_with = "crate::models::deserialize_lenient_f64"
                )]
                pub $field: Option<f64>,
            )*
        }

        impl $name {
            /// Read every mapped field from a raw record.
            pub fn from_raw(raw: &serde_json::Value) -> Result<Self, serde_json::Error> {
                <Self as serde::Deserialize>::deserialize(raw)
            }

            /// Canonical field names with their values, in declaration order.
            pub fn fields(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> {
                [ $( (stringify!($field), self.$field), )* ].into_iter()
            }
        }
    };
}

pub(crate) use stat_line;

/// True if every key is present in the raw record.
pub(crate) fn has_all(raw: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|k| raw.contains_key(*k))
}
