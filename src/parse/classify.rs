//! Record classification.

use serde_json::{Map, Value};

use super::ParseError;
use crate::models::{has_all, EntityKind, BATTER_SIGNATURE, PITCHER_SIGNATURE};

/// Number of raw keys reported when a record cannot be classified.
const DIAGNOSTIC_KEY_COUNT: usize = 10;

/// Decide whether a raw record is a pitcher or a batter.
///
/// The pitcher signature wins when both are present. Only key presence is
/// checked; values are never inspected.
pub fn classify(raw: &Map<String, Value>) -> Result<EntityKind, ParseError> {
    if has_all(raw, &PITCHER_SIGNATURE) {
        Ok(EntityKind::Pitcher)
    } else if has_all(raw, &BATTER_SIGNATURE) {
        Ok(EntityKind::Batter)
    } else {
        Err(ParseError::Classification {
            keys: raw.keys().take(DIAGNOSTIC_KEY_COUNT).cloned().collect(),
        })
    }
}
