//! Merge players parsed from several projection systems.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{EntityKind, Player, PlayerId};

/// Combine players that share a FanGraphs id and entity kind.
///
/// The first occurrence supplies the identity fields and fixes the output
/// position; projections from later occurrences are added to it, replacing
/// any projection already stored under the same system name. A two-way
/// player keeps separate batter and pitcher entries.
pub fn merge_players(players: Vec<Player>) -> Vec<Player> {
    let mut merged: Vec<Player> = Vec::with_capacity(players.len());
    let mut index: HashMap<(PlayerId, EntityKind), usize> = HashMap::new();

    for player in players {
        let key = (player.player_id.clone(), player.kind);
        match index.get(&key).copied() {
            Some(pos) => {
                let target = &mut merged[pos];
                for (system, projection) in player.projections {
                    debug!("Merging {} projection into {}", system, target.name);
                    target.projections.insert(system, projection);
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(player);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Projection, ProjectionSource};
    use serde_json::json;

    fn player(id: &str, name: &str, kind: EntityKind, system: &str) -> Player {
        let raw = json!({"W": 10.0, "L": 5.0, "ERA": 3.5, "AB": 500.0, "PA": 550.0, "RBI": 70.0});
        let projection = Projection::from_raw(
            &raw,
            kind,
            ProjectionSource::from_name(system),
        )
        .unwrap();
        Player::new(PlayerId::from(id), name.to_string(), "LAD".to_string(), kind)
            .with_projection(system, projection)
    }

    #[test]
    fn test_merges_systems_for_same_player() {
        let players = vec![
            player("1", "A", EntityKind::Batter, "steamer"),
            player("2", "B", EntityKind::Batter, "steamer"),
            player("1", "A", EntityKind::Batter, "atc"),
        ];

        let merged = merge_players(players);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "A");
        assert_eq!(merged[1].name, "B");

        let systems: Vec<&str> = merged[0].projections.keys().map(|k| k.as_str()).collect();
        assert_eq!(systems, vec!["atc", "steamer"]);
    }

    #[test]
    fn test_same_system_overwrites() {
        let first = player("1", "A", EntityKind::Pitcher, "steamer");
        let mut second = player("1", "A", EntityKind::Pitcher, "steamer");
        second.projections.get_mut("steamer").unwrap().season = Some("2026".to_string());

        let merged = merge_players(vec![first, second]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].projections.len(), 1);
        assert_eq!(merged[0].projections["steamer"].season.as_deref(), Some("2026"));
    }

    #[test]
    fn test_two_way_player_stays_split() {
        let merged = merge_players(vec![
            player("19755", "Shohei Ohtani", EntityKind::Batter, "steamer"),
            player("19755", "Shohei Ohtani", EntityKind::Pitcher, "steamer"),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].kind, EntityKind::Batter);
        assert_eq!(merged[1].kind, EntityKind::Pitcher);
    }

    #[test]
    fn test_empty() {
        assert!(merge_players(Vec::new()).is_empty());
    }
}
