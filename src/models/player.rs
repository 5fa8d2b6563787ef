//! Player model.

use std::collections::BTreeMap;

use super::{EntityKind, PlayerId, Projection};
use crate::normalize::normalize_name;

/// One athlete for one season, with projections keyed by system name.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Team code, "FA" for free agents
    pub team: String,

    /// FanGraphs player id
    pub player_id: PlayerId,

    /// Display name, accents preserved
    pub name: String,

    /// MLB Advanced Media id (-1 when unknown)
    pub mlbam_id: i64,

    /// FanGraphs team id (-1 when unknown)
    pub team_id: i64,

    /// League code ("AL", "NL")
    pub league: Option<String>,

    /// Lowest-ranked eligible position
    pub min_position: Option<String>,

    /// Average draft position
    pub adp: Option<f64>,

    /// FanGraphs profile URL, usually absent for pitchers
    pub profile_url: Option<String>,

    /// Batter or pitcher
    pub kind: EntityKind,

    /// Projections keyed by projection-system name (e.g. "steamer")
    pub projections: BTreeMap<String, Projection>,
}

impl Player {
    /// Create a player with no optional fields and no projections.
    pub fn new(player_id: PlayerId, name: String, team: String, kind: EntityKind) -> Self {
        Self {
            team,
            player_id,
            name,
            mlbam_id: super::UNKNOWN_ID,
            team_id: super::UNKNOWN_ID,
            league: None,
            min_position: None,
            adp: None,
            profile_url: None,
            kind,
            projections: BTreeMap::new(),
        }
    }

    /// Builder method to set the profile URL.
    pub fn with_profile_url(mut self, url: String) -> Self {
        self.profile_url = Some(url);
        self
    }

    /// Builder method to attach a projection. Replaces any projection
    /// already stored under the same system name.
    pub fn with_projection(mut self, system: impl Into<String>, projection: Projection) -> Self {
        self.projections.insert(system.into(), projection);
        self
    }

    /// Name with diacritics removed.
    pub fn ascii_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// URL slug: ASCII name, lowercased, periods dropped, spaces to hyphens.
    pub fn slug(&self) -> String {
        self.ascii_name()
            .to_lowercase()
            .replace('.', "")
            .replace(' ', "-")
    }

    /// Path of the JSON stats resource for this player.
    ///
    /// Pitchers usually have no profile URL, so one is synthesized.
    /// `/players/corbin-carroll/25878/stats?position=OF` becomes
    /// `/players/corbin-carroll/25878/stats.json?position=OF`.
    pub fn stats_endpoint(&self) -> String {
        match self.profile_url.as_deref() {
            Some(url) if !url.is_empty() => url.replace("stats", "stats.json"),
            _ => format!(
                "/players/{}/{}/stats.json?position=P",
                self.slug(),
                self.player_id
            ),
        }
    }
}
