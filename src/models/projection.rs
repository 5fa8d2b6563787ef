//! Projection records.
//!
//! One `Projection` is one system's forecast for one player. The batter and
//! pitcher stat sets differ, so the stat block is a sum type; the projection
//! system that produced the numbers is recorded as a plain tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{deserialize_lenient_string, stat_line};

/// Whether a record describes a batter or a pitcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Batter,
    Pitcher,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Batter => write!(f, "batter"),
            EntityKind::Pitcher => write!(f, "pitcher"),
        }
    }
}

/// Projection system that produced a projection.
///
/// Only provenance: every variant carries the same fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionSource {
    #[default]
    Steamer,
    Atc,
    TheBat,
    /// Any system without a dedicated variant (ZiPS, Depth Charts, ...)
    Generic,
}

impl ProjectionSource {
    /// Resolve a projection-system name. Unknown names map to `Generic`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "steamer" => ProjectionSource::Steamer,
            "atc" => ProjectionSource::Atc,
            "the_bat" => ProjectionSource::TheBat,
            _ => ProjectionSource::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionSource::Steamer => "steamer",
            ProjectionSource::Atc => "atc",
            ProjectionSource::TheBat => "the_bat",
            ProjectionSource::Generic => "generic",
        }
    }
}

impl std::fmt::Display for ProjectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

stat_line! {
    /// Percentile buckets and fantasy points shared by batters and pitchers.
    pub struct CommonLine {
        q10 <= "q10",
        q20 <= "q20",
        q30 <= "q30",
        q40 <= "q40",
        q50 <= "q50",
        q60 <= "q60",
        q70 <= "q70",
        q80 <= "q80",
        q90 <= "q90",
        tt_q10 <= "tt_q10",
        tt_q20 <= "tt_q20",
        tt_q30 <= "tt_q30",
        tt_q40 <= "tt_q40",
        tt_q50 <= "tt_q50",
        tt_q60 <= "tt_q60",
        tt_q70 <= "tt_q70",
        tt_q80 <= "tt_q80",
        tt_q90 <= "tt_q90",
        fpts <= "FPTS",
        fpts_pa <= "FPTS_PA",
        fpts_ip <= "FPTS_IP",
        spts <= "SPTS",
        spts_pa <= "SPTS_PA",
        spts_ip <= "SPTS_IP",
    }
}

stat_line! {
    /// Batting projection.
    pub struct BatterLine {
        pa <= "PA",
        ab <= "AB",
        h <= "H",
        singles <= "1B",
        doubles <= "2B",
        triples <= "3B",
        hr <= "HR",
        r <= "R",
        rbi <= "RBI",
        bb <= "BB",
        ibb <= "IBB",
        so <= "SO",
        hbp <= "HBP",
        sf <= "SF",
        sh <= "SH",
        gdp <= "GDP",
        sb <= "SB",
        cs <= "CS",
        avg <= "AVG",
        obp <= "OBP",
        slg <= "SLG",
        ops <= "OPS",
        iso <= "ISO",
        babip <= "BABIP",
        woba <= "wOBA",
        wrc_plus <= "wRC+",
        bb_percent <= "BB%",
        k_percent <= "K%",
        spd <= "Spd",
        ubr <= "UBR",
        wsb <= "wSB",
        wrc <= "wRC",
        wraa <= "wRAA",
        off <= "Off",
        def <= "Def",
        bsr <= "BsR",
        fld <= "Fld",
        war <= "WAR",
    }
}

stat_line! {
    /// Pitching projection.
    pub struct PitcherLine {
        wins <= "W",
        losses <= "L",
        games_started <= "GS",
        games <= "G",
        saves <= "SV",
        holds <= "HLD",
        blown_saves <= "BS",
        innings_pitched <= "IP",
        total_batters_faced <= "TBF",
        hits <= "H",
        runs <= "R",
        earned_runs <= "ER",
        home_runs <= "HR",
        strikeouts <= "SO",
        walks <= "BB",
        intentional_walks <= "IBB",
        hit_by_pitch <= "HBP",
        era <= "ERA",
        whip <= "WHIP",
        k_per_9 <= "K/9",
        bb_per_9 <= "BB/9",
        k_per_bb <= "K/BB",
        hr_per_9 <= "HR/9",
        k_percent <= "K%",
        bb_percent <= "BB%",
        k_bb_percent <= "K-BB%",
        gb_percent <= "GB%",
        avg_against <= "AVG",
        babip <= "BABIP",
        lob_percent <= "LOB%",
        fip <= "FIP",
        war <= "WAR",
        ra9_war <= "RA9-WAR",
        quality_starts <= "QS",
        ra_talent_sd <= "ra_talent_sd",
        chance_ra_se <= "chance_ra_se",
        total_ra_se <= "total_ra_se",
    }
}

/// Kind-specific stat block.
#[derive(Debug, Clone, PartialEq)]
pub enum StatLine {
    Batter(BatterLine),
    Pitcher(PitcherLine),
}

impl StatLine {
    pub fn kind(&self) -> EntityKind {
        match self {
            StatLine::Batter(_) => EntityKind::Batter,
            StatLine::Pitcher(_) => EntityKind::Pitcher,
        }
    }

    fn fields(&self) -> Box<dyn Iterator<Item = (&'static str, Option<f64>)>> {
        match self {
            StatLine::Batter(line) => Box::new(line.fields()),
            StatLine::Pitcher(line) => Box::new(line.fields()),
        }
    }
}

/// Projection-level fields that are not stats.
#[derive(Debug, Default, Deserialize)]
struct ProjectionMeta {
    #[serde(rename = "Season", default, deserialize_with = "deserialize_lenient_string")]
    season: Option<String>,
}

/// One projection system's forecast for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub source: ProjectionSource,
    pub season: Option<String>,
    pub common: CommonLine,
    pub line: StatLine,
}

impl Projection {
    /// Read a projection of the given kind from a raw record.
    ///
    /// Unreadable values are left absent; only a non-object record fails.
    pub fn from_raw(
        raw: &Value,
        kind: EntityKind,
        source: ProjectionSource,
    ) -> Result<Self, serde_json::Error> {
        let line = match kind {
            EntityKind::Batter => StatLine::Batter(BatterLine::from_raw(raw)?),
            EntityKind::Pitcher => StatLine::Pitcher(PitcherLine::from_raw(raw)?),
        };

        Ok(Self {
            source,
            season: ProjectionMeta::deserialize(raw)?.season,
            common: CommonLine::from_raw(raw)?,
            line,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.line.kind()
    }

    pub fn as_batter(&self) -> Option<&BatterLine> {
        match &self.line {
            StatLine::Batter(line) => Some(line),
            StatLine::Pitcher(_) => None,
        }
    }

    pub fn as_pitcher(&self) -> Option<&PitcherLine> {
        match &self.line {
            StatLine::Pitcher(line) => Some(line),
            StatLine::Batter(_) => None,
        }
    }

    /// All numeric fields, common block first, then the stat block.
    pub fn stats(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> {
        self.common.fields().chain(self.line.fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_from_name() {
        assert_eq!(ProjectionSource::from_name("steamer"), ProjectionSource::Steamer);
        assert_eq!(ProjectionSource::from_name("STEAMER"), ProjectionSource::Steamer);
        assert_eq!(ProjectionSource::from_name("Atc"), ProjectionSource::Atc);
        assert_eq!(ProjectionSource::from_name("the_bat"), ProjectionSource::TheBat);
        assert_eq!(ProjectionSource::from_name("zips"), ProjectionSource::Generic);
        assert_eq!(ProjectionSource::from_name(""), ProjectionSource::Generic);
    }

    #[test]
    fn test_batter_projection_from_raw() {
        let raw = json!({
            "Season": 2025,
            "PA": 657.643,
            "AB": 580.1,
            "HR": 25.3512,
            "RBI": 80,
            "wRC+": "128.79",
            "K%": "bogus",
            "q50": 0.357,
            "FPTS": 512.5,
        });
        let proj =
            Projection::from_raw(&raw, EntityKind::Batter, ProjectionSource::Steamer).unwrap();

        assert_eq!(proj.kind(), EntityKind::Batter);
        assert_eq!(proj.season.as_deref(), Some("2025"));
        assert_eq!(proj.common.q50, Some(0.357));
        assert_eq!(proj.common.fpts, Some(512.5));

        let line = proj.as_batter().unwrap();
        assert_eq!(line.pa, Some(657.643));
        assert_eq!(line.hr, Some(25.3512));
        assert_eq!(line.wrc_plus, Some(128.79));
        assert_eq!(line.k_percent, None);
        assert_eq!(line.sb, None);
        assert!(proj.as_pitcher().is_none());
    }

    #[test]
    fn test_pitcher_projection_reads_shared_raw_keys() {
        // "H", "HR" and "AVG" are pitcher stats against when the record is a pitcher
        let raw = json!({"W": 13.1876, "L": 8.65, "ERA": 2.79, "H": 140.0, "AVG": 0.21, "K/9": 11.54});
        let proj = Projection::from_raw(&raw, EntityKind::Pitcher, ProjectionSource::Atc).unwrap();

        let line = proj.as_pitcher().unwrap();
        assert_eq!(line.wins, Some(13.1876));
        assert_eq!(line.hits, Some(140.0));
        assert_eq!(line.avg_against, Some(0.21));
        assert_eq!(line.k_per_9, Some(11.54));
        assert_eq!(proj.source, ProjectionSource::Atc);
    }

    #[test]
    fn test_stats_iterates_common_then_line() {
        let raw = json!({"W": 1.0, "L": 2.0, "ERA": 3.0, "q10": 0.5});
        let proj =
            Projection::from_raw(&raw, EntityKind::Pitcher, ProjectionSource::Generic).unwrap();

        let present: Vec<&str> = proj
            .stats()
            .filter_map(|(name, value)| value.map(|_| name))
            .collect();
        assert_eq!(present, vec!["q10", "wins", "losses", "era"]);
    }

    #[test]
    fn test_symbol_keys_map_to_canonical_fields() {
        let raw = json!({"wRC+": 128.79, "BB%": "0.105", "1B": 101.0});
        let line = BatterLine::from_raw(&raw).unwrap();
        assert_eq!(line.wrc_plus, Some(128.79));
        assert_eq!(line.bb_percent, Some(0.105));
        assert_eq!(line.singles, Some(101.0));

        let raw = json!({"K-BB%": 0.2, "RA9-WAR": 5.1, "K/9": 11.5});
        let line = PitcherLine::from_raw(&raw).unwrap();
        assert_eq!(line.k_bb_percent, Some(0.2));
        assert_eq!(line.ra9_war, Some(5.1));
        assert_eq!(line.k_per_9, Some(11.5));

        assert_eq!(CommonLine::default().fields().count(), 24);
    }

    #[test]
    fn test_non_object_record_is_an_error() {
        assert!(Projection::from_raw(&json!([1, 2]), EntityKind::Batter, ProjectionSource::Steamer)
            .is_err());
    }

    #[test]
    fn test_entity_kind_serialization() {
        assert_eq!(serde_json::to_string(&EntityKind::Pitcher).unwrap(), "\"pitcher\"");
        assert_eq!(format!("{}", EntityKind::Batter), "batter");
    }
}
