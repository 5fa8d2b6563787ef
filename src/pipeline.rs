//! Extraction pipeline.
//!
//! Coordinates one extraction run:
//! 1. Fetch batting and pitching tables for each projection system
//! 2. Parse each table into players
//! 3. Merge players that appear under several systems
//! 4. Serialize and write the output file

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::fangraphs::{ProjectionFetcher, ProjectionSystem, StatGroup, ALL_POSITIONS};
use crate::models::Player;
use crate::parse::{self, merge_players, ParseError};
use crate::storage::{serialize_players, write_json, PlayerRecord, StorageError};

/// Errors that end a run. Fetch and per-table parse problems are logged and
/// collected in `ExtractResult::errors` instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path:?}: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("No projection systems requested")]
    NoSystems,
}

/// Configuration for an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub systems: Vec<ProjectionSystem>,

    /// Batting position filter; pitching tables are always requested for
    /// all positions
    pub position: String,

    /// Keep at most this many players from each fetched table
    pub sample_size: Option<usize>,

    /// Extra query parameters passed with every request
    pub extra_params: Vec<(String, String)>,

    pub output_path: PathBuf,

    /// Fetch and parse but don't write
    pub dry_run: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            systems: vec![ProjectionSystem::Steamer],
            position: ALL_POSITIONS.to_string(),
            sample_size: None,
            extra_params: Vec::new(),
            output_path: PathBuf::from("./data/fangraph_players.json"),
            dry_run: false,
        }
    }
}

/// Result of an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractResult {
    pub started_at: DateTime<Utc>,
    pub tables_fetched: u32,
    pub tables_failed: u32,
    pub players_parsed: usize,
    pub players_merged: usize,
    pub records_written: usize,
    pub error_records: usize,
    pub output_path: Option<PathBuf>,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// Runs extractions against a projection source.
pub struct Extractor {
    config: ExtractConfig,
    fetcher: Arc<dyn ProjectionFetcher>,
}

impl Extractor {
    pub fn new(config: ExtractConfig, fetcher: Arc<dyn ProjectionFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Run a single extraction.
    pub async fn run(&self) -> Result<ExtractResult, PipelineError> {
        if self.config.systems.is_empty() {
            return Err(PipelineError::NoSystems);
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let mut errors = Vec::new();
        let mut tables_fetched = 0;
        let mut tables_failed = 0;
        let mut players: Vec<Player> = Vec::new();

        for &system in &self.config.systems {
            for (group, position) in [
                (StatGroup::Batting, self.config.position.as_str()),
                (StatGroup::Pitching, ALL_POSITIONS),
            ] {
                match self.fetch_table(group, position, system).await {
                    Ok(mut table) => {
                        tables_fetched += 1;
                        if let Some(limit) = self.config.sample_size {
                            table.truncate(limit);
                        }
                        info!(
                            "{} {}: {} players",
                            system,
                            group,
                            table.len()
                        );
                        players.extend(table);
                    }
                    Err(message) => {
                        tables_failed += 1;
                        warn!("{}", message);
                        errors.push(message);
                    }
                }
            }
        }

        let players_parsed = players.len();
        let merged = merge_players(players);
        info!(
            "Merged {} parsed players into {}",
            players_parsed,
            merged.len()
        );

        let records = serialize_players(&merged);
        let error_records = records.iter().filter(|r| r.is_error()).count();

        let (records_written, output_path) = if self.config.dry_run {
            info!("Dry run, skipping write of {} records", records.len());
            (0, None)
        } else {
            let written = write_json(&records, &self.config.output_path)?;
            (written, Some(self.config.output_path.clone()))
        };

        Ok(ExtractResult {
            started_at,
            tables_fetched,
            tables_failed,
            players_parsed,
            players_merged: merged.len(),
            records_written,
            error_records,
            output_path,
            errors,
            duration: start.elapsed(),
        })
    }

    /// Fetch and parse one table. A missing response or an envelope that
    /// holds no records comes back as an error message.
    async fn fetch_table(
        &self,
        group: StatGroup,
        position: &str,
        system: ProjectionSystem,
    ) -> Result<Vec<Player>, String> {
        let envelope = self
            .fetcher
            .fetch_projections(group, position, system, &self.config.extra_params)
            .await
            .ok_or_else(|| format!("No data for {} {} projections", system, group))?;
        parse::parse_all(&envelope, system.source_key())
            .map_err(|e| format!("{} {}: {}", system, group, e))
    }
}

/// Parse a saved API response from disk.
pub fn parse_file(path: &Path, source: &str) -> Result<Vec<Player>, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: Value =
        serde_json::from_str(&text).map_err(|source| PipelineError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(parse::parse_all(&envelope, source)?)
}

/// Parse a saved API response and write the serialized players.
pub fn convert_file(
    input: &Path,
    source: &str,
    output: &Path,
) -> Result<Vec<PlayerRecord>, PipelineError> {
    let players = merge_players(parse_file(input, source)?);
    let records = serialize_players(&players);
    write_json(&records, output)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fangraphs::MockFetcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn load_fixture(name: &str) -> Value {
        let text = std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    fn page_props(data: Value) -> Value {
        json!({
            "pageProps": {"dehydratedState": {"queries": [{"state": {"data": data}}]}}
        })
    }

    fn test_config(temp_dir: &TempDir) -> ExtractConfig {
        ExtractConfig {
            output_path: temp_dir.path().join("out").join("fangraph_players.json"),
            ..ExtractConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_writes_batters_and_pitchers() {
        let temp_dir = TempDir::new().unwrap();
        let pitchers = page_props(json!([load_fixture("pitcher_steamer.json")]));
        let fetcher = MockFetcher::new()
            .with_response(
                StatGroup::Batting,
                ProjectionSystem::Steamer,
                load_fixture("hitter_projections.json"),
            )
            .with_response(StatGroup::Pitching, ProjectionSystem::Steamer, pitchers);

        let config = test_config(&temp_dir);
        let output_path = config.output_path.clone();
        let extractor = Extractor::new(config, Arc::new(fetcher));
        let result = extractor.run().await.unwrap();

        assert_eq!(result.tables_fetched, 2);
        assert_eq!(result.tables_failed, 0);
        assert_eq!(result.players_parsed, 6);
        assert_eq!(result.records_written, 6);
        assert_eq!(result.error_records, 0);
        assert_eq!(result.output_path.as_deref(), Some(output_path.as_path()));
        assert!(result.started_at <= Utc::now());

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        let entries = written.as_array().unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0]["name"], "Bobby Witt Jr.");
        assert_eq!(entries[5]["name"], "Paul Skenes");
        assert_eq!(entries[5]["kind"], "pitcher");
        assert!(entries[5]["projections"]["steamer"]["era"].is_number());
    }

    #[tokio::test]
    async fn test_systems_are_merged_per_player() {
        let temp_dir = TempDir::new().unwrap();
        let hitters = load_fixture("hitter_projections.json");
        let fetcher = MockFetcher::new()
            .with_response(StatGroup::Batting, ProjectionSystem::Steamer, hitters.clone())
            .with_response(StatGroup::Batting, ProjectionSystem::TheBat, hitters);

        let mut config = test_config(&temp_dir);
        config.systems = vec![ProjectionSystem::Steamer, ProjectionSystem::TheBat];
        let extractor = Extractor::new(config, Arc::new(fetcher));
        let result = extractor.run().await.unwrap();

        assert_eq!(result.players_parsed, 10);
        assert_eq!(result.players_merged, 5);
        assert_eq!(result.tables_failed, 2);

        let written: Value = serde_json::from_str(
            &std::fs::read_to_string(result.output_path.unwrap()).unwrap(),
        )
        .unwrap();
        let systems: Vec<&String> = written[0]["projections"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(systems, vec!["steamer", "the_bat"]);
    }

    #[tokio::test]
    async fn test_sample_size_limits_each_table() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new().with_response(
            StatGroup::Batting,
            ProjectionSystem::Steamer,
            load_fixture("hitter_projections.json"),
        );

        let mut config = test_config(&temp_dir);
        config.sample_size = Some(2);
        let extractor = Extractor::new(config, Arc::new(fetcher));
        let result = extractor.run().await.unwrap();

        assert_eq!(result.players_parsed, 2);
        assert_eq!(result.records_written, 2);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new().with_response(
            StatGroup::Batting,
            ProjectionSystem::Steamer,
            load_fixture("hitter_projections.json"),
        );

        let mut config = test_config(&temp_dir);
        config.dry_run = true;
        let output_path = config.output_path.clone();
        let extractor = Extractor::new(config, Arc::new(fetcher));
        let result = extractor.run().await.unwrap();

        assert_eq!(result.players_merged, 5);
        assert_eq!(result.records_written, 0);
        assert!(result.output_path.is_none());
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn test_position_applies_to_batting_only() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new());

        let mut config = test_config(&temp_dir);
        config.position = "ss".to_string();
        let extractor = Extractor::new(config, fetcher.clone());
        let result = extractor.run().await.unwrap();

        assert_eq!(result.tables_failed, 2);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(
            fetcher.calls(),
            vec![
                (StatGroup::Batting, "ss".to_string(), ProjectionSystem::Steamer),
                (StatGroup::Pitching, "all".to_string(), ProjectionSystem::Steamer),
            ]
        );
    }

    #[tokio::test]
    async fn test_broken_envelope_counts_as_failed_table() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new()
            .with_response(
                StatGroup::Batting,
                ProjectionSystem::Steamer,
                json!({"pageProps": {"dehydratedState": {"queries": []}}}),
            )
            .with_response(
                StatGroup::Pitching,
                ProjectionSystem::Steamer,
                page_props(json!([load_fixture("pitcher_steamer.json")])),
            );

        let extractor = Extractor::new(test_config(&temp_dir), Arc::new(fetcher));
        let result = extractor.run().await.unwrap();

        assert_eq!(result.tables_fetched, 1);
        assert_eq!(result.tables_failed, 1);
        assert_eq!(result.players_parsed, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("steamer bat: "));
    }

    #[tokio::test]
    async fn test_unrecognized_envelope_counts_as_failed_table() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new()
            .with_response(StatGroup::Batting, ProjectionSystem::Steamer, json!("oops"))
            .with_response(StatGroup::Pitching, ProjectionSystem::Steamer, json!(42));

        let extractor = Extractor::new(test_config(&temp_dir), Arc::new(fetcher));
        let result = extractor.run().await.unwrap();

        assert_eq!(result.tables_fetched, 0);
        assert_eq!(result.tables_failed, 2);
        assert_eq!(result.records_written, 0);
        assert_eq!(
            result
                .errors
                .iter()
                .map(|e| e.split(':').next().unwrap())
                .collect::<Vec<_>>(),
            vec!["steamer bat", "steamer pit"]
        );
    }

    #[tokio::test]
    async fn test_no_systems_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.systems.clear();

        let extractor = Extractor::new(config, Arc::new(MockFetcher::new()));
        assert!(matches!(
            extractor.run().await,
            Err(PipelineError::NoSystems)
        ));
    }

    #[test]
    fn test_convert_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("players.json");

        let records = convert_file(
            Path::new("tests/fixtures/hitter_projections.json"),
            "steamer",
            &output,
        )
        .unwrap();

        assert_eq!(records.len(), 5);
        assert!(output.exists());
    }

    #[test]
    fn test_parse_file_missing() {
        let result = parse_file(Path::new("tests/fixtures/does_not_exist.json"), "steamer");
        assert!(matches!(result, Err(PipelineError::Read { .. })));
    }
}
