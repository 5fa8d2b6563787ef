use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fangraphs_extractor::config::AppConfig;
use fangraphs_extractor::fangraphs::{FangraphsClient, ProjectionSystem, ALL_POSITIONS};
use fangraphs_extractor::fetch::{Fetcher, FetcherConfig};
use fangraphs_extractor::models::EntityKind;
use fangraphs_extractor::parse::DEFAULT_PROJECTION_SOURCE;
use fangraphs_extractor::pipeline::{self, ExtractConfig, Extractor};
use fangraphs_extractor::storage::StorageConfig;

#[derive(Parser)]
#[command(name = "fangraphs-extractor")]
#[command(about = "Fetch FanGraphs player projections and write them as JSON")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error). Defaults to the config
    /// file's `log_level`
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch projections, merge them per player and write the output file
    Fetch {
        /// Projection system (repeatable)
        #[arg(long = "system", default_value = "steamer")]
        systems: Vec<String>,

        /// Batting position filter
        #[arg(long, default_value = ALL_POSITIONS)]
        position: String,

        /// Directory for the output file (default: data dir)
        #[arg(long)]
        output_dir: Option<String>,

        /// Keep at most this many players per fetched table
        #[arg(long)]
        sample_size: Option<usize>,

        /// Extra query parameter as key=value (repeatable); overrides the
        /// standard pos/stats/type parameters
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Fetch and parse but don't write
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse a saved API response
    Parse {
        /// Path to the JSON response
        path: String,

        /// Projection system name to store projections under
        #[arg(long, default_value = DEFAULT_PROJECTION_SOURCE)]
        source: String,

        /// Write serialized players here instead of printing a summary
        #[arg(long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting fangraphs-extractor v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Fetch {
            systems,
            position,
            output_dir,
            sample_size,
            params,
            dry_run,
        } => {
            let systems = systems
                .iter()
                .map(|s| s.parse::<ProjectionSystem>())
                .collect::<Result<Vec<_>, _>>()
                .context("Invalid --system")?;

            let fetcher = Fetcher::new(FetcherConfig {
                timeout: config.api.timeout(),
                user_agent: config.api.user_agent.clone(),
                ..Default::default()
            })
            .context("Failed to create fetcher")?;
            let client = FangraphsClient::new(fetcher, &config.api);

            let output_path = match output_dir {
                Some(dir) => PathBuf::from(dir).join(&config.output.file_name),
                None => storage.output_path(&config.output.file_name),
            };

            let extract_config = ExtractConfig {
                systems,
                position,
                sample_size,
                extra_params: params,
                output_path,
                dry_run,
            };

            let extractor = Extractor::new(extract_config, Arc::new(client));
            let result = extractor.run().await.context("Extraction failed")?;

            println!("\n=== Extraction Results ===");
            println!("Tables fetched:   {}", result.tables_fetched);
            println!("Tables failed:    {}", result.tables_failed);
            println!("Players parsed:   {}", result.players_parsed);
            println!("Players merged:   {}", result.players_merged);
            println!("Error records:    {}", result.error_records);
            println!(
                "Started:          {}",
                result.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Duration:         {:?}", result.duration);
            match &result.output_path {
                Some(path) => println!("Output:           {}", path.display()),
                None => println!("\n(dry run - no data written to disk)"),
            }
            if !result.errors.is_empty() {
                println!("\nErrors:");
                for err in &result.errors {
                    println!("  - {}", err);
                }
            }
        }
        Commands::Parse {
            path,
            source,
            output,
        } => {
            let path = PathBuf::from(path);
            match output {
                Some(output) => {
                    let records = pipeline::convert_file(&path, &source, &PathBuf::from(&output))
                        .with_context(|| format!("Failed to convert {}", path.display()))?;
                    println!("Wrote {} records to {}", records.len(), output);
                }
                None => {
                    let players = pipeline::parse_file(&path, &source)
                        .with_context(|| format!("Failed to parse {}", path.display()))?;
                    let batters = players
                        .iter()
                        .filter(|p| p.kind == EntityKind::Batter)
                        .count();

                    println!("\n=== Parse Results ===");
                    println!("Players:  {}", players.len());
                    println!("Batters:  {}", batters);
                    println!("Pitchers: {}", players.len() - batters);
                    for player in players.iter().take(5) {
                        println!(
                            "  - {} ({}, {}) -> {}",
                            player.name,
                            player.team,
                            player.kind,
                            player.stats_endpoint()
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Parse a `key=value` query parameter.
fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{}`", s)),
    }
}

/// Load the config file when present, else defaults. `--data-dir` wins.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = PathBuf::from(&cli.config);
    let mut config = if path.exists() {
        AppConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        AppConfig::default()
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("team=0").unwrap(),
            ("team".to_string(), "0".to_string())
        );
        assert_eq!(
            parse_param("players=0,1=x").unwrap(),
            ("players".to_string(), "0,1=x".to_string())
        );
        assert!(parse_param("team").is_err());
        assert!(parse_param("=0").is_err());
    }

    #[test]
    fn test_fetch_params_are_collected() {
        let cli = Cli::try_parse_from([
            "fangraphs-extractor",
            "fetch",
            "--param",
            "team=0",
            "--param",
            "lg=all",
        ])
        .unwrap();

        match cli.command {
            Commands::Fetch { params, systems, .. } => {
                assert_eq!(
                    params,
                    vec![
                        ("team".to_string(), "0".to_string()),
                        ("lg".to_string(), "all".to_string()),
                    ]
                );
                assert_eq!(systems, vec!["steamer".to_string()]);
            }
            Commands::Parse { .. } => panic!("expected fetch"),
        }
    }
}
