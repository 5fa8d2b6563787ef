//! FanGraphs projections API client.
//!
//! Projections are served through the site's Next.js data route, so the
//! endpoint embeds a build id that changes whenever the site is deployed.
//! All FanGraphs specifics live in this module.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::fetch::{FetchError, Fetcher};

/// Positions accepted for batting requests.
pub const BATTING_POSITIONS: &[&str] = &[
    "all", "c", "1b", "2b", "3b", "ss", "lf", "cf", "rf", "of", "dh",
];

/// Position filter meaning "no filter".
pub const ALL_POSITIONS: &str = "all";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid stat group: {0}")]
    InvalidStatGroup(String),

    #[error("Invalid position `{position}` for stat group `{group}`")]
    InvalidPosition { group: StatGroup, position: String },

    #[error("Invalid projection system: {0}")]
    InvalidProjectionSystem(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Which projection table to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatGroup {
    Batting,
    Pitching,
    Starters,
    Relievers,
}

impl StatGroup {
    /// Value of the `stats` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatGroup::Batting => "bat",
            StatGroup::Pitching => "pit",
            StatGroup::Starters => "sta",
            StatGroup::Relievers => "rel",
        }
    }

    pub fn is_batting(&self) -> bool {
        matches!(self, StatGroup::Batting)
    }

    /// Check a position filter against this group. Pitching groups only
    /// accept `all`.
    pub fn validate_position(&self, position: &str) -> Result<(), ClientError> {
        let valid = if self.is_batting() {
            BATTING_POSITIONS.contains(&position)
        } else {
            position == ALL_POSITIONS
        };

        if valid {
            Ok(())
        } else {
            Err(ClientError::InvalidPosition {
                group: *self,
                position: position.to_string(),
            })
        }
    }
}

impl FromStr for StatGroup {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bat" => Ok(StatGroup::Batting),
            "pit" => Ok(StatGroup::Pitching),
            "sta" => Ok(StatGroup::Starters),
            "rel" => Ok(StatGroup::Relievers),
            other => Err(ClientError::InvalidStatGroup(other.to_string())),
        }
    }
}

impl std::fmt::Display for StatGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projection systems published by FanGraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionSystem {
    Steamer,
    Zips,
    ZipsDepthCharts,
    Atc,
    TheBat,
    TheBatX,
    DepthCharts,
}

impl ProjectionSystem {
    pub const ALL: &'static [ProjectionSystem] = &[
        ProjectionSystem::Steamer,
        ProjectionSystem::Zips,
        ProjectionSystem::ZipsDepthCharts,
        ProjectionSystem::Atc,
        ProjectionSystem::TheBat,
        ProjectionSystem::TheBatX,
        ProjectionSystem::DepthCharts,
    ];

    /// Value of the `type` query parameter.
    pub fn api_type(&self) -> &'static str {
        match self {
            ProjectionSystem::Steamer => "steamer",
            ProjectionSystem::Zips => "zips",
            ProjectionSystem::ZipsDepthCharts => "zipsdc",
            ProjectionSystem::Atc => "atc",
            ProjectionSystem::TheBat => "thebat",
            ProjectionSystem::TheBatX => "thebatx",
            ProjectionSystem::DepthCharts => "fangraphsdc",
        }
    }

    /// Name the parsed projections are stored under.
    pub fn source_key(&self) -> &'static str {
        match self {
            ProjectionSystem::TheBat => "the_bat",
            ProjectionSystem::TheBatX => "the_bat_x",
            other => other.api_type(),
        }
    }
}

impl FromStr for ProjectionSystem {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ProjectionSystem::ALL
            .iter()
            .copied()
            .find(|system| system.api_type() == wanted || system.source_key() == wanted)
            .ok_or_else(|| ClientError::InvalidProjectionSystem(s.to_string()))
    }
}

impl std::fmt::Display for ProjectionSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_type())
    }
}

/// Source of raw projection documents.
#[async_trait]
pub trait ProjectionFetcher: Send + Sync {
    /// Fetch one projection table. Problems are logged and yield `None`.
    async fn fetch_projections(
        &self,
        group: StatGroup,
        position: &str,
        system: ProjectionSystem,
        extra: &[(String, String)],
    ) -> Option<Value>;
}

/// HTTP client for the projections data route.
pub struct FangraphsClient {
    fetcher: Fetcher,
    endpoint: String,
}

impl FangraphsClient {
    pub fn new(fetcher: Fetcher, api: &ApiConfig) -> Self {
        let endpoint = format!(
            "{}/_next/data/{}/projections.json",
            api.base_url.trim_end_matches('/'),
            api.build_id
        );
        Self { fetcher, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the request URL. Caller extras come last and override the
    /// standard parameters.
    pub fn projections_url(
        &self,
        group: StatGroup,
        position: &str,
        system: ProjectionSystem,
        extra: &[(String, String)],
    ) -> Result<Url, ClientError> {
        group.validate_position(position)?;

        let mut params: Vec<(&str, &str)> = vec![
            ("pos", position),
            ("stats", group.as_str()),
            ("type", system.api_type()),
        ];
        for (key, value) in extra {
            match params.iter_mut().find(|(k, _)| *k == key.as_str()) {
                Some(existing) => existing.1 = value.as_str(),
                None => params.push((key.as_str(), value.as_str())),
            }
        }

        Url::parse_with_params(&self.endpoint, &params)
            .map_err(|e| FetchError::InvalidUrl(format!("Bad projections URL: {}", e)).into())
    }

    /// Fetch one projection table, surfacing errors to the caller.
    pub async fn try_fetch_projections(
        &self,
        group: StatGroup,
        position: &str,
        system: ProjectionSystem,
        extra: &[(String, String)],
    ) -> Result<Value, ClientError> {
        let url = self.projections_url(group, position, system, extra)?;
        info!("Fetching {} projections with {}", group, system);
        debug!("Projections URL: {}", url);
        Ok(self.fetcher.get_json(&url).await?)
    }
}

#[async_trait]
impl ProjectionFetcher for FangraphsClient {
    async fn fetch_projections(
        &self,
        group: StatGroup,
        position: &str,
        system: ProjectionSystem,
        extra: &[(String, String)],
    ) -> Option<Value> {
        match self
            .try_fetch_projections(group, position, system, extra)
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                log_client_error(&e, &self.endpoint);
                None
            }
        }
    }
}

fn log_client_error(err: &ClientError, endpoint: &str) {
    match err {
        ClientError::InvalidStatGroup(_)
        | ClientError::InvalidPosition { .. }
        | ClientError::InvalidProjectionSystem(_) => {
            error!("Invalid projections request: {}", err);
        }
        ClientError::Fetch(fetch) => match fetch.status() {
            Some(404) => warn!("Endpoint not found: {}", endpoint),
            Some(429) => warn!("Rate limit exceeded: {}", fetch),
            Some(500) => warn!("Internal server error"),
            Some(503) => warn!("Service unavailable"),
            Some(status) => warn!("Unexpected status: {}", status),
            None if matches!(fetch, FetchError::NotJson { .. }) => {
                warn!("Non-JSON response from {}, check api.build_id: {}", endpoint, fetch)
            }
            None => warn!("Error fetching projections: {}", fetch),
        },
    }
}

/// Canned responses keyed by group and system, for tests.
#[cfg(test)]
pub struct MockFetcher {
    responses: std::collections::HashMap<(StatGroup, ProjectionSystem), Value>,
    calls: std::sync::Mutex<Vec<(StatGroup, String, ProjectionSystem)>>,
}

#[cfg(test)]
impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: std::collections::HashMap::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(
        mut self,
        group: StatGroup,
        system: ProjectionSystem,
        response: Value,
    ) -> Self {
        self.responses.insert((group, system), response);
        self
    }

    pub fn calls(&self) -> Vec<(StatGroup, String, ProjectionSystem)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ProjectionFetcher for MockFetcher {
    async fn fetch_projections(
        &self,
        group: StatGroup,
        position: &str,
        system: ProjectionSystem,
        _extra: &[(String, String)],
    ) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((group, position.to_string(), system));
        self.responses.get(&(group, system)).cloned()
    }
}
