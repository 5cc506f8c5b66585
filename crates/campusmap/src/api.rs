//! Client for the campus routing service.
//!
//! Two endpoints, both `GET` returning JSON arrays:
//! `/getBuildings` and `/buildingLocation?start=<id>&end=<id>`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::model::{Building, RouteSegment};

pub const DEFAULT_SERVER: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const BUILDINGS_ENDPOINT: &str = "getBuildings";
const ROUTE_ENDPOINT: &str = "buildingLocation";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Server URL cannot carry a path (e.g. `mailto:`) or failed to parse.
    #[error("Invalid server URL: {0}")]
    InvalidServer(String),

    /// Connection refused, DNS failure, timeout and the like.
    #[error("Could not reach {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body was not the JSON shape the endpoint promises.
    #[error("Malformed response from {endpoint}: {source}")]
    Malformed {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Parameters of one route request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuery {
    pub start: String,
    pub end: String,
}

impl RouteQuery {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Full request URL with percent-encoded `start` and `end` values.
    pub fn to_url(&self, server: &Url) -> Result<Url, ApiError> {
        let mut url = endpoint_url(server, ROUTE_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("start", &self.start)
            .append_pair("end", &self.end);
        Ok(url)
    }
}

/// The two calls the form needs. Implemented over HTTP, and by fakes in tests.
pub trait CampusApi: Send + Sync {
    fn buildings(&self) -> Result<Vec<Building>, ApiError>;
    fn route(&self, query: &RouteQuery) -> Result<Vec<RouteSegment>, ApiError>;
}

/// Blocking HTTP implementation on top of `ureq`.
pub struct HttpApi {
    server: Url,
    agent: ureq::Agent,
}

impl HttpApi {
    pub fn new(server: &str, timeout: Duration) -> Result<Self, ApiError> {
        let server =
            Url::parse(server).map_err(|e| ApiError::InvalidServer(format!("{server}: {e}")))?;
        if server.cannot_be_a_base() {
            return Err(ApiError::InvalidServer(server.to_string()));
        }
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Ok(Self {
            server,
            agent: ureq::Agent::new_with_config(config),
        })
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        endpoint: &'static str,
    ) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        let body = self
            .agent
            .get(url.as_str())
            .call()
            .and_then(|mut response| response.body_mut().read_to_string())
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => ApiError::Status {
                    url: url.to_string(),
                    status,
                },
                other => ApiError::Transport {
                    url: url.to_string(),
                    message: other.to_string(),
                },
            })?;
        serde_json::from_str(&body).map_err(|source| ApiError::Malformed { endpoint, source })
    }
}

impl CampusApi for HttpApi {
    fn buildings(&self) -> Result<Vec<Building>, ApiError> {
        let url = endpoint_url(&self.server, BUILDINGS_ENDPOINT)?;
        self.get_json(&url, "/getBuildings")
    }

    fn route(&self, query: &RouteQuery) -> Result<Vec<RouteSegment>, ApiError> {
        let url = query.to_url(&self.server)?;
        self.get_json(&url, "/buildingLocation")
    }
}

/// Append an endpoint to the server URL, keeping any base path it already has.
fn endpoint_url(server: &Url, endpoint: &str) -> Result<Url, ApiError> {
    let mut url = server.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidServer(server.to_string()))?
        .pop_if_empty()
        .push(endpoint);
    Ok(url)
}
