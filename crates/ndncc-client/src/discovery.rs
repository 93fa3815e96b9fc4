//! Locating a nearby hub.
//!
//! The NDN find-closest-hub service answers a plain HTTP GET with the
//! hostname (or address) of a testbed router near the caller. Newer
//! deployments may return a comma-separated list; the first entry wins.

use std::{io, net::Ipv4Addr};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Hub lookup failed.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The HTTP request failed or returned an error status.
    #[error("discovery request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned no hub.
    #[error("discovery service returned no hub")]
    Empty,

    /// Resolving the hub's hostname failed.
    #[error("resolving {host} failed: {source}")]
    Resolve {
        /// Hostname being resolved.
        host: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },

    /// The hub's hostname has no IPv4 address.
    #[error("{0} has no IPv4 address")]
    NoIpv4(String),

    /// No hub is available.
    #[error("no hub available")]
    Unavailable,
}

/// Source of a hub address.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// IPv4 address of a nearby hub.
    async fn locate(&self) -> Result<Ipv4Addr, DiscoveryError>;
}

/// Find-closest-hub lookup over HTTP.
#[derive(Debug, Clone)]
pub struct FchDiscovery {
    client: reqwest::Client,
    url: String,
}

impl FchDiscovery {
    /// Lookup against `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

/// Resolve `host` to its first IPv4 address.
async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, DiscoveryError> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }

    let addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|source| DiscoveryError::Resolve { host: host.to_owned(), source })?;

    addrs
        .filter_map(|addr| match addr.ip() {
            std::net::IpAddr::V4(v4) => Some(v4),
            std::net::IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| DiscoveryError::NoIpv4(host.to_owned()))
}

#[async_trait]
impl Discovery for FchDiscovery {
    async fn locate(&self) -> Result<Ipv4Addr, DiscoveryError> {
        let body =
            self.client.get(&self.url).send().await?.error_for_status()?.text().await?;

        let host = body.split(',').next().map(str::trim).unwrap_or_default();
        if host.is_empty() {
            return Err(DiscoveryError::Empty);
        }
        debug!(url = %self.url, host, "hub discovered");

        resolve_ipv4(host).await
    }
}

/// Fixed answer, for offline use and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticDiscovery {
    hub: Option<Ipv4Addr>,
}

impl StaticDiscovery {
    /// Always locate `hub`.
    pub fn new(hub: Ipv4Addr) -> Self {
        Self { hub: Some(hub) }
    }

    /// Always fail.
    pub fn unavailable() -> Self {
        Self { hub: None }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn locate(&self) -> Result<Ipv4Addr, DiscoveryError> {
        self.hub.ok_or(DiscoveryError::Unavailable)
    }
}
