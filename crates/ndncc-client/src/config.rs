//! Client configuration.

use std::{path::PathBuf, time::Duration};

use ndncc_core::SubscriberConfig;
use ndncc_proto::Name;
use serde::{Deserialize, Serialize};

/// Default NDN UDP/TCP port.
pub const DEFAULT_NDN_PORT: u16 = 6363;

/// Connection and timing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Forwarder's Unix socket.
    pub socket_path: PathBuf,
    /// Lifetime of management command and query Interests.
    pub command_lifetime: Duration,
    /// Face event subscription.
    pub subscription: SubscriberConfig,
    /// Interval between transport event pumps.
    pub tick_interval: Duration,
    /// Hub auto-configuration.
    pub autoconf: AutoconfConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/run/nfd/nfd.sock"),
            command_lifetime: Duration::from_secs(4),
            subscription: SubscriberConfig::default(),
            tick_interval: Duration::from_millis(10),
            autoconf: AutoconfConfig::default(),
        }
    }
}

/// Parameters of [`Controller::autoconf`](crate::Controller::autoconf).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoconfConfig {
    /// Hub discovery endpoint.
    pub discovery_url: String,
    /// Port of the hub face.
    pub port: u16,
    /// Routes registered toward the hub.
    pub routes: Vec<Name>,
    /// Route origin.
    pub origin: u64,
    /// Route cost.
    pub cost: u64,
    /// Fail when a route registration is not acknowledged.
    pub require_route_success: bool,
}

impl Default for AutoconfConfig {
    fn default() -> Self {
        let route = |components: &[&str]| {
            components
                .iter()
                .fold(Name::new(), |name, c| name.append_generic(c.as_bytes().to_vec()))
        };

        Self {
            discovery_url: "http://ndn-fch.named-data.net/".to_owned(),
            port: DEFAULT_NDN_PORT,
            routes: vec![route(&["ndn"]), route(&["localhop", "nfd"])],
            origin: 66,
            cost: 100,
            require_route_success: false,
        }
    }
}
