//! High-level management operations.
//!
//! Each operation is one transaction against the forwarder: build the
//! command, express it, decode the reply. A forwarder that stays silent,
//! refuses the Interest or answers with undecodable content yields
//! `Ok(None)`; only argument mistakes and transport faults are errors.

use std::sync::Arc;

use ndncc_core::{
    CommandStamper, ControlCommand, EncodingError, Environment, Exchange, ExchangeOutcome, Face,
    command::MANAGEMENT_PREFIX,
};
use ndncc_proto::{
    ControlParameters, ControlResponse, FaceQueryFilter, FaceStatus, Interest, Name,
    decode_control_response, decode_face_status_list,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::{ClientConfig, DEFAULT_NDN_PORT},
    discovery::Discovery,
    error::ClientError,
};

/// Result of [`Controller::autoconf`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoconfOutcome {
    /// Whether the hub face and its id were established.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
}

impl AutoconfOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Bring a user-supplied face URI into canonical form.
///
/// A trailing `/` is dropped, `udp4://` is assumed when no scheme is given
/// and the default port is appended when none is present.
pub fn normalize_face_uri(uri: &str) -> Result<String, EncodingError> {
    let trimmed = uri.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(EncodingError::InvalidUri(uri.to_owned()));
    }

    let mut normalized =
        if trimmed.contains("://") { trimmed.to_owned() } else { format!("udp4://{trimmed}") };
    if normalized.split(':').count() < 3 {
        normalized = format!("{normalized}:{DEFAULT_NDN_PORT}");
    }
    Ok(normalized)
}

/// Issues management commands through a shared face.
pub struct Controller<F, E> {
    exchange: Exchange<F>,
    stamper: Arc<CommandStamper>,
    env: E,
    config: ClientConfig,
}

impl<F, E> Controller<F, E>
where
    F: Face,
    E: Environment,
{
    /// Controller over `face`, signing with `stamper`.
    pub fn new(face: F, env: E, stamper: Arc<CommandStamper>, config: ClientConfig) -> Self {
        Self { exchange: Exchange::new(face), stamper, env, config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Validate, sign and send `command`, decoding the control response.
    pub async fn execute(
        &self,
        command: &ControlCommand,
    ) -> Result<Option<ControlResponse>, ClientError> {
        command.validate()?;
        let interest = command.finalize(&self.stamper, &self.env, self.config.command_lifetime);

        let Some(data) = self.exchange.send(&interest).await?.into_data() else {
            info!(module = %command.module, verb = %command.verb, "no response from forwarder");
            return Ok(None);
        };

        match decode_control_response(&data.content) {
            Ok(response) => {
                info!(
                    module = %command.module,
                    verb = %command.verb,
                    status = response.status_code,
                    text = %response.status_text,
                    "command response"
                );
                Ok(Some(response))
            },
            Err(e) => {
                warn!(module = %command.module, verb = %command.verb, error = %e, "decode failed");
                Ok(None)
            },
        }
    }

    /// Create a face toward `uri` (`faces/create`).
    pub async fn add_face(&self, uri: &str) -> Result<Option<ControlResponse>, ClientError> {
        let uri = normalize_face_uri(uri)?;
        let parameters = ControlParameters { uri: Some(uri), ..ControlParameters::default() };
        self.execute(&ControlCommand::new("faces", "create", parameters)).await
    }

    /// Destroy face `face_id` (`faces/destroy`).
    pub async fn remove_face(&self, face_id: u64) -> Result<Option<ControlResponse>, ClientError> {
        let parameters = ControlParameters { face_id: Some(face_id), ..ControlParameters::default() };
        self.execute(&ControlCommand::new("faces", "destroy", parameters)).await
    }

    /// Register `name` toward `face_id` (`rib/register`).
    pub async fn add_route(
        &self,
        name: &str,
        face_id: u64,
    ) -> Result<Option<ControlResponse>, ClientError> {
        let parameters = ControlParameters {
            name: Some(name.parse()?),
            face_id: Some(face_id),
            ..ControlParameters::default()
        };
        self.execute(&ControlCommand::new("rib", "register", parameters)).await
    }

    /// Unregister `name` from `face_id` (`rib/unregister`).
    pub async fn remove_route(
        &self,
        name: &str,
        face_id: u64,
    ) -> Result<Option<ControlResponse>, ClientError> {
        let parameters = ControlParameters {
            name: Some(name.parse()?),
            face_id: Some(face_id),
            ..ControlParameters::default()
        };
        self.execute(&ControlCommand::new("rib", "unregister", parameters)).await
    }

    /// Faces matching `filter` (`faces/query`).
    ///
    /// Reads the first segment of the dataset, which holds every face a
    /// filter by URI can match.
    pub async fn query_faces(
        &self,
        filter: &FaceQueryFilter,
    ) -> Result<Option<Vec<FaceStatus>>, ClientError> {
        let name = MANAGEMENT_PREFIX
            .into_iter()
            .chain(["faces", "query"])
            .fold(Name::new(), |name, c| name.append_generic(c.as_bytes().to_vec()))
            .append_generic(filter.encode());
        let interest = Interest::new(name)
            .with_can_be_prefix(true)
            .with_must_be_fresh(true)
            .with_lifetime(self.config.command_lifetime);

        let data = match self.exchange.send(&interest).await? {
            ExchangeOutcome::Data(data) => data,
            ExchangeOutcome::Timeout | ExchangeOutcome::Nack(_) => return Ok(None),
        };

        match decode_face_status_list(&data.content) {
            Ok(faces) => Ok(Some(faces)),
            Err(e) => {
                warn!(error = %e, "face dataset decode failed");
                Ok(None)
            },
        }
    }

    /// Id of the first face whose remote URI is `uri`.
    pub async fn query_face_id(&self, uri: &str) -> Result<Option<u64>, ClientError> {
        let faces = self.query_faces(&FaceQueryFilter::by_uri(uri)).await?;
        Ok(faces.and_then(|faces| faces.first().map(|face| face.face_id)))
    }

    /// Connect to a nearby hub and route the testbed prefixes toward it.
    ///
    /// Face creation and the face id lookup must succeed. Every route is
    /// attempted even after an earlier one is refused or hits a transport
    /// fault. Route failures only fail the outcome when
    /// [`require_route_success`](crate::AutoconfConfig::require_route_success)
    /// is set, and then name the first route that failed.
    pub async fn autoconf(&self, discovery: &impl Discovery) -> Result<AutoconfOutcome, ClientError> {
        let autoconf = &self.config.autoconf;

        let hub = match discovery.locate().await {
            Ok(hub) => hub,
            Err(e) => {
                warn!(error = %e, "hub discovery failed");
                return Ok(AutoconfOutcome::failed("Hub discovery failed"));
            },
        };
        let uri = format!("udp4://{hub}:{}", autoconf.port);
        info!(%uri, "hub located");

        if self.add_face(&uri).await?.is_none() {
            return Ok(AutoconfOutcome::failed("Create face failed"));
        }
        let Some(face_id) = self.query_face_id(&uri).await? else {
            return Ok(AutoconfOutcome::failed("Create face failed"));
        };

        let mut first_failure = None;
        for route in &autoconf.routes {
            let parameters = ControlParameters {
                name: Some(route.clone()),
                face_id: Some(face_id),
                origin: Some(autoconf.origin),
                cost: Some(autoconf.cost),
                ..ControlParameters::default()
            };
            let acknowledged =
                match self.execute(&ControlCommand::new("rib", "register", parameters)).await {
                    Ok(response) => {
                        let ok = response.as_ref().is_some_and(ControlResponse::is_success);
                        if !ok {
                            warn!(%route, face_id, ?response, "route registration refused");
                        }
                        ok
                    },
                    Err(e) => {
                        warn!(%route, face_id, error = %e, "route registration failed");
                        false
                    },
                };
            if !acknowledged {
                first_failure.get_or_insert(route);
            }
        }

        if autoconf.require_route_success
            && let Some(route) = first_failure
        {
            return Ok(AutoconfOutcome::failed(format!("Register route {route} failed")));
        }

        info!(face_id, "auto-configuration finished");
        Ok(AutoconfOutcome { success: true, message: "Auto-configuration finished".to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn bare_address_gets_scheme_and_port() {
        assert_eq!(normalize_face_uri("192.0.2.1").unwrap(), "udp4://192.0.2.1:6363");
    }

    #[test]
    fn trailing_slash_is_dropped() {
        assert_eq!(normalize_face_uri("192.0.2.1:6363/").unwrap(), "udp4://192.0.2.1:6363");
    }

    #[test]
    fn explicit_scheme_and_port_are_kept() {
        assert_eq!(normalize_face_uri("tcp4://192.0.2.1:7000").unwrap(), "tcp4://192.0.2.1:7000");
        assert_eq!(normalize_face_uri("tcp4://192.0.2.1").unwrap(), "tcp4://192.0.2.1:6363");
    }

    #[test]
    fn hostname_is_left_alone() {
        assert_eq!(
            normalize_face_uri("spurs.cs.ucla.edu").unwrap(),
            "udp4://spurs.cs.ucla.edu:6363"
        );
    }

    #[test]
    fn empty_uri_is_rejected() {
        assert!(matches!(normalize_face_uri(""), Err(EncodingError::InvalidUri(_))));
        assert!(matches!(normalize_face_uri("/"), Err(EncodingError::InvalidUri(_))));
    }

    fn face_uri() -> impl Strategy<Value = String> {
        (
            prop::option::of(prop::sample::select(vec!["udp4://", "tcp4://", "udp6://", "unix://"])),
            "[a-z0-9][a-z0-9.-]{0,20}",
            prop::option::of(1u16..),
            any::<bool>(),
        )
            .prop_map(|(scheme, host, port, slash)| {
                let mut uri = format!("{}{host}", scheme.unwrap_or_default());
                if let Some(port) = port {
                    uri.push_str(&format!(":{port}"));
                }
                if slash {
                    uri.push('/');
                }
                uri
            })
    }

    proptest! {
        #[test]
        fn normalizing_is_idempotent(uri in face_uri()) {
            let once = normalize_face_uri(&uri).unwrap();
            prop_assert_eq!(normalize_face_uri(&once).unwrap(), once.clone());
            prop_assert!(once.contains("://"));
            prop_assert!(!once.ends_with('/'));
        }
    }
}
