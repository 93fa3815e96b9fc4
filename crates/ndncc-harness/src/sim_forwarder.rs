//! In-memory forwarder.
//!
//! Implements [`Face`] by answering Interests directly, with the management
//! behaviour of a local NFD:
//!
//! - `faces/create`: 200 with the new face, 409 if the remote URI exists
//! - `faces/destroy`: 200, or 410 if the face is gone
//! - `rib/register`: 200, or 410 for an unknown face
//! - `rib/unregister`: 200
//! - `faces/query/<filter>`: the matching slice of the face dataset
//! - `faces/events`: sequenced face event notifications, long-polled
//!
//! Missing required parameters get 400, replayed command timestamps 403 and
//! unknown verbs 501. Anything outside `/localhost/nfd` is Nacked.
//!
//! Faults can be injected per name prefix, persistently or for one
//! Interest, to make the forwarder drop, Nack, corrupt or empty its
//! replies, or to fail the exchange outright.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use ndncc_core::{ExchangeOutcome, Face, FaceError, required_fields};
use ndncc_proto::{
    ControlParameters, ControlResponse, Data, FaceEventKind, FaceEventNotification,
    FaceQueryFilter, FaceStatus, Interest, NackReason, Name, NameComponent, tlv,
};
use tokio::{sync::Notify, time::Instant};
use tracing::{debug, trace};

/// First face id handed out, as on a freshly started NFD.
const FIRST_FACE_ID: u64 = 256;

/// How long a published notification satisfies a MustBeFresh Interest.
const EVENT_FRESHNESS: Duration = Duration::from_secs(1);

/// Components in a signed command name:
/// `localhost/nfd/<module>/<verb>/<params>/<ts>/<nonce>/<info>/<value>`.
const SIGNED_COMMAND_LEN: usize = 9;

/// Injected misbehaviour for Interests under a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Never answer; the Interest times out.
    Drop,
    /// Answer with a Nack.
    Nack(NackReason),
    /// Answer with content that does not decode.
    Corrupt,
    /// Answer with empty content.
    Empty,
    /// Fail the exchange as if the connection had dropped.
    Disconnect,
}

#[derive(Debug)]
struct Injection {
    prefix: Name,
    fault: Fault,
    once: bool,
}

/// A signed command the forwarder accepted for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Management module.
    pub module: String,
    /// Command verb.
    pub verb: String,
    /// Decoded parameters.
    pub parameters: ControlParameters,
    /// Command timestamp in Unix milliseconds.
    pub timestamp: u64,
}

#[derive(Debug)]
struct Published {
    seq: u64,
    at: Instant,
    event: FaceEventNotification,
}

#[derive(Debug)]
struct State {
    faces: BTreeMap<u64, FaceStatus>,
    next_face_id: u64,
    routes: BTreeSet<(Name, u64)>,
    events: Vec<Published>,
    next_seq: u64,
    last_timestamp: Option<u64>,
    commands: Vec<RecordedCommand>,
    faults: Vec<Injection>,
    ticks: u64,
}

impl State {
    fn new() -> Self {
        Self {
            faces: BTreeMap::new(),
            next_face_id: FIRST_FACE_ID,
            routes: BTreeSet::new(),
            events: Vec::new(),
            next_seq: 1,
            last_timestamp: None,
            commands: Vec::new(),
            faults: Vec::new(),
            ticks: 0,
        }
    }

    fn publish(&mut self, kind: FaceEventKind, face: &FaceStatus) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Published {
            seq,
            at: Instant::now(),
            event: FaceEventNotification {
                kind: kind.code(),
                face_id: face.face_id,
                uri: face.uri.clone(),
                local_uri: face.local_uri.clone(),
                face_scope: face.face_scope,
                face_persistency: face.face_persistency,
                link_type: face.link_type,
                flags: face.flags,
            },
        });
        seq
    }

    fn create_face(&mut self, uri: &str) -> FaceStatus {
        let face_id = self.next_face_id;
        self.next_face_id += 1;

        let scheme = uri.split_once("://").map_or("udp4", |(scheme, _)| scheme);
        let face = FaceStatus {
            face_id,
            uri: uri.to_owned(),
            local_uri: format!("{scheme}://0.0.0.0:6363"),
            ..FaceStatus::default()
        };
        self.faces.insert(face_id, face.clone());
        self.publish(FaceEventKind::Created, &face);
        face
    }

    fn take_fault(&mut self, name: &Name) -> Option<Fault> {
        let index = self.faults.iter().position(|i| i.prefix.is_prefix_of(name))?;
        let fault = self.faults[index].fault;
        if self.faults[index].once {
            self.faults.remove(index);
        }
        Some(fault)
    }
}

/// In-memory forwarder implementing [`Face`].
#[derive(Debug)]
pub struct SimForwarder {
    state: Mutex<State>,
    published: Notify,
}

impl Default for SimForwarder {
    fn default() -> Self {
        Self::new()
    }
}

fn prefix(components: &[&str]) -> Name {
    components
        .iter()
        .fold(Name::new(), |name, component| name.append_generic(component.as_bytes().to_vec()))
}

fn reply(interest: &Interest, response: &ControlResponse) -> ExchangeOutcome {
    ExchangeOutcome::Data(Data::new(interest.name.clone(), response.encode()))
}

impl SimForwarder {
    /// Forwarder with no faces, routes or events.
    pub fn new() -> Self {
        Self { state: Mutex::new(State::new()), published: Notify::new() }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Misbehave for every Interest under `prefix`.
    ///
    /// The earliest matching injection wins.
    pub fn inject(&self, prefix: &str, fault: Fault) {
        self.push_fault(prefix, fault, false);
    }

    /// Misbehave for the next Interest under `prefix` only.
    pub fn inject_once(&self, prefix: &str, fault: Fault) {
        self.push_fault(prefix, fault, true);
    }

    fn push_fault(&self, prefix: &str, fault: Fault, once: bool) {
        let Ok(prefix) = prefix.parse::<Name>() else {
            return;
        };
        self.state().faults.push(Injection { prefix, fault, once });
    }

    /// Remove every injected fault.
    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    /// Create a face as if another application had asked for it.
    pub fn add_face(&self, uri: &str) -> u64 {
        let face_id = self.state().create_face(uri).face_id;
        self.published.notify_waiters();
        face_id
    }

    /// Publish a notification about an existing face.
    ///
    /// Returns the sequence number, or `None` for an unknown face.
    pub fn publish(&self, kind: FaceEventKind, face_id: u64) -> Option<u64> {
        let seq = {
            let mut state = self.state();
            let face = state.faces.get(&face_id)?.clone();
            state.publish(kind, &face)
        };
        self.published.notify_waiters();
        Some(seq)
    }

    /// Publish an arbitrary notification, including malformed ones.
    pub fn publish_raw(&self, event: FaceEventNotification) -> u64 {
        let seq = {
            let mut state = self.state();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.events.push(Published { seq, at: Instant::now(), event });
            seq
        };
        self.published.notify_waiters();
        seq
    }

    /// Forget all faces, routes and events, as a restarted forwarder would.
    ///
    /// Sequence numbers start over; injected faults are kept.
    pub fn restart(&self) {
        let mut state = self.state();
        let faults = std::mem::take(&mut state.faults);
        *state = State::new();
        state.faults = faults;
    }

    /// Current faces.
    pub fn faces(&self) -> Vec<FaceStatus> {
        self.state().faces.values().cloned().collect()
    }

    /// Registered routes as `(prefix, face id)`.
    pub fn routes(&self) -> Vec<(Name, u64)> {
        self.state().routes.iter().cloned().collect()
    }

    /// Commands received, in order.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.state().commands.clone()
    }

    /// Number of [`Face::process_events`] calls.
    pub fn ticks(&self) -> u64 {
        self.state().ticks
    }

    fn handle_command(&self, interest: &Interest) -> ExchangeOutcome {
        let components = interest.name.components();
        if components.len() != SIGNED_COMMAND_LEN {
            return reply(interest, &ControlResponse::new(400, "Malformed command"));
        }
        let text = |component: &NameComponent| String::from_utf8_lossy(component.value()).into_owned();
        let (module, verb) = (text(&components[2]), text(&components[3]));

        let Ok(parameters) = ControlParameters::decode(components[4].value()) else {
            return reply(interest, &ControlResponse::new(400, "Malformed command"));
        };
        let Ok(timestamp) = tlv::decode_nonneg(components[5].value()) else {
            return reply(interest, &ControlResponse::new(403, "Authorization rejected"));
        };

        let mut state = self.state();
        if state.last_timestamp.is_some_and(|last| timestamp <= last) {
            return reply(interest, &ControlResponse::new(403, "Authorization rejected"));
        }
        state.last_timestamp = Some(timestamp);
        state.commands.push(RecordedCommand {
            module: module.clone(),
            verb: verb.clone(),
            parameters: parameters.clone(),
            timestamp,
        });

        if required_fields(&module, &verb).iter().any(|field| !parameters.contains(*field)) {
            return reply(interest, &ControlResponse::new(400, "Malformed command"));
        }

        let response = match (module.as_str(), verb.as_str()) {
            ("faces", "create") => Self::faces_create(&mut state, &parameters),
            ("faces", "destroy") => Self::faces_destroy(&mut state, &parameters),
            ("rib", "register") => Self::rib_register(&mut state, &parameters),
            ("rib", "unregister") => {
                if let (Some(name), Some(face_id)) = (&parameters.name, parameters.face_id) {
                    state.routes.remove(&(name.clone(), face_id));
                }
                ControlResponse::new(200, "OK").with_body(parameters.clone())
            },
            _ => ControlResponse::new(501, "Unknown command"),
        };
        drop(state);

        debug!(%module, %verb, status = response.status_code, "command handled");
        self.published.notify_waiters();
        reply(interest, &response)
    }

    fn faces_create(state: &mut State, parameters: &ControlParameters) -> ControlResponse {
        let uri = parameters.uri.clone().unwrap_or_default();
        let echo = |face: &FaceStatus| ControlParameters {
            face_id: Some(face.face_id),
            uri: Some(face.uri.clone()),
            local_uri: Some(face.local_uri.clone()),
            face_persistency: Some(face.face_persistency),
            flags: Some(face.flags),
            ..ControlParameters::default()
        };

        if let Some(existing) = state.faces.values().find(|face| face.uri == uri) {
            return ControlResponse::new(409, "Face with remote URI already exists")
                .with_body(echo(existing));
        }
        let face = state.create_face(&uri);
        ControlResponse::new(200, "OK").with_body(echo(&face))
    }

    fn faces_destroy(state: &mut State, parameters: &ControlParameters) -> ControlResponse {
        let face_id = parameters.face_id.unwrap_or_default();
        match state.faces.remove(&face_id) {
            Some(face) => {
                state.routes.retain(|(_, id)| *id != face_id);
                state.publish(FaceEventKind::Destroyed, &face);
                ControlResponse::new(200, "OK").with_body(ControlParameters {
                    face_id: Some(face_id),
                    ..ControlParameters::default()
                })
            },
            None => ControlResponse::new(410, "Face not found"),
        }
    }

    fn rib_register(state: &mut State, parameters: &ControlParameters) -> ControlResponse {
        let face_id = parameters.face_id.unwrap_or_default();
        let Some(name) = parameters.name.clone() else {
            return ControlResponse::new(400, "Malformed command");
        };
        if !state.faces.contains_key(&face_id) {
            return ControlResponse::new(410, "Face not found");
        }
        state.routes.insert((name, face_id));
        ControlResponse::new(200, "OK").with_body(parameters.clone())
    }

    fn query_faces(&self, interest: &Interest, filter: &NameComponent) -> ExchangeOutcome {
        let Ok(filter) = FaceQueryFilter::decode(filter.value()) else {
            return ExchangeOutcome::Nack(NackReason::Unspecified);
        };
        let content: Vec<u8> = self
            .state()
            .faces
            .values()
            .filter(|face| filter.matches(face))
            .flat_map(FaceStatus::encode)
            .collect();
        ExchangeOutcome::Data(Data::new(interest.name.clone(), content))
    }

    /// The notification that answers `interest`, if one is available now.
    fn lookup_event(&self, interest: &Interest, events_prefix: &Name) -> Option<Data> {
        let state = self.state();
        let published = if interest.name.len() == events_prefix.len() {
            state.events.last().filter(|p| {
                !interest.must_be_fresh || p.at.elapsed() < EVENT_FRESHNESS
            })?
        } else {
            let seq = interest.name.last()?.to_sequence_number()?;
            state.events.iter().find(|p| p.seq == seq)?
        };

        let name = events_prefix.clone().append_sequence_number(published.seq);
        Some(Data::new(name, published.event.encode()).with_freshness_period(EVENT_FRESHNESS))
    }

    async fn fetch_event(&self, interest: &Interest, events_prefix: &Name) -> ExchangeOutcome {
        let deadline = Instant::now() + interest.lifetime;
        loop {
            // Register before looking so a publish in between is not lost.
            let published = self.published.notified();
            if let Some(data) = self.lookup_event(interest, events_prefix) {
                return ExchangeOutcome::Data(data);
            }
            if tokio::time::timeout_at(deadline, published).await.is_err() {
                return ExchangeOutcome::Timeout;
            }
        }
    }
}

#[async_trait]
impl Face for SimForwarder {
    async fn express_interest(&self, interest: &Interest) -> Result<ExchangeOutcome, FaceError> {
        trace!(name = %interest.name, "sim forwarder received interest");

        let fault = self.state().take_fault(&interest.name);
        match fault {
            Some(Fault::Drop) => {
                tokio::time::sleep(interest.lifetime).await;
                return Ok(ExchangeOutcome::Timeout);
            },
            Some(Fault::Nack(reason)) => return Ok(ExchangeOutcome::Nack(reason)),
            Some(Fault::Corrupt) => {
                let garbage = Bytes::from_static(&[0xFF, 0x00, 0x13, 0x37]);
                return Ok(ExchangeOutcome::Data(Data::new(interest.name.clone(), garbage)));
            },
            Some(Fault::Empty) => {
                return Ok(ExchangeOutcome::Data(Data::new(interest.name.clone(), Bytes::new())));
            },
            Some(Fault::Disconnect) => return Err(FaceError::Closed),
            None => {},
        }

        let events = prefix(&["localhost", "nfd", "faces", "events"]);
        let query = prefix(&["localhost", "nfd", "faces", "query"]);
        let management = prefix(&["localhost", "nfd"]);

        let outcome = if events.is_prefix_of(&interest.name) {
            self.fetch_event(interest, &events).await
        } else if query.is_prefix_of(&interest.name) && interest.name.len() > query.len() {
            self.query_faces(interest, &interest.name.components()[query.len()])
        } else if management.is_prefix_of(&interest.name) {
            self.handle_command(interest)
        } else {
            ExchangeOutcome::Nack(NackReason::NoRoute)
        };
        Ok(outcome)
    }

    async fn process_events(&self) -> Result<(), FaceError> {
        self.state().ticks += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndncc_core::{CommandStamper, ControlCommand, DigestSigner};
    use ndncc_proto::decode_control_response;

    use super::*;
    use crate::SimEnv;

    async fn command(
        forwarder: &SimForwarder,
        stamper: &CommandStamper,
        module: &str,
        verb: &str,
        parameters: ControlParameters,
    ) -> ControlResponse {
        let interest = ControlCommand::new(module, verb, parameters).finalize(
            stamper,
            &SimEnv::new(),
            Duration::from_secs(4),
        );
        let data = forwarder.express_interest(&interest).await.unwrap().into_data().unwrap();
        assert_eq!(data.name, interest.name);
        decode_control_response(&data.content).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn create_then_duplicate() {
        let forwarder = SimForwarder::new();
        let stamper = CommandStamper::new(DigestSigner);
        let create = || ControlParameters {
            uri: Some("udp4://192.0.2.1:6363".into()),
            ..ControlParameters::default()
        };

        let first = command(&forwarder, &stamper, "faces", "create", create()).await;
        assert_eq!(first.status_code, 200);
        assert_eq!(first.body.unwrap().face_id, Some(FIRST_FACE_ID));

        let second = command(&forwarder, &stamper, "faces", "create", create()).await;
        assert_eq!(second.status_code, 409);
        assert_eq!(forwarder.faces().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replayed_timestamp_is_rejected() {
        let forwarder = SimForwarder::new();
        let stamper = CommandStamper::new(DigestSigner);
        let params = ControlParameters { face_id: Some(1), ..ControlParameters::default() };
        let interest = ControlCommand::new("faces", "destroy", params).finalize(
            &stamper,
            &SimEnv::new(),
            Duration::from_secs(4),
        );

        let first = forwarder.express_interest(&interest).await.unwrap().into_data().unwrap();
        assert_eq!(decode_control_response(&first.content).unwrap().status_code, 410);

        let replay = forwarder.express_interest(&interest).await.unwrap().into_data().unwrap();
        assert_eq!(decode_control_response(&replay.content).unwrap().status_code, 403);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_parameter_is_malformed() {
        let forwarder = SimForwarder::new();
        let stamper = CommandStamper::new(DigestSigner);
        let response =
            command(&forwarder, &stamper, "faces", "create", ControlParameters::new()).await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test(start_paused = true)]
    async fn foreign_names_are_nacked() {
        let forwarder = SimForwarder::new();
        let interest = Interest::new("/ndn/edu/ucla".parse().unwrap());
        assert_eq!(
            forwarder.express_interest(&interest).await.unwrap(),
            ExchangeOutcome::Nack(NackReason::NoRoute)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_interest_times_out_after_lifetime() {
        let forwarder = SimForwarder::new();
        forwarder.inject("/localhost/nfd/faces/query", Fault::Drop);

        let start = Instant::now();
        let interest = Interest::new("/localhost/nfd/faces/query/x".parse().unwrap())
            .with_lifetime(Duration::from_secs(4));
        assert_eq!(forwarder.express_interest(&interest).await.unwrap(), ExchangeOutcome::Timeout);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_interest_waits_for_publication() {
        let forwarder = SimForwarder::new();
        let face_id = forwarder.add_face("udp4://192.0.2.1:6363");

        let next = prefix(&["localhost", "nfd", "faces", "events"]).append_sequence_number(2);
        let interest = Interest::new(next).with_lifetime(Duration::from_secs(60));

        let (outcome, ()) = tokio::join!(forwarder.express_interest(&interest), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            forwarder.publish(FaceEventKind::Down, face_id);
        });
        let data = outcome.unwrap().into_data().unwrap();
        assert_eq!(data.name.last().unwrap().to_sequence_number(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_event_does_not_satisfy_must_be_fresh() {
        let forwarder = SimForwarder::new();
        forwarder.add_face("udp4://192.0.2.1:6363");
        tokio::time::sleep(Duration::from_secs(5)).await;

        let interest = Interest::new(prefix(&["localhost", "nfd", "faces", "events"]))
            .with_can_be_prefix(true)
            .with_must_be_fresh(true)
            .with_lifetime(Duration::from_secs(2));
        assert_eq!(forwarder.express_interest(&interest).await.unwrap(), ExchangeOutcome::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fault_fires_once() {
        let forwarder = SimForwarder::new();
        forwarder.inject_once("/localhost/nfd/faces/query", Fault::Disconnect);
        let interest = Interest::new("/localhost/nfd/faces/query/x".parse().unwrap());

        assert!(matches!(forwarder.express_interest(&interest).await, Err(FaceError::Closed)));
        assert!(forwarder.express_interest(&interest).await.is_ok());
    }
}
