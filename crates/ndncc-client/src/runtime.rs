//! Cooperative runtime.
//!
//! Two activities share one task: the driver tick, which pumps transport
//! events every [`tick_interval`](crate::ClientConfig::tick_interval), and
//! the face event subscriber, which keeps exactly one long-poll Interest
//! outstanding. Nothing is spawned; [`Runtime::run`] polls both futures on
//! the calling task.
//!
//! Stopping is cooperative. The subscriber checks the [`StopHandle`] at the
//! top of every iteration, so shutdown waits for its in-flight Interest to
//! resolve or time out. The tick keeps pumping until then: on a socket face
//! that pump is what resolves or expires the Interest.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use ndncc_core::{
    Environment, EventSink, Exchange, ExchangeOutcome, FACE_EVENT, Face, FaceError, Subscriber,
    SubscriberAction, face_event_record,
};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

/// Shared running flag.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Handle in the running state.
    pub fn new() -> Self {
        Self { running: Arc::new(AtomicBool::new(true)) }
    }

    /// Ask every loop observing this handle to finish.
    ///
    /// Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether loops should keep going.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver loop and face event subscription over one face.
pub struct Runtime<F, E> {
    exchange: Exchange<F>,
    env: E,
    config: ClientConfig,
    stop: StopHandle,
}

impl<F, E> Runtime<F, E>
where
    F: Face,
    E: Environment,
{
    /// Runtime over `face`.
    pub fn new(face: F, env: E, config: ClientConfig) -> Self {
        Self { exchange: Exchange::new(face), env, config, stop: StopHandle::new() }
    }

    /// Handle that stops [`run`](Self::run).
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Pump transport events and follow the face event stream until stopped.
    ///
    /// Every decoded notification is rendered and handed to `sink` as
    /// [`FACE_EVENT`]. After [`StopHandle::stop`] the call returns once the
    /// outstanding notification fetch has completed or timed out.
    ///
    /// # Errors
    ///
    /// A transport fault from the driver tick. The subscriber is stopped
    /// along with it.
    pub async fn run<S: EventSink>(&self, sink: &S) -> Result<(), FaceError> {
        info!("runtime started");
        let result = tokio::select! {
            biased;
            () = self.subscribe(sink) => Ok(()),
            err = self.pump() => {
                warn!(error = %err, "transport fault, stopping");
                self.stop.stop();
                Err(err)
            },
        };
        info!("runtime stopped");
        result
    }

    /// Pump transport events until `operation` completes.
    ///
    /// For one-shot callers that have no [`run`](Self::run) loop going.
    ///
    /// # Errors
    ///
    /// A transport fault from the driver tick, which abandons `operation`.
    pub async fn run_until<T>(&self, operation: impl Future<Output = T>) -> Result<T, FaceError> {
        tokio::select! {
            output = operation => Ok(output),
            err = self.pump() => Err(err),
        }
    }

    async fn pump(&self) -> FaceError {
        loop {
            if let Err(e) = self.exchange.face().process_events().await {
                return e;
            }
            self.env.sleep(self.config.tick_interval).await;
        }
    }

    async fn subscribe<S: EventSink>(&self, sink: &S) {
        let mut subscriber = Subscriber::new(self.config.subscription.clone());

        while self.stop.is_running() {
            let interest = subscriber.next_interest();
            let outcome = match self.exchange.send(&interest).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    debug!(error = %e, "face event fetch failed");
                    ExchangeOutcome::Timeout
                },
            };

            for action in subscriber.on_outcome(&outcome) {
                match action {
                    SubscriberAction::Emit(event) => sink.emit(FACE_EVENT, face_event_record(&event)),
                    SubscriberAction::Pause(duration) => self.env.sleep(duration).await,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use async_trait::async_trait;
    use ndncc_core::{EventPayload, PendingTable, SubscriberConfig, SystemEnv};
    use ndncc_proto::Interest;
    use tokio::sync::oneshot;

    use super::*;

    /// Never answers; pending Interests expire only when pumped.
    #[derive(Default)]
    struct SilentFace {
        pending: Mutex<PendingTable<oneshot::Sender<ExchangeOutcome>>>,
    }

    #[async_trait]
    impl Face for SilentFace {
        async fn express_interest(
            &self,
            interest: &Interest,
        ) -> Result<ExchangeOutcome, FaceError> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().insert(interest, SystemEnv.now(), tx);
            rx.await.map_err(|_| FaceError::Closed)
        }

        async fn process_events(&self) -> Result<(), FaceError> {
            for waiter in self.pending.lock().unwrap().expire(SystemEnv.now()) {
                let _ = waiter.send(ExchangeOutcome::Timeout);
            }
            Ok(())
        }
    }

    fn short_poll_config() -> ClientConfig {
        ClientConfig {
            subscription: SubscriberConfig {
                lifetime: Duration::from_millis(200),
                ..SubscriberConfig::default()
            },
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn stop_waits_for_pumped_expiry_of_inflight_poll() {
        let runtime = Runtime::new(SilentFace::default(), SystemEnv, short_poll_config());
        let stop = runtime.stop_handle();
        let sink = |_: &str, _: EventPayload| {};

        let run = async {
            let (result, ()) = tokio::join!(runtime.run(&sink), async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                stop.stop();
            });
            result
        };

        let finished = tokio::time::timeout(Duration::from_secs(2), run).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn stopped_before_start_returns_at_once() {
        let runtime = Runtime::new(SilentFace::default(), SystemEnv, short_poll_config());
        runtime.stop_handle().stop();

        let sink = |_: &str, _: EventPayload| {};
        let finished = tokio::time::timeout(Duration::from_millis(100), runtime.run(&sink)).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[test]
    fn stop_handle_is_shared() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        assert!(clone.is_running());

        handle.stop();
        assert!(!clone.is_running());
        handle.stop();
        assert!(!handle.is_running());
    }
}
