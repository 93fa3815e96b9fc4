//! Face over the forwarder's Unix stream socket.
//!
//! Packets are written as whole TLV elements. Reading happens only in
//! [`Face::process_events`]: it drains whatever the socket has without
//! blocking, frames complete elements, resolves the pending Interests they
//! answer and expires the ones past their deadline. Callers of
//! [`Face::express_interest`] wait on a oneshot channel until then.

use std::{
    io,
    path::Path,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use bytes::BytesMut;
use ndncc_core::{Environment, ExchangeOutcome, Face, FaceError, PendingTable, SystemEnv};
use ndncc_proto::{
    Interest, MAX_PACKET_SIZE, Packet,
    tlv::{declared_len, element_len},
};
use tokio::{
    io::AsyncWriteExt,
    net::{
        UnixStream,
        unix::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex as AsyncMutex, oneshot},
};
use tracing::{debug, trace, warn};

type Waiter = oneshot::Sender<ExchangeOutcome>;

struct ReadState {
    half: OwnedReadHalf,
    buf: BytesMut,
}

/// Connection to a local forwarder.
pub struct UnixFace<E = SystemEnv> {
    writer: AsyncMutex<OwnedWriteHalf>,
    reader: AsyncMutex<ReadState>,
    pending: Mutex<PendingTable<Waiter>>,
    env: E,
}

impl UnixFace<SystemEnv> {
    /// Connect to the forwarder socket at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::connect_with_env(path, SystemEnv).await
    }
}

impl<E: Environment> UnixFace<E> {
    /// Connect using `env` for deadlines and nonces.
    pub async fn connect_with_env(path: impl AsRef<Path>, env: E) -> io::Result<Self> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        debug!(path = %path.as_ref().display(), "connected to forwarder");
        Ok(Self::from_stream(stream, env))
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: UnixStream, env: E) -> Self {
        let (read, write) = stream.into_split();
        Self {
            writer: AsyncMutex::new(write),
            reader: AsyncMutex::new(ReadState {
                half: read,
                buf: BytesMut::with_capacity(MAX_PACKET_SIZE),
            }),
            pending: Mutex::new(PendingTable::new()),
            env,
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, PendingTable<Waiter>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, frame: &[u8]) {
        match Packet::decode(frame) {
            Ok(Packet::Data(data)) => {
                let waiters = self.pending().satisfy(&data);
                trace!(name = %data.name, waiters = waiters.len(), "data");
                for waiter in waiters {
                    let _ = waiter.send(ExchangeOutcome::Data(data.clone()));
                }
            },
            Ok(Packet::Nack { interest, reason }) => {
                for waiter in self.pending().nack(&interest.name) {
                    let _ = waiter.send(ExchangeOutcome::Nack(reason));
                }
            },
            Ok(Packet::Interest(interest)) => {
                debug!(name = %interest.name, "ignoring incoming interest");
            },
            Err(e) => warn!(error = %e, bytes = frame.len(), "undecodable packet from forwarder"),
        }
    }

    /// Read everything currently available without waiting.
    ///
    /// Returns `Ok(false)` once the forwarder has closed the stream.
    fn drain_socket(state: &mut ReadState) -> io::Result<bool> {
        let mut chunk = [0u8; MAX_PACKET_SIZE];
        loop {
            match state.half.try_read(&mut chunk) {
                Ok(0) => return Ok(false),
                Ok(n) => state.buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<E: Environment> Face for UnixFace<E> {
    async fn express_interest(&self, interest: &Interest) -> Result<ExchangeOutcome, FaceError> {
        let mut interest = interest.clone();
        if interest.nonce.is_none() {
            let mut nonce = [0u8; 4];
            self.env.random_bytes(&mut nonce);
            interest.nonce = Some(nonce);
        }

        let (tx, rx) = oneshot::channel();
        self.pending().insert(&interest, self.env.now(), tx);

        let wire = interest.encode();
        self.writer.lock().await.write_all(&wire).await?;

        // A dropped sender means the face shut down underneath us.
        rx.await.map_err(|_| FaceError::Closed)
    }

    async fn process_events(&self) -> Result<(), FaceError> {
        let mut state = self.reader.lock().await;

        let open = Self::drain_socket(&mut state)?;

        while let Some(len) = element_len(&state.buf) {
            let frame = state.buf.split_to(len).freeze();
            self.dispatch(&frame);
        }
        if let Some(declared) = declared_len(&state.buf)
            && declared > MAX_PACKET_SIZE as u64
        {
            return Err(FaceError::PacketTooLarge(declared));
        }

        if !open {
            // Dropping the waiters wakes every caller with `Closed`.
            drop(std::mem::take(&mut *self.pending()));
            return Err(FaceError::Closed);
        }

        for waiter in self.pending().expire(self.env.now()) {
            let _ = waiter.send(ExchangeOutcome::Timeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{future::Future, time::Duration};

    use ndncc_core::{EventPayload, SubscriberConfig};
    use ndncc_proto::{Data, Name};
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::{ClientConfig, Runtime};

    fn pair() -> (UnixFace, UnixStream) {
        let (client, forwarder) = UnixStream::pair().unwrap();
        (UnixFace::from_stream(client, SystemEnv), forwarder)
    }

    async fn read_interest(forwarder: &mut UnixStream) -> Interest {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let n = forwarder.read(&mut buf).await.unwrap();
        Interest::decode(&buf[..n]).unwrap()
    }

    async fn pump_until<T>(face: &UnixFace, fut: impl Future<Output = T>) -> T {
        tokio::pin!(fut);
        loop {
            tokio::select! {
                out = &mut fut => return out,
                () = tokio::time::sleep(Duration::from_millis(5)) => {
                    face.process_events().await.unwrap();
                },
            }
        }
    }

    #[tokio::test]
    async fn data_resolves_interest() {
        let (face, mut forwarder) = pair();
        let name: Name = "/localhost/nfd/faces/events".parse().unwrap();

        let server = async {
            let interest = read_interest(&mut forwarder).await;
            assert!(interest.nonce.is_some());
            let data = Data::new(interest.name.clone().append_sequence_number(1), vec![1u8]);
            forwarder.write_all(&data.encode()).await.unwrap();
        };
        let interest = Interest::new(name.clone()).with_can_be_prefix(true);
        let client = pump_until(&face, face.express_interest(&interest));

        let (outcome, ()) = tokio::join!(client, server);
        let data = outcome.unwrap().into_data().unwrap();
        assert!(name.is_prefix_of(&data.name));
    }

    #[tokio::test]
    async fn lifetime_expiry_is_a_timeout() {
        let (face, _forwarder) = pair();
        let interest =
            Interest::new("/nobody/home".parse().unwrap()).with_lifetime(Duration::from_millis(20));

        let outcome = pump_until(&face, face.express_interest(&interest)).await.unwrap();
        assert_eq!(outcome, ExchangeOutcome::Timeout);
    }

    #[tokio::test]
    async fn closed_socket_is_reported() {
        let (face, forwarder) = pair();
        drop(forwarder);

        // The peer's close may need a moment to become readable.
        let mut result = face.process_events().await;
        for _ in 0..10 {
            if result.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            result = face.process_events().await;
        }
        assert!(matches!(result, Err(FaceError::Closed)));
    }

    #[tokio::test]
    async fn stopping_runtime_with_silent_forwarder_returns() {
        let (face, _forwarder) = pair();
        let config = ClientConfig {
            subscription: SubscriberConfig {
                lifetime: Duration::from_millis(200),
                ..SubscriberConfig::default()
            },
            ..ClientConfig::default()
        };
        let runtime = Runtime::new(face, SystemEnv, config);
        let stop = runtime.stop_handle();
        let sink = |_: &str, _: EventPayload| {};

        let run = async {
            let (result, ()) = tokio::join!(runtime.run(&sink), async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                stop.stop();
            });
            result
        };

        // The poll in flight at stop has a 200 ms lifetime.
        let finished = tokio::time::timeout(Duration::from_secs(2), run).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }
}
