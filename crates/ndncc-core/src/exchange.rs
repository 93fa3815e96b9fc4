//! Request/response matching.
//!
//! [`PendingTable`] is the bookkeeping a face needs to correlate replies
//! with outstanding Interests: it stores one waiter per expressed Interest
//! together with its deadline and hands the waiters back when a Data, a
//! Nack or the clock resolves them. It does no I/O and reads no clock.
//!
//! [`Exchange`] sits above a [`Face`] and enforces the acceptance rule for a
//! single request: only a Data whose name matches the Interest counts as an
//! answer.

use std::time::Instant;

use ndncc_proto::{Data, Interest, Name};
use tracing::{debug, warn};

use crate::{
    error::FaceError,
    face::{ExchangeOutcome, Face},
};

#[derive(Debug)]
struct PendingEntry<T> {
    name: Name,
    can_be_prefix: bool,
    deadline: Instant,
    waiter: T,
}

impl<T> PendingEntry<T> {
    fn matches(&self, data: &Data) -> bool {
        if self.can_be_prefix { self.name.is_prefix_of(&data.name) } else { self.name == data.name }
    }
}

/// Outstanding Interests and whatever is waiting on each of them.
#[derive(Debug)]
pub struct PendingTable<T> {
    entries: Vec<PendingEntry<T>>,
}

impl<T> Default for PendingTable<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> PendingTable<T> {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `interest`, expressed at `now`.
    pub fn insert(&mut self, interest: &Interest, now: Instant, waiter: T) {
        self.entries.push(PendingEntry {
            name: interest.name.clone(),
            can_be_prefix: interest.can_be_prefix,
            deadline: now + interest.lifetime,
            waiter,
        });
    }

    /// Remove and return the waiters `data` satisfies.
    pub fn satisfy(&mut self, data: &Data) -> Vec<T> {
        self.take_where(|entry| entry.matches(data))
    }

    /// Remove and return the waiters of Interests named exactly `name`.
    pub fn nack(&mut self, name: &Name) -> Vec<T> {
        self.take_where(|entry| entry.name == *name)
    }

    /// Remove and return the waiters whose deadline is at or before `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<T> {
        self.take_where(|entry| entry.deadline <= now)
    }

    /// Earliest deadline among outstanding Interests.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.deadline).min()
    }

    /// Number of outstanding Interests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take_where(&mut self, mut pred: impl FnMut(&PendingEntry<T>) -> bool) -> Vec<T> {
        let (taken, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(|entry| pred(entry));
        self.entries = kept;
        taken.into_iter().map(|entry| entry.waiter).collect()
    }
}

/// Sends one request at a time over a shared face.
#[derive(Debug, Clone)]
pub struct Exchange<F> {
    face: F,
}

impl<F: Face> Exchange<F> {
    /// Exchange over `face`.
    pub fn new(face: F) -> Self {
        Self { face }
    }

    /// The underlying face.
    pub fn face(&self) -> &F {
        &self.face
    }

    /// Express `interest` and wait for its resolution.
    ///
    /// A Data that does not match the Interest name is not an answer; it is
    /// logged and reported as [`ExchangeOutcome::Timeout`].
    ///
    /// # Errors
    ///
    /// Only transport faults. Timeouts and Nacks are outcomes.
    pub async fn send(&self, interest: &Interest) -> Result<ExchangeOutcome, FaceError> {
        debug!(name = %interest.name, lifetime = ?interest.lifetime, "expressing interest");

        let outcome = self.face.express_interest(interest).await?;
        match &outcome {
            ExchangeOutcome::Data(data) if !interest.matches_data(data) => {
                warn!(
                    interest = %interest.name,
                    data = %data.name,
                    "data name does not match interest, discarding"
                );
                Ok(ExchangeOutcome::Timeout)
            },
            ExchangeOutcome::Data(data) => {
                debug!(name = %data.name, bytes = data.content.len(), "data received");
                Ok(outcome)
            },
            ExchangeOutcome::Timeout => {
                debug!(name = %interest.name, "interest timed out");
                Ok(outcome)
            },
            ExchangeOutcome::Nack(reason) => {
                debug!(name = %interest.name, ?reason, "interest nacked");
                Ok(outcome)
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use ndncc_proto::NackReason;

    use super::*;

    fn name(uri: &str) -> Name {
        uri.parse().unwrap()
    }

    #[test]
    fn satisfy_exact_and_prefix() {
        let t0 = Instant::now();
        let mut table = PendingTable::new();
        table.insert(&Interest::new(name("/a/b")), t0, 1);
        table.insert(&Interest::new(name("/a")).with_can_be_prefix(true), t0, 2);
        table.insert(&Interest::new(name("/a")), t0, 3);

        let data = Data::new(name("/a/b"), Bytes::new());
        assert_eq!(table.satisfy(&data), vec![1, 2]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn expire_by_deadline() {
        let t0 = Instant::now();
        let mut table = PendingTable::new();
        table.insert(&Interest::new(name("/short")).with_lifetime(Duration::from_secs(1)), t0, "s");
        table.insert(&Interest::new(name("/long")).with_lifetime(Duration::from_secs(60)), t0, "l");

        assert_eq!(table.next_deadline(), Some(t0 + Duration::from_secs(1)));
        assert!(table.expire(t0).is_empty());
        assert_eq!(table.expire(t0 + Duration::from_secs(1)), vec!["s"]);
        assert_eq!(table.next_deadline(), Some(t0 + Duration::from_secs(60)));
        assert_eq!(table.expire(t0 + Duration::from_secs(61)), vec!["l"]);
        assert!(table.is_empty());
        assert_eq!(table.next_deadline(), None);
    }

    #[test]
    fn nack_matches_exact_name_only() {
        let t0 = Instant::now();
        let mut table = PendingTable::new();
        table.insert(&Interest::new(name("/a")), t0, 1);
        table.insert(&Interest::new(name("/a/b")), t0, 2);

        assert_eq!(table.nack(&name("/a")), vec![1]);
        assert_eq!(table.len(), 1);
    }

    struct ScriptedFace {
        reply: Mutex<Option<ExchangeOutcome>>,
    }

    #[async_trait]
    impl Face for ScriptedFace {
        async fn express_interest(
            &self,
            _interest: &Interest,
        ) -> Result<ExchangeOutcome, FaceError> {
            Ok(self.reply.lock().unwrap().take().unwrap_or(ExchangeOutcome::Timeout))
        }

        async fn process_events(&self) -> Result<(), FaceError> {
            Ok(())
        }
    }

    fn exchange_with(reply: ExchangeOutcome) -> Exchange<ScriptedFace> {
        Exchange::new(ScriptedFace { reply: Mutex::new(Some(reply)) })
    }

    #[tokio::test]
    async fn matching_data_is_returned() {
        let data = Data::new(name("/localhost/nfd/faces/events/seq=3"), vec![1, 2]);
        let exchange = exchange_with(ExchangeOutcome::Data(data.clone()));

        let interest = Interest::new(name("/localhost/nfd/faces/events")).with_can_be_prefix(true);
        assert_eq!(exchange.send(&interest).await.unwrap(), ExchangeOutcome::Data(data));
    }

    #[tokio::test]
    async fn mismatched_data_is_a_timeout() {
        let data = Data::new(name("/somewhere/else"), Bytes::new());
        let exchange = exchange_with(ExchangeOutcome::Data(data));

        let interest = Interest::new(name("/localhost/nfd/faces/events"));
        assert_eq!(exchange.send(&interest).await.unwrap(), ExchangeOutcome::Timeout);
    }

    #[tokio::test]
    async fn nack_passes_through() {
        let exchange = exchange_with(ExchangeOutcome::Nack(NackReason::NoRoute));
        let interest = Interest::new(name("/x"));
        assert_eq!(
            exchange.send(&interest).await.unwrap(),
            ExchangeOutcome::Nack(NackReason::NoRoute)
        );
    }
}
