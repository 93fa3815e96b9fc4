//! Transport abstraction.
//!
//! A [`Face`] is the client's connection to the forwarder. Production uses a
//! Unix stream socket to the local NFD; tests use an in-memory forwarder.

use std::sync::Arc;

use async_trait::async_trait;
use ndncc_proto::{Data, Interest, NackReason};

use crate::error::FaceError;

/// How an expressed Interest resolved.
///
/// Timeouts are frequent and expected (the notification long-poll times out
/// whenever nothing happens), so they are a value rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// A Data packet answered the Interest.
    Data(Data),
    /// The Interest lifetime expired without an answer.
    Timeout,
    /// The forwarder refused the Interest.
    Nack(NackReason),
}

impl ExchangeOutcome {
    /// The Data, if the exchange produced one.
    pub fn into_data(self) -> Option<Data> {
        match self {
            Self::Data(data) => Some(data),
            Self::Timeout | Self::Nack(_) => None,
        }
    }
}

/// Connection to a forwarder.
#[async_trait]
pub trait Face: Send + Sync + 'static {
    /// Send `interest` and wait for the Data, Nack or lifetime expiry that
    /// resolves it.
    ///
    /// Resolution may depend on [`process_events`](Self::process_events)
    /// being driven concurrently.
    async fn express_interest(&self, interest: &Interest) -> Result<ExchangeOutcome, FaceError>;

    /// Pump pending transport events: read what has arrived, resolve matching
    /// Interests, expire overdue ones.
    async fn process_events(&self) -> Result<(), FaceError>;
}

#[async_trait]
impl<F: Face + ?Sized> Face for Arc<F> {
    async fn express_interest(&self, interest: &Interest) -> Result<ExchangeOutcome, FaceError> {
        (**self).express_interest(interest).await
    }

    async fn process_events(&self) -> Result<(), FaceError> {
        (**self).process_events().await
    }
}
