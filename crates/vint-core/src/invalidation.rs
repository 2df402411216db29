//! In-process staleness notifications between views
//!
//! A view that changes transactions publishes an [`Invalidation`]; views
//! caching derived data (the dashboard summary) hold a [`Subscription`] and
//! re-fetch when anything arrived.

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

/// What became stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Category totals no longer match the transaction list
    DashboardStale,
}

/// Publishing side of the channel; cheap to clone
#[derive(Debug, Clone)]
pub struct Invalidator {
    sender: broadcast::Sender<Invalidation>,
}

impl Invalidator {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Notify every current subscriber. No subscribers is fine.
    pub fn publish(&self, signal: Invalidation) {
        match self.sender.send(signal) {
            Ok(receivers) => debug!("Published {:?} to {} subscriber(s)", signal, receivers),
            Err(_) => debug!("Published {:?} with no subscribers", signal),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for Invalidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side held by a caching view
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Invalidation>,
}

impl Subscription {
    /// Drain pending signals; true if the view's cache is stale
    ///
    /// A lagged receiver missed signals, so it also counts as stale.
    pub fn take_stale(&mut self) -> bool {
        let mut stale = false;
        loop {
            match self.receiver.try_recv() {
                Ok(Invalidation::DashboardStale) => stale = true,
                Err(TryRecvError::Lagged(_)) => stale = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return stale,
            }
        }
    }

    /// Wait for the next signal. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<Invalidation> {
        match self.receiver.recv().await {
            Ok(signal) => Some(signal),
            Err(broadcast::error::RecvError::Lagged(_)) => Some(Invalidation::DashboardStale),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}
