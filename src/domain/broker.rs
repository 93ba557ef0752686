//! Inventory change notification.
//!
//! [`Broker`] fans a "pool inventory may have changed" signal out to every
//! live watch subscription. It holds a single generation counter inside a
//! [`tokio::sync::watch`] channel: [`Broker::signal`] bumps the counter and
//! wakes all receivers, and each [`Subscription`] compares the live value
//! with the last one it delivered. Signals that land while a subscriber is
//! busy collapse into one catch-up event instead of queueing up.
//!
//! The channel's receiver set is the subscriber set, so the counter and the
//! subscriptions share one synchronization domain. Signalling never waits
//! on a subscriber: delivery runs on each subscriber's own task.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{SubscriptionId, WatchEvent};
use crate::error::LvmdError;

/// Destination for watch events, one event at a time.
///
/// The streaming transport implements this; tests use an
/// [`mpsc::Sender`].
#[async_trait]
pub trait WatchSink: Send {
    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::TransportFailure`] when the peer can no longer
    /// receive events.
    async fn send(&mut self, event: WatchEvent) -> Result<(), LvmdError>;
}

#[async_trait]
impl WatchSink for mpsc::Sender<WatchEvent> {
    async fn send(&mut self, event: WatchEvent) -> Result<(), LvmdError> {
        mpsc::Sender::send(&*self, event)
            .await
            .map_err(|_| LvmdError::TransportFailure("receiver dropped".to_string()))
    }
}

/// Process-wide change broadcaster. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct Broker {
    generation: Arc<watch::Sender<u64>>,
}

impl Broker {
    /// Creates a broker at generation zero with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            generation: Arc::new(generation),
        }
    }

    /// Announces that pool inventory may have changed.
    ///
    /// Increments the generation counter and wakes every subscriber. Never
    /// blocks on delivery and never fails, even with no subscribers.
    pub fn signal(&self) {
        let mut generation = 0;
        self.generation.send_modify(|g| {
            *g = g.wrapping_add(1);
            generation = *g;
        });
        tracing::trace!(
            generation,
            subscribers = self.subscriber_count(),
            "inventory change signalled"
        );
    }

    /// Registers a subscription that ends when `cancel` fires.
    #[must_use]
    pub fn subscribe(&self, cancel: CancellationToken) -> Subscription {
        let mut receiver = self.generation.subscribe();
        let observed = *receiver.borrow_and_update();
        Subscription {
            id: SubscriptionId::new(),
            receiver,
            observed,
            primed: false,
            cancel,
        }
    }

    /// Serves one subscription into `sink` until `cancel` fires.
    ///
    /// Delivers an initial event immediately, then one event per observed
    /// generation change. Returns `Ok(())` on cancellation.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if a delivery fails; the subscription is
    /// torn down and other subscribers are unaffected.
    pub async fn watch<S>(&self, sink: &mut S, cancel: CancellationToken) -> Result<(), LvmdError>
    where
        S: WatchSink + ?Sized,
    {
        let mut subscription = self.subscribe(cancel.clone());
        let id = subscription.id();
        tracing::debug!(%id, subscribers = self.subscriber_count(), "watch opened");

        let mut delivered: u64 = 0;
        while let Some(event) = subscription.next().await {
            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = sink.send(event) => sent,
            };
            if let Err(err) = sent {
                tracing::warn!(%id, delivered, error = %err, "watch delivery failed");
                return Err(err);
            }
            delivered = delivered.saturating_add(1);
        }

        tracing::debug!(%id, delivered, "watch closed");
        Ok(())
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.generation.receiver_count()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

/// One live registration with a [`Broker`].
///
/// Dropping it removes it from the broker's subscriber set.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: watch::Receiver<u64>,
    observed: u64,
    primed: bool,
    cancel: CancellationToken,
}

impl Subscription {
    /// Returns this subscription's identifier.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event.
    ///
    /// The first call returns immediately with the initial event. Later
    /// calls wait until the generation differs from the last delivered one.
    /// Returns `None` once the subscription is cancelled or the broker is
    /// gone.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if !self.primed {
            self.primed = true;
            return Some(WatchEvent {});
        }

        let Self {
            receiver,
            observed,
            cancel,
            ..
        } = self;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                changed = receiver.changed() => {
                    changed.ok()?;
                    // Read the live value: everything signalled since the
                    // last delivery folds into this one event.
                    let current = *receiver.borrow_and_update();
                    if current != *observed {
                        *observed = current;
                        return Some(WatchEvent {});
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    const WAIT: Duration = Duration::from_secs(1);
    const QUIET: Duration = Duration::from_millis(100);

    async fn expect_event(sub: &mut Subscription) {
        let Ok(Some(_)) = timeout(WAIT, sub.next()).await else {
            panic!("expected an event");
        };
    }

    async fn expect_quiet(sub: &mut Subscription) {
        if timeout(QUIET, sub.next()).await.is_ok() {
            panic!("unexpected event");
        }
    }

    struct FailingSink;

    #[async_trait]
    impl WatchSink for FailingSink {
        async fn send(&mut self, _event: WatchEvent) -> Result<(), LvmdError> {
            Err(LvmdError::TransportFailure("broken pipe".to_string()))
        }
    }

    #[tokio::test]
    async fn initial_event_before_any_signal() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(CancellationToken::new());
        expect_event(&mut sub).await;
        expect_quiet(&mut sub).await;
    }

    #[tokio::test]
    async fn rapid_signals_coalesce() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(CancellationToken::new());
        expect_event(&mut sub).await;

        for _ in 0..5 {
            broker.signal();
        }
        expect_event(&mut sub).await;
        expect_quiet(&mut sub).await;
    }

    #[tokio::test]
    async fn signals_while_busy_yield_one_catch_up() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(CancellationToken::new());
        expect_event(&mut sub).await;

        broker.signal();
        expect_event(&mut sub).await;
        // Subscriber is "busy" here; these land before it waits again.
        broker.signal();
        broker.signal();
        broker.signal();
        expect_event(&mut sub).await;
        expect_quiet(&mut sub).await;
    }

    #[tokio::test]
    async fn every_subscriber_woken_once() {
        let broker = Broker::new();
        let mut first = broker.subscribe(CancellationToken::new());
        let mut second = broker.subscribe(CancellationToken::new());
        expect_event(&mut first).await;
        expect_event(&mut second).await;

        broker.signal();
        expect_event(&mut first).await;
        expect_event(&mut second).await;
        expect_quiet(&mut first).await;
        expect_quiet(&mut second).await;
    }

    #[tokio::test]
    async fn signal_before_first_wait_is_delivered() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(CancellationToken::new());
        broker.signal();
        expect_event(&mut sub).await;
        expect_event(&mut sub).await;
        expect_quiet(&mut sub).await;
    }

    #[tokio::test]
    async fn signal_without_subscribers_is_harmless() {
        let broker = Broker::new();
        broker.signal();
        broker.signal();
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscriber_count_tracks_drops() {
        let broker = Broker::new();
        let first = broker.subscribe(CancellationToken::new());
        let second = broker.subscribe(CancellationToken::new());
        assert_eq!(broker.subscriber_count(), 2);
        drop(first);
        assert_eq!(broker.subscriber_count(), 1);
        drop(second);
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn watch_streams_until_cancelled() {
        let broker = Broker::new();
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(1);

        let task = {
            let broker = broker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut sink = tx;
                broker.watch(&mut sink, cancel).await
            })
        };

        let Ok(Some(_)) = timeout(WAIT, rx.recv()).await else {
            panic!("not received the first event");
        };

        broker.signal();
        let Ok(Some(_)) = timeout(WAIT, rx.recv()).await else {
            panic!("not received the change event");
        };
        assert!(rx.try_recv().is_err());

        let mut second = broker.subscribe(CancellationToken::new());
        expect_event(&mut second).await;
        broker.signal();
        let Ok(Some(_)) = timeout(WAIT, rx.recv()).await else {
            panic!("first subscriber not woken");
        };
        expect_event(&mut second).await;

        cancel.cancel();
        let Ok(Ok(result)) = timeout(WAIT, task).await else {
            panic!("watch did not finish after cancel");
        };
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cancel_unblocks_parked_watch() {
        let broker = Broker::new();
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(4);

        let task = {
            let broker = broker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut sink = tx;
                broker.watch(&mut sink, cancel).await
            })
        };
        let Ok(Some(_)) = timeout(WAIT, rx.recv()).await else {
            panic!("not received the first event");
        };

        cancel.cancel();
        let Ok(Ok(result)) = timeout(WAIT, task).await else {
            panic!("watch still parked after cancel");
        };
        assert!(result.is_ok());
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn transport_failure_ends_only_that_subscription() {
        let broker = Broker::new();
        let mut healthy = broker.subscribe(CancellationToken::new());
        expect_event(&mut healthy).await;

        let result = broker
            .watch(&mut FailingSink, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(LvmdError::TransportFailure(_))));
        assert_eq!(broker.subscriber_count(), 1);

        broker.signal();
        expect_event(&mut healthy).await;
    }

    #[tokio::test]
    async fn signals_during_stuck_send_become_one_catch_up() {
        let broker = Broker::new();
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(1);

        let task = {
            let broker = broker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut sink = tx;
                broker.watch(&mut sink, cancel).await
            })
        };

        while broker.subscriber_count() == 0 {
            tokio::task::yield_now().await;
        }
        // The initial event fills the only slot; the next send parks.
        broker.signal();
        tokio::time::sleep(QUIET).await;
        for _ in 0..3 {
            broker.signal();
        }
        tokio::time::sleep(QUIET).await;

        let mut received = 0;
        while let Ok(Some(_)) = timeout(QUIET, rx.recv()).await {
            received += 1;
        }
        // Initial, the parked event, then one catch-up for the three signals.
        assert_eq!(received, 3);

        cancel.cancel();
        let Ok(Ok(result)) = timeout(WAIT, task).await else {
            panic!("watch did not finish after cancel");
        };
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cancelled_subscription_yields_nothing() {
        let broker = Broker::new();
        let cancel = CancellationToken::new();
        let mut sub = broker.subscribe(cancel.clone());
        cancel.cancel();
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn brokers_are_independent() {
        let a = Broker::new();
        let b = Broker::new();
        let mut sub = b.subscribe(CancellationToken::new());
        expect_event(&mut sub).await;
        a.signal();
        expect_quiet(&mut sub).await;
    }
}
