use crate::application::deferred::DeferredNode;
use crate::domain::connection::Statistics;
use crate::domain::payment::{OrderStatus, OrderUpdatedEvent};
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Depth of the hand-off queue between the engine's notification thread and
/// a subscriber's dispatch task. A subscriber that falls this far behind
/// starts delaying the engine thread.
const EVENT_QUEUE_DEPTH: usize = 64;

/// Registration point for the four engine event streams: status,
/// statistics, balance and order updates.
///
/// The engine keeps a single callback slot per stream, so each stream
/// carries one subscriber at a time and registering again replaces the
/// previous subscriber. There is no unregistration: a subscription lives as
/// long as the engine. Within one stream events are delivered in arrival
/// order; nothing is guaranteed across streams.
///
/// Engine callbacks run on the engine's own notification thread. Each
/// registration therefore only moves the payload onto a bounded queue and
/// lets a spawned dispatch task run the subscriber. Slow subscriber code can
/// fill the queue and delay the engine thread, but never blocks the runtime.
pub struct EventHub {
    node: Arc<DeferredNode>,
}

impl EventHub {
    pub fn new(node: Arc<DeferredNode>) -> Self {
        Self { node }
    }

    /// Subscribes to raw connection status strings.
    pub async fn on_status<F>(&self, subscriber: F) -> Result<()>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let engine = self.node.engine().await?;
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        engine
            .register_status_callback(Box::new(move |status| {
                let _ = tx.blocking_send(status);
            }))
            .await;
        spawn_dispatch(rx, subscriber);
        Ok(())
    }

    /// Subscribes to traffic statistics updates.
    pub async fn on_statistics<F>(&self, subscriber: F) -> Result<()>
    where
        F: Fn(Statistics) + Send + Sync + 'static,
    {
        let engine = self.node.engine().await?;
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        engine
            .register_statistics_callback(Box::new(
                move |duration_secs, bytes_received, bytes_sent, tokens_spent| {
                    let _ = tx.blocking_send(Statistics {
                        duration_secs,
                        bytes_received,
                        bytes_sent,
                        tokens_spent,
                    });
                },
            ))
            .await;
        spawn_dispatch(rx, subscriber);
        Ok(())
    }

    /// Subscribes to balance changes. The engine reports the identity
    /// address alongside the amount; only the scalar balance is delivered.
    pub async fn on_balance<F>(&self, subscriber: F) -> Result<()>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let engine = self.node.engine().await?;
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        engine
            .register_balance_callback(Box::new(move |_address, balance| {
                let _ = tx.blocking_send(balance);
            }))
            .await;
        spawn_dispatch(rx, subscriber);
        Ok(())
    }

    /// Subscribes to payment order updates. Events carrying a status string
    /// this crate does not know are dropped with a warning.
    pub async fn on_order_updated<F>(&self, subscriber: F) -> Result<()>
    where
        F: Fn(OrderUpdatedEvent) + Send + Sync + 'static,
    {
        let engine = self.node.engine().await?;
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        engine
            .register_order_updated_callback(Box::new(move |order_id, status| {
                match OrderStatus::parse(&status) {
                    Some(status) => {
                        let _ = tx.blocking_send(OrderUpdatedEvent { order_id, status });
                    }
                    None => {
                        tracing::warn!(%order_id, %status, "dropping order update with unknown status");
                    }
                }
            }))
            .await;
        spawn_dispatch(rx, subscriber);
        Ok(())
    }
}

fn spawn_dispatch<T, F>(mut rx: mpsc::Receiver<T>, subscriber: F)
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            subscriber(event);
        }
    });
}
