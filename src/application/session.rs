use crate::application::events::EventHub;
use crate::application::facade::NodeClient;
use crate::domain::payment::{CreateOrderRequest, Order, PaymentOutcome};
use crate::error::Result;
use std::sync::{Arc, Mutex, PoisonError};

/// Coordinates the top-up payment workflow, the one place a
/// request/response call is correlated with a later push event.
///
/// The order-updated subscription is installed before the order is
/// submitted, so a payment that settles immediately cannot race past it.
/// Incoming events are filtered against the pending order id; everything
/// else is ignored, not buffered.
pub struct PaymentSession {
    client: Arc<NodeClient>,
    events: EventHub,
    pending_order: Arc<Mutex<Option<String>>>,
}

impl PaymentSession {
    pub fn new(client: Arc<NodeClient>, events: EventHub) -> Self {
        Self {
            client,
            events,
            pending_order: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a payment order and reports its terminal outcome through
    /// `on_outcome`.
    ///
    /// Matching events map onto `PaymentOutcome`; non-matching order ids and
    /// non-terminal (`pending`) updates produce nothing. Registration uses
    /// the engine's replacement semantics, so calling this again within one
    /// session simply re-installs the subscription. No timeout is applied
    /// here: an order that never settles stays pending, and callers decide
    /// how long that is worth waiting for.
    pub async fn create_order<F>(&self, req: &CreateOrderRequest, on_outcome: F) -> Result<Order>
    where
        F: Fn(PaymentOutcome) + Send + Sync + 'static,
    {
        let pending = Arc::clone(&self.pending_order);
        self.events
            .on_order_updated(move |event| {
                let matches = pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .as_deref()
                    == Some(event.order_id.as_str());
                if !matches {
                    return;
                }
                if let Some(outcome) = PaymentOutcome::from_status(event.status) {
                    on_outcome(outcome);
                }
            })
            .await?;

        let order = self.client.create_payment_order(req).await?;
        *self
            .pending_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(order.id.to_string());
        Ok(order)
    }
}
