use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment order states reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Expired,
    Invalid,
    Canceled,
    Refunded,
}

impl OrderStatus {
    /// Parses the raw status string carried by order-updated events.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "expired" => Some(Self::Expired),
            "invalid" => Some(Self::Invalid),
            "canceled" => Some(Self::Canceled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
            Self::Canceled => "canceled",
            Self::Refunded => "refunded",
        }
    }
}

/// A top-up payment order created through the engine.
///
/// Created by `create_order` and mutated only by order-updated events
/// matched on `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub status: OrderStatus,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Structured order-updated event delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdatedEvent {
    pub order_id: String,
    pub status: OrderStatus,
}

/// Terminal outcome of a payment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Successful,
    Expired,
    Failed,
    Canceled,
}

impl PaymentOutcome {
    /// Maps a reported status to its terminal outcome. `Pending` is not
    /// terminal and produces no outcome.
    pub fn from_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Paid => Some(Self::Successful),
            OrderStatus::Expired => Some(Self::Expired),
            OrderStatus::Invalid | OrderStatus::Refunded => Some(Self::Failed),
            OrderStatus::Canceled => Some(Self::Canceled),
            OrderStatus::Pending => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOrderRequest {
    pub identity_address: String,
    pub myst_amount: f64,
    pub pay_currency: String,
    pub lightning: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOrdersRequest {
    pub identity_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Expired,
            OrderStatus::Invalid,
            OrderStatus::Canceled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("settled"), None);
    }

    #[test]
    fn test_terminal_outcome_mapping() {
        assert_eq!(
            PaymentOutcome::from_status(OrderStatus::Paid),
            Some(PaymentOutcome::Successful)
        );
        assert_eq!(
            PaymentOutcome::from_status(OrderStatus::Expired),
            Some(PaymentOutcome::Expired)
        );
        // Both invalid and refunded collapse to a failed payment.
        assert_eq!(
            PaymentOutcome::from_status(OrderStatus::Invalid),
            Some(PaymentOutcome::Failed)
        );
        assert_eq!(
            PaymentOutcome::from_status(OrderStatus::Refunded),
            Some(PaymentOutcome::Failed)
        );
        assert_eq!(
            PaymentOutcome::from_status(OrderStatus::Canceled),
            Some(PaymentOutcome::Canceled)
        );
        assert_eq!(PaymentOutcome::from_status(OrderStatus::Pending), None);
    }
}
