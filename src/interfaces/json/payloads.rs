//! Decoders for the opaque byte payloads returned by the engine.
//!
//! The engine bridge cannot pass structured collections, so proposals and
//! orders arrive as serialized JSON. Decoders here are strict; leniency
//! policy (treating a missing proposal list as empty) belongs to the façade.

use crate::domain::payment::Order;
use crate::domain::proposal::ProposalsResponse;

pub fn decode_proposals(bytes: &[u8]) -> serde_json::Result<ProposalsResponse> {
    serde_json::from_slice(bytes)
}

pub fn decode_order(bytes: &[u8]) -> serde_json::Result<Order> {
    serde_json::from_slice(bytes)
}

pub fn decode_orders(bytes: &[u8]) -> serde_json::Result<Vec<Order>> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::OrderStatus;

    #[test]
    fn test_decode_proposals() {
        let bytes = br#"{"proposals":[{"providerId":"0xaa","serviceType":"wireguard","countryCode":"DE","qualityLevel":2}]}"#;
        let response = decode_proposals(bytes).unwrap();
        let proposals = response.proposals.unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].provider_id, "0xaa");
        assert_eq!(proposals[0].country_code, "DE");
        // Omitted price fields default to zero.
        assert_eq!(proposals[0].price_per_gib, 0.0);
    }

    #[test]
    fn test_decode_proposals_null_field() {
        let response = decode_proposals(br#"{"proposals":null}"#).unwrap();
        assert!(response.proposals.is_none());

        let response = decode_proposals(br#"{}"#).unwrap();
        assert!(response.proposals.is_none());
    }

    #[test]
    fn test_decode_proposals_garbage() {
        assert!(decode_proposals(b"not json").is_err());
    }

    #[test]
    fn test_decode_order() {
        let bytes = br#"{"id":42,"status":"pending","currency":"MYST","amount":"5.5"}"#;
        let order = decode_order(bytes).unwrap();
        assert_eq!(order.id, 42);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.currency.as_deref(), Some("MYST"));
    }

    #[test]
    fn test_decode_order_garbage() {
        assert!(decode_order(b"<html>busy</html>").is_err());
        // A syntactically valid payload missing required fields is also malformed.
        assert!(decode_order(br#"{"currency":"MYST"}"#).is_err());
    }

    #[test]
    fn test_decode_orders() {
        let bytes = br#"[{"id":1,"status":"paid"},{"id":2,"status":"expired"}]"#;
        let orders = decode_orders(bytes).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].status, OrderStatus::Expired);
    }
}
