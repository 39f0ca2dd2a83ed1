//! Application layer containing the orchestration around the node engine.
//!
//! This module defines the `DeferredNode` bootstrap gate every other piece
//! waits on, the `NodeClient` façade for request/response operations, the
//! `EventHub` fan-out for push notifications, and the `PaymentSession`
//! coordinator that joins the two for the payment-order workflow.

pub mod deferred;
pub mod events;
pub mod facade;
pub mod session;
