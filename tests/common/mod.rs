use dvpn_node_client::application::deferred::DeferredNode;
use dvpn_node_client::domain::ports::EngineRef;
use dvpn_node_client::infrastructure::in_memory::InMemoryEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Builds a node handle already started over a fresh in-memory engine and
/// returns both, so tests can script and emit through the engine directly.
pub fn started_node() -> (Arc<DeferredNode>, InMemoryEngine) {
    let engine = InMemoryEngine::new();
    let node = Arc::new(DeferredNode::new());
    let boot = engine.clone();
    node.start(move || async move { Ok(Arc::new(boot) as EngineRef) });
    (node, engine)
}

pub async fn recv_timeout<T>(rx: &mut UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Asserts that nothing arrives on the channel within a grace period.
pub async fn expect_silence<T>(rx: &mut UnboundedReceiver<T>) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err(), "unexpected event delivered");
}
