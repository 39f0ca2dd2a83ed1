use crate::domain::ports::{EngineError, EngineRef};
use crate::error::NodeError;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Bootstrap lifecycle of the engine. Transitions are monotonic: a handle
/// never moves backwards and a terminal state is never replaced.
#[derive(Clone)]
enum EngineState {
    Unstarted,
    Starting,
    Ready(EngineRef),
    Failed(String),
}

/// Single-flight asynchronous bootstrap gate over the node engine.
///
/// One handle exists per running application session. Many callers may
/// request engine access before, during or after initialization: `start`
/// runs the bootstrap at most once, and every `engine` call suspends until
/// the shared instance is ready or startup has failed. The state cell is
/// guarded by an atomic check-and-set and published through a watch
/// channel, so no lock is held across initialization and every waiter
/// observes the fully initialized instance.
pub struct DeferredNode {
    started: AtomicBool,
    tx: watch::Sender<EngineState>,
    rx: watch::Receiver<EngineState>,
}

impl Default for DeferredNode {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredNode {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(EngineState::Unstarted);
        Self {
            started: AtomicBool::new(false),
            tx,
            rx,
        }
    }

    /// Whether a start attempt was already made.
    pub fn started_or_starting(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Begins engine initialization exactly once.
    ///
    /// The bootstrap closure captures its own configuration and runs on a
    /// spawned task; repeat calls, including concurrent ones, are no-ops
    /// rather than errors. There is no cancellation: once starting, the
    /// handle commits to becoming ready or failing. Must be called from
    /// within a tokio runtime.
    pub fn start<F, Fut>(&self, bootstrap: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<EngineRef, EngineError>> + Send + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.tx.send(EngineState::Starting);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match bootstrap().await {
                Ok(engine) => {
                    let _ = tx.send(EngineState::Ready(engine));
                }
                Err(err) => {
                    tracing::error!(error = %err, "node bootstrap failed");
                    let _ = tx.send(EngineState::Failed(err.to_string()));
                }
            }
        });
    }

    /// Suspends until the engine is ready and returns the shared instance.
    ///
    /// Safe to call before `start`; the caller parks until a start attempt
    /// resolves. Every waiter gets the same instance, or the same
    /// `StartFailed` cause if initialization failed. The handle never
    /// retries on its own.
    pub async fn engine(&self) -> Result<EngineRef, NodeError> {
        let mut rx = self.rx.clone();
        let state = rx
            .wait_for(|state| matches!(state, EngineState::Ready(_) | EngineState::Failed(_)))
            .await
            .map_err(|_| NodeError::StartFailed("bootstrap task dropped".into()))?;
        match &*state {
            EngineState::Ready(engine) => Ok(Arc::clone(engine)),
            EngineState::Failed(cause) => Err(NodeError::StartFailed(cause.clone())),
            EngineState::Unstarted | EngineState::Starting => {
                unreachable!("wait_for only resolves terminal states")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryEngine;
    use std::sync::atomic::AtomicUsize;

    type BootstrapFut =
        std::pin::Pin<Box<dyn Future<Output = Result<EngineRef, EngineError>> + Send>>;

    fn counting_bootstrap(counter: Arc<AtomicUsize>) -> impl FnOnce() -> BootstrapFut + Send {
        move || -> BootstrapFut {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Arc::new(InMemoryEngine::new()) as EngineRef) })
        }
    }

    #[tokio::test]
    async fn test_repeat_start_is_noop() {
        let node = DeferredNode::new();
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(!node.started_or_starting());
        node.start(counting_bootstrap(Arc::clone(&counter)));
        node.start(counting_bootstrap(Arc::clone(&counter)));
        assert!(node.started_or_starting());

        node.engine().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waiter_parks_until_start() {
        let node = Arc::new(DeferredNode::new());

        let waiter = {
            let node = Arc::clone(&node);
            tokio::spawn(async move { node.engine().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;

        node.start(|| async { Ok(Arc::new(InMemoryEngine::new()) as EngineRef) });
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failure_reaches_pending_and_future_waiters() {
        let node = Arc::new(DeferredNode::new());

        let pending = {
            let node = Arc::clone(&node);
            tokio::spawn(async move { node.engine().await.map(|_| ()) })
        };
        node.start(|| async { Err(EngineError::call("keystore locked")) });

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, NodeError::StartFailed(ref cause) if cause.contains("keystore locked")));

        // Late waiters see the same terminal failure; nothing retries.
        let err = node.engine().await.map(|_| ()).unwrap_err();
        assert!(matches!(err, NodeError::StartFailed(_)));
    }
}
