//! Exactly-once release of the sessions created by one aggregation.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::error::MuxError;
use crate::util::timeout::with_timeout;

use super::session::ToolSession;

/// What a teardown run achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownSummary {
    pub closed: usize,
    pub failed: usize,
}

type TeardownTask = Shared<BoxFuture<'static, TeardownSummary>>;

struct TeardownInner {
    sessions: Vec<Arc<dyn ToolSession>>,
    task: OnceLock<TeardownTask>,
    timeout: Duration,
    finished: CancellationToken,
}

impl TeardownInner {
    /// The single disconnect task, spawned on first use.
    ///
    /// Spawning happens before any await, so a caller that drops its future
    /// early never causes a second run.
    fn task(&self) -> TeardownTask {
        self.task
            .get_or_init(|| {
                let sessions = self.sessions.clone();
                let count = sessions.len();
                let timeout = self.timeout;
                let finished = self.finished.clone();
                let handle = tokio::spawn(async move {
                    let summary = disconnect_all(sessions, timeout).await;
                    finished.cancel();
                    summary
                });
                async move {
                    handle.await.unwrap_or(TeardownSummary {
                        closed: 0,
                        failed: count,
                    })
                }
                .boxed()
                .shared()
            })
            .clone()
    }

    async fn run(&self) -> TeardownSummary {
        self.task().await
    }
}

async fn disconnect_all(
    sessions: Vec<Arc<dyn ToolSession>>,
    timeout: Duration,
) -> TeardownSummary {
    let results = join_all(sessions.iter().map(|session| async move {
        match with_timeout(timeout, session.disconnect()).await {
            Ok(()) => true,
            Err(error) => {
                let error = MuxError::teardown(session.endpoint(), error);
                warn!(%error, "MCP session teardown failed");
                false
            }
        }
    }))
    .await;

    let closed = results.iter().filter(|ok| **ok).count();
    let summary = TeardownSummary {
        closed,
        failed: results.len() - closed,
    };
    debug!(closed = summary.closed, failed = summary.failed, "MCP sessions torn down");
    summary
}

/// Shared handle that releases every session of one aggregation, once.
///
/// Teardown runs on the first of: an explicit [`teardown`](Self::teardown)
/// call, the aggregation's cancellation token firing, or the last clone of
/// the handle being dropped.
#[derive(Clone)]
pub struct TeardownHandle {
    inner: Arc<TeardownInner>,
    _release: Arc<DropGuard>,
}

impl TeardownHandle {
    /// Take ownership of `sessions` and arm the automatic triggers.
    pub fn spawn(
        sessions: Vec<Arc<dyn ToolSession>>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let inner = Arc::new(TeardownInner {
            sessions,
            task: OnceLock::new(),
            timeout,
            finished: CancellationToken::new(),
        });
        let released = CancellationToken::new();
        let guard = released.clone().drop_guard();

        let watcher = Arc::clone(&inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = watcher.finished.cancelled() => return,
                _ = cancel.cancelled() => debug!("aggregation cancelled; tearing down sessions"),
                _ = released.cancelled() => debug!("teardown handle released; tearing down sessions"),
            }
            watcher.run().await;
        });

        Self {
            inner,
            _release: Arc::new(guard),
        }
    }

    /// Disconnect every session, each bounded by the teardown timeout.
    ///
    /// Failures are logged, never returned. Later calls wait for and return
    /// the first run's summary without disconnecting again.
    pub async fn teardown(&self) -> TeardownSummary {
        self.inner.run().await
    }

    /// Whether a teardown run has completed.
    pub fn is_torn_down(&self) -> bool {
        self.summary().is_some()
    }

    pub fn summary(&self) -> Option<TeardownSummary> {
        self.inner.task.get().and_then(|task| task.peek().copied())
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}

impl std::fmt::Debug for TeardownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeardownHandle")
            .field("sessions", &self.session_count())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
