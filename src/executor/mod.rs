//! Probe supervision
//!
//! Every long-running probe runs in its own task. Launching a probe of a
//! kind that is already running first cancels the earlier one and waits for
//! it to finish, so two probes of the same kind never feed one result sink
//! at the same time.

use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::types::ProbeKind;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Bookkeeping for the most recent probe of one kind
#[derive(Clone)]
struct Slot {
    cancel: CancellationToken,
    /// Cancelled when the task ends, including by panic
    done: CancellationToken,
}

pub struct ProbeSupervisor {
    /// Held only for lookups and inserts, never across an await on a probe
    slots: Mutex<HashMap<ProbeKind, Slot>>,
    /// Serializes launches so a replacement waits for its predecessor
    launching: Mutex<()>,
    logger: Arc<Logger>,
}

impl ProbeSupervisor {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            launching: Mutex::new(()),
            logger,
        }
    }

    /// Start `probe` in a new task, replacing any outstanding probe of `kind`
    ///
    /// The closure receives the token the new probe must observe.
    pub async fn launch<T, F, Fut>(&self, kind: ProbeKind, probe: F) -> ProbeHandle<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let _serial = self.launching.lock().await;

        // The previous slot stays registered so cancel_all still reaches it
        let previous = self.slots.lock().await.get(&kind).map(Slot::clone);
        if let Some(previous) = previous.filter(|slot| !slot.done.is_cancelled()) {
            self.logger
                .info(&format!("Stopping running {} probe before starting a new one", kind))
                .log()
                .await;
            previous.cancel.cancel();
            previous.done.cancelled().await;
        }

        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        let guard = done.clone().drop_guard();
        let future = probe(cancel.clone());

        let task = tokio::spawn(async move {
            let _finished = guard;
            future.await
        });

        self.slots.lock().await.insert(
            kind,
            Slot {
                cancel: cancel.clone(),
                done,
            },
        );

        self.logger.debug(&format!("Launched {} probe", kind)).log().await;

        ProbeHandle { kind, cancel, task }
    }

    /// Request cancellation of every outstanding probe
    pub async fn cancel_all(&self) {
        for slot in self.slots.lock().await.values() {
            slot.cancel.cancel();
        }
    }
}

/// Caller's side of a launched probe
pub struct ProbeHandle<T> {
    kind: ProbeKind,
    cancel: CancellationToken,
    task: JoinHandle<T>,
}

impl<T> ProbeHandle<T> {
    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    /// Ask the probe to stop; it finishes with whatever it has so far
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the probe's output; a panic becomes `AppError::Internal`
    pub async fn wait(self) -> Result<T> {
        let kind = self.kind;
        self.task.await.map_err(|e| {
            if e.is_panic() {
                AppError::internal(format!("{} probe panicked", kind))
            } else {
                AppError::from(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn supervisor() -> ProbeSupervisor {
        ProbeSupervisor::new(Arc::new(Logger::quiet("SUPERVISOR")))
    }

    #[tokio::test]
    async fn test_second_launch_cancels_first() {
        let supervisor = supervisor();
        let first_finished = Arc::new(AtomicBool::new(false));

        let flag = first_finished.clone();
        let first = supervisor
            .launch(ProbeKind::Scan, move |cancel| async move {
                cancel.cancelled().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
                flag.store(true, Ordering::SeqCst);
                "first"
            })
            .await;

        let observed = first_finished.clone();
        let second = supervisor
            .launch(ProbeKind::Scan, move |_cancel| async move {
                assert!(observed.load(Ordering::SeqCst), "first probe still running");
                "second"
            })
            .await;

        assert_eq!(first.wait().await.unwrap(), "first");
        assert_eq!(second.wait().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_different_kinds_run_side_by_side() {
        let supervisor = supervisor();
        let ping = supervisor
            .launch(ProbeKind::Ping, |cancel| async move {
                cancel.cancelled().await;
                1
            })
            .await;
        let trace = supervisor.launch(ProbeKind::Trace, |_| async { 2 }).await;

        assert_eq!(trace.wait().await.unwrap(), 2);
        assert!(!ping.cancel_token().is_cancelled());
        ping.cancel();
        assert_eq!(ping.wait().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let supervisor = supervisor();
        let handle = supervisor
            .launch(ProbeKind::Detect, |_| async {
                panic!("boom");
            })
            .await;
        let err: AppError = handle.wait().await.map(|()| ()).unwrap_err();
        assert_eq!(err.category(), "INTERNAL");

        // A panicked probe does not block the next launch of its kind
        let next = supervisor.launch(ProbeKind::Detect, |_| async { 5 }).await;
        assert_eq!(next.wait().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_cancel_all_during_replacement_does_not_stall() {
        let supervisor = Arc::new(supervisor());
        let (release, released) = tokio::sync::oneshot::channel::<()>();

        // Ignores its token, like a detection pass
        let stubborn = supervisor
            .launch(ProbeKind::Detect, |_cancel| async move {
                let _ = released.await;
                "stubborn"
            })
            .await;

        let replacing = {
            let supervisor = supervisor.clone();
            tokio::spawn(async move {
                supervisor
                    .launch(ProbeKind::Detect, |_| async { "replacement" })
                    .await
                    .wait()
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!replacing.is_finished());

        tokio::time::timeout(Duration::from_secs(1), supervisor.cancel_all())
            .await
            .expect("cancel_all blocked behind a pending launch");

        release.send(()).unwrap();
        assert_eq!(stubborn.wait().await.unwrap(), "stubborn");
        assert_eq!(replacing.await.unwrap().unwrap(), "replacement");
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let supervisor = supervisor();
        let handle = supervisor
            .launch(ProbeKind::SpeedTest, |cancel| async move {
                cancel.cancelled().await;
                "stopped"
            })
            .await;
        supervisor.cancel_all().await;
        assert_eq!(handle.wait().await.unwrap(), "stopped");
    }
}
