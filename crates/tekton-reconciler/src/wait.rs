//! Bounded polling for a remote object to reach a lifecycle state.
//!
//! Each tick calls a refresh function once. The loop ends when the observed
//! state is a target, when the object is gone and no target was given, on
//! the first refresh error, on an unexpected state, when the deadline
//! passes or when cancellation is signalled.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use crate::error::{ObjectRef, Operation, ReconcileError, Result};
use crate::state::LifecycleState;

/// One observation made by a refresh call.
#[derive(Debug)]
pub struct Observation<T> {
    pub state: LifecycleState,
    /// `None` when the object could not be read.
    pub value: Option<T>,
}

impl<T> Observation<T> {
    pub fn found(state: LifecycleState, value: T) -> Self {
        Self {
            state,
            value: Some(value),
        }
    }

    pub fn absent(state: LifecycleState) -> Self {
        Self { state, value: None }
    }
}

/// Cooperative cancellation observed by the poll loop on every tick.
///
/// Backed by a `watch` channel; `true` means stop. A closed channel never
/// cancels.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// A token that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Sleeps until `deadline`. Returns `true` if cancelled first.
    pub async fn sleep_until(&mut self, deadline: Instant) -> bool {
        loop {
            let Some(rx) = self.rx.as_mut() else {
                sleep_until(deadline).await;
                return false;
            };
            let mut closed = false;
            tokio::select! {
                biased;

                changed = rx.changed() => match changed {
                    Ok(()) if *rx.borrow() => return true,
                    Ok(()) => {}
                    Err(_) => closed = true,
                },
                _ = sleep_until(deadline) => return false,
            }
            if closed {
                self.rx = None;
            }
        }
    }
}

impl From<watch::Receiver<bool>> for Cancellation {
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }
}

/// Describes what to wait for.
#[derive(Debug, Clone)]
pub struct StateWait {
    pub pending: &'static [LifecycleState],
    /// Empty means "until the object is gone".
    pub target: &'static [LifecycleState],
    pub timeout: Duration,
    pub interval: Duration,
}

impl StateWait {
    fn target_name(&self) -> String {
        if self.target.is_empty() {
            return "removal".to_string();
        }
        self.target
            .iter()
            .map(LifecycleState::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Polls `refresh` until done. Returns the value of the final
    /// observation, `None` when the wait ended on absence.
    pub async fn run<T, F, Fut>(
        &self,
        object: &ObjectRef,
        operation: Operation,
        cancel: &mut Cancellation,
        mut refresh: F,
    ) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Observation<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut ticks = 0u32;

        loop {
            if cancel.is_cancelled() {
                tracing::info!(object = %object, operation = %operation, ticks, "wait cancelled");
                return Err(ReconcileError::Cancelled {
                    object: object.clone(),
                    operation,
                });
            }

            ticks += 1;
            let observation = match refresh().await {
                Ok(observation) => observation,
                Err(e) => {
                    tracing::debug!(
                        object = %object,
                        operation = %operation,
                        ticks,
                        state = %LifecycleState::Failed,
                        error = %e,
                        "poll failed"
                    );
                    return Err(e);
                }
            };
            tracing::debug!(
                object = %object,
                operation = %operation,
                ticks,
                state = %observation.state,
                found = observation.value.is_some(),
                "poll tick"
            );

            if self.target.contains(&observation.state)
                || (self.target.is_empty() && observation.value.is_none())
            {
                return Ok(observation.value);
            }
            if !self.pending.contains(&observation.state) {
                return Err(ReconcileError::UnexpectedState {
                    object: object.clone(),
                    operation,
                    state: observation.state,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(object = %object, operation = %operation, ticks, "wait deadline passed");
                return Err(ReconcileError::Timeout {
                    object: object.clone(),
                    operation,
                    target: self.target_name(),
                    timeout: self.timeout,
                });
            }
            let wake = (now + self.interval).min(deadline);
            if cancel.sleep_until(wake).await {
                tracing::info!(object = %object, operation = %operation, ticks, "wait cancelled");
                return Err(ReconcileError::Cancelled {
                    object: object.clone(),
                    operation,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const CREATING: &[LifecycleState] = &[LifecycleState::Creating];
    const SUCCEEDED: &[LifecycleState] = &[LifecycleState::Succeeded];
    const DELETING: &[LifecycleState] = &[LifecycleState::Deleting];

    fn object() -> ObjectRef {
        ObjectRef::new("Task", "ci", "build")
    }

    fn wait(pending: &'static [LifecycleState], target: &'static [LifecycleState]) -> StateWait {
        StateWait {
            pending,
            target,
            timeout: Duration::from_secs(2),
            interval: Duration::from_millis(500),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaches_target_on_third_tick() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let value = wait(CREATING, SUCCEEDED)
            .run(&object(), Operation::Create, &mut Cancellation::never(), || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Ok(Observation::absent(LifecycleState::Creating))
                    } else {
                        Ok(Observation::found(LifecycleState::Succeeded, n))
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_once() {
        let started = Instant::now();
        let err = wait(CREATING, SUCCEEDED)
            .run(&object(), Operation::Create, &mut Cancellation::never(), || async {
                Ok(Observation::found(LifecycleState::Creating, ()))
            })
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed <= Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_target_ends_on_absence() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let value: Option<()> = wait(DELETING, &[])
            .run(&object(), Operation::Delete, &mut Cancellation::never(), || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(Observation::found(LifecycleState::Deleting, ()))
                    } else {
                        Ok(Observation::absent(LifecycleState::Deleted))
                    }
                }
            })
            .await
            .unwrap();
        assert!(value.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_error_aborts() {
        let err = wait(CREATING, SUCCEEDED)
            .run::<(), _, _>(&object(), Operation::Create, &mut Cancellation::never(), || async {
                Err(ReconcileError::failed(&object(), "Boom", "exploded"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Failed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state() {
        let err = wait(CREATING, SUCCEEDED)
            .run(&object(), Operation::Create, &mut Cancellation::never(), || async {
                Ok(Observation::found(LifecycleState::Deleting, ()))
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::UnexpectedState { state: LifecycleState::Deleting, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_sleep() {
        let (tx, rx) = watch::channel(false);
        let mut cancel = Cancellation::from(rx);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(700)).await;
            let _ = tx.send(true);
        });

        let started = Instant::now();
        let err = wait(CREATING, SUCCEEDED)
            .run(&object(), Operation::Create, &mut cancel, || async {
                Ok(Observation::found(LifecycleState::Creating, ()))
            })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_never_cancels() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let mut cancel = Cancellation::from(rx);
        let err = wait(CREATING, SUCCEEDED)
            .run(&object(), Operation::Create, &mut cancel, || async {
                Ok(Observation::found(LifecycleState::Creating, ()))
            })
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
