//! The convergence poll loop.

use super::config::{PollConfig, PollError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// PollTarget produces a fresh snapshot of the polled resource on every tick.
pub trait PollTarget {
    type State;
    type Error;

    fn fetch(&self) -> impl Future<Output = Result<Self::State, Self::Error>> + Send;
}

impl<F, Fut, T, E> PollTarget for F
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send,
{
    type State = T;
    type Error = E;

    fn fetch(&self) -> impl Future<Output = Result<T, E>> + Send {
        self()
    }
}

/// PollTick is what the predicate sees on each evaluation.
#[derive(Debug)]
pub struct PollTick<'a, T, E> {
    /// 1-based evaluation counter.
    pub attempt: usize,
    /// Time since the poll began.
    pub elapsed: Duration,
    /// Result of this tick's fetch.
    pub result: &'a Result<T, E>,
}

impl<T, E> PollTick<'_, T, E> {
    /// Returns the fetched state, if the fetch succeeded.
    pub fn state(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// Returns the fetch error, if the fetch failed.
    pub fn error(&self) -> Option<&E> {
        self.result.as_ref().err()
    }
}

/// PollOutcome tells why a poll stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The predicate asked to stop.
    Satisfied,
    /// The timeout elapsed while the predicate still asked to continue.
    DeadlineExceeded,
    /// The cancellation token fired.
    Cancelled,
}

/// PollReport summarizes a finished poll. It carries no verdict on the polled
/// resource; callers re-inspect state to learn whether it converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    /// Number of predicate evaluations.
    pub attempts: usize,
    pub elapsed: Duration,
}

/// Poller repeatedly fetches a target and evaluates a predicate against it.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    /// Creates a poller. Fails if `config` does not pass [`PollConfig::validate`].
    pub fn new(config: PollConfig) -> Result<Self, PollError> {
        config.validate()?;
        Ok(Poller { config })
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Polls `target` until `predicate` returns false, the configured timeout elapses,
    /// or `cancel` fires.
    ///
    /// The first fetch and evaluation happen immediately. The token is checked before
    /// every fetch, and both the fetch and the sleep between ticks end as soon as it
    /// fires. Fetch errors are handed to the predicate as they are.
    pub async fn poll<P, F>(
        &self,
        cancel: &CancellationToken,
        target: &P,
        mut predicate: F,
    ) -> PollReport
    where
        P: PollTarget,
        F: FnMut(&PollTick<'_, P::State, P::Error>) -> bool,
    {
        let start = Instant::now();
        let mut attempts = 0;
        let report = |outcome, attempts| PollReport {
            outcome,
            attempts,
            elapsed: start.elapsed(),
        };

        loop {
            if cancel.is_cancelled() {
                debug!(attempts, "poll cancelled");
                return report(PollOutcome::Cancelled, attempts);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempts, "poll cancelled during fetch");
                    return report(PollOutcome::Cancelled, attempts);
                }
                result = target.fetch() => result,
            };

            attempts += 1;
            let elapsed = start.elapsed();
            let tick = PollTick {
                attempt: attempts,
                elapsed,
                result: &result,
            };
            if !predicate(&tick) {
                info!(attempts, ?elapsed, "poll condition satisfied");
                return report(PollOutcome::Satisfied, attempts);
            }
            if elapsed >= self.config.timeout {
                warn!(
                    attempts,
                    ?elapsed,
                    timeout = ?self.config.timeout,
                    "poll deadline exceeded"
                );
                return report(PollOutcome::DeadlineExceeded, attempts);
            }
            debug!(attempts, ?elapsed, "poll condition not met, still waiting");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempts, "poll cancelled while waiting");
                    return report(PollOutcome::Cancelled, attempts);
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn poller(interval_secs: u64, timeout_secs: u64) -> Poller {
        Poller::new(PollConfig::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        ))
        .unwrap()
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Poller::new(PollConfig::new(Duration::ZERO, Duration::from_millis(200)))
            .unwrap_err();
        assert!(matches!(err, PollError::InvalidConfig(_)));
    }

    #[test]
    fn test_default_config_accepted() {
        let poller = Poller::new(PollConfig::default()).unwrap();
        assert_eq!(poller.config(), Poller::default().config());
    }

    fn counting_target(
        fetches: &Arc<AtomicUsize>,
    ) -> impl Fn() -> std::future::Ready<Result<usize, String>> {
        let fetches = Arc::clone(fetches);
        move || std::future::ready(Ok(fetches.fetch_add(1, Ordering::SeqCst) + 1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_check() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let target = counting_target(&fetches);

        let report = poller(1, 60)
            .poll(&CancellationToken::new(), &target, |_| false)
            .await;

        assert_eq!(report.outcome, PollOutcome::Satisfied);
        assert_eq!(report.attempts, 1);
        assert!(report.elapsed < Duration::from_secs(1));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_condition_met() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let target = counting_target(&fetches);

        let report = poller(1, 60)
            .poll(&CancellationToken::new(), &target, |tick| {
                tick.state().copied().unwrap_or(0) < 4
            })
            .await;

        assert_eq!(report.outcome, PollOutcome::Satisfied);
        assert_eq!(report.attempts, 4);
        assert_eq!(report.elapsed, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bound() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let target = counting_target(&fetches);

        let report = poller(1, 5)
            .poll(&CancellationToken::new(), &target, |_| true)
            .await;

        assert_eq!(report.outcome, PollOutcome::DeadlineExceeded);
        assert!(report.elapsed >= Duration::from_secs(5));
        assert!(report.elapsed <= Duration::from_secs(6));
        assert_eq!(report.attempts, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_sees_elapsed_time() {
        let target = || std::future::ready(Ok::<(), String>(()));
        let mut seen = Vec::new();

        poller(2, 60)
            .poll(&CancellationToken::new(), &target, |tick| {
                seen.push((tick.attempt, tick.elapsed));
                tick.attempt < 3
            })
            .await;

        assert_eq!(
            seen,
            vec![
                (1, Duration::ZERO),
                (2, Duration::from_secs(2)),
                (3, Duration::from_secs(4)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let target = counting_target(&fetches);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut evaluations = 0;
        let report = poller(1, 60)
            .poll(&cancel, &target, |_| {
                evaluations += 1;
                true
            })
            .await;

        assert_eq!(report.outcome, PollOutcome::Cancelled);
        assert_eq!(report.attempts, 0);
        assert_eq!(evaluations, 0);
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let target = counting_target(&fetches);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let mut evaluations = 0;
        let report = poller(1, 60)
            .poll(&cancel, &target, |_| {
                evaluations += 1;
                true
            })
            .await;

        assert_eq!(report.outcome, PollOutcome::Cancelled);
        assert_eq!(evaluations, 3);
        assert!(report.elapsed >= Duration::from_millis(2500));
        assert!(report.elapsed < Duration::from_secs(3));
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_fetch() {
        let target = || std::future::pending::<Result<(), String>>();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let mut evaluations = 0;
        let report = poller(1, 60)
            .poll(&cancel, &target, |_| {
                evaluations += 1;
                true
            })
            .await;

        assert_eq!(report.outcome, PollOutcome::Cancelled);
        assert_eq!(report.attempts, 0);
        assert_eq!(evaluations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_reach_predicate() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let target = {
            let fetches = Arc::clone(&fetches);
            move || {
                let n = fetches.fetch_add(1, Ordering::SeqCst);
                std::future::ready(if n < 2 {
                    Err(format!("fetch {} failed", n))
                } else {
                    Ok(n)
                })
            }
        };

        let mut errors = Vec::new();
        let report = poller(1, 60)
            .poll(&CancellationToken::new(), &target, |tick| {
                if let Some(e) = tick.error() {
                    errors.push(e.clone());
                    return true;
                }
                false
            })
            .await;

        assert_eq!(report.outcome, PollOutcome::Satisfied);
        assert_eq!(report.attempts, 3);
        assert_eq!(errors, vec!["fetch 0 failed", "fetch 1 failed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_can_give_up_on_error() {
        let target = || std::future::ready(Err::<(), _>("forbidden".to_string()));
        let report = poller(1, 60)
            .poll(&CancellationToken::new(), &target, |tick| tick.error().is_none())
            .await;

        assert_eq!(report.outcome, PollOutcome::Satisfied);
        assert_eq!(report.attempts, 1);
    }
}
