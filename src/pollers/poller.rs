//! Poller
//!
//! Drives a [`PollerType`] until the operation reaches a terminal state.
//! The loop is a single async call from the caller's point of view: status
//! checks run one after another, separated by sleeps. Cancellation is
//! checked between checks and raced against every sleep; a status check
//! already on the wire is allowed to finish.

use super::{PollResult, PollerType, PollingStatus};
use crate::config::PollerConfig;
use crate::error::{OperationFailure, PollError};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Where the operation stands
#[derive(Debug, Clone)]
enum PollerState {
    InProgress,
    Succeeded(Option<Value>),
    Failed(OperationFailure),
}

/// Handle for one in-flight or finished operation
pub struct Poller {
    poller_type: Option<Box<dyn PollerType>>,
    config: PollerConfig,
    state: PollerState,
    /// Delay before the next status check
    next_interval: Duration,
    status_checks: u32,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("state", &self.state)
            .field("next_interval", &self.next_interval)
            .field("status_checks", &self.status_checks)
            .finish()
    }
}

impl Poller {
    /// Poller for an operation that still needs status checks
    pub fn new(poller_type: impl PollerType + 'static, config: PollerConfig) -> Self {
        let next_interval = config.clamp_interval(None);
        Self {
            poller_type: Some(Box::new(poller_type)),
            config,
            state: PollerState::InProgress,
            next_interval,
            status_checks: 0,
        }
    }

    /// Poller for an operation that finished with the initiating call
    pub fn completed(result: Option<Value>, config: PollerConfig) -> Self {
        Self {
            poller_type: None,
            next_interval: Duration::ZERO,
            config,
            state: PollerState::Succeeded(result),
            status_checks: 0,
        }
    }

    /// Use the server-suggested delay from the initiating response
    pub fn with_initial_interval(mut self, suggested: Option<Duration>) -> Self {
        if suggested.is_some() {
            self.next_interval = self.config.clamp_interval(suggested);
        }
        self
    }

    pub fn status(&self) -> PollingStatus {
        match &self.state {
            PollerState::InProgress => PollingStatus::InProgress,
            PollerState::Succeeded(_) => PollingStatus::Succeeded,
            PollerState::Failed(failure) => failure.status,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status().is_terminal()
    }

    /// Number of status checks issued so far, including failed attempts
    pub fn status_checks(&self) -> u32 {
        self.status_checks
    }

    /// Poll until the operation is terminal, the token is cancelled or the
    /// configured timeout passes. Calling this again after a terminal state
    /// returns the cached outcome without any I/O.
    pub async fn poll_until_done(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, PollError> {
        if let Some(outcome) = self.cached_outcome() {
            return outcome;
        }

        let deadline = self
            .config
            .timeout()
            .map(|timeout| (Instant::now() + timeout, timeout));
        let mut consecutive_failures = 0u32;

        loop {
            wait(self.next_interval, cancel, deadline).await?;

            let Some(poller_type) = self.poller_type.as_mut() else {
                return Ok(None);
            };

            self.status_checks += 1;
            match poller_type.poll().await {
                Ok(result) => {
                    consecutive_failures = 0;
                    if let Some(outcome) = self.apply(result) {
                        return outcome;
                    }
                }
                Err(err) if err.is_transient() => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.config.max_transport_retries {
                        return Err(PollError::TransportFailure {
                            attempts: consecutive_failures,
                            last: err.to_string(),
                        });
                    }
                    tracing::debug!(
                        "status check failed ({}/{}), retrying: {}",
                        consecutive_failures,
                        self.config.max_transport_retries,
                        err
                    );
                    self.next_interval = self.config.backoff(consecutive_failures);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn cached_outcome(&self) -> Option<Result<Option<Value>, PollError>> {
        match &self.state {
            PollerState::InProgress => None,
            PollerState::Succeeded(body) => Some(Ok(body.clone())),
            PollerState::Failed(failure) => Some(Err(PollError::OperationFailed(failure.clone()))),
        }
    }

    /// Record a status check; returns the outcome once terminal
    fn apply(&mut self, result: PollResult) -> Option<Result<Option<Value>, PollError>> {
        tracing::debug!(
            "status check {} returned {}",
            self.status_checks,
            result.status
        );

        match result.status {
            PollingStatus::InProgress => {
                self.next_interval = self.config.clamp_interval(result.poll_interval);
                None
            }
            PollingStatus::Succeeded => {
                self.state = PollerState::Succeeded(result.body);
                self.poller_type = None;
                self.cached_outcome()
            }
            PollingStatus::Failed | PollingStatus::Canceled => {
                let failure = OperationFailure::from_body(result.status, result.body);
                self.state = PollerState::Failed(failure);
                self.poller_type = None;
                self.cached_outcome()
            }
        }
    }
}

/// Sleep before the next check, bailing out on cancellation or deadline
async fn wait(
    interval: Duration,
    cancel: &CancellationToken,
    deadline: Option<(Instant, Duration)>,
) -> Result<(), PollError> {
    if cancel.is_cancelled() {
        return Err(PollError::Cancelled);
    }

    let sleep_for = match deadline {
        Some((at, timeout)) => {
            let now = Instant::now();
            if now >= at {
                return Err(PollError::DeadlineExceeded(timeout));
            }
            interval.min(at - now)
        }
        None => interval,
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PollError::Cancelled),
        _ = tokio::time::sleep(sleep_for) => {}
    }

    if let Some((at, timeout)) = deadline {
        if Instant::now() >= at {
            return Err(PollError::DeadlineExceeded(timeout));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config() -> PollerConfig {
        PollerConfig {
            default_interval_ms: 1,
            min_interval_ms: 0,
            max_interval_ms: 5,
            timeout_secs: Some(5),
            max_transport_retries: 2,
            retry_backoff_ms: 1,
        }
    }

    /// Replays a fixed script of status checks
    struct Scripted {
        script: VecDeque<Result<PollResult, PollError>>,
        calls: Arc<AtomicU32>,
        cancel_after: Option<(u32, CancellationToken)>,
    }

    impl Scripted {
        fn new(script: Vec<Result<PollResult, PollError>>) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let scripted = Self {
                script: script.into(),
                calls: calls.clone(),
                cancel_after: None,
            };
            (scripted, calls)
        }
    }

    #[async_trait]
    impl PollerType for Scripted {
        async fn poll(&mut self) -> Result<PollResult, PollError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((after, token)) = &self.cancel_after {
                if n >= *after {
                    token.cancel();
                }
            }
            self.script
                .pop_front()
                .unwrap_or_else(|| Ok(PollResult::new(PollingStatus::InProgress)))
        }
    }

    fn in_progress() -> Result<PollResult, PollError> {
        Ok(PollResult::new(PollingStatus::InProgress))
    }

    fn transient() -> Result<PollResult, PollError> {
        Err(PollError::UnexpectedResponse {
            url: "https://example.com/op".to_string(),
            status: 503,
            body: None,
        })
    }

    #[tokio::test]
    async fn test_in_progress_then_succeeded() {
        for k in [0u32, 1, 4] {
            let mut script: Vec<_> = (0..k).map(|_| in_progress()).collect();
            script.push(Ok(PollResult::new(PollingStatus::Succeeded)
                .with_body(Some(json!({"name": "w1"})))));
            let (scripted, calls) = Scripted::new(script);

            let mut poller = Poller::new(scripted, fast_config());
            let result = poller
                .poll_until_done(&CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(result, Some(json!({"name": "w1"})));
            assert_eq!(calls.load(Ordering::SeqCst), k + 1);
            assert_eq!(poller.status_checks(), k + 1);
            assert_eq!(poller.status(), PollingStatus::Succeeded);
        }
    }

    #[tokio::test]
    async fn test_failed_on_first_check() {
        let body = json!({
            "status": "Failed",
            "error": {"code": "QuotaExceeded", "message": "Not enough cores"}
        });
        let (scripted, calls) = Scripted::new(vec![Ok(
            PollResult::new(PollingStatus::Failed).with_body(Some(body.clone()))
        )]);

        let mut poller = Poller::new(scripted, fast_config());
        let err = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match err {
            PollError::OperationFailed(failure) => {
                assert_eq!(failure.status, PollingStatus::Failed);
                assert_eq!(failure.code.as_deref(), Some("QuotaExceeded"));
                assert_eq!(failure.message.as_deref(), Some("Not enough cores"));
                assert_eq!(failure.body, Some(body));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_canceled_is_not_cancellation() {
        let (scripted, _) = Scripted::new(vec![Ok(PollResult::new(PollingStatus::Canceled))]);
        let mut poller = Poller::new(scripted, fast_config());

        let err = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(!err.is_cancellation());
        assert_eq!(poller.status(), PollingStatus::Canceled);
    }

    #[tokio::test]
    async fn test_terminal_outcome_is_cached() {
        let (scripted, calls) = Scripted::new(vec![Ok(PollResult::new(PollingStatus::Failed))]);
        let mut poller = Poller::new(scripted, fast_config());
        let token = CancellationToken::new();

        assert!(poller.poll_until_done(&token).await.is_err());
        assert!(matches!(
            poller.poll_until_done(&token).await,
            Err(PollError::OperationFailed(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completed_poller_does_no_io() {
        let mut poller = Poller::completed(Some(json!({"id": "x"})), fast_config());
        assert!(poller.is_done());
        let result = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result, Some(json!({"id": "x"})));
        assert_eq!(poller.status_checks(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_first_check() {
        let (scripted, calls) = Scripted::new(vec![]);
        let mut poller = Poller::new(scripted, fast_config());
        let token = CancellationToken::new();
        token.cancel();

        let err = poller.poll_until_done(&token).await.unwrap_err();
        assert!(matches!(err, PollError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_poll_stops_further_checks() {
        let token = CancellationToken::new();
        let (mut scripted, calls) = Scripted::new(vec![]);
        scripted.cancel_after = Some((2, token.clone()));

        let mut poller = Poller::new(scripted, fast_config());
        let err = poller.poll_until_done(&token).await.unwrap_err();

        assert!(err.is_cancellation());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(poller.status(), PollingStatus::InProgress);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let (scripted, _) = Scripted::new(vec![]);
        let config = PollerConfig {
            default_interval_ms: 20,
            min_interval_ms: 20,
            max_interval_ms: 20,
            timeout_secs: Some(0),
            ..fast_config()
        };
        let mut poller = Poller::new(scripted, config);

        let err = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::DeadlineExceeded(_)));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (scripted, calls) = Scripted::new(vec![
            transient(),
            transient(),
            Ok(PollResult::new(PollingStatus::Succeeded)),
        ]);
        let mut poller = Poller::new(scripted, fast_config());

        let result = poller.poll_until_done(&CancellationToken::new()).await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_retries() {
        let (scripted, calls) = Scripted::new(vec![transient(), transient(), transient()]);
        let mut poller = Poller::new(scripted, fast_config());

        let err = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::TransportFailure { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_returned() {
        let (scripted, calls) = Scripted::new(vec![Err(PollError::UnexpectedResponse {
            url: "https://example.com/op".to_string(),
            status: 404,
            body: None,
        })]);
        let mut poller = Poller::new(scripted, fast_config());

        let err = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::UnexpectedResponse { status: 404, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
