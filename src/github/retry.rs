//! Bounded retry for remote writes.
//!
//! GitHub signals its secondary ("abuse") rate limit on write endpoints with
//! HTTP 422. That class — and only that class — is retried, sleeping `i * i`
//! seconds before attempt `i`. Any other failure surfaces immediately.
//! Retries are sequential within one write call; nothing overlaps.
//!
//! The sleep is injected so tests can assert the backoff schedule without
//! real delays.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::errors::{CommenterResult, Error, ProviderError};
use crate::github::PullRequestRef;

/// Attempts per write when the secondary rate limit keeps firing.
pub const ABUSE_LIMIT_ATTEMPTS: usize = 6;

/// Sleep used outside of tests.
pub async fn tokio_sleep(d: Duration) {
    tokio::time::sleep(d).await;
}

/// Runs `op` up to `attempts` times, backing off quadratically on the
/// secondary rate limit. Exhaustion yields `AbuseRateLimitExhausted`
/// carrying the PR identity and the last backoff applied.
pub async fn write_with_retries<Op, Fut, Sleep, SleepFut>(
    pr: &PullRequestRef,
    attempts: usize,
    mut op: Op,
    sleep: Sleep,
) -> CommenterResult<()>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<(), ProviderError>>,
    Sleep: Fn(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let mut last_backoff = Duration::ZERO;
    for i in 0..attempts {
        let backoff = Duration::from_secs((i * i) as u64);
        sleep(backoff).await;
        last_backoff = backoff;

        match op().await {
            Ok(()) => return Ok(()),
            Err(ProviderError::SecondaryRateLimit) => {
                debug!(
                    "write: secondary rate limit on {pr}, attempt {} of {attempts}",
                    i + 1
                );
                continue;
            }
            Err(e) => return Err(Error::Provider(e)),
        }
    }

    Err(Error::AbuseRateLimitExhausted {
        pull_request: pr.to_string(),
        attempts,
        last_backoff_secs: last_backoff.as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn pr() -> PullRequestRef {
        PullRequestRef {
            owner: "owenrumney".into(),
            repo: "example".into(),
            number: 7,
        }
    }

    #[tokio::test]
    async fn persistent_rate_limit_exhausts_all_attempts() {
        let calls = Rc::new(RefCell::new(0usize));
        let slept = Rc::new(RefCell::new(Vec::new()));

        let op_calls = calls.clone();
        let sleeps = slept.clone();
        let res = write_with_retries(
            &pr(),
            ABUSE_LIMIT_ATTEMPTS,
            || {
                *op_calls.borrow_mut() += 1;
                async { Err(ProviderError::SecondaryRateLimit) }
            },
            |d| {
                sleeps.borrow_mut().push(d);
                async {}
            },
        )
        .await;

        assert_eq!(*calls.borrow(), 6);
        let secs: Vec<u64> = slept.borrow().iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![0, 1, 4, 9, 16, 25]);
        assert!(secs.windows(2).all(|w| w[0] < w[1]));

        match res {
            Err(Error::AbuseRateLimitExhausted {
                pull_request,
                attempts,
                last_backoff_secs,
            }) => {
                assert_eq!(pull_request, "owenrumney/example#7");
                assert_eq!(attempts, 6);
                assert_eq!(last_backoff_secs, 25);
            }
            other => panic!("expected AbuseRateLimitExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transient_rate_limit_recovers() {
        let calls = Rc::new(RefCell::new(0usize));

        let op_calls = calls.clone();
        let res = write_with_retries(
            &pr(),
            ABUSE_LIMIT_ATTEMPTS,
            || {
                *op_calls.borrow_mut() += 1;
                let n = *op_calls.borrow();
                async move {
                    if n <= 2 {
                        Err(ProviderError::SecondaryRateLimit)
                    } else {
                        Ok(())
                    }
                }
            },
            |_| async {},
        )
        .await;

        assert!(res.is_ok());
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn other_errors_surface_immediately() {
        let calls = Rc::new(RefCell::new(0usize));

        let op_calls = calls.clone();
        let res = write_with_retries(
            &pr(),
            ABUSE_LIMIT_ATTEMPTS,
            || {
                *op_calls.borrow_mut() += 1;
                async { Err(ProviderError::Server(502)) }
            },
            |_| async {},
        )
        .await;

        assert_eq!(*calls.borrow(), 1);
        match res {
            Err(Error::Provider(ProviderError::Server(502))) => {}
            other => panic!("expected Server(502), got {other:?}"),
        }
    }
}
