use std::time::Duration;

use crate::client::ChatModel;
use crate::types::ChatRequest;
use crate::Result;

// ─── RetryPolicy ──────────────────────────────────────────────────────────

/// Bounded exponential backoff: attempt `n` (0-based) that fails is followed
/// by a sleep of `base_delay * 2^n`, except after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

// ─── complete_with_retry ──────────────────────────────────────────────────

/// Call `model` until it succeeds, the error is not transient, or the policy
/// runs out of attempts. Returns the last error on failure.
pub fn complete_with_retry<M: ChatModel + ?Sized>(
    model: &M,
    request: &ChatRequest,
    policy: RetryPolicy,
) -> Result<String> {
    complete_with_sleeper(model, request, policy, std::thread::sleep)
}

pub(crate) fn complete_with_sleeper<M, S>(
    model: &M,
    request: &ChatRequest,
    policy: RetryPolicy,
    mut sleep: S,
) -> Result<String>
where
    M: ChatModel + ?Sized,
    S: FnMut(Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match model.complete(request) {
            Ok(text) => return Ok(text),
            Err(e) => {
                tracing::warn!(
                    "chat attempt {}/{} failed: {e}",
                    attempt + 1,
                    max_attempts
                );
                if attempt + 1 >= max_attempts || !e.is_transient() {
                    tracing::error!(
                        "chat call failed after {} attempt(s): {e}",
                        attempt + 1
                    );
                    return Err(e);
                }
                sleep(policy.delay_for_attempt(attempt));
                attempt += 1;
            }
        }
    }
}
