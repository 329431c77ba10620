// Copyright 2024-2026, NVIDIA CORPORATION & AFFILIATES. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions
// are met:
//  * Redistributions of source code must retain the above copyright
//    notice, this list of conditions and the following disclaimer.
//  * Redistributions in binary form must reproduce the above copyright
//    notice, this list of conditions and the following disclaimer in the
//    documentation and/or other materials provided with the distribution.
//  * Neither the name of NVIDIA CORPORATION nor the names of its
//    contributors may be used to endorse or promote products derived
//    from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS ``AS IS'' AND ANY
// EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED.  IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY
// OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Bounded sleep-poll loops for server and model readiness.
//!
//! Readiness checks never fail fast: once the attempt budget is spent the
//! caller gets `Ok(false)` and decides whether to carry on. Errors returned
//! by the check itself are propagated immediately.

use std::time::Duration;

use crate::error::Result;

/// Default number of checks before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default pause between two checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// How often, and how many times, a readiness check is retried.
///
/// ```rust
/// use std::time::Duration;
/// use rapids_triton::readiness::PollPolicy;
///
/// let policy = PollPolicy::default()
///     .max_attempts(20)
///     .interval(Duration::from_millis(250));
/// assert_eq!(policy.budget(), Duration::from_millis(250 * 19));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl PollPolicy {
    /// Sets the number of checks. Values below one are raised to one.
    #[must_use]
    pub fn max_attempts(self, attempts: u32) -> Self {
        Self {
            max_attempts: attempts.max(1),
            ..self
        }
    }

    /// Sets the pause between checks.
    #[must_use]
    pub fn interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn pause(&self) -> Duration {
        self.interval
    }

    /// Longest time spent sleeping before the policy is exhausted.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts.saturating_sub(1))
    }
}

/// Calls `check` until it reports `true` or the policy is exhausted,
/// sleeping on the calling thread between checks.
///
/// Returns `Ok(true)` as soon as the check succeeds and `Ok(false)` once all
/// attempts have reported `false`. No sleep follows the last attempt.
///
/// # Errors
///
/// Propagates the first error returned by `check`.
pub fn poll_until<F>(policy: PollPolicy, mut check: F) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    for attempt in 1..=policy.max_attempts {
        if check()? {
            tracing::trace!(attempt, "readiness check succeeded");
            return Ok(true);
        }
        if attempt < policy.max_attempts {
            std::thread::sleep(policy.interval);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorCode};

    fn fast(attempts: u32) -> PollPolicy {
        PollPolicy::default()
            .max_attempts(attempts)
            .interval(Duration::from_millis(1))
    }

    #[test]
    fn defaults_are_ten_checks_half_a_second_apart() {
        let policy = PollPolicy::default();
        assert_eq!(policy.attempts(), 10);
        assert_eq!(policy.pause(), Duration::from_millis(500));
        assert_eq!(policy.budget(), Duration::from_millis(4500));
    }

    #[test]
    fn budget_saturates_instead_of_overflowing() {
        let policy = PollPolicy::default().interval(Duration::MAX).max_attempts(3);
        assert_eq!(policy.budget(), Duration::MAX);
        assert_eq!(policy.max_attempts(1).budget(), Duration::ZERO);
    }

    #[test]
    fn stops_at_first_success() {
        let mut calls = 0;
        let ready = poll_until(fast(10), || {
            calls += 1;
            Ok(calls == 3)
        })
        .unwrap();
        assert!(ready);
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let ready = poll_until(fast(4), || {
            calls += 1;
            Ok(false)
        })
        .unwrap();
        assert!(!ready);
        assert_eq!(calls, 4);
    }

    #[test]
    fn zero_attempts_still_checks_once() {
        let mut calls = 0;
        let _ = poll_until(fast(0), || {
            calls += 1;
            Ok(false)
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn check_errors_propagate() {
        let mut calls = 0;
        let err = poll_until(fast(5), || {
            calls += 1;
            Err(Error::triton(ErrorCode::Internal, "server gone"))
        })
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(calls, 1);
    }
}
