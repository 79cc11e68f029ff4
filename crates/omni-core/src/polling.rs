//! Bounded polling with backoff.

use crate::CoreError;
use omni_config::PollingConfig;
use std::{future::Future, time::Duration};
use tracing::warn;

/// Interval, growth and cap of a polling loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
	pub interval: Duration,
	pub max_attempts: u32,
	pub backoff_multiplier: f64,
	pub max_interval: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::from(&PollingConfig::default())
	}
}

impl From<&PollingConfig> for RetryPolicy {
	fn from(config: &PollingConfig) -> Self {
		Self {
			interval: config.interval(),
			max_attempts: config.max_attempts,
			backoff_multiplier: config.backoff_multiplier,
			max_interval: config.max_interval(),
		}
	}
}

impl RetryPolicy {
	/// Delay after the given zero-based attempt, capped at `max_interval`.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
		let secs = self.interval.as_secs_f64() * self.backoff_multiplier.powi(exponent);
		let capped = secs.min(self.max_interval.as_secs_f64());
		if capped.is_finite() && capped >= 0.0 {
			Duration::from_secs_f64(capped)
		} else {
			self.max_interval
		}
	}
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
	Ready(T),
	Pending,
}

/// Calls `probe` until it is ready, a non-transient error occurs, or the
/// attempt budget is spent.
///
/// Transient errors count as attempts. Dropping the returned future abandons
/// the wait without affecting whatever is being observed.
pub async fn poll_until<T, F, Fut>(
	policy: &RetryPolicy,
	what: &str,
	mut probe: F,
) -> Result<T, CoreError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Poll<T>, CoreError>>,
{
	for attempt in 0..policy.max_attempts {
		match probe().await {
			Ok(Poll::Ready(value)) => return Ok(value),
			Ok(Poll::Pending) => {},
			Err(e) if e.is_transient() => {
				warn!(what = what, attempt = attempt + 1, error = %e, "Transient polling failure, retrying");
			},
			Err(e) => return Err(e),
		}

		if attempt + 1 < policy.max_attempts {
			tokio::time::sleep(policy.delay_for(attempt)).await;
		}
	}

	Err(CoreError::Timeout { what: what.to_string(), attempts: policy.max_attempts })
}
