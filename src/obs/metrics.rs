// self
use crate::{
	auth::Scope,
	obs::{MiddlewareKind, MiddlewareOutcome},
};

/// Records a middleware outcome via the global metrics recorder (when enabled).
pub fn record_outcome(kind: MiddlewareKind, outcome: MiddlewareOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"auth_cache_pipeline_middleware_total",
			"middleware" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a challenge decision for one credential scope (when enabled).
pub fn record_challenge(scope: Scope, outcome: MiddlewareOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"auth_cache_pipeline_challenge_total",
			"scope" => scope.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (scope, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_outcome_noop_without_metrics() {
		record_outcome(MiddlewareKind::CachePolicy, MiddlewareOutcome::Fallback);
		record_challenge(Scope::Anonymous, MiddlewareOutcome::GiveUp);
	}
}
