//! Optional observability helpers for the pipeline middlewares.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `auth_cache_pipeline.middleware` with the
//!   `middleware`, `stage` (call site), and, for the auth middlewares, `scope` fields, plus
//!   warnings for failures the middlewares absorb instead of returning.
//! - Enable `metrics` to increment the `auth_cache_pipeline_middleware_total` counter for every
//!   recorded outcome, labeled by `middleware` + `outcome`, and the
//!   `auth_cache_pipeline_challenge_total` counter for every challenge decision, labeled by
//!   `scope` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Middlewares observed by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MiddlewareKind {
	/// Token attachment on outbound requests.
	AuthRequest,
	/// Authorization challenge handling.
	AuthChallenge,
	/// Request-side cache policy.
	CachePolicy,
	/// Response-side cache rewriting.
	CacheResponse,
}
impl MiddlewareKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			MiddlewareKind::AuthRequest => "auth_request",
			MiddlewareKind::AuthChallenge => "auth_challenge",
			MiddlewareKind::CachePolicy => "cache_policy",
			MiddlewareKind::CacheResponse => "cache_response",
		}
	}
}
impl Display for MiddlewareKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MiddlewareOutcome {
	/// Entry to a middleware.
	Attempt,
	/// The middleware completed its work.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// A challenge produced a resubmission.
	Retry,
	/// A challenge was declared terminal.
	GiveUp,
	/// A network failure was answered from cache.
	Fallback,
}
impl MiddlewareOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			MiddlewareOutcome::Attempt => "attempt",
			MiddlewareOutcome::Success => "success",
			MiddlewareOutcome::Failure => "failure",
			MiddlewareOutcome::Retry => "retry",
			MiddlewareOutcome::GiveUp => "give_up",
			MiddlewareOutcome::Fallback => "fallback",
		}
	}
}
impl Display for MiddlewareOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
