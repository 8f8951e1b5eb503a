//! Response-side cache policy: overrides server directives and stabilizes cache keys.

// crates.io
use http::{HeaderValue, header::CACHE_CONTROL};
// self
use crate::{
	_prelude::*,
	cache::CacheConfig,
	error::ConfigError,
	message::{Request, Response},
	obs::{self, MiddlewareKind, MiddlewareOutcome, MiddlewareSpan},
	pipeline::{Interceptor, Next},
	protocol,
	transport::PipelineFuture,
};

const OFFLINE_ONLY: HeaderValue = HeaderValue::from_static("public, max-age=0");

/// Network interceptor applied to responses of cache-eligible requests.
///
/// Acts only when the request carried `ApplyResponseCache` or `ApplyOfflineCache`:
///
/// 1. The volatile query parameter is removed from the embedded request, which is the cache key,
///    so requests differing only in that parameter share one entry.
/// 2. `Cache-Control` becomes `public, max-age=<ttl>` under `ApplyResponseCache`, or
///    `public, max-age=0` when only `ApplyOfflineCache` is set. Server directives are discarded.
#[derive(Clone, Debug)]
pub struct CacheResponseRewriter {
	volatile_query_param: Option<String>,
	online: HeaderValue,
}
impl CacheResponseRewriter {
	/// Creates the rewriter from a validated configuration.
	pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		let online = HeaderValue::try_from(format!(
			"public, max-age={}",
			config.response_max_age.whole_seconds()
		))?;

		Ok(Self { volatile_query_param: config.volatile_query_param.clone(), online })
	}

	/// Cache key the rewriter would store `request` under.
	pub fn cache_key(&self, request: Request) -> Request {
		match &self.volatile_query_param {
			Some(param) => request.without_query_param(param),
			None => request,
		}
	}

	/// Applies the policy to a response; responses of unflagged requests come back unchanged.
	pub fn rewrite(&self, response: Response) -> Response {
		let request = response.request();
		let response_cache = request.flag(&protocol::APPLY_RESPONSE_CACHE);
		let offline_cache = request.flag(&protocol::APPLY_OFFLINE_CACHE);

		if !response_cache && !offline_cache {
			return response;
		}

		let directive = if response_cache { self.online.clone() } else { OFFLINE_ONLY };

		response
			.map_request(|request| self.cache_key(request))
			.with_header(CACHE_CONTROL, directive)
	}
}
impl Interceptor for CacheResponseRewriter {
	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> PipelineFuture<'a> {
		const KIND: MiddlewareKind = MiddlewareKind::CacheResponse;

		let span = MiddlewareSpan::new(KIND, "rewrite");

		Box::pin(async move {
			obs::record_outcome(KIND, MiddlewareOutcome::Attempt);

			let result =
				span.instrument(next.run(request)).await.map(|response| self.rewrite(response));

			match &result {
				Ok(_) => obs::record_outcome(KIND, MiddlewareOutcome::Success),
				Err(_) => obs::record_outcome(KIND, MiddlewareOutcome::Failure),
			}

			result
		})
	}
}
