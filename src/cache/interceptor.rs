//! Request-side cache policy: offline-first rewrites and force-network with cache fallback.

// self
use crate::{
	_prelude::*,
	cache::CacheConfig,
	connectivity::Connectivity,
	error::{ConfigError, TransportError},
	message::{CacheDirective, Request, Response},
	obs::{self, MiddlewareKind, MiddlewareOutcome, MiddlewareSpan},
	pipeline::{Interceptor, Next},
	protocol,
	transport::PipelineFuture,
};

/// Hook invoked when a forced network fetch fails, before the cache fallback is sent.
pub trait CacheErrorCallback
where
	Self: Send + Sync,
{
	/// Receives the transport failure and the original request; returns the request the cache
	/// fallback is built from.
	fn on_error(&self, error: &TransportError, request: Request) -> Request;
}
impl<F> CacheErrorCallback for F
where
	F: Fn(&TransportError, Request) -> Request + Send + Sync,
{
	fn on_error(&self, error: &TransportError, request: Request) -> Request {
		self(error, request)
	}
}

/// Rewrites outbound cache directives from the request's sideband flags.
///
/// - `ApplyOfflineCache` while offline: the request becomes a cache-only fetch (see
///   [`Self::offline_request`]).
/// - `ForceNetworkRefresh`: the request bypasses the cache. A transport I/O failure is handed to
///   the error callback and the call is retried as a cache-only fetch, so the caller gets the best
///   cached answer instead of the error.
/// - Anything else passes through untouched.
pub struct CacheInterceptor {
	volatile_query_param: Option<String>,
	connectivity: Arc<dyn Connectivity>,
	error_callback: Option<Arc<dyn CacheErrorCallback>>,
}
impl CacheInterceptor {
	/// Creates the interceptor from a validated configuration.
	pub fn new(
		config: &CacheConfig,
		connectivity: Arc<dyn Connectivity>,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self {
			volatile_query_param: config.volatile_query_param.clone(),
			connectivity,
			error_callback: None,
		})
	}

	/// Registers the callback invoked before a cache fallback.
	pub fn with_error_callback(mut self, callback: Arc<dyn CacheErrorCallback>) -> Self {
		self.error_callback = Some(callback);

		self
	}

	/// Cache-only form of `request`.
	///
	/// Strips the volatile query parameter, forces [`CacheDirective::ForceCache`], and removes
	/// both cache-signaling headers. Applying it twice yields the same request as applying it once.
	pub fn offline_request(&self, request: Request) -> Request {
		let request = match &self.volatile_query_param {
			Some(param) => request.without_query_param(param),
			None => request,
		};

		request
			.with_cache_directive(CacheDirective::ForceCache)
			.without_header(&protocol::APPLY_OFFLINE_CACHE)
			.without_header(&protocol::APPLY_RESPONSE_CACHE)
	}

	async fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> Result<Response> {
		const KIND: MiddlewareKind = MiddlewareKind::CachePolicy;

		let span = MiddlewareSpan::new(KIND, "intercept");

		obs::record_outcome(KIND, MiddlewareOutcome::Attempt);

		let result = span
			.instrument(async {
				if request.flag(&protocol::APPLY_OFFLINE_CACHE) && !self.connectivity.is_connected()
				{
					return next.run(self.offline_request(request)).await;
				}
				if !request.flag(&protocol::FORCE_NETWORK_REFRESH) {
					return next.run(request).await;
				}

				let forced = request.clone().with_cache_directive(CacheDirective::ForceNetwork);

				match next.run(forced).await {
					Err(Error::Network(e)) => {
						span.warn_absorbed("Forced network fetch failed, using cache.", &e);
						obs::record_outcome(KIND, MiddlewareOutcome::Fallback);

						let request = match &self.error_callback {
							Some(callback) => callback.on_error(&e, request),
							None => request,
						};

						next.run(self.offline_request(request)).await
					},
					other => other,
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, MiddlewareOutcome::Success),
			Err(_) => obs::record_outcome(KIND, MiddlewareOutcome::Failure),
		}

		result
	}
}
impl Interceptor for CacheInterceptor {
	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> PipelineFuture<'a> {
		Box::pin(self.handle(request, next))
	}
}
impl Debug for CacheInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheInterceptor")
			.field("volatile_query_param", &self.volatile_query_param)
			.field("error_callback_set", &self.error_callback.is_some())
			.finish()
	}
}
