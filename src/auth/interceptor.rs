//! Request-side auth middleware: attaches a fresh token and the one-shot retry marker.

// self
use crate::{
	_prelude::*,
	auth::{AuthFailureListener, ScopeSelection, TokenCodec, TokenProvider, listener},
	connectivity::Connectivity,
	error::AuthenticationError,
	message::Request,
	obs::{self, MiddlewareKind, MiddlewareOutcome, MiddlewareSpan},
	pipeline::{Interceptor, Next},
	protocol,
	transport::PipelineFuture,
};

/// Runs on every outbound request.
///
/// 1. Strips whatever token the caller supplied.
/// 2. Offline: drops the retry marker and forwards the request without a token, so the cache
///    layer sees a deterministic request shape.
/// 3. Online: fetches a non-forced token under the scope's lock, then attaches the retry marker
///    and the token.
///
/// When no token can be obtained the request fails with [`Error::AuthenticationFailure`] after
/// the listener (if any) is notified with `None`.
pub struct AuthInterceptor {
	provider: Arc<dyn TokenProvider>,
	codec: Arc<dyn TokenCodec>,
	connectivity: Arc<dyn Connectivity>,
	selection: ScopeSelection,
	listener: Option<Arc<dyn AuthFailureListener>>,
}
impl AuthInterceptor {
	/// Creates an interceptor for the anonymous scope.
	pub fn new(
		provider: Arc<dyn TokenProvider>,
		codec: Arc<dyn TokenCodec>,
		connectivity: Arc<dyn Connectivity>,
	) -> Self {
		Self { provider, codec, connectivity, selection: Default::default(), listener: None }
	}

	/// Chooses how the scope is picked per request.
	pub fn with_scope_selection(mut self, selection: ScopeSelection) -> Self {
		self.selection = selection;

		self
	}

	/// Registers a listener notified before an authentication failure propagates.
	pub fn with_listener(mut self, listener: Arc<dyn AuthFailureListener>) -> Self {
		self.listener = Some(listener);

		self
	}

	/// Rewrites `request` the way the interceptor does before handing it onward.
	pub async fn prepare(&self, request: Request) -> Result<Request> {
		const KIND: MiddlewareKind = MiddlewareKind::AuthRequest;

		let span = MiddlewareSpan::new(KIND, "prepare");

		obs::record_outcome(KIND, MiddlewareOutcome::Attempt);

		let result = span
			.instrument(async {
				let request = self.codec.remove_token(request);

				if !self.connectivity.is_connected() {
					return Ok(request.without_header(&protocol::RETRY_WITH_REFRESH));
				}

				let scope = self.selection.resolve(self.provider.is_user_signed_in());

				span.record_scope(scope);

				let fetched = {
					let _guard = self.provider.lock(scope).lock().await;

					self.provider.token(scope, false).await
				};
				let token = match fetched {
					Ok(Some(token)) if !token.is_empty() => token,
					Ok(_) => return Err(self.fail(AuthenticationError::missing_token())),
					Err(e) => return Err(self.fail(AuthenticationError::provider(e))),
				};

				self.codec.write(request.with_flag(protocol::RETRY_WITH_REFRESH), &token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, MiddlewareOutcome::Success),
			Err(_) => obs::record_outcome(KIND, MiddlewareOutcome::Failure),
		}

		result
	}

	fn fail(&self, err: AuthenticationError) -> Error {
		listener::notify(self.listener.as_ref(), None);

		err.into()
	}
}
impl Interceptor for AuthInterceptor {
	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> PipelineFuture<'a> {
		Box::pin(async move {
			let request = self.prepare(request).await?;

			next.run(request).await
		})
	}
}
impl Debug for AuthInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthInterceptor")
			.field("selection", &self.selection)
			.field("listener_set", &self.listener.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		auth::{BearerHeaderCodec, MemoryTokenProvider, ProviderError, Scope, ScopeLocks, Token},
		connectivity::ConnectivityFlag,
		message::Response,
	};

	fn request() -> Request {
		Request::get(Url::parse("https://api.example.com/x").expect("URL should parse."))
	}

	fn interceptor(provider: MemoryTokenProvider, online: bool) -> AuthInterceptor {
		AuthInterceptor::new(
			Arc::new(provider),
			Arc::new(BearerHeaderCodec::new()),
			Arc::new(ConnectivityFlag::new(online)),
		)
	}

	#[tokio::test]
	async fn online_requests_get_token_and_marker() {
		let provider = MemoryTokenProvider::sequential(Arc::new(ScopeLocks::new()));
		let stale = BearerHeaderCodec::new()
			.write(request(), &Token::new("caller-supplied"))
			.expect("Fixture token should encode.");
		let prepared = interceptor(provider, true)
			.prepare(stale)
			.await
			.expect("Online preparation should succeed.");

		assert_eq!(BearerHeaderCodec::new().read(&prepared), Some(Token::new("anonymous-1")));
		assert!(prepared.flag(&protocol::RETRY_WITH_REFRESH));
	}

	#[tokio::test]
	async fn offline_requests_are_normalized_without_token() {
		let provider = MemoryTokenProvider::sequential(Arc::new(ScopeLocks::new()));
		let marked = BearerHeaderCodec::new()
			.write(
				request().with_flag(protocol::RETRY_WITH_REFRESH),
				&Token::new("caller-supplied"),
			)
			.expect("Fixture token should encode.");
		let prepared = interceptor(provider, false)
			.prepare(marked)
			.await
			.expect("Offline preparation should succeed.");

		assert_eq!(BearerHeaderCodec::new().read(&prepared), None);
		assert!(!prepared.has_header(&protocol::RETRY_WITH_REFRESH));
	}

	#[tokio::test]
	async fn sign_in_state_selects_authenticated_scope() {
		let provider = MemoryTokenProvider::sequential(Arc::new(ScopeLocks::new()))
			.signed_in()
			.with_token(Scope::Authenticated, "user-token");
		let prepared = interceptor(provider, true)
			.with_scope_selection(ScopeSelection::SignInState)
			.prepare(request())
			.await
			.expect("Authenticated preparation should succeed.");

		assert_eq!(BearerHeaderCodec::new().read(&prepared), Some(Token::new("user-token")));
	}

	#[tokio::test]
	async fn missing_tokens_fail_and_notify_listener() {
		let notified = Arc::new(AtomicUsize::new(0));
		let seen = notified.clone();
		let provider = MemoryTokenProvider::new(Arc::new(ScopeLocks::new()), |_, _| {
			Err(ProviderError::Unavailable { message: "issuer offline".into() })
		});
		let err = interceptor(provider, true)
			.with_listener(Arc::new(move |response: Option<&Response>| {
				assert!(response.is_none());
				seen.fetch_add(1, Ordering::SeqCst);
			}))
			.prepare(request())
			.await
			.expect_err("Provider failure should fail the request.");

		assert!(matches!(err, Error::AuthenticationFailure(_)));
		assert_eq!(notified.load(Ordering::SeqCst), 1);
	}
}
