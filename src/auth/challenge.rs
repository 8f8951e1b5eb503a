//! Authorization challenge handling with single-flight refreshes, bounded retries, and sign-out
//! escalation.
//!
//! The pipeline calls a [`ChallengeHandler`] once per challenge response (HTTP 401). The
//! [`ChallengeCoordinator`] adjudicates it for one [`Scope`]:
//!
//! - No token on the failed request: nothing to refresh, [`ChallengeOutcome::Proceed`].
//! - Retry marker absent: the request already used its one retry, so the challenge is terminal.
//! - Otherwise, under the scope lock, ask the provider for its current token. If it still hands
//!   out the token that just failed, no concurrent request has refreshed this generation yet and
//!   a forced refresh is requested. A usable token yields [`ChallengeOutcome::Retry`] with the
//!   marker consumed; anything else is terminal.
//!
//! Terminal outcomes sign an authenticated session out before notifying the listener and
//! returning [`ChallengeOutcome::GiveUp`]. The coordinator keeps no per-request state; everything
//! request-scoped travels in the request itself.

mod metrics;

pub use metrics::ChallengeMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AuthFailureListener, Scope, Token, TokenCodec, TokenProvider, listener},
	error::TokenRetrievalError,
	message::{Request, Response},
	obs::{self, MiddlewareKind, MiddlewareOutcome, MiddlewareSpan},
	protocol,
};

/// Future returned by [`ChallengeHandler::on_challenge`].
pub type ChallengeFuture<'a> = Pin<Box<dyn Future<Output = Result<ChallengeOutcome>> + 'a + Send>>;

/// Decision taken for a challenge response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeOutcome {
	/// Leave the challenge alone; the caller receives the challenge response as is.
	Proceed(Request),
	/// Resubmit this request.
	Retry(Request),
	/// Terminal failure; no further request is sent.
	GiveUp,
}

/// Hook consulted by the pipeline exactly once per challenge response.
pub trait ChallengeHandler
where
	Self: Send + Sync,
{
	/// Adjudicates `response`, whose embedded request is the one that was rejected.
	fn on_challenge<'a>(&'a self, response: &'a Response) -> ChallengeFuture<'a>;
}

/// Challenge state machine for a single [`Scope`].
pub struct ChallengeCoordinator {
	scope: Scope,
	provider: Arc<dyn TokenProvider>,
	codec: Arc<dyn TokenCodec>,
	listener: Option<Arc<dyn AuthFailureListener>>,
	metrics: Arc<ChallengeMetrics>,
}
impl ChallengeCoordinator {
	/// Creates a coordinator for `scope`.
	pub fn new(scope: Scope, provider: Arc<dyn TokenProvider>, codec: Arc<dyn TokenCodec>) -> Self {
		Self { scope, provider, codec, listener: None, metrics: Default::default() }
	}

	/// Registers a listener notified with the terminal challenge response.
	pub fn with_listener(mut self, listener: Arc<dyn AuthFailureListener>) -> Self {
		self.listener = Some(listener);

		self
	}

	/// Shares a counter set with other coordinators.
	pub fn with_metrics(mut self, metrics: Arc<ChallengeMetrics>) -> Self {
		self.metrics = metrics;

		self
	}

	/// Scope this coordinator refreshes.
	pub fn scope(&self) -> Scope {
		self.scope
	}

	/// Counters recorded by this coordinator.
	pub fn metrics(&self) -> &Arc<ChallengeMetrics> {
		&self.metrics
	}

	/// Adjudicates one challenge response.
	pub async fn authenticate(&self, response: &Response) -> Result<ChallengeOutcome> {
		const KIND: MiddlewareKind = MiddlewareKind::AuthChallenge;

		let span = MiddlewareSpan::new(KIND, "authenticate");

		span.record_scope(self.scope);
		obs::record_outcome(KIND, MiddlewareOutcome::Attempt);
		self.metrics.record_challenge();

		let result = span
			.instrument(async {
				let request = response.request();
				let Some(stale) = self.codec.read(request) else {
					return Ok(ChallengeOutcome::Proceed(request.clone()));
				};

				if !request.has_header(&protocol::RETRY_WITH_REFRESH) {
					return Ok(self.give_up(response, &span).await);
				}

				let refreshed = {
					let _singleflight = self.provider.lock(self.scope).lock().await;

					self.refreshed_token(&stale).await?
				};

				match refreshed {
					Some(token) => {
						let retry = self.codec.write(
							request.clone().without_header(&protocol::RETRY_WITH_REFRESH),
							&token,
						)?;

						self.metrics.record_retry();

						Ok(ChallengeOutcome::Retry(retry))
					},
					None => Ok(self.give_up(response, &span).await),
				}
			})
			.await;

		let outcome = match &result {
			Ok(ChallengeOutcome::Retry(_)) => MiddlewareOutcome::Retry,
			Ok(ChallengeOutcome::GiveUp) => MiddlewareOutcome::GiveUp,
			Ok(ChallengeOutcome::Proceed(_)) => MiddlewareOutcome::Success,
			Err(_) => MiddlewareOutcome::Failure,
		};

		obs::record_outcome(KIND, outcome);
		obs::record_challenge(self.scope, outcome);

		result
	}

	/// Compare-and-refresh step; the caller holds the scope lock.
	async fn refreshed_token(&self, stale: &Token) -> Result<Option<Token>> {
		let current = self.fetch(false).await?;

		if current.as_ref().is_some_and(|token| is_fresh(token, stale)) {
			return Ok(current);
		}

		self.metrics.record_forced_refresh();

		let forced = self.fetch(true).await?;

		Ok(forced.filter(|token| is_fresh(token, stale)))
	}

	async fn fetch(&self, force_refresh: bool) -> Result<Option<Token>> {
		self.provider
			.token(self.scope, force_refresh)
			.await
			.map_err(|source| TokenRetrievalError { force_refresh, source }.into())
	}

	async fn give_up(&self, response: &Response, span: &MiddlewareSpan) -> ChallengeOutcome {
		if self.scope == Scope::Authenticated && self.provider.is_user_signed_in() {
			match self.provider.sign_out().await {
				Ok(()) => self.metrics.record_sign_out(),
				Err(e) =>
					span.warn_absorbed("Sign-out after an authenticated challenge failed.", &e),
			}
		}

		self.metrics.record_give_up();
		listener::notify(self.listener.as_ref(), Some(response));

		ChallengeOutcome::GiveUp
	}

	/// Re-attaches a token from this coordinator's scope to a request another scope gave up on.
	///
	/// The adopted request carries no retry marker: the challenge that triggered the adoption
	/// already spent the call's one retry, so a further challenge ends the call.
	async fn adopt(&self, response: &Response) -> Result<ChallengeOutcome> {
		let request = self
			.codec
			.remove_token(response.request().clone())
			.without_header(&protocol::RETRY_WITH_REFRESH);
		let fetched = {
			let _singleflight = self.provider.lock(self.scope).lock().await;

			self.fetch(false).await?
		};

		match fetched.filter(|token| !token.is_empty()) {
			Some(token) => {
				let retry = self.codec.write(request, &token)?;

				self.metrics.record_retry();
				obs::record_challenge(self.scope, MiddlewareOutcome::Retry);

				Ok(ChallengeOutcome::Retry(retry))
			},
			None => {
				let span = MiddlewareSpan::new(MiddlewareKind::AuthChallenge, "adopt");

				span.record_scope(self.scope);
				obs::record_challenge(self.scope, MiddlewareOutcome::GiveUp);

				Ok(self.give_up(response, &span).await)
			},
		}
	}
}
impl ChallengeHandler for ChallengeCoordinator {
	fn on_challenge<'a>(&'a self, response: &'a Response) -> ChallengeFuture<'a> {
		Box::pin(self.authenticate(response))
	}
}
impl Debug for ChallengeCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ChallengeCoordinator")
			.field("scope", &self.scope)
			.field("listener_set", &self.listener.is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Authenticated coordinator first, anonymous coordinator as the fallback.
///
/// While the provider reports a signed-in user the authenticated coordinator adjudicates the
/// challenge. If it gives up (signing the user out), the request is stripped of its
/// authenticated token and re-sent once with the current anonymous token and no retry marker,
/// so a challenge on that attempt ends the call. Signed-out sessions go straight to the
/// anonymous coordinator.
pub struct CompositeAuthenticator {
	authenticated: ChallengeCoordinator,
	anonymous: ChallengeCoordinator,
}
impl CompositeAuthenticator {
	/// Builds both coordinators over one provider and codec, sharing a counter set.
	pub fn new(provider: Arc<dyn TokenProvider>, codec: Arc<dyn TokenCodec>) -> Self {
		let metrics = Arc::new(ChallengeMetrics::default());
		let authenticated =
			ChallengeCoordinator::new(Scope::Authenticated, provider.clone(), codec.clone())
				.with_metrics(metrics.clone());
		let anonymous =
			ChallengeCoordinator::new(Scope::Anonymous, provider, codec).with_metrics(metrics);

		Self { authenticated, anonymous }
	}

	/// Registers a listener for failures that end the call.
	///
	/// An authenticated give-up is not one of them while the anonymous fallback still runs, so
	/// this listener hears the anonymous side only. Use
	/// [`Self::with_authenticated_listener`] to observe the authenticated give-up (and the
	/// sign-out it triggers) as well.
	pub fn with_listener(mut self, listener: Arc<dyn AuthFailureListener>) -> Self {
		self.anonymous = self.anonymous.with_listener(listener);

		self
	}

	/// Registers a listener notified when the authenticated coordinator gives up.
	pub fn with_authenticated_listener(mut self, listener: Arc<dyn AuthFailureListener>) -> Self {
		self.authenticated = self.authenticated.with_listener(listener);

		self
	}

	/// Counters shared by both coordinators.
	pub fn metrics(&self) -> &Arc<ChallengeMetrics> {
		self.anonymous.metrics()
	}

	/// Adjudicates one challenge response across both scopes.
	pub async fn authenticate(&self, response: &Response) -> Result<ChallengeOutcome> {
		if !self.authenticated.provider.is_user_signed_in() {
			return self.anonymous.authenticate(response).await;
		}

		match self.authenticated.authenticate(response).await? {
			ChallengeOutcome::GiveUp => self.anonymous.adopt(response).await,
			outcome => Ok(outcome),
		}
	}
}
impl ChallengeHandler for CompositeAuthenticator {
	fn on_challenge<'a>(&'a self, response: &'a Response) -> ChallengeFuture<'a> {
		Box::pin(self.authenticate(response))
	}
}
impl Debug for CompositeAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CompositeAuthenticator")
			.field("authenticated", &self.authenticated)
			.field("anonymous", &self.anonymous)
			.finish()
	}
}

fn is_fresh(candidate: &Token, stale: &Token) -> bool {
	!candidate.is_empty() && candidate != stale
}
