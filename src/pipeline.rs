//! Interceptor chain that threads requests through the middlewares and into the transport.
//!
//! Stages run in this order:
//!
//! 1. Application interceptors ([`AuthInterceptor`], then [`CacheInterceptor`], then any custom
//!    ones). They see each call exactly once.
//! 2. The follow-up stage. When the network chain answers with an authorization challenge it
//!    consults the configured [`ChallengeHandler`] once per challenge response, handing it the
//!    request as this stage sent it, and resubmits whatever request the handler returns.
//! 3. Network interceptors (custom ones, then [`CacheResponseRewriter`]). They see every
//!    physical attempt, resubmissions included.
//! 4. The [`Transport`].

// self
use crate::{
	_prelude::*,
	auth::{AuthInterceptor, ChallengeHandler, ChallengeOutcome},
	cache::{CacheInterceptor, CacheResponseRewriter},
	message::{Request, Response},
	transport::{PipelineFuture, Transport},
};

/// Upper bound on resubmissions for a single call.
pub const MAX_FOLLOW_UPS: usize = 20;

/// Middleware hook that may rewrite the request, the response, or both.
pub trait Interceptor
where
	Self: Send + Sync,
{
	/// Handles `request`, usually by running `next` with a rewritten request.
	///
	/// `next` is a cheap copyable cursor; an interceptor may run it more than once.
	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> PipelineFuture<'a>;
}

/// Cursor over the remainder of an interceptor chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
	chain: &'a [Arc<dyn Interceptor>],
	transport: &'a dyn Transport,
}
impl<'a> Next<'a> {
	/// Cursor that runs `chain` in order and ends at `transport`.
	pub fn new(chain: &'a [Arc<dyn Interceptor>], transport: &'a dyn Transport) -> Self {
		Self { chain, transport }
	}

	/// Hands `request` to the next stage.
	pub fn run(self, request: Request) -> PipelineFuture<'a> {
		match self.chain.split_first() {
			Some((head, rest)) =>
				head.intercept(request, Next { chain: rest, transport: self.transport }),
			None => self.transport.execute(request),
		}
	}
}
impl Debug for Next<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Next").field("remaining", &self.chain.len()).finish()
	}
}

/// Fully wired middleware stack in front of a [`Transport`].
pub struct Pipeline {
	interceptors: Vec<Arc<dyn Interceptor>>,
	network_interceptors: Vec<Arc<dyn Interceptor>>,
	challenge_handler: Option<Arc<dyn ChallengeHandler>>,
	transport: Arc<dyn Transport>,
	max_follow_ups: usize,
}
impl Pipeline {
	/// Starts a builder that ends at `transport`.
	pub fn builder(transport: impl 'static + Transport) -> PipelineBuilder {
		PipelineBuilder::new(Arc::new(transport))
	}

	/// Runs `request` through every stage and returns the final response.
	///
	/// A challenge the handler declines to retry fails with [`Error::ChallengeRejected`]; one it
	/// passes through is returned as the response.
	pub async fn execute(&self, request: Request) -> Result<Response> {
		let follow_ups = FollowUpStage {
			network: &self.network_interceptors,
			handler: self.challenge_handler.as_deref(),
			transport: self.transport.as_ref(),
			max_follow_ups: self.max_follow_ups,
		};

		Next::new(&self.interceptors, &follow_ups).run(request).await
	}
}
impl Debug for Pipeline {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pipeline")
			.field("interceptors", &self.interceptors.len())
			.field("network_interceptors", &self.network_interceptors.len())
			.field("challenge_handler_set", &self.challenge_handler.is_some())
			.field("max_follow_ups", &self.max_follow_ups)
			.finish()
	}
}

/// Builder that wires the middlewares in their documented order.
pub struct PipelineBuilder {
	transport: Arc<dyn Transport>,
	auth: Option<Arc<dyn Interceptor>>,
	cache: Option<Arc<dyn Interceptor>>,
	rewriter: Option<Arc<dyn Interceptor>>,
	interceptors: Vec<Arc<dyn Interceptor>>,
	network_interceptors: Vec<Arc<dyn Interceptor>>,
	challenge_handler: Option<Arc<dyn ChallengeHandler>>,
	max_follow_ups: usize,
}
impl PipelineBuilder {
	/// Creates a builder around a shared transport.
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self {
			transport,
			auth: None,
			cache: None,
			rewriter: None,
			interceptors: Vec::new(),
			network_interceptors: Vec::new(),
			challenge_handler: None,
			max_follow_ups: MAX_FOLLOW_UPS,
		}
	}

	/// Installs the request-side auth middleware as the first application interceptor.
	pub fn auth(mut self, interceptor: AuthInterceptor) -> Self {
		self.auth = Some(Arc::new(interceptor));

		self
	}

	/// Installs the cache policy pair: the request-side interceptor after auth, the response
	/// rewriter directly in front of the transport.
	pub fn cache(mut self, interceptor: CacheInterceptor, rewriter: CacheResponseRewriter) -> Self {
		self.cache = Some(Arc::new(interceptor));
		self.rewriter = Some(Arc::new(rewriter));

		self
	}

	/// Consults `handler` whenever the transport answers with an authorization challenge.
	pub fn challenge_handler(mut self, handler: impl 'static + ChallengeHandler) -> Self {
		self.challenge_handler = Some(Arc::new(handler));

		self
	}

	/// Same as [`Self::challenge_handler`] for an already shared handler.
	pub fn shared_challenge_handler(mut self, handler: Arc<dyn ChallengeHandler>) -> Self {
		self.challenge_handler = Some(handler);

		self
	}

	/// Appends a custom application interceptor after the built-in ones.
	pub fn interceptor(mut self, interceptor: impl 'static + Interceptor) -> Self {
		self.interceptors.push(Arc::new(interceptor));

		self
	}

	/// Appends a custom network interceptor in front of the cache response rewriter.
	pub fn network_interceptor(mut self, interceptor: impl 'static + Interceptor) -> Self {
		self.network_interceptors.push(Arc::new(interceptor));

		self
	}

	/// Overrides the resubmission cap (default [`MAX_FOLLOW_UPS`]).
	pub fn max_follow_ups(mut self, max: usize) -> Self {
		self.max_follow_ups = max;

		self
	}

	/// Finalizes the stage order.
	pub fn build(self) -> Pipeline {
		let interceptors =
			self.auth.into_iter().chain(self.cache).chain(self.interceptors).collect();
		let network_interceptors =
			self.network_interceptors.into_iter().chain(self.rewriter).collect();

		Pipeline {
			interceptors,
			network_interceptors,
			challenge_handler: self.challenge_handler,
			transport: self.transport,
			max_follow_ups: self.max_follow_ups,
		}
	}
}
impl Debug for PipelineBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PipelineBuilder")
			.field("auth_set", &self.auth.is_some())
			.field("cache_set", &self.cache.is_some())
			.field("interceptors", &self.interceptors.len())
			.field("network_interceptors", &self.network_interceptors.len())
			.field("challenge_handler_set", &self.challenge_handler.is_some())
			.field("max_follow_ups", &self.max_follow_ups)
			.finish()
	}
}

struct FollowUpStage<'p> {
	network: &'p [Arc<dyn Interceptor>],
	handler: Option<&'p dyn ChallengeHandler>,
	transport: &'p dyn Transport,
	max_follow_ups: usize,
}
impl Transport for FollowUpStage<'_> {
	fn execute(&self, request: Request) -> PipelineFuture<'_> {
		Box::pin(async move {
			let mut request = request;
			let mut follow_ups = 0;

			loop {
				let sent = request.clone();
				let response = Next::new(self.network, self.transport).run(request).await?;

				if !response.is_challenge() {
					return Ok(response);
				}

				let Some(handler) = self.handler else {
					return Ok(response);
				};
				// Network interceptors may have rewritten the embedded request (cache keys drop
				// the volatile parameter); the handler adjudicates what was actually sent.
				let challenged = response.clone().map_request(|_| sent);

				match handler.on_challenge(&challenged).await? {
					ChallengeOutcome::Proceed(_) => return Ok(response),
					ChallengeOutcome::GiveUp => {
						let mut url = response.request().url().clone();

						url.set_query(None);

						return Err(Error::ChallengeRejected {
							status: response.status().as_u16(),
							url: url.to_string(),
						});
					},
					ChallengeOutcome::Retry(next) => {
						follow_ups += 1;

						if follow_ups > self.max_follow_ups {
							return Err(Error::TooManyFollowUps { count: follow_ups });
						}

						request = next;
					},
				}
			}
		})
	}
}
