// std
use std::{
	collections::HashSet,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
// self
use auth_cache_pipeline::{
	Pipeline, Request, Response,
	auth::{
		AuthInterceptor, BearerHeaderCodec, ChallengeCoordinator, CompositeAuthenticator,
		MemoryTokenProvider, ProviderError, Scope, ScopeLocks, ScopeSelection, Token, TokenCodec,
		TokenProvider,
	},
	connectivity,
	error::Error,
	http::StatusCode,
	protocol,
	transport::{PipelineFuture, Transport},
	url::Url,
};

/// Accepts every bearer token except the rejected ones; records what it saw.
#[derive(Default)]
struct GateState {
	rejected: Mutex<HashSet<String>>,
	rejected_prefix: Mutex<Option<String>>,
	seen: Mutex<Vec<Request>>,
	calls: AtomicUsize,
	delay: Option<Duration>,
}
impl GateState {
	fn rejecting(tokens: &[&str]) -> Arc<Self> {
		let state = Self::default();

		state.rejected.lock().extend(tokens.iter().map(|token| token.to_string()));

		Arc::new(state)
	}

	fn rejecting_prefix(prefix: &str) -> Arc<Self> {
		let state = Self::default();

		*state.rejected_prefix.lock() = Some(prefix.to_owned());

		Arc::new(state)
	}

	fn slow(tokens: &[&str], delay: Duration) -> Arc<Self> {
		let mut state = Self { delay: Some(delay), ..Default::default() };

		state.rejected.get_mut().extend(tokens.iter().map(|token| token.to_string()));

		Arc::new(state)
	}

	fn rejects(&self, token: Option<&Token>) -> bool {
		let Some(token) = token else {
			return false;
		};

		self.rejected.lock().contains(token.expose())
			|| self
				.rejected_prefix
				.lock()
				.as_deref()
				.is_some_and(|prefix| token.expose().starts_with(prefix))
	}
}

struct Gate(Arc<GateState>);
impl Transport for Gate {
	fn execute(&self, request: Request) -> PipelineFuture<'_> {
		Box::pin(async move {
			self.0.calls.fetch_add(1, Ordering::SeqCst);
			self.0.seen.lock().push(request.clone());

			if let Some(delay) = self.0.delay {
				tokio::time::sleep(delay).await;
			}

			let token = BearerHeaderCodec::new().read(&request);
			let status = if self.0.rejects(token.as_ref()) {
				StatusCode::UNAUTHORIZED
			} else {
				StatusCode::OK
			};

			Ok(Response::new(request, status))
		})
	}
}

fn request() -> Request {
	Request::get(Url::parse("https://api.example.com/profile").expect("URL should parse."))
}

fn anonymous_pipeline(provider: Arc<MemoryTokenProvider>, gate: Arc<GateState>) -> Pipeline {
	let codec = Arc::new(BearerHeaderCodec::new());

	Pipeline::builder(Gate(gate))
		.auth(AuthInterceptor::new(provider.clone(), codec.clone(), connectivity::shared(true)))
		.challenge_handler(ChallengeCoordinator::new(Scope::Anonymous, provider, codec))
		.build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_challenges_share_one_forced_refresh() {
	const CALLERS: usize = 8;

	let provider = Arc::new(
		MemoryTokenProvider::new(Arc::new(ScopeLocks::new()), |_, issued| {
			Ok(Some(Token::new(format!("fresh-{issued}"))))
		})
		.with_token(Scope::Anonymous, "stale"),
	);
	let gate = GateState::slow(&["stale"], Duration::from_millis(25));
	let pipeline = Arc::new(anonymous_pipeline(provider.clone(), gate.clone()));
	let handles = (0..CALLERS)
		.map(|_| {
			let pipeline = pipeline.clone();

			tokio::spawn(async move { pipeline.execute(request()).await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		let response = handle
			.await
			.expect("Caller task should not panic.")
			.expect("Every caller should eventually succeed.");

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(BearerHeaderCodec::new().read(response.request()), Some(Token::new("fresh-1")));
	}

	assert_eq!(provider.forced_refreshes(), 1);
}

#[tokio::test]
async fn second_challenge_terminates_without_another_attempt() {
	let provider = Arc::new(MemoryTokenProvider::sequential(Arc::new(ScopeLocks::new())));
	let gate = GateState::rejecting_prefix("anonymous-");
	let failures = Arc::new(AtomicUsize::new(0));
	let seen = failures.clone();
	let codec = Arc::new(BearerHeaderCodec::new());
	let pipeline = Pipeline::builder(Gate(gate.clone()))
		.auth(AuthInterceptor::new(provider.clone(), codec.clone(), connectivity::shared(true)))
		.challenge_handler(
			ChallengeCoordinator::new(Scope::Anonymous, provider.clone(), codec).with_listener(
				Arc::new(move |response: Option<&Response>| {
					assert!(response.is_some());
					seen.fetch_add(1, Ordering::SeqCst);
				}),
			),
		)
		.build();
	let err = pipeline.execute(request()).await.expect_err("Exhausted retries should fail.");

	assert!(matches!(err, Error::ChallengeRejected { status: 401, .. }));
	assert_eq!(gate.calls.load(Ordering::SeqCst), 2);
	assert_eq!(provider.forced_refreshes(), 1);
	assert_eq!(failures.load(Ordering::SeqCst), 1);

	let attempts = gate.seen.lock();

	assert!(attempts[0].has_header(&protocol::RETRY_WITH_REFRESH));
	assert!(!attempts[1].has_header(&protocol::RETRY_WITH_REFRESH));
}

#[tokio::test]
async fn authenticated_exhaustion_signs_out_exactly_once() {
	let provider = Arc::new(
		MemoryTokenProvider::new(Arc::new(ScopeLocks::new()), |_, _| {
			Ok(Some(Token::new("revoked-user-token")))
		})
		.signed_in(),
	);
	let gate = GateState::rejecting(&["revoked-user-token"]);
	let codec = Arc::new(BearerHeaderCodec::new());
	let coordinator =
		ChallengeCoordinator::new(Scope::Authenticated, provider.clone(), codec.clone());
	let metrics = coordinator.metrics().clone();
	let pipeline = Pipeline::builder(Gate(gate.clone()))
		.auth(
			AuthInterceptor::new(provider.clone(), codec, connectivity::shared(true))
				.with_scope_selection(ScopeSelection::Fixed(Scope::Authenticated)),
		)
		.challenge_handler(coordinator)
		.build();
	let err = pipeline.execute(request()).await.expect_err("Revoked session should fail.");

	assert!(matches!(err, Error::ChallengeRejected { .. }));
	assert_eq!(provider.sign_outs(), 1);
	assert!(!provider.is_user_signed_in());
	assert_eq!(metrics.sign_outs(), 1);
	assert_eq!(metrics.give_ups(), 1);
	assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stale_token_is_replaced_and_marker_consumed() -> color_eyre::Result<()> {
	let provider = Arc::new(
		MemoryTokenProvider::new(Arc::new(ScopeLocks::new()), |_, _| Ok(Some(Token::new("T2"))))
			.with_token(Scope::Anonymous, "T1"),
	);
	let gate = GateState::rejecting(&["T1"]);
	let pipeline = anonymous_pipeline(provider.clone(), gate.clone());
	let response = pipeline.execute(request()).await?;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(provider.forced_refreshes(), 1);

	let attempts = gate.seen.lock();
	let codec = BearerHeaderCodec::new();

	assert_eq!(attempts.len(), 2);
	assert_eq!(codec.read(&attempts[0]), Some(Token::new("T1")));
	assert!(attempts[0].flag(&protocol::RETRY_WITH_REFRESH));
	assert_eq!(codec.read(&attempts[1]), Some(Token::new("T2")));
	assert!(!attempts[1].has_header(&protocol::RETRY_WITH_REFRESH));

	Ok(())
}

#[tokio::test]
async fn composite_falls_back_to_anonymous_scope() -> color_eyre::Result<()> {
	let provider = Arc::new(
		MemoryTokenProvider::new(Arc::new(ScopeLocks::new()), |scope, issued| {
			Ok(Some(Token::new(match scope {
				Scope::Authenticated => format!("user-{issued}"),
				Scope::Anonymous => format!("anon-{issued}"),
			})))
		})
		.signed_in(),
	);
	let gate = GateState::rejecting_prefix("user-");
	let codec = Arc::new(BearerHeaderCodec::new());
	let composite = CompositeAuthenticator::new(provider.clone(), codec.clone());
	let metrics = composite.metrics().clone();
	let pipeline = Pipeline::builder(Gate(gate.clone()))
		.auth(
			AuthInterceptor::new(provider.clone(), codec.clone(), connectivity::shared(true))
				.with_scope_selection(ScopeSelection::SignInState),
		)
		.challenge_handler(composite)
		.build();
	let response = pipeline.execute(request()).await?;
	let token = codec.read(response.request()).expect("Final request should carry a token.");

	assert_eq!(response.status(), StatusCode::OK);
	assert!(token.expose().starts_with("anon-"));
	assert!(!provider.is_user_signed_in());
	assert_eq!(provider.sign_outs(), 1);
	assert_eq!(metrics.give_ups(), 1);
	assert_eq!(gate.calls.load(Ordering::SeqCst), 3);

	Ok(())
}

#[tokio::test]
async fn composite_fallback_gets_no_second_retry() {
	let provider =
		Arc::new(MemoryTokenProvider::sequential(Arc::new(ScopeLocks::new())).signed_in());
	let gate = GateState::rejecting_prefix("");
	let codec = Arc::new(BearerHeaderCodec::new());
	let authenticated_failures = Arc::new(AtomicUsize::new(0));
	let terminal_failures = Arc::new(AtomicUsize::new(0));
	let (authenticated_seen, terminal_seen) =
		(authenticated_failures.clone(), terminal_failures.clone());
	let composite = CompositeAuthenticator::new(provider.clone(), codec.clone())
		.with_authenticated_listener(Arc::new(move |_: Option<&Response>| {
			authenticated_seen.fetch_add(1, Ordering::SeqCst);
		}))
		.with_listener(Arc::new(move |_: Option<&Response>| {
			terminal_seen.fetch_add(1, Ordering::SeqCst);
		}));
	let pipeline = Pipeline::builder(Gate(gate.clone()))
		.auth(
			AuthInterceptor::new(provider.clone(), codec.clone(), connectivity::shared(true))
				.with_scope_selection(ScopeSelection::SignInState),
		)
		.challenge_handler(composite)
		.build();
	let err = pipeline.execute(request()).await.expect_err("Every token is rejected.");

	assert!(matches!(err, Error::ChallengeRejected { status: 401, .. }));
	assert_eq!(gate.calls.load(Ordering::SeqCst), 3);
	assert_eq!(provider.forced_refreshes(), 1);
	assert_eq!(provider.sign_outs(), 1);
	assert_eq!(authenticated_failures.load(Ordering::SeqCst), 1);
	assert_eq!(terminal_failures.load(Ordering::SeqCst), 1);

	let attempts = gate.seen.lock();
	let tokens = attempts.iter().map(|request| codec.read(request)).collect::<Vec<_>>();

	assert_eq!(
		tokens,
		vec![
			Some(Token::new("authenticated-1")),
			Some(Token::new("authenticated-2")),
			Some(Token::new("anonymous-3")),
		]
	);
	assert!(attempts[0].has_header(&protocol::RETRY_WITH_REFRESH));
	assert!(!attempts[1].has_header(&protocol::RETRY_WITH_REFRESH));
	assert!(!attempts[2].has_header(&protocol::RETRY_WITH_REFRESH));
}

#[tokio::test]
async fn missing_token_fails_before_any_network_attempt() {
	let provider = Arc::new(MemoryTokenProvider::new(Arc::new(ScopeLocks::new()), |_, _| {
		Err(ProviderError::Rejected { message: "client disabled".into() })
	}));
	let gate = GateState::rejecting(&[]);
	let pipeline = anonymous_pipeline(provider, gate.clone());
	let err = pipeline.execute(request()).await.expect_err("Authentication should fail.");

	assert!(matches!(err, Error::AuthenticationFailure(_)));
	assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn offline_requests_reach_transport_without_credentials() -> color_eyre::Result<()> {
	let provider = Arc::new(MemoryTokenProvider::sequential(Arc::new(ScopeLocks::new())));
	let gate = GateState::rejecting(&[]);
	let codec = Arc::new(BearerHeaderCodec::new());
	let pipeline = Pipeline::builder(Gate(gate.clone()))
		.auth(AuthInterceptor::new(provider.clone(), codec.clone(), connectivity::shared(false)))
		.build();
	let response = pipeline.execute(request()).await?;

	assert_eq!(codec.read(response.request()), None);
	assert!(!response.request().has_header(&protocol::RETRY_WITH_REFRESH));
	assert_eq!(provider.token_requests(), 0);

	Ok(())
}
