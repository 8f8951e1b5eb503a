//! Thread-safe in-process [`TokenProvider`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{
		Scope, Token,
		provider::{ProviderError, ProviderFuture, ScopeLocks, TokenProvider},
	},
};

type Issuer = dyn Fn(Scope, u64) -> Result<Option<Token>, ProviderError> + Send + Sync;

/// Provider that caches one token per scope and mints new ones through an issuer closure.
///
/// The issuer receives the scope and a 1-based issuance counter. It is consulted on the first
/// request for a scope and on every forced refresh; non-forced requests are answered from the
/// cache. Authenticated tokens are only handed out while the provider is signed in.
pub struct MemoryTokenProvider {
	locks: Arc<ScopeLocks>,
	issuer: Arc<Issuer>,
	state: Mutex<MemoryState>,
}
impl MemoryTokenProvider {
	/// Creates a signed-out provider backed by `issuer`.
	pub fn new<F>(locks: Arc<ScopeLocks>, issuer: F) -> Self
	where
		F: 'static + Fn(Scope, u64) -> Result<Option<Token>, ProviderError> + Send + Sync,
	{
		Self { locks, issuer: Arc::new(issuer), state: Default::default() }
	}

	/// Creates a provider issuing `"<scope>-<n>"` tokens.
	pub fn sequential(locks: Arc<ScopeLocks>) -> Self {
		Self::new(locks, |scope, issued| Ok(Some(Token::new(format!("{scope}-{issued}")))))
	}

	/// Seeds the cached token for `scope`.
	pub fn with_token(self, scope: Scope, token: impl Into<Token>) -> Self {
		self.state.lock().set(scope, Some(token.into()));

		self
	}

	/// Starts out signed in.
	pub fn signed_in(self) -> Self {
		self.sign_in();

		self
	}

	/// Marks a user session as active.
	pub fn sign_in(&self) {
		self.state.lock().signed_in = true;
	}

	/// Currently cached token for `scope`, without minting.
	pub fn cached(&self, scope: Scope) -> Option<Token> {
		self.state.lock().get(scope).cloned()
	}

	/// Number of forced refreshes served so far.
	pub fn forced_refreshes(&self) -> u64 {
		self.state.lock().forced_refreshes
	}

	/// Number of `token` calls served so far, forced or not.
	pub fn token_requests(&self) -> u64 {
		self.state.lock().token_requests
	}

	/// Number of sign-outs performed so far.
	pub fn sign_outs(&self) -> u64 {
		self.state.lock().sign_outs
	}

	fn token_now(&self, scope: Scope, force_refresh: bool) -> Result<Option<Token>, ProviderError> {
		let mut state = self.state.lock();

		state.token_requests += 1;

		if force_refresh {
			state.forced_refreshes += 1;
		}
		if scope == Scope::Authenticated && !state.signed_in {
			return Ok(None);
		}
		if !force_refresh && let Some(token) = state.get(scope) {
			return Ok(Some(token.clone()));
		}

		state.issued += 1;

		let minted = (self.issuer)(scope, state.issued)?;

		state.set(scope, minted.clone());

		Ok(minted)
	}

	fn sign_out_now(&self) {
		let mut state = self.state.lock();

		state.signed_in = false;
		state.authenticated = None;
		state.sign_outs += 1;
	}
}
impl TokenProvider for MemoryTokenProvider {
	fn lock(&self, scope: Scope) -> &AsyncMutex<()> {
		self.locks.get(scope)
	}

	fn token(&self, scope: Scope, force_refresh: bool) -> ProviderFuture<'_, Option<Token>> {
		Box::pin(async move { self.token_now(scope, force_refresh) })
	}

	fn is_user_signed_in(&self) -> bool {
		self.state.lock().signed_in
	}

	fn sign_out(&self) -> ProviderFuture<'_, ()> {
		Box::pin(async move {
			self.sign_out_now();

			Ok(())
		})
	}
}
impl Debug for MemoryTokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("MemoryTokenProvider")
			.field("signed_in", &state.signed_in)
			.field("issued", &state.issued)
			.field("forced_refreshes", &state.forced_refreshes)
			.field("sign_outs", &state.sign_outs)
			.finish()
	}
}

#[derive(Debug, Default)]
struct MemoryState {
	anonymous: Option<Token>,
	authenticated: Option<Token>,
	signed_in: bool,
	issued: u64,
	token_requests: u64,
	forced_refreshes: u64,
	sign_outs: u64,
}
impl MemoryState {
	fn get(&self, scope: Scope) -> Option<&Token> {
		match scope {
			Scope::Anonymous => self.anonymous.as_ref(),
			Scope::Authenticated => self.authenticated.as_ref(),
		}
	}

	fn set(&mut self, scope: Scope, token: Option<Token>) {
		match scope {
			Scope::Anonymous => self.anonymous = token,
			Scope::Authenticated => self.authenticated = token,
		}
	}
}
