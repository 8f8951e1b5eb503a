//! Token provider contract and the per-scope lock set providers hand out.

pub mod memory;

pub use memory::MemoryTokenProvider;

// self
use crate::{_prelude::*, auth::{Scope, Token}};

/// Future returned by [`TokenProvider`] operations.
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Issuance backend consulted by the auth middlewares.
///
/// Providers own every piece of shared mutable state the middlewares rely on: cached tokens,
/// the sign-in state, and the per-scope mutual-exclusion handles. The middlewares never cache
/// tokens themselves, so each non-forced [`token`](TokenProvider::token) call is expected to be
/// answered from the provider's own cache.
pub trait TokenProvider
where
	Self: Send + Sync,
{
	/// Mutual-exclusion handle guarding refreshes for `scope`.
	///
	/// Both scopes must return distinct handles with process lifetime; see [`ScopeLocks`].
	fn lock(&self, scope: Scope) -> &AsyncMutex<()>;

	/// Returns the current token for `scope`, minting a new one when `force_refresh` is set.
	///
	/// `Ok(None)` means the provider has no credential to offer for that scope.
	fn token(&self, scope: Scope, force_refresh: bool) -> ProviderFuture<'_, Option<Token>>;

	/// Whether a user session is currently signed in.
	fn is_user_signed_in(&self) -> bool;

	/// Ends the user session so later requests fall back to anonymous behavior.
	fn sign_out(&self) -> ProviderFuture<'_, ()>;
}

/// Failure reported by a [`TokenProvider`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderError {
	/// The issuance backend could not be reached.
	#[error("Token provider is unavailable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
	/// The issuance backend refused to hand out a token.
	#[error("Token provider rejected the request: {message}.")]
	Rejected {
		/// Human-readable error payload.
		message: String,
	},
}

/// One independent mutual-exclusion handle per [`Scope`].
///
/// Construct a single instance at startup and share it (typically behind an [`Arc`]) with
/// whichever provider serves the process. Anonymous and authenticated refreshes never contend.
#[derive(Debug)]
pub struct ScopeLocks {
	anonymous: AsyncMutex<()>,
	authenticated: AsyncMutex<()>,
}
impl ScopeLocks {
	/// Creates a fresh, unlocked pair of handles.
	pub fn new() -> Self {
		Self { anonymous: AsyncMutex::new(()), authenticated: AsyncMutex::new(()) }
	}

	/// Handle for `scope`.
	pub fn get(&self, scope: Scope) -> &AsyncMutex<()> {
		match scope {
			Scope::Anonymous => &self.anonymous,
			Scope::Authenticated => &self.authenticated,
		}
	}
}
impl Default for ScopeLocks {
	fn default() -> Self {
		Self::new()
	}
}
