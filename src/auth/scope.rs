//! Credential scopes and how the request interceptor picks one.

// self
use crate::_prelude::*;

/// Credential class a token request concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
	/// Tokens issued without a signed-in user.
	Anonymous,
	/// Tokens tied to a signed-in user session.
	Authenticated,
}
impl Scope {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Scope::Anonymous => "anonymous",
			Scope::Authenticated => "authenticated",
		}
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a middleware decides which [`Scope`] governs a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeSelection {
	/// Always use the given scope.
	Fixed(Scope),
	/// [`Scope::Authenticated`] while the provider reports a signed-in user,
	/// [`Scope::Anonymous`] otherwise.
	SignInState,
}
impl ScopeSelection {
	/// Resolves the scope given the provider's current sign-in state.
	pub fn resolve(self, signed_in: bool) -> Scope {
		match self {
			ScopeSelection::Fixed(scope) => scope,
			ScopeSelection::SignInState if signed_in => Scope::Authenticated,
			ScopeSelection::SignInState => Scope::Anonymous,
		}
	}
}
impl Default for ScopeSelection {
	fn default() -> Self {
		Self::Fixed(Scope::Anonymous)
	}
}
