//! Where a token lives on the wire.

// crates.io
use http::{
	HeaderValue,
	header::{AUTHORIZATION, HeaderName},
};
// self
use crate::{_prelude::*, auth::Token, error::ConfigError, message::Request};

/// Reads, writes, and strips a token on a request.
///
/// Implementations are pure functions over their inputs. [`write`](TokenCodec::write) strips any
/// earlier token before inserting the new one, so callers never need to call
/// [`remove_token`](TokenCodec::remove_token) first.
pub trait TokenCodec
where
	Self: Send + Sync,
{
	/// Token currently carried by `request`, if any.
	fn read(&self, request: &Request) -> Option<Token>;

	/// Returns `request` carrying `token` in place of any earlier token.
	///
	/// An empty token is never attached; the request is returned stripped instead.
	fn write(&self, request: Request, token: &Token) -> Result<Request>;

	/// Returns `request` without any token.
	fn remove_token(&self, request: Request) -> Request;
}

/// Token in a request header, `Authorization: Bearer <token>` by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BearerHeaderCodec {
	header: HeaderName,
	scheme: Option<String>,
}
impl BearerHeaderCodec {
	/// `Authorization: Bearer <token>`.
	pub fn new() -> Self {
		Self { header: AUTHORIZATION, scheme: Some("Bearer".into()) }
	}

	/// Uses another header name.
	pub fn with_header(mut self, header: HeaderName) -> Self {
		self.header = header;

		self
	}

	/// Uses another scheme prefix, or none for a raw token value.
	pub fn with_scheme(mut self, scheme: Option<&str>) -> Self {
		self.scheme = scheme.map(str::to_owned);

		self
	}

	fn strip_scheme<'a>(&self, value: &'a str) -> Option<&'a str> {
		let value = value.trim();

		match &self.scheme {
			Some(scheme) => {
				let (prefix, rest) = value.split_once(' ')?;

				prefix.eq_ignore_ascii_case(scheme).then(|| rest.trim())
			},
			None => Some(value),
		}
	}
}
impl Default for BearerHeaderCodec {
	fn default() -> Self {
		Self::new()
	}
}
impl TokenCodec for BearerHeaderCodec {
	fn read(&self, request: &Request) -> Option<Token> {
		request
			.header(&self.header)
			.and_then(|value| self.strip_scheme(value))
			.filter(|token| !token.is_empty())
			.map(Token::from)
	}

	fn write(&self, request: Request, token: &Token) -> Result<Request> {
		let request = self.remove_token(request);

		if token.is_empty() {
			return Ok(request);
		}

		let raw = match &self.scheme {
			Some(scheme) => format!("{scheme} {}", token.expose()),
			None => token.expose().to_owned(),
		};
		let mut value = HeaderValue::try_from(raw).map_err(ConfigError::from)?;

		value.set_sensitive(true);

		Ok(request.with_header(self.header.clone(), value))
	}

	fn remove_token(&self, request: Request) -> Request {
		request.without_header(&self.header)
	}
}

/// Token in a query parameter, e.g. `?auth=<token>`.
///
/// Pair it with a cache layer configured with the same volatile parameter so cached entries
/// survive token rotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParamCodec {
	param: String,
}
impl QueryParamCodec {
	/// Uses `param` as the query parameter name.
	pub fn new(param: impl Into<String>) -> Result<Self, ConfigError> {
		let param = param.into();

		if param.is_empty() {
			return Err(ConfigError::EmptyKey { field: "token query parameter" });
		}

		Ok(Self { param })
	}

	/// Query parameter name.
	pub fn param(&self) -> &str {
		&self.param
	}
}
impl TokenCodec for QueryParamCodec {
	fn read(&self, request: &Request) -> Option<Token> {
		request
			.url()
			.query_pairs()
			.find(|(name, value)| name == self.param.as_str() && !value.is_empty())
			.map(|(_, value)| Token::new(value.into_owned()))
	}

	fn write(&self, request: Request, token: &Token) -> Result<Request> {
		let request = self.remove_token(request);

		if token.is_empty() {
			return Ok(request);
		}

		let mut url = request.url().clone();

		url.query_pairs_mut().append_pair(&self.param, token.expose());

		Ok(request.with_url(url))
	}

	fn remove_token(&self, request: Request) -> Request {
		request.without_query_param(&self.param)
	}
}
