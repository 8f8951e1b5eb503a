//! Immutable request/response values threaded through the pipeline.
//!
//! Every transformation consumes the value and returns a new one, so a middleware only ever
//! rewrites the request it currently owns. Nothing here performs I/O.

// crates.io
use http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{CACHE_CONTROL, HeaderName},
};
// self
use crate::{_prelude::*, protocol};

/// Cache directive a middleware can force onto an outbound request.
///
/// The directive travels in the request's `Cache-Control` header so any cache beneath the
/// transport can honor it with standard semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheDirective {
	/// Skip any cached answer and go to the network.
	ForceNetwork,
	/// Answer from cache only, accepting stale entries; never touch the network.
	ForceCache,
}
impl CacheDirective {
	const FORCE_CACHE: &'static str = "max-stale=2147483647, only-if-cached";
	const FORCE_NETWORK: &'static str = "no-cache";

	/// Header value written into `Cache-Control`.
	pub const fn header_value(self) -> &'static str {
		match self {
			CacheDirective::ForceNetwork => Self::FORCE_NETWORK,
			CacheDirective::ForceCache => Self::FORCE_CACHE,
		}
	}

	/// Recognizes a `Cache-Control` value written by [`Self::header_value`].
	pub fn from_header_value(value: &str) -> Option<Self> {
		match value.trim() {
			Self::FORCE_NETWORK => Some(CacheDirective::ForceNetwork),
			Self::FORCE_CACHE => Some(CacheDirective::ForceCache),
			_ => None,
		}
	}
}
impl Display for CacheDirective {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			CacheDirective::ForceNetwork => f.write_str("FORCE_NETWORK"),
			CacheDirective::ForceCache => f.write_str("FORCE_CACHE"),
		}
	}
}

/// Outbound HTTP request.
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
	method: Method,
	url: Url,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl Request {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Target URL, including any query parameters.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// All request headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Request body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// First value of a header, if present and valid UTF-8.
	pub fn header(&self, name: &HeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Returns `true` if the header is present with any value.
	pub fn has_header(&self, name: &HeaderName) -> bool {
		self.headers.contains_key(name)
	}

	/// Reads a sideband boolean header (see [`protocol::parse_flag`]).
	pub fn flag(&self, name: &HeaderName) -> bool {
		protocol::parse_flag(self.header(name))
	}

	/// Directive currently carried in `Cache-Control`, if it is one of ours.
	pub fn cache_directive(&self) -> Option<CacheDirective> {
		self.header(&CACHE_CONTROL).and_then(CacheDirective::from_header_value)
	}

	/// Returns the request with `name` set to `value`, replacing earlier values.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Returns the request with a sideband flag set to `"true"`.
	pub fn with_flag(self, name: HeaderName) -> Self {
		self.with_header(name, HeaderValue::from_static(protocol::FLAG_ENABLED))
	}

	/// Returns the request without any value for `name`.
	pub fn without_header(mut self, name: &HeaderName) -> Self {
		self.headers.remove(name);

		self
	}

	/// Returns the request pointed at another URL.
	pub fn with_url(mut self, url: Url) -> Self {
		self.url = url;

		self
	}

	/// Returns the request with every occurrence of the query parameter `key` removed.
	pub fn without_query_param(self, key: &str) -> Self {
		let url = strip_query_param(&self.url, key);

		self.with_url(url)
	}

	/// Returns the request with `Cache-Control` replaced by the given directive.
	pub fn with_cache_directive(self, directive: CacheDirective) -> Self {
		self.with_header(CACHE_CONTROL, HeaderValue::from_static(directive.header_value()))
	}

	/// Returns the request with a new body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}
}
impl Debug for Request {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Query strings and header values may carry credentials.
		f.debug_struct("Request")
			.field("method", &self.method)
			.field("origin", &self.url.origin().ascii_serialization())
			.field("path", &self.url.path())
			.field("query_set", &self.url.query().is_some())
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("body_len", &self.body.len())
			.finish()
	}
}

/// Transport response carrying the request that produced it.
///
/// The embedded request doubles as the cache key for any cache beneath the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
	request: Request,
}
impl Response {
	/// Creates a response without headers or body.
	pub fn new(request: Request, status: StatusCode) -> Self {
		Self { status, headers: HeaderMap::new(), body: Vec::new(), request }
	}

	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Returns `true` for an authorization challenge (HTTP 401).
	pub fn is_challenge(&self) -> bool {
		self.status == StatusCode::UNAUTHORIZED
	}

	/// All response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// First value of a header, if present and valid UTF-8.
	pub fn header(&self, name: &HeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Response body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Request that produced this response.
	pub fn request(&self) -> &Request {
		&self.request
	}

	/// Consumes the response, returning the embedded request.
	pub fn into_request(self) -> Request {
		self.request
	}

	/// Returns the response with `name` set to `value`, replacing earlier values.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Returns the response with its header map replaced wholesale.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;

		self
	}

	/// Returns the response with a new body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Returns the response with its embedded request rewritten by `f`.
	pub fn map_request(mut self, f: impl FnOnce(Request) -> Request) -> Self {
		self.request = f(self.request);

		self
	}
}
impl Debug for Response {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Response")
			.field("status", &self.status)
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("body_len", &self.body.len())
			.field("request", &self.request)
			.finish()
	}
}

/// Removes every occurrence of `key` from the query string; drops the `?` when nothing is left.
pub fn strip_query_param(url: &Url, key: &str) -> Url {
	let mut stripped = url.clone();

	if url.query().is_none() {
		return stripped;
	}

	let kept = url.query_pairs().filter(|(name, _)| name != key).collect::<Vec<_>>();

	if kept.is_empty() {
		stripped.set_query(None);
	} else {
		stripped.query_pairs_mut().clear().extend_pairs(kept);
	}

	stripped
}
