//! Pipeline-level error types shared by the auth and cache middlewares.

// self
use crate::{_prelude::*, auth::ProviderError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical pipeline error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// A token could not be attached before the request was sent.
	#[error(transparent)]
	AuthenticationFailure(#[from] AuthenticationError),
	/// The token provider failed while a challenge was being handled.
	#[error(transparent)]
	TokenRetrieval(#[from] TokenRetrievalError),
	/// Transport failure (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Network(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The challenge handler gave up on an authorization challenge.
	#[error("Authorization challenge for {url} could not be satisfied (status {status}).")]
	ChallengeRejected {
		/// Status of the final challenge response.
		status: u16,
		/// URL of the rejected request.
		url: String,
	},
	/// The challenge handler kept asking for resubmissions.
	#[error("Too many follow-up requests: {count}.")]
	TooManyFollowUps {
		/// Number of follow-ups attempted before aborting.
		count: usize,
	},
}
impl Error {
	/// Returns `true` for transport-level I/O failures, the only errors the cache layer recovers.
	pub fn is_network(&self) -> bool {
		matches!(self, Self::Network(_))
	}
}

/// Raised when the request interceptor cannot obtain a token for an outbound request.
#[derive(Debug, ThisError)]
#[error("Error while trying to retrieve auth token.")]
pub struct AuthenticationError {
	/// Provider failure, if the provider reported one; `None` when it returned no token.
	#[source]
	pub source: Option<ProviderError>,
}
impl AuthenticationError {
	/// The provider answered but had no token to hand out.
	pub fn missing_token() -> Self {
		Self { source: None }
	}

	/// The provider failed outright.
	pub fn provider(source: ProviderError) -> Self {
		Self { source: Some(source) }
	}
}

/// Raised when the provider fails during challenge handling; never retried by the coordinator.
#[derive(Debug, ThisError)]
#[error("Token retrieval failed during challenge handling (force_refresh = {force_refresh}).")]
pub struct TokenRetrievalError {
	/// Whether the failing call asked the provider for a forced refresh.
	pub force_refresh: bool,
	/// Underlying provider failure.
	#[source]
	pub source: ProviderError,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A request could not be converted for the underlying transport.
	#[error("Request could not be converted for the transport.")]
	RequestConversion {
		/// Underlying conversion failure.
		#[source]
		source: BoxError,
	},
	/// A required key or name was configured empty.
	#[error("The {field} key cannot be empty.")]
	EmptyKey {
		/// Which configuration field failed validation.
		field: &'static str,
	},
	/// The response cache TTL is negative.
	#[error("The response max-age cannot be negative ({seconds} seconds).")]
	NegativeMaxAge {
		/// Configured TTL in whole seconds.
		seconds: i64,
	},
	/// A token cannot be encoded into a header value.
	#[error("Token contains characters that are not valid in an HTTP header.")]
	InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
	/// A configured header name is not a valid HTTP header name.
	#[error("Header name is invalid.")]
	InvalidHeaderName(#[from] http::header::InvalidHeaderName),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a request conversion failure inside [`ConfigError`].
	pub fn request_conversion(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::RequestConversion { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while executing the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while executing the request.")]
	Io(#[from] std::io::Error),
	/// The connectivity oracle reported the device offline; nothing was sent.
	#[error("No network connectivity.")]
	NoConnectivity,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
