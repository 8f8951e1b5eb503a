//! Terminal stage of the pipeline: the HTTP transport that actually executes requests.
//!
//! The module exposes [`Transport`] so downstream crates can plug in any HTTP stack. Failures
//! to reach the peer must surface as [`Error::Network`]; the cache layer only recovers from that
//! variant. [`ReqwestTransport`] (feature `reqwest`) is the batteries-included implementation and
//! [`FnTransport`] adapts a closure for tests and custom stacks.

// self
use crate::{
	_prelude::*,
	message::{Request, Response},
};
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};

/// Future returned by every pipeline stage.
pub type PipelineFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a [`Request`].
///
/// Implementations must be `Send + Sync` so a single transport can serve every in-flight request.
/// Responses must embed the request that was actually sent; a cache beneath the transport uses
/// that request as its key.
pub trait Transport
where
	Self: Send + Sync,
{
	/// Executes `request` and returns whatever the peer answered, challenges included.
	fn execute(&self, request: Request) -> PipelineFuture<'_>;
}

/// Closure-backed [`Transport`].
#[derive(Clone)]
pub struct FnTransport<F>(F);
impl<F> FnTransport<F> {
	/// Wraps `f`.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F, Fut> Transport for FnTransport<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<Response>> + Send,
{
	fn execute(&self, request: Request) -> PipelineFuture<'_> {
		Box::pin((self.0)(request))
	}
}
impl<F> Debug for FnTransport<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnTransport(..)")
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Keep the client's own cache and cookie handling in mind: the pipeline communicates cache
/// policy through `Cache-Control` and expects whatever sits beneath it to honor those directives.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds the transport from a configured reqwest builder.
	pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, ConfigError> {
		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, request: Request) -> PipelineFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let outbound = client
				.request(request.method().clone(), request.url().clone())
				.headers(request.headers().clone())
				.body(request.body().to_vec())
				.build()
				.map_err(ConfigError::request_conversion)?;
			let response = client.execute(outbound).await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(TransportError::from)?;

			Ok(Response::new(request, status).with_headers(headers).with_body(body.to_vec()))
		})
	}
}
