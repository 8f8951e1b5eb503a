//! Device connectivity oracle consulted by the auth and cache middlewares, plus a fail-fast
//! interceptor for pipelines that should not touch the network while offline.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	error::TransportError,
	message::Request,
	pipeline::{Interceptor, Next},
	transport::PipelineFuture,
};

/// Answers "is the device online" on demand.
pub trait Connectivity
where
	Self: Send + Sync,
{
	/// Returns `true` while the network is reachable.
	fn is_connected(&self) -> bool;
}
impl<F> Connectivity for F
where
	F: Fn() -> bool + Send + Sync,
{
	fn is_connected(&self) -> bool {
		self()
	}
}

/// Connectivity state toggled by the application's own network monitor.
#[derive(Debug)]
pub struct ConnectivityFlag(AtomicBool);
impl ConnectivityFlag {
	/// Creates a flag with the given initial state.
	pub fn new(connected: bool) -> Self {
		Self(AtomicBool::new(connected))
	}

	/// Records a connectivity change.
	pub fn set(&self, connected: bool) {
		self.0.store(connected, Ordering::Release);
	}
}
impl Default for ConnectivityFlag {
	fn default() -> Self {
		Self::new(true)
	}
}
impl Connectivity for ConnectivityFlag {
	fn is_connected(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

/// Convenience for call sites that share one flag between several middlewares.
pub fn shared(connected: bool) -> Arc<ConnectivityFlag> {
	Arc::new(ConnectivityFlag::new(connected))
}

/// Fails every request with [`TransportError::NoConnectivity`] while the oracle reports the
/// device offline.
///
/// The failure is a network error, so a [`CacheInterceptor`](crate::cache::CacheInterceptor)
/// further out treats it like any other I/O failure. Requests the cache layer would answer
/// offline are rejected as well; install it on pipelines without offline caching.
pub struct ConnectivityInterceptor {
	connectivity: Arc<dyn Connectivity>,
}
impl ConnectivityInterceptor {
	/// Creates an interceptor consulting `connectivity` before every request.
	pub fn new(connectivity: Arc<dyn Connectivity>) -> Self {
		Self { connectivity }
	}
}
impl Interceptor for ConnectivityInterceptor {
	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> PipelineFuture<'a> {
		Box::pin(async move {
			if !self.connectivity.is_connected() {
				return Err(Error::from(TransportError::NoConnectivity));
			}

			next.run(request).await
		})
	}
}
impl Debug for ConnectivityInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConnectivityInterceptor")
			.field("connected", &self.connectivity.is_connected())
			.finish()
	}
}
