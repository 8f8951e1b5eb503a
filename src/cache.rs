//! Cache policy middlewares driven by the sideband headers in [`crate::protocol`].
//!
//! - [`CacheInterceptor`] (application side) forces cache-only fetches while offline and forces
//!   network fetches on request, degrading to the cache when the network fails.
//! - [`CacheResponseRewriter`] (network side) replaces server cache directives with the
//!   application's policy and strips the volatile query parameter from the cache key.
//!
//! Both read their settings from [`CacheConfig`]. The HTTP cache itself lives beneath the
//! transport and is expected to honor standard `Cache-Control` semantics.

pub mod config;
pub mod interceptor;
pub mod rewriter;

pub use config::*;
pub use interceptor::*;
pub use rewriter::*;
