//! Bearer-credential middlewares and the collaborator contracts they rely on.
//!
//! - [`AuthInterceptor`] runs on every outbound request: it strips caller-supplied tokens,
//!   attaches a fresh one plus the one-shot retry marker, or normalizes the request when offline.
//! - [`ChallengeCoordinator`] runs when the transport reports an authorization challenge. It
//!   serializes refreshes per [`Scope`], forces a refresh only when the provider still hands out
//!   the stale token, and escalates to sign-out when authenticated retries are exhausted.
//! - [`CompositeAuthenticator`] chains the authenticated and anonymous coordinators.
//!
//! [`TokenProvider`] and [`TokenCodec`] are the only places that know where tokens come from and
//! where they live on the wire.

pub mod challenge;
pub mod codec;
pub mod interceptor;
pub mod listener;
pub mod provider;
pub mod scope;
pub mod token;

pub use challenge::*;
pub use codec::*;
pub use interceptor::*;
pub use listener::*;
pub use provider::*;
pub use scope::*;
pub use token::*;
