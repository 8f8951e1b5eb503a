// self
use crate::{_prelude::*, auth::Scope, obs::MiddlewareKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedMiddleware<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedMiddleware<F> = F;

/// A span builder used by the middlewares.
#[derive(Clone, Debug)]
pub struct MiddlewareSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl MiddlewareSpan {
	/// Creates a new span tagged with the provided middleware kind + stage. The `scope` field
	/// stays empty until [`Self::record_scope`] fills it.
	pub fn new(kind: MiddlewareKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"auth_cache_pipeline.middleware",
				middleware = kind.as_str(),
				stage,
				scope = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedMiddleware<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Tags the span with the credential scope the middleware is acting for.
	pub fn record_scope(&self, scope: Scope) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("scope", scope.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = scope;
		}
	}

	/// Emits a warning inside this span for a failure the middleware absorbs.
	pub fn warn_absorbed(&self, what: &'static str, err: &dyn StdError) {
		#[cfg(feature = "tracing")]
		{
			tracing::warn!(parent: &self.span, error = %err, "{what}");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (what, err);
		}
	}
}
