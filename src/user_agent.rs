//! Application `User-Agent` stamping.

// crates.io
use http::{HeaderValue, header::USER_AGENT};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	message::Request,
	pipeline::{Interceptor, Next},
	transport::PipelineFuture,
};

/// Identity rendered as `<platform>-<app_name>-<version>-<build_type>`.
///
/// `app_name` should be language independent; it is lowercased and its spaces become
/// underscores before rendering.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppIdentity {
	/// Platform prefix, e.g. `android`.
	pub platform: String,
	/// Human-readable application identifier.
	pub app_name: String,
	/// Application version.
	pub version: String,
	/// Build flavor, e.g. `debug` or `release`.
	pub build_type: String,
}
impl AppIdentity {
	/// Creates an identity from its four parts.
	pub fn new(
		platform: impl Into<String>,
		app_name: impl Into<String>,
		version: impl Into<String>,
		build_type: impl Into<String>,
	) -> Self {
		Self {
			platform: platform.into(),
			app_name: app_name.into(),
			version: version.into(),
			build_type: build_type.into(),
		}
	}

	/// Renders the header value.
	pub fn user_agent(&self) -> Result<HeaderValue, ConfigError> {
		if self.app_name.trim().is_empty() {
			return Err(ConfigError::EmptyKey { field: "app name" });
		}

		let app_name = self.app_name.replace(' ', "_").to_lowercase();
		let rendered =
			format!("{}-{app_name}-{}-{}", self.platform, self.version, self.build_type);

		Ok(HeaderValue::from_str(&rendered)?)
	}
}

/// Sets `User-Agent` on every request, replacing whatever the caller supplied.
#[derive(Clone, Debug)]
pub struct UserAgentInterceptor {
	value: HeaderValue,
}
impl UserAgentInterceptor {
	/// Renders `identity` once for all requests.
	pub fn new(identity: &AppIdentity) -> Result<Self, ConfigError> {
		Ok(Self { value: identity.user_agent()? })
	}

	/// Header value stamped onto requests.
	pub fn value(&self) -> &HeaderValue {
		&self.value
	}
}
impl Interceptor for UserAgentInterceptor {
	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> PipelineFuture<'a> {
		next.run(request.with_header(USER_AGENT, self.value.clone()))
	}
}
