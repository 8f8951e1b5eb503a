//! Cache layer configuration.

// self
use crate::{_prelude::*, error::ConfigError};

/// Settings shared by [`CacheInterceptor`](crate::cache::CacheInterceptor) and
/// [`CacheResponseRewriter`](crate::cache::CacheResponseRewriter).
///
/// Deserializes with every field optional; `response_max_age` is expressed in seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
	/// Query parameter excluded from cache keys, typically the one carrying an auth token.
	pub volatile_query_param: Option<String>,
	/// TTL advertised for responses cached while online.
	#[serde(with = "seconds")]
	pub response_max_age: Duration,
}
impl CacheConfig {
	/// TTL used when none is configured.
	pub const DEFAULT_MAX_AGE: Duration = Duration::hours(1);

	/// Sets the volatile query parameter.
	pub fn with_volatile_query_param(mut self, param: impl Into<String>) -> Self {
		self.volatile_query_param = Some(param.into());

		self
	}

	/// Sets the online TTL.
	pub fn with_response_max_age(mut self, max_age: Duration) -> Self {
		self.response_max_age = max_age;

		self
	}

	/// Rejects an empty parameter key and a negative TTL.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.volatile_query_param.as_deref().is_some_and(str::is_empty) {
			return Err(ConfigError::EmptyKey { field: "volatile query parameter" });
		}
		if self.response_max_age.is_negative() {
			return Err(ConfigError::NegativeMaxAge {
				seconds: self.response_max_age.whole_seconds(),
			});
		}

		Ok(())
	}
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self { volatile_query_param: None, response_max_age: Self::DEFAULT_MAX_AGE }
	}
}

mod seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
