//! Sideband header vocabulary shared by callers and the middlewares.
//!
//! Callers opt into cache behavior by setting any combination of [`APPLY_OFFLINE_CACHE`],
//! [`APPLY_RESPONSE_CACHE`], and [`FORCE_NETWORK_REFRESH`] to `"true"`. The auth layer owns
//! [`RETRY_WITH_REFRESH`]; callers never set it themselves.
//!
//! Header names are case-insensitive on the wire, so the constants are stored lowercase
//! (`RetryWithRefresh` and `retrywithrefresh` address the same header).

// crates.io
use http::HeaderName;

/// Presence means one refresh-and-retry cycle is still available for the request.
pub const RETRY_WITH_REFRESH: HeaderName = HeaderName::from_static("retrywithrefresh");
/// The response must stay usable while the device is offline.
///
/// It does not make the response an online cache hit; that is [`APPLY_RESPONSE_CACHE`].
pub const APPLY_OFFLINE_CACHE: HeaderName = HeaderName::from_static("applyofflinecache");
/// The response may be served from cache for the configured TTL while online.
pub const APPLY_RESPONSE_CACHE: HeaderName = HeaderName::from_static("applyresponsecache");
/// Bypass any cached answer and hit the network; degrade to the cache when that fails.
pub const FORCE_NETWORK_REFRESH: HeaderName = HeaderName::from_static("forcenetworkrefresh");

/// Value written for boolean sideband headers.
pub const FLAG_ENABLED: &str = "true";

/// Parses a sideband flag the way the middlewares read it: only a case-insensitive `true`
/// enables the flag; missing, empty, or malformed values disable it.
pub fn parse_flag(value: Option<&str>) -> bool {
	value.is_some_and(|raw| raw.trim().eq_ignore_ascii_case(FLAG_ENABLED))
}
