//! Opaque bearer credential that redacts itself in logs.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Opaque credential string; compared only by equality to detect staleness.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(String);
impl Token {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` for the empty string, which no codec will attach.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Stable, non-reversible identifier safe for span fields and log lines.
	///
	/// Base64 (no padding) of the first 12 bytes of the SHA-256 digest.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());

		STANDARD_NO_PAD.encode(&digest[..12])
	}
}
impl From<String> for Token {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for Token {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl AsRef<str> for Token {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Token").field(&"<redacted>").finish()
	}
}
impl Display for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_formatters_redact() {
		let token = Token::new("super-secret");

		assert_eq!(format!("{token:?}"), "Token(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
	}

	#[test]
	fn fingerprint_is_stable_and_distinguishes_tokens() {
		let a = Token::new("token-a");
		let b = Token::new("token-b");

		assert_eq!(a.fingerprint(), Token::from("token-a").fingerprint());
		assert_ne!(a.fingerprint(), b.fingerprint());
		assert_eq!(a.fingerprint().len(), 16);
		assert!(!a.fingerprint().contains("token-a"));
	}
}
