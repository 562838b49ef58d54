//! Validated LingXing application id.
//!
//! The application id is sent as `appId`/`app_key` and its raw bytes are also the AES key used
//! when signing business requests, so it must be exactly 16, 24, or 32 bytes long.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Key lengths (bytes) accepted by the AES signing step.
pub const SIGNING_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Error returned when application id validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum AppIdError {
	/// The id was empty.
	#[error("Application id cannot be empty.")]
	Empty,
	/// The id contains whitespace characters.
	#[error("Application id contains whitespace.")]
	ContainsWhitespace,
	/// The id cannot serve as an AES key.
	#[error("Application id must be 16, 24, or 32 bytes long to sign requests, got {len}.")]
	InvalidKeyLength {
		/// Observed byte length.
		len: usize,
	},
}

/// Application id issued by LingXing (`appId`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);
impl AppId {
	/// Creates a new application id after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, AppIdError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Raw bytes used as the AES signing key.
	pub fn signing_key(&self) -> &[u8] {
		self.0.as_bytes()
	}
}
impl Deref for AppId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for AppId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<AppId> for String {
	fn from(value: AppId) -> Self {
		value.0
	}
}
impl TryFrom<String> for AppId {
	type Error = AppIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for AppId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AppId({})", self.0)
	}
}
impl Display for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for AppId {
	type Err = AppIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), AppIdError> {
	if view.is_empty() {
		return Err(AppIdError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(AppIdError::ContainsWhitespace);
	}
	if !SIGNING_KEY_LENGTHS.contains(&view.len()) {
		return Err(AppIdError::InvalidKeyLength { len: view.len() });
	}

	Ok(())
}
