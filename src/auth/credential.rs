//! Persisted credential record, expiry bookkeeping, and its builder.
//!
//! A [`Credential`] is never mutated after construction: every refresh or reissue produces a
//! new record that replaces the stored one wholesale. `expires_at` is always derived from
//! `obtained_at + expires_in`, including when a record is read back from storage, so a
//! hand-edited or stale `expires_at` on disk is ignored.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifecycle status of a credential relative to an instant and a safety buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// `now < expires_at - buffer`; safe to use without contacting the auth server.
	Valid,
	/// The buffer window has been entered (or the token already expired).
	NearExpiry,
	/// The record holds no access token at all.
	Unusable,
}

/// Errors produced while assembling a [`Credential`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialError {
	/// `obtained_at + expires_in` does not fit in the supported date range.
	#[error("The expires_in value {expires_in} overflows the supported date range.")]
	ExpiryOutOfRange {
		/// Offending lifetime in seconds.
		expires_in: i64,
	},
}

/// Immutable credential issued by the auth server.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "CredentialSnapshot", into = "CredentialSnapshot")]
pub struct Credential {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	expires_in: Duration,
	obtained_at: OffsetDateTime,
	expires_at: OffsetDateTime,
	raw_response: Value,
}
impl Credential {
	/// Returns a builder stamped with the current clock.
	pub fn builder() -> CredentialBuilder {
		CredentialBuilder::default()
	}

	/// Access token, when the auth server supplied a non-empty one.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref().filter(|secret| !secret.is_empty())
	}

	/// Refresh token, when the auth server supplied a non-empty one.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_empty())
	}

	/// Lifetime reported by the auth server.
	pub fn expires_in(&self) -> Duration {
		self.expires_in
	}

	/// Instant the credential was received (whole seconds).
	pub fn obtained_at(&self) -> OffsetDateTime {
		self.obtained_at
	}

	/// Derived expiry instant (`obtained_at + expires_in`).
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Full decoded auth response the credential was minted from.
	pub fn raw_response(&self) -> &Value {
		&self.raw_response
	}

	/// Computes the lifecycle status at `instant` with the provided safety buffer.
	pub fn status_at(&self, instant: OffsetDateTime, buffer: Duration) -> CredentialStatus {
		if self.access_token().is_none() {
			return CredentialStatus::Unusable;
		}
		if self.expires_at.checked_sub(buffer).is_some_and(|deadline| instant < deadline) {
			return CredentialStatus::Valid;
		}

		CredentialStatus::NearExpiry
	}

	/// Returns `true` if the credential can be used as-is at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime, buffer: Duration) -> bool {
		matches!(self.status_at(instant, buffer), CredentialStatus::Valid)
	}

	/// Convenience helper that checks validity against the current UTC instant.
	pub fn is_valid(&self, buffer: Duration) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc(), buffer)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("obtained_at", &self.obtained_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credential`]; deliberately offers no way to set `expires_at` directly.
#[derive(Clone, Debug)]
pub struct CredentialBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	expires_in_secs: i64,
	obtained_at: OffsetDateTime,
	raw_response: Value,
}
impl Default for CredentialBuilder {
	fn default() -> Self {
		Self {
			access_token: None,
			refresh_token: None,
			expires_in_secs: 0,
			obtained_at: OffsetDateTime::now_utc(),
			raw_response: Value::Null,
		}
	}
}
impl CredentialBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the lifetime in seconds as reported by the auth server.
	pub fn expires_in_secs(mut self, seconds: i64) -> Self {
		self.expires_in_secs = seconds;

		self
	}

	/// Sets the instant the credential was obtained; sub-second precision is dropped.
	pub fn obtained_at(mut self, instant: OffsetDateTime) -> Self {
		self.obtained_at = instant;

		self
	}

	/// Attaches the decoded auth response for diagnostics.
	pub fn raw_response(mut self, response: Value) -> Self {
		self.raw_response = response;

		self
	}

	/// Consumes the builder and derives `expires_at`.
	pub fn build(self) -> Result<Credential, CredentialError> {
		let obtained_at = whole_seconds(self.obtained_at);
		let expires_in = Duration::seconds(self.expires_in_secs);
		let expires_at = obtained_at
			.checked_add(expires_in)
			.ok_or(CredentialError::ExpiryOutOfRange { expires_in: self.expires_in_secs })?;

		Ok(Credential {
			access_token: self.access_token,
			refresh_token: self.refresh_token,
			expires_in,
			obtained_at,
			expires_at,
			raw_response: self.raw_response,
		})
	}
}

/// On-disk shape: `access_token, refresh_token, expires_in, obtained_at, expires_at,
/// raw_response` with unix-second timestamps.
#[derive(Serialize, Deserialize)]
struct CredentialSnapshot {
	access_token: Option<String>,
	refresh_token: Option<String>,
	#[serde(default, deserialize_with = "crate::serde_ext::lenient_i64")]
	expires_in: i64,
	#[serde(with = "time::serde::timestamp")]
	obtained_at: OffsetDateTime,
	#[serde(default, with = "time::serde::timestamp::option")]
	expires_at: Option<OffsetDateTime>,
	#[serde(default)]
	raw_response: Value,
}
impl TryFrom<CredentialSnapshot> for Credential {
	type Error = CredentialError;

	fn try_from(snapshot: CredentialSnapshot) -> Result<Self, Self::Error> {
		// The stored expires_at is informational only.
		let _ = snapshot.expires_at;
		let mut builder = Credential::builder()
			.expires_in_secs(snapshot.expires_in)
			.obtained_at(snapshot.obtained_at)
			.raw_response(snapshot.raw_response);

		if let Some(token) = snapshot.access_token {
			builder = builder.access_token(token);
		}
		if let Some(token) = snapshot.refresh_token {
			builder = builder.refresh_token(token);
		}

		builder.build()
	}
}
impl From<Credential> for CredentialSnapshot {
	fn from(credential: Credential) -> Self {
		Self {
			access_token: credential.access_token.map(|secret| secret.expose().to_owned()),
			refresh_token: credential.refresh_token.map(|secret| secret.expose().to_owned()),
			expires_in: credential.expires_in.whole_seconds(),
			obtained_at: credential.obtained_at,
			expires_at: Some(credential.expires_at),
			raw_response: credential.raw_response,
		}
	}
}

fn whole_seconds(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}
