//! Token lifecycle: reuse the cached credential, refresh it, or reissue from scratch.
//!
//! [`TokenManager::credential`] walks the decision ladder on every call:
//!
//! 1. `force_renew` skips the store entirely and performs a full reissue.
//! 2. A cached credential that is still valid (outside the expiry buffer) is returned with no
//!    network traffic.
//! 3. A cached refresh token is exchanged; a refreshed credential that is valid wins.
//! 4. Everything else (no cache, no refresh token, refresh rejected by the API, refreshed but
//!    already inside the buffer) falls through to a single reissue.
//!
//! Both remote flows persist the complete new record before returning, even when the refreshed
//! record turns out to be unusable. Transport and decoding failures during refresh are not
//! swallowed; only an API-level rejection triggers the reissue fallback.

pub mod common;
pub mod metrics;
pub mod refresh;

mod issue;

pub use metrics::LifecycleMetrics;
pub use refresh::RefreshOutcome;

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialStatus, TokenSecret},
	config::ClientConfig,
	http::{HttpTransport, TransportErrorMapper},
	obs::{FlowKind, flow_event},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Token manager specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenManager = TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Owns the credential store and decides between reuse, refresh, and reissue.
///
/// A single async mutex serialises acquisitions so two tasks sharing one manager never race
/// each other on the store. Separate processes sharing a token file are not coordinated.
pub struct TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP transport used for auth and refresh calls.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Persistence backend holding the current credential.
	pub store: Arc<dyn CredentialStore>,
	/// Endpoints, application credentials, and timeouts.
	pub config: Arc<ClientConfig>,
	/// Shared counters for lifecycle decisions.
	pub metrics: Arc<LifecycleMetrics>,
	guard: Arc<AsyncMutex<()>>,
}
impl<C, M> TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: impl Into<Arc<ClientConfig>>,
		store: Arc<dyn CredentialStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			config: config.into(),
			metrics: Default::default(),
			guard: Default::default(),
		}
	}

	/// Returns a usable access token, contacting the auth server only when required.
	pub async fn access_token(&self, force_renew: bool) -> Result<TokenSecret> {
		let credential = self.credential(force_renew).await?;

		match credential.access_token() {
			Some(token) => Ok(token.clone()),
			None => Err(Error::Auth {
				flow: FlowKind::Reissue,
				response: credential.raw_response().clone(),
			}),
		}
	}

	/// Returns the current credential, refreshing or reissuing it as needed.
	///
	/// With `force_renew` the store is never read; a full reissue always happens.
	pub async fn credential(&self, force_renew: bool) -> Result<Credential> {
		let _serial = self.guard.lock().await;

		if force_renew {
			flow_event!(debug, "Forced renewal requested; bypassing the credential cache.");

			return self.reissue_unguarded().await;
		}

		let buffer = self.config.expiry_buffer();
		let cached = self.load_cached().await;

		if let Some(credential) = &cached {
			let status = credential.status_at(OffsetDateTime::now_utc(), buffer);

			if status == CredentialStatus::Valid {
				self.metrics.record_cache_hit();
				flow_event!(debug, expires_at = %credential.expires_at(), "Reusing cached credential.");

				return Ok(credential.clone());
			}

			flow_event!(debug, ?status, "Cached credential cannot be reused as-is.");
		}

		if let Some(refresh_token) = cached.as_ref().and_then(Credential::refresh_token) {
			match self.refresh_unguarded(refresh_token).await? {
				RefreshOutcome::Refreshed(credential) if credential.is_valid(buffer) =>
					return Ok(credential),
				RefreshOutcome::Refreshed(_) => {
					flow_event!(info, "Refreshed credential is already inside the expiry buffer.");
				},
				RefreshOutcome::Rejected(_) => {
					self.metrics.record_refresh_rejection();
					flow_event!(warn, "Refresh token was rejected; falling back to reissue.");
				},
			}
		}

		self.reissue_unguarded().await
	}

	/// Performs a full reissue with the application id and secret, persisting the result.
	pub async fn reissue(&self) -> Result<Credential> {
		let _serial = self.guard.lock().await;

		self.reissue_unguarded().await
	}

	/// Exchanges `refresh_token` for a new credential, persisting any accepted result.
	pub async fn refresh(&self, refresh_token: &TokenSecret) -> Result<RefreshOutcome> {
		let _serial = self.guard.lock().await;

		self.refresh_unguarded(refresh_token).await
	}

	async fn load_cached(&self) -> Option<Credential> {
		match self.store.load().await {
			Ok(credential) => credential,
			Err(err) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %err, "Cached credential is unreadable; treating it as absent.");
				#[cfg(not(feature = "tracing"))]
				let _ = err;

				None
			},
		}
	}
}
impl<C, M> Clone for TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			guard: self.guard.clone(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager backed by its own reqwest transport.
	pub fn new(config: impl Into<Arc<ClientConfig>>, store: Arc<dyn CredentialStore>) -> Self {
		Self::with_http_client(
			config,
			store,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.finish()
	}
}
