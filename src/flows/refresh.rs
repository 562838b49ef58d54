//! Refresh-token exchange.
//!
//! A refresh reply that fails the success check is reported as [`RefreshOutcome::Rejected`]
//! instead of an error so the lifecycle manager can fall back to a reissue. Accepted replies
//! are persisted unconditionally, even when the new record is already near expiry.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	config::REFRESH_PATH,
	flows::{
		TokenManager,
		common::{self, AuthReply},
	},
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, FlowKind, flow_event},
};

/// Result of a refresh-token exchange.
#[derive(Clone, Debug)]
pub enum RefreshOutcome {
	/// The auth server accepted the refresh token; the credential has been persisted.
	Refreshed(Credential),
	/// The auth server answered without the success sentinel; carries the full response.
	Rejected(Value),
}
impl RefreshOutcome {
	/// Returns the refreshed credential, if any.
	pub fn credential(&self) -> Option<&Credential> {
		match self {
			Self::Refreshed(credential) => Some(credential),
			Self::Rejected(_) => None,
		}
	}
}

impl<C, M> TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges `refresh_token` and persists an accepted result.
	///
	/// Callers must already hold the acquisition guard.
	pub(crate) async fn refresh_unguarded(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<RefreshOutcome> {
		const KIND: FlowKind = FlowKind::Refresh;

		obs::observe(KIND, REFRESH_PATH, async move {
			self.metrics.record_refresh_attempt();

			let fields = vec![
				("appId".to_owned(), self.config.app_id().to_string()),
				("refreshToken".to_owned(), refresh_token.expose().to_owned()),
			];

			match common::post_auth_form(self, KIND, REFRESH_PATH, fields).await? {
				AuthReply::Granted(credential) => {
					self.store.save(credential.clone()).await?;
					flow_event!(info, expires_at = %credential.expires_at(), "Refreshed the credential.");

					Ok(RefreshOutcome::Refreshed(credential))
				},
				AuthReply::Rejected(response) => {
					flow_event!(debug, %response, "Refresh endpoint rejected the refresh token.");

					Ok(RefreshOutcome::Rejected(response))
				},
			}
		})
		.await
	}
}
