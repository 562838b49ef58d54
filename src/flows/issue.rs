//! Full reissue using the application id and secret.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::AUTH_PATH,
	flows::{
		TokenManager,
		common::{self, AuthReply},
	},
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, FlowKind, flow_event},
};

impl<C, M> TokenManager<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Authenticates from scratch and overwrites the stored credential.
	///
	/// Callers must already hold the acquisition guard.
	pub(crate) async fn reissue_unguarded(&self) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Reissue;

		obs::observe(KIND, AUTH_PATH, async move {
			self.metrics.record_reissue();

			let fields = vec![
				("appId".to_owned(), self.config.app_id().to_string()),
				("appSecret".to_owned(), self.config.app_secret().expose().to_owned()),
			];
			let credential = match common::post_auth_form(self, KIND, AUTH_PATH, fields).await? {
				AuthReply::Granted(credential) => credential,
				AuthReply::Rejected(response) => return Err(Error::Auth { flow: KIND, response }),
			};

			self.store.save(credential.clone()).await?;
			flow_event!(info, expires_at = %credential.expires_at(), "Issued a new credential.");

			Ok(credential)
		})
		.await
	}
}
