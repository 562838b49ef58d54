//! Shared plumbing for the auth and refresh calls (form posting, envelope decoding).

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{ProtocolError, TransportError},
	flows::TokenManager,
	http::{HttpRequest, HttpTransport, RequestBody, TransportErrorMapper},
	obs::FlowKind,
};

/// Success sentinel used by the auth server's `code` field (a string, not a number).
pub const AUTH_SUCCESS_CODE: &str = "200";

/// Decoded reply from an auth-server endpoint.
#[derive(Clone, Debug)]
pub enum AuthReply {
	/// `code == "200"` and `data` present; carries the credential minted from it.
	Granted(Credential),
	/// Any other decoded reply; carries the full response.
	Rejected(Value),
}

#[derive(Deserialize)]
struct AuthGrant {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default, deserialize_with = "crate::serde_ext::lenient_i64")]
	expires_in: i64,
}

/// Returns `true` when `response` carries the auth success sentinel and a `data` member.
pub fn is_auth_success(response: &Value) -> bool {
	response.get("code").and_then(Value::as_str) == Some(AUTH_SUCCESS_CODE)
		&& response.get("data").is_some()
}

/// Posts `fields` as multipart form data to `path` and decodes the auth envelope.
///
/// Non-2xx statuses surface as [`TransportError::Status`] before the body is inspected.
pub(crate) async fn post_auth_form<C, M>(
	manager: &TokenManager<C, M>,
	flow: FlowKind,
	path: &str,
	fields: Vec<(String, String)>,
) -> Result<AuthReply>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let request = HttpRequest {
		url: manager.config.endpoint(path)?,
		query: Vec::new(),
		body: RequestBody::Multipart(fields),
		timeout: manager.config.auth_timeout(),
	};
	let response = manager
		.http_client
		.execute(request)
		.await
		.map_err(|err| manager.transport_mapper.map_transport_error(flow, err))?;

	if !response.is_success() {
		return Err(TransportError::Status { flow, status: response.status }.into());
	}

	let decoded = response
		.json()
		.map_err(|_| ProtocolError::not_json(flow.as_str(), response.status, &response.body))?;

	if !is_auth_success(&decoded) {
		return Ok(AuthReply::Rejected(decoded));
	}

	Ok(AuthReply::Granted(credential_from_response(flow, decoded, OffsetDateTime::now_utc())?))
}

/// Mints a [`Credential`] from a successful auth response stamped at `obtained_at`.
pub(crate) fn credential_from_response(
	flow: FlowKind,
	response: Value,
	obtained_at: OffsetDateTime,
) -> Result<Credential> {
	let grant: AuthGrant = serde_path_to_error::deserialize(&response["data"]).map_err(|source| {
		ProtocolError::MalformedEnvelope { endpoint: flow.as_str().to_owned(), source }
	})?;
	let mut builder = Credential::builder().expires_in_secs(grant.expires_in).obtained_at(obtained_at);

	if let Some(token) = grant.access_token {
		builder = builder.access_token(token);
	}
	if let Some(token) = grant.refresh_token {
		builder = builder.refresh_token(token);
	}

	builder
		.raw_response(response)
		.build()
		.map_err(|source| ProtocolError::InvalidCredential { flow, source }.into())
}
