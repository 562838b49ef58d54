//! Transport primitives for auth and business calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack: it executes one `POST`
//! and hands back the status plus raw body, leaving JSON decoding and success checks to the
//! flows. [`TransportErrorMapper`] turns the transport's own error type into the client
//! taxonomy so custom transports keep timeouts and network failures distinguishable.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::{header::CONTENT_TYPE, multipart::Form};
// self
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};
use crate::{_prelude::*, obs::FlowKind};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of issuing the client's `POST` requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by the
/// token manager and the API client behind `Arc`. Each call must honour
/// [`HttpRequest::timeout`] and must not retry on its own.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes `request` and returns the raw response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Maps transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport while running `flow`.
	fn map_transport_error(&self, flow: FlowKind, error: E) -> Error;
}

/// Outbound `POST` request.
#[derive(Clone)]
pub struct HttpRequest {
	/// Absolute endpoint URL.
	pub url: Url,
	/// Query-string pairs, in order.
	pub query: Vec<(String, String)>,
	/// Request payload.
	pub body: RequestBody,
	/// Fixed per-call timeout.
	pub timeout: Duration,
}
impl Debug for HttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let query_keys = self.query.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();

		f.debug_struct("HttpRequest")
			.field("url", &self.url.as_str())
			.field("query_keys", &query_keys)
			.field("body", &self.body)
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Payload variants used by the remote API.
#[derive(Clone)]
pub enum RequestBody {
	/// `multipart/form-data` text fields (auth endpoints).
	Multipart(Vec<(String, String)>),
	/// JSON document (business endpoints).
	Json(Value),
}
impl RequestBody {
	/// Returns the multipart field value for `name`, if present.
	pub fn field(&self, name: &str) -> Option<&str> {
		match self {
			Self::Multipart(fields) =>
				fields.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str()),
			Self::Json(_) => None,
		}
	}
}
impl Debug for RequestBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Multipart(fields) => {
				let keys = fields.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();

				f.debug_tuple("RequestBody::Multipart").field(&keys).finish()
			},
			Self::Json(value) => f.debug_tuple("RequestBody::Json").field(value).finish(),
		}
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Builds a response from a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body as JSON.
	pub fn json(&self) -> Result<Value, serde_json::Error> {
		serde_json::from_slice(&self.body)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let HttpRequest { url, query, body, timeout } = request;
			let mut builder = client.post(url).timeout(timeout.unsigned_abs());

			if !query.is_empty() {
				builder = builder.query(&query);
			}

			builder = match body {
				RequestBody::Multipart(fields) => builder.multipart(
					fields.into_iter().fold(Form::new(), |form, (key, value)| form.text(key, value)),
				),
				RequestBody::Json(value) =>
					builder.header(CONTENT_TYPE, "application/json").body(value.to_string()),
			};

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, body })
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, flow: FlowKind, err: ReqwestError) -> Error {
		if err.is_builder() {
			return ConfigError::from(err).into();
		}
		if err.is_timeout() {
			return TransportError::Timeout { flow }.into();
		}

		TransportError::network(flow, err).into()
	}
}
