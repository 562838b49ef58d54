//! Client-level error types shared across signing, token flows, stores, and API calls.

// self
use crate::{_prelude::*, obs::FlowKind};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Maximum number of characters kept from a non-JSON response body.
pub const BODY_PREVIEW_LIMIT: usize = 200;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential persistence failed while writing.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request signing failed.
	#[error(transparent)]
	Sign(#[from] crate::sign::SignError),
	/// Transport failure (DNS, TCP, TLS, timeout, non-2xx auth status).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// Auth endpoint answered without the `"200"` success code or without `data`.
	#[error("The {flow} endpoint rejected the request: {response}.")]
	Auth {
		/// Token flow that was rejected.
		flow: FlowKind,
		/// Full decoded response kept for diagnostics.
		response: Value,
	},
	/// Business endpoint answered with a non-zero `code`.
	#[error("API error from {path}: {payload}.")]
	Api {
		/// Request path that failed.
		path: String,
		/// Full decoded error payload.
		payload: Value,
	},
	/// Pagination stopped before the reported total was reached.
	#[error(
		"Pagination of {path} did not converge: {fetched}/{total} records after {pages} pages."
	)]
	PaginationStalled {
		/// Request path being paginated.
		path: String,
		/// Pages fetched before giving up.
		pages: usize,
		/// Records accumulated so far.
		fetched: usize,
		/// Total reported by the endpoint.
		total: usize,
	},
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required environment variable is absent or empty.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// The application id cannot be used.
	#[error("Application id is invalid.")]
	InvalidAppId(#[from] crate::auth::AppIdError),
	/// The base URL cannot be joined with a request path.
	#[error("Cannot build a request URL for `{path}`.")]
	InvalidUrl {
		/// Path that failed to join.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A duration setting is outside its allowed range.
	#[error("The {setting} setting must be {requirement}.")]
	InvalidDuration {
		/// Setting name.
		setting: &'static str,
		/// Human-readable constraint.
		requirement: &'static str,
	},
	/// Pagination cap must allow at least one page.
	#[error("The max_pages setting must be at least 1.")]
	ZeroMaxPages,
	/// Requested page size is outside `1..=500`.
	#[error("Page size {page_size} is outside 1..=500.")]
	PageSizeOutOfRange {
		/// Rejected page size.
		page_size: usize,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts, auth HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {flow} endpoint.")]
	Network {
		/// Flow that issued the request.
		flow: FlowKind,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded its fixed timeout.
	#[error("Request to the {flow} endpoint timed out.")]
	Timeout {
		/// Flow that issued the request.
		flow: FlowKind,
	},
	/// Auth endpoint answered with a non-2xx HTTP status.
	#[error("The {flow} endpoint returned HTTP {status}.")]
	Status {
		/// Flow that issued the request.
		flow: FlowKind,
		/// HTTP status code.
		status: u16,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(flow: FlowKind, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { flow, source: Box::new(src) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Body is not valid JSON.
	#[error("Non-JSON response from {endpoint}: HTTP {status} {preview}")]
	NotJson {
		/// Endpoint (flow label or request path).
		endpoint: String,
		/// HTTP status code.
		status: u16,
		/// Body truncated to [`BODY_PREVIEW_LIMIT`] characters.
		preview: String,
	},
	/// Body is JSON but a required field is missing or mistyped.
	#[error("Malformed response from {endpoint}.")]
	MalformedEnvelope {
		/// Endpoint (flow label or request path).
		endpoint: String,
		/// Structured decoding failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Auth response decoded but its lifetime cannot be turned into a credential.
	#[error("The {flow} endpoint returned an unusable credential.")]
	InvalidCredential {
		/// Token flow that produced the response.
		flow: FlowKind,
		/// Underlying credential construction failure.
		#[source]
		source: crate::auth::CredentialError,
	},
}
impl ProtocolError {
	/// Builds a [`ProtocolError::NotJson`] from a raw body, truncating the preview.
	pub fn not_json(endpoint: impl Into<String>, status: u16, body: &[u8]) -> Self {
		let text = String::from_utf8_lossy(body);

		Self::NotJson {
			endpoint: endpoint.into(),
			status,
			preview: text.chars().take(BODY_PREVIEW_LIMIT).collect(),
		}
	}
}
