//! Signed business calls and paginated range fetches.
//!
//! [`ApiClient::post_signed`] obtains a token from the [`TokenManager`], signs the merged system
//! and business parameters, and posts the JSON body with the auth parameters in the query
//! string. [`ApiClient::fetch_range`] drives [`PageCursor`] over a time window, one page at a
//! time, with a fixed delay between pages.

pub mod orders;
pub mod page;

pub use orders::*;
pub use page::*;

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::ProtocolError,
	flows::TokenManager,
	http::{HttpRequest, HttpTransport, RequestBody, TransportErrorMapper},
	obs::{self, FlowKind, flow_event},
	sign::{self, SystemParams},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::{
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	store::FileStore,
};

#[cfg(feature = "reqwest")]
/// API client specialized for the crate's default reqwest transport stack.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

#[derive(Debug, Deserialize)]
struct PageEnvelope {
	data: PageData,
}

#[derive(Debug, Deserialize)]
struct PageData {
	#[serde(default, deserialize_with = "crate::serde_ext::lenient_i64")]
	total: i64,
	#[serde(default)]
	list: Option<Vec<Value>>,
}

/// Client for signed LingXing business endpoints.
pub struct ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	tokens: TokenManager<C, M>,
}
impl<C, M> ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: impl Into<Arc<ClientConfig>>,
		store: Arc<dyn CredentialStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self { tokens: TokenManager::with_http_client(config, store, http_client, mapper) }
	}

	/// Wraps an existing token manager.
	pub fn from_token_manager(tokens: TokenManager<C, M>) -> Self {
		Self { tokens }
	}

	/// Token lifecycle manager backing this client.
	pub fn tokens(&self) -> &TokenManager<C, M> {
		&self.tokens
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.tokens.config
	}

	/// Issues one signed `POST` to `path` and returns the decoded envelope.
	///
	/// The envelope is returned as-is once its `code` equals `0`; callers pick `data` apart
	/// themselves. A non-JSON body is a protocol error regardless of the HTTP status.
	pub async fn post_signed(&self, path: &str, body: &Map<String, Value>) -> Result<Value> {
		obs::observe(FlowKind::SignedCall, path, self.send_signed(path, body)).await
	}

	/// Fetches every record in the window, page by page, in server order.
	///
	/// Stops with [`Error::PaginationStalled`] when the configured page cap is reached or a page
	/// comes back empty while the reported total has not been reached.
	pub async fn fetch_range(&self, path: &str, query: RangeQuery) -> Result<Vec<Value>> {
		obs::observe(FlowKind::FetchRange, path, self.collect_pages(path, query)).await
	}

	async fn send_signed(&self, path: &str, body: &Map<String, Value>) -> Result<Value> {
		let config = self.config();
		let access_token = self.tokens.access_token(false).await?;
		let system = SystemParams {
			access_token: access_token.expose().to_owned(),
			app_key: config.app_id().to_string(),
			timestamp: OffsetDateTime::now_utc().unix_timestamp(),
		};
		let signature = sign::sign(&system.to_map(), body, config.app_id().signing_key())?;
		let request = HttpRequest {
			url: config.endpoint(path)?,
			query: system.query_pairs(&signature.sign),
			body: RequestBody::Json(Value::Object(body.clone())),
			timeout: config.data_timeout(),
		};
		let response = self
			.tokens
			.http_client
			.execute(request)
			.await
			.map_err(|err| self.tokens.transport_mapper.map_transport_error(FlowKind::SignedCall, err))?;
		let payload = response
			.json()
			.map_err(|_| ProtocolError::not_json(path, response.status, &response.body))?;

		if !is_api_success(&payload) {
			return Err(Error::Api { path: path.to_owned(), payload });
		}

		Ok(payload)
	}

	async fn collect_pages(&self, path: &str, query: RangeQuery) -> Result<Vec<Value>> {
		let mut cursor = PageCursor::new(query.page_size)?;
		let mut body = query.first_page_body();
		let mut records = Vec::new();
		let max_pages = self.config().max_pages();
		let delay = self.config().page_delay();

		while cursor.has_more() {
			let total = cursor.total().unwrap_or_default();

			if cursor.pages() >= max_pages {
				return Err(stalled(path, &cursor, total));
			}
			if cursor.pages() > 0 {
				body.insert("offset".into(), Value::from(cursor.offset()));

				if delay.is_positive() {
					tokio::time::sleep(delay.unsigned_abs()).await;
				}
			}

			let envelope = self.post_signed(path, &body).await?;
			let page = decode_page(path, envelope)?;
			let reported_total = usize::try_from(page.total).unwrap_or_default();
			let list = page.list.unwrap_or_default();

			if cursor.pages() > 0 && list.is_empty() {
				return Err(stalled(path, &cursor, total));
			}

			cursor.advance(reported_total, list.len());
			records.extend(list);

			flow_event!(
				info,
				page = cursor.pages(),
				fetched = cursor.fetched(),
				total = cursor.total().unwrap_or_default(),
				"Fetched page."
			);
		}

		obs::record_fetched_records(path, records.len());
		flow_event!(
			info,
			pages = cursor.pages(),
			fetched = records.len(),
			total = cursor.total().unwrap_or_default(),
			"Range fetch complete."
		);

		Ok(records)
	}
}
impl<C, M> Clone for ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { tokens: self.tokens.clone() }
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by its own reqwest transport.
	pub fn new(config: impl Into<Arc<ClientConfig>>, store: Arc<dyn CredentialStore>) -> Self {
		Self::from_token_manager(TokenManager::new(config, store))
	}

	/// Builds a client from `APP_ID` / `APP_SECRET` with the token cached in `token.json`.
	pub fn from_env() -> Result<Self> {
		let config = ClientConfig::from_env()?;
		let store = FileStore::open(FileStore::DEFAULT_PATH)?;

		Ok(Self::new(config, Arc::new(store)))
	}
}
impl<C, M> Debug for ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").field("tokens", &self.tokens).finish()
	}
}

/// Returns `true` when a business envelope reports the numeric success code `0`.
pub fn is_api_success(payload: &Value) -> bool {
	payload.get("code").filter(|code| code.is_number()).and_then(Value::as_f64) == Some(0.0)
}

fn decode_page(path: &str, envelope: Value) -> Result<PageData> {
	let PageEnvelope { data } = serde_path_to_error::deserialize(envelope)
		.map_err(|source| ProtocolError::MalformedEnvelope { endpoint: path.to_owned(), source })?;

	Ok(data)
}

fn stalled(path: &str, cursor: &PageCursor, total: usize) -> Error {
	Error::PaginationStalled {
		path: path.to_owned(),
		pages: cursor.pages(),
		fetched: cursor.fetched(),
		total,
	}
}
