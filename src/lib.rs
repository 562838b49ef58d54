//! LingXing OpenAPI client: deterministic request signing, a self-healing access-token
//! lifecycle backed by pluggable credential stores, and paginated range fetches with
//! transport-aware observability.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod sign;
pub mod store;

mod serde_ext;

#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AppId, TokenSecret},
		config::ClientConfig,
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		client::ApiClient,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		store::{CredentialStore, MemoryStore},
	};

	/// Application id used by test fixtures; 16 bytes so it doubles as an AES-128 key.
	pub const TEST_APP_ID: &str = "ak_0123456789abc";
	/// Application secret used by test fixtures.
	pub const TEST_APP_SECRET: &str = "secret-fixture";

	/// API client type alias used by reqwest-backed integration tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestClient = ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a configuration that targets `base_url` with no inter-page delay.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder(
			AppId::new(TEST_APP_ID).expect("Test application id should be valid."),
			TokenSecret::new(TEST_APP_SECRET),
		)
		.base_url(Url::parse(base_url).expect("Test base URL should parse."))
		.page_delay(Duration::ZERO)
		.build()
		.expect("Test configuration should validate.")
	}

	/// Constructs an [`ApiClient`] backed by an in-memory store and the reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client(base_url: &str) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let client = ApiClient::with_http_client(
			test_config(base_url),
			store,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		);

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
