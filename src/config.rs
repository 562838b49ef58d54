//! Client configuration: endpoints, application credentials, timeouts, and pagination limits.
//!
//! [`ClientConfig`] replaces process-wide constants with one explicit value handed to the
//! client constructors, so tests can point the client at a mock server without touching the
//! environment.

// self
use crate::{
	_prelude::*,
	auth::{AppId, TokenSecret},
	error::ConfigError,
};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://openapi.lingxing.com";
/// Full-authentication endpoint path.
pub const AUTH_PATH: &str = "/api/auth-server/oauth/access-token";
/// Refresh-token endpoint path.
pub const REFRESH_PATH: &str = "/api/auth-server/oauth/refresh";
/// Environment variable holding the application id.
pub const APP_ID_ENV: &str = "APP_ID";
/// Environment variable holding the application secret.
pub const APP_SECRET_ENV: &str = "APP_SECRET";

/// Validated client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	base_url: Url,
	app_id: AppId,
	app_secret: TokenSecret,
	expiry_buffer: Duration,
	auth_timeout: Duration,
	data_timeout: Duration,
	page_delay: Duration,
	max_pages: usize,
}
impl ClientConfig {
	/// Tokens expiring within this window are treated as already expired.
	pub const DEFAULT_EXPIRY_BUFFER: Duration = Duration::seconds(120);
	/// Timeout applied to auth and refresh calls.
	pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::seconds(15);
	/// Timeout applied to signed business calls.
	pub const DEFAULT_DATA_TIMEOUT: Duration = Duration::seconds(30);
	/// Pause between consecutive page requests.
	pub const DEFAULT_PAGE_DELAY: Duration = Duration::milliseconds(150);
	/// Upper bound on pages fetched by a single range query.
	pub const DEFAULT_MAX_PAGES: usize = 10_000;

	/// Starts a builder for the provided application credentials.
	pub fn builder(app_id: AppId, app_secret: TokenSecret) -> ClientConfigBuilder {
		ClientConfigBuilder::new(app_id, app_secret)
	}

	/// Loads `.env` (when present) and reads `APP_ID` / `APP_SECRET` from the environment.
	///
	/// Both variables are required; there are no placeholder fallbacks.
	pub fn from_env() -> Result<Self, ConfigError> {
		// A missing .env file is normal outside development.
		let _ = dotenvy::dotenv();
		let app_id = AppId::new(required_env(APP_ID_ENV)?)?;
		let app_secret = TokenSecret::new(required_env(APP_SECRET_ENV)?);

		Self::builder(app_id, app_secret).build()
	}

	/// API host every path is joined onto.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Application id; also the AES signing key.
	pub fn app_id(&self) -> &AppId {
		&self.app_id
	}

	/// Application secret used for full authentication.
	pub fn app_secret(&self) -> &TokenSecret {
		&self.app_secret
	}

	/// Safety window subtracted from `expires_at` when judging validity.
	pub fn expiry_buffer(&self) -> Duration {
		self.expiry_buffer
	}

	/// Timeout for auth and refresh calls.
	pub fn auth_timeout(&self) -> Duration {
		self.auth_timeout
	}

	/// Timeout for signed business calls.
	pub fn data_timeout(&self) -> Duration {
		self.data_timeout
	}

	/// Delay inserted before every page after the first.
	pub fn page_delay(&self) -> Duration {
		self.page_delay
	}

	/// Maximum pages a range fetch may request before it reports a stall.
	pub fn max_pages(&self) -> usize {
		self.max_pages
	}

	/// Resolves `path` against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path)
			.map_err(|source| ConfigError::InvalidUrl { path: path.to_owned(), source })
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	base_url: Option<Url>,
	app_id: AppId,
	app_secret: TokenSecret,
	expiry_buffer: Duration,
	auth_timeout: Duration,
	data_timeout: Duration,
	page_delay: Duration,
	max_pages: usize,
}
impl ClientConfigBuilder {
	fn new(app_id: AppId, app_secret: TokenSecret) -> Self {
		Self {
			base_url: None,
			app_id,
			app_secret,
			expiry_buffer: ClientConfig::DEFAULT_EXPIRY_BUFFER,
			auth_timeout: ClientConfig::DEFAULT_AUTH_TIMEOUT,
			data_timeout: ClientConfig::DEFAULT_DATA_TIMEOUT,
			page_delay: ClientConfig::DEFAULT_PAGE_DELAY,
			max_pages: ClientConfig::DEFAULT_MAX_PAGES,
		}
	}

	/// Overrides the API host (defaults to [`DEFAULT_BASE_URL`]).
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the expiry safety buffer (defaults to 120 seconds).
	pub fn expiry_buffer(mut self, buffer: Duration) -> Self {
		self.expiry_buffer = buffer;

		self
	}

	/// Overrides the auth/refresh timeout (defaults to 15 seconds).
	pub fn auth_timeout(mut self, timeout: Duration) -> Self {
		self.auth_timeout = timeout;

		self
	}

	/// Overrides the business-call timeout (defaults to 30 seconds).
	pub fn data_timeout(mut self, timeout: Duration) -> Self {
		self.data_timeout = timeout;

		self
	}

	/// Overrides the inter-page delay (defaults to 150 milliseconds).
	pub fn page_delay(mut self, delay: Duration) -> Self {
		self.page_delay = delay;

		self
	}

	/// Overrides the pagination cap (defaults to 10 000 pages).
	pub fn max_pages(mut self, max_pages: usize) -> Self {
		self.max_pages = max_pages;

		self
	}

	/// Validates the settings and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BASE_URL).map_err(|source| ConfigError::InvalidUrl {
				path: DEFAULT_BASE_URL.to_owned(),
				source,
			})?,
		};

		if self.expiry_buffer.is_negative() {
			return Err(ConfigError::InvalidDuration {
				setting: "expiry_buffer",
				requirement: "zero or positive",
			});
		}
		if !self.auth_timeout.is_positive() {
			return Err(ConfigError::InvalidDuration {
				setting: "auth_timeout",
				requirement: "positive",
			});
		}
		if !self.data_timeout.is_positive() {
			return Err(ConfigError::InvalidDuration {
				setting: "data_timeout",
				requirement: "positive",
			});
		}
		if self.page_delay.is_negative() {
			return Err(ConfigError::InvalidDuration {
				setting: "page_delay",
				requirement: "zero or positive",
			});
		}
		if self.max_pages == 0 {
			return Err(ConfigError::ZeroMaxPages);
		}

		Ok(ClientConfig {
			base_url,
			app_id: self.app_id,
			app_secret: self.app_secret,
			expiry_buffer: self.expiry_buffer,
			auth_timeout: self.auth_timeout,
			data_timeout: self.data_timeout,
			page_delay: self.page_delay,
			max_pages: self.max_pages,
		})
	}
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
	std::env::var(name)
		.ok()
		.filter(|value| !value.trim().is_empty())
		.ok_or(ConfigError::MissingEnv { name })
}
