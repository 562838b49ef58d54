// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicUsize, Ordering},
};
// crates.io
use serde_json::json;
// self
use lingxing_openapi::{
	_preludet::*,
	auth::Credential,
	config::{AUTH_PATH, REFRESH_PATH},
	error::TransportError,
	flows::{RefreshOutcome, TokenManager},
	http::{HttpRequest, HttpResponse, HttpTransport, TransportErrorMapper, TransportFuture},
	obs::FlowKind,
	store::{CredentialStore, MemoryStore, StoreFuture},
};

const BASE_URL: &str = "https://openapi.test";

#[derive(Debug, ThisError)]
enum ScriptError {
	#[error("No scripted response left for {0}.")]
	Exhausted(String),
	#[error("Scripted connection reset.")]
	Reset,
}

enum Scripted {
	Reply(HttpResponse),
	Reset,
}

#[derive(Clone, Default)]
struct ScriptedTransport {
	replies: Arc<Mutex<VecDeque<Scripted>>>,
	requests: Arc<Mutex<Vec<HttpRequest>>>,
}
impl ScriptedTransport {
	fn reply(&self, status: u16, body: Value) {
		self.replies.lock().push_back(Scripted::Reply(HttpResponse::new(status, body.to_string())));
	}

	fn reset(&self) {
		self.replies.lock().push_back(Scripted::Reset);
	}

	fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	fn paths(&self) -> Vec<String> {
		self.requests.lock().iter().map(|request| request.url.path().to_owned()).collect()
	}
}
impl HttpTransport for ScriptedTransport {
	type TransportError = ScriptError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let path = request.url.path().to_owned();

		self.requests.lock().push(request);

		let next = self.replies.lock().pop_front();

		Box::pin(async move {
			match next {
				Some(Scripted::Reply(response)) => Ok(response),
				Some(Scripted::Reset) => Err(ScriptError::Reset),
				None => Err(ScriptError::Exhausted(path)),
			}
		})
	}
}

#[derive(Clone, Copy, Default)]
struct ScriptedMapper;
impl TransportErrorMapper<ScriptError> for ScriptedMapper {
	fn map_transport_error(&self, flow: FlowKind, error: ScriptError) -> Error {
		TransportError::network(flow, error).into()
	}
}

#[derive(Default)]
struct CountingStore {
	inner: MemoryStore,
	loads: AtomicUsize,
	saves: AtomicUsize,
}
impl CredentialStore for CountingStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		self.loads.fetch_add(1, Ordering::SeqCst);

		self.inner.load()
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		self.saves.fetch_add(1, Ordering::SeqCst);

		self.inner.save(credential)
	}
}

fn auth_ok(access: &str, refresh: &str, expires_in: i64) -> Value {
	json!({
		"code": "200",
		"msg": "OK",
		"data": { "access_token": access, "refresh_token": refresh, "expires_in": expires_in }
	})
}

/// Credential obtained two hours ago that expires `remaining_secs` from now.
fn cached(access: &str, refresh: &str, remaining_secs: i64) -> Credential {
	Credential::builder()
		.access_token(access)
		.refresh_token(refresh)
		.obtained_at(OffsetDateTime::now_utc() - Duration::hours(2))
		.expires_in_secs(7200 + remaining_secs)
		.build()
		.expect("Cached credential fixture should build.")
}

fn manager(
	transport: &ScriptedTransport,
	store: Arc<dyn CredentialStore>,
) -> TokenManager<ScriptedTransport, ScriptedMapper> {
	TokenManager::with_http_client(test_config(BASE_URL), store, transport.clone(), ScriptedMapper)
}

fn token_of(store: &MemoryStore) -> Option<String> {
	store.current().and_then(|credential| credential.access_token().map(|t| t.expose().to_owned()))
}

#[tokio::test]
async fn valid_cache_is_reused_without_network() {
	let transport = ScriptedTransport::default();
	let store = Arc::new(MemoryStore::with_credential(cached("at-cached", "rt-cached", 3600)));
	let tokens = manager(&transport, store);
	let token = tokens.access_token(false).await.expect("Valid cache should be reused.");

	assert_eq!(token.expose(), "at-cached");
	assert!(transport.requests().is_empty());
	assert_eq!(tokens.metrics.cache_hits(), 1);
}

#[tokio::test]
async fn expired_cache_is_refreshed_and_persisted() {
	let transport = ScriptedTransport::default();
	let store = Arc::new(MemoryStore::with_credential(cached("at-old", "rt-old", -10)));
	let tokens = manager(&transport, store.clone());

	transport.reply(200, auth_ok("at-new", "rt-new", 7200));

	let token = tokens.access_token(false).await.expect("Refresh should succeed.");
	let requests = transport.requests();

	assert_eq!(token.expose(), "at-new");
	assert_eq!(transport.paths(), vec![REFRESH_PATH.to_owned()]);
	assert_eq!(requests[0].body.field("appId"), Some(TEST_APP_ID));
	assert_eq!(requests[0].body.field("refreshToken"), Some("rt-old"));
	assert_eq!(requests[0].timeout, Duration::seconds(15));
	assert_eq!(token_of(&store).as_deref(), Some("at-new"));
	assert_eq!(tokens.metrics.refresh_attempts(), 1);
	assert_eq!(tokens.metrics.reissues(), 0);
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_exactly_one_reissue() {
	let transport = ScriptedTransport::default();
	let store = Arc::new(MemoryStore::with_credential(cached("at-old", "rt-revoked", -60)));
	let tokens = manager(&transport, store.clone());

	transport.reply(200, json!({ "code": "401", "msg": "refresh token expired", "data": null }));
	transport.reply(200, auth_ok("at-reissued", "rt-reissued", 7200));

	let token = tokens.access_token(false).await.expect("Reissue fallback should succeed.");

	assert_eq!(token.expose(), "at-reissued");
	assert_eq!(transport.paths(), vec![REFRESH_PATH.to_owned(), AUTH_PATH.to_owned()]);
	assert_eq!(tokens.metrics.refresh_rejections(), 1);
	assert_eq!(tokens.metrics.reissues(), 1);
	assert_eq!(token_of(&store).as_deref(), Some("at-reissued"));
}

#[tokio::test]
async fn expired_cache_without_refresh_token_reissues_directly() {
	let transport = ScriptedTransport::default();
	let expired = Credential::builder()
		.access_token("at-old")
		.obtained_at(OffsetDateTime::now_utc() - Duration::hours(3))
		.expires_in_secs(7200)
		.build()
		.expect("Expired credential fixture should build.");
	let store = Arc::new(MemoryStore::with_credential(expired));
	let tokens = manager(&transport, store.clone());

	transport.reply(200, auth_ok("at-new", "rt-new", 7200));

	let token = tokens.access_token(false).await.expect("Reissue should succeed.");

	assert_eq!(token.expose(), "at-new");
	assert_eq!(transport.paths(), vec![AUTH_PATH.to_owned()]);
	assert_eq!(tokens.metrics.refresh_attempts(), 0);
	assert_eq!(tokens.metrics.reissues(), 1);
	assert_eq!(token_of(&store).as_deref(), Some("at-new"));
}

#[tokio::test]
async fn refreshed_credential_inside_buffer_triggers_reissue() {
	let transport = ScriptedTransport::default();
	let store = Arc::new(MemoryStore::with_credential(cached("at-old", "rt-old", 30)));
	let tokens = manager(&transport, store.clone());

	transport.reply(200, auth_ok("at-short", "rt-short", 60));
	transport.reply(200, auth_ok("at-long", "rt-long", 7200));

	let token = tokens.access_token(false).await.expect("Reissue after short refresh should work.");

	assert_eq!(token.expose(), "at-long");
	assert_eq!(transport.paths(), vec![REFRESH_PATH.to_owned(), AUTH_PATH.to_owned()]);
	assert_eq!(token_of(&store).as_deref(), Some("at-long"));
}

#[tokio::test]
async fn force_renew_never_reads_the_store() {
	let transport = ScriptedTransport::default();
	let store = Arc::new(CountingStore::default());

	store
		.save(cached("at-valid", "rt-valid", 3600))
		.await
		.expect("Seeding the counting store should succeed.");
	store.saves.store(0, Ordering::SeqCst);
	transport.reply(200, auth_ok("at-forced", "rt-forced", 7200));

	let tokens = manager(&transport, store.clone());
	let token = tokens.access_token(true).await.expect("Forced renewal should succeed.");

	assert_eq!(token.expose(), "at-forced");
	assert_eq!(store.loads.load(Ordering::SeqCst), 0);
	assert_eq!(store.saves.load(Ordering::SeqCst), 1);
	assert_eq!(transport.paths(), vec![AUTH_PATH.to_owned()]);
}

#[tokio::test]
async fn empty_store_reissues_with_application_secret() {
	let transport = ScriptedTransport::default();
	let store = Arc::new(MemoryStore::default());
	let tokens = manager(&transport, store.clone());

	transport.reply(200, auth_ok("at-first", "rt-first", 7200));

	let credential = tokens.credential(false).await.expect("Initial reissue should succeed.");
	let requests = transport.requests();

	assert_eq!(credential.access_token().map(|t| t.expose()), Some("at-first"));
	assert_eq!(credential.expires_at() - credential.obtained_at(), Duration::seconds(7200));
	assert_eq!(requests[0].body.field("appId"), Some(TEST_APP_ID));
	assert_eq!(requests[0].body.field("appSecret"), Some(TEST_APP_SECRET));
	assert_eq!(token_of(&store).as_deref(), Some("at-first"));
}

#[tokio::test]
async fn auth_rejection_carries_the_raw_response() {
	let transport = ScriptedTransport::default();
	let tokens = manager(&transport, Arc::new(MemoryStore::default()));

	transport.reply(200, json!({ "code": "400", "msg": "appSecret invalid" }));

	let err = tokens.access_token(false).await.expect_err("Rejected auth should fail.");

	match err {
		Error::Auth { flow, response } => {
			assert_eq!(flow, FlowKind::Reissue);
			assert_eq!(response["msg"], "appSecret invalid");
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn auth_http_failure_is_a_transport_status_error() {
	let transport = ScriptedTransport::default();
	let tokens = manager(&transport, Arc::new(MemoryStore::default()));

	transport.reply(503, json!({ "code": "200", "data": {} }));

	let err = tokens.access_token(false).await.expect_err("Non-2xx auth responses should fail.");

	assert!(matches!(
		err,
		Error::Transport(TransportError::Status { flow: FlowKind::Reissue, status: 503 })
	));
}

#[tokio::test]
async fn refresh_transport_failure_propagates_without_reissue() {
	let transport = ScriptedTransport::default();
	let store = Arc::new(MemoryStore::with_credential(cached("at-old", "rt-old", -10)));
	let tokens = manager(&transport, store);

	transport.reset();

	let err = tokens.access_token(false).await.expect_err("Transport failures should propagate.");

	assert!(matches!(
		err,
		Error::Transport(TransportError::Network { flow: FlowKind::Refresh, .. })
	));
	assert_eq!(transport.paths(), vec![REFRESH_PATH.to_owned()]);
	assert_eq!(tokens.metrics.reissues(), 0);
}

#[tokio::test]
async fn explicit_refresh_reports_rejection_without_touching_the_store() {
	let transport = ScriptedTransport::default();
	let seeded = cached("at-old", "rt-old", -10);
	let store = Arc::new(MemoryStore::with_credential(seeded));
	let tokens = manager(&transport, store.clone());

	transport.reply(200, json!({ "code": "500", "msg": "busy" }));

	let refresh_token = store
		.current()
		.and_then(|credential| credential.refresh_token().cloned())
		.expect("Seeded credential should carry a refresh token.");
	let outcome = tokens.refresh(&refresh_token).await.expect("Rejections are not errors.");

	assert!(matches!(outcome, RefreshOutcome::Rejected(ref response) if response["msg"] == "busy"));
	assert!(outcome.credential().is_none());
	assert_eq!(token_of(&store).as_deref(), Some("at-old"));
}
