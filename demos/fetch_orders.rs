//! Demonstrates the full order pipeline against a local mock of the LingXing API: the first
//! call authenticates, the order list is fetched page by page, and the cached token is reused
//! for the second run.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use lingxing_openapi::{
	auth::{AppId, TokenSecret},
	client::{ApiClient, DateType, ORDER_LIST_PATH, OrderListQuery},
	config::{AUTH_PATH, ClientConfig},
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let auth_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTH_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"code\":\"200\",\"msg\":\"OK\",\"data\":{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"expires_in\":7199}}",
			);
		})
		.await;
	let orders_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(ORDER_LIST_PATH).query_param_exists("sign");
			then.status(200).header("content-type", "application/json").body(
				"{\"code\":0,\"msg\":\"success\",\"data\":{\"total\":2,\"list\":[{\"global_order_no\":\"A-1\"},{\"global_order_no\":\"A-2\"}]}}",
			);
		})
		.await;
	let config = ClientConfig::builder(AppId::new("ak_demo_app_0001")?, TokenSecret::new("demo-secret"))
		.base_url(Url::parse(&server.base_url())?)
		.page_delay(Duration::ZERO)
		.build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let client = ApiClient::new(config, store);
	let query = OrderListQuery::last_days(7)
		.date_type(DateType::GlobalPurchaseTime)
		.platform_codes([10008])
		.page_size(100);

	for run in 1..=2 {
		let orders = client.fetch_orders(&query).await?;

		println!("Run {run}: fetched {} orders.", orders.len());

		for order in &orders {
			println!("  {}", order["global_order_no"]);
		}
	}

	auth_mock.assert_calls_async(1).await;
	orders_mock.assert_calls_async(2).await;

	println!("Cache hits: {}.", client.tokens().metrics.cache_hits());

	Ok(())
}
