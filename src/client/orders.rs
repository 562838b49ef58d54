//! Multi-platform order list (`/pb/mp/order/v2/list`).

// self
use crate::{
	_prelude::*,
	client::{ApiClient, RangeQuery},
	http::{HttpTransport, TransportErrorMapper},
};

/// Order list endpoint path.
pub const ORDER_LIST_PATH: &str = "/pb/mp/order/v2/list";
/// Page size used when none is specified.
pub const DEFAULT_ORDER_PAGE_SIZE: usize = 200;

const SECONDS_PER_DAY: i64 = 86_400;

/// Timestamp the order window is filtered on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
	/// Last update time.
	#[default]
	UpdateTime,
	/// Purchase time on the sales platform.
	GlobalPurchaseTime,
	/// Delivery time on the sales platform.
	GlobalDeliveryTime,
	/// Payment time on the sales platform.
	GlobalPaymentTime,
	/// Warehouse delivery time.
	DeliveryTime,
}
impl DateType {
	/// Every accepted value, in display order.
	pub const ALL: [Self; 5] = [
		Self::UpdateTime,
		Self::GlobalPurchaseTime,
		Self::GlobalDeliveryTime,
		Self::GlobalPaymentTime,
		Self::DeliveryTime,
	];

	/// Wire value sent as `date_type`.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::UpdateTime => "update_time",
			Self::GlobalPurchaseTime => "global_purchase_time",
			Self::GlobalDeliveryTime => "global_delivery_time",
			Self::GlobalPaymentTime => "global_payment_time",
			Self::DeliveryTime => "delivery_time",
		}
	}
}
impl Display for DateType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for DateType {
	type Err = UnknownDateType;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|date_type| date_type.as_str() == s)
			.ok_or_else(|| UnknownDateType { value: s.to_owned() })
	}
}

/// Error returned when parsing an unsupported [`DateType`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown date_type `{value}`.")]
pub struct UnknownDateType {
	/// Rejected input.
	pub value: String,
}

/// Filters for the order list, covering a look-back window ending now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderListQuery {
	days: u32,
	date_type: DateType,
	store_ids: Vec<String>,
	platform_codes: Vec<i64>,
	include_delete: bool,
	order_status: Option<i64>,
	platform_shipping_status: Vec<String>,
	platform_payment_status: Vec<String>,
	page_size: usize,
}
impl OrderListQuery {
	/// Creates a query covering the last `days` days filtered on [`DateType::UpdateTime`].
	pub fn last_days(days: u32) -> Self {
		Self {
			days,
			date_type: DateType::default(),
			store_ids: Vec::new(),
			platform_codes: Vec::new(),
			include_delete: false,
			order_status: None,
			platform_shipping_status: Vec::new(),
			platform_payment_status: Vec::new(),
			page_size: DEFAULT_ORDER_PAGE_SIZE,
		}
	}

	/// Selects the timestamp the window applies to.
	pub fn date_type(mut self, date_type: DateType) -> Self {
		self.date_type = date_type;

		self
	}

	/// Restricts results to the given store ids.
	pub fn store_ids<I, S>(mut self, store_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.store_ids = store_ids.into_iter().map(Into::into).collect();

		self
	}

	/// Restricts results to the given platform codes.
	pub fn platform_codes(mut self, platform_codes: impl IntoIterator<Item = i64>) -> Self {
		self.platform_codes = platform_codes.into_iter().collect();

		self
	}

	/// Includes deleted orders.
	pub fn include_delete(mut self, include_delete: bool) -> Self {
		self.include_delete = include_delete;

		self
	}

	/// Filters on a single order status code.
	pub fn order_status(mut self, order_status: i64) -> Self {
		self.order_status = Some(order_status);

		self
	}

	/// Filters on platform shipping statuses (for example `partial`, `fulfilled`).
	pub fn platform_shipping_status<I, S>(mut self, statuses: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.platform_shipping_status = statuses.into_iter().map(Into::into).collect();

		self
	}

	/// Filters on platform payment statuses (for example `pending`, `paid`).
	pub fn platform_payment_status<I, S>(mut self, statuses: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.platform_payment_status = statuses.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the page size (`1..=500`, defaults to 200).
	pub fn page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size;

		self
	}

	/// Builds the filter body; empty lists and an unset status are omitted.
	pub fn base_body(&self) -> Map<String, Value> {
		let mut body = Map::new();

		body.insert("date_type".into(), Value::from(self.date_type.as_str()));
		body.insert("length".into(), Value::from(self.page_size));
		body.insert("offset".into(), Value::from(0));

		if !self.store_ids.is_empty() {
			body.insert("store_id".into(), Value::from(self.store_ids.clone()));
		}
		if !self.platform_codes.is_empty() {
			body.insert("platform_code".into(), Value::from(self.platform_codes.clone()));
		}

		body.insert("include_delete".into(), Value::from(self.include_delete));

		if let Some(status) = self.order_status {
			body.insert("order_status".into(), Value::from(status));
		}
		if !self.platform_shipping_status.is_empty() {
			body.insert(
				"platform_shipping_status".into(),
				Value::from(self.platform_shipping_status.clone()),
			);
		}
		if !self.platform_payment_status.is_empty() {
			body.insert(
				"platform_payment_status".into(),
				Value::from(self.platform_payment_status.clone()),
			);
		}

		body
	}

	/// Resolves the window against `now` and produces the range query.
	pub fn to_range_query(&self, now: OffsetDateTime) -> RangeQuery {
		let end_time = now.unix_timestamp();
		let start_time = end_time - i64::from(self.days) * SECONDS_PER_DAY;

		RangeQuery::new(start_time, end_time).base_body(self.base_body()).page_size(self.page_size)
	}
}

impl<C, M> ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches every order matching `query` in the window ending now.
	pub async fn fetch_orders(&self, query: &OrderListQuery) -> Result<Vec<Value>> {
		self.fetch_range(ORDER_LIST_PATH, query.to_range_query(OffsetDateTime::now_utc())).await
	}
}
