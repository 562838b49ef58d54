//! Range-fetch inputs and pagination bookkeeping.

// self
use crate::{_prelude::*, error::ConfigError};

/// Largest page the remote API serves.
pub const MAX_PAGE_SIZE: usize = 500;

/// Parameters for [`ApiClient::fetch_range`](crate::client::ApiClient::fetch_range).
#[derive(Clone, Debug, PartialEq)]
pub struct RangeQuery {
	/// Window start as a unix timestamp.
	pub start_time: i64,
	/// Window end as a unix timestamp.
	pub end_time: i64,
	/// Endpoint-specific filters merged into every page request.
	pub base_body: Map<String, Value>,
	/// Records per page, `1..=500`.
	pub page_size: usize,
}
impl RangeQuery {
	/// Creates a query over `[start_time, end_time]` with the largest page size.
	pub fn new(start_time: i64, end_time: i64) -> Self {
		Self { start_time, end_time, base_body: Map::new(), page_size: MAX_PAGE_SIZE }
	}

	/// Replaces the endpoint-specific filters.
	pub fn base_body(mut self, base_body: Map<String, Value>) -> Self {
		self.base_body = base_body;

		self
	}

	/// Overrides the page size.
	pub fn page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size;

		self
	}

	/// Builds the first page request: `offset` and `length` first, then the filters, then the
	/// window bounds (later keys win).
	pub fn first_page_body(&self) -> Map<String, Value> {
		let mut body = Map::new();

		body.insert("offset".into(), Value::from(0));
		body.insert("length".into(), Value::from(self.page_size));

		for (key, value) in &self.base_body {
			body.insert(key.clone(), value.clone());
		}

		body.insert("start_time".into(), Value::from(self.start_time));
		body.insert("end_time".into(), Value::from(self.end_time));

		body
	}
}

/// Position within a paginated fetch.
///
/// `total` is unknown until the first page arrives; later pages never revise it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageCursor {
	page_size: usize,
	total: Option<usize>,
	fetched: usize,
	pages: usize,
}
impl PageCursor {
	/// Starts a cursor, rejecting page sizes outside `1..=500`.
	pub fn new(page_size: usize) -> Result<Self, ConfigError> {
		if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
			return Err(ConfigError::PageSizeOutOfRange { page_size });
		}

		Ok(Self { page_size, total: None, fetched: 0, pages: 0 })
	}

	/// Records per page.
	pub fn page_size(&self) -> usize {
		self.page_size
	}

	/// Total reported by the first page, once known.
	pub fn total(&self) -> Option<usize> {
		self.total
	}

	/// Records accumulated so far.
	pub fn fetched(&self) -> usize {
		self.fetched
	}

	/// Pages received so far.
	pub fn pages(&self) -> usize {
		self.pages
	}

	/// Offset for the next request; `0` before the first page, then the accumulated count.
	pub fn offset(&self) -> usize {
		self.fetched
	}

	/// Records a received page; only the first page's `total` is kept.
	pub fn advance(&mut self, reported_total: usize, received: usize) {
		if self.total.is_none() {
			self.total = Some(reported_total);
		}

		self.fetched += received;
		self.pages += 1;
	}

	/// Returns `true` when another page is needed.
	pub fn has_more(&self) -> bool {
		match self.total {
			None => true,
			Some(total) => self.fetched < total,
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn page_size_bounds_are_enforced() {
		assert!(matches!(PageCursor::new(0), Err(ConfigError::PageSizeOutOfRange { page_size: 0 })));
		assert!(matches!(
			PageCursor::new(501),
			Err(ConfigError::PageSizeOutOfRange { page_size: 501 })
		));
		assert!(PageCursor::new(1).is_ok());
		assert!(PageCursor::new(500).is_ok());
	}

	#[test]
	fn cursor_tracks_offsets_until_total() {
		let mut cursor = PageCursor::new(500).expect("Page size 500 should be accepted.");
		let mut offsets = Vec::new();

		while cursor.has_more() {
			offsets.push(cursor.offset());

			let received = (1234 - cursor.fetched()).min(cursor.page_size());

			cursor.advance(1234, received);
		}

		assert_eq!(offsets, vec![0, 500, 1000]);
		assert_eq!(cursor.fetched(), 1234);
		assert_eq!(cursor.pages(), 3);
	}

	#[test]
	fn later_totals_are_ignored() {
		let mut cursor = PageCursor::new(10).expect("Page size 10 should be accepted.");

		cursor.advance(15, 10);
		cursor.advance(100, 5);

		assert_eq!(cursor.total(), Some(15));
		assert!(!cursor.has_more());
	}

	#[test]
	fn first_page_body_lets_window_bounds_win() {
		let mut filters = Map::new();

		filters.insert("date_type".into(), json!("update_time"));
		filters.insert("start_time".into(), json!(1));
		filters.insert("offset".into(), json!(0));

		let body = RangeQuery::new(1_700_000_000, 1_700_086_400)
			.base_body(filters)
			.page_size(200)
			.first_page_body();

		assert_eq!(
			Value::Object(body),
			json!({
				"offset": 0,
				"length": 200,
				"date_type": "update_time",
				"start_time": 1_700_000_000,
				"end_time": 1_700_086_400
			})
		);
	}
}
