//! Request signing for LingXing business endpoints.
//!
//! The signature is computed over the merged system and business parameters:
//!
//! 1. Business values override system values on key collision.
//! 2. Each value is rendered as a string (`null`, `true`/`false`, compact sorted JSON for arrays
//!    and objects, the plain text of everything else). Values rendering to `""` are dropped.
//! 3. Pairs are sorted by key and joined as `key=value` with `&` (the canonical string).
//! 4. The canonical string is hashed with MD5 and rendered as 32 uppercase hex characters.
//! 5. The digest is AES-ECB encrypted with PKCS#7 padding, keyed by the raw application id
//!    bytes, and base64 encoded.
//!
//! The output must match the server bit for bit, so none of these steps may be reordered.

// crates.io
use aes::{Aes128, Aes192, Aes256};
use base64::{Engine, engine::general_purpose::STANDARD};
use ecb::cipher::{BlockCipher, BlockEncryptMut, KeyInit, block_padding::Pkcs7};
use md5::{Digest, Md5};
// self
use crate::_prelude::*;

/// Errors raised while signing a request.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SignError {
	/// The signing key is not a valid AES key length.
	#[error("Signing key must be 16, 24, or 32 bytes long, got {len}.")]
	InvalidKeyLength {
		/// Observed byte length.
		len: usize,
	},
}

/// System parameters attached to every signed business call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemParams {
	/// Current access token.
	pub access_token: String,
	/// Application id, sent as `app_key`.
	pub app_key: String,
	/// Unix timestamp in seconds.
	pub timestamp: i64,
}
impl SystemParams {
	/// Renders the parameters as a JSON mapping for signing.
	pub fn to_map(&self) -> Map<String, Value> {
		let mut map = Map::new();

		map.insert("access_token".into(), Value::from(self.access_token.as_str()));
		map.insert("app_key".into(), Value::from(self.app_key.as_str()));
		map.insert("timestamp".into(), Value::from(self.timestamp));

		map
	}

	/// Query-string pairs sent alongside the JSON body.
	pub fn query_pairs(&self, sign: &str) -> Vec<(String, String)> {
		vec![
			("access_token".into(), self.access_token.clone()),
			("app_key".into(), self.app_key.clone()),
			("timestamp".into(), self.timestamp.to_string()),
			("sign".into(), sign.to_owned()),
		]
	}
}

/// Signature plus the intermediate artifacts it was derived from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
	/// Base64 AES ciphertext sent as the `sign` query parameter.
	pub sign: String,
	/// Uppercase hex MD5 of the canonical string.
	pub digest: String,
	/// Sorted `key=value&...` string that was hashed.
	pub canonical: String,
}

/// Signs the merged parameters with `key` (the raw application id bytes).
pub fn sign(
	system: &Map<String, Value>,
	business: &Map<String, Value>,
	key: &[u8],
) -> Result<Signature, SignError> {
	let canonical = canonical_string(system, business);
	let digest = hex::encode_upper(Md5::digest(canonical.as_bytes()));
	let ciphertext = match key.len() {
		16 => encrypt_ecb::<Aes128>(key, digest.as_bytes())?,
		24 => encrypt_ecb::<Aes192>(key, digest.as_bytes())?,
		32 => encrypt_ecb::<Aes256>(key, digest.as_bytes())?,
		len => return Err(SignError::InvalidKeyLength { len }),
	};

	Ok(Signature { sign: STANDARD.encode(ciphertext), digest, canonical })
}

/// Builds the canonical `key=value&...` string for the merged parameters.
pub fn canonical_string(system: &Map<String, Value>, business: &Map<String, Value>) -> String {
	let mut merged = BTreeMap::new();

	for (key, value) in system.iter().chain(business.iter()) {
		merged.insert(key.as_str(), value);
	}

	merged
		.into_iter()
		.filter_map(|(key, value)| canonical_value(value).map(|text| format!("{key}={text}")))
		.collect::<Vec<_>>()
		.join("&")
}

/// Renders a single value for signing; `None` means the key is excluded.
pub fn canonical_value(value: &Value) -> Option<String> {
	let text = match value {
		Value::Null => "null".to_owned(),
		Value::Bool(flag) => flag.to_string(),
		Value::Array(_) | Value::Object(_) => canonical_json(value),
		Value::Number(number) => number.to_string(),
		Value::String(text) => text.clone(),
	};

	if text.is_empty() { None } else { Some(text) }
}

/// Compact JSON with object keys sorted ascending at every depth and non-ASCII kept literal.
pub fn canonical_json(value: &Value) -> String {
	sorted(value).to_string()
}

fn sorted(value: &Value) -> Value {
	match value {
		Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
		Value::Object(entries) => {
			let mut keys = entries.keys().collect::<Vec<_>>();

			keys.sort();

			Value::Object(keys.into_iter().map(|key| (key.clone(), sorted(&entries[key]))).collect())
		},
		other => other.clone(),
	}
}

fn encrypt_ecb<C>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SignError>
where
	C: BlockCipher + BlockEncryptMut + KeyInit,
{
	let encryptor = ecb::Encryptor::<C>::new_from_slice(key)
		.map_err(|_| SignError::InvalidKeyLength { len: key.len() })?;

	Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	const KEY: &str = "ak_0123456789abc";

	fn object(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			other => panic!("Fixture must be a JSON object, got {other}."),
		}
	}

	fn system() -> Map<String, Value> {
		SystemParams {
			access_token: "token-abc".into(),
			app_key: KEY.into(),
			timestamp: 1_700_000_000,
		}
		.to_map()
	}

	#[test]
	fn canonical_string_drops_empty_and_renders_null() {
		let body = object(json!({ "b": 1, "a": "x", "c": null, "d": "" }));
		let signature = sign(&Map::new(), &body, KEY.as_bytes()).expect("Signing should succeed.");

		assert_eq!(signature.canonical, "a=x&b=1&c=null");
		assert_eq!(signature.digest, "94226E1347EE16C5C7E457D22199BD59");
		assert_eq!(signature.sign, "FjtMW1D1tWqDH1oftTKKkG8WdQq4kTUR5j8hRevPVlxIwVhSPzVcd0sPeLkAl3rO");
	}

	#[test]
	fn order_list_body_matches_reference_vector() {
		let body = object(json!({
			"offset": 0,
			"length": 500,
			"start_time": 1_699_000_000,
			"end_time": 1_700_000_000,
			"date_type": "update_time",
			"store_id": ["110", "120"],
			"include_delete": false,
			"note": "訂單",
			"filter": { "z": 1, "a": [1, 2] },
			"empty": "",
			"missing": null,
		}));
		let signature = sign(&system(), &body, KEY.as_bytes()).expect("Signing should succeed.");

		assert_eq!(
			signature.canonical,
			"access_token=token-abc&app_key=ak_0123456789abc&date_type=update_time\
			 &end_time=1700000000&filter={\"a\":[1,2],\"z\":1}&include_delete=false&length=500\
			 &missing=null&note=訂單&offset=0&start_time=1699000000&store_id=[\"110\",\"120\"]\
			 &timestamp=1700000000"
		);
		assert_eq!(signature.digest, "D87B5DD01CD58BD2755B04E5F3E94666");
		assert_eq!(signature.sign, "mBr9DASkZDCTZVPNkMaamxKF/OtB4VcsuGXwZssm7s1IwVhSPzVcd0sPeLkAl3rO");
	}

	#[test]
	fn business_values_override_system_values() {
		let body = object(json!({ "app_key": "override" }));
		let signature = sign(&system(), &body, KEY.as_bytes()).expect("Signing should succeed.");

		assert_eq!(signature.canonical, "access_token=token-abc&app_key=override&timestamp=1700000000");
		assert_eq!(signature.digest, "008B365557702F1B109D1E27D7805608");
	}

	#[test]
	fn canonical_output_is_sorted_regardless_of_source_order() {
		let parse = |text: &str| {
			object(serde_json::from_str(text).expect("Fixture JSON should parse."))
		};
		let descending =
			parse(r#"{"zeta":{"b":2,"a":{"d":4,"c":3}},"mid":[{"y":1,"x":2}],"alpha":"first"}"#);
		let ascending =
			parse(r#"{"alpha":"first","mid":[{"x":2,"y":1}],"zeta":{"a":{"c":3,"d":4},"b":2}}"#);
		let canonical = canonical_string(&Map::new(), &descending);

		assert_eq!(
			canonical,
			r#"alpha=first&mid=[{"x":2,"y":1}]&zeta={"a":{"c":3,"d":4},"b":2}"#
		);
		assert_eq!(canonical, canonical_string(&Map::new(), &ascending));

		let keys = canonical.split('&').map(|pair| pair.split('=').next().unwrap_or_default());

		assert!(keys.clone().zip(keys.skip(1)).all(|(left, right)| left < right));
		assert_eq!(
			sign(&system(), &descending, KEY.as_bytes()).expect("Signing should succeed."),
			sign(&system(), &ascending, KEY.as_bytes()).expect("Signing should succeed.")
		);
	}

	#[test]
	fn digest_is_uppercase_hex() {
		let signature = sign(&system(), &Map::new(), KEY.as_bytes()).expect("Signing should succeed.");

		assert_eq!(signature.digest.len(), 32);
		assert!(signature.digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
	}

	#[test]
	fn canonical_values_cover_every_json_kind() {
		assert_eq!(canonical_value(&json!(null)).as_deref(), Some("null"));
		assert_eq!(canonical_value(&json!(true)).as_deref(), Some("true"));
		assert_eq!(canonical_value(&json!(1.5)).as_deref(), Some("1.5"));
		assert_eq!(canonical_value(&json!([])).as_deref(), Some("[]"));
		assert_eq!(canonical_value(&json!({})).as_deref(), Some("{}"));
		assert_eq!(canonical_value(&json!("")), None);
		assert_eq!(
			canonical_json(&json!({ "b": "é", "a": { "d": 1, "c": null } })),
			r#"{"a":{"c":null,"d":1},"b":"é"}"#
		);
	}

	#[test]
	fn rejects_unsupported_key_lengths() {
		let err = sign(&system(), &Map::new(), b"short").expect_err("Short keys should be rejected.");

		assert_eq!(err, SignError::InvalidKeyLength { len: 5 });
	}
}
