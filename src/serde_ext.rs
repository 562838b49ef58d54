//! Lenient numeric decoding for fields the remote API sends as either numbers or strings.

// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::_prelude::*;

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientInt {
	Int(i64),
	Float(f64),
	Text(String),
	Null(()),
}

/// Accepts `123`, `123.0`, `"123"`, or `null` (read as zero).
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	match LenientInt::deserialize(deserializer)? {
		LenientInt::Int(value) => Ok(value),
		LenientInt::Float(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 =>
			Ok(value as i64),
		LenientInt::Float(value) => Err(D::Error::custom(format!("{value} is not an integer"))),
		LenientInt::Text(text) => text
			.trim()
			.parse()
			.map_err(|_| D::Error::custom(format!("`{text}` is not an integer"))),
		LenientInt::Null(()) => Ok(0),
	}
}
