//! File-backed [`CredentialStore`] holding one JSON credential record.
//!
//! The file is re-read on every load so separate processes sharing it observe each other's
//! writes. Writes go through a temporary sibling file and a rename; there is no cross-process
//! locking, so concurrent writers race and the last one wins.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError, StoreFuture},
};

/// Persists the current credential to a JSON file after each save.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
}
impl FileStore {
	/// Default location, relative to the working directory.
	pub const DEFAULT_PATH: &'static str = "token.json";

	/// Opens a store at the provided path, creating parent directories when needed.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path })
	}

	/// Path of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_snapshot(path: &Path) -> Result<Option<Credential>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn write_snapshot(&self, credential: &Credential) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(credential).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize credential: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl Default for FileStore {
	fn default() -> Self {
		Self { path: PathBuf::from(Self::DEFAULT_PATH) }
	}
}
impl CredentialStore for FileStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		Box::pin(async move { Self::read_snapshot(&self.path) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.write_snapshot(&credential) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"lingxing_openapi_file_store_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_credential(access: &str) -> Credential {
		Credential::builder()
			.access_token(access)
			.refresh_token("refresh-token")
			.expires_in_secs(7200)
			.raw_response(serde_json::json!({ "code": "200", "msg": "成功" }))
			.build()
			.expect("Failed to build file-store test credential.")
	}

	#[tokio::test]
	async fn save_and_reload_round_trip() {
		let path = temp_path("round_trip");
		let store = FileStore::open(&path).expect("Failed to open file store.");
		let credential = build_credential("access-token");

		store.save(credential.clone()).await.expect("Failed to save credential.");

		let reopened = FileStore::open(&path).expect("Failed to reopen file store.");
		let fetched = reopened
			.load()
			.await
			.expect("Failed to load credential.")
			.expect("File store lost the credential after reopen.");

		assert_eq!(
			fetched.access_token().map(|secret| secret.expose()),
			credential.access_token().map(|secret| secret.expose())
		);
		assert_eq!(fetched.expires_at(), credential.expires_at());
		assert_eq!(fetched.raw_response()["msg"], "成功");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary credential file {}: {e}", path.display())
		});
	}

	#[tokio::test]
	async fn save_overwrites_previous_record() {
		let path = temp_path("overwrite");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		store.save(build_credential("first")).await.expect("Failed to save first credential.");
		store.save(build_credential("second")).await.expect("Failed to save second credential.");

		let fetched = store
			.load()
			.await
			.expect("Failed to load credential.")
			.expect("Credential should be present.");

		assert_eq!(fetched.access_token().map(|secret| secret.expose()), Some("second"));

		let _ = fs::remove_file(&path);
	}

	#[tokio::test]
	async fn missing_and_empty_files_load_as_none() {
		let path = temp_path("missing");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		assert!(store.load().await.expect("Missing file should not error.").is_none());

		fs::write(&path, b"").expect("Failed to create empty credential file.");

		assert!(store.load().await.expect("Empty file should not error.").is_none());

		let _ = fs::remove_file(&path);
	}

	#[tokio::test]
	async fn corrupt_file_reports_serialization_error() {
		let path = temp_path("corrupt");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		fs::write(&path, b"{ not json").expect("Failed to write corrupt credential file.");

		let err = store.load().await.expect_err("Corrupt file should surface a store error.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		let _ = fs::remove_file(&path);
	}

	#[tokio::test]
	async fn snapshot_without_obtained_at_reports_serialization_error() {
		let path = temp_path("partial");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		fs::write(&path, br#"{"access_token":"a","refresh_token":"r","expires_in":0}"#)
			.expect("Failed to write partial credential file.");

		let err = store.load().await.expect_err("Partial snapshots should not decode.");

		assert!(matches!(
			err,
			StoreError::Serialization { ref message } if message.contains("obtained_at")
		));

		let _ = fs::remove_file(&path);
	}
}
