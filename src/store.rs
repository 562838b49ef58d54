//! Credential persistence contract and built-in store implementations.
//!
//! The lifecycle manager only talks to [`CredentialStore`], so alternate backends (an encrypted
//! file, a shared cache, a store guarded by a distributed lock) can be swapped in without
//! touching refresh or reissue logic.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract holding the single current credential.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Loads the persisted credential, if any.
	fn load(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Replaces the persisted credential wholesale.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Stored bytes could not be (de)serialized.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
