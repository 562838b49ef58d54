//! Thread-safe in-memory [`CredentialStore`] for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<Credential>>>;

/// Storage backend that keeps the credential in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store pre-seeded with `credential`.
	pub fn with_credential(credential: Credential) -> Self {
		Self(Arc::new(RwLock::new(Some(credential))))
	}

	/// Returns a copy of the stored credential without going through the async contract.
	pub fn current(&self) -> Option<Credential> {
		self.0.read().clone()
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(credential);

			Ok(())
		})
	}
}
