//! Per-view registry of remote objects.
//!
//! Keys are object identity (the `Arc` allocation), so two equal but distinct
//! objects receive distinct ids. [`ObjectRegistry::register`] is one
//! get-or-insert on the identity map, which keeps it idempotent when several
//! calls hit the same view at once.

use std::sync::Arc;

use dashmap::DashMap;
use tbrpc_protocol::RemoteObject;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Thread-safe registry of remote objects by opaque id.
pub struct ObjectRegistry {
	objects: DashMap<Arc<str>, Arc<dyn RemoteObject>>,
	ids: DashMap<usize, Arc<str>>,
}

impl Default for ObjectRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl ObjectRegistry {
	pub fn new() -> Self {
		Self {
			objects: DashMap::new(),
			ids: DashMap::new(),
		}
	}

	/// Returns the id of `object`, minting one on first sight.
	pub fn register(&self, object: &Arc<dyn RemoteObject>) -> Arc<str> {
		let key = identity(object);
		self.ids
			.entry(key)
			.or_insert_with(|| {
				let id: Arc<str> = Arc::from(Uuid::new_v4().to_string());
				self.objects.insert(id.clone(), object.clone());
				debug!(%id, "registered remote object");
				id
			})
			.clone()
	}

	pub fn lookup(&self, id: &str) -> Result<Arc<dyn RemoteObject>> {
		self.objects
			.get(id)
			.map(|entry| entry.value().clone())
			.ok_or_else(|| Error::NoSuchObject(id.to_string()))
	}

	/// Id of an already registered object.
	pub fn id_of(&self, object: &Arc<dyn RemoteObject>) -> Option<Arc<str>> {
		self.ids.get(&identity(object)).map(|entry| entry.value().clone())
	}

	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}
}

// The registry holds a strong reference, so an address cannot be reused
// while its id is live.
fn identity(object: &Arc<dyn RemoteObject>) -> usize {
	Arc::as_ptr(object) as *const () as usize
}

#[cfg(test)]
mod tests {
	use std::thread;

	use super::*;

	struct Named(#[allow(dead_code)] &'static str);
	impl RemoteObject for Named {}

	fn object(name: &'static str) -> Arc<dyn RemoteObject> {
		Arc::new(Named(name))
	}

	#[test]
	fn test_register_is_idempotent() {
		let registry = ObjectRegistry::new();
		let o = object("a");
		assert_eq!(registry.register(&o), registry.register(&o));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn test_lookup_returns_same_object() {
		let registry = ObjectRegistry::new();
		let o = object("a");
		let id = registry.register(&o);
		let found = registry.lookup(&id).unwrap();
		assert!(Arc::ptr_eq(&found, &o));
	}

	#[test]
	fn test_equal_objects_get_distinct_ids() {
		let registry = ObjectRegistry::new();
		let a = object("same");
		let b = object("same");
		assert_ne!(registry.register(&a), registry.register(&b));
	}

	#[test]
	fn test_unknown_id_fails() {
		let registry = ObjectRegistry::new();
		let err = registry.lookup("nope").err().unwrap();
		assert_eq!(err.to_string(), "No remote object with id nope");
	}

	#[test]
	fn test_concurrent_registration_mints_one_id() {
		let registry = ObjectRegistry::new();
		let o = object("shared");

		let ids: Vec<Arc<str>> = thread::scope(|scope| {
			let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| registry.register(&o))).collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});

		assert!(ids.windows(2).all(|w| w[0] == w[1]));
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.id_of(&o), Some(ids[0].clone()));
	}
}
