//! Binding registration with duplicate protection
//!
//! The registry keeps bidirectional mappings between binding ids and the
//! identity of the object each binding observes, so one object never has two
//! bindings and a closed binding can find and remove its own entry.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::binding::{Binding, BindingId, BindingKind};
use crate::error::{Result, TelemetryError};
use crate::native::ObjectKey;

/// Outcome of a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new binding was created and bound
    Created(BindingId),
    /// The object already had a binding; nothing changed
    Existing(BindingId),
}

impl Registration {
    pub fn id(&self) -> &BindingId {
        match self {
            Registration::Created(id) | Registration::Existing(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Registration::Created(_))
    }
}

/// Outcome of a removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The binding was found and unbound
    Unbound(BindingId),
    /// The object had no binding; nothing changed
    NotFound,
}

#[derive(Default)]
struct RegistryMaps {
    /// Mapping from binding id to binding
    bindings: HashMap<BindingId, Arc<dyn Binding>>,

    /// Reverse mapping from object identity to binding id for duplicate detection
    object_to_binding: HashMap<ObjectKey, BindingId>,
}

impl RegistryMaps {
    fn remove(&mut self, id: &BindingId) -> Option<Arc<dyn Binding>> {
        let binding = self.bindings.remove(id)?;
        self.object_to_binding.remove(&binding.object_key());
        Some(binding)
    }
}

/// Thread-safe registry of active bindings
#[derive(Clone, Default)]
pub(crate) struct BindingRegistry {
    maps: Arc<Mutex<RegistryMaps>>,
}

impl BindingRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register the object identified by `key` under `id`
    ///
    /// `construct` builds the binding; it runs without the registry lock held
    /// and is skipped entirely when the object is already registered. The new
    /// binding is bound after it has been stored, so a binding that closes
    /// during `bind` is already gone from the registry when this returns.
    pub(crate) fn add<F>(&self, key: ObjectKey, id: BindingId, construct: F) -> Result<Registration>
    where
        F: FnOnce(BindingId) -> Arc<dyn Binding>,
    {
        if let Some(existing) = self.check(key, &id)? {
            return Ok(existing);
        }

        let binding = construct(id.clone());

        {
            let mut maps = self.maps.lock();
            // Double-check in case the object was registered while constructing
            if let Some(existing) = maps.object_to_binding.get(&key).cloned() {
                drop(maps);
                binding.unbind();
                tracing::warn!(id = %existing, "Object registered concurrently; discarding duplicate binding");
                return Ok(Registration::Existing(existing));
            }
            if maps.bindings.contains_key(&id) {
                drop(maps);
                binding.unbind();
                return Err(TelemetryError::IdConflict { id });
            }
            maps.bindings.insert(id.clone(), Arc::clone(&binding));
            maps.object_to_binding.insert(key, id.clone());
        }

        let maps: Weak<Mutex<RegistryMaps>> = Arc::downgrade(&self.maps);
        let this = Arc::as_ptr(&binding) as *const () as usize;
        binding.on_close(Box::new(move |id: &BindingId| {
            if let Some(maps) = maps.upgrade() {
                let mut maps = maps.lock();
                // The id may already belong to a newer binding
                let current = maps
                    .bindings
                    .get(id)
                    .map(|b| Arc::as_ptr(b) as *const () as usize);
                if current != Some(this) {
                    return;
                }
                if maps.remove(id).is_some() {
                    tracing::debug!(%id, "Binding removed from registry");
                }
            }
        }));

        tracing::debug!(%id, kind = %binding.kind(), "Binding registered");
        binding.bind();
        Ok(Registration::Created(id))
    }

    fn check(&self, key: ObjectKey, id: &BindingId) -> Result<Option<Registration>> {
        let maps = self.maps.lock();
        if let Some(existing) = maps.object_to_binding.get(&key) {
            tracing::warn!(id = %existing, "Object is already registered; ignoring");
            return Ok(Some(Registration::Existing(existing.clone())));
        }
        if maps.bindings.contains_key(id) {
            return Err(TelemetryError::IdConflict { id: id.clone() });
        }
        Ok(None)
    }

    /// Unbind whatever binding observes the object identified by `key`
    pub(crate) fn remove(&self, key: ObjectKey) -> Removal {
        let binding = {
            let maps = self.maps.lock();
            maps.object_to_binding
                .get(&key)
                .and_then(|id| maps.bindings.get(id))
                .cloned()
        };

        match binding {
            Some(binding) => {
                let id = binding.id().clone();
                // The close hook drops the registry entry
                binding.unbind();
                Removal::Unbound(id)
            }
            None => {
                tracing::warn!(object = %key, "Object is not registered; nothing to remove");
                Removal::NotFound
            }
        }
    }

    pub(crate) fn get(&self, id: &BindingId) -> Option<Arc<dyn Binding>> {
        self.maps.lock().bindings.get(id).cloned()
    }

    pub(crate) fn id_for(&self, key: ObjectKey) -> Option<BindingId> {
        self.maps.lock().object_to_binding.get(&key).cloned()
    }

    pub(crate) fn contains(&self, key: ObjectKey) -> bool {
        self.maps.lock().object_to_binding.contains_key(&key)
    }

    /// All registered binding ids, sorted
    pub(crate) fn ids(&self) -> Vec<BindingId> {
        let mut ids: Vec<_> = self.maps.lock().bindings.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn len(&self) -> usize {
        self.maps.lock().bindings.len()
    }

    /// Unbind every registered binding silently
    pub(crate) fn unbind_all(&self) -> usize {
        let bindings: Vec<_> = self.maps.lock().bindings.values().cloned().collect();
        let count = bindings.len();
        for binding in bindings {
            binding.unbind();
        }
        let mut maps = self.maps.lock();
        maps.bindings.clear();
        maps.object_to_binding.clear();
        count
    }

    pub(crate) fn stats(&self) -> RegistryStats {
        let maps = self.maps.lock();
        let mut stats = RegistryStats::default();
        for binding in maps.bindings.values() {
            match binding.kind() {
                BindingKind::PeerConnection => stats.peer_connections += 1,
                BindingKind::Transport => stats.transports += 1,
            }
            stats.children += binding.child_count();
        }
        stats.total_bindings = maps.bindings.len();
        stats
    }
}

/// Statistics about the registry state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_bindings: usize,
    pub peer_connections: usize,
    pub transports: usize,
    /// Children watched across all bindings, not counting producer/consumer tracks
    pub children: usize,
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Registry Stats:")?;
        writeln!(f, "  Total: {}", self.total_bindings)?;
        writeln!(f, "  Peer connections: {}", self.peer_connections)?;
        writeln!(f, "  Transports: {}", self.transports)?;
        writeln!(f, "  Children: {}", self.children)?;
        Ok(())
    }
}
