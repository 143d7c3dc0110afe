//! Resource lookup by kind and symbolic name
//!
//! Loading is the renderer's job. The simulation only resolves names such as
//! `tile-red` into opaque handles when it sets up tile families; a name that
//! cannot be resolved is a fatal configuration error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BlastError, Result};

/// Resource categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Texture,
    Font,
}

/// Opaque renderer-side resource id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle(pub u32);

/// Anything that can resolve a resource by kind and name
pub trait ResourceProvider {
    fn get(&self, kind: ResourceKind, name: &str) -> Result<ResourceHandle>;
}

/// In-memory resource table
#[derive(Debug, Clone, Default)]
pub struct ResourceManager {
    by_kind: HashMap<ResourceKind, HashMap<String, ResourceHandle>>,
    next_handle: u32,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with the given kinds registered
    pub fn with_kinds(kinds: &[ResourceKind]) -> Result<Self> {
        let mut manager = Self::new();
        for &kind in kinds {
            manager.register(kind)?;
        }
        Ok(manager)
    }

    /// Register a resource kind. Registering the same kind twice is an error.
    pub fn register(&mut self, kind: ResourceKind) -> Result<()> {
        if self.by_kind.contains_key(&kind) {
            return Err(BlastError::DuplicateResourceKind(kind));
        }
        self.by_kind.insert(kind, HashMap::new());
        Ok(())
    }

    /// Add a named resource, returning its handle.
    /// A name that is already present keeps its original handle.
    pub fn insert(&mut self, kind: ResourceKind, name: &str) -> Result<ResourceHandle> {
        let resources = self.by_kind.get_mut(&kind).ok_or_else(|| {
            BlastError::InvalidConfig(format!("resource kind {kind:?} is not registered"))
        })?;

        if let Some(&existing) = resources.get(name) {
            log::warn!("Duplicate resource {name}");
            return Ok(existing);
        }

        let handle = ResourceHandle(self.next_handle);
        self.next_handle += 1;
        resources.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Add several named resources of one kind
    pub fn load<'a>(&mut self, kind: ResourceKind, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            self.insert(kind, name)?;
        }
        Ok(())
    }

    pub fn len(&self, kind: ResourceKind) -> usize {
        self.by_kind.get(&kind).map(HashMap::len).unwrap_or(0)
    }
}

impl ResourceProvider for ResourceManager {
    fn get(&self, kind: ResourceKind, name: &str) -> Result<ResourceHandle> {
        self.by_kind
            .get(&kind)
            .and_then(|resources| resources.get(name))
            .copied()
            .ok_or_else(|| BlastError::MissingResource {
                kind,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;

    #[test]
    fn test_register_twice_fails() {
        let mut manager = ResourceManager::new();
        manager.register(ResourceKind::Texture).unwrap();
        let err = manager.register(ResourceKind::Texture).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_insert_and_get() {
        let mut manager = ResourceManager::with_kinds(&[ResourceKind::Texture]).unwrap();
        let red = manager.insert(ResourceKind::Texture, "tile-red").unwrap();
        let blue = manager.insert(ResourceKind::Texture, "tile-blue").unwrap();
        assert_ne!(red, blue);
        assert_eq!(manager.get(ResourceKind::Texture, "tile-red").unwrap(), red);

        // Duplicates keep the first handle
        assert_eq!(manager.insert(ResourceKind::Texture, "tile-red").unwrap(), red);
        assert_eq!(manager.len(ResourceKind::Texture), 2);
    }

    #[test]
    fn test_missing_resource_is_config_error() {
        let manager = ResourceManager::with_kinds(&[ResourceKind::Texture]).unwrap();
        let err = manager.get(ResourceKind::Texture, "tile-purple").unwrap_err();
        assert!(matches!(err, BlastError::MissingResource { .. }));
        assert_eq!(err.category(), ErrorCategory::Config);

        let err = manager.get(ResourceKind::Font, "marvin").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_insert_unregistered_kind() {
        let mut manager = ResourceManager::new();
        assert!(manager.insert(ResourceKind::Font, "marvin").is_err());
    }
}
