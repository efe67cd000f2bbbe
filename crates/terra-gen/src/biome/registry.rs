//! Biome registry: maps [`BiomeId`] to [`BiomeDef`] with name-based lookup.

use hashbrown::HashMap;
use terra_world::BiomeId;

use super::BiomeDef;

/// Errors that can occur when registering biomes.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A biome with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateName(String),
    /// The u16 index space is exhausted.
    #[error("too many biomes: the registry is limited to {0} entries")]
    Exhausted(usize),
}

/// Stores all registered biome definitions with O(1) lookup by ID.
///
/// IDs are assigned in registration order and stay stable for the
/// lifetime of the registry, so grids and splat channels can refer to
/// biomes by index instead of by name.
pub struct BiomeRegistry {
    biomes: Vec<BiomeDef>,
    name_to_id: HashMap<String, BiomeId>,
}

impl BiomeRegistry {
    const MAX_BIOMES: usize = u16::MAX as usize + 1;

    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            biomes: Vec::new(),
            name_to_id: HashMap::new(),
        }
    }

    /// Registers a new biome definition, returning its assigned [`BiomeId`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if a biome with the same
    /// name exists, or [`RegistryError::Exhausted`] if the index space
    /// is full.
    pub fn register(&mut self, def: BiomeDef) -> Result<BiomeId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name.clone()));
        }
        if self.biomes.len() >= Self::MAX_BIOMES {
            return Err(RegistryError::Exhausted(Self::MAX_BIOMES));
        }
        let id = BiomeId(self.biomes.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.biomes.push(def);
        Ok(id)
    }

    /// Returns the definition for the given biome ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn get(&self, id: BiomeId) -> &BiomeDef {
        &self.biomes[id.0 as usize]
    }

    /// Looks up a biome ID by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeId> {
        self.name_to_id.get(name).copied()
    }

    /// Iterate over `(id, def)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeDef)> {
        self.biomes
            .iter()
            .enumerate()
            .map(|(i, def)| (BiomeId(i as u16), def))
    }

    /// Returns the number of registered biomes.
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Returns `true` if no biomes are registered.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_assigned_in_registration_order() {
        let mut reg = BiomeRegistry::new();
        let a = reg.register(BiomeDef::named("plains")).unwrap();
        let b = reg.register(BiomeDef::named("desert")).unwrap();
        assert_eq!(a, BiomeId(0));
        assert_eq!(b, BiomeId(1));
        assert_eq!(reg.get(a).name, "plains");
        assert_eq!(reg.get(b).name, "desert");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut reg = BiomeRegistry::new();
        reg.register(BiomeDef::named("tundra")).unwrap();
        let err = reg.register(BiomeDef::named("tundra")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(n) if n == "tundra"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut reg = BiomeRegistry::new();
        let id = reg.register(BiomeDef::named("swamp")).unwrap();
        assert_eq!(reg.lookup_by_name("swamp"), Some(id));
        assert_eq!(reg.lookup_by_name("missing"), None);
    }
}
