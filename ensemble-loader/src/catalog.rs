//! Statically registered worker factories.
//!
//! A catalog lets an embedding binary ship built-in workers next to the ones
//! found on disk. Entries keep insertion order; catalog units come first in
//! [`Catalog::discover`].

use std::fmt;
use std::path::Path;

use ensemble_core::{SharedUnit, WorkerName};

use crate::{discover, DiscoveredUnit, LoadError, UnitSource};

type Factory = Box<dyn Fn() -> SharedUnit + Send + Sync>;

#[derive(Default)]
pub struct Catalog {
    factories: Vec<(WorkerName, Factory)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named factory. Duplicate names are kept and rejected later by
    /// the registry, same as duplicate files on disk.
    pub fn register<F>(&mut self, name: impl Into<WorkerName>, factory: F)
    where
        F: Fn() -> SharedUnit + Send + Sync + 'static,
    {
        self.factories.push((name.into(), Box::new(factory)));
    }

    pub fn with<F>(mut self, name: impl Into<WorkerName>, factory: F) -> Self
    where
        F: Fn() -> SharedUnit + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Run every factory once.
    pub fn instantiate(&self) -> Vec<DiscoveredUnit> {
        self.factories
            .iter()
            .map(|(name, factory)| DiscoveredUnit {
                name: name.clone(),
                unit: factory(),
                source: UnitSource::Catalog,
            })
            .collect()
    }

    /// Catalog units followed by everything found in `dir`.
    pub fn discover(&self, dir: &Path) -> Result<Vec<DiscoveredUnit>, LoadError> {
        let mut units = self.instantiate();
        units.extend(discover(dir)?);
        Ok(units)
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("names", &self.factories.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}
