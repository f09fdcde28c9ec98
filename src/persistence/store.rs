//! JSON-file persistence for the profile registry.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::paths::{Paths, DEFAULT_PROFILE};
use crate::core::{ProfileError, Registry};

/// Callback invoked with the new registry value after every persisted
/// mutation.
pub type Observer = Box<dyn FnMut(&Registry)>;

/// Owns the in-memory registry and its persisted form.
///
/// All writes go through [`RegistryStore::mutate`]; on a failed write
/// the in-memory value is rolled back so memory and disk never diverge.
pub struct RegistryStore {
    registry: Registry,
    path: PathBuf,
    observer: Option<Observer>,
}

impl std::fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryStore")
            .field("registry", &self.registry)
            .field("path", &self.path)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl RegistryStore {
    /// Load the registry from disk, or initialize it on first run.
    ///
    /// A registry file that exists but cannot be parsed, or that
    /// violates its invariants, is a fatal error; it is never replaced
    /// with defaults. First run seeds the default profile's snapshot
    /// from the live settings file before the registry is written, so a
    /// failure can never leave a registry entry without a file.
    pub fn load(paths: &Paths) -> Result<Self, ProfileError> {
        let path = paths.registry_file.clone();
        if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| ProfileError::CorruptRegistry {
                path: path.display().to_string(),
                detail: format!("unreadable: {e}"),
            })?;
            let registry: Registry =
                serde_json::from_str(&contents).map_err(|e| ProfileError::CorruptRegistry {
                    path: path.display().to_string(),
                    detail: e.to_string(),
                })?;
            registry
                .validate()
                .map_err(|detail| ProfileError::CorruptRegistry {
                    path: path.display().to_string(),
                    detail,
                })?;
            debug!(
                "Registry loaded from '{}', active profile '{}'",
                path.display(),
                registry.active_profile
            );
            return Ok(Self {
                registry,
                path,
                observer: None,
            });
        }

        let live = paths.live_settings_file();
        let snapshot = paths.snapshot_file(DEFAULT_PROFILE);
        fs::copy(&live, &snapshot).map_err(|source| ProfileError::Initialization {
            path: live.display().to_string(),
            source,
        })?;

        let store = Self {
            registry: Registry::default(),
            path,
            observer: None,
        };
        store.persist()?;
        info!(
            "Initialized registry at '{}' with default profile '{DEFAULT_PROFILE}'",
            store.path.display()
        );
        Ok(store)
    }

    /// Read-only view of the current registry.
    pub fn get(&self) -> &Registry {
        &self.registry
    }

    /// Register the observer notified after every persisted mutation.
    /// A second call replaces the previous observer.
    pub fn subscribe(&mut self, observer: impl FnMut(&Registry) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Apply `f` to the registry, persist the result, and notify the
    /// observer. If persisting fails the in-memory registry is rolled
    /// back and nothing is notified.
    pub fn mutate(&mut self, f: impl FnOnce(&mut Registry)) -> Result<(), ProfileError> {
        let previous = self.registry.clone();
        f(&mut self.registry);
        if let Err(e) = self.persist() {
            self.registry = previous;
            return Err(e);
        }
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.registry);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), ProfileError> {
        let json =
            serde_json::to_string_pretty(&self.registry).map_err(|e| ProfileError::Persistence {
                path: self.path.display().to_string(),
                detail: e.to_string(),
            })?;
        fs::write(&self.path, json).map_err(|e| ProfileError::Persistence {
            path: self.path.display().to_string(),
            detail: e.to_string(),
        })?;
        debug!("Registry persisted to '{}'", self.path.display());
        Ok(())
    }
}
