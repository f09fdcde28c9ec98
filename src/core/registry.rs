//! The persisted profile registry.

use serde::{Deserialize, Serialize};

use super::paths::DEFAULT_PROFILE;

/// Schema version written to new registries; anything else is rejected.
pub const REGISTRY_VERSION: u32 = 1;

/// Persisted record of known profiles and which one is live.
///
/// Serialized as human-readable JSON with camelCase field names:
/// `{ "version": 1, "activeProfile": "main", "profiles": ["main"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub version: u32,
    /// Name of the profile currently mirrored into the live settings file.
    pub active_profile: String,
    /// Known profile names, insertion-ordered, unique.
    pub profiles: Vec<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            active_profile: DEFAULT_PROFILE.to_string(),
            profiles: vec![DEFAULT_PROFILE.to_string()],
        }
    }
}

impl Registry {
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.iter().any(|p| p == name)
    }

    /// Check the invariants a loaded registry must hold. Returns a
    /// description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.version != REGISTRY_VERSION {
            return Err(format!("unsupported schema version {}", self.version));
        }
        if self.profiles.is_empty() {
            return Err("profile list is empty".to_string());
        }
        for (i, name) in self.profiles.iter().enumerate() {
            if self.profiles[..i].contains(name) {
                return Err(format!("duplicate profile name '{name}'"));
            }
        }
        if !self.contains(&self.active_profile) {
            return Err(format!(
                "active profile '{}' is not in the profile list",
                self.active_profile
            ));
        }
        Ok(())
    }
}
