//! Profile lifecycle operations.
//!
//! Create and switch operations over the registry store and the
//! launcher's settings files. Both refuse to run while the launcher
//! process is up, re-checking presence immediately before the first
//! destructive filesystem step.

use std::fs;

use tracing::{debug, info, warn};

use super::error::{ProfileError, ValidationReason};
use super::paths::Paths;
use super::presence::ProcessPresence;
use super::registry::Registry;
use crate::persistence::RegistryStore;

/// Content of a snapshot created with no base profile: an empty JSON
/// document the launcher can populate on first use.
const EMPTY_SNAPSHOT: &[u8] = b"{}";

/// Implements profile creation and the live/snapshot exchange.
pub struct ProfileManager {
    store: RegistryStore,
    paths: Paths,
    presence: Box<dyn ProcessPresence>,
}

impl ProfileManager {
    pub fn new(store: RegistryStore, paths: Paths, presence: Box<dyn ProcessPresence>) -> Self {
        Self {
            store,
            paths,
            presence,
        }
    }

    /// Create profile `name`, optionally cloning `based_on`'s snapshot
    /// byte-for-byte. The new profile is appended to the registry but
    /// does not become active.
    pub fn create_profile(
        &mut self,
        name: &str,
        based_on: Option<&str>,
    ) -> Result<(), ProfileError> {
        let name = validate_name(name, self.store.get())?;

        if let Some(base) = based_on {
            if !self.store.get().contains(base) {
                return Err(ProfileError::NotFound(base.to_string()));
            }
        }

        if self.presence.is_running() {
            return Err(ProfileError::LauncherRunning);
        }

        let contents = match based_on {
            Some(base) => {
                let base_path = self.paths.snapshot_file(base);
                fs::read(&base_path).map_err(|source| ProfileError::Snapshot {
                    path: base_path.display().to_string(),
                    source,
                })?
            }
            None => EMPTY_SNAPSHOT.to_vec(),
        };

        let snapshot = self.paths.snapshot_file(name);
        fs::write(&snapshot, &contents).map_err(|source| ProfileError::Snapshot {
            path: snapshot.display().to_string(),
            source,
        })?;

        let owned = name.to_string();
        if let Err(e) = self.store.mutate(|registry| registry.profiles.push(owned)) {
            // The snapshot file stays behind; an unlisted file is safer
            // than a registry entry pointing at nothing.
            warn!("Registry write failed after creating '{}'; snapshot left on disk", name);
            return Err(e);
        }

        info!("Created profile '{}' (based on {:?})", name, based_on);
        Ok(())
    }

    /// Switch the live settings file to `name`'s snapshot.
    ///
    /// The outgoing profile's snapshot is rewritten from the live file
    /// first, so drift the launcher made since the last switch is never
    /// lost. Switching to the already-active profile is a no-op.
    pub fn switch_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.store.get().contains(name) {
            return Err(ProfileError::NotFound(name.to_string()));
        }
        let active = self.store.get().active_profile.clone();
        if active == name {
            debug!("Profile '{}' is already active; nothing to do", name);
            return Ok(());
        }

        if self.presence.is_running() {
            return Err(ProfileError::LauncherRunning);
        }

        let live = self.paths.live_settings_file();
        let outgoing = self.paths.snapshot_file(&active);

        // Step 1: archive the outgoing profile, drift included. A
        // failure here aborts with the live file untouched.
        fs::copy(&live, &outgoing).map_err(|e| ProfileError::Switch {
            detail: format!(
                "could not save the current profile '{active}' from '{}': {e}; \
                 nothing has been changed",
                live.display()
            ),
            live_file_at_risk: false,
        })?;

        // Step 2: stage the incoming snapshot next to the live file,
        // then rename it into place.
        let incoming = self.paths.snapshot_file(name);
        let staged = live.with_extension("json.tmp");
        if let Err(e) = fs::copy(&incoming, &staged) {
            let _ = fs::remove_file(&staged);
            return Err(ProfileError::Switch {
                detail: format!(
                    "could not stage profile '{name}' from '{}': {e}; the live file is \
                     unchanged and '{active}' was saved to '{}'",
                    incoming.display(),
                    outgoing.display()
                ),
                live_file_at_risk: false,
            });
        }
        if let Err(e) = fs::rename(&staged, &live) {
            let _ = fs::remove_file(&staged);
            return Err(ProfileError::Switch {
                detail: format!(
                    "could not replace the live settings file '{}': {e}; if it looks \
                     wrong, restore it from '{}'",
                    live.display(),
                    outgoing.display()
                ),
                live_file_at_risk: true,
            });
        }

        // Step 3: record the new active profile.
        let owned = name.to_string();
        self.store
            .mutate(move |registry| registry.active_profile = owned)
            .map_err(|e| match e {
                ProfileError::Persistence { path, detail } => ProfileError::Persistence {
                    path,
                    detail: format!(
                        "{detail}; the settings files were already exchanged, and \
                         re-running the switch to '{name}' is safe"
                    ),
                },
                other => other,
            })?;

        info!("Switched profile '{}' -> '{}'", active, name);
        Ok(())
    }
}

/// Trimmed, charset-checked, non-duplicate profile name.
fn validate_name<'a>(name: &'a str, registry: &Registry) -> Result<&'a str, ProfileError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProfileError::Validation(ValidationReason::Empty));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ProfileError::Validation(ValidationReason::InvalidCharacters));
    }
    if registry.contains(name) {
        return Err(ProfileError::Validation(ValidationReason::Duplicate));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct StubPresence {
        running: bool,
    }

    impl ProcessPresence for StubPresence {
        fn is_running(&mut self) -> bool {
            self.running
        }
    }

    fn setup(live: &[u8]) -> (TempDir, ProfileManager) {
        setup_with_presence(live, false)
    }

    fn setup_with_presence(live: &[u8], running: bool) -> (TempDir, ProfileManager) {
        let dir = TempDir::new().unwrap();
        let paths = Paths::rooted(dir.path());
        fs::create_dir_all(&paths.settings_dir).unwrap();
        fs::write(paths.live_settings_file(), live).unwrap();
        let store = RegistryStore::load(&paths).unwrap();
        let manager = ProfileManager::new(store, paths, Box::new(StubPresence { running }));
        (dir, manager)
    }

    #[test]
    fn create_appends_without_changing_active() {
        let (_dir, mut manager) = setup(b"{}");

        manager.create_profile("pvp", None).unwrap();

        let registry = manager.store.get();
        assert_eq!(registry.profiles, vec!["main", "pvp"]);
        assert_eq!(registry.active_profile, "main");
        assert_eq!(
            fs::read(manager.paths.snapshot_file("pvp")).unwrap(),
            b"{}".to_vec()
        );
    }

    #[test]
    fn create_trims_the_submitted_name() {
        let (_dir, mut manager) = setup(b"{}");
        manager.create_profile("  pvp  ", None).unwrap();
        assert!(manager.store.get().contains("pvp"));
        assert!(manager.paths.snapshot_file("pvp").exists());
    }

    #[test]
    fn invalid_names_leave_the_registry_untouched_on_disk() {
        let (_dir, mut manager) = setup(b"{}");
        let before = fs::read(&manager.paths.registry_file).unwrap();

        for bad in ["", "   ", "my profile", "pvp!", "a/b", "\u{e9}clair"] {
            let err = manager.create_profile(bad, None).unwrap_err();
            assert!(matches!(err, ProfileError::Validation(_)), "name: {bad:?}");
        }

        assert_eq!(fs::read(&manager.paths.registry_file).unwrap(), before);
    }

    #[test]
    fn duplicate_name_fails_without_touching_snapshots() {
        let (_dir, mut manager) = setup(b"{\"volume\":5}");
        let before = fs::read(manager.paths.snapshot_file("main")).unwrap();

        let err = manager.create_profile("main", None).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Validation(ValidationReason::Duplicate)
        ));
        assert_eq!(
            fs::read(manager.paths.snapshot_file("main")).unwrap(),
            before
        );
    }

    #[test]
    fn create_based_on_unknown_profile_fails() {
        let (_dir, mut manager) = setup(b"{}");
        let err = manager.create_profile("pve", Some("pvp")).unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(name) if name == "pvp"));
        assert!(!manager.paths.snapshot_file("pve").exists());
    }

    #[test]
    fn create_based_on_clones_the_base_snapshot_bytes() {
        let (_dir, mut manager) = setup(b"{}");
        manager.create_profile("pvp", None).unwrap();
        fs::write(
            manager.paths.snapshot_file("pvp"),
            b"{\"overview\":\"pvp\"}",
        )
        .unwrap();

        manager.create_profile("pve", Some("pvp")).unwrap();

        let registry = manager.store.get();
        assert_eq!(registry.profiles, vec!["main", "pvp", "pve"]);
        assert_eq!(registry.active_profile, "main");
        assert_eq!(
            fs::read(manager.paths.snapshot_file("pve")).unwrap(),
            b"{\"overview\":\"pvp\"}".to_vec()
        );
    }

    #[test]
    fn switch_round_trip_restores_live_content() {
        let (_dir, mut manager) = setup(b"{\"volume\":5}");
        manager.create_profile("pvp", None).unwrap();

        let before = fs::read(manager.paths.live_settings_file()).unwrap();
        manager.switch_profile("pvp").unwrap();

        // The launcher drifts the live file while "pvp" is active.
        fs::write(manager.paths.live_settings_file(), b"{\"volume\":9}").unwrap();

        manager.switch_profile("main").unwrap();
        assert_eq!(
            fs::read(manager.paths.live_settings_file()).unwrap(),
            before
        );

        // Drift made under "pvp" was captured into its snapshot.
        manager.switch_profile("pvp").unwrap();
        assert_eq!(
            fs::read(manager.paths.live_settings_file()).unwrap(),
            b"{\"volume\":9}".to_vec()
        );
    }

    #[test]
    fn switch_to_active_profile_is_a_no_op() {
        let (_dir, mut manager) = setup(b"{\"volume\":5}");
        let registry_before = fs::read(&manager.paths.registry_file).unwrap();

        // Even with the live file gone, switching to the active profile
        // must succeed without touching anything.
        fs::remove_file(manager.paths.live_settings_file()).unwrap();
        manager.switch_profile("main").unwrap();

        assert_eq!(
            fs::read(&manager.paths.registry_file).unwrap(),
            registry_before
        );
        assert!(!manager.paths.live_settings_file().exists());
    }

    #[test]
    fn switch_to_unknown_profile_fails() {
        let (_dir, mut manager) = setup(b"{}");
        let err = manager.switch_profile("pvp").unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(name) if name == "pvp"));
    }

    #[test]
    fn switch_with_missing_live_file_aborts_before_overwriting() {
        let (_dir, mut manager) = setup(b"{\"volume\":5}");
        manager.create_profile("pvp", None).unwrap();
        let main_snapshot = fs::read(manager.paths.snapshot_file("main")).unwrap();

        fs::remove_file(manager.paths.live_settings_file()).unwrap();

        let err = manager.switch_profile("pvp").unwrap_err();
        match err {
            ProfileError::Switch {
                live_file_at_risk, ..
            } => assert!(!live_file_at_risk),
            other => panic!("expected Switch error, got {other:?}"),
        }
        assert_eq!(
            fs::read(manager.paths.snapshot_file("main")).unwrap(),
            main_snapshot
        );
        assert_eq!(manager.store.get().active_profile, "main");
    }

    #[test]
    fn switch_with_missing_incoming_snapshot_keeps_live_file() {
        let (_dir, mut manager) = setup(b"{\"volume\":5}");
        manager.create_profile("pvp", None).unwrap();
        fs::remove_file(manager.paths.snapshot_file("pvp")).unwrap();

        let err = manager.switch_profile("pvp").unwrap_err();
        match err {
            ProfileError::Switch {
                live_file_at_risk, ..
            } => assert!(!live_file_at_risk),
            other => panic!("expected Switch error, got {other:?}"),
        }
        // Step 1 ran (outgoing archived), the live file is intact.
        assert_eq!(
            fs::read(manager.paths.live_settings_file()).unwrap(),
            b"{\"volume\":5}".to_vec()
        );
        assert_eq!(manager.store.get().active_profile, "main");
    }

    #[test]
    fn running_launcher_blocks_create_and_switch() {
        let (_dir, mut manager) = setup_with_presence(b"{}", true);

        let err = manager.create_profile("pvp", None).unwrap_err();
        assert!(matches!(err, ProfileError::LauncherRunning));
        assert!(!manager.paths.snapshot_file("pvp").exists());
        assert_eq!(manager.store.get().profiles, vec!["main"]);

        // Seed a second profile with the launcher "closed", then block
        // the switch with it "running".
        manager.presence = Box::new(StubPresence { running: false });
        manager.create_profile("pvp", None).unwrap();
        manager.presence = Box::new(StubPresence { running: true });

        let err = manager.switch_profile("pvp").unwrap_err();
        assert!(matches!(err, ProfileError::LauncherRunning));
        assert_eq!(manager.store.get().active_profile, "main");
    }
}
