//! Launcher presence checks.

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Point-in-time answer to "is the watched process running?".
///
/// Lifecycle operations re-check this immediately before their first
/// destructive filesystem step; polling cadence is the caller's concern.
pub trait ProcessPresence {
    fn is_running(&mut self) -> bool;
}

/// Presence check backed by the operating system's process list.
pub struct LauncherPresence {
    system: System,
    executable: String,
}

impl LauncherPresence {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            system: System::new(),
            executable: executable.into(),
        }
    }
}

impl ProcessPresence for LauncherPresence {
    fn is_running(&mut self) -> bool {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new(),
        );
        // The launcher reports its name with varying case across
        // platforms, so compare case-insensitively.
        self.system.processes().values().any(|process| {
            process
                .name()
                .to_string_lossy()
                .eq_ignore_ascii_case(&self.executable)
        })
    }
}
