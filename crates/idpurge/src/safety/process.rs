use crate::store::OwningApp;
use std::collections::BTreeSet;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Answers "is this application running right now?".
pub trait AppProbe {
    fn is_running(&mut self, app: &OwningApp) -> bool;
}

/// Process table lookup through `sysinfo`, refreshed on every query so that
/// quitting an application mid-run is noticed.
pub struct SystemProbe {
    system: System,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl AppProbe for SystemProbe {
    fn is_running(&mut self, app: &OwningApp) -> bool {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        let running = self.system.processes().values().any(|process| {
            let name = process.name().to_string_lossy();
            app.process_names.iter().any(|candidate| candidate == name.as_ref())
        });
        if running {
            log::debug!("{} is running", app.name);
        }
        running
    }
}

/// Fixed answer set for tests and for runs that opt out of process checks.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    running: BTreeSet<String>,
}

impl StaticProbe {
    pub fn none_running() -> Self {
        Self::default()
    }

    pub fn with_running(names: &[&str]) -> Self {
        Self {
            running: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl AppProbe for StaticProbe {
    fn is_running(&mut self, app: &OwningApp) -> bool {
        self.running.contains(&app.name)
            || app.process_names.iter().any(|p| self.running.contains(p))
    }
}
