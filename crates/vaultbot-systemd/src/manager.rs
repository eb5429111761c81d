//! Instance control.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::{Result, UnitError};

/// Desired state of a unit instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitState {
    /// Started at boot.
    pub enabled: bool,
    /// Currently active.
    pub running: bool,
}

impl UnitState {
    /// Enabled and running.
    pub const ACTIVE: Self = Self {
        enabled: true,
        running: true,
    };

    /// Disabled and stopped.
    pub const INACTIVE: Self = Self {
        enabled: false,
        running: false,
    };
}

/// Controls unit instances.
pub trait UnitManager: Send + Sync {
    /// Reloads unit files after templates changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the service manager rejects the request.
    fn daemon_reload(&self) -> Result<()>;

    /// Brings `unit` to `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service manager rejects the request.
    fn set_unit(&self, unit: &str, state: UnitState) -> Result<()>;

    /// Restarts `unit` so it picks up new configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the service manager rejects the request.
    fn restart(&self, unit: &str) -> Result<()>;
}

/// Drives units through `systemctl`.
#[derive(Debug, Clone)]
pub struct SystemdUnitManager {
    program: PathBuf,
}

impl Default for SystemdUnitManager {
    fn default() -> Self {
        Self {
            program: PathBuf::from("systemctl"),
        }
    }
}

impl SystemdUnitManager {
    /// Creates a manager using `systemctl` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses another executable in place of `systemctl`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Returns the executable invoked for every request.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        debug!(command = %command, "Running");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| UnitError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "killed by signal".to_string(), |code| format!("exit code {code}"));
            return Err(UnitError::CommandFailed {
                command,
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl UnitManager for SystemdUnitManager {
    fn daemon_reload(&self) -> Result<()> {
        self.run(&["daemon-reload"])
    }

    fn set_unit(&self, unit: &str, state: UnitState) -> Result<()> {
        match (state.enabled, state.running) {
            (true, true) => self.run(&["enable", "--now", unit])?,
            (false, false) => self.run(&["disable", "--now", unit])?,
            (enabled, running) => {
                self.run(&[if enabled { "enable" } else { "disable" }, unit])?;
                self.run(&[if running { "start" } else { "stop" }, unit])?;
            }
        }
        info!(unit, enabled = state.enabled, running = state.running, "Unit state set");
        Ok(())
    }

    fn restart(&self, unit: &str) -> Result<()> {
        self.run(&["restart", unit])?;
        info!(unit, "Unit restarted");
        Ok(())
    }
}

/// A request made to a [`RecordingUnitManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitCall {
    /// `daemon-reload`.
    DaemonReload,
    /// State change for a unit.
    SetUnit {
        /// Unit name.
        unit: String,
        /// Requested state.
        state: UnitState,
    },
    /// Restart of a unit.
    Restart {
        /// Unit name.
        unit: String,
    },
}

/// Records requests instead of executing them.
///
/// Used for dry runs and staging roots where no service manager is available.
#[derive(Debug, Default)]
pub struct RecordingUnitManager {
    calls: Mutex<Vec<UnitCall>>,
}

impl RecordingUnitManager {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every request made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<UnitCall> {
        self.lock().clone()
    }

    fn record(&self, call: UnitCall) {
        debug!(?call, "Recording unit request");
        self.lock().push(call);
    }

    // A panic while holding the lock cannot leave the Vec half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<UnitCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UnitManager for RecordingUnitManager {
    fn daemon_reload(&self) -> Result<()> {
        self.record(UnitCall::DaemonReload);
        Ok(())
    }

    fn set_unit(&self, unit: &str, state: UnitState) -> Result<()> {
        self.record(UnitCall::SetUnit {
            unit: unit.to_string(),
            state,
        });
        Ok(())
    }

    fn restart(&self, unit: &str) -> Result<()> {
        self.record(UnitCall::Restart {
            unit: unit.to_string(),
        });
        Ok(())
    }
}
