//! Unit file templates.
//!
//! One template pair serves every bundle: `vaultbot@.service` runs the agent
//! once with the global and the bundle environment files loaded, and
//! `vaultbot@.timer` schedules it. A bundle named `www` is the instance
//! `vaultbot@www.timer`.

use std::path::PathBuf;

/// Default unit name prefix.
pub const DEFAULT_UNIT_PREFIX: &str = "vaultbot";

/// When the agent runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// `OnCalendar=` expression.
    pub on_calendar: String,
    /// `OnBootSec=`; omitted from the timer when empty.
    pub on_boot_sec: String,
    /// `RandomizedDelaySec=`; omitted from the timer when empty.
    pub randomized_delay_sec: String,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            on_calendar: "daily".to_string(),
            on_boot_sec: "15min".to_string(),
            randomized_delay_sec: "15min".to_string(),
        }
    }
}

/// Template unit pair for the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTemplate {
    /// Unit name prefix, `vaultbot` gives `vaultbot@.service`.
    pub prefix: String,
    /// `ExecStart=` command line.
    pub exec_start: String,
    /// `EnvironmentFile=` entries in load order; later files override earlier ones.
    pub env_files: Vec<PathBuf>,
    /// `SyslogIdentifier=`.
    pub syslog_identifier: String,
    /// Timer schedule.
    pub schedule: Schedule,
}

impl UnitTemplate {
    /// Creates a template running `exec_start` with the given environment files.
    #[must_use]
    pub fn new(exec_start: impl Into<String>, env_files: Vec<PathBuf>) -> Self {
        Self {
            prefix: DEFAULT_UNIT_PREFIX.to_string(),
            exec_start: exec_start.into(),
            env_files,
            syslog_identifier: format!("{DEFAULT_UNIT_PREFIX}-%i"),
            schedule: Schedule::default(),
        }
    }

    /// Sets the syslog identifier.
    #[must_use]
    pub fn with_syslog_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.syslog_identifier = identifier.into();
        self
    }

    /// Sets the timer schedule.
    #[must_use]
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Returns the service template file name, e.g. `vaultbot@.service`.
    #[must_use]
    pub fn service_name(&self) -> String {
        format!("{}@.service", self.prefix)
    }

    /// Returns the timer template file name, e.g. `vaultbot@.timer`.
    #[must_use]
    pub fn timer_name(&self) -> String {
        format!("{}@.timer", self.prefix)
    }

    /// Returns the timer instance controlling a bundle.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaultbot_systemd::UnitTemplate;
    ///
    /// let template = UnitTemplate::new("/usr/local/bin/vaultbot", Vec::new());
    /// assert_eq!(template.instance("test_service"), "vaultbot@test_service.timer");
    /// ```
    #[must_use]
    pub fn instance(&self, bundle: &str) -> String {
        format!("{}@{bundle}.timer", self.prefix)
    }

    /// Renders `vaultbot@.service`.
    #[must_use]
    pub fn render_service(&self) -> String {
        let mut out = String::new();
        out.push_str("[Unit]\n");
        out.push_str("Description=Vaultbot certificate renewal (%i)\n");
        out.push_str("Wants=network-online.target\n");
        out.push_str("After=network-online.target\n");
        out.push('\n');
        out.push_str("[Service]\n");
        out.push_str("Type=oneshot\n");
        for file in &self.env_files {
            // Leading '-' tolerates a missing file.
            out.push_str(&format!("EnvironmentFile=-{}\n", file.display()));
        }
        out.push_str(&format!("SyslogIdentifier={}\n", self.syslog_identifier));
        out.push_str(&format!("ExecStart={}\n", self.exec_start));
        out
    }

    /// Renders `vaultbot@.timer`.
    #[must_use]
    pub fn render_timer(&self) -> String {
        let schedule = &self.schedule;
        let mut out = String::new();
        out.push_str("[Unit]\n");
        out.push_str("Description=Periodic vaultbot certificate renewal (%i)\n");
        out.push('\n');
        out.push_str("[Timer]\n");
        out.push_str(&format!("OnCalendar={}\n", schedule.on_calendar));
        if !schedule.on_boot_sec.is_empty() {
            out.push_str(&format!("OnBootSec={}\n", schedule.on_boot_sec));
        }
        if !schedule.randomized_delay_sec.is_empty() {
            out.push_str(&format!("RandomizedDelaySec={}\n", schedule.randomized_delay_sec));
        }
        out.push('\n');
        out.push_str("[Install]\n");
        out.push_str("WantedBy=timers.target\n");
        out
    }
}
