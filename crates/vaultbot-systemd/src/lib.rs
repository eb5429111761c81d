//! # Vaultbot systemd
//!
//! Template units for the vaultbot agent and control of per-bundle timer
//! instances.
//!
//! ```rust
//! use std::path::PathBuf;
//! use vaultbot_systemd::{RecordingUnitManager, UnitManager, UnitState, UnitTemplate};
//!
//! let template = UnitTemplate::new(
//!     "/usr/local/bin/vaultbot",
//!     vec![PathBuf::from("/etc/vaultbot/vaultbot.conf")],
//! );
//! assert!(template.render_timer().contains("OnCalendar=daily\n"));
//!
//! let manager = RecordingUnitManager::new();
//! manager.set_unit(&template.instance("www"), UnitState::ACTIVE).unwrap();
//! assert_eq!(manager.calls().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod manager;
mod unit;

pub use error::{Result, UnitError};
pub use manager::{RecordingUnitManager, SystemdUnitManager, UnitCall, UnitManager, UnitState};
pub use unit::{Schedule, UnitTemplate, DEFAULT_UNIT_PREFIX};
