//! The checkplugin crate provides the building blocks to write nagios/icinga
//! check plugins: a registry for POSIX style command line options, warning and
//! critical thresholds in the classic range and percentage grammars, and
//! performance data serialization in the exact format the poller parses.
//!
//! A plugin is usually written by implementing [CheckPlugin] and handing it to
//! [Plugin::execute], which takes care of option parsing, threshold
//! resolution, `--help`/`--version` handling and the final exit:
//!
//! ```rust
//! use checkplugin::{
//!     Diagnostic, NagiosResponse, PerformanceDataLine, Response, ServiceState,
//! };
//!
//! # fn main() -> Result<(), checkplugin::PerfDataError> {
//! let mut diagnostic = Diagnostic::new("All good");
//! diagnostic.push_line(
//!     PerformanceDataLine::new("latency", "12ms")?
//!         .with_warning(50)
//!         .with_critical(100)
//!         .with_maximum(200),
//! );
//!
//! let response = Response::from(NagiosResponse::new(ServiceState::Ok, diagnostic));
//! assert_eq!(
//!     response.serialize(),
//!     "All good | 'latency'=12ms;50;100;0;200\n"
//! );
//! assert_eq!(response.exit_status(), 0);
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;
use std::fmt;

#[macro_use]
mod macros;

mod config_generator;
mod diagnostic;
mod options;
mod perfdata;
mod plugin;
mod response;
mod runner;
mod threshold;

pub use crate::config_generator::{
    print_icinga_command_config_if_env_and_exit, CommandDescription, CommandDescriptionFromError,
    ToIcingaCommandError,
};
pub use crate::diagnostic::Diagnostic;
pub use crate::options::{OptionError, OptionMode, OptionRegistry, OptionValue, PluginOption};
pub use crate::perfdata::{
    PerfDataError, PerfNumber, PerfValue, PerformanceData, PerformanceDataLine, Unit,
};
pub use crate::plugin::{CheckContext, CheckOutcome, CheckPlugin, Plugin, PluginError};
pub use crate::response::{NagiosResponse, Response, TextResponse};
pub use crate::runner::{safe_run, Runner, RunnerResult};
pub use crate::threshold::{Threshold, ThresholdError, ThresholdList};

/// Represents a service state from nagios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

/// Returned when constructing a [ServiceState] from an exit code outside 0..=3.
#[derive(Debug, thiserror::Error)]
#[error("invalid service state exit code: {0}")]
pub struct InvalidStateCode(pub i32);

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl TryFrom<i32> for ServiceState {
    type Error = InvalidStateCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ServiceState::Ok),
            1 => Ok(ServiceState::Warning),
            2 => Ok(ServiceState::Critical),
            3 => Ok(ServiceState::Unknown),
            other => Err(InvalidStateCode(other)),
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

impl Ord for ServiceState {
    /// States are ordered by severity so the states of multiple results can
    /// be merged with `max`. Unknown is the least severe.
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = |state: &ServiceState| match state {
            ServiceState::Unknown => 0,
            ServiceState::Ok => 1,
            ServiceState::Warning => 2,
            ServiceState::Critical => 3,
        };

        rank(self).cmp(&rank(other))
    }
}

impl PartialOrd for ServiceState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
