//! The plugin lifecycle: fixed option registration, argument parsing,
//! resolution of verbosity, hostname, timeout and thresholds, and dispatch
//! to the concrete check.
//!
//! A plugin moves through its phases exactly once per process invocation.
//! `--help` and `--version` short circuit before the check runs, and every
//! setup error is fatal; there is no partial execution.

use std::error::Error as StdError;
use std::time::Duration;

use crate::diagnostic::Diagnostic;
use crate::options::{OptionError, OptionMode, OptionRegistry, OptionValue};
use crate::response::{NagiosResponse, Response, TextResponse};
use crate::threshold::{ThresholdError, ThresholdList};
use crate::ServiceState;

/// Timeout used when `-t`/`--timeout` is not given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// `-v` may be stacked up to this many times.
pub const MAX_VERBOSITY: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(transparent)]
    Option(#[from] OptionError),
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error("verbose may be given at most three times, got {count}")]
    InvalidVerbosity { count: u32 },
    #[error("invalid timeout: {raw:?}")]
    InvalidTimeout { raw: String },
    #[error("check execution failed: {0}")]
    CheckFailed(Box<dyn StdError + Send + Sync>),
    #[error("plugin lifecycle violation: {0}")]
    ContractViolation(&'static str),
    #[error("{0} is not available before options are resolved")]
    Uninitialized(&'static str),
}

/// What a check hands back: the service state and the diagnostic that
/// becomes the response.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    state: ServiceState,
    diagnostic: Diagnostic,
}

impl CheckOutcome {
    pub fn new(state: ServiceState, diagnostic: Diagnostic) -> Self {
        Self { state, diagnostic }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    pub fn into_response(self) -> Response {
        Response::Nagios(NagiosResponse::new(self.state, self.diagnostic))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedSettings {
    verbosity: u32,
    hostname: Option<String>,
    timeout: Duration,
    warning: Option<ThresholdList>,
    critical: Option<ThresholdList>,
}

/// The resolved invocation a check runs against.
#[derive(Debug)]
pub struct CheckContext<'a> {
    options: &'a OptionRegistry,
    settings: &'a ResolvedSettings,
}

impl<'a> CheckContext<'a> {
    /// Verbosity level between 0 and 3.
    pub fn verbosity(&self) -> u32 {
        self.settings.verbosity
    }

    pub fn hostname(&self) -> Option<&str> {
        self.settings.hostname.as_deref()
    }

    /// The timeout the check is expected to bound its probe with. The
    /// framework only carries the value, it does not enforce it.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    pub fn warning(&self) -> Option<&ThresholdList> {
        self.settings.warning.as_ref()
    }

    pub fn critical(&self) -> Option<&ThresholdList> {
        self.settings.critical.as_ref()
    }

    /// The full option registry, for plugin specific flags.
    pub fn options(&self) -> &OptionRegistry {
        self.options
    }

    pub fn operands(&self) -> &[String] {
        self.options.operands()
    }

    /// Derives the service state for a measured value from the resolved
    /// threshold lists. Critical wins over warning.
    pub fn evaluate(&self, value: f64) -> ServiceState {
        if self.critical().map_or(false, |list| list.is_met(value)) {
            ServiceState::Critical
        } else if self.warning().map_or(false, |list| list.is_met(value)) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        }
    }
}

/// The concrete check supplied by the plugin author.
pub trait CheckPlugin {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Registers plugin specific options, appended after the fixed set.
    /// Collisions with the fixed set fail registration.
    fn register_options(&self, _registry: &mut OptionRegistry) -> Result<(), OptionError> {
        Ok(())
    }

    /// Thresholds used when `-w` was not given. An explicit flag always
    /// replaces the default, the two are never merged.
    fn default_warning(&self) -> Option<ThresholdList> {
        None
    }

    /// Thresholds used when `-c` was not given.
    fn default_critical(&self) -> Option<ThresholdList> {
        None
    }

    /// Runs the probe and reports what it found.
    fn check(
        &mut self,
        context: &CheckContext<'_>,
    ) -> Result<CheckOutcome, Box<dyn StdError + Send + Sync>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    OptionsRegistered,
    OptionsParsed,
    OptionsResolved,
    Responded,
}

/// Drives a [CheckPlugin] through one invocation.
pub struct Plugin<C> {
    check: C,
    registry: OptionRegistry,
    settings: Option<ResolvedSettings>,
    phase: Phase,
}

impl<C: CheckPlugin> Plugin<C> {
    /// Creates the plugin and registers the fixed options followed by the
    /// plugin specific ones.
    pub fn new(check: C) -> Result<Self, PluginError> {
        let mut registry = OptionRegistry::new();
        registry.register(
            'V',
            "print version and exit",
            OptionMode::NoValue,
            Some("version"),
        )?;
        registry.register('h', "print this help and exit", OptionMode::NoValue, Some("help"))?;
        registry.register(
            't',
            "probe timeout in seconds (default 5)",
            OptionMode::RequireValue,
            Some("timeout"),
        )?;
        registry.register(
            'w',
            "warning thresholds, comma separated",
            OptionMode::RequireValue,
            Some("warning"),
        )?;
        registry.register(
            'c',
            "critical thresholds, comma separated",
            OptionMode::RequireValue,
            Some("critical"),
        )?;
        registry.register(
            'H',
            "hostname of the service to check",
            OptionMode::RequireValue,
            Some("hostname"),
        )?;
        registry.register(
            'v',
            "increase verbosity, may be given up to three times",
            OptionMode::NoValue,
            Some("verbose"),
        )?;
        check.register_options(&mut registry)?;

        Ok(Self {
            check,
            registry,
            settings: None,
            phase: Phase::OptionsRegistered,
        })
    }

    /// The option registry, e.g. for command config generation.
    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    /// The resolved invocation. Fails before [Plugin::run] has resolved the
    /// options.
    pub fn context(&self) -> Result<CheckContext<'_>, PluginError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or(PluginError::Uninitialized("check context"))?;
        Ok(CheckContext {
            options: &self.registry,
            settings,
        })
    }

    /// Runs one full invocation against the given arguments (without the
    /// program name) and returns the response to execute. A plugin responds
    /// exactly once; running it again is an error.
    pub fn run<I, S>(&mut self, args: I) -> Result<Response, PluginError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.phase != Phase::OptionsRegistered {
            return Err(PluginError::ContractViolation(
                "a plugin responds exactly once per invocation",
            ));
        }

        self.registry.parse(args)?;
        self.phase = Phase::OptionsParsed;

        self.resolve_settings()?;
        self.phase = Phase::OptionsResolved;

        if self.registry.value("help")?.is_some() {
            self.phase = Phase::Responded;
            return Ok(TextResponse::new(self.help_text(), ServiceState::Ok).into());
        }
        if self.registry.value("version")?.is_some() {
            self.phase = Phase::Responded;
            return Ok(TextResponse::new(self.version_text(), ServiceState::Ok).into());
        }

        let Plugin {
            check,
            registry,
            settings,
            phase,
        } = self;
        let settings = settings
            .as_ref()
            .ok_or(PluginError::Uninitialized("check context"))?;
        let context = CheckContext {
            options: registry,
            settings,
        };

        let outcome = check.check(&context).map_err(PluginError::CheckFailed)?;
        *phase = Phase::Responded;

        Ok(outcome.into_response())
    }

    /// Runs against the process arguments and exits. Fatal setup errors are
    /// reported through the unknown state instead of crashing with an
    /// unrelated exit code.
    pub fn execute(check: C) -> ! {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let response = Plugin::new(check).and_then(|mut plugin| plugin.run(args));

        match response {
            Ok(response) => response.execute(),
            Err(err) => {
                Response::from(TextResponse::new(
                    format!("UNKNOWN: {}", err),
                    ServiceState::Unknown,
                ))
                .execute();
            }
        }
    }

    fn resolve_settings(&mut self) -> Result<(), PluginError> {
        let verbosity = self
            .registry
            .value("verbose")?
            .and_then(OptionValue::count)
            .unwrap_or(0);
        if verbosity > MAX_VERBOSITY {
            return Err(PluginError::InvalidVerbosity { count: verbosity });
        }

        let timeout = match self.registry.value("timeout")? {
            None => DEFAULT_TIMEOUT,
            Some(value) => {
                let raw = value.to_string();
                let seconds = raw
                    .parse::<u64>()
                    .map_err(|_| PluginError::InvalidTimeout { raw: raw.clone() })?;
                Duration::from_secs(seconds)
            }
        };

        let hostname = self.registry.value("hostname")?.map(ToString::to_string);

        let warning = match self.registry.value("warning")? {
            Some(value) => Some(thresholds_from_value(value)?),
            None => self.check.default_warning(),
        };
        let critical = match self.registry.value("critical")? {
            Some(value) => Some(thresholds_from_value(value)?),
            None => self.check.default_critical(),
        };

        self.settings = Some(ResolvedSettings {
            verbosity,
            hostname,
            timeout,
            warning,
            critical,
        });

        Ok(())
    }

    fn help_text(&self) -> String {
        let mut out = format!(
            "{} {}\n\nUsage: {} [OPTIONS]\n\nOptions:\n",
            self.check.name(),
            self.check.version(),
            self.check.name()
        );
        for option in self.registry.options() {
            let long = option
                .long_name()
                .map(|name| format!(", --{}", name))
                .unwrap_or_default();
            out.push_str(&format!(
                "  -{}{}\n        {}\n",
                option.short_name(),
                long,
                option.description()
            ));
        }
        out
    }

    fn version_text(&self) -> String {
        format!("{} {}", self.check.name(), self.check.version())
    }
}

/// Normalizes a flag value into threshold tokens: repeated-flag lists are
/// flattened first, then every element splits on commas.
fn thresholds_from_value(value: &OptionValue) -> Result<ThresholdList, ThresholdError> {
    fn collect(value: &OptionValue, out: &mut Vec<String>) {
        match value {
            OptionValue::List(values) => {
                for value in values {
                    collect(value, out);
                }
            }
            other => out.extend(other.to_string().split(',').map(str::to_owned)),
        }
    }

    let mut tokens = Vec::new();
    collect(value, &mut tokens);
    ThresholdList::from_tokens(tokens)
}
