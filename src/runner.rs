//! Error trapping around a check body: instead of crashing with an
//! unrelated exit code, a failed check reports through a service state.

use std::fmt::Display;

use crate::response::Response;
use crate::ServiceState;

/// Runs a fallible check body and converts an error into a (state, message)
/// exit. By default errors report as unknown; use [Runner::on_error] to map
/// them differently, e.g. to critical for a failed probe.
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> (ServiceState, String)>>,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    pub fn on_error(mut self, f: impl FnOnce(&E) -> (ServiceState, String) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Runs the closure. On error the `on_error` handler (or the unknown
    /// state default) decides the ([ServiceState], message) to exit with.
    pub fn safe_run(self, f: impl FnOnce() -> Result<Response, E>) -> RunnerResult {
        match f() {
            Ok(response) => RunnerResult::Response(response),
            Err(err) => {
                let (state, message) = match self.on_error {
                    Some(handler) => handler(&err),
                    None => (ServiceState::Unknown, err.to_string()),
                };
                RunnerResult::Error(state, message)
            }
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// The outcome of [Runner::safe_run], ready to be printed and exited with.
pub enum RunnerResult {
    Response(Response),
    Error(ServiceState, String),
}

impl RunnerResult {
    pub fn print_and_exit(self) -> ! {
        match self {
            RunnerResult::Response(response) => response.execute(),
            RunnerResult::Error(state, message) => {
                println!("{}: {}", state, message);
                std::process::exit(state.exit_code());
            }
        }
    }
}

/// Runs the given closure and converts an error into the given state after
/// printing out the error message.
pub fn safe_run<E: Display>(
    f: impl FnOnce() -> Result<Response, E>,
    error_state: ServiceState,
) -> RunnerResult {
    Runner::new()
        .on_error(move |err: &E| (error_state, err.to_string()))
        .safe_run(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Diagnostic;
    use crate::response::NagiosResponse;

    #[derive(Debug, thiserror::Error)]
    #[error("woops")]
    struct EmptyError;

    fn ok_response() -> Response {
        NagiosResponse::new(ServiceState::Ok, Diagnostic::new("fine")).into()
    }

    #[test]
    fn test_runner_ok() {
        let result = Runner::<EmptyError>::new()
            .on_error(|_| {
                panic!("on_error must not run for an ok result");
            })
            .safe_run(|| Ok(ok_response()));

        assert!(matches!(result, RunnerResult::Response(_)));
    }

    #[test]
    fn test_runner_error_defaults_to_unknown() {
        let result = Runner::new().safe_run(|| Err(EmptyError));

        match result {
            RunnerResult::Error(state, message) => {
                assert_eq!(state, ServiceState::Unknown);
                assert_eq!(message, "woops");
            }
            RunnerResult::Response(_) => panic!("expected an error result"),
        }
    }

    #[test]
    fn test_safe_run_with_state() {
        let result = safe_run(|| Err(EmptyError), ServiceState::Critical);

        match result {
            RunnerResult::Error(state, _) => assert_eq!(state, ServiceState::Critical),
            RunnerResult::Response(_) => panic!("expected an error result"),
        }
    }
}
