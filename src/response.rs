//! The final answer of a plugin invocation: some text and an exit status,
//! either as a bare text response or rendered from a diagnostic in the
//! poller wire format. The exit status is fixed at construction.

use std::process;

use crate::diagnostic::Diagnostic;
use crate::ServiceState;

/// A bare text response, used for `--help` and `--version` output and for
/// fatal errors reported before a check could run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextResponse {
    body: String,
    state: ServiceState,
}

impl TextResponse {
    pub fn new(body: impl Into<String>, state: ServiceState) -> Self {
        Self {
            body: body.into(),
            state,
        }
    }

    pub fn serialize(&self) -> String {
        if self.body.ends_with('\n') {
            self.body.clone()
        } else {
            format!("{}\n", self.body)
        }
    }

    pub fn exit_status(&self) -> i32 {
        self.state.exit_code()
    }
}

/// A response rendered from a [ServiceState] and a [Diagnostic] in the
/// poller wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct NagiosResponse {
    state: ServiceState,
    diagnostic: Diagnostic,
}

impl NagiosResponse {
    pub fn new(state: ServiceState, diagnostic: Diagnostic) -> Self {
        Self { state, diagnostic }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    pub fn serialize(&self) -> String {
        self.diagnostic.to_poller_text()
    }

    pub fn exit_status(&self) -> i32 {
        self.state.exit_code()
    }
}

/// Either kind of response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Text(TextResponse),
    Nagios(NagiosResponse),
}

impl Response {
    pub fn serialize(&self) -> String {
        match self {
            Response::Text(response) => response.serialize(),
            Response::Nagios(response) => response.serialize(),
        }
    }

    pub fn exit_status(&self) -> i32 {
        match self {
            Response::Text(response) => response.exit_status(),
            Response::Nagios(response) => response.exit_status(),
        }
    }

    /// Prints the serialized response and exits the process with the carried
    /// status code.
    pub fn execute(self) -> ! {
        print!("{}", self.serialize());
        process::exit(self.exit_status());
    }
}

impl From<TextResponse> for Response {
    fn from(response: TextResponse) -> Self {
        Response::Text(response)
    }
}

impl From<NagiosResponse> for Response {
    fn from(response: NagiosResponse) -> Self {
        Response::Nagios(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perfdata::PerformanceDataLine;

    #[test]
    fn test_text_response() {
        let response = Response::from(TextResponse::new("check-foo 0.3.0", ServiceState::Ok));
        assert_eq!(response.serialize(), "check-foo 0.3.0\n");
        assert_eq!(response.exit_status(), 0);

        let response = TextResponse::new("UNKNOWN: bad flag\n", ServiceState::Unknown);
        assert_eq!(response.serialize(), "UNKNOWN: bad flag\n");
        assert_eq!(response.exit_status(), 3);
    }

    #[test]
    fn test_nagios_response() {
        let mut diagnostic = Diagnostic::new("All good");
        diagnostic.push_line(
            PerformanceDataLine::new("latency", "12ms")
                .unwrap()
                .with_warning(50)
                .with_critical(100)
                .with_maximum(200),
        );

        let response = Response::from(NagiosResponse::new(ServiceState::Ok, diagnostic));
        assert_eq!(
            response.serialize(),
            "All good | 'latency'=12ms;50;100;0;200\n"
        );
        assert_eq!(response.exit_status(), 0);

        let response = NagiosResponse::new(ServiceState::Critical, Diagnostic::new("on fire"));
        assert_eq!(response.exit_status(), 2);
    }
}
