use std::env::args;

use checkplugin::{Diagnostic, NagiosResponse, Response, ServiceState};

// Usage: cargo run --example simple -- haaa
//        cargo run --example simple -- itsfine

fn main() {
    // Grab the first argument
    let arg = args().nth(1).unwrap_or_default();

    // Check logic goes here
    let (state, status) = match arg.as_ref() {
        "itsfine" => (ServiceState::Ok, "Everything is fine :-)"),
        "haaa" => (ServiceState::Critical, "Something went terribly wrong!"),
        _ => (ServiceState::Unknown, "expected 'itsfine' or 'haaa'"),
    };

    // print the status line and exit with the matching exit code
    Response::from(NagiosResponse::new(state, Diagnostic::new(status))).execute()
}
