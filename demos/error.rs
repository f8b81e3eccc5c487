use anyhow::anyhow;

use checkplugin::{Response, Runner, ServiceState};

// Errors are reported through the unknown state by default. Use on_error to
// map them to another state, e.g. critical for a failed probe.

fn main() {
    Runner::new()
        .on_error(|e: &anyhow::Error| (ServiceState::Critical, e.to_string()))
        .safe_run(do_check)
        .print_and_exit()
}

// This example uses anyhow
fn do_check() -> Result<Response, anyhow::Error> {
    // Do something which returns an error.
    Err(anyhow!("something really bad happened"))
}
