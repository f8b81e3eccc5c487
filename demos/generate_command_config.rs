use std::error::Error;

use checkplugin::{
    print_icinga_command_config_if_env_and_exit, CheckContext, CheckOutcome, CheckPlugin,
    Diagnostic, OptionError, OptionMode, OptionRegistry, Plugin, Response, ServiceState,
    TextResponse,
};

// Usage: GENERATE_ICINGA_COMMAND=1 cargo run --example generate_command_config

struct PingCheck;

impl CheckPlugin for PingCheck {
    fn name(&self) -> &str {
        "check-fake-ping"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn register_options(&self, registry: &mut OptionRegistry) -> Result<(), OptionError> {
        registry.register(
            'p',
            "number of packets to send",
            OptionMode::RequireValue,
            Some("packets"),
        )
    }

    fn check(
        &mut self,
        context: &CheckContext<'_>,
    ) -> Result<CheckOutcome, Box<dyn Error + Send + Sync>> {
        let status = match context.hostname() {
            Some(host) => format!("{} is reachable", host),
            None => "no hostname given".to_owned(),
        };
        Ok(CheckOutcome::new(ServiceState::Ok, Diagnostic::new(status)))
    }
}

fn main() {
    let mut plugin = Plugin::new(PingCheck).expect("option registration");
    print_icinga_command_config_if_env_and_exit("fake-ping", plugin.registry())
        .expect("command config generation");

    match plugin.run(std::env::args().skip(1)) {
        Ok(response) => response.execute(),
        Err(err) => Response::from(TextResponse::new(
            format!("UNKNOWN: {}", err),
            ServiceState::Unknown,
        ))
        .execute(),
    }
}
