use std::error::Error;

use checkplugin::{
    CheckContext, CheckOutcome, CheckPlugin, Diagnostic, PerformanceDataLine, Plugin,
    ThresholdList,
};

// Usage: cargo run --example thresholds -- -w 30 -c 50
//        cargo run --example thresholds -- -w 10,80% -v
//        cargo run --example thresholds -- --help

struct LoadCheck;

impl CheckPlugin for LoadCheck {
    fn name(&self) -> &str {
        "check-fake-load"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn default_warning(&self) -> Option<ThresholdList> {
        ThresholdList::parse("70").ok()
    }

    fn default_critical(&self) -> Option<ThresholdList> {
        ThresholdList::parse("90").ok()
    }

    fn check(
        &mut self,
        context: &CheckContext<'_>,
    ) -> Result<CheckOutcome, Box<dyn Error + Send + Sync>> {
        // A real plugin would probe something here, bounded by
        // context.timeout(). We pretend we measured a load of 42.
        let load = 42.0;

        let state = context.evaluate(load);
        let mut diagnostic = Diagnostic::new(format!("load is {}", load));
        diagnostic.push_line(
            PerformanceDataLine::new("load", "42")?
                .with_warning(70)
                .with_critical(90),
        );

        if context.verbosity() > 0 {
            diagnostic = diagnostic.with_long_output("measurement is a static demo value");
        }

        Ok(CheckOutcome::new(state, diagnostic))
    }
}

fn main() {
    Plugin::execute(LoadCheck)
}
