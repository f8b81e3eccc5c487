//! The result of a check: a short status line, optional long output and the
//! collected performance data.

use crate::perfdata::{PerformanceData, PerformanceDataLine};

/// What a check found out about its service, ready to be rendered into a
/// poller response.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    service_status: String,
    long_service_output: String,
    performance_data: PerformanceData,
}

impl Diagnostic {
    /// Creates a diagnostic with the given one line status summary.
    pub fn new(service_status: impl Into<String>) -> Self {
        Self {
            service_status: service_status.into(),
            long_service_output: String::new(),
            performance_data: PerformanceData::new(),
        }
    }

    /// Sets the multi line verbose output shown below the status line.
    pub fn with_long_output(mut self, long_output: impl Into<String>) -> Self {
        self.long_service_output = long_output.into();
        self
    }

    pub fn with_performance_data(mut self, performance_data: PerformanceData) -> Self {
        self.performance_data = performance_data;
        self
    }

    pub fn push_line(&mut self, line: PerformanceDataLine) {
        self.performance_data.push(line);
    }

    pub fn service_status(&self) -> &str {
        &self.service_status
    }

    pub fn long_service_output(&self) -> &str {
        &self.long_service_output
    }

    pub fn performance_data(&self) -> &PerformanceData {
        &self.performance_data
    }

    /// Renders the full poller output for this diagnostic.
    pub fn to_poller_text(&self) -> String {
        self.performance_data
            .render(&self.service_status, Some(&self.long_service_output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_diagnostic() {
        let diagnostic = Diagnostic::new("All good");
        assert_eq!(diagnostic.to_poller_text(), "All good\n");
    }

    #[test]
    fn test_diagnostic_with_data_and_long_output() {
        let mut diagnostic =
            Diagnostic::new("Disk almost full").with_long_output("/var is at 93%");
        diagnostic.push_line(PerformanceDataLine::new("usage", "93%").unwrap());
        diagnostic.push_line(
            PerformanceDataLine::new("free", "12")
                .unwrap()
                .without_bounds(),
        );

        assert_eq!(
            diagnostic.to_poller_text(),
            "Disk almost full | 'usage'=93%;null;null;U;U\n\
             /var is at 93%\n \
             | 'free'=12;null;null;U;U\n"
        );
    }
}
