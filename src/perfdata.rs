//! Performance data lines and their wire serialization.
//!
//! Every line serializes to the token
//! `'<label>'=<value><uom>;<warning|null>;<critical|null>;<min>;<max>` and the
//! collection renders with the first line inline next to the status summary.
//! The format is parsed by the poller, so it is preserved byte for byte.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static VALUE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(U|-?\d+(?:\.\d+)?)(s|us|ms|%|KB|MB|TB|c)?$").unwrap());

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PerfDataError {
    #[error("performance data label must not contain '=': {label:?}")]
    InvalidLabel { label: String },
    #[error("invalid performance data value: {raw:?}")]
    InvalidValue { raw: String },
}

/// The unit of measurement of a performance data value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    None,
    Seconds,
    Microseconds,
    Milliseconds,
    Percentage,
    Kilobytes,
    Megabytes,
    Terabytes,
    Counter,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Seconds => "s",
            Unit::Microseconds => "us",
            Unit::Milliseconds => "ms",
            Unit::Percentage => "%",
            Unit::Kilobytes => "KB",
            Unit::Megabytes => "MB",
            Unit::Terabytes => "TB",
            Unit::Counter => "c",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Unit> {
        match suffix {
            "s" => Some(Unit::Seconds),
            "us" => Some(Unit::Microseconds),
            "ms" => Some(Unit::Milliseconds),
            "%" => Some(Unit::Percentage),
            "KB" => Some(Unit::Kilobytes),
            "MB" => Some(Unit::Megabytes),
            "TB" => Some(Unit::Terabytes),
            "c" => Some(Unit::Counter),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A number that remembers whether it was written as an integer or a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfNumber {
    Integer(i64),
    Float(f64),
}

impl PerfNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            PerfNumber::Integer(value) => *value as f64,
            PerfNumber::Float(value) => *value,
        }
    }

    fn parse(raw: &str) -> Option<PerfNumber> {
        if raw.contains('.') {
            raw.parse().ok().map(PerfNumber::Float)
        } else {
            raw.parse().ok().map(PerfNumber::Integer)
        }
    }
}

impl fmt::Display for PerfNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerfNumber::Integer(value) => write!(f, "{}", value),
            PerfNumber::Float(value) => write!(f, "{}", value),
        }
    }
}

impl From<i32> for PerfNumber {
    fn from(value: i32) -> Self {
        PerfNumber::Integer(i64::from(value))
    }
}

impl From<i64> for PerfNumber {
    fn from(value: i64) -> Self {
        PerfNumber::Integer(value)
    }
}

impl From<f64> for PerfNumber {
    fn from(value: f64) -> Self {
        PerfNumber::Float(value)
    }
}

/// A measured value: a number, or `U` when the plugin could not measure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfValue {
    Number(PerfNumber),
    Unknown,
}

impl fmt::Display for PerfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerfValue::Number(number) => write!(f, "{}", number),
            PerfValue::Unknown => f.write_str("U"),
        }
    }
}

impl From<PerfNumber> for PerfValue {
    fn from(number: PerfNumber) -> Self {
        PerfValue::Number(number)
    }
}

impl From<i64> for PerfValue {
    fn from(value: i64) -> Self {
        PerfValue::Number(PerfNumber::Integer(value))
    }
}

impl From<i32> for PerfValue {
    fn from(value: i32) -> Self {
        PerfValue::Number(PerfNumber::Integer(i64::from(value)))
    }
}

impl From<f64> for PerfValue {
    fn from(value: f64) -> Self {
        PerfValue::Number(PerfNumber::Float(value))
    }
}

/// A single performance data line.
///
/// The warning and critical markers render as the literal `null` when unset.
/// Minimum and maximum default to 0 and 100; percentage values are
/// self-bounded, so their bounds render as `U`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceDataLine {
    label: String,
    value: PerfValue,
    unit: Unit,
    warning: Option<PerfNumber>,
    critical: Option<PerfNumber>,
    minimum: Option<PerfNumber>,
    maximum: Option<PerfNumber>,
}

impl PerformanceDataLine {
    /// Creates a line from a label and a combined value+unit string such as
    /// `"12ms"`, `"42%"`, `"0.5"` or `"U"`. Anything that does not strictly
    /// match that form is rejected.
    pub fn new(label: &str, raw_value: &str) -> Result<Self, PerfDataError> {
        let captures =
            VALUE_PATTERN
                .captures(raw_value)
                .ok_or_else(|| PerfDataError::InvalidValue {
                    raw: raw_value.to_owned(),
                })?;

        let value = match &captures[1] {
            "U" => PerfValue::Unknown,
            raw => PerfValue::Number(PerfNumber::parse(raw).ok_or_else(|| {
                PerfDataError::InvalidValue {
                    raw: raw_value.to_owned(),
                }
            })?),
        };
        let unit = captures
            .get(2)
            .and_then(|suffix| Unit::from_suffix(suffix.as_str()))
            .unwrap_or_default();

        Self::from_parts(label, value, unit)
    }

    /// Creates a line from already typed parts.
    pub fn from_parts(label: &str, value: PerfValue, unit: Unit) -> Result<Self, PerfDataError> {
        if label.contains('=') {
            return Err(PerfDataError::InvalidLabel {
                label: label.to_owned(),
            });
        }

        Ok(Self {
            label: label.to_owned(),
            value,
            unit,
            warning: None,
            critical: None,
            minimum: Some(PerfNumber::Integer(0)),
            maximum: Some(PerfNumber::Integer(100)),
        })
    }

    pub fn with_warning(mut self, warning: impl Into<PerfNumber>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn with_critical(mut self, critical: impl Into<PerfNumber>) -> Self {
        self.critical = Some(critical.into());
        self
    }

    pub fn with_minimum(mut self, minimum: impl Into<PerfNumber>) -> Self {
        self.minimum = Some(minimum.into());
        self
    }

    pub fn with_maximum(mut self, maximum: impl Into<PerfNumber>) -> Self {
        self.maximum = Some(maximum.into());
        self
    }

    /// Drops the default bounds so they render as `U`.
    pub fn without_bounds(mut self) -> Self {
        self.minimum = None;
        self.maximum = None;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &PerfValue {
        &self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Serializes the line to its wire token. Single quotes in the label are
    /// doubled.
    pub fn to_text(&self) -> String {
        let label = self.label.replace('\'', "''");
        let marker = |marker: &Option<PerfNumber>| match marker {
            Some(number) => number.to_string(),
            None => "null".to_owned(),
        };
        let bound = |bound: &Option<PerfNumber>| match (self.unit, bound) {
            (Unit::Percentage, _) | (_, None) => "U".to_owned(),
            (_, Some(number)) => number.to_string(),
        };

        format!(
            "'{}'={}{};{};{};{};{}",
            label,
            self.value,
            self.unit,
            marker(&self.warning),
            marker(&self.critical),
            bound(&self.minimum),
            bound(&self.maximum),
        )
    }
}

/// An ordered collection of performance data lines. Insertion order is
/// significant: the first line is the primary metric and renders inline with
/// the status summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceData {
    lines: Vec<PerformanceDataLine>,
}

impl PerformanceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: PerformanceDataLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[PerformanceDataLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Renders the poller output: the status summary with the first line
    /// inline, the optional long output, then the remaining lines after a
    /// second `" | "` separator, each on its own line. An empty collection
    /// renders no pipe separator at all.
    pub fn render(&self, status: &str, long_output: Option<&str>) -> String {
        let mut out = String::new();

        match self.lines.split_first() {
            None => {
                out.push_str(status);
                out.push('\n');
            }
            Some((first, _)) => {
                out.push_str(status);
                out.push_str(" | ");
                out.push_str(&first.to_text());
                out.push('\n');
            }
        }

        if let Some(long_output) = long_output.filter(|text| !text.is_empty()) {
            out.push_str(long_output);
            out.push('\n');
        }

        if self.lines.len() > 1 {
            out.push_str(" | ");
            for line in &self.lines[1..] {
                out.push_str(&line.to_text());
                out.push('\n');
            }
        }

        out
    }
}

impl FromIterator<PerformanceDataLine> for PerformanceData {
    fn from_iter<I: IntoIterator<Item = PerformanceDataLine>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_defaults() {
        let line = PerformanceDataLine::new("load", "0.5").unwrap();
        assert_eq!(line.to_text(), "'load'=0.5;null;null;0;100");
    }

    #[test]
    fn test_percentage_bounds_are_unknown() {
        let line = PerformanceDataLine::new("cpu", "42%").unwrap();
        assert_eq!(line.unit(), Unit::Percentage);
        assert_eq!(line.to_text(), "'cpu'=42%;null;null;U;U");
    }

    #[test]
    fn test_label_quoting() {
        let line = PerformanceDataLine::new("o'brien", "1").unwrap();
        assert_eq!(line.to_text(), "'o''brien'=1;null;null;0;100");
    }

    #[test]
    fn test_label_rejects_equals() {
        assert_eq!(
            PerformanceDataLine::new("a=b", "1"),
            Err(PerfDataError::InvalidLabel {
                label: "a=b".to_owned()
            })
        );
    }

    #[test]
    fn test_markers_and_bounds() {
        let line = PerformanceDataLine::new("latency", "12ms")
            .unwrap()
            .with_warning(50)
            .with_critical(100)
            .with_maximum(200);
        assert_eq!(line.to_text(), "'latency'=12ms;50;100;0;200");

        let line = PerformanceDataLine::new("free", "17")
            .unwrap()
            .without_bounds();
        assert_eq!(line.to_text(), "'free'=17;null;null;U;U");
    }

    #[test]
    fn test_value_parsing() {
        let test_data = [
            ("12", PerfValue::Number(PerfNumber::Integer(12)), Unit::None),
            ("-3", PerfValue::Number(PerfNumber::Integer(-3)), Unit::None),
            (
                "0.5",
                PerfValue::Number(PerfNumber::Float(0.5)),
                Unit::None,
            ),
            (
                "12ms",
                PerfValue::Number(PerfNumber::Integer(12)),
                Unit::Milliseconds,
            ),
            (
                "3.5us",
                PerfValue::Number(PerfNumber::Float(3.5)),
                Unit::Microseconds,
            ),
            (
                "9TB",
                PerfValue::Number(PerfNumber::Integer(9)),
                Unit::Terabytes,
            ),
            ("7c", PerfValue::Number(PerfNumber::Integer(7)), Unit::Counter),
            ("U", PerfValue::Unknown, Unit::None),
        ];

        for (raw, value, unit) in test_data {
            let line = PerformanceDataLine::new("x", raw).unwrap();
            assert_eq!(line.value(), &value, "raw {}", raw);
            assert_eq!(line.unit(), unit, "raw {}", raw);
        }

        for raw in ["", "abc", "12MiB", "12 ms", "ms", "1,5", "0x10"] {
            assert_eq!(
                PerformanceDataLine::new("x", raw),
                Err(PerfDataError::InvalidValue {
                    raw: raw.to_owned()
                }),
                "raw {}",
                raw
            );
        }
    }

    #[test]
    fn test_render_layouts() {
        let empty = PerformanceData::new();
        assert_eq!(empty.render("All good", None), "All good\n");

        let single: PerformanceData = [PerformanceDataLine::new("load", "0.5").unwrap()]
            .into_iter()
            .collect();
        assert_eq!(
            single.render("All good", None),
            "All good | 'load'=0.5;null;null;0;100\n"
        );

        let several: PerformanceData = [
            PerformanceDataLine::new("load", "0.5").unwrap(),
            PerformanceDataLine::new("cpu", "42%").unwrap(),
            PerformanceDataLine::new("uptime", "12s").unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            several.render("All good", None),
            "All good | 'load'=0.5;null;null;0;100\n \
             | 'cpu'=42%;null;null;U;U\n'uptime'=12s;null;null;0;100\n"
        );

        assert_eq!(
            single.render("Degraded", Some("slow response from backend")),
            "Degraded | 'load'=0.5;null;null;0;100\nslow response from backend\n"
        );
    }
}
