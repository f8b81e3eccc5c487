//! Warning and critical thresholds in the two grammars understood by classic
//! monitoring plugins.
//!
//! A percentage threshold like `80%` is met by any value above it. A range
//! threshold describes the interval of acceptable values: `10:20` alerts for
//! values outside of 10..=20, `5` is shorthand for `0:5`, `5:` leaves the
//! upper end open and `~:5` leaves the lower end open. A leading `@` inverts
//! the semantics so that values *inside* the range alert.

use once_cell::sync::Lazy;
use regex::Regex;

static PERCENTAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(100|[0-9]{1,2})%$").unwrap());

static RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@?(~|\d+)(:(\d+)?)?$").unwrap());

/// Returned when a threshold token matches neither the percentage nor the
/// range grammar.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid threshold: {token:?}")]
pub struct ThresholdError {
    pub token: String,
}

/// A single parsed threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Threshold {
    /// Met by values above the given percentage.
    Percentage { percentage: u8 },
    /// Met by values outside the range, or inside it when `inclusive` is set.
    /// An absent bound leaves that side of the range open.
    Range {
        start: Option<i64>,
        end: Option<i64>,
        inclusive: bool,
    },
}

impl Threshold {
    /// Parses a single threshold token. The percentage grammar is tried
    /// first, then the range grammar.
    pub fn parse(token: &str) -> Result<Self, ThresholdError> {
        let invalid = || ThresholdError {
            token: token.to_owned(),
        };

        if let Some(captures) = PERCENTAGE_PATTERN.captures(token) {
            let percentage = captures[1].parse::<u8>().map_err(|_| invalid())?;
            return Ok(Threshold::Percentage { percentage });
        }

        let captures = RANGE_PATTERN.captures(token).ok_or_else(invalid)?;
        let inclusive = token.starts_with('@');

        let start = match &captures[1] {
            "~" => None,
            digits => Some(digits.parse::<i64>().map_err(|_| invalid())?),
        };
        let end = match captures.get(3) {
            Some(digits) => Some(digits.as_str().parse::<i64>().map_err(|_| invalid())?),
            None => None,
        };

        if captures.get(2).is_none() {
            // A bare number is shorthand for the range from zero to it. A
            // bare `~` stays fully unbounded.
            return Ok(Threshold::Range {
                start: start.map(|_| 0),
                end: start,
                inclusive,
            });
        }

        Ok(Threshold::Range {
            start,
            end,
            inclusive,
        })
    }

    /// Returns true if the token matches one of the two threshold grammars.
    pub fn is_valid(token: &str) -> bool {
        PERCENTAGE_PATTERN.is_match(token) || RANGE_PATTERN.is_match(token)
    }

    /// Returns true if the given value triggers an alert for this threshold.
    pub fn meets(&self, value: f64) -> bool {
        match self {
            Threshold::Percentage { percentage } => value > f64::from(*percentage),
            Threshold::Range {
                start,
                end,
                inclusive: false,
            } => {
                start.map_or(false, |start| value < start as f64)
                    || end.map_or(false, |end| value > end as f64)
            }
            Threshold::Range {
                start,
                end,
                inclusive: true,
            } => {
                start.map_or(true, |start| value >= start as f64)
                    && end.map_or(true, |end| value <= end as f64)
            }
        }
    }

    /// The numeric summary of this threshold: the percentage, or the closing
    /// bound of a range (falling back to the opening bound, then zero).
    pub fn threshold_value(&self) -> f64 {
        match self {
            Threshold::Percentage { percentage } => f64::from(*percentage),
            Threshold::Range { start, end, .. } => end.or(*start).unwrap_or(0) as f64,
        }
    }
}

/// An ordered list of thresholds as given in a comma separated flag value.
/// An alert fires if any member is met.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThresholdList {
    thresholds: Vec<Threshold>,
}

impl ThresholdList {
    /// Parses a comma separated list of threshold tokens.
    pub fn parse(raw: &str) -> Result<Self, ThresholdError> {
        Self::from_tokens(raw.split(','))
    }

    /// Parses a list of already separated threshold tokens, preserving order.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, ThresholdError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let thresholds = tokens
            .into_iter()
            .map(|token| Threshold::parse(token.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { thresholds })
    }

    /// Returns true if any threshold in the list is met by the given value.
    pub fn is_met(&self, value: f64) -> bool {
        self.thresholds.iter().any(|threshold| threshold.meets(value))
    }

    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

impl From<Vec<Threshold>> for ThresholdList {
    fn from(thresholds: Vec<Threshold>) -> Self {
        Self { thresholds }
    }
}
