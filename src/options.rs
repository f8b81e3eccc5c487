//! The command line option model: short and long POSIX style flags with
//! three value modes, owned by a per-invocation registry.
//!
//! Flags without a value accumulate an occurrence count, so `-vvv` and
//! `-v --verbose -v` both resolve to a count of three. Flags with a value
//! keep the raw string, coerced to a number where it looks like one, and
//! collect into a list when the flag is repeated.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static SINGLE_DIGIT_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d$").unwrap());
static SINGLE_DIGIT_FLOAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\.\d$").unwrap());

/// How a flag treats its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMode {
    /// The flag takes no value; occurrences are counted.
    NoValue,
    /// The flag requires a value, attached (`-w10:20`, `--warning=10:20`) or
    /// as the following argument.
    RequireValue,
    /// The flag may carry a value, but only in attached form.
    OptionalValue,
}

/// A parsed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Occurrence count of a flag without a value.
    Count(u32),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Values of a repeated flag, each coerced on its own.
    List(Vec<OptionValue>),
}

impl OptionValue {
    /// Coerces a raw string value: a single digit becomes an integer, a
    /// digit-dot-digit form becomes a float, everything else stays text.
    fn coerce(raw: &str) -> OptionValue {
        if SINGLE_DIGIT_INT.is_match(raw) {
            if let Ok(value) = raw.parse::<i64>() {
                return OptionValue::Integer(value);
            }
        }
        if SINGLE_DIGIT_FLOAT.is_match(raw) {
            if let Ok(value) = raw.parse::<f64>() {
                return OptionValue::Float(value);
            }
        }
        OptionValue::Text(raw.to_owned())
    }

    /// The occurrence count of a counted flag, if this is one.
    pub fn count(&self) -> Option<u32> {
        match self {
            OptionValue::Count(count) => Some(*count),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Count(count) => write!(f, "{}", count),
            OptionValue::Integer(value) => write!(f, "{}", value),
            OptionValue::Float(value) => write!(f, "{}", value),
            OptionValue::Text(value) => f.write_str(value),
            OptionValue::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", value)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("duplicate option: {name}")]
    DuplicateOption { name: String },
    #[error("unknown option: {name}")]
    UnknownOption { name: String },
    #[error("unrecognized flag: {flag}")]
    UnrecognizedFlag { flag: String },
    #[error("missing value for flag: {flag}")]
    MissingValue { flag: String },
    #[error("flag does not take a value: {flag}")]
    UnexpectedValue { flag: String },
}

/// A single registered command line option. The short name is fixed at
/// registration and the parsed value appears after [OptionRegistry::parse].
#[derive(Debug, Clone)]
pub struct PluginOption {
    short: char,
    long: Option<String>,
    mode: OptionMode,
    description: String,
    value: Option<OptionValue>,
}

impl PluginOption {
    pub fn short_name(&self) -> char {
        self.short
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn mode(&self) -> OptionMode {
        self.mode
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The parsed value, or None if the flag was not supplied.
    pub fn value(&self) -> Option<&OptionValue> {
        self.value.as_ref()
    }
}

/// The option registry of a single plugin invocation. Long names resolve
/// through an alias map owned by the registry.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    options: Vec<PluginOption>,
    aliases: HashMap<String, char>,
    operands: Vec<String>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an option. An empty long name means the option has no long
    /// form. Registering a short or long name twice is an error.
    pub fn register(
        &mut self,
        short: char,
        description: &str,
        mode: OptionMode,
        long: Option<&str>,
    ) -> Result<(), OptionError> {
        if self.options.iter().any(|option| option.short == short) {
            return Err(OptionError::DuplicateOption {
                name: short.to_string(),
            });
        }

        let long = long.filter(|name| !name.is_empty());
        if let Some(name) = long {
            if self.aliases.contains_key(name) {
                return Err(OptionError::DuplicateOption {
                    name: name.to_owned(),
                });
            }
            self.aliases.insert(name.to_owned(), short);
        }

        self.options.push(PluginOption {
            short,
            long: long.map(str::to_owned),
            mode,
            description: description.to_owned(),
            value: None,
        });

        Ok(())
    }

    /// Parses the given arguments (without the program name) with POSIX
    /// getopt semantics and stores the coerced values on the registered
    /// options. Arguments after `--` and everything that is not a flag
    /// collect as operands.
    pub fn parse<I, S>(&mut self, args: I) -> Result<(), OptionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut observed: Vec<(char, Option<String>)> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].clone();

            if arg == "--" {
                self.operands.extend(args[i + 1..].iter().cloned());
                break;
            }

            if let Some(long_part) = arg.strip_prefix("--") {
                let (name, attached) = match long_part.split_once('=') {
                    Some((name, value)) => (name, Some(value.to_owned())),
                    None => (long_part, None),
                };
                let short =
                    *self
                        .aliases
                        .get(name)
                        .ok_or_else(|| OptionError::UnrecognizedFlag {
                            flag: arg.clone(),
                        })?;

                match self.mode_of(short)? {
                    OptionMode::NoValue => {
                        if attached.is_some() {
                            return Err(OptionError::UnexpectedValue { flag: arg });
                        }
                        observed.push((short, None));
                    }
                    OptionMode::RequireValue => {
                        let value = match attached {
                            Some(value) => value,
                            None => {
                                i += 1;
                                args.get(i)
                                    .cloned()
                                    .ok_or(OptionError::MissingValue { flag: arg })?
                            }
                        };
                        observed.push((short, Some(value)));
                    }
                    OptionMode::OptionalValue => observed.push((short, attached)),
                }
            } else if arg.len() > 1 && arg.starts_with('-') {
                let cluster: Vec<char> = arg[1..].chars().collect();
                let mut j = 0;
                while j < cluster.len() {
                    let short = cluster[j];
                    let flag = format!("-{}", short);
                    let mode = self
                        .mode_of(short)
                        .map_err(|_| OptionError::UnrecognizedFlag { flag: flag.clone() })?;

                    match mode {
                        OptionMode::NoValue => {
                            observed.push((short, None));
                            j += 1;
                        }
                        OptionMode::RequireValue => {
                            let rest: String = cluster[j + 1..].iter().collect();
                            let value = if rest.is_empty() {
                                i += 1;
                                args.get(i)
                                    .cloned()
                                    .ok_or(OptionError::MissingValue { flag })?
                            } else {
                                rest
                            };
                            observed.push((short, Some(value)));
                            break;
                        }
                        OptionMode::OptionalValue => {
                            let rest: String = cluster[j + 1..].iter().collect();
                            let value = if rest.is_empty() { None } else { Some(rest) };
                            observed.push((short, value));
                            break;
                        }
                    }
                }
            } else {
                self.operands.push(arg);
            }

            i += 1;
        }

        for option in &mut self.options {
            let occurrences: Vec<&Option<String>> = observed
                .iter()
                .filter(|(short, _)| *short == option.short)
                .map(|(_, value)| value)
                .collect();
            if occurrences.is_empty() {
                continue;
            }

            let raws: Vec<&String> = occurrences.iter().filter_map(|value| value.as_ref()).collect();
            option.value = Some(match option.mode {
                OptionMode::NoValue => OptionValue::Count(occurrences.len() as u32),
                _ if raws.is_empty() => OptionValue::Count(occurrences.len() as u32),
                _ if raws.len() == 1 => OptionValue::coerce(raws[0]),
                _ => OptionValue::List(raws.iter().map(|raw| OptionValue::coerce(raw)).collect()),
            });
        }

        Ok(())
    }

    /// Looks up an option by long name (through the alias map) or by short
    /// name. Unregistered names are an error, never a silent default.
    pub fn get(&self, name: &str) -> Result<&PluginOption, OptionError> {
        let short = self.aliases.get(name).copied().or_else(|| {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(short), None) => Some(short),
                _ => None,
            }
        });

        short
            .and_then(|short| self.options.iter().find(|option| option.short == short))
            .ok_or_else(|| OptionError::UnknownOption {
                name: name.to_owned(),
            })
    }

    /// The parsed value of an option, or None if the flag was not supplied.
    pub fn value(&self, name: &str) -> Result<Option<&OptionValue>, OptionError> {
        Ok(self.get(name)?.value())
    }

    /// All registered options in registration order.
    pub fn options(&self) -> &[PluginOption] {
        &self.options
    }

    /// Positional arguments left over after flag parsing.
    pub fn operands(&self) -> &[String] {
        &self.operands
    }

    fn mode_of(&self, short: char) -> Result<OptionMode, OptionError> {
        self.options
            .iter()
            .find(|option| option.short == short)
            .map(|option| option.mode)
            .ok_or_else(|| OptionError::UnknownOption {
                name: short.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_registry() -> OptionRegistry {
        let mut registry = OptionRegistry::new();
        registry
            .register('v', "verbosity", OptionMode::NoValue, Some("verbose"))
            .unwrap();
        registry
            .register('w', "warning threshold", OptionMode::RequireValue, Some("warning"))
            .unwrap();
        registry
            .register('o', "optional extra", OptionMode::OptionalValue, Some("extra"))
            .unwrap();
        registry
    }

    #[test]
    fn test_register_duplicates() {
        let mut registry = make_registry();
        assert_eq!(
            registry.register('v', "again", OptionMode::NoValue, None),
            Err(OptionError::DuplicateOption {
                name: "v".to_owned()
            })
        );
        assert_eq!(
            registry.register('x', "again", OptionMode::NoValue, Some("warning")),
            Err(OptionError::DuplicateOption {
                name: "warning".to_owned()
            })
        );

        // An empty long name means there is no long form to collide on.
        registry
            .register('y', "no long name", OptionMode::NoValue, Some(""))
            .unwrap();
        registry
            .register('z', "no long name either", OptionMode::NoValue, Some(""))
            .unwrap();
    }

    #[test]
    fn test_occurrence_counting() {
        let mut registry = make_registry();
        registry.parse(["-vvv"]).unwrap();
        assert_eq!(
            registry.value("verbose").unwrap(),
            Some(&OptionValue::Count(3))
        );

        let mut registry = make_registry();
        registry.parse(["-v", "--verbose"]).unwrap();
        assert_eq!(
            registry.value("v").unwrap(),
            Some(&OptionValue::Count(2))
        );
    }

    #[test]
    fn test_value_forms() {
        for args in [
            vec!["-w", "10:20"],
            vec!["-w10:20"],
            vec!["--warning", "10:20"],
            vec!["--warning=10:20"],
        ] {
            let mut registry = make_registry();
            registry.parse(args.clone()).unwrap();
            assert_eq!(
                registry.value("warning").unwrap(),
                Some(&OptionValue::Text("10:20".to_owned())),
                "args {:?}",
                args
            );
        }
    }

    #[test]
    fn test_value_coercion() {
        let test_data = [
            ("5", OptionValue::Integer(5)),
            ("1.5", OptionValue::Float(1.5)),
            ("10", OptionValue::Text("10".to_owned())),
            ("0.55", OptionValue::Text("0.55".to_owned())),
            ("10:20", OptionValue::Text("10:20".to_owned())),
        ];

        for (raw, expected) in test_data {
            let mut registry = make_registry();
            registry.parse(["-w", raw]).unwrap();
            assert_eq!(registry.value("w").unwrap(), Some(&expected), "raw {}", raw);
        }
    }

    #[test]
    fn test_repeated_value_flag_collects_list() {
        let mut registry = make_registry();
        registry.parse(["-w", "10:20", "--warning=5"]).unwrap();
        assert_eq!(
            registry.value("warning").unwrap(),
            Some(&OptionValue::List(vec![
                OptionValue::Text("10:20".to_owned()),
                OptionValue::Integer(5),
            ]))
        );
    }

    #[test]
    fn test_optional_value() {
        let mut registry = make_registry();
        registry.parse(["-oextra-value"]).unwrap();
        assert_eq!(
            registry.value("extra").unwrap(),
            Some(&OptionValue::Text("extra-value".to_owned()))
        );

        // Without an attached value the following argument is an operand and
        // the occurrence is only counted.
        let mut registry = make_registry();
        registry.parse(["-o", "not-the-value"]).unwrap();
        assert_eq!(
            registry.value("extra").unwrap(),
            Some(&OptionValue::Count(1))
        );
        assert_eq!(registry.operands(), &["not-the-value".to_owned()]);
    }

    #[test]
    fn test_parse_errors() {
        let mut registry = make_registry();
        assert_eq!(
            registry.parse(["-x"]),
            Err(OptionError::UnrecognizedFlag {
                flag: "-x".to_owned()
            })
        );

        let mut registry = make_registry();
        assert_eq!(
            registry.parse(["--nope"]),
            Err(OptionError::UnrecognizedFlag {
                flag: "--nope".to_owned()
            })
        );

        let mut registry = make_registry();
        assert_eq!(
            registry.parse(["-w"]),
            Err(OptionError::MissingValue {
                flag: "-w".to_owned()
            })
        );

        let mut registry = make_registry();
        assert_eq!(
            registry.parse(["--verbose=3"]),
            Err(OptionError::UnexpectedValue {
                flag: "--verbose=3".to_owned()
            })
        );
    }

    #[test]
    fn test_operands_and_terminator() {
        let mut registry = make_registry();
        registry
            .parse(["host-a", "-v", "--", "-w", "raw"])
            .unwrap();
        assert_eq!(
            registry.operands(),
            &["host-a".to_owned(), "-w".to_owned(), "raw".to_owned()]
        );
        assert_eq!(registry.value("v").unwrap(), Some(&OptionValue::Count(1)));
        assert_eq!(registry.value("warning").unwrap(), None);
    }

    #[test]
    fn test_cluster_with_trailing_value_flag() {
        let mut registry = make_registry();
        registry.parse(["-vvw", "10:20"]).unwrap();
        assert_eq!(registry.value("v").unwrap(), Some(&OptionValue::Count(2)));
        assert_eq!(
            registry.value("w").unwrap(),
            Some(&OptionValue::Text("10:20".to_owned()))
        );
    }

    #[test]
    fn test_get_unknown_option() {
        let registry = make_registry();
        assert!(matches!(
            registry.get("nope"),
            Err(OptionError::UnknownOption { .. })
        ));
        assert!(matches!(
            registry.get("q"),
            Err(OptionError::UnknownOption { .. })
        ));
        assert_eq!(registry.get("warning").unwrap().short_name(), 'w');
        assert_eq!(registry.get("w").unwrap().long_name(), Some("warning"));
    }

    #[test]
    fn test_display() {
        assert_eq!(OptionValue::Count(3).to_string(), "3");
        assert_eq!(OptionValue::Integer(5).to_string(), "5");
        assert_eq!(OptionValue::Float(1.5).to_string(), "1.5");
        assert_eq!(OptionValue::Text("10:20".to_owned()).to_string(), "10:20");
        assert_eq!(
            OptionValue::List(vec![
                OptionValue::Text("10".to_owned()),
                OptionValue::Text("20%".to_owned())
            ])
            .to_string(),
            "10,20%"
        );
    }
}
