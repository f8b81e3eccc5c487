//! Renders a plugin's option registry as an Icinga2 CheckCommand object, so
//! the command definition never drifts from the options the binary accepts.

use crate::options::{OptionMode, OptionRegistry};

pub struct CommandDescription {
    arguments: Vec<ArgumentDescription>,
}

pub struct ArgumentDescription {
    name: String,
    value: String,
    description: Option<String>,
    is_flag: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ToIcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("error converting to command description: {0}")]
    CommandDescriptionFromError(#[from] CommandDescriptionFromError),
}

impl CommandDescription {
    pub fn to_icinga_command(&self, name: &str) -> Result<String, ToIcingaCommandError> {
        let mut out = format!("object CheckCommand \"{name}\" {{\n");
        let current_exe = std::env::current_exe()?
            .to_str()
            .ok_or(ToIcingaCommandError::InvalidExecutablePath)?
            .to_owned();

        out.push_str(&format!("  command = [ \"{current_exe}\" ]\n"));
        out.push_str("  arguments = {\n");
        for arg in &self.arguments {
            out.push_str(&format!("  \"{}\" = {{\n", arg.name));

            if arg.is_flag {
                out.push_str(&format!("    set_if = \"${}$\"\n", arg.value));
            } else {
                out.push_str(&format!("    value = \"${}$\"\n", arg.value));
            }

            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "    description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            out.push_str("  }\n");
        }

        out.push_str("  }\n");
        out.push_str("}\n");
        Ok(out)
    }
}

fn escape_string(s: &str) -> String {
    ["\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{}", c)))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandDescriptionFromError {
    #[error("option -{0} has no long name")]
    MissingLongName(char),
}

impl TryFrom<&OptionRegistry> for CommandDescription {
    type Error = CommandDescriptionFromError;

    fn try_from(registry: &OptionRegistry) -> Result<Self, Self::Error> {
        let mut arguments = Vec::new();

        for option in registry.options() {
            let name = option
                .long_name()
                .ok_or(CommandDescriptionFromError::MissingLongName(
                    option.short_name(),
                ))?
                .to_owned();

            let value = name.replace('-', "_");
            let description =
                Some(option.description().to_owned()).filter(|text| !text.is_empty());
            let is_flag = option.mode() == OptionMode::NoValue;

            arguments.push(ArgumentDescription {
                name: format!("--{}", name),
                value,
                description,
                is_flag,
            });
        }

        Ok(CommandDescription { arguments })
    }
}

/// Print the Icinga command configuration if the GENERATE_ICINGA_COMMAND
/// environment variable is set and exit the process.
pub fn print_icinga_command_config_if_env_and_exit(
    name: &str,
    registry: &OptionRegistry,
) -> Result<(), ToIcingaCommandError> {
    if std::env::var("GENERATE_ICINGA_COMMAND").is_err() {
        return Ok(());
    }

    let description = CommandDescription::try_from(registry)?;
    let out = description.to_icinga_command(name)?;

    println!("{}", out.trim());
    std::process::exit(0);
}
