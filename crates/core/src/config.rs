// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement configuration.
//!
//! The configuration file lists the commands to measure, in order. Two YAML
//! shapes are accepted:
//!
//! ```yaml
//! commands:
//!   bundle: "du -k dist/app.js | cut -f1"
//!   startup: "./scripts/startup-ms.sh"
//! ```
//!
//! ```yaml
//! commands:
//!   - name: bundle
//!     command: "du -k dist/app.js | cut -f1"
//! ```

use crate::{Error, Result};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Configuration file looked up in the working directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "metrics.yml";

/// A named shell command whose standard output is a single number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Display name, unique within a configuration.
    pub name: String,
    /// Shell command line.
    pub command: String,
}

impl CommandSpec {
    /// Create a command spec.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }
}

/// Ordered set of measurement commands, validated for unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    commands: Vec<CommandSpec>,
}

impl Configuration {
    /// Build a configuration, rejecting empty or duplicate names and empty
    /// command lines.
    pub fn new(commands: Vec<CommandSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &commands {
            if spec.name.trim().is_empty() {
                return Err(Error::configuration("command name must not be empty"));
            }
            if spec.command.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "command '{}' has an empty command line",
                    spec.name
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::configuration(format!(
                    "duplicate command name '{}'",
                    spec.name
                )));
            }
        }
        Ok(Self { commands })
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(document: &str) -> Result<Self> {
        let file: ConfigurationFile = serde_yaml::from_str(document)
            .map_err(|e| Error::configuration(format!("malformed configuration: {}", e)))?;
        Self::new(file.commands.0)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let configuration = Self::from_yaml_str(&document)?;
        tracing::debug!(
            path = %path.display(),
            commands = configuration.len(),
            "Loaded measurement configuration"
        );
        Ok(configuration)
    }

    /// Commands in configuration order.
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Number of configured commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is configured.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[derive(Deserialize)]
struct ConfigurationFile {
    commands: CommandsSection,
}

/// The `commands` section in either accepted shape.
///
/// Mappings keep document order and duplicate keys so that
/// [`Configuration::new`] can report them.
struct CommandsSection(Vec<CommandSpec>);

impl<'de> Deserialize<'de> for CommandsSection {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SectionVisitor;

        impl<'de> Visitor<'de> for SectionVisitor {
            type Value = CommandsSection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(
                    "a mapping of command names to shell commands, \
                     or a list of entries with `name` and `command`",
                )
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut commands = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(name) = map.next_key::<String>()? {
                    let command = map.next_value::<String>().map_err(|e| {
                        de::Error::custom(format_args!(
                            "command '{}' must be a shell command string: {}",
                            name, e
                        ))
                    })?;
                    commands.push(CommandSpec { name, command });
                }
                Ok(CommandsSection(commands))
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut commands = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(spec) = seq.next_element::<CommandSpec>().map_err(|e| {
                    de::Error::custom(format_args!(
                        "list entry {} must have string `name` and `command` fields: {}",
                        commands.len() + 1,
                        e
                    ))
                })? {
                    commands.push(spec);
                }
                Ok(CommandsSection(commands))
            }
        }

        deserializer.deserialize_any(SectionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(config: &Configuration) -> Vec<&str> {
        config.commands().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_mapping_form_keeps_document_order() {
        let config = Configuration::from_yaml_str(
            r#"
commands:
  zeta: "echo 1"
  alpha: "echo 2"
  mid: "echo 3"
"#,
        )
        .unwrap();

        assert_eq!(names(&config), vec!["zeta", "alpha", "mid"]);
        assert_eq!(config.commands()[1].command, "echo 2");
    }

    #[test]
    fn test_list_form() {
        let config = Configuration::from_yaml_str(
            r#"
commands:
  - name: first
    command: "echo '1'"
  - name: second
    command: "echo '2'"
"#,
        )
        .unwrap();

        assert_eq!(config.len(), 2);
        assert_eq!(config.commands()[0], CommandSpec::new("first", "echo '1'"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Configuration::from_yaml_str(
            r#"
commands:
  - name: first
    command: "echo 1"
  - name: first
    command: "echo 2"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("first"));
    }

    #[test]
    fn test_duplicate_mapping_keys_rejected() {
        let err = Configuration::from_yaml_str("commands:\n  first: echo 1\n  first: echo 2\n")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("first"));
    }

    #[test]
    fn test_malformed_documents_rejected() {
        for document in ["commands: [unclosed", "other: 1", "commands: 42", ""] {
            let err = Configuration::from_yaml_str(document).unwrap_err();
            assert!(
                matches!(err, Error::Configuration(_)),
                "expected configuration error for {:?}",
                document
            );
        }
    }

    #[test]
    fn test_malformed_entries_name_the_expected_shape() {
        let err = Configuration::from_yaml_str("commands: 42").unwrap_err();
        assert!(err.to_string().contains("mapping of command names"));

        let err = Configuration::from_yaml_str("commands:\n  first: [echo, 1]\n").unwrap_err();
        assert!(err.to_string().contains("command 'first' must be a shell command string"));

        let err = Configuration::from_yaml_str(
            "commands:\n  - name: first\n    command: \"echo 1\"\n  - name: second\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("list entry 2"));
        assert!(err.to_string().contains("command"));
        assert!(!err.to_string().contains("untagged"));
    }

    #[test]
    fn test_empty_command_line_rejected() {
        let err = Configuration::new(vec![CommandSpec::new("first", "  ")]).unwrap_err();
        assert!(err.to_string().contains("empty command line"));
    }

    #[test]
    fn test_empty_commands_allowed() {
        let config = Configuration::from_yaml_str("commands: {}").unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "commands:\n  first: \"echo 1\"").unwrap();

        let config = Configuration::load(file.path()).unwrap();
        assert_eq!(names(&config), vec!["first"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Configuration::load(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
