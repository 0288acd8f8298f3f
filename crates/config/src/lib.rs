//! Configuration loading, validation, and management for Missive.
//!
//! A configuration file declares the type graph, the contracts, their
//! templates (with per-viewer overrides), the composer delimiters and the
//! resolution policy. Environment variables override the logging level and
//! the delimiters.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use missive_core::{ContractDescriptor, TypeGraph, TypeKey};

/// Environment variable overriding `logging.level`.
pub const ENV_LOG: &str = "MISSIVE_LOG";
/// Environment variable overriding `composer.prefix`.
pub const ENV_PREFIX: &str = "MISSIVE_PREFIX";
/// Environment variable overriding `composer.suffix`.
pub const ENV_SUFFIX: &str = "MISSIVE_SUFFIX";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissiveConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub composer: ComposerConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Declared parents of the types that take part in resolution
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,

    /// Default templates by message key
    #[serde(default)]
    pub templates: BTreeMap<String, String>,

    /// Per-viewer template overrides
    #[serde(default)]
    pub viewers: BTreeMap<String, ViewerConfig>,

    #[serde(default)]
    pub contracts: Vec<ContractDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    #[serde(default = "default_delimiter")]
    pub prefix: String,

    #[serde(default = "default_delimiter")]
    pub suffix: String,
}

fn default_delimiter() -> String {
    "%".into()
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            prefix: default_delimiter(),
            suffix: default_delimiter(),
        }
    }
}

/// Which ancestors are searched first when a type has no resolver of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupertypePolicy {
    #[default]
    SuperclassFirst,
    InterfacesFirst,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub strategy: SupertypePolicy,

    /// Type every other type descends from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Search the root type after every other ancestor
    #[serde(default)]
    pub root_last: bool,

    /// Abort a call after this many resolver acceptances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

impl MissiveConfig {
    /// Load a configuration file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MISSIVE_LOG`, `MISSIVE_PREFIX` and `MISSIVE_SUFFIX`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(ENV_LOG) {
            self.logging.level = level;
        }
        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.composer.prefix = prefix;
        }
        if let Some(suffix) = lookup(ENV_SUFFIX) {
            self.composer.suffix = suffix;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }

        if self.composer.prefix.is_empty() && self.composer.suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "composer.prefix and composer.suffix cannot both be empty".into(),
            ));
        }

        if self.resolution.max_steps == Some(0) {
            return Err(ConfigError::ValidationError(
                "resolution.max_steps must be > 0".into(),
            ));
        }

        if self.resolution.root_last && self.resolution.root.is_none() {
            return Err(ConfigError::ValidationError(
                "resolution.root_last needs resolution.root".into(),
            ));
        }

        let mut names = HashSet::new();
        for contract in &self.contracts {
            if !names.insert(contract.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "contract '{}' is declared more than once",
                    contract.name
                )));
            }
            // Default bodies are code; a file cannot supply one.
            if let Some(method) = contract.methods.iter().find(|m| m.default_body) {
                return Err(ConfigError::ValidationError(format!(
                    "method {}::{} declares a default body, which cannot be configured from a file",
                    contract.name, method.name
                )));
            }
        }

        self.type_graph()?;
        Ok(())
    }

    /// Build the declared type graph.
    pub fn type_graph(&self) -> Result<TypeGraph, ConfigError> {
        let mut graph = match &self.resolution.root {
            Some(root) => TypeGraph::with_root(root.clone()),
            None => TypeGraph::new(),
        };
        for declaration in &self.types {
            graph.declare(
                declaration.name.clone(),
                declaration.superclass.clone().map(TypeKey::from),
                declaration.interfaces.iter().cloned().map(TypeKey::from),
            )?;
        }
        Ok(graph)
    }

    /// Find a contract by name.
    pub fn contract(&self, name: &str) -> Option<&ContractDescriptor> {
        self.contracts.iter().find(|c| c.name.as_str() == name)
    }

    /// Every `(contract, method, message key)` triple, in declaration order.
    pub fn message_keys(&self) -> Vec<(&str, &str, Option<&str>)> {
        self.contracts
            .iter()
            .flat_map(|contract| {
                contract.methods.iter().map(move |method| {
                    (
                        contract.name.as_str(),
                        method.name.as_str(),
                        method.message_key.as_deref(),
                    )
                })
            })
            .collect()
    }

    /// Message keys used by some method but missing from `[templates]`.
    pub fn keys_without_template(&self) -> Vec<&str> {
        let mut missing: Vec<_> = self
            .message_keys()
            .into_iter()
            .filter_map(|(_, _, key)| key)
            .filter(|key| !self.templates.contains_key(*key))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid type declaration: {0}")]
    Types(#[from] missive_core::ConfigError),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use missive_core::Returns;

    use super::*;

    const SAMPLE: &str = r#"
[logging]
level = "debug"

[composer]
prefix = "{"
suffix = "}"

[resolution]
strategy = "interfaces_first"
root = "object"
root_last = true
max_steps = 64

[[types]]
name = "email"
superclass = "message"
interfaces = ["examinable"]

[templates]
notice = "New mail from {author}"

[viewers.pirate.templates]
notice = "Ahoy, {author}"

[[contracts]]
name = "Notices"

[[contracts.methods]]
name = "notify"
message_key = "notice"

[[contracts.methods.params]]
name = "to"
type = "string"
markers = ["viewer"]

[[contracts.methods.params]]
name = "author"
type = "string"
template_argument = {}

[[contracts.methods]]
name = "preview"
message_key = "preview"
returns = "message"
"#;

    #[test]
    fn default_config_is_valid() {
        let config = MissiveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.composer.prefix, "%");
        assert_eq!(config.resolution.strategy, SupertypePolicy::SuperclassFirst);
    }

    #[test]
    fn sample_config_parses() {
        let config = MissiveConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.resolution.strategy, SupertypePolicy::InterfacesFirst);
        assert_eq!(config.resolution.max_steps, Some(64));
        assert_eq!(config.viewers["pirate"].templates["notice"], "Ahoy, {author}");

        let notices = config.contract("Notices").unwrap();
        let notify = notices.find("notify").unwrap();
        assert_eq!(notify.params[1].resolution_name(), Some("author"));
        assert_eq!(notices.find("preview").unwrap().returns, Returns::Message);
    }

    #[test]
    fn type_graph_is_built_from_declarations() {
        let config = MissiveConfig::from_toml_str(SAMPLE).unwrap();
        let graph = config.type_graph().unwrap();

        let email = TypeKey::from_static("email");
        assert!(graph.is_subtype(&email, &TypeKey::from_static("examinable")));
        assert!(graph.is_subtype(&email, &TypeKey::from_static("object")));
    }

    #[test]
    fn type_cycles_are_rejected() {
        let err = MissiveConfig::from_toml_str(
            r#"
[[types]]
name = "a"
superclass = "b"

[[types]]
name = "b"
superclass = "a"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Types(_)));
    }

    #[test]
    fn invalid_log_level_rejected() {
        let config = MissiveConfig {
            logging: LoggingConfig {
                level: "loud".into(),
                json: false,
            },
            ..MissiveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_bodies_cannot_come_from_files() {
        let err = MissiveConfig::from_toml_str(
            r#"
[[contracts]]
name = "Notices"

[[contracts.methods]]
name = "empty"
default_body = true
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("default body"));
    }

    #[test]
    fn duplicate_contracts_rejected() {
        let err = MissiveConfig::from_toml_str(
            r#"
[[contracts]]
name = "Notices"

[[contracts]]
name = "Notices"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn overrides_replace_level_and_delimiters() {
        let vars: HashMap<&str, &str> = HashMap::from([(ENV_LOG, "trace"), (ENV_PREFIX, "<<")]);
        let mut config = MissiveConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.composer.prefix, "<<");
        assert_eq!(config.composer.suffix, "%");
    }

    #[test]
    fn message_keys_and_missing_templates() {
        let config = MissiveConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(
            config.message_keys(),
            [
                ("Notices", "notify", Some("notice")),
                ("Notices", "preview", Some("preview")),
            ]
        );
        assert_eq!(config.keys_without_template(), ["preview"]);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = MissiveConfig::load_from(Path::new("/nonexistent/missive.toml"));
        assert!(result.is_ok());
        assert!(result.unwrap().contracts.is_empty());
    }

    #[test]
    fn load_from_reads_and_validates_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = MissiveConfig::load_from(file.path()).unwrap();
        assert_eq!(config.contracts.len(), 1);
        assert_eq!(config.templates["notice"], "New mail from {author}");
    }

    #[test]
    fn unparsable_file_reports_its_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[[contracts]\nname = ").unwrap();

        let err = MissiveConfig::load_from(file.path()).unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = MissiveConfig::from_toml_str(SAMPLE).unwrap();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = MissiveConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.contracts, config.contracts);
        assert_eq!(parsed.composer.prefix, "{");
    }
}
