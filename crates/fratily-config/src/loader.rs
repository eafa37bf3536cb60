//! Layered configuration loading.
//!
//! Layers apply in order, later ones overriding earlier ones key by key:
//!
//! 1. a base: defaults, or the development or production preset
//! 2. configuration files and strings (TOML or JSON), in the order added
//! 3. a `.env` file
//! 4. process environment variables
//!
//! Layers 3 and 4 use `PREFIX__SECTION__KEY` names, e.g.
//! `FRATILY__SERVER__HTTP_ADDR=0.0.0.0:9000`. Unknown keys are errors, like
//! unknown fields in files.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{ConfigError, FratilyConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "FRATILY";

/// Separator between prefix, section and key in variable names.
pub const ENV_SEPARATOR: &str = "__";

/// Builds a [`FratilyConfig`] from layered sources.
///
/// # Example
///
/// ```no_run
/// use fratily_config::ConfigLoader;
///
/// # fn main() -> Result<(), fratily_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("fratily.toml")?
///     .with_dotenv()
///     .load()?;
///
/// println!("listening on {}", config.server.http_addr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base: FratilyConfig,
    layers: Vec<Value>,
    dotenv: Option<DotenvSource>,
    env_prefix: Option<String>,
}

#[derive(Debug, Clone)]
enum DotenvSource {
    Optional(PathBuf),
    Required(PathBuf),
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader over the defaults, reading `FRATILY__*` variables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: FratilyConfig::default(),
            layers: Vec::new(),
            dotenv: None,
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
        }
    }

    /// Uses the defaults as the base.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.base = FratilyConfig::default();
        self
    }

    /// Uses the development preset as the base.
    ///
    /// ```
    /// use fratily_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .without_env()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    /// assert!(config.app.debug);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.base = FratilyConfig::development();
        self
    }

    /// Uses the production preset as the base.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.base = FratilyConfig::production();
        self
    }

    /// Adds a configuration file; the extension picks the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not TOML or
    /// JSON, or malformed.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.layers.push(parse(&content, &format)?);
        Ok(self)
    }

    /// Adds a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::with_file`] for a file that exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Adds configuration text in `format` ("toml" or "json").
    ///
    /// ```
    /// use fratily_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .without_env()
    ///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// assert_eq!(config.server.timeout_status, 504);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported formats and malformed text.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.layers.push(parse(content, &format.to_lowercase())?);
        Ok(self)
    }

    /// Reads `.env` from the working directory, if present.
    #[must_use]
    pub fn with_dotenv(mut self) -> Self {
        self.dotenv = Some(DotenvSource::Optional(PathBuf::from(".env")));
        self
    }

    /// Reads the given `.env` file, which must exist.
    #[must_use]
    pub fn with_dotenv_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv = Some(DotenvSource::Required(path.into()));
        self
    }

    /// Sets the variable prefix for `.env` and environment overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Ignores `.env` and environment variables.
    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Loads and validates.
    ///
    /// # Errors
    ///
    /// Returns any layer's error, or the validation error.
    pub fn load(self) -> Result<FratilyConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads without validating.
    ///
    /// # Errors
    ///
    /// Returns any layer's error.
    pub fn load_unvalidated(self) -> Result<FratilyConfig, ConfigError> {
        let mut tree = serde_json::to_value(&self.base)?;
        for layer in self.layers {
            merge(&mut tree, layer);
        }

        if let Some(prefix) = &self.env_prefix {
            let mut vars = BTreeMap::new();
            if let Some(source) = &self.dotenv {
                vars.extend(read_dotenv(source)?);
            }
            vars.extend(env::vars());
            apply_vars(&mut tree, prefix, vars)?;
        }

        Ok(serde_json::from_value(tree)?)
    }
}

fn parse(content: &str, format: &str) -> Result<Value, ConfigError> {
    match format {
        "toml" => {
            let value: toml::Value = toml::from_str(content)?;
            Ok(serde_json::to_value(value)?)
        }
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::unsupported_format(other)),
    }
}

fn read_dotenv(source: &DotenvSource) -> Result<Vec<(String, String)>, ConfigError> {
    let path = match source {
        DotenvSource::Optional(path) if !path.exists() => return Ok(Vec::new()),
        DotenvSource::Optional(path) => path,
        DotenvSource::Required(path) if !path.exists() => {
            return Err(ConfigError::file_not_found(path))
        }
        DotenvSource::Required(path) => path,
    };
    dotenvy::from_path_iter(path)?
        .map(|item| item.map_err(ConfigError::from))
        .collect()
}

/// Overlays `layer` onto `base`, recursing into tables.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn apply_vars(
    tree: &mut Value,
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<(), ConfigError> {
    let lead = format!("{prefix}{ENV_SEPARATOR}");
    for (var, raw) in vars {
        let Some(rest) = var.strip_prefix(&lead) else {
            continue;
        };
        let path: Vec<String> = rest.split(ENV_SEPARATOR).map(str::to_lowercase).collect();
        let slot = lookup(tree, &path)
            .ok_or_else(|| ConfigError::unknown_key(path.join("."), &var))?;
        *slot = typed(slot, &raw, &var)?;
    }
    Ok(())
}

fn lookup<'t>(tree: &'t mut Value, path: &[String]) -> Option<&'t mut Value> {
    path.iter()
        .try_fold(tree, |node, key| node.as_object_mut()?.get_mut(key))
        .filter(|slot| !slot.is_object())
}

/// Parses `raw` to the type of the value it replaces.
fn typed(current: &Value, raw: &str, var: &str) -> Result<Value, ConfigError> {
    match current {
        Value::Bool(_) => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| ConfigError::env_parse_error(var, "expected boolean")),
        Value::Number(_) => raw
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| ConfigError::env_parse_error(var, "expected integer")),
        Value::Null if raw.is_empty() => Ok(Value::Null),
        Value::Null => Ok(raw
            .parse::<u64>()
            .map_or_else(|_| Value::String(raw.to_string()), Value::from)),
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogFormat, NotFoundPolicy};
    use std::io::Write;

    fn tree() -> Value {
        serde_json::to_value(FratilyConfig::default()).unwrap()
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_file_layer_keeps_preset_values() {
        let config = ConfigLoader::new()
            .without_env()
            .with_development()
            .with_string("[server]\nhttp_addr = \"0.0.0.0:9000\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "0.0.0.0:9000");
        assert!(config.app.debug);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_later_layers_win() {
        let config = ConfigLoader::new()
            .without_env()
            .with_string(r#"{"app": {"name": "first"}}"#, "json")
            .unwrap()
            .with_string("[app]\nname = \"second\"", "toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.app.name, "second");
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigLoader::new().with_string("a: b", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_unknown_field_in_file_rejected() {
        let err = ConfigLoader::new()
            .without_env()
            .with_string("[server]\nworkers = 4", "toml")
            .unwrap()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new().with_file("/nonexistent/fratily.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let config = ConfigLoader::new()
            .without_env()
            .with_optional_file("/nonexistent/fratily.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, FratilyConfig::default());
    }

    #[test]
    fn test_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"routing": {{"not_found_mode": "continue"}}}}"#).unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.routing.not_found_mode, NotFoundPolicy::Continue);
    }

    #[test]
    fn test_apply_vars_types() {
        let mut tree = tree();
        apply_vars(
            &mut tree,
            "T",
            vars(&[
                ("T__SERVER__HTTP_ADDR", "10.0.0.1:80"),
                ("T__SERVER__REQUEST_TIMEOUT_SECS", "5"),
                ("T__APP__DEBUG", "yes"),
                ("T__SENDER__CHUNK_SIZE", "4096"),
                ("T__LOGGING__FORMAT", "pretty"),
                ("OTHER__APP__DEBUG", "nonsense"),
                ("T_SINGLE", "ignored"),
            ]),
        )
        .unwrap();

        let config: FratilyConfig = serde_json::from_value(tree).unwrap();
        assert_eq!(config.server.http_addr, "10.0.0.1:80");
        assert_eq!(config.server.request_timeout_secs, 5);
        assert!(config.app.debug);
        assert_eq!(config.sender.chunk_size, Some(4096));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_apply_vars_errors() {
        let err = apply_vars(&mut tree(), "T", vars(&[("T__SERVER__PORT", "80")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { .. }));

        let err = apply_vars(&mut tree(), "T", vars(&[("T__SERVER", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { .. }));

        let err = apply_vars(
            &mut tree(),
            "T",
            vars(&[("T__SERVER__MAX_BODY_BYTES", "lots")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    fn test_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "FRATILY_DOTENV_TEST__SERVER__TIMEOUT_STATUS=503").unwrap();
        writeln!(file, "FRATILY_DOTENV_TEST__APP__NAME=from-dotenv").unwrap();

        let config = ConfigLoader::new()
            .with_env_prefix("FRATILY_DOTENV_TEST")
            .with_dotenv_file(file.path())
            .load()
            .unwrap();
        assert_eq!(config.server.timeout_status, 503);
        assert_eq!(config.app.name, "from-dotenv");

        let err = ConfigLoader::new()
            .with_dotenv_file("/nonexistent/.env")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_validates() {
        let text = "[server]\ntimeout_status = 500";
        let loader = ConfigLoader::new().without_env().with_string(text, "toml").unwrap();
        assert!(loader.clone().load_unvalidated().is_ok());
        assert!(matches!(loader.load(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
