//! Late-bound, read-only configuration lookup.
//!
//! Code that only knows a key at runtime reads through a [`ConfigView`]
//! instead of the typed struct. A view is a snapshot: it is built once
//! from a [`FratilyConfig`] and never changes.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ConfigError, FratilyConfig};

/// Read-only dotted-key view over a configuration.
///
/// # Example
///
/// ```
/// use fratily_config::{ConfigView, FratilyConfig};
///
/// let view = ConfigView::new(&FratilyConfig::default()).unwrap();
///
/// assert_eq!(view.get_str("server.http_addr"), Some("127.0.0.1:8080"));
/// assert_eq!(view.get_as::<u16>("server.timeout_status").unwrap(), Some(504));
///
/// let keys: Vec<String> = view.query("app.*").into_iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["app.debug", "app.name"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigView {
    root: Value,
}

impl ConfigView {
    /// Snapshots `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn new(config: &FratilyConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            root: serde_json::to_value(config)?,
        })
    }

    /// Returns the value at a dotted key, sections included.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |node, segment| node.as_object()?.get(segment))
    }

    /// Returns a string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Deserializes the value at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not have type `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(ConfigError::from)
    }

    /// Returns `true` if the key exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns every entry matching a dotted pattern, sorted by key.
    ///
    /// A `*` segment matches any one key: `"server.*"` lists the server
    /// section, `"*.level"` finds `level` in every section.
    #[must_use]
    pub fn query(&self, pattern: &str) -> Vec<(String, &Value)> {
        let segments: Vec<&str> = pattern.split('.').collect();
        let mut out = Vec::new();
        collect(&self.root, &segments, String::new(), &mut out);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

fn collect<'v>(
    node: &'v Value,
    segments: &[&str],
    prefix: String,
    out: &mut Vec<(String, &'v Value)>,
) {
    let Some((first, rest)) = segments.split_first() else {
        out.push((prefix, node));
        return;
    };
    let Some(table) = node.as_object() else {
        return;
    };

    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    if *first == "*" {
        for (key, child) in table {
            collect(child, rest, join(key), out);
        }
    } else if let Some(child) = table.get(*first) {
        collect(child, rest, join(first), out);
    }
}
