use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "shaker.config.json";

/**
 * a macro to create deserialize function that allow false value for optional config
 */
#[macro_export]
macro_rules! create_deserialize_fn {
    ($fn_name:ident, $struct_type:ty) => {
        pub fn $fn_name<'de, D>(deserializer: D) -> Result<Option<$struct_type>, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let value: serde_json::Value = serde_json::Value::deserialize(deserializer)?;

            match value {
                // allow false value for optional config
                serde_json::Value::Bool(false) | serde_json::Value::Null => Ok(None),
                // try deserialize
                value @ (serde_json::Value::Bool(true)
                | serde_json::Value::Array(_)
                | serde_json::Value::Object(_)) => Ok(Some(
                    serde_json::from_value::<$struct_type>(value)
                        .map_err(serde::de::Error::custom)?,
                )),
                _ => Err(serde::de::Error::custom(format!(
                    "invalid `{}` value: {}",
                    stringify!($fn_name).replace("deserialize_", ""),
                    value
                ))),
            }
        }
    };
}

/// Ordered export names to keep or to remove. `"default"` names the
/// default export.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct RootSet(IndexSet<String>);

impl RootSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RootSet(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An imported function whose bare calls are removed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct RemovalTarget {
    /// Module specifier, e.g. `react`.
    pub source: String,
    /// External name, e.g. `useEffect`.
    pub name: String,
}

impl RemovalTarget {
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RemovalTargetsValue {
    Preset(bool),
    List(Vec<RemovalTarget>),
}

impl From<RemovalTargetsValue> for RemovalTargets {
    fn from(value: RemovalTargetsValue) -> Self {
        match value {
            RemovalTargetsValue::Preset(true) => RemovalTargets::default(),
            RemovalTargetsValue::Preset(false) => RemovalTargets(vec![]),
            RemovalTargetsValue::List(targets) => RemovalTargets::new(targets),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "RemovalTargetsValue")]
pub struct RemovalTargets(Vec<RemovalTarget>);

impl RemovalTargets {
    pub fn new(targets: impl IntoIterator<Item = RemovalTarget>) -> Self {
        let mut list: Vec<RemovalTarget> = vec![];
        for target in targets {
            if !list.contains(&target) {
                list.push(target);
            }
        }
        RemovalTargets(list)
    }

    pub fn matches(&self, source: &str, name: &str) -> bool {
        self.0
            .iter()
            .any(|target| target.source == source && target.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemovalTarget> {
        self.0.iter()
    }
}

impl Default for RemovalTargets {
    /// React's effect hooks, which only run in the browser.
    fn default() -> Self {
        RemovalTargets(vec![
            RemovalTarget::new("react", "useEffect"),
            RemovalTarget::new("react", "useLayoutEffect"),
        ])
    }
}

create_deserialize_fn!(deserialize_keep_exports, RootSet);
create_deserialize_fn!(deserialize_remove_exports, RootSet);
create_deserialize_fn!(deserialize_remove_side_effects, RemovalTargets);

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_keep_exports")]
    pub keep_exports: Option<RootSet>,
    #[serde(default, deserialize_with = "deserialize_remove_exports")]
    pub remove_exports: Option<RootSet>,
    #[serde(default, deserialize_with = "deserialize_remove_side_effects")]
    pub remove_side_effects: Option<RemovalTargets>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse {file} at line {line} column {column}: {message}")]
    InvalidConfig {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },
}

impl Config {
    /// Reads `shaker.config.json` under `root`; the default config is used
    /// when the file does not exist.
    pub fn new(root: &Path) -> Result<Self> {
        let abs_config_file = root.join(CONFIG_FILE);
        if !abs_config_file.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&abs_config_file).map_err(|e| {
            anyhow!(
                "Failed to read file '{}': {}",
                abs_config_file.to_string_lossy(),
                e
            )
        })?;
        Self::parse(CONFIG_FILE, &content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Self::parse("config", content)
    }

    fn parse(file: &str, content: &str) -> Result<Self> {
        serde_json::from_str::<Config>(content).map_err(|e| {
            anyhow!(ConfigError::InvalidConfig {
                file: file.to_string(),
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            })
        })
    }
}
