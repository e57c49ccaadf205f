//! Typed model of a compose file, as handed over by the collaborator that
//! deserialized the YAML. Open-ended fields stay as `serde_yaml::Value`;
//! the fields the checker reasons about get concrete shapes, with untagged
//! enums covering the list-vs-map forms compose allows.

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub services: IndexMap<String, ComposeService>,
    #[serde(default)]
    pub networks: Option<IndexMap<String, serde_yaml::Value>>,
    /// Shared Poetry configuration extension block.
    #[serde(rename = "x-poetry", default)]
    pub poetry_extension: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeService {
    #[serde(default)]
    pub build: Option<BuildSpec>,
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub volumes: Option<Vec<serde_yaml::Value>>,
    #[serde(default)]
    pub healthcheck: Option<Healthcheck>,
    #[serde(default)]
    pub depends_on: Option<DependsOn>,
}

/// `build:` is either a bare context string or a detailed mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BuildSpec {
    Context(String),
    Detailed {
        #[serde(default)]
        context: Option<String>,
        #[serde(default)]
        dockerfile: Option<String>,
        #[serde(default)]
        args: Option<IndexMap<String, serde_yaml::Value>>,
    },
}

impl BuildSpec {
    pub fn context(&self) -> Option<&str> {
        match self {
            BuildSpec::Context(c) => Some(c),
            BuildSpec::Detailed { context, .. } => context.as_deref(),
        }
    }

    pub fn dockerfile(&self) -> Option<&str> {
        match self {
            BuildSpec::Context(_) => None,
            BuildSpec::Detailed { dockerfile, .. } => dockerfile.as_deref(),
        }
    }

    pub fn args(&self) -> Option<&IndexMap<String, serde_yaml::Value>> {
        match self {
            BuildSpec::Context(_) => None,
            BuildSpec::Detailed { args, .. } => args.as_ref(),
        }
    }
}

/// `environment:` as either a `KEY=VALUE` list or a mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Environment {
    List(Vec<String>),
    Map(IndexMap<String, serde_yaml::Value>),
}

impl Environment {
    /// Declared environment keys, in source order.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Environment::List(entries) => entries
                .iter()
                .map(|e| e.split('=').next().unwrap_or(e.as_str()))
                .collect(),
            Environment::Map(map) => map.keys().map(String::as_str).collect(),
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys().contains(&key)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Healthcheck {
    #[serde(default)]
    pub test: Option<serde_yaml::Value>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub retries: Option<serde_yaml::Value>,
}

impl Healthcheck {
    /// Names of the required keys missing from this block.
    pub fn missing_keys(&self, required: &[&'static str]) -> Vec<&'static str> {
        required
            .iter()
            .copied()
            .filter(|key| match *key {
                "test" => self.test.is_none(),
                "interval" => self.interval.is_none(),
                "timeout" => self.timeout.is_none(),
                "retries" => self.retries.is_none(),
                _ => false,
            })
            .collect()
    }
}

/// `depends_on:` as either the legacy list form or the condition-map form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(IndexMap<String, DependsOnEntry>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependsOnEntry {
    #[serde(default)]
    pub condition: Option<String>,
}

impl ComposeService {
    /// Volume entries expressed as strings (`host:container` form).
    pub fn volume_strings(&self) -> Vec<&str> {
        self.volumes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str())
            .collect()
    }
}
