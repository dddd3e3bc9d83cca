//! YAML loader with tag support
//!
//! Supports these custom tags:
//! - `!include path` - Include another YAML file, relative to the including file
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution

use crate::error::{ConfigError, ConfigResult};
use crate::secrets::Secrets;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// YAML loader resolving `!include`, `!secret` and `!env_var`
pub struct YamlLoader {
    /// Base directory for resolving relative paths
    config_dir: PathBuf,
    secrets: Secrets,
    /// Files currently being loaded, for cycle detection
    include_stack: HashSet<PathBuf>,
}

impl YamlLoader {
    /// Create a loader for `config_dir`, reading its secrets.yaml if present
    pub fn new(config_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config_dir = config_dir.into();
        let secrets = Secrets::load(&config_dir)?;
        Ok(Self::with_secrets(config_dir, secrets))
    }

    /// Create a loader with pre-loaded secrets
    pub fn with_secrets(config_dir: impl Into<PathBuf>, secrets: Secrets) -> Self {
        Self {
            config_dir: config_dir.into(),
            secrets,
            include_stack: HashSet::new(),
        }
    }

    /// Load and process a YAML file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = self.resolve_path(path.as_ref());
        debug!("Loading YAML file: {:?}", path);

        if self.include_stack.contains(&path) {
            return Err(ConfigError::CircularInclude { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        self.include_stack.insert(path.clone());
        let result = self.load_string(&content, &path);
        self.include_stack.remove(&path);

        result
    }

    /// Load and process YAML from a string
    pub fn load_string(&mut self, content: &str, source_path: &Path) -> ConfigResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        self.process_value(value, source_path)
    }

    /// Load a file and deserialize it into `T`
    pub fn load_as<T: DeserializeOwned>(&mut self, path: impl AsRef<Path>) -> ConfigResult<T> {
        let resolved = self.resolve_path(path.as_ref());
        let value = self.load_file(&resolved)?;
        serde_yaml::from_value(value).map_err(|e| ConfigError::ParseYaml {
            path: resolved,
            source: e,
        })
    }

    fn process_value(&mut self, value: Value, source_path: &Path) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => {
                let tag = tagged.tag.to_string();
                trace!("Processing tag '{}' with value {:?}", tag, tagged.value);
                match tag.as_str() {
                    "!include" => {
                        let path = self.include_path(&tagged.value, source_path)?;
                        debug!("Including file: {:?}", path);
                        self.load_file(&path)
                    }
                    "!secret" => self.process_secret(&tagged.value),
                    "!env_var" => self.process_env_var(&tagged.value),
                    _ => Err(ConfigError::InvalidValue {
                        key: tag,
                        reason: "unknown tag".to_string(),
                    }),
                }
            }
            Value::Mapping(map) => {
                let mut result = serde_yaml::Mapping::new();
                for (k, v) in map {
                    let v = self.process_value(v, source_path)?;
                    result.insert(k, v);
                }
                Ok(Value::Mapping(result))
            }
            Value::Sequence(seq) => {
                let result: ConfigResult<Vec<Value>> = seq
                    .into_iter()
                    .map(|v| self.process_value(v, source_path))
                    .collect();
                Ok(Value::Sequence(result?))
            }
            _ => Ok(value),
        }
    }

    fn process_secret(&self, value: &Value) -> ConfigResult<Value> {
        let key = tag_argument("!secret", value)?;
        let secret = self.secrets.get(key)?;
        debug!("Substituted secret: {}", key);
        Ok(Value::String(secret.to_string()))
    }

    fn process_env_var(&self, value: &Value) -> ConfigResult<Value> {
        let var = tag_argument("!env_var", value)?;
        let env_value = std::env::var(var).map_err(|_| ConfigError::EnvVarNotFound {
            var: var.to_string(),
        })?;
        debug!("Substituted env var: {}", var);
        Ok(Value::String(env_value))
    }

    /// Include paths resolve against the including file's directory
    fn include_path(&self, value: &Value, source_path: &Path) -> ConfigResult<PathBuf> {
        let raw = Path::new(tag_argument("!include", value)?);
        if raw.is_absolute() {
            return Ok(raw.to_path_buf());
        }
        let base_dir = source_path.parent().unwrap_or(&self.config_dir);
        Ok(base_dir.join(raw))
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

fn tag_argument<'a>(tag: &str, value: &'a Value) -> ConfigResult<&'a str> {
    value.as_str().ok_or_else(|| ConfigError::InvalidValue {
        key: tag.to_string(),
        reason: "tag argument must be a string".to_string(),
    })
}

/// Load a YAML file with full tag processing
pub fn load_yaml(config_dir: impl Into<PathBuf>, file: impl AsRef<Path>) -> ConfigResult<Value> {
    YamlLoader::new(config_dir)?.load_file(file)
}

/// Load a YAML file with tag processing and deserialize it
pub fn load_yaml_as<T: DeserializeOwned>(
    config_dir: impl Into<PathBuf>,
    file: impl AsRef<Path>,
) -> ConfigResult<T> {
    YamlLoader::new(config_dir)?.load_as(file)
}
