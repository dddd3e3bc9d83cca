//! Secrets store for run configuration
//!
//! Token prefixes are credentials, so they are kept out of the main config
//! file and looked up by key from `secrets.yaml`.

use crate::error::{ConfigError, ConfigResult};
use crate::scalar_text;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Secrets loaded from `secrets.yaml`
#[derive(Clone)]
pub struct Secrets {
    secrets: HashMap<String, String>,
    path: PathBuf,
}

impl Secrets {
    /// Load `secrets.yaml` from `config_dir`; a missing file gives an empty store
    pub fn load(config_dir: &Path) -> ConfigResult<Self> {
        let path = config_dir.join("secrets.yaml");

        if !path.exists() {
            debug!("No secrets.yaml found at {:?}, using empty secrets", path);
            return Ok(Self::empty(path));
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        let raw: HashMap<String, serde_yaml::Value> =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
                path: path.clone(),
                source: e,
            })?;

        let secrets: HashMap<String, String> = raw
            .into_iter()
            .map(|(k, v)| {
                // Prefixes often end in a separator, so strings keep their whitespace
                let text = match v {
                    serde_yaml::Value::String(s) => s,
                    other => scalar_text(&other).unwrap_or_default(),
                };
                (k, text)
            })
            .collect();

        debug!("Loaded {} secrets from {:?}", secrets.len(), path);
        Ok(Self { secrets, path })
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            secrets: HashMap::new(),
            path,
        }
    }

    /// Get a secret by key
    pub fn get(&self, key: &str) -> ConfigResult<&str> {
        self.secrets
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::SecretNotFound {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.secrets.contains_key(key)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self::empty(PathBuf::from("secrets.yaml"))
    }
}

// Values never reach logs
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.secrets.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Secrets")
            .field("keys", &keys)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_secrets_file(dir: &Path, content: &str) {
        fs::write(dir.join("secrets.yaml"), content).unwrap();
    }

    #[test]
    fn test_load_secrets() {
        let dir = TempDir::new().unwrap();
        create_secrets_file(
            dir.path(),
            r#"
test_token_prefix: "Bearer "
prod_token_prefix: "Bearer xyz_"
retries: 3
"#,
        );

        let secrets = Secrets::load(dir.path()).unwrap();
        assert_eq!(secrets.get("test_token_prefix").unwrap(), "Bearer ");
        assert_eq!(secrets.get("retries").unwrap(), "3");
        assert_eq!(secrets.len(), 3);
        assert!(secrets.contains("prod_token_prefix"));
    }

    #[test]
    fn test_missing_secret() {
        let dir = TempDir::new().unwrap();
        create_secrets_file(dir.path(), "key: value\n");

        let secrets = Secrets::load(dir.path()).unwrap();
        let result = secrets.get("nonexistent");
        assert!(matches!(result, Err(ConfigError::SecretNotFound { .. })));
    }

    #[test]
    fn test_no_secrets_file() {
        let dir = TempDir::new().unwrap();
        let secrets = Secrets::load(dir.path()).unwrap();
        assert!(secrets.is_empty());
    }

    #[test]
    fn test_debug_hides_values() {
        let dir = TempDir::new().unwrap();
        create_secrets_file(dir.path(), "test_token_prefix: Bearer s3cr3t_\n");

        let secrets = Secrets::load(dir.path()).unwrap();
        let rendered = format!("{:?}", secrets);
        assert!(rendered.contains("test_token_prefix"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
