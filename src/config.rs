//! Application configuration
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! ```toml
//! current_connection = "prod"
//!
//! [datahub]
//! environment = "PROD"
//! mutation = "eu"            # optional
//! actor = "urn:li:corpuser:datahub"
//!
//! [output]
//! mcp_dir = "metadata"
//! consolidated = false
//! catalog_dir = "catalog"
//!
//! [git]
//! repo_path = "./metadata-repo"
//! branch = "metadata/updates"
//! remote = "origin"          # optional
//! author_name = "Metadata Bot"
//! author_email = "bot@example.com"
//! username = "bot"           # HTTPS push, token from DATAHUB_GIT_TOKEN
//! ssh_key_path = "~/.ssh/id_ed25519"
//!
//! [[connections]]
//! id = "prod"
//! name = "Production"
//! url = "https://datahub.example.com"
//! token = "..."
//! ```

use crate::git::is_protected_branch;
use crate::models::{Connection, ConnectionId};
use crate::urn::Urn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const ENV_ENVIRONMENT: &str = "DATAHUB_ENV";
pub const ENV_MUTATION: &str = "DATAHUB_MUTATION";
pub const ENV_MCP_DIR: &str = "DATAHUB_MCP_DIR";
pub const ENV_CONNECTION: &str = "DATAHUB_CONNECTION";
pub const ENV_GIT_TOKEN: &str = "DATAHUB_GIT_TOKEN";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Target DataHub environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatahubSettings {
    pub environment: String,
    pub mutation: Option<String>,
    /// Actor recorded in audit stamps
    pub actor: Urn,
}

impl Default for DatahubSettings {
    fn default() -> Self {
        Self {
            environment: "PROD".to_string(),
            mutation: None,
            actor: Urn::corpuser("datahub"),
        }
    }
}

/// Where generated files go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub mcp_dir: PathBuf,
    /// Write one consolidated file instead of one file per aspect
    pub consolidated: bool,
    /// Local catalog directory
    pub catalog_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            mcp_dir: PathBuf::from("metadata"),
            consolidated: false,
            catalog_dir: PathBuf::from("catalog"),
        }
    }
}

/// Git staging target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    pub repo_path: PathBuf,
    pub branch: String,
    pub remote: Option<String>,
    pub author_name: String,
    pub author_email: String,
    pub username: Option<String>,
    pub ssh_key_path: Option<PathBuf>,
    /// Only ever taken from the environment
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            branch: "metadata/updates".to_string(),
            remote: None,
            author_name: "DataHub Metadata Manager".to_string(),
            author_email: "metadata-manager@localhost".to_string(),
            username: None,
            ssh_key_path: None,
            token: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub current_connection: Option<ConnectionId>,
    pub datahub: DatahubSettings,
    pub output: OutputSettings,
    pub git: GitSettings,
    pub connections: Vec<Connection>,
}

impl AppConfig {
    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Read `path` when given (defaults otherwise), apply environment
    /// overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `DATAHUB_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored,
    /// except `DATAHUB_MUTATION` where an empty value clears the mutation.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(env) = lookup(ENV_ENVIRONMENT).filter(|v| !v.trim().is_empty()) {
            self.datahub.environment = env.trim().to_string();
        }
        if let Some(mutation) = lookup(ENV_MUTATION) {
            let mutation = mutation.trim();
            self.datahub.mutation = (!mutation.is_empty()).then(|| mutation.to_string());
        }
        if let Some(dir) = lookup(ENV_MCP_DIR).filter(|v| !v.trim().is_empty()) {
            self.output.mcp_dir = PathBuf::from(dir.trim());
        }
        if let Some(conn) = lookup(ENV_CONNECTION).filter(|v| !v.trim().is_empty()) {
            self.current_connection = Some(ConnectionId::new(conn.trim()));
        }
        if let Some(token) = lookup(ENV_GIT_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.git.token = Some(token.trim().to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datahub.environment.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "datahub.environment must not be empty".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for connection in &self.connections {
            if !ids.insert(connection.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate connection id '{}'",
                    connection.id
                )));
            }
        }

        if let Some(current) = &self.current_connection
            && !ids.contains(current.as_str())
        {
            return Err(ConfigError::Invalid(format!(
                "current_connection '{}' is not a configured connection",
                current
            )));
        }

        if is_protected_branch(&self.git.branch) {
            return Err(ConfigError::Invalid(format!(
                "git.branch must not be '{}'",
                self.git.branch.trim()
            )));
        }
        Ok(())
    }

    /// The connection named by `current_connection`
    pub fn current(&self) -> Option<&Connection> {
        let current = self.current_connection.as_ref()?;
        self.connections.iter().find(|c| &c.id == current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
current_connection = "prod"

[datahub]
environment = "DEV"
mutation = "eu"

[output]
mcp_dir = "out/mcps"
consolidated = true

[git]
branch = "metadata/review"
remote = "origin"

[[connections]]
id = "prod"
name = "Production"
url = "https://datahub.example.com"
token = "secret"

[[connections]]
id = "dev"
name = "Development"
url = "http://localhost:8080"
"#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.datahub.environment, "DEV");
        assert_eq!(config.datahub.mutation.as_deref(), Some("eu"));
        assert!(config.output.consolidated);
        assert_eq!(config.current().map(|c| c.name.as_str()), Some("Production"));
        assert_eq!(config.connections[1].token, None);
        assert_eq!(config.output.catalog_dir, PathBuf::from("catalog"));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.datahub.environment, "PROD");
        assert_eq!(config.git.branch, "metadata/updates");
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_ENVIRONMENT, "QA"),
            (ENV_MUTATION, ""),
            (ENV_CONNECTION, "dev"),
            (ENV_GIT_TOKEN, "s3cret"),
        ]);
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.datahub.environment, "QA");
        assert_eq!(config.datahub.mutation, None);
        assert_eq!(config.output.mcp_dir, PathBuf::from("out/mcps"));
        assert_eq!(config.current_connection, Some(ConnectionId::new("dev")));
        assert_eq!(config.git.token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.current_connection = Some(ConnectionId::new("staging"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.git.branch = "main".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.datahub.environment = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        let duplicate = config.connections[0].clone();
        config.connections.push(duplicate);
        assert!(config.validate().is_err());
    }
}
