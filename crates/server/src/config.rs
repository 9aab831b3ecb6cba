//! Server configuration

use anyhow::{Context, Result};
use heal_lib::store::{CredentialOptions, Credentials, StoreSettings};
use serde::Deserialize;
use std::path::PathBuf;

/// Inline service-account JSON, read once at load
pub const SERVICE_ACCOUNT_JSON_VAR: &str = "FIREBASE_SERVICE_ACCOUNT_JSON";

/// Path to a service-account key file, read once at load
pub const SERVICE_ACCOUNT_PATH_VAR: &str = "FIREBASE_CONFIG_PATH";

/// Server configuration, from `HEAL_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Overrides the project named by the credentials
    #[serde(default)]
    pub project_id: Option<String>,

    /// Explicit service-account key file, tried before everything else
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// Local development key file, tried after the environment
    #[serde(default = "default_credentials_path")]
    pub default_credentials_path: PathBuf,

    /// Fall back to platform credentials when no key is found
    #[serde(default = "default_true")]
    pub allow_platform_credentials: bool,

    /// JSON snapshot file for the document store
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub seed_on_startup: bool,

    /// Fixed RNG seed for reproducible demo data
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(skip)]
    pub service_account_json: Option<String>,

    #[serde(skip)]
    pub env_credentials_path: Option<PathBuf>,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "heal-backend".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("serviceAccountKey.json")
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_vars(None)
    }

    /// Load configuration from `vars` instead of the process environment
    pub fn from_vars(vars: Option<config::Map<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("HEAL")
                    .try_parsing(true)
                    .source(vars.clone()),
            )
            .build()
            .context("Failed to read HEAL_* environment")?;

        let mut server_config: ServerConfig = config
            .try_deserialize()
            .context("Invalid HEAL_* configuration")?;

        let lookup = |key: &str| match &vars {
            Some(map) => map.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        server_config.service_account_json = lookup(SERVICE_ACCOUNT_JSON_VAR);
        server_config.env_credentials_path = lookup(SERVICE_ACCOUNT_PATH_VAR).map(PathBuf::from);

        Ok(server_config)
    }

    pub fn credential_options(&self) -> CredentialOptions {
        CredentialOptions {
            config_path: self.credentials_path.clone(),
            service_account_json: self.service_account_json.clone(),
            env_path: self.env_credentials_path.clone(),
            local_default_path: Some(self.default_credentials_path.clone()),
            allow_platform_default: self.allow_platform_credentials,
        }
    }

    /// Resolve credentials and build the store settings
    pub fn store_settings(&self) -> Result<StoreSettings> {
        let credentials = Credentials::resolve(&self.credential_options())
            .context("Failed to resolve store credentials")?;
        Ok(StoreSettings::new(
            credentials,
            self.project_id.clone(),
            self.snapshot_path.clone(),
        ))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heal_lib::store::CredentialSource;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert!(config.seed_on_startup);
        assert!(config.allow_platform_credentials);
        assert!(config.snapshot_path.is_none());
        assert!(config.service_account_json.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_vars(vars(&[
            ("HEAL_API_PORT", "9090"),
            ("HEAL_SEED_ON_STARTUP", "false"),
            ("HEAL_SEED", "42"),
            ("HEAL_PROJECT_ID", "heal-staging"),
            ("HEAL_SNAPSHOT_PATH", "/var/lib/heal/store.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 9090);
        assert!(!config.seed_on_startup);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.project_id.as_deref(), Some("heal-staging"));
        assert_eq!(
            config.snapshot_path,
            Some(PathBuf::from("/var/lib/heal/store.json"))
        );
    }

    #[test]
    fn test_firebase_vars_feed_credentials() {
        let config = ServerConfig::from_vars(vars(&[(
            SERVICE_ACCOUNT_JSON_VAR,
            r#"{"project_id":"heal-prod"}"#,
        )]))
        .unwrap();

        let settings = config.store_settings().unwrap();
        assert_eq!(settings.credentials.source, CredentialSource::EnvJson);
        assert_eq!(settings.project_id, "heal-prod");
    }

    #[test]
    fn test_explicit_credentials_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"project_id":"from-config"}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config =
            ServerConfig::from_vars(vars(&[("HEAL_CREDENTIALS_PATH", path.as_str())])).unwrap();
        let settings = config.store_settings().unwrap();
        assert_eq!(settings.project_id, "from-config");
    }

    #[test]
    fn test_no_credentials_without_platform_default() {
        let config = ServerConfig::from_vars(vars(&[
            ("HEAL_ALLOW_PLATFORM_CREDENTIALS", "false"),
            ("HEAL_DEFAULT_CREDENTIALS_PATH", "/nonexistent/key.json"),
        ]))
        .unwrap();
        assert!(config.store_settings().is_err());
    }
}
