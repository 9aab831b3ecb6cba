//! Store credentials and client settings
//!
//! Credentials are resolved once at startup from an explicit set of options
//! and handed to the store constructor through `StoreSettings`. Sources are
//! tried in order: explicit config path, inline service-account JSON, path
//! from the environment, the local default file, then the platform default.

use crate::error::{HealError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project used when neither settings nor credentials name one
pub const DEFAULT_PROJECT_ID: &str = "heal-local";

/// Service-account key file contents
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default, skip_serializing)]
    private_key: Option<String>,
}

impl ServiceAccount {
    pub fn has_private_key(&self) -> bool {
        self.private_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Where the resolved credentials came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Path given explicitly in configuration
    ConfigPath(PathBuf),
    /// Inline JSON from `FIREBASE_SERVICE_ACCOUNT_JSON`
    EnvJson,
    /// Path from `FIREBASE_CONFIG_PATH`
    EnvPath(PathBuf),
    /// Local development key file
    LocalFile(PathBuf),
    /// Ambient platform credentials (no key material held)
    PlatformDefault,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::ConfigPath(p) => write!(f, "config path {}", p.display()),
            CredentialSource::EnvJson => f.write_str("inline service account json"),
            CredentialSource::EnvPath(p) => write!(f, "env path {}", p.display()),
            CredentialSource::LocalFile(p) => write!(f, "local file {}", p.display()),
            CredentialSource::PlatformDefault => f.write_str("platform default"),
        }
    }
}

/// Inputs for credential resolution, gathered once by the caller
#[derive(Debug, Clone, Default)]
pub struct CredentialOptions {
    pub config_path: Option<PathBuf>,
    pub service_account_json: Option<String>,
    pub env_path: Option<PathBuf>,
    pub local_default_path: Option<PathBuf>,
    pub allow_platform_default: bool,
}

/// Resolved credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub source: CredentialSource,
    pub service_account: Option<ServiceAccount>,
}

impl Credentials {
    pub fn resolve(options: &CredentialOptions) -> Result<Self> {
        if let Some(path) = &options.config_path {
            // An explicit path that cannot be read is a configuration error
            let account = read_service_account(path)?;
            return Ok(Self::from_account(
                CredentialSource::ConfigPath(path.clone()),
                account,
            ));
        }

        if let Some(json) = options
            .service_account_json
            .as_deref()
            .filter(|j| !j.trim().is_empty())
        {
            let account = parse_service_account(json, "inline service account json")?;
            return Ok(Self::from_account(CredentialSource::EnvJson, account));
        }

        if let Some(path) = &options.env_path {
            if path.exists() {
                let account = read_service_account(path)?;
                return Ok(Self::from_account(
                    CredentialSource::EnvPath(path.clone()),
                    account,
                ));
            }
            warn!(path = %path.display(), "No credentials file at configured env path");
        }

        if let Some(path) = &options.local_default_path {
            if path.exists() {
                let account = read_service_account(path)?;
                return Ok(Self::from_account(
                    CredentialSource::LocalFile(path.clone()),
                    account,
                ));
            }
            debug!(path = %path.display(), "No local credentials file");
        }

        if options.allow_platform_default {
            return Ok(Self {
                source: CredentialSource::PlatformDefault,
                service_account: None,
            });
        }

        Err(HealError::Credentials("no credentials found".to_string()))
    }

    fn from_account(source: CredentialSource, account: ServiceAccount) -> Self {
        Self {
            source,
            service_account: Some(account),
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        self.service_account.as_ref().map(|a| a.project_id.as_str())
    }
}

fn read_service_account(path: &Path) -> Result<ServiceAccount> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        HealError::Credentials(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_service_account(&content, &path.display().to_string())
}

fn parse_service_account(json: &str, origin: &str) -> Result<ServiceAccount> {
    serde_json::from_str(json)
        .map_err(|e| HealError::Credentials(format!("invalid service account in {}: {}", origin, e)))
}

/// Everything the store client needs at construction time
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub project_id: String,
    pub credentials: Credentials,
    /// JSON snapshot file for persistence across restarts
    pub snapshot_path: Option<PathBuf>,
}

impl StoreSettings {
    /// Build settings, preferring an explicit project id over the credentials'
    pub fn new(
        credentials: Credentials,
        project_id: Option<String>,
        snapshot_path: Option<PathBuf>,
    ) -> Self {
        let project_id = project_id
            .or_else(|| credentials.project_id().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string());

        Self {
            project_id,
            credentials,
            snapshot_path,
        }
    }

    /// Settings for an unpersisted store using platform credentials
    pub fn ephemeral(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            credentials: Credentials {
                source: CredentialSource::PlatformDefault,
                service_account: None,
            },
            snapshot_path: None,
        }
    }
}
