//! Runtime configuration, resolved once from the global flags.
//! Every flag has an environment fallback (see `cli::GlobalArgs`).

use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::{GlobalArgs, StoreKind};
use crate::store::firestore::DEFAULT_ENDPOINT;

/// Characters of the key file that make up the API key.
const API_KEY_LEN: usize = 12;
/// The emulator accepts any bearer token.
const EMULATOR_TOKEN: &str = "owner";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("env file: {0}")]
    EnvFile(String),
    #[error("cannot read credentials {}: {message}", path.display())]
    Credentials { path: PathBuf, message: String },
    #[error("missing Firestore access token: set FIRESTORE_ACCESS_TOKEN or FIRESTORE_EMULATOR_HOST")]
    MissingAccessToken,
    #[error("cannot read API key file {}: {source}", path.display())]
    ApiKey { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Firestore {
        endpoint: String,
        project_id: String,
        access_token: String,
    },
    Local {
        root: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store: StoreConfig,
    /// Home Graph API key; notifications are skipped without one.
    pub api_key: Option<String>,
    pub homegraph_base_url: String,
}

#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

fn read_project_id(path: &Path) -> Result<String, ConfigError> {
    let err = |message: String| ConfigError::Credentials {
        path: path.to_path_buf(),
        message,
    };
    let text = fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
    let de = &mut serde_json::Deserializer::from_str(&text);
    let account: ServiceAccount = serde_path_to_error::deserialize(de).map_err(|e| err(e.to_string()))?;
    Ok(account.project_id)
}

/// The key is the first 12 characters of the trimmed file; a missing file means no key.
fn read_api_key(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let key: String = text.trim().chars().take(API_KEY_LEN).collect();
            Ok((!key.is_empty()).then_some(key))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found, sync notifications disabled", path.display());
            Ok(None)
        }
        Err(source) => Err(ConfigError::ApiKey {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn firestore_config(args: &GlobalArgs) -> Result<StoreConfig, ConfigError> {
    let project_id = match &args.project_id {
        Some(p) if !p.trim().is_empty() => p.trim().to_string(),
        _ => read_project_id(&args.credentials)?,
    };

    let (endpoint, access_token) = match &args.emulator_host {
        Some(host) if !host.trim().is_empty() => {
            let token = match &args.access_token {
                Some(t) if !t.trim().is_empty() => t.trim().to_string(),
                _ => EMULATOR_TOKEN.to_string(),
            };
            (format!("http://{}", host.trim()), token)
        }
        _ => match &args.access_token {
            Some(t) if !t.trim().is_empty() => (DEFAULT_ENDPOINT.to_string(), t.trim().to_string()),
            _ => return Err(ConfigError::MissingAccessToken),
        },
    };

    Ok(StoreConfig::Firestore {
        endpoint,
        project_id,
        access_token,
    })
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> Result<Self, ConfigError> {
        let store = match args.store {
            StoreKind::Firestore => firestore_config(args)?,
            StoreKind::Local => StoreConfig::Local {
                root: args.local_root.clone(),
            },
        };

        let api_key = match &args.api_key {
            Some(k) if !k.trim().is_empty() => Some(k.trim().to_string()),
            _ => read_api_key(&args.api_key_file)?,
        };
        if api_key.is_none() {
            info!("no Home Graph API key configured, sync requests will be skipped");
        }

        Ok(Config {
            store,
            api_key,
            homegraph_base_url: args.homegraph_url.clone(),
        })
    }
}
