//! Run configuration.
//!
//! Everything a run needs is resolved up front into plain values: the
//! keyword table, the directory layout, whether summary logs are attached,
//! the outbound email settings, and the SMTP credentials. The JSON file is
//! optional and every key in it is optional.
//!
//! ```json
//! {
//!   "keywords": [
//!     { "field": "date", "keywords": ["date", "posted"] },
//!     { "field": "amount", "keywords": ["amount", "total"] }
//!   ],
//!   "paths": { "input": "incoming" },
//!   "include_logs": false,
//!   "email": { "recipient": "finance@example.com", "smtp_port": 2525 }
//! }
//! ```

use crate::detect::KeywordTable;
use crate::error::{Result, ResultExt as _, ScrubError};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "scrubber.json";

pub const USER_VAR: &str = "EMAIL_USER";
pub const PASS_VAR: &str = "EMAIL_PASS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for `.csv`, `.tsv` and `.xlsx` files
    pub input: PathBuf,
    /// Directory receiving `cleaned_<stem>.csv`
    pub output: PathBuf,
    /// Directory receiving `log_<stem>.txt`
    pub summary: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            output: PathBuf::from("output"),
            summary: PathBuf::from("summary"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmailSettings {
    /// Falls back to the sending account when unset
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            recipient: None,
            subject: "Automated Report".to_owned(),
            body: "Hello,\n\nPlease find the cleaned data files attached.\n\nRegards,\nAutomation Bot"
                .to_owned(),
            smtp_host: "smtp.gmail.com".to_owned(),
            smtp_port: 587,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub keywords: KeywordTable,
    pub paths: PathsConfig,
    /// Write summary logs and attach them to the report email
    pub include_logs: bool,
    pub email: EmailSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordTable::default(),
            paths: PathsConfig::default(),
            include_logs: true,
            email: EmailSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// With an explicit path the file must exist. Without one,
    /// [`DEFAULT_CONFIG_FILE`] is used if present, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::from_json(&contents)
            .map_err(|e| ScrubError::Config(format!("{}: {e}", path.display())))
    }

    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// SMTP login resolved from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl Credentials {
    /// Reads [`USER_VAR`] and [`PASS_VAR`], loading a `.env` file from the
    /// working directory first when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`ScrubError::MissingCredential`] naming the first variable
    /// that is unset or empty.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!("Ignoring unreadable .env file: {e}");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves credentials through an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ScrubError::MissingCredential`] as [`Credentials::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ScrubError::MissingCredential(key))
        };

        let user = fetch(USER_VAR)?;
        let password = fetch(PASS_VAR)?;
        Ok(Self {
            user,
            password: SecretString::new(password.into()),
        })
    }
}
