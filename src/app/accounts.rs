//! Account Registry
//!
//! Loads the list of fleet accounts and their static access keys from a YAML file.
//!
//! Expected structure:
//!
//! ```yaml
//! - Account ID: 123456789012
//!   username: ...
//!   password: ...
//!   aws_access_key_id: AKIA...
//!   aws_secret_access_key: ...
//! ```

#![warn(clippy::all, rust_2018_idioms)]

use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const ACCOUNT_ID_KEY: &str = "Account ID";
const ACCESS_KEY_KEY: &str = "aws_access_key_id";
const SECRET_KEY_KEY: &str = "aws_secret_access_key";

/// Static credentials for one fleet account
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredential {
    pub account_id: String,
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredential")
            .field("account_id", &self.account_id)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Failure to load the account registry
#[derive(Debug)]
pub enum ConfigError {
    /// The accounts file does not exist
    NotFound(PathBuf),
    /// The accounts file exists but could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// The file is not a YAML sequence of mappings
    Malformed { path: PathBuf, message: String },
    /// A record lacks a required field
    MissingField { index: usize, field: &'static str },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "accounts file not found: {}", path.display())
            }
            ConfigError::Io { path, source } => {
                write!(f, "failed to read accounts file {}: {}", path.display(), source)
            }
            ConfigError::Malformed { path, message } => {
                write!(f, "malformed accounts file {}: {}", path.display(), message)
            }
            ConfigError::MissingField { index, field } => {
                write!(f, "account record #{} is missing '{}'", index, field)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Load all account records from `path`
pub fn load_accounts(path: &Path) -> Result<Vec<AccountCredential>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_accounts(&content).map_err(|e| match e {
        ConfigError::Malformed { message, .. } => ConfigError::Malformed {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// Parse account records from YAML text
pub fn parse_accounts(content: &str) -> Result<Vec<AccountCredential>, ConfigError> {
    let malformed = |message: String| ConfigError::Malformed {
        path: PathBuf::new(),
        message,
    };

    let document: Value = serde_yaml::from_str(content).map_err(|e| malformed(e.to_string()))?;

    let records = match document {
        Value::Sequence(records) => records,
        // An empty file parses as null
        Value::Null => Vec::new(),
        other => {
            return Err(malformed(format!(
                "expected a list of account records, found {}",
                value_kind(&other)
            )))
        }
    };

    let mut accounts = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let Value::Mapping(_) = record else {
            return Err(malformed(format!(
                "account record #{} is a {}, expected a mapping",
                index,
                value_kind(record)
            )));
        };

        let account = AccountCredential {
            account_id: required_field(record, index, ACCOUNT_ID_KEY)?,
            access_key: required_field(record, index, ACCESS_KEY_KEY)?,
            secret_key: required_field(record, index, SECRET_KEY_KEY)?,
        };
        debug!("Loaded account record #{}: {}", index, account.account_id);
        accounts.push(account);
    }

    let mut seen = HashSet::new();
    for account in &accounts {
        if !seen.insert(account.account_id.as_str()) {
            warn!(
                "Account {} appears more than once in the registry; later results overwrite earlier ones",
                account.account_id
            );
        }
    }

    Ok(accounts)
}

fn required_field(record: &Value, index: usize, field: &'static str) -> Result<String, ConfigError> {
    let value = match record.get(field) {
        Some(Value::String(s)) => s.trim().to_string(),
        // Account IDs are 12 digits; YAML integers lose leading zeros
        Some(Value::Number(n)) if field == ACCOUNT_ID_KEY => match n.as_u64() {
            Some(id) => format!("{:012}", id),
            None => n.to_string(),
        },
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    if value.is_empty() {
        return Err(ConfigError::MissingField { index, field });
    }
    Ok(value)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
