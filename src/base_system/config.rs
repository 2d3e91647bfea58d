//! 配置文件读取：用户 JSON 覆盖内置默认值。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid json at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

pub trait ConfigSpec: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
}

/// Load a config file and merge it over `T::default()`.
///
/// # Path resolution
/// - If `config_path` is Some: uses the exact path provided
/// - Otherwise: uses current directory/FILE_NAME
///
/// A missing file is not an error; the defaults are returned unchanged and
/// nothing is written to disk.
pub fn load_or_default<T: ConfigSpec>(config_path: Option<&Path>) -> Result<T, ConfigError> {
    let path = resolve_path::<T>(config_path);

    if !path.exists() {
        return Ok(T::default());
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    merge_over_default::<T>(&raw).map_err(|err| match err {
        MergeError::Parse(source) => ConfigError::Parse { path, source },
        MergeError::Validation(msg) => ConfigError::Validation(msg),
    })
}

enum MergeError {
    Parse(serde_json::Error),
    Validation(String),
}

fn merge_over_default<T: ConfigSpec>(raw: &str) -> Result<T, MergeError> {
    let user_json: Value = serde_json::from_str(raw).map_err(MergeError::Parse)?;
    if !user_json.is_object() {
        return Err(MergeError::Validation(
            "config must be a json object".to_string(),
        ));
    }

    let mut merged = serde_json::to_value(T::default())
        .map_err(|err| MergeError::Validation(err.to_string()))?;
    merge_values(&mut merged, user_json);

    serde_json::from_value(merged).map_err(|err| MergeError::Validation(err.to_string()))
}

fn merge_values(default: &mut Value, user: Value) {
    match (default, user) {
        (Value::Object(dest), Value::Object(src)) => {
            for (key, user_val) in src {
                if let Some(dest_val) = dest.get_mut(&key) {
                    merge_values(dest_val, user_val);
                } else {
                    dest.insert(key, user_val);
                }
            }
        }
        (dest, other) => {
            *dest = other;
        }
    }
}

fn resolve_path<T: ConfigSpec>(path: Option<&Path>) -> PathBuf {
    match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(T::FILE_NAME),
    }
}
