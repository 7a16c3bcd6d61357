use serde_json::{Map, Value};
use thiserror::Error;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(Value),

    #[error("already exists: {0}")]
    AlreadyExists(Value),

    /// The remote backend answered with a server-side error.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A cascading delete stopped part way; `info` names the stage reached.
    #[error("cascade interrupted: {0}")]
    Interrupted(Value),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(key: &str, id: &str) -> Self {
        StoreError::NotFound(info(key, id))
    }

    pub fn already_exists(key: &str, id: &str) -> Self {
        StoreError::AlreadyExists(info(key, id))
    }

    pub fn backend<T: std::fmt::Display>(msg: T) -> Self {
        StoreError::Backend(msg.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Builds the `{key: id}` payload carried by lookup errors.
pub(crate) fn info(key: &str, id: &str) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), Value::String(id.to_string()));
    Value::Object(map)
}
