//! Error taxonomy shared by every Borga operation

use std::collections::BTreeMap;

use borga_catalog::CatalogError;
use borga_store::StoreError;
use log::error;
use reqwest::StatusCode;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{json, Value};
use thiserror::Error;

/// Machine-readable kind of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Fail,
    BadRequest,
    NotFound,
    AlreadyExists,
    ExtSvcFail,
    Unauthenticated,
}

impl ErrorKind {
    pub fn code(&self) -> u16 {
        match self {
            ErrorKind::Fail => 1000,
            ErrorKind::BadRequest => 1001,
            ErrorKind::NotFound => 1002,
            ErrorKind::AlreadyExists => 1003,
            ErrorKind::ExtSvcFail => 1004,
            ErrorKind::Unauthenticated => 1005,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Fail => "FAIL",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::ExtSvcFail => "EXT_SVC_FAIL",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// Conventional HTTP status for the boundary layer
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorKind::Fail => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ErrorKind::ExtSvcFail => StatusCode::BAD_GATEWAY,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Unified error type for Borga operations
///
/// Every variant carries the payload naming the offending field or id.
#[derive(Error, Debug)]
pub enum Error {
    /// Uncategorized internal failure, including remote store transport errors
    #[error("An error occurred {0}")]
    Fail(Value),

    /// Structurally invalid input; maps every violating field to its reason
    #[error("The request is bad. {}", violations(.0))]
    BadRequest(BTreeMap<String, String>),

    #[error("The item does not exist {0}")]
    NotFound(Value),

    #[error("The item already exists {0}")]
    AlreadyExists(Value),

    /// The catalog or the remote store is unreachable or failing
    #[error("External service failure {0}")]
    ExtSvcFail(Value),

    /// Missing or mismatched token
    #[error("Unauthenticated {0:?}")]
    Unauthenticated(String),
}

fn violations(fields: &BTreeMap<String, String>) -> Value {
    fields
        .iter()
        .map(|(field, reason)| (field.clone(), Value::String(reason.clone())))
        .collect()
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Fail(_) => ErrorKind::Fail,
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::ExtSvcFail(_) => ErrorKind::ExtSvcFail,
            Error::Unauthenticated(_) => ErrorKind::Unauthenticated,
        }
    }

    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The structured payload describing what caused the error
    pub fn info(&self) -> Value {
        match self {
            Error::BadRequest(fields) => violations(fields),
            Error::Unauthenticated(reason) => Value::String(reason.clone()),
            Error::Fail(info)
            | Error::NotFound(info)
            | Error::AlreadyExists(info)
            | Error::ExtSvcFail(info) => info.clone(),
        }
    }

    /// Create a new authentication error
    pub fn unauthenticated<T: std::fmt::Display>(msg: T) -> Self {
        Error::Unauthenticated(msg.to_string())
    }

    /// Create a new general failure
    pub fn fail<T: std::fmt::Display>(msg: T) -> Self {
        Error::Fail(json!({ "cause": msg.to_string() }))
    }
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Error", 4)?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("info", &self.info())?;
        state.end()
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(info) => Error::NotFound(info),
            StoreError::AlreadyExists(info) => Error::AlreadyExists(info),
            StoreError::Unavailable(cause) => Error::ExtSvcFail(json!({ "cause": cause })),
            StoreError::Interrupted(info) => Error::Fail(info),
            StoreError::Backend(cause) => {
                error!("store failure: {}", cause);
                Error::Fail(json!({ "cause": cause }))
            }
        }
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(info) => Error::NotFound(info),
            other if other.is_upstream_failure() => {
                Error::ExtSvcFail(json!({ "cause": other.to_string() }))
            }
            other => {
                error!("catalog failure: {}", other);
                Error::Fail(json!({ "cause": other.to_string() }))
            }
        }
    }
}
