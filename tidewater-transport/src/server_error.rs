//! Server error bodies and the decoder that classifies them.
//!
//! Clusters answer failures with several different JSON shapes depending on
//! the component that rejected the request. [`ServerError::from_body`] probes
//! the body once and returns the narrowest matching variant:
//!
//! | Body | Variant |
//! |---|---|
//! | `{"error":{...},"status":400}` | [`ServerError::Struct`] |
//! | `{"error":"...","status":405}` | [`ServerError::String`] |
//! | `{"status":"BAD_REQUEST","message":"..."}` | [`ServerError::Message`] |
//! | `{"status":"error","reason":"..."}` | [`ServerError::Reason`] |
//! | `{"error":"..."}` | [`ServerError::Flat`] |

use crate::Response;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structured error object returned by the cluster.
///
/// Also used for the `error` member of individual bulk response items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorCause {
    /// Error type, e.g. `version_conflict_engine_exception`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Index the error relates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// UUID of the index the error relates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_uuid: Option<String>,
    /// Root causes reported by the cluster.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_cause: Vec<ErrorCause>,
    /// Nested cause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<Box<ErrorCause>>,
    /// Any other fields the cluster attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl std::fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", self.kind, reason),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// `{"error":{...},"status":N}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("status: {status}, {error}")]
pub struct StructError {
    /// Structured error object.
    pub error: ErrorCause,
    /// HTTP status reported in the body.
    pub status: u16,
}

/// `{"error":"...","status":N}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("status: {status}, error: {error}")]
pub struct StringError {
    /// Error message.
    pub error: String,
    /// HTTP status reported in the body.
    pub status: u16,
}

/// `{"status":"...","message":"..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("status: {status}, message: {message}")]
pub struct MessageError {
    /// Symbolic status, e.g. `BAD_REQUEST`.
    pub status: String,
    /// Error message.
    pub message: String,
}

/// `{"status":"...","reason":"..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("status: {status}, reason: {reason}")]
pub struct ReasonError {
    /// Symbolic status, e.g. `error`.
    pub status: String,
    /// Error reason.
    pub reason: String,
}

/// `{"error":"..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("error: {error}")]
pub struct FlatError {
    /// Error message.
    pub error: String,
}

/// Error body returned by the cluster, classified by shape.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Structured error with numeric status.
    #[error(transparent)]
    Struct(#[from] StructError),

    /// String error with numeric status.
    #[error(transparent)]
    String(#[from] StringError),

    /// Symbolic status with a message.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// Symbolic status with a reason.
    #[error(transparent)]
    Reason(#[from] ReasonError),

    /// Bare error string without a status.
    #[error(transparent)]
    Flat(#[from] FlatError),

    /// Error status with an empty body.
    #[error("server returned status {status} with an empty body")]
    EmptyBody {
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// The body is not valid JSON for any known shape.
    #[error("failed to decode error body: {source}")]
    JsonUnmarshal {
        /// Decoder error.
        #[source]
        source: serde_json::Error,
        /// Raw body.
        body: Bytes,
    },

    /// Valid JSON that matches no known shape.
    #[error("unknown server error: {}", String::from_utf8_lossy(body))]
    Unknown {
        /// Raw body.
        body: Bytes,
    },
}

impl ServerError {
    /// Classify an error response.
    pub fn from_response(response: &Response) -> Self {
        Self::from_body(response.status().as_u16(), response.body())
    }

    /// Classify an error body returned with the given HTTP status.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::EmptyBody { status };
        }

        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(source) => {
                return Self::JsonUnmarshal {
                    source,
                    body: Bytes::copy_from_slice(body),
                };
            }
        };

        let Value::Object(map) = &value else {
            return Self::Unknown {
                body: Bytes::copy_from_slice(body),
            };
        };

        match (map.get("error"), map.get("status")) {
            (Some(Value::Object(_)), Some(Value::Number(_))) => {
                match serde_json::from_value::<StructError>(value) {
                    Ok(e) => Self::Struct(e),
                    Err(source) => Self::JsonUnmarshal {
                        source,
                        body: Bytes::copy_from_slice(body),
                    },
                }
            }
            (Some(Value::String(error)), Some(Value::Number(n))) => Self::String(StringError {
                error: error.clone(),
                status: n
                    .as_u64()
                    .and_then(|n| u16::try_from(n).ok())
                    .unwrap_or(status),
            }),
            (_, Some(Value::String(symbolic))) => {
                if let Some(Value::String(message)) = map.get("message") {
                    Self::Message(MessageError {
                        status: symbolic.clone(),
                        message: message.clone(),
                    })
                } else if let Some(Value::String(reason)) = map.get("reason") {
                    Self::Reason(ReasonError {
                        status: symbolic.clone(),
                        reason: reason.clone(),
                    })
                } else {
                    Self::Unknown {
                        body: Bytes::copy_from_slice(body),
                    }
                }
            }
            (Some(Value::String(error)), None) => Self::Flat(FlatError {
                error: error.clone(),
            }),
            _ => Self::Unknown {
                body: Bytes::copy_from_slice(body),
            },
        }
    }

    /// Numeric HTTP status, where the variant carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Struct(e) => Some(e.status),
            Self::String(e) => Some(e.status),
            Self::EmptyBody { status } => Some(*status),
            Self::ReadBody(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
