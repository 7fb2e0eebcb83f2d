//! Credentials and request signing.

use crate::Result;
use base64::Engine;
use http::HeaderValue;
use std::fmt;

/// Credentials attached to every request before signing.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic authentication.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// Bearer token.
    Bearer(String),
}

impl Credentials {
    /// Basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bearer token credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> Option<HeaderValue> {
        let value = match self {
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
            Self::Bearer(token) => format!("Bearer {}", token),
        };

        let mut value = HeaderValue::try_from(value).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

/// Pluggable request signer, e.g. for cloud provider request signing.
///
/// Runs on every attempt, after credentials and the final body are attached.
pub trait Signer: Send + Sync {
    /// Sign the outgoing request in place.
    fn sign(&self, request: &mut reqwest::Request) -> Result<()>;
}
