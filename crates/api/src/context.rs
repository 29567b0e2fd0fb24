//! Per-request context inserted by [`crate::middleware::request_context`].

use recipebook_auth::{AuthFailure, CredentialSource};
use tokio_util::sync::CancellationToken;

/// The credential a request carried, as found by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestCredential {
    /// Neither a bearer header nor a session cookie.
    None,
    Token(String),
    /// An `Authorization` header that is not a usable bearer token.
    Malformed,
}

impl CredentialSource for RequestCredential {
    fn token(&self) -> Result<Option<&str>, AuthFailure> {
        match self {
            Self::None => Ok(None),
            Self::Token(token) => Ok(Some(token.as_str())),
            Self::Malformed => Err(AuthFailure::MalformedCredential),
        }
    }
}

/// Cancelled when the request is abandoned or the server shuts down.
#[derive(Debug, Clone)]
pub struct RequestCancellation(pub CancellationToken);

impl RequestCancellation {
    pub fn token(&self) -> &CancellationToken {
        &self.0
    }
}
