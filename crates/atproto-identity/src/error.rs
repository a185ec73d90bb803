//! Error types for identity resolution

use std::fmt;
use std::time::Duration;

use at_uri_parser::ParseError;

#[derive(Debug)]
pub enum IdentityError {
    Config(String),
    Parse(ParseError),
    InvalidHandle { handle: String, reason: &'static str },
    DirectoryUnavailable { did: String, cause: Box<IdentityError> },
    DirectoryMiscontent { did: String, reason: String },
    NoHostingEndpoint(String),
    NoAliasFound(String),
    HandleResolutionFailed { handle: String, last: Box<IdentityError> },
    IdentityNotFound(String),
    Transport {
        operation: &'static str,
        target: String,
        source: Box<reqwest::Error>,
    },
    Status {
        operation: &'static str,
        target: String,
        status: u16,
    },
    Timeout {
        operation: &'static str,
        target: String,
        after: Duration,
    },
    UnexpectedResponse {
        operation: &'static str,
        target: String,
        reason: String,
    },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Config(msg) => write!(f, "Configuration error: {}", msg),
            IdentityError::Parse(err) => write!(f, "{}", err),
            IdentityError::InvalidHandle { handle, reason } => {
                write!(f, "Invalid handle '{}': {}", handle, reason)
            }
            IdentityError::DirectoryUnavailable { did, cause } => {
                write!(f, "Directory unavailable for {}: {}", did, cause)
            }
            IdentityError::DirectoryMiscontent { did, reason } => {
                write!(f, "Directory returned an unusable document for {}: {}", did, reason)
            }
            IdentityError::NoHostingEndpoint(did) => {
                write!(f, "No PDS endpoint in DID document for {}", did)
            }
            IdentityError::NoAliasFound(did) => {
                write!(f, "No alsoKnownAs entry in DID document for {}", did)
            }
            IdentityError::HandleResolutionFailed { handle, last } => {
                write!(f, "Failed to resolve handle '{}': {}", handle, last)
            }
            IdentityError::IdentityNotFound(id) => write!(f, "Identity not found: {}", id),
            IdentityError::Transport {
                operation,
                target,
                source,
            } => write!(f, "{} request for {} failed: {}", operation, target, source),
            IdentityError::Status {
                operation,
                target,
                status,
            } => write!(f, "{} for {} returned status {}", operation, target, status),
            IdentityError::Timeout {
                operation,
                target,
                after,
            } => write!(
                f,
                "{} for {} timed out after {}ms",
                operation,
                target,
                after.as_millis()
            ),
            IdentityError::UnexpectedResponse {
                operation,
                target,
                reason,
            } => write!(f, "{} for {}: {}", operation, target, reason),
        }
    }
}

impl std::error::Error for IdentityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdentityError::Parse(err) => Some(err),
            IdentityError::DirectoryUnavailable { cause, .. } => Some(cause.as_ref()),
            IdentityError::HandleResolutionFailed { last, .. } => Some(last.as_ref()),
            IdentityError::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ParseError> for IdentityError {
    fn from(err: ParseError) -> Self {
        IdentityError::Parse(err)
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
